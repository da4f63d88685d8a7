//! Status IPC interface for autosuspendd.
//!
//! A read-only surface: a client can ask what the daemon currently thinks
//! (idle-since, configured probes) but cannot trigger or override a
//! suspend decision, since that loop is driven entirely by the processor.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::processor::Processor;

/// IPC request types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IpcRequest {
    /// Get full daemon status.
    GetStatus,
}

/// IPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum IpcResponse {
    Success { data: serde_json::Value },
    Error { message: String },
}

/// Full daemon status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub version: String,
    pub idle_since: Option<DateTime<Utc>>,
    pub activity_probes: Vec<String>,
    pub wakeup_probes: Vec<String>,
}

/// IPC server exposing read-only processor status over a Unix socket.
pub struct IpcServer {
    socket_path: String,
    processor: Arc<Mutex<Processor>>,
}

impl IpcServer {
    pub fn new(socket_path: impl Into<String>, processor: Arc<Mutex<Processor>>) -> Self {
        Self {
            socket_path: socket_path.into(),
            processor,
        }
    }

    pub async fn run(&self) -> Result<()> {
        let _ = tokio::fs::remove_file(&self.socket_path).await;

        if let Some(parent) = std::path::Path::new(&self.socket_path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("autosuspendd status IPC listening on {}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let processor = Arc::clone(&self.processor);
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, processor).await {
                            tracing::error!("Client error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }
}

async fn handle_client(stream: UnixStream, processor: Arc<Mutex<Processor>>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<IpcRequest>(&line) {
            Ok(request) => process_request(request, &processor),
            Err(e) => IpcResponse::Error {
                message: format!("Invalid request: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)?;
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        line.clear();
    }

    Ok(())
}

fn process_request(request: IpcRequest, processor: &Mutex<Processor>) -> IpcResponse {
    match request {
        IpcRequest::GetStatus => {
            let guard = processor.lock().unwrap();
            let status = DaemonStatus {
                version: env!("CARGO_PKG_VERSION").to_string(),
                idle_since: guard.idle_since(),
                activity_probes: guard.activity_names(),
                wakeup_probes: guard.wakeup_names(),
            };
            IpcResponse::Success {
                data: serde_json::to_value(status).unwrap(),
            }
        }
    }
}

/// IPC client used by `autosuspendctl`.
pub struct IpcClient {
    socket_path: String,
}

impl IpcClient {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub async fn send(&self, request: IpcRequest) -> Result<IpcResponse> {
        let mut stream = UnixStream::connect(&self.socket_path).await?;

        let request_json = serde_json::to_string(&request)?;
        stream.write_all(request_json.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).await?;

        Ok(serde_json::from_str(&line)?)
    }

    pub async fn get_status(&self) -> Result<DaemonStatus> {
        match self.send(IpcRequest::GetStatus).await? {
            IpcResponse::Success { data } => Ok(serde_json::from_value(data)?),
            IpcResponse::Error { message } => Err(anyhow::anyhow!(message)),
        }
    }
}
