//! autosuspendctl - query the autosuspendd status socket

mod aggregator;
mod config;
mod ipc;
mod probe;
mod probes;
mod processor;
mod registry;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ipc::IpcClient;

/// Control utility for autosuspendd
#[derive(Parser)]
#[command(name = "autosuspendctl", version, about = "Query the autosuspendd status socket")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Socket path
    #[arg(long, default_value = "/run/autosuspendd/autosuspendd.sock")]
    socket: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current idle/probe status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = IpcClient::new(&cli.socket);

    match cli.command {
        Commands::Status => {
            let status = client.get_status().await?;

            println!("autosuspendd status");
            println!("====================");
            println!("Version:        {}", status.version);
            match status.idle_since {
                Some(since) => println!("Idle since:     {}", since.to_rfc3339()),
                None => println!("Idle since:     not idle"),
            }
            println!();
            println!("Activity checks:");
            for name in &status.activity_probes {
                println!("  - {}", name);
            }
            println!();
            println!("Wakeup checks:");
            if status.wakeup_probes.is_empty() {
                println!("  none configured");
            } else {
                for name in &status.wakeup_probes {
                    println!("  - {}", name);
                }
            }
        }
    }

    Ok(())
}
