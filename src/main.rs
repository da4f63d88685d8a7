//! autosuspendd - idle-detection and suspend-orchestration daemon
//!
//! Watches a configurable set of activity checks; once the host has been
//! continuously idle for long enough, optionally arms a wake-up via the
//! configured wake-up checks and suspends.

mod aggregator;
mod config;
mod effects;
mod ipc;
mod probe;
mod probes;
mod processor;
mod registry;

mod daemon;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use crate::config::{ConfigurationError, DaemonConfig};
use crate::ipc::IpcServer;
use crate::processor::Processor;
use crate::registry::{build_activity_probes, build_wakeup_probes};

/// autosuspendd - suspend the host after a period of inactivity
#[derive(Parser, Debug)]
#[command(name = "autosuspendd", version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "/etc/autosuspend.toml")]
    config: PathBuf,

    /// Run every activity check on every iteration, even after one matches.
    #[arg(short = 'a', long)]
    all_checks: bool,

    /// Exit after running for this many seconds, instead of forever.
    #[arg(short = 'r', long)]
    run_for: Option<u64>,

    /// Logging verbosity (error, warn, info, debug, trace).
    #[arg(short = 'l', long, default_value = "info")]
    logging: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.logging.clone())),
        )
        .init();

    info!("autosuspendd v{} starting", env!("CARGO_PKG_VERSION"));

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "fatal error");
            if err.downcast_ref::<ConfigurationError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = DaemonConfig::load(&args.config)?;
    let activity_probes = build_activity_probes(&config)?;
    let wakeup_probes = build_wakeup_probes(&config)?;

    let has_wakeups = !wakeup_probes.is_empty();
    let wakeup_cmd = config.general.wakeup_cmd.clone();
    if has_wakeups && wakeup_cmd.is_none() {
        return Err(ConfigurationError::MissingWakeupCmd.into());
    }

    let suspend_cmd = config
        .general
        .suspend_cmd
        .clone()
        .ok_or(ConfigurationError::MissingSuspendCmd)?;
    let notify_cmd_wakeup = config.general.notify_cmd_wakeup.clone();
    let notify_cmd_no_wakeup = config.general.notify_cmd_no_wakeup.clone();

    let suspend_fn: crate::processor::SuspendFn = Box::new(move |wakeup_at| {
        effects::notify_and_suspend(
            &suspend_cmd,
            notify_cmd_wakeup.as_deref(),
            notify_cmd_no_wakeup.as_deref(),
            wakeup_at,
        );
    });

    let wakeup_fn: crate::processor::WakeupFn = Box::new(move |wakeup_at| {
        if let Some(template) = &wakeup_cmd {
            effects::schedule_wakeup(template, wakeup_at);
        }
    });

    let processor = Processor::new(
        activity_probes,
        wakeup_probes,
        config.general.idle_time,
        config.general.min_sleep_time,
        config.general.wakeup_delta,
        args.all_checks || config.general.all_checks,
        suspend_fn,
        wakeup_fn,
    );
    let processor = Arc::new(Mutex::new(processor));

    let interval = StdDuration::from_secs_f64(config.general.interval.max(0.1));
    let run_for = args.run_for.map(StdDuration::from_secs);
    let woke_up_file = config.general.woke_up_file.clone();
    let socket_path = config.general.socket_path.clone();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let ipc_processor = Arc::clone(&processor);
        let ipc_server = IpcServer::new(socket_path, ipc_processor);

        tokio::select! {
            () = daemon::run(&processor, interval, run_for, &woke_up_file) => {}
            result = ipc_server.run() => {
                if let Err(err) = result {
                    error!(error = %err, "status IPC server exited");
                }
            }
        }
    });

    info!("autosuspendd exiting");
    Ok(())
}

