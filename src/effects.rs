//! External effect adapters: rendering a wake-up instant into a shell
//! command, and the notify-then-suspend sequence.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

fn substitute(template: &str, at: DateTime<Utc>) -> String {
    template
        .replace("{timestamp}", &format!("{:.6}", at.timestamp() as f64 + at.timestamp_subsec_micros() as f64 / 1e6))
        .replace("{iso}", &at.to_rfc3339())
}

fn run_shell(command: &str) -> bool {
    match std::process::Command::new("sh").arg("-c").arg(command).status() {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!(command, code = ?status.code(), "command exited with a non-zero status");
            false
        }
        Err(err) => {
            warn!(command, error = %err, "failed to execute command");
            false
        }
    }
}

/// Format the configured wake command template with `{timestamp}`/`{iso}`
/// substitutions and execute it via the shell. A non-zero exit is logged
/// and swallowed - the subsequent suspend still proceeds.
pub fn schedule_wakeup(command_template: &str, wakeup_at: DateTime<Utc>) {
    let command = substitute(command_template, wakeup_at);
    info!(command, "scheduling wakeup");
    run_shell(&command);
}

fn notify(
    command_wakeup_template: Option<&str>,
    command_no_wakeup: Option<&str>,
    wakeup_at: Option<DateTime<Utc>>,
) {
    match (wakeup_at, command_wakeup_template, command_no_wakeup) {
        (Some(at), Some(template), _) => {
            let command = substitute(template, at);
            info!(command, "notifying before suspend");
            run_shell(&command);
        }
        (None, _, Some(command)) => {
            info!(command, "notifying before suspend");
            run_shell(command);
        }
        _ => {
            info!("no suitable notification command configured");
        }
    }
}

/// Run the notifier (if configured) and then the suspend command. A
/// failing suspend command is logged and swallowed; the next tick will
/// retry suspension if conditions still call for it.
pub fn notify_and_suspend(
    suspend_cmd: &str,
    notify_cmd_wakeup_template: Option<&str>,
    notify_cmd_no_wakeup: Option<&str>,
    wakeup_at: Option<DateTime<Utc>>,
) {
    notify(notify_cmd_wakeup_template, notify_cmd_no_wakeup, wakeup_at);

    info!(command = suspend_cmd, "suspending");
    run_shell(suspend_cmd);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn substitute_fills_both_placeholders() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let rendered = substitute("wake --at {timestamp} --iso {iso}", at);
        assert!(rendered.contains("1700000000"));
        assert!(rendered.contains(&at.to_rfc3339()));
    }

    #[test]
    fn run_shell_reports_failure_without_panicking() {
        assert!(!run_shell("exit 1"));
        assert!(run_shell("exit 0"));
    }
}
