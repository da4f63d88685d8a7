//! Activity and wake-up probes driven by an external shell command.
//!
//! Grounded on `ExternalCommand` / `WakeupCommand` in the original Python
//! daemon.

use chrono::{DateTime, TimeZone, Utc};

use crate::config::ConfigurationError;
use crate::probe::{ActivityProbe, ProbeError, WakeupProbe};
use crate::probes::util::CommandRunner;

pub struct ExternalCommand {
    name: String,
    runner: CommandRunner,
}

pub fn create_activity(
    name: &str,
    section: &toml::Value,
) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    Ok(Box::new(ExternalCommand {
        name: name.to_string(),
        runner: CommandRunner::from_config(name, section)?,
    }))
}

impl ActivityProbe for ExternalCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<Option<String>, ProbeError> {
        match self.runner.succeeded() {
            Ok(true) => Ok(Some(format!("Command {} succeeded", self.runner.command))),
            Ok(false) => Ok(None),
            Err(err) => Err(ProbeError::Transient(format!(
                "failed to execute command: {err}"
            ))),
        }
    }
}

pub struct WakeupCommand {
    name: String,
    runner: CommandRunner,
}

pub fn create_wakeup(
    name: &str,
    section: &toml::Value,
) -> Result<Box<dyn WakeupProbe>, ConfigurationError> {
    Ok(Box::new(WakeupCommand {
        name: name.to_string(),
        runner: CommandRunner::from_config(name, section)?,
    }))
}

impl WakeupProbe for WakeupCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, _now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, ProbeError> {
        let output = self
            .runner
            .output()
            .map_err(|err| ProbeError::Transient(format!("failed to execute command: {err}")))?;

        let first_line = output.lines().next().unwrap_or("").trim();
        if first_line.is_empty() {
            return Ok(None);
        }

        let timestamp: f64 = first_line
            .parse()
            .map_err(|err| ProbeError::Transient(format!("cannot parse command output as a timestamp: {err}")))?;

        Utc.timestamp_opt(timestamp.trunc() as i64, 0)
            .single()
            .map(Some)
            .ok_or_else(|| ProbeError::Transient("command returned an out-of-range timestamp".to_string()))
    }
}
