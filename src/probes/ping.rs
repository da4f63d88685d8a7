//! Activity probe: reachability of one or more hosts via ICMP ping.
//!
//! Grounded on `Ping` in the original Python daemon.

use crate::config::ConfigurationError;
use crate::probe::{ActivityProbe, ProbeError};
use crate::probes::util::{required_str, split_csv};

pub struct Ping {
    name: String,
    hosts: Vec<String>,
}

pub fn create(name: &str, section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    let hosts_raw = required_str(name, section, "hosts")?;
    let hosts = split_csv(&hosts_raw);
    if hosts.is_empty() {
        return Err(ConfigurationError::InvalidValue {
            name: name.to_string(),
            key: "hosts",
            reason: "at least one host is required".to_string(),
        });
    }
    Ok(Box::new(Ping {
        name: name.to_string(),
        hosts,
    }))
}

impl ActivityProbe for Ping {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<Option<String>, ProbeError> {
        for host in &self.hosts {
            let status = std::process::Command::new("ping")
                .args(["-q", "-c", "1", host])
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status();

            match status {
                Ok(status) if status.success() => {
                    tracing::debug!(host, "host appears to be up");
                    return Ok(Some(format!("Host {host} is up")));
                }
                Ok(_) => {}
                Err(err) => {
                    return Err(ProbeError::Severe(format!("failed to execute ping: {err}")));
                }
            }
        }
        Ok(None)
    }
}
