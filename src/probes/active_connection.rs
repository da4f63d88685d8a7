//! Activity probe: an established TCP connection exists on one of the
//! configured local ports.
//!
//! Grounded on `ActiveConnection` in the original Python daemon. Reads the
//! kernel's `/proc/net/tcp{,6}` tables directly instead of linking a
//! process/connection-listing crate.

use std::collections::HashSet;

use crate::config::ConfigurationError;
use crate::probe::{ActivityProbe, ProbeError};
use crate::probes::util::required_str;

const TCP_ESTABLISHED: &str = "01";

pub struct ActiveConnection {
    name: String,
    ports: HashSet<u16>,
}

pub fn create(name: &str, section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    let raw = required_str(name, section, "ports")?;
    let mut ports = HashSet::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let port: u16 = part.parse().map_err(|_| ConfigurationError::InvalidValue {
            name: name.to_string(),
            key: "ports",
            reason: format!("'{part}' is not a valid port number"),
        })?;
        ports.insert(port);
    }
    if ports.is_empty() {
        return Err(ConfigurationError::MissingKey {
            name: name.to_string(),
            key: "ports",
        });
    }
    Ok(Box::new(ActiveConnection {
        name: name.to_string(),
        ports,
    }))
}

/// Parse the local port of each `ESTABLISHED` row in a `/proc/net/tcp{,6}`
/// style table.
fn established_local_ports(contents: &str) -> Vec<u16> {
    let mut ports = Vec::new();
    for line in contents.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }
        if fields[3] != TCP_ESTABLISHED {
            continue;
        }
        let local = fields[1];
        if let Some((_, port_hex)) = local.split_once(':') {
            if let Ok(port) = u16::from_str_radix(port_hex, 16) {
                ports.push(port);
            }
        }
    }
    ports
}

impl ActiveConnection {
    fn read_table(&self, path: &str) -> Result<Vec<u16>, ProbeError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(established_local_ports(&contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(ProbeError::Severe(format!("cannot read {path}: {err}"))),
        }
    }
}

impl ActivityProbe for ActiveConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<Option<String>, ProbeError> {
        let mut established = self.read_table("/proc/net/tcp")?;
        established.extend(self.read_table("/proc/net/tcp6")?);

        let matched: Vec<u16> = established
            .into_iter()
            .filter(|p| self.ports.contains(p))
            .collect();

        if matched.is_empty() {
            Ok(None)
        } else {
            Ok(Some(format!("Ports {matched:?} are connected")))
        }
    }
}
