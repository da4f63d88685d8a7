//! Activity probe: send/receive byte rate on configured interfaces exceeds
//! a threshold.
//!
//! Grounded on `NetworkBandwidth` in the original Python daemon. Reads
//! `/proc/net/dev` counters on successive ticks and derives a rate; the
//! first tick after construction never matches since there is no prior
//! sample yet.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::ConfigurationError;
use crate::probe::{ActivityProbe, ProbeError};
use crate::probes::util::{optional_float, required_str, split_csv};

#[derive(Clone, Copy)]
struct Counters {
    bytes_sent: u64,
    bytes_recv: u64,
}

struct Sample {
    at: Instant,
    counters: HashMap<String, Counters>,
}

pub struct NetworkBandwidth {
    name: String,
    interfaces: Vec<String>,
    threshold_send: f64,
    threshold_receive: f64,
    previous: Mutex<Option<Sample>>,
}

pub fn create(name: &str, section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    let raw = required_str(name, section, "interfaces")?;
    let interfaces = split_csv(&raw);
    if interfaces.is_empty() {
        return Err(ConfigurationError::InvalidValue {
            name: name.to_string(),
            key: "interfaces",
            reason: "at least one interface is required".to_string(),
        });
    }
    let threshold_send = optional_float(name, section, "threshold_send", 100.0)?;
    let threshold_receive = optional_float(name, section, "threshold_receive", 100.0)?;

    Ok(Box::new(NetworkBandwidth {
        name: name.to_string(),
        interfaces,
        threshold_send,
        threshold_receive,
        previous: Mutex::new(None),
    }))
}

fn read_proc_net_dev() -> Result<HashMap<String, Counters>, ProbeError> {
    let contents = std::fs::read_to_string("/proc/net/dev")
        .map_err(|err| ProbeError::Severe(format!("cannot read /proc/net/dev: {err}")))?;

    let mut result = HashMap::new();
    for line in contents.lines().skip(2) {
        let Some((iface, rest)) = line.split_once(':') else {
            continue;
        };
        let iface = iface.trim().to_string();
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }
        let bytes_recv: u64 = fields[0].parse().unwrap_or(0);
        let bytes_sent: u64 = fields[8].parse().unwrap_or(0);
        result.insert(iface, Counters { bytes_sent, bytes_recv });
    }
    Ok(result)
}

impl ActivityProbe for NetworkBandwidth {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<Option<String>, ProbeError> {
        let now = Instant::now();
        let current = read_proc_net_dev()?;

        let mut guard = self.previous.lock().unwrap();
        let previous = guard.replace(Sample {
            at: now,
            counters: current.clone(),
        });

        let Some(previous) = previous else {
            return Ok(None);
        };

        let elapsed = now.duration_since(previous.at).as_secs_f64();
        if elapsed <= 0.0 {
            return Ok(None);
        }

        for interface in &self.interfaces {
            let (Some(new), Some(old)) = (current.get(interface), previous.counters.get(interface)) else {
                return Err(ProbeError::Transient(format!("interface {interface} is missing")));
            };

            let rate_send = new.bytes_sent.saturating_sub(old.bytes_sent) as f64 / elapsed;
            if rate_send > self.threshold_send {
                return Ok(Some(format!(
                    "Interface {interface} sending rate {rate_send} byte/s higher than threshold {}",
                    self.threshold_send
                )));
            }

            let rate_recv = new.bytes_recv.saturating_sub(old.bytes_recv) as f64 / elapsed;
            if rate_recv > self.threshold_receive {
                return Ok(Some(format!(
                    "Interface {interface} receive rate {rate_recv} byte/s higher than threshold {}",
                    self.threshold_receive
                )));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_interfaces_key() {
        let section: toml::Value = toml::from_str("enabled = true").unwrap();
        assert!(create("net", &section).is_err());
    }

    #[test]
    fn first_call_never_matches() {
        let section: toml::Value = toml::from_str(r#"interfaces = "lo""#).unwrap();
        let probe = create("net", &section).unwrap();
        assert_eq!(probe.check().unwrap(), None);
    }
}
