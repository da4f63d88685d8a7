//! Activity probe: system load average exceeds a threshold.
//!
//! Grounded on `Load` in the original Python daemon.

use crate::config::ConfigurationError;
use crate::probe::{ActivityProbe, ProbeError};
use crate::probes::util::optional_float;

pub struct Load {
    name: String,
    threshold: f64,
}

pub fn create(name: &str, section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    let threshold = optional_float(name, section, "threshold", 2.5)?;
    Ok(Box::new(Load {
        name: name.to_string(),
        threshold,
    }))
}

impl ActivityProbe for Load {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<Option<String>, ProbeError> {
        let contents = std::fs::read_to_string("/proc/loadavg")
            .map_err(|err| ProbeError::Severe(format!("cannot read /proc/loadavg: {err}")))?;
        let five_min: f64 = contents
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| ProbeError::Severe("unexpected /proc/loadavg format".to_string()))?
            .parse()
            .map_err(|err| ProbeError::Severe(format!("cannot parse load average: {err}")))?;

        tracing::debug!(load = five_min, "current load");
        if five_min > self.threshold {
            Ok(Some(format!(
                "Load {} > threshold {}",
                five_min, self.threshold
            )))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_two_point_five() {
        let section: toml::Value = toml::from_str("enabled = true").unwrap();
        let _probe = create("load", &section).unwrap();
    }

    #[test]
    fn rejects_non_numeric_threshold() {
        let section: toml::Value = toml::from_str(r#"threshold = "high""#).unwrap();
        assert!(create("load", &section).is_err());
    }
}
