//! Wake-up probe: a scheduled wake-up time read from a file on disk.
//!
//! Grounded on `WakeupFile` in the original Python daemon. File contents
//! are interpreted as a Unix timestamp in seconds UTC.

use chrono::{DateTime, TimeZone, Utc};

use crate::config::ConfigurationError;
use crate::probe::{ProbeError, WakeupProbe};
use crate::probes::util::required_str;

pub struct WakeupFile {
    name: String,
    path: String,
}

pub fn create(name: &str, section: &toml::Value) -> Result<Box<dyn WakeupProbe>, ConfigurationError> {
    Ok(Box::new(WakeupFile {
        name: name.to_string(),
        path: required_str(name, section, "path")?,
    }))
}

impl WakeupProbe for WakeupFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, _now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, ProbeError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ProbeError::Transient(format!("cannot read {}: {err}", self.path))),
        };

        let first_line = contents
            .lines()
            .next()
            .ok_or_else(|| ProbeError::Transient(format!("{} is empty", self.path)))?
            .trim();

        let timestamp: f64 = first_line
            .parse()
            .map_err(|err| ProbeError::Transient(format!("cannot parse {}: {err}", self.path)))?;

        Utc.timestamp_opt(timestamp.trunc() as i64, 0)
            .single()
            .map(Some)
            .ok_or_else(|| ProbeError::Transient(format!("{} contains an out-of-range timestamp", self.path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_an_error() {
        let section: toml::Value =
            toml::from_str(r#"path = "/nonexistent/path/for/autosuspendd/tests""#).unwrap();
        let probe = create("wf", &section).unwrap();
        assert_eq!(probe.check(Utc::now()).unwrap(), None);
    }

    #[test]
    fn reads_timestamp_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1700000000").unwrap();
        let section: toml::Value =
            toml::Value::try_from(std::collections::HashMap::from([(
                "path",
                file.path().to_str().unwrap(),
            )]))
            .unwrap();
        let probe = create("wf", &section).unwrap();
        let result = probe.check(Utc::now()).unwrap();
        assert_eq!(result, Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap()));
    }

    #[test]
    fn requires_path_key() {
        let section: toml::Value = toml::from_str("enabled = true").unwrap();
        assert!(create("wf", &section).is_err());
    }
}
