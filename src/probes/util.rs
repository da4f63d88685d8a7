//! Shared configuration-extraction helpers for probe factories.
//!
//! These are the horizontal "mixin" capabilities from the original design
//! (command invocation, required/optional key lookup) modelled as plain
//! helper functions rather than a trait hierarchy, per SPEC_FULL.md §9.

use crate::config::ConfigurationError;

pub fn required_str(name: &str, section: &toml::Value, key: &'static str) -> Result<String, ConfigurationError> {
    section
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| ConfigurationError::MissingKey {
            name: name.to_string(),
            key,
        })
}

pub fn optional_str(section: &toml::Value, key: &str) -> Option<String> {
    section.get(key).and_then(|v| v.as_str()).map(|s| s.trim().to_string())
}

pub fn optional_str_or<'a>(section: &'a toml::Value, key: &str, default: &'a str) -> String {
    optional_str(section, key).unwrap_or_else(|| default.to_string())
}

pub fn optional_float(
    name: &str,
    section: &toml::Value,
    key: &'static str,
    default: f64,
) -> Result<f64, ConfigurationError> {
    match section.get(key) {
        None => Ok(default),
        Some(v) => v.as_float().or_else(|| v.as_integer().map(|i| i as f64)).ok_or_else(|| {
            ConfigurationError::InvalidValue {
                name: name.to_string(),
                key,
                reason: "expected a number".to_string(),
            }
        }),
    }
}

pub fn optional_int(
    name: &str,
    section: &toml::Value,
    key: &'static str,
    default: i64,
) -> Result<i64, ConfigurationError> {
    match section.get(key) {
        None => Ok(default),
        Some(v) => v.as_integer().ok_or_else(|| ConfigurationError::InvalidValue {
            name: name.to_string(),
            key,
            reason: "expected an integer".to_string(),
        }),
    }
}

/// Split a comma-separated list string into trimmed, non-empty parts.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A command-invoking probe's shared state: a shell command string,
/// modelling the original `CommandMixin`.
pub struct CommandRunner {
    pub command: String,
}

impl CommandRunner {
    pub fn from_config(name: &str, section: &toml::Value) -> Result<Self, ConfigurationError> {
        Ok(Self {
            command: required_str(name, section, "command")?,
        })
    }

    /// Run the command via the shell, returning whether it exited
    /// successfully.
    pub fn succeeded(&self) -> std::io::Result<bool> {
        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;
        Ok(status.success())
    }

    /// Run the command via the shell and capture stdout as a string.
    pub fn output(&self) -> std::io::Result<String> {
        let output = std::process::Command::new("sh").arg("-c").arg(&self.command).output()?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_str_missing_is_error() {
        let section: toml::Value = toml::from_str("enabled = true").unwrap();
        assert!(required_str("x", &section, "command").is_err());
    }

    #[test]
    fn split_csv_trims_and_drops_empty() {
        assert_eq!(split_csv(" a, b ,, c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn optional_float_accepts_integers() {
        let section: toml::Value = toml::from_str("threshold = 5").unwrap();
        assert_eq!(optional_float("x", &section, "threshold", 1.0).unwrap(), 5.0);
    }
}
