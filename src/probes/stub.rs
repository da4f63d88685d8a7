//! Probes whose concrete bodies are out of scope (spec.md §1 non-goals):
//! they require OS services unavailable in this build's target environment
//! (SMB/DBus/X11/network resources). Their factories still validate
//! configuration fully, so a typo in a disabled-by-default section is still
//! caught at startup; their `check()` always reports a severe, logged-once
//! failure rather than fabricating a body that can't be verified.
//!
//! Grounded on `Smb`, `Mpd`, `XIdleTime`, `LogindSessionsIdle`, `Kodi`,
//! `XPath`, `XPathDelta` in the original Python daemon.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::config::ConfigurationError;
use crate::probe::{ActivityProbe, ProbeError, WakeupProbe};
use crate::probes::util::{optional_float, optional_int, optional_str_or, required_str};

struct Stub {
    name: String,
    class: &'static str,
    warned: Arc<AtomicBool>,
}

impl Stub {
    fn new(name: &str, class: &'static str) -> Self {
        Self {
            name: name.to_string(),
            class,
            warned: Arc::new(AtomicBool::new(false)),
        }
    }

    fn fail(&self) -> ProbeError {
        if !self.warned.swap(true, Ordering::SeqCst) {
            tracing::warn!(
                probe = %self.name,
                class = self.class,
                "probe body not implemented in this build"
            );
        }
        ProbeError::Severe(format!("{} has no body in this build", self.class))
    }
}

impl ActivityProbe for Stub {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<Option<String>, ProbeError> {
        Err(self.fail())
    }
}

impl WakeupProbe for Stub {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, _now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, ProbeError> {
        Err(self.fail())
    }
}

fn validate_regex(name: &str, key: &'static str, pattern: &str) -> Result<(), ConfigurationError> {
    Regex::new(pattern).map_err(|err| ConfigurationError::InvalidValue {
        name: name.to_string(),
        key,
        reason: err.to_string(),
    })?;
    Ok(())
}

/// `[activity.<name>]` with `class = "Smb"`. No configuration keys.
pub fn create_smb(name: &str, _section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    Ok(Box::new(Stub::new(name, "Smb")))
}

/// `[activity.<name>]` with `class = "Mpd"`.
pub fn create_mpd(name: &str, section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    optional_int(name, section, "port", 6600)?;
    optional_float(name, section, "timeout", 5.0)?;
    Ok(Box::new(Stub::new(name, "Mpd")))
}

/// `[activity.<name>]` with `class = "Kodi"`.
pub fn create_kodi(name: &str, section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    optional_float(name, section, "timeout", 5.0)?;
    Ok(Box::new(Stub::new(name, "Kodi")))
}

/// `[activity.<name>]` with `class = "XIdleTime"`.
pub fn create_xidletime(name: &str, section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    optional_int(name, section, "timeout", 600)?;
    let method = optional_str_or(section, "method", "sockets");
    if method != "sockets" && method != "logind" {
        return Err(ConfigurationError::InvalidValue {
            name: name.to_string(),
            key: "method",
            reason: format!("unknown session discovery method '{method}'"),
        });
    }
    validate_regex(name, "ignore_if_process", &optional_str_or(section, "ignore_if_process", "a^"))?;
    validate_regex(name, "ignore_users", &optional_str_or(section, "ignore_users", "a^"))?;
    Ok(Box::new(Stub::new(name, "XIdleTime")))
}

/// `[activity.<name>]` with `class = "LogindSessionsIdle"`.
pub fn create_logind_sessions_idle(
    name: &str,
    _section: &toml::Value,
) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    Ok(Box::new(Stub::new(name, "LogindSessionsIdle")))
}

/// `[activity.<name>]` with `class = "XPath"`.
pub fn create_xpath_activity(
    name: &str,
    section: &toml::Value,
) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    validate_xpath_section(name, section)?;
    Ok(Box::new(Stub::new(name, "XPath")))
}

/// `[wakeup.<name>]` with `class = "WakeupXPath"`.
pub fn create_xpath_wakeup(name: &str, section: &toml::Value) -> Result<Box<dyn WakeupProbe>, ConfigurationError> {
    validate_xpath_section(name, section)?;
    Ok(Box::new(Stub::new(name, "WakeupXPath")))
}

const TIME_DELTA_UNITS: &[&str] = &[
    "days",
    "seconds",
    "microseconds",
    "milliseconds",
    "minutes",
    "hours",
    "weeks",
];

/// `[wakeup.<name>]` with `class = "WakeupXPathDelta"`.
pub fn create_xpath_delta_wakeup(
    name: &str,
    section: &toml::Value,
) -> Result<Box<dyn WakeupProbe>, ConfigurationError> {
    validate_xpath_section(name, section)?;
    let unit = optional_str_or(section, "unit", "minutes");
    if !TIME_DELTA_UNITS.contains(&unit.as_str()) {
        return Err(ConfigurationError::InvalidValue {
            name: name.to_string(),
            key: "unit",
            reason: format!("unsupported unit '{unit}'"),
        });
    }
    Ok(Box::new(Stub::new(name, "WakeupXPathDelta")))
}

fn validate_xpath_section(name: &str, section: &toml::Value) -> Result<(), ConfigurationError> {
    required_str(name, section, "xpath")?;
    required_str(name, section, "url")?;
    optional_float(name, section, "timeout", 5.0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xidletime_rejects_unknown_method() {
        let section: toml::Value = toml::from_str(r#"method = "carrier-pigeon""#).unwrap();
        assert!(create_xidletime("x", &section).is_err());
    }

    #[test]
    fn xpath_delta_rejects_unknown_unit() {
        let section: toml::Value =
            toml::from_str(r#"xpath = "//a"
url = "http://localhost"
unit = "fortnights""#)
                .unwrap();
        assert!(create_xpath_delta_wakeup("x", &section).is_err());
    }

    #[test]
    fn xpath_requires_url_and_xpath() {
        let section: toml::Value = toml::from_str("enabled = true").unwrap();
        assert!(create_xpath_activity("x", &section).is_err());
    }

    #[test]
    fn smb_stub_always_fails_at_check_time() {
        let probe = create_smb("smb", &toml::Value::Table(Default::default())).unwrap();
        assert!(probe.check().is_err());
    }
}
