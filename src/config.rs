//! Configuration for the autosuspend daemon.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing or validating configuration.
///
/// Fatal to daemon startup; the process exits with code 2.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot create check named {class}: class does not exist")]
    UnknownClass { class: String },

    #[error("no checks enabled for {prefix}")]
    NoneConfigured { prefix: &'static str },

    #[error("missing required option '{key}' for check {name}")]
    MissingKey { name: String, key: &'static str },

    #[error("invalid value for option '{key}' of check {name}: {reason}")]
    InvalidValue {
        name: String,
        key: &'static str,
        reason: String,
    },

    #[error("general.suspend_cmd is required")]
    MissingSuspendCmd,

    #[error("general.wakeup_cmd is required because at least one wakeup check is enabled")]
    MissingWakeupCmd,
}

/// Top-level configuration tree, read once at startup and immutable
/// thereafter.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    /// `[activity.<name>]` sections, keyed by instance name.
    ///
    /// A `BTreeMap` rather than a `HashMap`: the probe registry iterates
    /// probes in a stable order for short-circuit semantics, and TOML
    /// table deserialization does not preserve declaration order without
    /// an extra dependency. Alphabetical-by-name is the chosen
    /// approximation of the original's file-declaration order; see
    /// DESIGN.md.
    #[serde(default)]
    pub activity: BTreeMap<String, toml::Value>,

    /// `[wakeup.<name>]` sections, keyed by instance name. See `activity`.
    #[serde(default)]
    pub wakeup: BTreeMap<String, toml::Value>,
}

/// The `[general]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Seconds between main loop ticks.
    #[serde(default = "default_interval")]
    pub interval: f64,

    /// Seconds of contiguous inactivity required before suspension is
    /// considered.
    #[serde(default = "default_idle_time")]
    pub idle_time: f64,

    /// Minimum sleep duration below which a suspend is not worth arming.
    #[serde(default = "default_min_sleep_time")]
    pub min_sleep_time: f64,

    /// Offset by which an armed wake-up precedes the requested instant.
    #[serde(default = "default_wakeup_delta")]
    pub wakeup_delta: f64,

    /// Shell command template used to suspend the host. Required.
    pub suspend_cmd: Option<String>,

    /// Shell command template used to arm a wake-up. Accepts `{timestamp}`
    /// and `{iso}` substitutions. Required if any wakeup check is enabled.
    pub wakeup_cmd: Option<String>,

    /// Notification command template, run before suspending when a wake-up
    /// is scheduled. Accepts the same substitutions as `wakeup_cmd`.
    pub notify_cmd_wakeup: Option<String>,

    /// Notification command run before suspending when no wake-up is
    /// scheduled. No substitutions.
    pub notify_cmd_no_wakeup: Option<String>,

    /// Sentinel path signalling that the host just resumed from suspend.
    #[serde(default = "default_woke_up_file")]
    pub woke_up_file: String,

    /// Execute all activity checks every tick, even after one matches.
    /// Overridden by the `-a` CLI flag.
    #[serde(default)]
    pub all_checks: bool,

    /// Run probes of the same kind concurrently instead of sequentially.
    /// See REDESIGN FLAGS in SPEC_FULL.md.
    #[serde(default)]
    pub parallel_probes: bool,

    /// Unix socket path for the status IPC surface.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            idle_time: default_idle_time(),
            min_sleep_time: default_min_sleep_time(),
            wakeup_delta: default_wakeup_delta(),
            suspend_cmd: None,
            wakeup_cmd: None,
            notify_cmd_wakeup: None,
            notify_cmd_no_wakeup: None,
            woke_up_file: default_woke_up_file(),
            all_checks: false,
            parallel_probes: false,
            socket_path: default_socket_path(),
        }
    }
}

fn default_interval() -> f64 {
    60.0
}

fn default_idle_time() -> f64 {
    300.0
}

fn default_min_sleep_time() -> f64 {
    1200.0
}

fn default_wakeup_delta() -> f64 {
    30.0
}

fn default_woke_up_file() -> String {
    "/var/run/autosuspend-just-woke-up".to_string()
}

fn default_socket_path() -> String {
    "/run/autosuspendd/autosuspendd.sock".to_string()
}

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Resolve the effective class name for a probe section: an explicit
/// `class` key takes priority, otherwise the instance name is used, same
/// precedence the original daemon's `set_up_checks` applies.
pub fn class_name(name: &str, section: &toml::Value) -> String {
    section
        .get("class")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Whether a probe section is enabled. Defaults to `false`.
pub fn is_enabled(section: &toml::Value) -> bool {
    section
        .get("enabled")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let general = GeneralConfig::default();
        assert_eq!(general.interval, 60.0);
        assert_eq!(general.idle_time, 300.0);
        assert_eq!(general.min_sleep_time, 1200.0);
        assert_eq!(general.wakeup_delta, 30.0);
        assert_eq!(general.woke_up_file, "/var/run/autosuspend-just-woke-up");
    }

    #[test]
    fn class_falls_back_to_instance_name() {
        let section: toml::Value = toml::from_str("enabled = true").unwrap();
        assert_eq!(class_name("ping", &section), "ping");
    }

    #[test]
    fn explicit_class_overrides_instance_name() {
        let section: toml::Value = toml::from_str("enabled = true\nclass = \"Ping\"").unwrap();
        assert_eq!(class_name("my-ping", &section), "Ping");
    }

    #[test]
    fn parses_general_section() {
        let toml_str = r#"
            [general]
            idle_time = 120
            suspend_cmd = "systemctl suspend"

            [activity.ping]
            enabled = true
            hosts = "192.168.1.1"
        "#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.idle_time, 120.0);
        assert_eq!(
            config.general.suspend_cmd.as_deref(),
            Some("systemctl suspend")
        );
        assert!(is_enabled(&config.activity["ping"]));
    }
}
