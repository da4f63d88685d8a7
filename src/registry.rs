//! Maps configuration class names to probe constructors and builds the
//! ordered probe lists the processor consumes.
//!
//! Replaces the original daemon's dynamic `globals()[class_name]`
//! reflection with an explicit static table, per SPEC_FULL.md §9 - clearer
//! and safer than attempting to preserve class-name-to-type reflection in
//! a statically typed language.

use crate::config::{class_name, is_enabled, ConfigurationError, DaemonConfig};
use crate::probe::{ActivityProbe, WakeupProbe};
use crate::probes;

type ActivityFactory = fn(&str, &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError>;
type WakeupFactory = fn(&str, &toml::Value) -> Result<Box<dyn WakeupProbe>, ConfigurationError>;

const ACTIVITY_PROBES: &[(&str, ActivityFactory)] = &[
    ("Ping", probes::ping::create),
    ("Load", probes::load::create),
    ("Processes", probes::processes::create),
    ("ActiveConnection", probes::active_connection::create),
    ("NetworkBandwidth", probes::network_bandwidth::create),
    ("ExternalCommand", probes::external_command::create_activity),
    ("Users", probes::users::create),
    ("Smb", probes::stub::create_smb),
    ("Mpd", probes::stub::create_mpd),
    ("Kodi", probes::stub::create_kodi),
    ("XIdleTime", probes::stub::create_xidletime),
    ("LogindSessionsIdle", probes::stub::create_logind_sessions_idle),
    ("XPath", probes::stub::create_xpath_activity),
];

const WAKEUP_PROBES: &[(&str, WakeupFactory)] = &[
    ("WakeupFile", probes::wakeup_file::create),
    ("WakeupCommand", probes::external_command::create_wakeup),
    ("WakeupXPath", probes::stub::create_xpath_wakeup),
    ("WakeupXPathDelta", probes::stub::create_xpath_delta_wakeup),
];

fn lookup_activity(class: &str) -> Option<ActivityFactory> {
    ACTIVITY_PROBES.iter().find(|(name, _)| *name == class).map(|(_, f)| *f)
}

fn lookup_wakeup(class: &str) -> Option<WakeupFactory> {
    WAKEUP_PROBES.iter().find(|(name, _)| *name == class).map(|(_, f)| *f)
}

/// Build the ordered list of enabled activity probes from `[activity.*]`
/// sections. An empty result is a configuration error: spec.md requires at
/// least one activity probe.
pub fn build_activity_probes(config: &DaemonConfig) -> Result<Vec<Box<dyn ActivityProbe>>, ConfigurationError> {
    let mut probes = Vec::new();

    for (name, section) in &config.activity {
        if !is_enabled(section) {
            tracing::debug!(probe = %name, "skipping disabled activity check");
            continue;
        }
        let class = class_name(name, section);
        tracing::info!(probe = %name, class = %class, "configuring activity check");
        let factory = lookup_activity(&class).ok_or_else(|| ConfigurationError::UnknownClass {
            class: class.clone(),
        })?;
        probes.push(factory(name, section)?);
    }

    if probes.is_empty() {
        return Err(ConfigurationError::NoneConfigured { prefix: "activity" });
    }

    Ok(probes)
}

/// Build the ordered list of enabled wake-up probes from `[wakeup.*]`
/// sections. Unlike activity probes, an empty result is acceptable.
pub fn build_wakeup_probes(config: &DaemonConfig) -> Result<Vec<Box<dyn WakeupProbe>>, ConfigurationError> {
    let mut probes = Vec::new();

    for (name, section) in &config.wakeup {
        if !is_enabled(section) {
            tracing::debug!(probe = %name, "skipping disabled wakeup check");
            continue;
        }
        let class = class_name(name, section);
        tracing::info!(probe = %name, class = %class, "configuring wakeup check");
        let factory = lookup_wakeup(&class).ok_or_else(|| ConfigurationError::UnknownClass {
            class: class.clone(),
        })?;
        probes.push(factory(name, section)?);
    }

    Ok(probes)
}
