//! Probe contract shared by activity and wake-up checks.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error returned from a probe's `check()`.
///
/// Both variants are swallowed by the aggregator: the probe is treated as
/// neutral for this tick and the failure is logged at warning level. The
/// distinction between the two is advisory for operators, not behavioural.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe may recover on a later tick (DNS miss, connection refused,
    /// timeout, parse error of transient data).
    #[error("transient check failure: {0}")]
    Transient(String),

    /// The probe is misconfigured or broken beyond recovery for this run
    /// (missing external binary, invariant violation).
    #[error("severe check failure: {0}")]
    Severe(String),
}

/// Checks whether the host is currently busy.
///
/// `check()` returns `Some(reason)` when the host must not suspend right
/// now, or `None` when this probe has no opinion. `None` is not an
/// assertion of idleness — the fused verdict across all probes is an OR.
pub trait ActivityProbe: Send + Sync {
    /// Stable, configuration-supplied name, unique within the activity kind.
    fn name(&self) -> &str;

    /// Determine if system activity exists that prevents suspending.
    fn check(&self) -> Result<Option<String>, ProbeError>;
}

/// Reports the next instant at which the host must be awake.
pub trait WakeupProbe: Send + Sync {
    /// Stable, configuration-supplied name, unique within the wake-up kind.
    fn name(&self) -> &str;

    /// Indicate if a wake-up has to be scheduled for this check.
    ///
    /// `now` is always a timezone-aware UTC instant. The probe may return
    /// any instant, including ones at or before `now`; the aggregator
    /// discards non-future results with a warning.
    fn check(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, ProbeError>;
}
