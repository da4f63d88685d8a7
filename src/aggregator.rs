//! Pure functions that fuse probe results into a single verdict per tick.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::probe::{ActivityProbe, ProbeError, WakeupProbe};

/// Execute activity checks in declared order.
///
/// Returns `true` if any probe matched (reported a reason the host is
/// busy). With `run_all = false` (the production path), execution stops at
/// the first match. With `run_all = true` (debug mode, `-a`), every probe is
/// invoked regardless, to surface all matching reasons in one tick.
///
/// Individual probe failures are logged at warning level and otherwise
/// ignored - a broken probe must not prevent the others from making
/// progress.
pub fn execute_activity_checks(probes: &[Box<dyn ActivityProbe>], run_all: bool) -> bool {
    let mut matched = false;

    for probe in probes {
        debug!(probe = probe.name(), "executing activity check");
        match probe.check() {
            Ok(Some(reason)) => {
                info!(probe = probe.name(), reason = %reason, "activity check matched");
                matched = true;
                if !run_all {
                    debug!("skipping further activity checks");
                    break;
                }
            }
            Ok(None) => {}
            Err(ProbeError::Transient(reason)) => {
                warn!(probe = probe.name(), reason = %reason, "activity check failed, ignoring");
            }
            Err(ProbeError::Severe(reason)) => {
                warn!(probe = probe.name(), reason = %reason, "activity check failed severely, ignoring");
            }
        }
    }

    matched
}

/// Execute wake-up checks in declared order and return the earliest future
/// instant reported, or `None` if no probe has one.
///
/// Results at or before `now` are discarded with a warning (probe
/// misbehaviour, per the contract in `probe.rs`). Probe failures are logged
/// and ignored like `execute_activity_checks`.
pub fn execute_wakeups(
    probes: &[Box<dyn WakeupProbe>],
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let mut earliest: Option<DateTime<Utc>> = None;

    for probe in probes {
        debug!(probe = probe.name(), "executing wakeup check");
        match probe.check(now) {
            Ok(Some(at)) if at <= now => {
                warn!(
                    probe = probe.name(),
                    at = %at,
                    now = %now,
                    "wakeup check returned a non-future instant, ignoring"
                );
            }
            Ok(Some(at)) => {
                earliest = Some(match earliest {
                    Some(current) => current.min(at),
                    None => at,
                });
            }
            Ok(None) => {}
            Err(ProbeError::Transient(reason)) => {
                warn!(probe = probe.name(), reason = %reason, "wakeup check failed, ignoring");
            }
            Err(ProbeError::Severe(reason)) => {
                warn!(probe = probe.name(), reason = %reason, "wakeup check failed severely, ignoring");
            }
        }
    }

    earliest
}
