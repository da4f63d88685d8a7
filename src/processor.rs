//! The idle-detection and suspend-orchestration state machine.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::aggregator::{execute_activity_checks, execute_wakeups};
use crate::probe::{ActivityProbe, WakeupProbe};

/// Callback invoked to notify and suspend the host. Receives the scheduled
/// wake-up instant, if any, purely for informational/notification purposes.
pub type SuspendFn = Box<dyn Fn(Option<DateTime<Utc>>) + Send + Sync>;

/// Callback invoked to arm a wake-up at the given instant.
pub type WakeupFn = Box<dyn Fn(DateTime<Utc>) + Send + Sync>;

/// Implements the logic for triggering suspension.
///
/// Holds the cross-iteration idle timer alongside the injected probe lists,
/// callbacks, and thresholds. This is the only stateful piece of the
/// decision path; everything else in this crate is either pure or a thin
/// effect adapter.
pub struct Processor {
    activities: Vec<Box<dyn ActivityProbe>>,
    wakeups: Vec<Box<dyn WakeupProbe>>,
    idle_time: chrono::Duration,
    min_sleep_time: chrono::Duration,
    wakeup_delta: chrono::Duration,
    all_activities: bool,
    suspend_fn: SuspendFn,
    wakeup_fn: WakeupFn,
    idle_since: Option<DateTime<Utc>>,
}

impl Processor {
    /// Construct a processor from already-built probe lists, thresholds in
    /// fractional seconds, and the effect callbacks.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        activities: Vec<Box<dyn ActivityProbe>>,
        wakeups: Vec<Box<dyn WakeupProbe>>,
        idle_time_secs: f64,
        min_sleep_time_secs: f64,
        wakeup_delta_secs: f64,
        all_activities: bool,
        suspend_fn: SuspendFn,
        wakeup_fn: WakeupFn,
    ) -> Self {
        Self {
            activities,
            wakeups,
            idle_time: seconds(idle_time_secs),
            min_sleep_time: seconds(min_sleep_time_secs),
            wakeup_delta: seconds(wakeup_delta_secs),
            all_activities,
            suspend_fn,
            wakeup_fn,
            idle_since: None,
        }
    }

    /// Current idle-since timestamp, exposed for the status IPC surface.
    pub fn idle_since(&self) -> Option<DateTime<Utc>> {
        self.idle_since
    }

    /// Names of the configured activity probes, in declared order.
    pub fn activity_names(&self) -> Vec<String> {
        self.activities.iter().map(|p| p.name().to_string()).collect()
    }

    /// Names of the configured wake-up probes, in declared order.
    pub fn wakeup_names(&self) -> Vec<String> {
        self.wakeups.iter().map(|p| p.name().to_string()).collect()
    }

    fn reset_state(&mut self, reason: &str) {
        info!(reason, "resetting idle timer");
        self.idle_since = None;
    }

    /// Run one tick of the decision algorithm.
    ///
    /// `now` is supplied by the caller (the main loop) to keep the
    /// processor deterministic and testable; it never reads the clock
    /// itself. `just_resumed` signals that the host just woke from
    /// suspend, per the filesystem sentinel protocol.
    pub fn iteration(&mut self, now: DateTime<Utc>, just_resumed: bool) {
        debug!("starting new check iteration");

        let active = execute_activity_checks(&self.activities, self.all_activities);
        debug!(active, "activity checks complete");

        let wakeup_at_raw = execute_wakeups(&self.wakeups, now);
        let wakeup_at = wakeup_at_raw.map(|at| at - self.wakeup_delta);
        debug!(?wakeup_at, "wakeup checks complete, delta applied");

        if just_resumed {
            self.reset_state("just resumed from suspension");
            return;
        }

        if active {
            self.reset_state("system is active");
            return;
        }

        if self.idle_since.is_none() {
            self.idle_since = Some(now);
        }
        let idle_since = self.idle_since.expect("just set above");
        info!(idle_since = %idle_since, "system is idle");

        let idle_for = now - idle_since;
        debug!(idle_for_secs = idle_for.num_seconds(), "idle duration");
        if idle_for <= self.idle_time {
            debug!("desired idle time not reached yet");
            return;
        }
        info!("system is idle long enough");

        if let Some(wakeup_at) = wakeup_at {
            let wakeup_in = wakeup_at - now;
            if wakeup_in < self.min_sleep_time {
                info!(
                    wakeup_in_secs = wakeup_in.num_seconds(),
                    min_sleep_secs = self.min_sleep_time.num_seconds(),
                    "next wakeup is too close, not suspending"
                );
                return;
            }

            info!(wakeup_at = %wakeup_at, "scheduling wakeup");
            (self.wakeup_fn)(wakeup_at);
        }

        self.reset_state("going to suspend");
        (self.suspend_fn)(wakeup_at);
    }
}

fn seconds(value: f64) -> chrono::Duration {
    chrono::Duration::milliseconds((value * 1000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;
    use std::sync::{Arc, Mutex};

    struct ConstActivity {
        name: &'static str,
        result: Result<Option<&'static str>, ()>,
    }

    impl ActivityProbe for ConstActivity {
        fn name(&self) -> &str {
            self.name
        }

        fn check(&self) -> Result<Option<String>, ProbeError> {
            match self.result {
                Ok(v) => Ok(v.map(|s| s.to_string())),
                Err(()) => Err(ProbeError::Transient("boom".into())),
            }
        }
    }

    struct ConstWakeup {
        at: Option<DateTime<Utc>>,
    }

    impl WakeupProbe for ConstWakeup {
        fn name(&self) -> &str {
            "wakeup"
        }

        fn check(&self, _now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, ProbeError> {
            Ok(self.at)
        }
    }

    /// Build a processor with configurable activity/wakeup sources and
    /// recorders for the two effect callbacks, matching the scenarios in
    /// SPEC_FULL.md / spec.md §8.
    fn make_processor(
        activities: Vec<Box<dyn ActivityProbe>>,
        wakeups: Vec<Box<dyn WakeupProbe>>,
        idle_time: f64,
        min_sleep_time: f64,
        wakeup_delta: f64,
    ) -> (Processor, Arc<Mutex<Vec<Option<DateTime<Utc>>>>>, Arc<Mutex<Vec<DateTime<Utc>>>>) {
        let suspend_calls: Arc<Mutex<Vec<Option<DateTime<Utc>>>>> = Arc::new(Mutex::new(Vec::new()));
        let wakeup_calls: Arc<Mutex<Vec<DateTime<Utc>>>> = Arc::new(Mutex::new(Vec::new()));

        let suspend_recorder = Arc::clone(&suspend_calls);
        let wakeup_recorder = Arc::clone(&wakeup_calls);

        let processor = Processor::new(
            activities,
            wakeups,
            idle_time,
            min_sleep_time,
            wakeup_delta,
            false,
            Box::new(move |at| suspend_recorder.lock().unwrap().push(at)),
            Box::new(move |at| wakeup_recorder.lock().unwrap().push(at)),
        );

        (processor, suspend_calls, wakeup_calls)
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn cold_start_no_activity_no_wake_suspends_after_idle_threshold() {
        let (mut p, suspends, wakeups) = make_processor(vec![], vec![], 300.0, 1200.0, 30.0);
        let t0 = t0();

        p.iteration(t0, false);
        assert_eq!(p.idle_since(), Some(t0));
        assert!(suspends.lock().unwrap().is_empty());

        p.iteration(t0 + chrono::Duration::seconds(301), false);
        assert_eq!(suspends.lock().unwrap().len(), 1);
        assert!(wakeups.lock().unwrap().is_empty());
        assert_eq!(p.idle_since(), None);
    }

    #[test]
    fn activity_seen_mid_idle_resets_timer() {
        let flag = Arc::new(Mutex::new(false));
        let flag2 = Arc::clone(&flag);
        struct Toggle(Arc<Mutex<bool>>);
        impl ActivityProbe for Toggle {
            fn name(&self) -> &str {
                "toggle"
            }
            fn check(&self) -> Result<Option<String>, ProbeError> {
                Ok(if *self.0.lock().unwrap() {
                    Some("Host up".to_string())
                } else {
                    None
                })
            }
        }
        let (mut p, suspends, _) = make_processor(vec![Box::new(Toggle(flag2))], vec![], 300.0, 1200.0, 30.0);
        let t0 = t0();

        p.iteration(t0, false);
        assert_eq!(p.idle_since(), Some(t0));

        for i in [60, 120, 180, 240] {
            p.iteration(t0 + chrono::Duration::seconds(i), false);
            assert_eq!(p.idle_since(), Some(t0));
        }

        *flag.lock().unwrap() = true;
        p.iteration(t0 + chrono::Duration::seconds(300), false);
        assert_eq!(p.idle_since(), None);
        assert!(suspends.lock().unwrap().is_empty());
    }

    #[test]
    fn wakeup_below_floor_blocks_suspend_but_preserves_idle_since() {
        let t0 = t0();
        let wakeup_at = t0 + chrono::Duration::seconds(500);
        let (mut p, suspends, wakeups) = make_processor(
            vec![],
            vec![Box::new(ConstWakeup { at: Some(wakeup_at) })],
            300.0,
            1200.0,
            30.0,
        );

        p.iteration(t0, false);
        let first_idle_since = p.idle_since();
        assert_eq!(first_idle_since, Some(t0));

        p.iteration(t0 + chrono::Duration::seconds(301), false);
        assert!(suspends.lock().unwrap().is_empty());
        assert!(wakeups.lock().unwrap().is_empty());
        assert_eq!(p.idle_since(), first_idle_since);
    }

    #[test]
    fn wakeup_above_floor_schedules_then_suspends() {
        let t0 = t0();
        let wakeup_at = t0 + chrono::Duration::seconds(2000);
        let (mut p, suspends, wakeups) = make_processor(
            vec![],
            vec![Box::new(ConstWakeup { at: Some(wakeup_at) })],
            300.0,
            1200.0,
            30.0,
        );

        p.iteration(t0, false);
        p.iteration(t0 + chrono::Duration::seconds(301), false);

        let wakeup_calls = wakeups.lock().unwrap();
        assert_eq!(wakeup_calls.len(), 1);
        assert_eq!(wakeup_calls[0], wakeup_at - chrono::Duration::seconds(30));

        let suspend_calls = suspends.lock().unwrap();
        assert_eq!(suspend_calls.len(), 1);
        assert_eq!(suspend_calls[0], Some(wakeup_at - chrono::Duration::seconds(30)));
        assert_eq!(p.idle_since(), None);
    }

    #[test]
    fn resume_refractory_resets_without_suspending_even_past_threshold() {
        let (mut p, suspends, wakeups) = make_processor(vec![], vec![], 300.0, 1200.0, 30.0);
        let t0 = t0();

        p.iteration(t0, false);
        p.iteration(t0 + chrono::Duration::seconds(301), true);

        assert!(suspends.lock().unwrap().is_empty());
        assert!(wakeups.lock().unwrap().is_empty());
        assert_eq!(p.idle_since(), None);
    }

    #[test]
    fn two_consecutive_resumes_are_indistinguishable_from_one() {
        let (mut p, _, _) = make_processor(vec![], vec![], 300.0, 1200.0, 30.0);
        let t0 = t0();
        p.iteration(t0, true);
        assert_eq!(p.idle_since(), None);
        p.iteration(t0 + chrono::Duration::seconds(1), true);
        assert_eq!(p.idle_since(), None);
    }

    #[test]
    fn idle_then_active_then_idle_gets_a_fresh_idle_since() {
        let flag = Arc::new(Mutex::new(false));
        let flag2 = Arc::clone(&flag);
        struct Toggle(Arc<Mutex<bool>>);
        impl ActivityProbe for Toggle {
            fn name(&self) -> &str {
                "toggle"
            }
            fn check(&self) -> Result<Option<String>, ProbeError> {
                Ok(if *self.0.lock().unwrap() {
                    Some("busy".to_string())
                } else {
                    None
                })
            }
        }
        let (mut p, _, _) = make_processor(vec![Box::new(Toggle(flag2))], vec![], 300.0, 1200.0, 30.0);
        let t0 = t0();

        p.iteration(t0, false);
        let first_idle_since = p.idle_since();
        assert_eq!(first_idle_since, Some(t0));

        *flag.lock().unwrap() = true;
        p.iteration(t0 + chrono::Duration::seconds(60), false);
        assert_eq!(p.idle_since(), None);

        *flag.lock().unwrap() = false;
        let t1 = t0 + chrono::Duration::seconds(120);
        p.iteration(t1, false);
        assert_eq!(p.idle_since(), Some(t1));
        assert_ne!(p.idle_since(), first_idle_since);
    }

    #[test]
    fn probe_failure_does_not_stop_the_tick() {
        let activities: Vec<Box<dyn ActivityProbe>> = vec![
            Box::new(ConstActivity {
                name: "flaky",
                result: Err(()),
            }),
            Box::new(ConstActivity {
                name: "mpd",
                result: Ok(Some("MPD currently playing")),
            }),
        ];
        let (mut p, suspends, _) = make_processor(activities, vec![], 300.0, 1200.0, 30.0);
        let t0 = t0();
        p.iteration(t0, false);
        assert_eq!(p.idle_since(), None);
        assert!(suspends.lock().unwrap().is_empty());
    }

    #[test]
    fn wakeup_scheduled_iff_suspend_issued_and_wakeup_present() {
        // No wakeup at all: suspend fires, wakeup callback never does.
        let (mut p, suspends, wakeups) = make_processor(vec![], vec![], 300.0, 1200.0, 30.0);
        let t0 = t0();
        p.iteration(t0, false);
        p.iteration(t0 + chrono::Duration::seconds(301), false);
        assert_eq!(suspends.lock().unwrap().len(), 1);
        assert!(wakeups.lock().unwrap().is_empty());
    }
}
