//! Improvement-phase budget: deadline, step limits and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Unimproved-step bound applied when nothing else limits the search.
pub const DEFAULT_UNIMPROVED_STEP_LIMIT: u64 = 200;

/// Tracks the improvement-phase budget and the step counters.
///
/// The deadline and the cancel flag are polled between move evaluations
/// through [`Termination::is_expired`]; step limits are checked once per
/// step by [`Termination::should_stop`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_vrp::search::Termination;
///
/// let mut t = Termination::new(None).with_step_limit(Some(2));
/// assert!(!t.should_stop());
/// t.record_step(true);
/// t.record_step(false);
/// assert!(t.should_stop());
/// assert_eq!(t.improvements(), 1);
///
/// let t = Termination::new(Some(Duration::ZERO));
/// assert!(t.is_expired());
/// ```
#[derive(Debug)]
pub struct Termination<'c> {
    start: Instant,
    time_limit: Option<Duration>,
    step_limit: Option<u64>,
    unimproved_step_limit: Option<u64>,
    cancel: Option<&'c AtomicBool>,
    steps: u64,
    improvements: u64,
    unimproved: u64,
}

impl<'c> Termination<'c> {
    /// Starts the clock.
    ///
    /// Without a time limit an unimproved-step bound of
    /// [`DEFAULT_UNIMPROVED_STEP_LIMIT`] applies until another one is set.
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            time_limit,
            step_limit: None,
            unimproved_step_limit: time_limit.is_none().then_some(DEFAULT_UNIMPROVED_STEP_LIMIT),
            cancel: None,
            steps: 0,
            improvements: 0,
            unimproved: 0,
        }
    }

    /// Caps the total number of steps.
    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.step_limit = limit;
        self
    }

    /// Caps consecutive steps without a new best. Ignored when a time limit
    /// is set, unless no other bound exists.
    pub fn with_unimproved_step_limit(mut self, limit: Option<u64>) -> Self {
        self.unimproved_step_limit = match (self.time_limit, limit) {
            (Some(_), _) => None,
            (None, Some(l)) => Some(l),
            (None, None) if self.step_limit.is_none() => Some(DEFAULT_UNIMPROVED_STEP_LIMIT),
            (None, None) => None,
        };
        self
    }

    /// Stops the search once `flag` is set.
    pub fn with_cancel(mut self, flag: &'c AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Records one applied (or attempted) step.
    pub fn record_step(&mut self, improved_best: bool) {
        self.steps += 1;
        if improved_best {
            self.improvements += 1;
            self.unimproved = 0;
        } else {
            self.unimproved += 1;
        }
    }

    /// Deadline passed or cancellation requested.
    pub fn is_expired(&self) -> bool {
        self.time_limit_reached() || self.cancelled()
    }

    /// Whether the search should stop before the next step.
    pub fn should_stop(&self) -> bool {
        self.is_expired()
            || self.step_limit.is_some_and(|l| self.steps >= l)
            || self.unimproved_step_limit.is_some_and(|l| self.unimproved >= l)
    }

    /// Whether the deadline has passed.
    pub fn time_limit_reached(&self) -> bool {
        self.time_limit.is_some_and(|l| self.start.elapsed() >= l)
    }

    /// Whether cancellation was requested.
    pub fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|c| c.load(Ordering::Relaxed))
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn improvements(&self) -> u64 {
        self.improvements
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unimproved_limit_without_deadline() {
        let mut t = Termination::new(None).with_unimproved_step_limit(Some(3));
        t.record_step(false);
        t.record_step(false);
        t.record_step(true);
        t.record_step(false);
        assert!(!t.should_stop());
        t.record_step(false);
        t.record_step(false);
        assert!(t.should_stop());
    }

    #[test]
    fn test_deadline_disables_unimproved_limit() {
        let mut t = Termination::new(Some(Duration::from_secs(3600))).with_unimproved_step_limit(Some(1));
        t.record_step(false);
        t.record_step(false);
        assert!(!t.should_stop());
    }

    #[test]
    fn test_default_bound_applies() {
        let mut t = Termination::new(None).with_unimproved_step_limit(None);
        for _ in 0..DEFAULT_UNIMPROVED_STEP_LIMIT {
            t.record_step(false);
        }
        assert!(t.should_stop());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = AtomicBool::new(false);
        let t = Termination::new(None).with_cancel(&flag);
        assert!(!t.should_stop());
        flag.store(true, Ordering::Relaxed);
        assert!(t.cancelled());
        assert!(t.should_stop());
    }
}
