use crate::core::quota::ledger::{QuotaLedger, QuotaTracker};
use crate::core::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDecision {
    Stay,
    SwitchTo(usize),
    Exhausted,
}

/// Pure rotation rules. Holds the two tuning constants; never mutates the
/// ledger itself, only decides what the tracker should do with it.
#[derive(Debug, Clone, Copy)]
pub struct RotationPolicy {
    pub daily_limit: u64,
    pub switch_threshold: f64,
}

impl RotationPolicy {
    pub fn new(daily_limit: u64, switch_threshold: f64) -> Self {
        Self {
            daily_limit,
            switch_threshold,
        }
    }

    /// Usage at/above which a key is considered too hot to keep using.
    pub fn threshold_points(&self) -> u64 {
        (self.daily_limit as f64 * self.switch_threshold) as u64
    }

    pub fn at_threshold(&self, used: u64) -> bool {
        used >= self.threshold_points()
    }

    /// After a charge: if the active key crossed the threshold, move to the
    /// next key in order, but only when that key is still cool. A hot
    /// neighbor means the pool is done for the day.
    pub fn after_charge(&self, ledger: &QuotaLedger) -> RotationDecision {
        if !self.at_threshold(ledger.used(ledger.current_index)) {
            return RotationDecision::Stay;
        }
        self.next_cool_neighbor(ledger)
    }

    /// Before a call: same neighbor check, applied when the active key is
    /// already hot at operation start.
    pub fn preflight(&self, ledger: &QuotaLedger) -> RotationDecision {
        if !self.at_threshold(ledger.used(ledger.current_index)) {
            return RotationDecision::Stay;
        }
        self.next_cool_neighbor(ledger)
    }

    fn next_cool_neighbor(&self, ledger: &QuotaLedger) -> RotationDecision {
        if ledger.keys.len() < 2 {
            return RotationDecision::Exhausted;
        }
        let next = (ledger.current_index + 1) % ledger.keys.len();
        if self.at_threshold(ledger.used(next)) {
            RotationDecision::Exhausted
        } else {
            RotationDecision::SwitchTo(next)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryState {
    Active,
    RotatingRetry,
    Exhausted,
}

/// Per-operation retry state machine for provider-side quota rejections.
/// The provider can reject a key the ledger still believes is cool (usage
/// from outside this process); when that happens we rotate and retry once
/// per key, and stop when the rotation wraps back to where the operation
/// started.
pub struct OperationGuard {
    start_index: usize,
    state: RetryState,
}

impl OperationGuard {
    pub fn begin(tracker: &QuotaTracker) -> Self {
        Self {
            start_index: tracker.current_index(),
            state: RetryState::Active,
        }
    }

    /// Handles a provider quota rejection. Returns the key index to retry
    /// with, or an error when every key has been tried.
    pub fn on_quota_error(&mut self, tracker: &QuotaTracker) -> Result<usize, Error> {
        if self.state == RetryState::Exhausted {
            return Err(Error::QuotaExhausted);
        }
        let count = tracker.key_count();
        if count < 2 {
            self.state = RetryState::Exhausted;
            return Err(Error::QuotaExhausted);
        }
        let next = (tracker.current_index() + 1) % count;
        if next == self.start_index {
            self.state = RetryState::Exhausted;
            return Err(Error::QuotaExhausted);
        }
        tracker.switch_to(next)?;
        self.state = RetryState::RotatingRetry;
        Ok(next)
    }

    pub fn is_retrying(&self) -> bool {
        self.state == RetryState::RotatingRetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quota::ledger::test_support::MemoryStore;
    use crate::core::quota::ledger::{KeyUsage, QuotaLedger, QuotaTracker};

    fn ledger(usages: &[u64], current: usize) -> QuotaLedger {
        QuotaLedger {
            date: crate::core::quota::ledger::today_string(),
            current_index: current,
            keys: usages.iter().map(|&used| KeyUsage { used }).collect(),
        }
    }

    #[test]
    fn threshold_points_is_floor_of_product() {
        let policy = RotationPolicy::new(10_000, 0.8);
        assert_eq!(policy.threshold_points(), 8_000);
        assert!(!policy.at_threshold(7_999));
        assert!(policy.at_threshold(8_000));
    }

    #[test]
    fn after_charge_stays_below_threshold() {
        let policy = RotationPolicy::new(10_000, 0.8);
        let l = ledger(&[7_999, 0], 0);
        assert_eq!(policy.after_charge(&l), RotationDecision::Stay);
    }

    #[test]
    fn after_charge_switches_to_cool_neighbor() {
        let policy = RotationPolicy::new(10_000, 0.8);
        let l = ledger(&[8_100, 200], 0);
        assert_eq!(policy.after_charge(&l), RotationDecision::SwitchTo(1));
    }

    #[test]
    fn after_charge_exhausted_when_neighbor_hot() {
        let policy = RotationPolicy::new(10_000, 0.8);
        let l = ledger(&[8_100, 8_000], 0);
        assert_eq!(policy.after_charge(&l), RotationDecision::Exhausted);
    }

    #[test]
    fn rotation_wraps_to_first_key() {
        let policy = RotationPolicy::new(10_000, 0.8);
        let l = ledger(&[100, 8_100, 8_100], 2);
        assert_eq!(policy.after_charge(&l), RotationDecision::SwitchTo(0));
    }

    #[test]
    fn rotation_only_checks_immediate_neighbor() {
        // Matches the observed behavior: a cool key two slots away does not
        // save the pool when the immediate neighbor is hot.
        let policy = RotationPolicy::new(10_000, 0.8);
        let l = ledger(&[8_100, 8_100, 0], 0);
        assert_eq!(policy.after_charge(&l), RotationDecision::Exhausted);
    }

    #[test]
    fn preflight_matches_after_charge_rules() {
        let policy = RotationPolicy::new(10_000, 0.8);
        assert_eq!(policy.preflight(&ledger(&[0, 0], 0)), RotationDecision::Stay);
        assert_eq!(
            policy.preflight(&ledger(&[8_000, 0], 0)),
            RotationDecision::SwitchTo(1)
        );
        assert_eq!(
            policy.preflight(&ledger(&[8_000, 8_000], 0)),
            RotationDecision::Exhausted
        );
    }

    #[test]
    fn guard_rotates_then_stops_at_wrap() {
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 3).unwrap();
        let mut guard = OperationGuard::begin(&tracker);
        assert_eq!(guard.on_quota_error(&tracker).unwrap(), 1);
        assert!(guard.is_retrying());
        assert_eq!(guard.on_quota_error(&tracker).unwrap(), 2);
        // Next rotation would land back on the starting key.
        assert!(matches!(
            guard.on_quota_error(&tracker),
            Err(Error::QuotaExhausted)
        ));
        // Terminal: further calls stay exhausted.
        assert!(guard.on_quota_error(&tracker).is_err());
    }

    #[test]
    fn guard_single_key_is_immediately_exhausted() {
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 1).unwrap();
        let mut guard = OperationGuard::begin(&tracker);
        assert!(matches!(
            guard.on_quota_error(&tracker),
            Err(Error::QuotaExhausted)
        ));
    }

    #[test]
    fn guard_wrap_detection_uses_operation_start() {
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 3).unwrap();
        tracker.switch_to(1).unwrap();
        let mut guard = OperationGuard::begin(&tracker);
        assert_eq!(guard.on_quota_error(&tracker).unwrap(), 2);
        assert_eq!(guard.on_quota_error(&tracker).unwrap(), 0);
        assert!(guard.on_quota_error(&tracker).is_err());
    }
}
