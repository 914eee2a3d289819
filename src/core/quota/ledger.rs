use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::core::error::Error;
use crate::core::quota::rotation::{RotationDecision, RotationPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyUsage {
    pub used: u64,
}

/// Per-key daily usage, one slot per configured key in configuration order.
/// The single source of truth for "how much quota has this key burned today".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaLedger {
    /// Local calendar day this ledger applies to, "%Y-%m-%d".
    pub date: String,
    pub current_index: usize,
    pub keys: Vec<KeyUsage>,
}

pub fn today_string() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

impl QuotaLedger {
    pub fn fresh(key_count: usize) -> Self {
        Self {
            date: today_string(),
            current_index: 0,
            keys: vec![KeyUsage { used: 0 }; key_count],
        }
    }

    pub fn used(&self, index: usize) -> u64 {
        self.keys.get(index).map(|k| k.used).unwrap_or(0)
    }

    pub fn is_current_day(&self) -> bool {
        self.date == today_string()
    }
}

/// Durable storage port for the ledger. Injected so the tracker never
/// touches ambient global state.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<Option<QuotaLedger>, Error>;
    fn save(&self, ledger: &QuotaLedger) -> Result<(), Error>;
}

/// JSON file store under the XDG state directory.
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        state_dir().join("key-quotas.json")
    }
}

pub(crate) fn state_dir() -> PathBuf {
    let base = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join(".local")
                .join("state")
        });
    base.join("tubedash")
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self) -> Result<Option<QuotaLedger>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<QuotaLedger>(&content) {
                Ok(ledger) => Ok(Some(ledger)),
                // Corrupt state file: start over rather than refusing to run.
                Err(_) => Ok(None),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }

    fn save(&self, ledger: &QuotaLedger) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }
        let json = serde_json::to_string(ledger).map_err(|e| Error::Storage(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| Error::Storage(e.to_string()))
    }
}

/// Result of one charge, for caller-side notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeOutcome {
    /// Usage of the key that was charged, after the charge.
    pub used: u64,
    /// Set when the charge pushed the active key over the switch threshold
    /// and a cooler key was available.
    pub rotated_to: Option<usize>,
    /// Every key is at/above threshold; no further calls should be attempted.
    pub exhausted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreflightOutcome {
    Ready,
    Rotated(usize),
    Exhausted,
}

/// Owned ledger handle. Charges are read-modify-write under one lock and
/// persisted before the lock is released, so overlapping operations never
/// lose a charge.
pub struct QuotaTracker {
    inner: Mutex<QuotaLedger>,
    store: Box<dyn LedgerStore>,
}

impl QuotaTracker {
    /// Loads the persisted ledger, replacing it with a fresh one when the
    /// stored day is not today or the key count changed.
    pub fn load(store: Box<dyn LedgerStore>, key_count: usize) -> Result<Self, Error> {
        let ledger = match store.load()? {
            Some(l) if l.is_current_day() && l.keys.len() == key_count && l.current_index < key_count => l,
            _ => QuotaLedger::fresh(key_count),
        };
        Ok(Self {
            inner: Mutex::new(ledger),
            store,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QuotaLedger> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> QuotaLedger {
        self.lock().clone()
    }

    pub fn current_index(&self) -> usize {
        self.lock().current_index
    }

    pub fn key_count(&self) -> usize {
        self.lock().keys.len()
    }

    /// Adds `cost` points to the active key and persists. May rotate to the
    /// next key when the new usage crosses the switch threshold.
    pub fn charge(&self, cost: u64, policy: &RotationPolicy) -> Result<ChargeOutcome, Error> {
        let mut ledger = self.lock();
        let index = ledger.current_index;
        if let Some(slot) = ledger.keys.get_mut(index) {
            slot.used = slot.used.saturating_add(cost);
        }
        let mut outcome = ChargeOutcome {
            used: ledger.used(index),
            rotated_to: None,
            exhausted: false,
        };
        match policy.after_charge(&ledger) {
            RotationDecision::SwitchTo(next) => {
                ledger.current_index = next;
                outcome.rotated_to = Some(next);
            }
            RotationDecision::Exhausted => outcome.exhausted = true,
            RotationDecision::Stay => {}
        }
        self.store.save(&ledger)?;
        Ok(outcome)
    }

    /// Pre-call guard, distinct from charge-time rotation: real call
    /// failures can occur without this catching them, so both exist.
    pub fn preflight(&self, policy: &RotationPolicy) -> Result<PreflightOutcome, Error> {
        let mut ledger = self.lock();
        match policy.preflight(&ledger) {
            RotationDecision::Stay => Ok(PreflightOutcome::Ready),
            RotationDecision::SwitchTo(next) => {
                ledger.current_index = next;
                self.store.save(&ledger)?;
                Ok(PreflightOutcome::Rotated(next))
            }
            RotationDecision::Exhausted => Ok(PreflightOutcome::Exhausted),
        }
    }

    /// Manual/operational key switch.
    pub fn switch_to(&self, index: usize) -> Result<(), Error> {
        let mut ledger = self.lock();
        if index >= ledger.keys.len() {
            return Err(Error::InvalidInput(format!(
                "key index {} out of range (have {} keys)",
                index,
                ledger.keys.len()
            )));
        }
        ledger.current_index = index;
        self.store.save(&ledger)
    }

    /// Zeroes all usages and resets the active key, atomically: the new
    /// state is built whole and persisted once.
    pub fn reset(&self) -> Result<(), Error> {
        let mut ledger = self.lock();
        let fresh = QuotaLedger::fresh(ledger.keys.len());
        self.store.save(&fresh)?;
        *ledger = fresh;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::MemoryStore;
    use super::*;

    fn policy() -> RotationPolicy {
        RotationPolicy::new(10_000, 0.8)
    }

    #[test]
    fn fresh_ledger_is_zeroed() {
        let ledger = QuotaLedger::fresh(3);
        assert_eq!(ledger.current_index, 0);
        assert_eq!(ledger.keys.len(), 3);
        assert!(ledger.keys.iter().all(|k| k.used == 0));
        assert!(ledger.is_current_day());
    }

    #[test]
    fn load_discards_stale_day() {
        let stale = QuotaLedger {
            date: "2001-01-01".to_string(),
            current_index: 1,
            keys: vec![KeyUsage { used: 9000 }, KeyUsage { used: 9000 }],
        };
        let tracker = QuotaTracker::load(Box::new(MemoryStore::with(stale)), 2).unwrap();
        let ledger = tracker.snapshot();
        assert_eq!(ledger.current_index, 0);
        assert!(ledger.keys.iter().all(|k| k.used == 0));
    }

    #[test]
    fn load_discards_key_count_mismatch() {
        let mut stored = QuotaLedger::fresh(3);
        stored.keys[0].used = 500;
        let tracker = QuotaTracker::load(Box::new(MemoryStore::with(stored)), 2).unwrap();
        assert_eq!(tracker.key_count(), 2);
        assert_eq!(tracker.snapshot().used(0), 0);
    }

    #[test]
    fn load_keeps_same_day_ledger_unchanged() {
        let mut stored = QuotaLedger::fresh(2);
        stored.keys[0].used = 1234;
        stored.current_index = 1;
        let tracker = QuotaTracker::load(Box::new(MemoryStore::with(stored)), 2).unwrap();
        let ledger = tracker.snapshot();
        assert_eq!(ledger.used(0), 1234);
        assert_eq!(ledger.current_index, 1);
    }

    #[test]
    fn charges_accumulate_and_persist() {
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 2).unwrap();
        tracker.charge(100, &policy()).unwrap();
        tracker.charge(1, &policy()).unwrap();
        tracker.charge(1, &policy()).unwrap();
        assert_eq!(tracker.snapshot().used(0), 102);
    }

    #[test]
    fn charge_persists_every_mutation() {
        let store = Box::new(MemoryStore::default());
        let tracker = QuotaTracker::load(store, 1).unwrap();
        tracker.charge(5, &policy()).unwrap();
        tracker.charge(7, &policy()).unwrap();
        // Reload from what the store holds: nothing silently lost.
        let reloaded = QuotaTracker::load(
            Box::new(MemoryStore::with(tracker.snapshot())),
            1,
        )
        .unwrap();
        assert_eq!(reloaded.snapshot().used(0), 12);
    }

    #[test]
    fn charge_rotates_at_threshold() {
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 2).unwrap();
        let outcome = tracker.charge(8_500, &policy()).unwrap();
        assert_eq!(outcome.rotated_to, Some(1));
        assert!(!outcome.exhausted);
        assert_eq!(tracker.current_index(), 1);
    }

    #[test]
    fn charge_signals_exhaustion_when_no_cool_key() {
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 2).unwrap();
        tracker.charge(8_500, &policy()).unwrap(); // rotates to key 1
        let outcome = tracker.charge(8_500, &policy()).unwrap();
        assert!(outcome.exhausted);
        assert_eq!(outcome.rotated_to, None);
        // Stays put: rotation never targets an exhausted key.
        assert_eq!(tracker.current_index(), 1);
    }

    #[test]
    fn single_key_never_rotates() {
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 1).unwrap();
        let outcome = tracker.charge(9_999, &policy()).unwrap();
        assert_eq!(outcome.rotated_to, None);
        assert!(outcome.exhausted);
        assert_eq!(tracker.current_index(), 0);
    }

    #[test]
    fn preflight_rotates_past_hot_key() {
        let mut stored = QuotaLedger::fresh(2);
        stored.keys[0].used = 8_000;
        let tracker = QuotaTracker::load(Box::new(MemoryStore::with(stored)), 2).unwrap();
        assert_eq!(tracker.preflight(&policy()).unwrap(), PreflightOutcome::Rotated(1));
        assert_eq!(tracker.current_index(), 1);
    }

    #[test]
    fn preflight_refuses_when_next_also_hot() {
        let mut stored = QuotaLedger::fresh(2);
        stored.keys[0].used = 8_000;
        stored.keys[1].used = 8_000;
        let tracker = QuotaTracker::load(Box::new(MemoryStore::with(stored)), 2).unwrap();
        assert_eq!(tracker.preflight(&policy()).unwrap(), PreflightOutcome::Exhausted);
        assert_eq!(tracker.current_index(), 0);
    }

    #[test]
    fn preflight_ready_below_threshold() {
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 2).unwrap();
        assert_eq!(tracker.preflight(&policy()).unwrap(), PreflightOutcome::Ready);
    }

    #[test]
    fn reset_zeroes_everything_atomically() {
        let mut stored = QuotaLedger::fresh(2);
        stored.keys[0].used = 9_000;
        stored.keys[1].used = 4_000;
        stored.current_index = 1;
        let store = MemoryStore::with(stored);
        let tracker = QuotaTracker::load(Box::new(store), 2).unwrap();
        tracker.reset().unwrap();
        let ledger = tracker.snapshot();
        assert_eq!(ledger.current_index, 0);
        assert!(ledger.keys.iter().all(|k| k.used == 0));
    }

    #[test]
    fn switch_to_validates_range() {
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 2).unwrap();
        tracker.switch_to(1).unwrap();
        assert_eq!(tracker.current_index(), 1);
        assert!(tracker.switch_to(2).is_err());
    }

    #[test]
    fn end_to_end_two_key_exhaustion() {
        // two keys, limit 10000, threshold 0.8
        let tracker = QuotaTracker::load(Box::new(MemoryStore::default()), 2).unwrap();
        let p = policy();
        let first = tracker.charge(8_500, &p).unwrap();
        assert_eq!(first.rotated_to, Some(1));
        let second = tracker.charge(8_500, &p).unwrap();
        assert!(second.exhausted);
        assert_eq!(tracker.current_index(), 1);
        assert_eq!(tracker.preflight(&p).unwrap(), PreflightOutcome::Exhausted);
    }
}
