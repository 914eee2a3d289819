use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::error::Error;
use crate::core::quota::ledger::state_dir;

/// Lifetime counter of trend-classification calls. The upstream service is
/// metered per account, not per day, so this never resets on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentCounter {
    pub trend_calls: u64,
}

pub struct EnrichmentCounterStore {
    path: PathBuf,
}

impl EnrichmentCounterStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        state_dir().join("trend-usage.json")
    }

    pub fn load(&self) -> Result<EnrichmentCounter, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content).unwrap_or_default()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(EnrichmentCounter::default())
            }
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }

    pub fn increment(&self, by: u64) -> Result<EnrichmentCounter, Error> {
        let mut counter = self.load()?;
        counter.trend_calls = counter.trend_calls.saturating_add(by);
        self.save(&counter)?;
        Ok(counter)
    }

    fn save(&self, counter: &EnrichmentCounter) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }
        let json = serde_json::to_string(counter).map_err(|e| Error::Storage(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| Error::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> EnrichmentCounterStore {
        let path = std::env::temp_dir().join(format!("tubedash-test-{name}-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        EnrichmentCounterStore::new(path)
    }

    #[test]
    fn missing_file_loads_as_zero() {
        let store = temp_store("missing");
        assert_eq!(store.load().unwrap().trend_calls, 0);
    }

    #[test]
    fn increment_persists_across_loads() {
        let store = temp_store("increment");
        assert_eq!(store.increment(3).unwrap().trend_calls, 3);
        assert_eq!(store.increment(2).unwrap().trend_calls, 5);
        assert_eq!(store.load().unwrap().trend_calls, 5);
    }

    #[test]
    fn corrupt_file_loads_as_zero() {
        let store = temp_store("corrupt");
        std::fs::write(
            std::env::temp_dir().join(format!("tubedash-test-corrupt-{}.json", std::process::id())),
            "not json",
        )
        .unwrap();
        assert_eq!(store.load().unwrap().trend_calls, 0);
    }
}
