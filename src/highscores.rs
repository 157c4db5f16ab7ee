//! Persisted best score
//!
//! A single integer under a fixed key. Anything unreadable counts as zero.

use crate::persistence::KeyValueStore;

/// Store key for the runner's best score
pub const RUNNER_HIGHSCORE_KEY: &str = "runner_highscore";

/// Best score tracker for one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScore {
    key: &'static str,
    best: u64,
}

impl HighScore {
    /// Tracker that has not read the store yet
    pub fn empty(key: &'static str) -> Self {
        Self { key, best: 0 }
    }

    /// Read the stored best; missing or corrupt values default to zero
    pub fn load(store: &dyn KeyValueStore, key: &'static str) -> Self {
        let best = match store.get(key) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(value) => value,
                Err(_) => {
                    log::warn!("Ignoring corrupt highscore {:?} under {}", raw, key);
                    0
                }
            },
            None => 0,
        };
        Self { key, best }
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Persist max(score, best). Returns true when a new record was set.
    ///
    /// A failed write keeps the in-memory best and is only logged.
    pub fn submit(&mut self, store: &mut dyn KeyValueStore, score: u64) -> bool {
        // Re-read so another tab's record is not overwritten by a lower one
        let stored = Self::load(store, self.key).best;
        let previous = self.best.max(stored);
        self.best = previous.max(score);

        if let Err(e) = store.set(self.key, &self.best.to_string()) {
            log::warn!("Highscore not saved: {:#}", e);
        } else {
            log::info!("Highscore saved ({})", self.best);
        }
        score > previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_missing_key_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(HighScore::load(&store, RUNNER_HIGHSCORE_KEY).best(), 0);
    }

    #[test]
    fn test_corrupt_value_is_zero() {
        let mut store = MemoryStore::new();
        store.set(RUNNER_HIGHSCORE_KEY, "lots").unwrap();
        assert_eq!(HighScore::load(&store, RUNNER_HIGHSCORE_KEY).best(), 0);
    }

    #[test]
    fn test_submit_keeps_maximum() {
        let mut store = MemoryStore::new();
        let mut hs = HighScore::load(&store, RUNNER_HIGHSCORE_KEY);

        assert!(hs.submit(&mut store, 120));
        assert!(!hs.submit(&mut store, 80));
        assert_eq!(hs.best(), 120);
        assert_eq!(store.get(RUNNER_HIGHSCORE_KEY).as_deref(), Some("120"));

        assert!(hs.submit(&mut store, 300));
        assert_eq!(HighScore::load(&store, RUNNER_HIGHSCORE_KEY).best(), 300);
    }

    #[test]
    fn test_submit_respects_higher_stored_value() {
        let mut store = MemoryStore::new();
        let mut hs = HighScore::load(&store, RUNNER_HIGHSCORE_KEY);
        store.set(RUNNER_HIGHSCORE_KEY, "500").unwrap();

        assert!(!hs.submit(&mut store, 200));
        assert_eq!(hs.best(), 500);
        assert_eq!(store.get(RUNNER_HIGHSCORE_KEY).as_deref(), Some("500"));
    }
}
