use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of the last completed match between two players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownEntry {
    pub first: String,
    pub second: String,
    pub last_played: DateTime<Utc>,
}

/// Answers "have these two played within the grace window?". Keyed by the
/// unordered pair of participant ids; stale entries are treated as absent
/// and pruned lazily.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    last_played: HashMap<(String, String), DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        CooldownTracker::default()
    }

    pub fn from_entries(entries: Vec<CooldownEntry>) -> Self {
        let mut tracker = CooldownTracker::new();
        for entry in entries {
            tracker.record_at(&entry.first, &entry.second, entry.last_played);
        }
        tracker
    }

    pub fn entries(&self) -> Vec<CooldownEntry> {
        self.last_played
            .iter()
            .map(|((first, second), last_played)| CooldownEntry {
                first: first.clone(),
                second: second.clone(),
                last_played: *last_played,
            })
            .collect()
    }

    // A-B and B-A are the same pair.
    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    /// Stores the current time for the pair, overwriting any prior entry.
    pub fn record(&mut self, a: &str, b: &str) {
        self.record_at(a, b, Utc::now());
    }

    pub fn record_at(&mut self, a: &str, b: &str, when: DateTime<Utc>) {
        self.last_played.insert(Self::key(a, b), when);
    }

    pub fn recently_played(&self, a: &str, b: &str, window: Duration) -> bool {
        self.recently_played_at(a, b, window, Utc::now())
    }

    /// Pure check against an explicit `now`: true iff a stored timestamp
    /// exists and is younger than the window.
    pub fn recently_played_at(
        &self,
        a: &str,
        b: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        match self.last_played.get(&Self::key(a, b)) {
            Some(last) => now.signed_duration_since(*last) < window,
            None => false,
        }
    }

    /// Drops entries older than the window. Queries already ignore stale
    /// entries; this only bounds memory.
    pub fn prune(&mut self, window: Duration) {
        let now = Utc::now();
        self.last_played
            .retain(|_, last| now.signed_duration_since(*last) < window);
    }

    pub fn len(&self) -> usize {
        self.last_played.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_played.is_empty()
    }
}
