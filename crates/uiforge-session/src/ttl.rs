//! Per-key expiry tracking for the in-process cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks an expiry deadline for each cached key.
#[derive(Debug, Default)]
pub struct TtlTracker {
    deadlines: HashMap<String, Instant>,
}

impl TtlTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or reset) the deadline for a key to `ttl` from now.
    pub fn set(&mut self, key: &str, ttl: Duration) {
        self.deadlines.insert(key.to_string(), Instant::now() + ttl);
    }

    /// Check if a key has expired. Keys without a deadline count as expired.
    pub fn is_expired(&self, key: &str) -> bool {
        match self.deadlines.get(key) {
            None => true,
            Some(deadline) => Instant::now() >= *deadline,
        }
    }

    /// Time left before a key expires.
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        self.deadlines
            .get(key)
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Remove tracking for a key.
    pub fn remove(&mut self, key: &str) {
        self.deadlines.remove(key);
    }

    /// Remove all expired entries and return their keys.
    pub fn drain_expired(&mut self) -> Vec<String> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| now >= **deadline)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.deadlines.remove(key);
        }
        expired
    }

    /// Get the number of tracked keys.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }
}
