//! Tally map keyed by stat key or experience ID.

use hashbrown::HashMap;

/// How many of X happened. Counts never go below zero; the revive path
/// decrements a death that was already counted, and a duplicate decrement
/// must not produce a negative tally.
#[derive(Debug, Clone, Default)]
pub struct CounterMap {
    counts: HashMap<String, u64>,
}

impl CounterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: &str) {
        self.increment_by(key, 1);
    }

    pub fn increment_by(&mut self, key: &str, amount: u64) {
        *self.counts.entry_ref(key).or_insert(0) += amount;
    }

    pub fn decrement(&mut self, key: &str) {
        if let Some(count) = self.counts.get_mut(key) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_floors_at_zero() {
        let mut counters = CounterMap::new();
        counters.increment("death");
        counters.decrement("death");
        counters.decrement("death");
        assert_eq!(counters.get("death"), 0);
        counters.decrement("never-seen");
        assert_eq!(counters.get("never-seen"), 0);
    }

    #[test]
    fn get_defaults_to_zero() {
        let counters = CounterMap::new();
        assert_eq!(counters.get("kill"), 0);
    }
}
