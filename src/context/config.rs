//! Tracker configuration.
//!
//! The liveness and cooldown constants encode game tuning taken from long
//! observation of the live feed. They are configuration, not derived
//! values; adjust them here rather than in the engine when the game
//! changes.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

const APP_NAME: &str = "opstrack";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Size of the duplicate-detection ring over raw feed lines
    #[serde(default = "default_dedup_window")]
    pub dedup_window: usize,
    /// Seconds a member stays revivable before `dying` becomes `dead`
    #[serde(default = "default_dead_threshold")]
    pub dead_threshold_secs: i64,
    /// Spawn-beacon cooldown
    #[serde(default = "default_beacon_cooldown")]
    pub beacon_cooldown_secs: i64,
    /// Permanent squads created at start-up
    #[serde(default = "default_permanent_squads")]
    pub permanent_squads: usize,
    /// Lazily start tracking unknown characters seen in squad-scoped events
    #[serde(default)]
    pub auto_add: bool,
    /// Inactivity window before a metadata lookup batch is flushed
    #[serde(default = "default_precache_debounce")]
    pub precache_debounce_ms: u64,
    /// Flush a lookup batch early once this many IDs are pending
    #[serde(default = "default_precache_batch")]
    pub precache_batch_size: usize,
}

fn default_dedup_window() -> usize {
    5
}

fn default_dead_threshold() -> i64 {
    29
}

fn default_beacon_cooldown() -> i64 {
    300
}

fn default_permanent_squads() -> usize {
    4
}

fn default_precache_debounce() -> u64 {
    250
}

fn default_precache_batch() -> usize {
    50
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dedup_window: default_dedup_window(),
            dead_threshold_secs: default_dead_threshold(),
            beacon_cooldown_secs: default_beacon_cooldown(),
            permanent_squads: default_permanent_squads(),
            auto_add: false,
            precache_debounce_ms: default_precache_debounce(),
            precache_batch_size: default_precache_batch(),
        }
    }
}

impl TrackerConfig {
    pub fn load() -> Self {
        confy::load(APP_NAME, "config").unwrap_or_default()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, "config", self).map_err(ConfigError::Save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_feed_tuning() {
        let config = TrackerConfig::default();
        assert_eq!(config.dedup_window, 5);
        assert_eq!(config.dead_threshold_secs, 29);
        assert_eq!(config.beacon_cooldown_secs, 300);
        assert_eq!(config.permanent_squads, 4);
        assert!(!config.auto_add);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: TrackerConfig = toml::from_str("auto_add = true").unwrap();
        assert!(config.auto_add);
        assert_eq!(config.dead_threshold_secs, 29);
    }
}
