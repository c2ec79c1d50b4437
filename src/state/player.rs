//! Per-character running state.

use tracing::debug;

use crate::events::Event;
use crate::game_data::Faction;
use crate::state::counter::CounterMap;

/// One mutable record per tracked character. Created on subscription, never
/// destroyed during a session; finalized when tracking stops.
#[derive(Debug, Clone)]
pub struct TrackedPlayer {
    pub character_id: String,
    pub name: String,
    pub outfit_tag: String,
    pub faction: Option<Faction>,
    pub score: i64,
    pub stats: CounterMap,
    /// AchievementEarned tallies, keyed by achievement ID
    pub ribbons: CounterMap,
    /// Append-only, time-ascending since the feed is consumed in arrival order
    pub history: Vec<Event>,
    pub online: bool,
    pub join_time_ms: i64,
    pub seconds_online: f64,
    /// Most recent Death not yet resolved by a revive, superseded by each
    /// new death
    pub pending_death: Option<Event>,
}

impl TrackedPlayer {
    pub fn new(
        character_id: String,
        name: String,
        outfit_tag: String,
        faction: Option<Faction>,
    ) -> Self {
        Self {
            character_id,
            name,
            outfit_tag,
            faction,
            score: 0,
            stats: CounterMap::new(),
            ribbons: CounterMap::new(),
            history: Vec::new(),
            online: false,
            join_time_ms: 0,
            seconds_online: 0.0,
            pending_death: None,
        }
    }

    pub fn record_event(&mut self, event: Event) {
        self.history.push(event);
    }

    /// Attach a Death as the unresolved most-recent one. Also lands in the
    /// history; the pending slot holds its own copy so resolution can
    /// rewrite both.
    pub fn set_pending_death(&mut self, death: Event) {
        debug_assert!(matches!(death, Event::Death { .. }));
        self.pending_death = Some(death);
    }

    /// Resolve the pending death against a revive-category experience
    /// event: mark it revived, link the revive, clear the slot, and rewrite
    /// the matching history entry so downstream life-expectancy reports see
    /// the linkage. Returns false when there was nothing to resolve.
    pub fn resolve_pending_death(&mut self, revive: &Event) -> bool {
        let Some(mut death) = self.pending_death.take() else {
            return false;
        };

        let death_ts = death.timestamp();
        if let Event::Death {
            revived, revived_by, ..
        } = &mut death
        {
            *revived = true;
            *revived_by = Some(Box::new(revive.clone()));
        }

        // The history holds the authoritative copy; sync it.
        if let Some(slot) = self
            .history
            .iter_mut()
            .rev()
            .find(|ev| matches!(ev, Event::Death { timestamp, .. } if *timestamp == death_ts))
        {
            *slot = death;
        } else {
            debug!(character = %self.character_id, "pending death missing from history");
        }

        true
    }

    /// Recompute online time from the first and last history entries. Used
    /// when tracking stops, where the logout accumulator alone undercounts
    /// characters that never logged out.
    pub fn finalize_online_seconds(&mut self) {
        match (self.history.first(), self.history.last()) {
            (Some(first), Some(last)) => {
                self.join_time_ms = first.timestamp();
                self.seconds_online = (last.timestamp() - first.timestamp()) as f64 / 1000.0;
            }
            _ => self.seconds_online = 0.0,
        }
    }
}
