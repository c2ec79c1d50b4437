//! Session-wide aggregation state.
//!
//! Pure storage for everything accumulated over one tracking session.
//! Routing logic lives in `EventProcessor`; this type just holds the
//! per-player records, the squad inference state, the deployable ledger,
//! and the session bookkeeping around them.

use hashbrown::HashMap;
use serde::Serialize;
use tracing::info;

use crate::context::TrackerConfig;
use crate::events::Event;
use crate::game_data::Faction;
use crate::squad::SquadTracker;
use crate::state::deployable::DeployableTracker;
use crate::state::player::TrackedPlayer;

/// One facility changing hands, straight from a `FacilityControl` message.
/// Kept for every facility in the subscribed zones, tracked outfit or not.
#[derive(Debug, Clone, Serialize)]
pub struct BaseExchange {
    pub facility_id: String,
    pub zone_id: String,
    pub faction_id: String,
    pub previous_faction_id: String,
    pub outfit_id: String,
    pub timestamp: i64,
    pub time_held_secs: i64,
}

/// Session clock state. Event intake runs regardless; these bounds mark
/// the window reports are cut to.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeTracking {
    pub running: bool,
    pub started_at_ms: Option<i64>,
    pub stopped_at_ms: Option<i64>,
}

pub struct SessionCache {
    pub players: HashMap<String, TrackedPlayer>,
    /// Events whose participants are all untracked but still worth keeping
    /// (vehicle kills against nobody we follow, replayed markers)
    pub misc_events: Vec<Event>,
    /// Every capture/defend participation, tracked character or not;
    /// outfit-credit attribution needs the full set
    pub capture_participation: Vec<Event>,
    pub base_exchanges: Vec<BaseExchange>,
    /// Every raw feed line accepted by the dispatcher, for replay
    pub raw_log: Vec<String>,
    pub tracking: TimeTracking,
    pub deployables: DeployableTracker,
    pub squads: SquadTracker,
}

impl SessionCache {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            players: HashMap::new(),
            misc_events: Vec::new(),
            capture_participation: Vec::new(),
            base_exchanges: Vec::new(),
            raw_log: Vec::new(),
            tracking: TimeTracking::default(),
            deployables: DeployableTracker::new(),
            squads: SquadTracker::new(config),
        }
    }

    /// Begin aggregating for a character. Idempotent; a re-subscribe keeps
    /// the existing record.
    pub fn add_player(
        &mut self,
        character_id: &str,
        name: &str,
        outfit_tag: &str,
        faction: Option<Faction>,
    ) {
        if self.players.contains_key(character_id) {
            return;
        }
        info!(name, character_id, "now tracking character");
        self.players.insert(
            character_id.to_string(),
            TrackedPlayer::new(
                character_id.to_string(),
                name.to_string(),
                outfit_tag.to_string(),
                faction,
            ),
        );
    }

    pub fn player(&self, character_id: &str) -> Option<&TrackedPlayer> {
        self.players.get(character_id)
    }

    pub fn player_mut(&mut self, character_id: &str) -> Option<&mut TrackedPlayer> {
        self.players.get_mut(character_id)
    }

    pub fn is_tracked(&self, character_id: &str) -> bool {
        self.players.contains_key(character_id)
    }

    pub fn start(&mut self, now_ms: i64) {
        info!("tracking started");
        self.tracking.running = true;
        self.tracking.started_at_ms = Some(now_ms);
        self.tracking.stopped_at_ms = None;
    }

    /// Stop the session clock and finalize per-player online time and the
    /// deployable ledger. Intake continues; reports ignore later events.
    pub fn stop(&mut self, now_ms: i64) {
        info!("tracking stopped");
        self.tracking.running = false;
        self.tracking.stopped_at_ms = Some(now_ms);

        for player in self.players.values_mut() {
            player.finalize_online_seconds();
        }
        self.deployables.finalize();
    }

    pub fn push_raw(&mut self, line: &str) {
        self.raw_log.push(line.to_string());
    }

    pub fn record_base_exchange(&mut self, exchange: BaseExchange) {
        self.base_exchanges.push(exchange);
    }
}
