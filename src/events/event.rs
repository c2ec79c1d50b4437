//! The closed set of typed events produced by the dispatcher.
//!
//! Every variant carries the source character, the feed timestamp in
//! milliseconds, and the zone it happened in (empty where the feed omits
//! it). Events are immutable once emitted; the one exception is a Death
//! held as a player's pending death, which is marked revived in place when
//! the matching revive arrives.

/// Discriminant used for handler registration and quick filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Exp,
    Kill,
    Death,
    Teamkill,
    Capture,
    Defend,
    Vehicle,
    Login,
    Logout,
    Marker,
    Base,
}

#[derive(Debug, Clone)]
pub enum Event {
    Experience {
        source_id: String,
        timestamp: i64,
        zone_id: String,
        /// Effective category after alias rewriting (squad heal -> heal)
        exp_id: String,
        /// Raw category as delivered by the feed
        true_exp_id: String,
        amount: i64,
        target_id: String,
        loadout_id: String,
    },
    Kill {
        source_id: String,
        timestamp: i64,
        zone_id: String,
        target_id: String,
        loadout_id: String,
        target_loadout_id: String,
        weapon_id: String,
        is_headshot: bool,
    },
    /// Source and target are swapped relative to the feed message: the
    /// source of a Death is the character who died.
    Death {
        source_id: String,
        timestamp: i64,
        zone_id: String,
        target_id: String,
        loadout_id: String,
        target_loadout_id: String,
        weapon_id: String,
        is_headshot: bool,
        revived: bool,
        /// The Experience event that revived this death, once matched
        revived_by: Option<Box<Event>>,
    },
    Teamkill {
        source_id: String,
        timestamp: i64,
        zone_id: String,
        target_id: String,
        loadout_id: String,
        target_loadout_id: String,
        weapon_id: String,
    },
    Capture {
        source_id: String,
        timestamp: i64,
        zone_id: String,
        outfit_id: String,
        facility_id: String,
    },
    Defend {
        source_id: String,
        timestamp: i64,
        zone_id: String,
        outfit_id: String,
        facility_id: String,
    },
    VehicleKill {
        source_id: String,
        timestamp: i64,
        zone_id: String,
        target_id: String,
        loadout_id: String,
        weapon_id: String,
        vehicle_id: String,
        attacker_vehicle_id: String,
    },
    Login {
        source_id: String,
        timestamp: i64,
    },
    Logout {
        source_id: String,
        timestamp: i64,
    },
    /// Out-of-band annotation injected by an operator, never by the feed
    Marker {
        source_id: String,
        timestamp: i64,
        mark: String,
    },
    BaseControl {
        source_id: String,
        timestamp: i64,
        zone_id: String,
        facility_id: String,
        faction_id: String,
        previous_faction_id: String,
        outfit_id: String,
        time_held_secs: i64,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Experience { .. } => EventKind::Exp,
            Event::Kill { .. } => EventKind::Kill,
            Event::Death { .. } => EventKind::Death,
            Event::Teamkill { .. } => EventKind::Teamkill,
            Event::Capture { .. } => EventKind::Capture,
            Event::Defend { .. } => EventKind::Defend,
            Event::VehicleKill { .. } => EventKind::Vehicle,
            Event::Login { .. } => EventKind::Login,
            Event::Logout { .. } => EventKind::Logout,
            Event::Marker { .. } => EventKind::Marker,
            Event::BaseControl { .. } => EventKind::Base,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Event::Experience { timestamp, .. }
            | Event::Kill { timestamp, .. }
            | Event::Death { timestamp, .. }
            | Event::Teamkill { timestamp, .. }
            | Event::Capture { timestamp, .. }
            | Event::Defend { timestamp, .. }
            | Event::VehicleKill { timestamp, .. }
            | Event::Login { timestamp, .. }
            | Event::Logout { timestamp, .. }
            | Event::Marker { timestamp, .. }
            | Event::BaseControl { timestamp, .. } => *timestamp,
        }
    }

    pub fn source_id(&self) -> &str {
        match self {
            Event::Experience { source_id, .. }
            | Event::Kill { source_id, .. }
            | Event::Death { source_id, .. }
            | Event::Teamkill { source_id, .. }
            | Event::Capture { source_id, .. }
            | Event::Defend { source_id, .. }
            | Event::VehicleKill { source_id, .. }
            | Event::Login { source_id, .. }
            | Event::Logout { source_id, .. }
            | Event::Marker { source_id, .. }
            | Event::BaseControl { source_id, .. } => source_id,
        }
    }
}
