//! Experience-event metadata for the telemetry feed.
//!
//! The feed reports every scoring tick as a `GainExperience` message keyed
//! by a numeric experience ID. This table maps the IDs the tracker cares
//! about to a semantic category: whether the event is tallied per player,
//! and whether a squad-scoped variant aliases a personal counter (a squad
//! heal is still a heal). IDs absent from the table still contribute score
//! but no counter.
//!
//! These values encode game tuning, not engine logic. Treat discrepancies
//! against the live feed as data fixes here, never as dispatcher changes.

use phf::phf_map;

/// Experience IDs with special handling in the dispatcher or the squad
/// inference engine. Not exhaustive; the feed defines hundreds more.
pub mod exp_id {
    pub const KILL_ASSIST: &str = "2";
    pub const HEAL: &str = "4";
    pub const HEAL_ASSIST: &str = "5";
    pub const MAX_REPAIR: &str = "6";
    pub const REVIVE: &str = "7";
    pub const RESUPPLY: &str = "34";
    pub const SPOT_KILL: &str = "36";
    pub const SQUAD_HEAL: &str = "51";
    pub const SQUAD_REVIVE: &str = "53";
    pub const SQUAD_SPOT_KILL: &str = "54";
    pub const SQUAD_RESUPPLY: &str = "55";
    pub const SQUAD_SPAWN: &str = "56";
    pub const SUNDY_DESTROY: &str = "68";
    pub const SQUAD_MAX_REPAIR: &str = "142";
    pub const SUNDY_SPAWN: &str = "233";
    pub const MOTION_DETECT: &str = "293";
    pub const SQUAD_MOTION_DETECT: &str = "294";
    pub const SHIELD_REPAIR: &str = "438";
    pub const SQUAD_SHIELD_REPAIR: &str = "439";
    pub const RIBBON: &str = "593";
    pub const DRAWFIRE: &str = "1393";
    pub const ROUTER_KILL: &str = "1409";
    pub const ROUTER_SPAWN: &str = "1410";
    pub const RADAR_DETECT: &str = "1998";
    pub const SQUAD_RADAR_DETECT: &str = "1999";
}

/// Metadata for one experience ID.
#[derive(Debug, Clone, Copy)]
pub struct ExpCategory {
    pub name: &'static str,
    /// Tally this ID in the player's counter map when it fires
    pub track: bool,
    /// Secondary counter to bump when this ID is an alias for a personal
    /// category (squad heal counts as a heal too). The dispatcher also
    /// rewrites the event's effective ID to this value.
    pub also_increment: Option<&'static str>,
}

impl ExpCategory {
    const fn new(name: &'static str, track: bool, also_increment: Option<&'static str>) -> Self {
        Self {
            name,
            track,
            also_increment,
        }
    }
}

pub fn lookup_experience(id: &str) -> Option<&'static ExpCategory> {
    EXPERIENCE_EVENTS.get(id)
}

/// Experience categories the tracker tallies, keyed by feed experience ID.
pub static EXPERIENCE_EVENTS: phf::Map<&'static str, ExpCategory> = phf_map! {
    "2" => ExpCategory::new("Kill assist", true, None),
    "4" => ExpCategory::new("Heal", true, None),
    "5" => ExpCategory::new("Heal assist", true, None),
    "6" => ExpCategory::new("MAX repair", true, None),
    "7" => ExpCategory::new("Revive", true, None),
    "34" => ExpCategory::new("Resupply", true, None),
    "36" => ExpCategory::new("Spot kill", true, None),
    "51" => ExpCategory::new("Squad heal", true, Some("4")),
    "53" => ExpCategory::new("Squad revive", true, Some("7")),
    "54" => ExpCategory::new("Squad spot kill", true, Some("36")),
    "55" => ExpCategory::new("Squad resupply", true, Some("34")),
    "56" => ExpCategory::new("Squad spawn", true, None),
    "68" => ExpCategory::new("Sunderer destroyed", true, None),
    "142" => ExpCategory::new("Squad MAX repair", true, Some("6")),
    "233" => ExpCategory::new("Sunderer spawn bonus", true, None),
    "293" => ExpCategory::new("Motion detect", true, None),
    "294" => ExpCategory::new("Squad motion detect", true, Some("293")),
    "438" => ExpCategory::new("Shield repair", true, None),
    "439" => ExpCategory::new("Squad shield repair", true, Some("438")),
    "593" => ExpCategory::new("Ribbon", false, None),
    "1393" => ExpCategory::new("Draw fire", true, None),
    "1409" => ExpCategory::new("Router kill", true, None),
    "1410" => ExpCategory::new("Router spawn", true, None),
    "1998" => ExpCategory::new("Radar detect", true, None),
    "1999" => ExpCategory::new("Squad radar detect", true, Some("1998")),
};

/// Squad-scoped support events. One of these between two characters is
/// evidence they share a squad.
pub const SQUAD_SCOPED: &[&str] = &[
    exp_id::SQUAD_RESUPPLY,
    exp_id::SQUAD_HEAL,
    exp_id::SQUAD_MAX_REPAIR,
    exp_id::SQUAD_MOTION_DETECT,
    exp_id::SQUAD_RADAR_DETECT,
    exp_id::SQUAD_REVIVE,
    exp_id::SQUAD_SHIELD_REPAIR,
    exp_id::SQUAD_SPOT_KILL,
];

/// Personal variants of the squad-scoped events above. One of these between
/// two characters believed to share a squad means the guess was wrong.
pub const NON_SQUAD_SCOPED: &[&str] = &[
    exp_id::HEAL,
    exp_id::REVIVE,
    exp_id::RESUPPLY,
    exp_id::SHIELD_REPAIR,
    exp_id::MOTION_DETECT,
    exp_id::RADAR_DETECT,
    exp_id::SPOT_KILL,
];

/// Events that can fire for a character who is not currently alive (feed
/// lag on passive ticks, assists credited post-mortem). They must not be
/// taken as proof of life by the squad liveness state machine.
pub const NON_EVIDENTIARY: &[&str] = &[
    exp_id::RESUPPLY,
    exp_id::SQUAD_RESUPPLY,
    exp_id::SHIELD_REPAIR,
    exp_id::SQUAD_SHIELD_REPAIR,
    exp_id::KILL_ASSIST,
    exp_id::RIBBON,
    exp_id::MOTION_DETECT,
    exp_id::SQUAD_MOTION_DETECT,
    exp_id::SQUAD_SPAWN,
    exp_id::DRAWFIRE,
];

pub fn is_squad_scoped(id: &str) -> bool {
    SQUAD_SCOPED.contains(&id)
}

pub fn is_non_squad_scoped(id: &str) -> bool {
    NON_SQUAD_SCOPED.contains(&id)
}

/// Whether an event sourced by a character implies they were alive when it
/// fired.
pub fn is_evidentiary(id: &str) -> bool {
    !NON_EVIDENTIARY.contains(&id)
}
