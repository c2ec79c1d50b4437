pub mod experience;
pub mod loadout;

pub use experience::{ExpCategory, exp_id, lookup_experience};
pub use loadout::{ClassKind, Faction, Loadout, lookup_loadout};

/// Item ID granted when a router is pulled; the only placement signal the
/// feed sends before the first spawn tick.
pub const ROUTER_ITEM_ID: &str = "6003551";

/// Synthetic stat keys for counters that do not correspond to a feed
/// experience ID. Kept alongside the experience IDs so everything that
/// can key a `CounterMap` lives in one place.
pub mod stat {
    pub const KILL: &str = "kill";
    pub const DEATH: &str = "death";
    pub const TEAMKILL: &str = "teamkill";
    pub const TEAMKILLED: &str = "teamkilled";
    pub const REVIVED: &str = "revived";
    pub const HEADSHOT: &str = "headshot";
    pub const BASE_CAPTURE: &str = "base_capture";
    pub const BASE_DEFENSE: &str = "base_defense";
}
