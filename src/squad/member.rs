//! Per-member liveness and cooldown state.

/// Liveness state machine: `Alive -> Dying` on a death, `Dying -> Dead`
/// once the revive window expires, and back to `Alive` on any evidentiary
/// event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberState {
    Alive,
    Dying,
    Dead,
}

#[derive(Debug, Clone)]
pub struct SquadMember {
    pub character_id: String,
    pub name: String,
    pub outfit_tag: String,
    /// Single-letter class code from the last-seen loadout; empty until known
    pub class_code: String,
    pub state: MemberState,
    pub time_dead_secs: f64,
    pub died_at: Option<i64>,
    pub beacon_placed_at: Option<i64>,
    pub beacon_cooldown_secs: i64,
    pub online: bool,
}

impl SquadMember {
    pub fn new(character_id: String, name: String, outfit_tag: String) -> Self {
        Self {
            character_id,
            name,
            outfit_tag,
            class_code: String::new(),
            state: MemberState::Alive,
            time_dead_secs: 0.0,
            died_at: None,
            beacon_placed_at: None,
            beacon_cooldown_secs: 0,
            online: true,
        }
    }

    pub fn set_alive(&mut self) {
        self.state = MemberState::Alive;
        self.time_dead_secs = 0.0;
        self.died_at = None;
    }

    pub fn set_dying(&mut self, timestamp: i64) {
        self.state = MemberState::Dying;
        self.died_at = Some(timestamp);
        self.time_dead_secs = 0.0;
    }
}
