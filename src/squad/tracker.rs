//! Squad inference engine.
//!
//! The feed never reports squad membership, so it is reconstructed from
//! correlated support traffic: a squad-scoped heal/revive/resupply between
//! two characters implies they share a squad, and the personal variant of
//! the same event between two characters believed to share one implies
//! they do not. Squads come in two flavors: a fixed set of permanent
//! squads created at start-up, and guess squads created and destroyed as
//! the inference converges.
//!
//! Membership is an owned id list per squad plus a reverse index
//! (member -> squad id) updated on every move, so a member is in exactly
//! one squad at all times.

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use crate::context::TrackerConfig;
use crate::events::Event;
use crate::game_data::experience::{self, exp_id};
use crate::game_data::lookup_loadout;

use super::member::{MemberState, SquadMember};
use super::squad::Squad;

const GUESS_NAMES: [&str; 26] = [
    "q", "w", "e", "r", "t", "y", "u", "i", "o", "p", "a", "s", "d", "f", "g", "h", "j", "k", "l",
    "z", "x", "c", "v", "b", "n", "m",
];

const PERM_NAMES: [&str; 8] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel",
];

/// Upper bound on parked events waiting for character lookups. Lookups
/// that never resolve must not pin memory for the whole session.
const PENDING_LIMIT: usize = 64;

/// A squad-scoped event that referenced a character not yet tracked,
/// parked until the character lookup completes.
#[derive(Debug, Clone)]
struct PendingSquadEvent {
    missing_id: String,
    event: Event,
}

#[derive(Debug)]
pub struct SquadTracker {
    dead_after_secs: i64,
    beacon_cooldown_secs: i64,
    auto_add: bool,

    members: HashMap<String, SquadMember>,
    squads: HashMap<u64, Squad>,
    /// Reverse index; every tracked member appears here exactly once
    member_squad: HashMap<String, u64>,

    next_squad_id: u64,
    guess_name_index: usize,
    pending: Vec<PendingSquadEvent>,
}

impl SquadTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        let mut tracker = Self {
            dead_after_secs: config.dead_threshold_secs,
            beacon_cooldown_secs: config.beacon_cooldown_secs,
            auto_add: config.auto_add,
            members: HashMap::new(),
            squads: HashMap::new(),
            member_squad: HashMap::new(),
            next_squad_id: 0,
            guess_name_index: 0,
            pending: Vec::new(),
        };

        for _ in 0..config.permanent_squads {
            tracker.create_permanent_squad();
        }

        tracker
    }

    // --- Roster mutation ---

    /// Begin squad-tracking a character. A returning member is just marked
    /// online; a new one gets a fresh single-member guess squad.
    pub fn add_member(&mut self, character_id: &str, name: &str, outfit_tag: &str) {
        if let Some(member) = self.members.get_mut(character_id) {
            debug!(name, "member already tracked, marking online");
            member.online = true;
            if let Some(&squad_id) = self.member_squad.get(character_id) {
                self.sort_squad(squad_id);
            }
            return;
        }

        debug!(name, character_id, "started squad tracking");
        self.members.insert(
            character_id.to_string(),
            SquadMember::new(
                character_id.to_string(),
                name.to_string(),
                outfit_tag.to_string(),
            ),
        );

        let squad_id = self.create_guess_squad();
        self.assign(character_id, squad_id);
    }

    /// Mark a member offline, e.g. on logout. They stay in their squad.
    pub fn set_offline(&mut self, character_id: &str) {
        if let Some(member) = self.members.get_mut(character_id) {
            debug!(character_id, "member went offline");
            member.online = false;
            member.set_alive();
            if let Some(&squad_id) = self.member_squad.get(character_id) {
                self.sort_squad(squad_id);
            }
        }
    }

    /// Move a member into a specific squad, by squad ID. Used by operator
    /// commands to correct the inference.
    pub fn move_member_to(&mut self, character_id: &str, squad_id: u64) {
        if !self.members.contains_key(character_id) {
            warn!(character_id, squad_id, "cannot move untracked member");
            return;
        }
        if !self.squads.contains_key(&squad_id) {
            warn!(character_id, squad_id, "cannot move member to unknown squad");
            return;
        }
        self.assign(character_id, squad_id);
    }

    /// Split a member out of their current squad into a fresh guess squad.
    pub fn remove_member_from_squad(&mut self, character_id: &str) {
        if !self.members.contains_key(character_id) {
            warn!(character_id, "cannot split out untracked member");
            return;
        }
        let squad_id = self.create_guess_squad();
        self.assign(character_id, squad_id);
    }

    /// Empty a permanent squad, reassigning its members to a fresh guess
    /// squad. The permanent squad itself is never deleted.
    pub fn clear_permanent(&mut self, squad_id: u64) {
        let member_ids = match self.squads.get(&squad_id) {
            Some(squad) if squad.permanent => squad.member_ids.clone(),
            Some(_) => {
                warn!(squad_id, "clear_permanent called on a guess squad");
                return;
            }
            None => return,
        };

        if member_ids.is_empty() {
            return;
        }

        let new_squad = self.create_guess_squad();
        for id in member_ids {
            self.assign(&id, new_squad);
        }
    }

    // --- Event-driven inference ---

    /// Update liveness and class from a kill or death. The source of a
    /// Death event is the character who died.
    pub fn process_kill_death(&mut self, event: &Event) {
        match event {
            Event::Kill {
                source_id,
                loadout_id,
                ..
            } => {
                if let Some(member) = self.members.get_mut(source_id) {
                    member.set_alive();
                }
                self.update_class(source_id, loadout_id);
            }
            Event::Death {
                source_id,
                loadout_id,
                timestamp,
                ..
            } => {
                if let Some(member) = self.members.get_mut(source_id) {
                    member.set_dying(*timestamp);
                }
                self.update_class(source_id, loadout_id);
            }
            _ => {}
        }
    }

    /// Update liveness, beacon state, class, and squad membership from an
    /// experience event. Returns character IDs that need a metadata lookup
    /// before the event can be applied (auto-add mode only); the event is
    /// parked and replayed via [`Self::complete_auto_add`].
    pub fn process_experience(&mut self, event: &Event) -> Vec<String> {
        let Event::Experience {
            source_id,
            target_id,
            true_exp_id,
            loadout_id,
            ..
        } = event
        else {
            return Vec::new();
        };

        // A revive proves the target alive no matter what else is known.
        if (true_exp_id == exp_id::REVIVE || true_exp_id == exp_id::SQUAD_REVIVE)
            && let Some(member) = self.members.get_mut(target_id)
        {
            member.set_alive();
        }

        if true_exp_id == exp_id::SQUAD_SPAWN
            && let Some(member) = self.members.get_mut(source_id)
            && member.beacon_placed_at.is_none()
        {
            debug!(name = %member.name, "beacon placed");
            member.beacon_placed_at = Some(event.timestamp());
            member.beacon_cooldown_secs = self.beacon_cooldown_secs;
        }

        if let Some(member) = self.members.get_mut(source_id)
            && member.state != MemberState::Alive
            && experience::is_evidentiary(true_exp_id)
        {
            member.set_alive();
        }
        if self.members.contains_key(source_id) {
            self.update_class(source_id, loadout_id);
        }

        self.infer_membership(source_id, target_id, true_exp_id, event)
    }

    fn infer_membership(
        &mut self,
        source_id: &str,
        target_id: &str,
        true_exp_id: &str,
        event: &Event,
    ) -> Vec<String> {
        let source_known = self.members.contains_key(source_id);
        let target_known = self.members.contains_key(target_id);

        // Plenty of traffic involves no one we track.
        if !source_known && !target_known {
            return Vec::new();
        }

        if !source_known || !target_known {
            if self.auto_add && experience::is_squad_scoped(true_exp_id) {
                let missing = if source_known { target_id } else { source_id };
                // One parked event per character is enough to place them:
                // once the lookup resolves they are tracked and later
                // traffic infers normally.
                if self.pending.iter().any(|p| p.missing_id == missing) {
                    return Vec::new();
                }
                if self.pending.len() >= PENDING_LIMIT {
                    warn!(missing, "pending auto-add queue is full, dropping event");
                    return Vec::new();
                }
                info!(
                    missing,
                    "squad-scoped event references untracked character, requesting lookup"
                );
                self.pending.push(PendingSquadEvent {
                    missing_id: missing.to_string(),
                    event: event.clone(),
                });
                return vec![missing.to_string()];
            }
            return Vec::new();
        }

        let Some(&source_squad) = self.member_squad.get(source_id) else {
            return Vec::new();
        };
        let Some(&target_squad) = self.member_squad.get(target_id) else {
            return Vec::new();
        };

        if experience::is_squad_scoped(true_exp_id) && source_squad != target_squad {
            let source_perm = self.squads[&source_squad].permanent;
            let target_perm = self.squads[&target_squad].permanent;

            // Precedence: guess squads merge, a guess is absorbed into a
            // permanent, and between two permanents only the acting member
            // moves.
            match (source_perm, target_perm) {
                (false, false) => {
                    debug!(source_id, target_id, "both squads are guesses, merging");
                    self.merge(source_squad, target_squad);
                }
                (false, true) => {
                    debug!(
                        source_id,
                        target_id, "target squad is permanent, absorbing source guess"
                    );
                    self.merge(target_squad, source_squad);
                }
                (true, false) => {
                    debug!(
                        source_id,
                        target_id, "source squad is permanent, absorbing target guess"
                    );
                    self.merge(source_squad, target_squad);
                }
                (true, true) => {
                    debug!(source_id, target_id, "both squads permanent, moving acting member");
                    self.assign(source_id, target_squad);
                }
            }
        }

        if experience::is_non_squad_scoped(true_exp_id) && source_squad == target_squad {
            debug!(
                source_id,
                target_id, "personal-scoped event inside an inferred squad, splitting source out"
            );
            let new_squad = self.create_guess_squad();
            self.assign(source_id, new_squad);
        }

        Vec::new()
    }

    /// Finish an auto-add: the character lookup answered, so start
    /// tracking them and replay every parked event that was waiting on
    /// them. Replays can themselves discover more untracked characters.
    pub fn complete_auto_add(
        &mut self,
        character_id: &str,
        name: &str,
        outfit_tag: &str,
    ) -> Vec<String> {
        self.add_member(character_id, name, outfit_tag);

        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.missing_id == character_id);
        self.pending = waiting;

        let mut requests = Vec::new();
        for parked in ready {
            requests.extend(self.process_experience(&parked.event));
        }
        requests
    }

    // --- Background tick ---

    /// Advance death timers and beacon cooldowns. Must be called on the
    /// same execution context as message processing; `now_ms` uses the
    /// same clock as event timestamps so replay stays reproducible.
    pub fn tick(&mut self, now_ms: i64) {
        for member in self.members.values_mut() {
            if member.state == MemberState::Dying
                && let Some(died_at) = member.died_at
            {
                member.time_dead_secs = (now_ms - died_at) as f64 / 1000.0;
                if member.time_dead_secs > self.dead_after_secs as f64 {
                    member.state = MemberState::Dead;
                }
            }

            if let Some(placed_at) = member.beacon_placed_at {
                let elapsed_secs = (now_ms - placed_at) / 1000;
                if elapsed_secs >= self.beacon_cooldown_secs {
                    member.beacon_placed_at = None;
                    member.beacon_cooldown_secs = 0;
                } else {
                    member.beacon_cooldown_secs = self.beacon_cooldown_secs - elapsed_secs;
                }
            }
        }
    }

    // --- Accessors ---

    pub fn member(&self, character_id: &str) -> Option<&SquadMember> {
        self.members.get(character_id)
    }

    pub fn members(&self) -> impl Iterator<Item = &SquadMember> {
        self.members.values()
    }

    pub fn squad(&self, squad_id: u64) -> Option<&Squad> {
        self.squads.get(&squad_id)
    }

    pub fn squad_by_name(&self, name: &str) -> Option<&Squad> {
        self.squads.values().find(|s| s.name == name)
    }

    pub fn squad_of(&self, character_id: &str) -> Option<&Squad> {
        self.member_squad
            .get(character_id)
            .and_then(|id| self.squads.get(id))
    }

    pub fn squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values()
    }

    pub fn permanent_squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values().filter(|s| s.permanent)
    }

    pub fn guess_squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values().filter(|s| !s.permanent)
    }

    // --- Internals ---

    fn create_guess_squad(&mut self) -> u64 {
        let id = self.next_squad_id;
        self.next_squad_id += 1;

        let name = GUESS_NAMES[self.guess_name_index % GUESS_NAMES.len()].to_string();
        self.guess_name_index += 1;

        debug!(name, "created guess squad");
        self.squads
            .insert(id, Squad::new(id, name.clone(), name, false));
        id
    }

    fn create_permanent_squad(&mut self) -> u64 {
        let id = self.next_squad_id;
        self.next_squad_id += 1;

        let index = self.squads.values().filter(|s| s.permanent).count();
        let name = (index + 1).to_string();
        let display_name = PERM_NAMES[index % PERM_NAMES.len()].to_string();

        debug!(name, display_name, "created permanent squad");
        self.squads.insert(id, Squad::new(id, name, display_name, true));
        id
    }

    /// Move one member into a squad, transactionally: remove from the old
    /// squad, delete it if it became an empty guess, insert into the new
    /// one, update the reverse index, re-sort both rosters.
    fn assign(&mut self, character_id: &str, to: u64) {
        if self.member_squad.get(character_id) == Some(&to) {
            return;
        }

        if let Some(old) = self.member_squad.remove(character_id)
            && let Some(squad) = self.squads.get_mut(&old)
        {
            squad.member_ids.retain(|id| id != character_id);
            if squad.is_empty() && !squad.permanent {
                debug!(name = %squad.name, "guess squad emptied, removing");
                self.squads.remove(&old);
            } else {
                self.sort_squad(old);
            }
        }

        if let Some(squad) = self.squads.get_mut(&to) {
            squad.member_ids.push(character_id.to_string());
            self.member_squad.insert(character_id.to_string(), to);
            self.sort_squad(to);
        }
    }

    /// Move every member of `from` into `into`; `from` is deleted if it
    /// was a guess squad.
    fn merge(&mut self, into: u64, from: u64) {
        if into == from {
            return;
        }

        let member_ids = match self.squads.get(&from) {
            Some(squad) => squad.member_ids.clone(),
            None => return,
        };

        for id in member_ids {
            self.assign(&id, into);
        }
    }

    fn sort_squad(&mut self, squad_id: u64) {
        let members = &self.members;
        if let Some(squad) = self.squads.get_mut(&squad_id) {
            squad.member_ids.sort_by(|a, b| {
                let online_a = members.get(a).map(|m| m.online).unwrap_or(false);
                let online_b = members.get(b).map(|m| m.online).unwrap_or(false);
                let name_a = members.get(a).map(|m| m.name.as_str()).unwrap_or("");
                let name_b = members.get(b).map(|m| m.name.as_str()).unwrap_or("");
                online_b.cmp(&online_a).then_with(|| name_a.cmp(name_b))
            });
        }
    }

    fn update_class(&mut self, character_id: &str, loadout_id: &str) {
        let Some(member) = self.members.get_mut(character_id) else {
            return;
        };
        if loadout_id.is_empty() {
            return;
        }
        match lookup_loadout(loadout_id) {
            Some(loadout) => member.class_code = loadout.class.code().to_string(),
            None => {
                warn!(character_id, loadout_id, "unknown loadout, keeping previous class");
            }
        }
    }
}
