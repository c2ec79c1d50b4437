//! The message dispatcher.
//!
//! One entry point, [`EventProcessor::process_message`], turns a raw feed
//! line into zero or more typed [`Event`]s while mutating the session
//! cache: counters, histories, the deployable ledger, and the squad
//! inference state. Nothing in here may panic on feed data; malformed
//! input degrades to a logged drop.

use std::collections::VecDeque;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::context::TrackerConfig;
use crate::feed::decoder;
use crate::feed::{FeedMessage, classify};
use crate::game_data::{self, exp_id, lookup_experience, lookup_loadout, stat};
use crate::lookup::PrecacheHandle;
use crate::state::{BaseExchange, DeployableKind, SessionCache};

use super::event::Event;

pub struct EventProcessor {
    /// Ring of the most recent raw lines; the feed redelivers, so a
    /// byte-identical line still in the ring is dropped
    recent: VecDeque<String>,
    dedup_window: usize,
    precache: Option<PrecacheHandle>,
}

impl EventProcessor {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            recent: VecDeque::with_capacity(config.dedup_window),
            dedup_window: config.dedup_window,
            precache: None,
        }
    }

    /// Attach the fire-and-forget metadata lookup channel. Without one,
    /// processing still works; downstream reports just resolve IDs cold.
    pub fn set_precache(&mut self, handle: PrecacheHandle) {
        self.precache = Some(handle);
    }

    /// Process one raw feed line. `force` bypasses the run-state gate and
    /// is used during replay, which must process regardless of whether the
    /// session clock is running. Returns the events constructed from the
    /// line, in order; never errors, never panics.
    pub fn process_message(
        &mut self,
        raw: &str,
        force: bool,
        cache: &mut SessionCache,
    ) -> Vec<Event> {
        if !cache.tracking.running && !force {
            return Vec::new();
        }

        if self.recent.iter().any(|seen| seen == raw) {
            debug!("dropped duplicate feed line");
            return Vec::new();
        }
        if self.recent.len() == self.dedup_window {
            self.recent.pop_front();
        }
        self.recent.push_back(raw.to_string());

        let message = match classify(raw) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, "unparsable feed line dropped");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        let mut save = false;

        match message {
            FeedMessage::Service {
                event_name,
                payload,
            } => {
                self.dispatch_service(&event_name, &payload, cache, &mut events, &mut save);
            }
            FeedMessage::Heartbeat => trace!("heartbeat"),
            FeedMessage::StateChange(change) => trace!(?change, "feed state change"),
            FeedMessage::SubscriptionAck => {}
            FeedMessage::Marker { payload } => match decoder::decode_marker(&payload) {
                Ok(marker) => {
                    let ev = Event::Marker {
                        source_id: marker.source_id,
                        timestamp: marker.timestamp,
                        mark: marker.mark,
                    };
                    cache.misc_events.push(ev.clone());
                    events.push(ev);
                    save = true;
                }
                Err(err) => warn!(%err, "bad marker payload dropped"),
            },
            FeedMessage::Unknown { message_type } => {
                warn!(message_type, "unknown feed message type dropped");
            }
        }

        if save {
            cache.push_raw(raw);
        }

        events
    }

    fn dispatch_service(
        &mut self,
        event_name: &str,
        payload: &Value,
        cache: &mut SessionCache,
        events: &mut Vec<Event>,
        save: &mut bool,
    ) {
        let outcome = match event_name {
            "GainExperience" => self.on_experience(payload, cache, events, save),
            "Death" => self.on_death(payload, cache, events, save),
            "PlayerFacilityCapture" => self.on_facility(payload, cache, events, save, true),
            "PlayerFacilityDefend" => self.on_facility(payload, cache, events, save, false),
            "AchievementEarned" => self.on_achievement(payload, cache, save),
            "FacilityControl" => self.on_facility_control(payload, cache, events, save),
            "ItemAdded" => self.on_item_added(payload, cache, save),
            "VehicleDestroy" => self.on_vehicle_destroy(payload, cache, events, save),
            "PlayerLogin" => self.on_login(payload, cache, events),
            "PlayerLogout" => self.on_logout(payload, cache, events),
            other => {
                warn!(event_name = other, "unknown feed event name dropped");
                Ok(())
            }
        };

        if let Err(err) = outcome {
            warn!(event_name, %err, "malformed payload dropped");
        }
    }

    fn on_experience(
        &mut self,
        payload: &Value,
        cache: &mut SessionCache,
        events: &mut Vec<Event>,
        save: &mut bool,
    ) -> Result<(), crate::feed::DecodeError> {
        let p = decoder::decode_experience(payload)?;

        // Deployable lifecycle IDs update the ledger before the generic
        // tally runs; other_id carries the deployable instance.
        match p.experience_id.as_str() {
            exp_id::ROUTER_SPAWN => cache.deployables.on_spawn_tick(
                &p.character_id,
                &p.other_id,
                DeployableKind::Router,
                p.timestamp,
            ),
            exp_id::SUNDY_SPAWN => cache.deployables.on_spawn_tick(
                &p.character_id,
                &p.other_id,
                DeployableKind::GroundVehicleSpawn,
                p.timestamp,
            ),
            exp_id::ROUTER_KILL | exp_id::SUNDY_DESTROY => {
                cache
                    .deployables
                    .on_destroy(&p.other_id, p.timestamp, &p.character_id);
            }
            _ => {}
        }

        let mut ev = Event::Experience {
            source_id: p.character_id.clone(),
            timestamp: p.timestamp,
            zone_id: p.zone_id.clone(),
            exp_id: p.experience_id.clone(),
            true_exp_id: p.experience_id.clone(),
            amount: p.amount.unwrap_or(0),
            target_id: p.other_id.clone(),
            loadout_id: p.loadout_id.clone(),
        };

        let category = lookup_experience(&p.experience_id);

        if let Some(player) = cache.player_mut(&p.character_id) {
            match p.amount {
                Some(amount) => player.score += amount,
                None => {
                    warn!(exp_id = %p.experience_id, "malformed experience amount, score skipped")
                }
            }

            if let Some(category) = category
                && category.track
            {
                player.stats.increment(&p.experience_id);

                if let Some(alias) = category.also_increment {
                    if lookup_experience(alias).is_some_and(|c| c.track) {
                        player.stats.increment(alias);
                    }
                    // Aliased events report as their personal counterpart
                    if let Event::Experience { exp_id, .. } = &mut ev {
                        *exp_id = alias.to_string();
                    }
                }
            }

            player.record_event(ev.clone());
        } else {
            cache.misc_events.push(ev.clone());
        }

        let requests = cache.squads.process_experience(&ev);
        if let Some(precache) = &self.precache {
            for character_id in requests {
                precache.character(&character_id);
            }
        }

        let is_revive =
            p.experience_id == exp_id::REVIVE || p.experience_id == exp_id::SQUAD_REVIVE;
        if is_revive && let Some(target) = cache.player_mut(&p.other_id) {
            target.resolve_pending_death(&ev);
            target.stats.decrement(stat::DEATH);
            target.stats.increment(stat::REVIVED);
        }

        events.push(ev);
        *save = true;
        Ok(())
    }

    fn on_death(
        &mut self,
        payload: &Value,
        cache: &mut SessionCache,
        events: &mut Vec<Event>,
        save: &mut bool,
    ) -> Result<(), crate::feed::DecodeError> {
        let p = decoder::decode_death(payload)?;

        if cache.tracking.running
            && let Some(precache) = &self.precache
        {
            precache.character(&p.character_id);
            precache.character(&p.attacker_id);
        }

        // Both loadouts must resolve or faction attribution is garbage.
        let Some(victim_loadout) = lookup_loadout(&p.character_loadout_id) else {
            warn!(loadout_id = %p.character_loadout_id, "unknown victim loadout, death dropped");
            return Ok(());
        };
        let Some(attacker_loadout) = lookup_loadout(&p.attacker_loadout_id) else {
            warn!(loadout_id = %p.attacker_loadout_id, "unknown attacker loadout, death dropped");
            return Ok(());
        };

        let same_faction = victim_loadout.faction == attacker_loadout.faction;

        if !same_faction && cache.is_tracked(&p.character_id) {
            let ev = Event::Death {
                // Swapped so the source of a Death is the one who died
                source_id: p.character_id.clone(),
                timestamp: p.timestamp,
                zone_id: p.zone_id.clone(),
                target_id: p.attacker_id.clone(),
                loadout_id: p.character_loadout_id.clone(),
                target_loadout_id: p.attacker_loadout_id.clone(),
                weapon_id: p.attacker_weapon_id.clone(),
                is_headshot: p.is_headshot,
                revived: false,
                revived_by: None,
            };

            if let Some(victim) = cache.player_mut(&p.character_id) {
                victim.stats.increment(stat::DEATH);
                victim.record_event(ev.clone());
                victim.set_pending_death(ev.clone());
            }

            if cache.tracking.running
                && let Some(precache) = &self.precache
            {
                precache.weapon(&p.attacker_weapon_id);
            }

            cache.squads.process_kill_death(&ev);
            events.push(ev);
            *save = true;
        }

        if cache.is_tracked(&p.attacker_id) {
            if same_faction {
                let ev = Event::Teamkill {
                    source_id: p.attacker_id.clone(),
                    timestamp: p.timestamp,
                    zone_id: p.zone_id.clone(),
                    target_id: p.character_id.clone(),
                    loadout_id: p.attacker_loadout_id.clone(),
                    target_loadout_id: p.character_loadout_id.clone(),
                    weapon_id: p.attacker_weapon_id.clone(),
                };

                if let Some(attacker) = cache.player_mut(&p.attacker_id) {
                    attacker.stats.increment(stat::TEAMKILL);
                    attacker.record_event(ev.clone());
                }
                if let Some(victim) = cache.player_mut(&p.character_id) {
                    victim.stats.increment(stat::TEAMKILLED);
                }

                events.push(ev);
            } else {
                let ev = Event::Kill {
                    source_id: p.attacker_id.clone(),
                    timestamp: p.timestamp,
                    zone_id: p.zone_id.clone(),
                    target_id: p.character_id.clone(),
                    loadout_id: p.attacker_loadout_id.clone(),
                    target_loadout_id: p.character_loadout_id.clone(),
                    weapon_id: p.attacker_weapon_id.clone(),
                    is_headshot: p.is_headshot,
                };

                if let Some(attacker) = cache.player_mut(&p.attacker_id) {
                    attacker.stats.increment(stat::KILL);
                    if p.is_headshot {
                        attacker.stats.increment(stat::HEADSHOT);
                    }
                    attacker.record_event(ev.clone());
                }

                if let Some(precache) = &self.precache {
                    precache.weapon(&p.attacker_weapon_id);
                }

                cache.squads.process_kill_death(&ev);
                events.push(ev);
            }
            *save = true;
        }

        Ok(())
    }

    fn on_facility(
        &mut self,
        payload: &Value,
        cache: &mut SessionCache,
        events: &mut Vec<Event>,
        save: &mut bool,
        capture: bool,
    ) -> Result<(), crate::feed::DecodeError> {
        let p = decoder::decode_facility(payload)?;

        let ev = if capture {
            Event::Capture {
                source_id: p.character_id.clone(),
                timestamp: p.timestamp,
                zone_id: p.zone_id.clone(),
                outfit_id: p.outfit_id.clone(),
                facility_id: p.facility_id.clone(),
            }
        } else {
            Event::Defend {
                source_id: p.character_id.clone(),
                timestamp: p.timestamp,
                zone_id: p.zone_id.clone(),
                outfit_id: p.outfit_id.clone(),
                facility_id: p.facility_id.clone(),
            }
        };

        // Kept for everyone; outfit credit needs untracked participants too
        cache.capture_participation.push(ev.clone());

        if let Some(player) = cache.player_mut(&p.character_id) {
            let key = if capture {
                stat::BASE_CAPTURE
            } else {
                stat::BASE_DEFENSE
            };
            player.stats.increment(key);
            player.record_event(ev.clone());
        }

        events.push(ev);
        *save = true;
        Ok(())
    }

    fn on_achievement(
        &mut self,
        payload: &Value,
        cache: &mut SessionCache,
        save: &mut bool,
    ) -> Result<(), crate::feed::DecodeError> {
        let p = decoder::decode_achievement(payload)?;
        if let Some(player) = cache.player_mut(&p.character_id) {
            player.ribbons.increment(&p.achievement_id);
            *save = true;
        }
        Ok(())
    }

    fn on_facility_control(
        &mut self,
        payload: &Value,
        cache: &mut SessionCache,
        events: &mut Vec<Event>,
        save: &mut bool,
    ) -> Result<(), crate::feed::DecodeError> {
        let p = decoder::decode_facility_control(payload)?;

        cache.record_base_exchange(BaseExchange {
            facility_id: p.facility_id.clone(),
            zone_id: p.zone_id.clone(),
            faction_id: p.new_faction_id.clone(),
            previous_faction_id: p.old_faction_id.clone(),
            outfit_id: p.outfit_id.clone(),
            timestamp: p.timestamp,
            time_held_secs: p.duration_held_secs,
        });

        events.push(Event::BaseControl {
            source_id: String::new(),
            timestamp: p.timestamp,
            zone_id: p.zone_id,
            facility_id: p.facility_id,
            faction_id: p.new_faction_id,
            previous_faction_id: p.old_faction_id,
            outfit_id: p.outfit_id,
            time_held_secs: p.duration_held_secs,
        });
        *save = true;
        Ok(())
    }

    fn on_item_added(
        &mut self,
        payload: &Value,
        cache: &mut SessionCache,
        save: &mut bool,
    ) -> Result<(), crate::feed::DecodeError> {
        let p = decoder::decode_item_added(payload)?;

        // The router item grant is the only placement signal the feed
        // sends; the instance ID stays unknown until the first spawn tick.
        if p.item_id == game_data::ROUTER_ITEM_ID && cache.is_tracked(&p.character_id) {
            cache
                .deployables
                .on_place(&p.character_id, "", DeployableKind::Router, p.timestamp);
            *save = true;
        }
        Ok(())
    }

    fn on_vehicle_destroy(
        &mut self,
        payload: &Value,
        cache: &mut SessionCache,
        events: &mut Vec<Event>,
        save: &mut bool,
    ) -> Result<(), crate::feed::DecodeError> {
        let p = decoder::decode_vehicle_destroy(payload)?;

        let ev = Event::VehicleKill {
            source_id: p.attacker_id.clone(),
            timestamp: p.timestamp,
            zone_id: p.zone_id,
            target_id: p.character_id,
            loadout_id: p.attacker_loadout_id,
            weapon_id: p.attacker_weapon_id,
            vehicle_id: p.vehicle_id,
            attacker_vehicle_id: p.attacker_vehicle_id,
        };

        if let Some(player) = cache.player_mut(&p.attacker_id) {
            player.record_event(ev.clone());
        } else {
            cache.misc_events.push(ev.clone());
        }

        events.push(ev);
        *save = true;
        Ok(())
    }

    fn on_login(
        &mut self,
        payload: &Value,
        cache: &mut SessionCache,
        events: &mut Vec<Event>,
    ) -> Result<(), crate::feed::DecodeError> {
        let p = decoder::decode_presence(payload)?;

        if !cache.is_tracked(&p.character_id) {
            return Ok(());
        }

        let ev = Event::Login {
            source_id: p.character_id.clone(),
            timestamp: p.timestamp,
        };

        let running = cache.tracking.running;
        if let Some(player) = cache.player_mut(&p.character_id) {
            player.online = true;
            if running {
                player.join_time_ms = p.timestamp;
            }
            player.record_event(ev.clone());

            let name = player.name.clone();
            let outfit_tag = player.outfit_tag.clone();
            cache.squads.add_member(&p.character_id, &name, &outfit_tag);
        }

        events.push(ev);
        Ok(())
    }

    fn on_logout(
        &mut self,
        payload: &Value,
        cache: &mut SessionCache,
        events: &mut Vec<Event>,
    ) -> Result<(), crate::feed::DecodeError> {
        let p = decoder::decode_presence(payload)?;

        if !cache.is_tracked(&p.character_id) {
            return Ok(());
        }

        let ev = Event::Logout {
            source_id: p.character_id.clone(),
            timestamp: p.timestamp,
        };

        let running = cache.tracking.running;
        if let Some(player) = cache.player_mut(&p.character_id) {
            player.online = false;
            if running && player.join_time_ms > 0 {
                player.seconds_online += (p.timestamp - player.join_time_ms) as f64 / 1000.0;
            }
            player.record_event(ev.clone());
        }

        cache.squads.set_offline(&p.character_id);
        events.push(ev);
        Ok(())
    }
}
