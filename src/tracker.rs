//! The tracker facade.
//!
//! Owns the dispatcher, the session cache, and the handler registry, and
//! exposes the operations an embedding application drives: subscribe
//! characters, start/stop the session clock, feed raw lines, inject
//! markers, and advance the liveness tick.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::context::TrackerConfig;
use crate::events::{Event, EventHandler, EventKind, EventProcessor, HandlerRegistry};
use crate::lookup::{CharacterInfo, PrecacheHandle};
use crate::state::SessionCache;

pub struct Tracker {
    config: TrackerConfig,
    processor: EventProcessor,
    cache: SessionCache,
    handlers: HandlerRegistry,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            processor: EventProcessor::new(&config),
            cache: SessionCache::new(&config),
            handlers: HandlerRegistry::new(),
            config,
        }
    }

    /// Wire the fire-and-forget metadata lookup channel into the
    /// dispatcher.
    pub fn set_precache(&mut self, handle: PrecacheHandle) {
        self.processor.set_precache(handle);
    }

    pub fn on(&mut self, kind: EventKind, handler: Box<dyn EventHandler>) {
        self.handlers.on(kind, handler);
    }

    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    /// Feed one raw line from the live stream. Ignored while the session
    /// clock is stopped.
    pub fn process(&mut self, raw: &str) -> Vec<Event> {
        self.dispatch(raw, false)
    }

    /// Feed one raw line during replay, bypassing the run-state gate.
    pub fn process_forced(&mut self, raw: &str) -> Vec<Event> {
        self.dispatch(raw, true)
    }

    fn dispatch(&mut self, raw: &str, force: bool) -> Vec<Event> {
        let events = self.processor.process_message(raw, force, &mut self.cache);
        for event in &events {
            self.handlers.emit(event);
        }
        events
    }

    /// Begin aggregating for a character. Online characters enter the
    /// squad roster immediately; offline ones join on their next login.
    /// Duplicate-safe; an already-subscribed character keeps its record.
    pub fn subscribe(&mut self, info: &CharacterInfo, now_ms: i64) {
        self.cache.add_player(
            &info.character_id,
            &info.name,
            &info.outfit_tag,
            info.faction(),
        );

        if info.online && let Some(player) = self.cache.player_mut(&info.character_id) {
            player.online = true;
            player.join_time_ms = now_ms;
            self.cache
                .squads
                .add_member(&info.character_id, &info.name, &info.outfit_tag);
        }
    }

    /// Subscribe a whole batch, e.g. an outfit roster.
    pub fn subscribe_players(&mut self, infos: &[CharacterInfo], now_ms: i64) {
        for info in infos {
            self.subscribe(info, now_ms);
        }
    }

    pub fn start(&mut self, now_ms: i64) {
        self.cache.start(now_ms);
        // Everyone already subscribed starts accruing online time now.
        for player in self.cache.players.values_mut() {
            player.join_time_ms = now_ms;
        }
    }

    pub fn stop(&mut self, now_ms: i64) {
        self.cache.stop(now_ms);
    }

    /// Inject an out-of-band marker at `now_ms`. Written to the raw log as
    /// a feed-shaped line so replay delivers it in sequence.
    pub fn add_marker(&mut self, mark: &str, now_ms: i64) {
        if !self.cache.tracking.running {
            warn!(mark, "marker added while tracking is stopped");
        }

        let line = serde_json::json!({
            "type": "toptMarker",
            "payload": {
                "mark": mark,
                "sourceID": "",
                "timestamp": now_ms.to_string(),
            }
        })
        .to_string();

        self.cache.push_raw(&line);
    }

    /// Finish a squad auto-add once the character lookup has resolved.
    /// The character becomes a fully tracked player, not just a roster
    /// entry. Returns IDs of further characters discovered by the
    /// replayed events.
    pub fn complete_auto_add(
        &mut self,
        character_id: &str,
        name: &str,
        outfit_tag: &str,
        now_ms: i64,
    ) -> Vec<String> {
        self.cache.add_player(character_id, name, outfit_tag, None);
        if self.cache.tracking.running
            && let Some(player) = self.cache.player_mut(character_id)
        {
            player.online = true;
            player.join_time_ms = now_ms;
        }

        self.cache
            .squads
            .complete_auto_add(character_id, name, outfit_tag)
    }

    /// Advance death timers and beacon cooldowns to `now_ms`. Driven by
    /// the background task in live mode and explicitly during replay.
    pub fn tick(&mut self, now_ms: i64) {
        self.cache.squads.tick(now_ms);
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SessionCache {
        &mut self.cache
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Wrap for sharing with background tasks.
    pub fn into_shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn char_info(id: &str, name: &str, online: bool) -> CharacterInfo {
        CharacterInfo {
            character_id: id.to_string(),
            name: name.to_string(),
            outfit_tag: "TOPT".to_string(),
            faction_id: "2".to_string(),
            online,
        }
    }

    #[test]
    fn handlers_fire_per_kind_in_order() {
        let mut tracker = Tracker::new(TrackerConfig::default());
        tracker.subscribe(&char_info("100", "Varga", false), 0);
        tracker.start(0);

        let kills = Arc::new(AtomicUsize::new(0));
        let counter = kills.clone();
        tracker.on(
            EventKind::Exp,
            Box::new(move |_: &Event| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let line = serde_json::json!({
            "type": "serviceMessage",
            "payload": {
                "event_name": "GainExperience",
                "character_id": "100",
                "other_id": "",
                "experience_id": "4",
                "amount": "50",
                "loadout_id": "4",
                "zone_id": "2",
                "timestamp": "10",
            }
        })
        .to_string();

        tracker.process(&line);
        assert_eq!(kills.load(Ordering::SeqCst), 1);

        tracker.clear_handlers();
        // Duplicate lines are dropped by the ring; change the timestamp.
        let line = line.replace("\"10\"", "\"11\"");
        tracker.process(&line);
        assert_eq!(kills.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribe_online_joins_squad_roster() {
        let mut tracker = Tracker::new(TrackerConfig::default());
        tracker.subscribe_players(
            &[char_info("100", "Varga", true), char_info("200", "Kess", false)],
            5_000,
        );

        assert!(tracker.cache().squads.member("100").is_some());
        assert!(tracker.cache().squads.member("200").is_none());
        assert!(tracker.cache().player("100").unwrap().online);
    }

    #[test]
    fn auto_add_completion_starts_full_tracking() {
        let config = TrackerConfig {
            auto_add: true,
            ..TrackerConfig::default()
        };
        let mut tracker = Tracker::new(config);
        tracker.subscribe(&char_info("100", "Varga", true), 0);
        tracker.start(0);

        let line = serde_json::json!({
            "type": "serviceMessage",
            "payload": {
                "event_name": "GainExperience",
                "character_id": "100",
                "other_id": "9999",
                "experience_id": "51",
                "amount": "100",
                "loadout_id": "4",
                "zone_id": "2",
                "timestamp": "10",
            }
        })
        .to_string();
        tracker.process(&line);
        assert!(!tracker.cache().is_tracked("9999"));

        tracker.complete_auto_add("9999", "Drifter", "", 10_000);

        let player = tracker.cache().player("9999").unwrap();
        assert!(player.online);
        assert_eq!(player.join_time_ms, 10_000);
        assert_eq!(
            tracker.cache().squads.squad_of("9999").unwrap().id,
            tracker.cache().squads.squad_of("100").unwrap().id,
        );
    }

    #[test]
    fn marker_round_trips_through_replay() {
        let mut tracker = Tracker::new(TrackerConfig::default());
        tracker.start(0);
        tracker.add_marker("point hold", 42_000);

        let line = tracker.cache().raw_log[0].clone();
        let events = tracker.process_forced(&line);
        assert!(matches!(
            &events[0],
            Event::Marker { mark, timestamp, .. } if mark == "point hold" && *timestamp == 42_000
        ));
    }
}
