use serde_json::json;

use crate::context::TrackerConfig;
use crate::game_data::stat;
use crate::state::SessionCache;

use super::event::{Event, EventKind};
use super::processor::EventProcessor;

fn setup() -> (EventProcessor, SessionCache) {
    let config = TrackerConfig::default();
    let mut cache = SessionCache::new(&config);
    cache.add_player("100", "Varga", "TOPT", None);
    cache.add_player("200", "Kess", "TOPT", None);
    cache.start(0);
    (EventProcessor::new(&config), cache)
}

fn death_line(
    attacker: &str,
    victim: &str,
    attacker_loadout: &str,
    victim_loadout: &str,
) -> String {
    json!({
        "type": "serviceMessage",
        "payload": {
            "event_name": "Death",
            "character_id": victim,
            "attacker_character_id": attacker,
            "character_loadout_id": victim_loadout,
            "attacker_loadout_id": attacker_loadout,
            "attacker_weapon_id": "7420",
            "is_headshot": "1",
            "zone_id": "2",
            "timestamp": "1000",
        }
    })
    .to_string()
}

fn exp_line(source: &str, target: &str, exp_id: &str, ts_secs: &str) -> String {
    json!({
        "type": "serviceMessage",
        "payload": {
            "event_name": "GainExperience",
            "character_id": source,
            "other_id": target,
            "experience_id": exp_id,
            "amount": "75",
            "loadout_id": "4",
            "zone_id": "2",
            "timestamp": ts_secs,
        }
    })
    .to_string()
}

#[test]
fn ignored_when_not_running_unless_forced() {
    let config = TrackerConfig::default();
    let mut cache = SessionCache::new(&config);
    cache.add_player("100", "Varga", "TOPT", None);
    let mut proc = EventProcessor::new(&config);

    let line = exp_line("100", "", "4", "10");
    assert!(proc.process_message(&line, false, &mut cache).is_empty());
    assert_eq!(cache.player("100").unwrap().score, 0);

    // Replay mode processes regardless of the session clock.
    let events = proc.process_message(&line, true, &mut cache);
    assert_eq!(events.len(), 1);
    assert_eq!(cache.player("100").unwrap().score, 75);
}

#[test]
fn kill_death_revive_end_to_end() {
    let (mut proc, mut cache) = setup();

    // NC heavy kills TR heavy: a Kill for the attacker, a Death for the
    // victim.
    let events = proc.process_message(&death_line("100", "200", "6", "13"), false, &mut cache);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind(), EventKind::Death);
    assert_eq!(events[1].kind(), EventKind::Kill);

    assert_eq!(cache.player("100").unwrap().stats.get(stat::KILL), 1);
    assert_eq!(cache.player("100").unwrap().stats.get(stat::HEADSHOT), 1);
    assert_eq!(cache.player("200").unwrap().stats.get(stat::DEATH), 1);
    assert!(cache.player("200").unwrap().pending_death.is_some());

    // Revive 1.5s later undoes the death and links the revive.
    let events = proc.process_message(&exp_line("100", "200", "7", "2"), false, &mut cache);
    assert_eq!(events.len(), 1);

    let victim = cache.player("200").unwrap();
    assert_eq!(victim.stats.get(stat::DEATH), 0);
    assert_eq!(victim.stats.get(stat::REVIVED), 1);
    assert!(victim.pending_death.is_none());
    assert!(matches!(
        victim.history.iter().rev().find(|e| e.kind() == EventKind::Death),
        Some(Event::Death { revived: true, revived_by: Some(_), .. })
    ));
}

#[test]
fn duplicate_line_never_double_counts() {
    let (mut proc, mut cache) = setup();

    let line = death_line("100", "200", "6", "13");
    proc.process_message(&line, false, &mut cache);
    let events = proc.process_message(&line, false, &mut cache);

    assert!(events.is_empty());
    assert_eq!(cache.player("100").unwrap().stats.get(stat::KILL), 1);
    assert_eq!(cache.player("200").unwrap().stats.get(stat::DEATH), 1);
    assert_eq!(cache.raw_log.len(), 1);
}

#[test]
fn duplicate_outside_ring_counts_again() {
    let (mut proc, mut cache) = setup();

    let line = death_line("100", "200", "6", "13");
    proc.process_message(&line, false, &mut cache);
    for i in 0..5 {
        proc.process_message(&exp_line("100", "", "4", &format!("{}", 10 + i)), false, &mut cache);
    }
    proc.process_message(&line, false, &mut cache);

    assert_eq!(cache.player("100").unwrap().stats.get(stat::KILL), 2);
}

#[test]
fn same_faction_death_is_a_teamkill() {
    let (mut proc, mut cache) = setup();

    // Both NC loadouts.
    let events = proc.process_message(&death_line("100", "200", "6", "4"), false, &mut cache);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::Teamkill);

    assert_eq!(cache.player("100").unwrap().stats.get(stat::TEAMKILL), 1);
    assert_eq!(cache.player("100").unwrap().stats.get(stat::KILL), 0);
    assert_eq!(cache.player("200").unwrap().stats.get(stat::TEAMKILLED), 1);
    assert_eq!(cache.player("200").unwrap().stats.get(stat::DEATH), 0);
}

#[test]
fn unknown_loadout_discards_the_death() {
    let (mut proc, mut cache) = setup();

    let events = proc.process_message(&death_line("100", "200", "6", "999"), false, &mut cache);
    assert!(events.is_empty());
    assert_eq!(cache.player("100").unwrap().stats.get(stat::KILL), 0);
    assert_eq!(cache.player("200").unwrap().stats.get(stat::DEATH), 0);
    assert!(cache.raw_log.is_empty());
}

#[test]
fn squad_heal_aliases_to_heal() {
    let (mut proc, mut cache) = setup();

    let events = proc.process_message(&exp_line("100", "200", "51", "10"), false, &mut cache);

    let player = cache.player("100").unwrap();
    assert_eq!(player.stats.get("51"), 1);
    assert_eq!(player.stats.get("4"), 1);
    assert_eq!(player.score, 75);

    // The emitted event reports as the personal category, raw ID intact.
    assert!(matches!(
        &events[0],
        Event::Experience { exp_id, true_exp_id, .. }
            if exp_id == "4" && true_exp_id == "51"
    ));
}

#[test]
fn untracked_experience_lands_in_misc() {
    let (mut proc, mut cache) = setup();

    proc.process_message(&exp_line("999", "", "4", "10"), false, &mut cache);
    assert_eq!(cache.misc_events.len(), 1);
}

#[test]
fn captures_recorded_for_untracked_characters() {
    let (mut proc, mut cache) = setup();

    let line = json!({
        "type": "serviceMessage",
        "payload": {
            "event_name": "PlayerFacilityCapture",
            "character_id": "999",
            "outfit_id": "37509",
            "facility_id": "6200",
            "zone_id": "2",
            "timestamp": "1000",
        }
    })
    .to_string();

    let events = proc.process_message(&line, false, &mut cache);
    assert_eq!(events.len(), 1);
    assert_eq!(cache.capture_participation.len(), 1);
    assert_eq!(cache.player("100").unwrap().stats.get(stat::BASE_CAPTURE), 0);
}

#[test]
fn tracked_defend_increments_counter() {
    let (mut proc, mut cache) = setup();

    let line = json!({
        "type": "serviceMessage",
        "payload": {
            "event_name": "PlayerFacilityDefend",
            "character_id": "100",
            "outfit_id": "37509",
            "facility_id": "6200",
            "zone_id": "2",
            "timestamp": "1000",
        }
    })
    .to_string();

    proc.process_message(&line, false, &mut cache);
    assert_eq!(cache.player("100").unwrap().stats.get(stat::BASE_DEFENSE), 1);
    assert_eq!(cache.capture_participation.len(), 1);
}

#[test]
fn facility_control_records_base_exchange() {
    let (mut proc, mut cache) = setup();

    let line = json!({
        "type": "serviceMessage",
        "payload": {
            "event_name": "FacilityControl",
            "facility_id": "6200",
            "outfit_id": "37509",
            "new_faction_id": "2",
            "old_faction_id": "3",
            "duration_held": "1370",
            "zone_id": "2",
            "timestamp": "1000",
        }
    })
    .to_string();

    let events = proc.process_message(&line, false, &mut cache);
    assert_eq!(events[0].kind(), EventKind::Base);
    assert_eq!(cache.base_exchanges.len(), 1);
    assert_eq!(cache.base_exchanges[0].time_held_secs, 1370);
    assert_eq!(cache.base_exchanges[0].previous_faction_id, "3");
}

#[test]
fn achievement_increments_ribbons() {
    let (mut proc, mut cache) = setup();

    let line = json!({
        "type": "serviceMessage",
        "payload": {
            "event_name": "AchievementEarned",
            "character_id": "100",
            "achievement_id": "90040",
            "timestamp": "1000",
        }
    })
    .to_string();

    let events = proc.process_message(&line, false, &mut cache);
    assert!(events.is_empty());
    assert_eq!(cache.player("100").unwrap().ribbons.get("90040"), 1);
}

#[test]
fn vehicle_destroy_by_untracked_goes_to_misc() {
    let (mut proc, mut cache) = setup();

    let line = json!({
        "type": "serviceMessage",
        "payload": {
            "event_name": "VehicleDestroy",
            "attacker_character_id": "999",
            "attacker_loadout_id": "6",
            "attacker_weapon_id": "7420",
            "attacker_vehicle_id": "0",
            "character_id": "100",
            "vehicle_id": "2",
            "zone_id": "2",
            "timestamp": "1000",
        }
    })
    .to_string();

    let events = proc.process_message(&line, false, &mut cache);
    assert_eq!(events[0].kind(), EventKind::Vehicle);
    assert_eq!(cache.misc_events.len(), 1);
}

#[test]
fn login_logout_accumulates_online_seconds() {
    let (mut proc, mut cache) = setup();

    let login = json!({
        "type": "serviceMessage",
        "payload": {
            "event_name": "PlayerLogin",
            "character_id": "100",
            "timestamp": "1000",
        }
    })
    .to_string();
    let logout = json!({
        "type": "serviceMessage",
        "payload": {
            "event_name": "PlayerLogout",
            "character_id": "100",
            "timestamp": "1090",
        }
    })
    .to_string();

    proc.process_message(&login, false, &mut cache);
    assert!(cache.player("100").unwrap().online);
    // Login also feeds the squad roster.
    assert!(cache.squads.member("100").is_some());

    proc.process_message(&logout, false, &mut cache);
    let player = cache.player("100").unwrap();
    assert!(!player.online);
    assert_eq!(player.seconds_online, 90.0);
    assert!(!cache.squads.member("100").unwrap().online);
}

#[test]
fn marker_only_appears_during_replay() {
    let (mut proc, mut cache) = setup();

    let line = json!({
        "type": "toptMarker",
        "payload": {
            "mark": "push started",
            "sourceID": "100",
            "timestamp": "1000000",
        }
    })
    .to_string();

    let events = proc.process_message(&line, true, &mut cache);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        Event::Marker { mark, timestamp, .. } if mark == "push started" && *timestamp == 1_000_000
    ));
    assert_eq!(cache.misc_events.len(), 1);
}

#[test]
fn noise_and_garbage_are_dropped_quietly() {
    let (mut proc, mut cache) = setup();

    assert!(proc.process_message("not json at all", false, &mut cache).is_empty());
    assert!(proc
        .process_message(r#"{"type":"heartbeat"}"#, false, &mut cache)
        .is_empty());
    assert!(proc
        .process_message(r#"{"type":"serviceStateChanged"}"#, false, &mut cache)
        .is_empty());
    assert!(proc
        .process_message(r#"{"subscription":{"characterCount":40}}"#, false, &mut cache)
        .is_empty());

    let unknown = json!({
        "type": "serviceMessage",
        "payload": { "event_name": "SkillAdded", "timestamp": "10" }
    })
    .to_string();
    assert!(proc.process_message(&unknown, false, &mut cache).is_empty());
    assert!(cache.raw_log.is_empty());
}

#[test]
fn deployable_lifecycle_from_experience_ids() {
    let (mut proc, mut cache) = setup();

    // Three squad spawns on a router, then the router is destroyed.
    for ts in ["100", "110", "120"] {
        proc.process_message(&exp_line("100", "4000", "1410", ts), false, &mut cache);
    }
    proc.process_message(&exp_line("999", "4000", "1409", "130"), false, &mut cache);

    assert_eq!(cache.deployables.archive().len(), 1);
    let router = &cache.deployables.archive()[0];
    assert_eq!(router.spawn_count, 3);
    assert_eq!(router.destroyed_at, Some(130_000));
    assert_eq!(router.destroyed_by.as_deref(), Some("999"));
}
