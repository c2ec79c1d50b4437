//! Strict per-event payload decoders.
//!
//! One decoder per feed `event_name`, each returning a typed payload or a
//! [`DecodeError`]. Timestamps arrive as decimal-seconds strings and are
//! converted to milliseconds here so nothing downstream ever sees feed
//! units. Field parsing is strict where a miscoded value would corrupt
//! attribution (IDs, timestamps) and lenient where it would only degrade a
//! tally (the experience amount).

use serde_json::Value;

use super::error::DecodeError;

fn str_field(payload: &Value, field: &'static str) -> Result<String, DecodeError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(DecodeError::MissingField { field })
}

/// Optional string field, empty when absent. Used for fields the feed omits
/// on some event kinds (`zone_id` on logins, outfit IDs for outfitless
/// characters).
fn opt_str_field(payload: &Value, field: &str) -> String {
    payload
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Feed timestamps are decimal seconds in a string. Converted to ms.
fn timestamp_ms(payload: &Value) -> Result<i64, DecodeError> {
    let raw = str_field(payload, "timestamp")?;
    let secs: i64 = raw.parse().map_err(|_| DecodeError::InvalidField {
        field: "timestamp",
        detail: raw,
    })?;
    Ok(secs * 1000)
}

fn flag_field(payload: &Value, field: &str) -> bool {
    payload.get(field).and_then(Value::as_str) == Some("1")
}

#[derive(Debug)]
pub struct ExperiencePayload {
    pub character_id: String,
    pub other_id: String,
    pub experience_id: String,
    /// None when the feed sends a malformed amount; the event still counts,
    /// the score tally is skipped
    pub amount: Option<i64>,
    pub loadout_id: String,
    pub zone_id: String,
    pub timestamp: i64,
}

pub fn decode_experience(payload: &Value) -> Result<ExperiencePayload, DecodeError> {
    Ok(ExperiencePayload {
        character_id: str_field(payload, "character_id")?,
        other_id: opt_str_field(payload, "other_id"),
        experience_id: str_field(payload, "experience_id")?,
        amount: payload
            .get("amount")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
        loadout_id: opt_str_field(payload, "loadout_id"),
        zone_id: opt_str_field(payload, "zone_id"),
        timestamp: timestamp_ms(payload)?,
    })
}

#[derive(Debug)]
pub struct DeathPayload {
    /// The character who died
    pub character_id: String,
    pub attacker_id: String,
    pub character_loadout_id: String,
    pub attacker_loadout_id: String,
    pub attacker_weapon_id: String,
    pub is_headshot: bool,
    pub zone_id: String,
    pub timestamp: i64,
}

pub fn decode_death(payload: &Value) -> Result<DeathPayload, DecodeError> {
    Ok(DeathPayload {
        character_id: str_field(payload, "character_id")?,
        attacker_id: str_field(payload, "attacker_character_id")?,
        character_loadout_id: str_field(payload, "character_loadout_id")?,
        attacker_loadout_id: str_field(payload, "attacker_loadout_id")?,
        attacker_weapon_id: opt_str_field(payload, "attacker_weapon_id"),
        is_headshot: flag_field(payload, "is_headshot"),
        zone_id: opt_str_field(payload, "zone_id"),
        timestamp: timestamp_ms(payload)?,
    })
}

#[derive(Debug)]
pub struct FacilityPayload {
    pub character_id: String,
    pub outfit_id: String,
    pub facility_id: String,
    pub zone_id: String,
    pub timestamp: i64,
}

pub fn decode_facility(payload: &Value) -> Result<FacilityPayload, DecodeError> {
    Ok(FacilityPayload {
        character_id: str_field(payload, "character_id")?,
        outfit_id: opt_str_field(payload, "outfit_id"),
        facility_id: str_field(payload, "facility_id")?,
        zone_id: opt_str_field(payload, "zone_id"),
        timestamp: timestamp_ms(payload)?,
    })
}

#[derive(Debug)]
pub struct FacilityControlPayload {
    pub facility_id: String,
    pub outfit_id: String,
    pub new_faction_id: String,
    pub old_faction_id: String,
    pub duration_held_secs: i64,
    pub zone_id: String,
    pub timestamp: i64,
}

pub fn decode_facility_control(payload: &Value) -> Result<FacilityControlPayload, DecodeError> {
    let raw_held = str_field(payload, "duration_held")?;
    let duration_held_secs = raw_held.parse().map_err(|_| DecodeError::InvalidField {
        field: "duration_held",
        detail: raw_held,
    })?;
    Ok(FacilityControlPayload {
        facility_id: str_field(payload, "facility_id")?,
        outfit_id: opt_str_field(payload, "outfit_id"),
        new_faction_id: opt_str_field(payload, "new_faction_id"),
        old_faction_id: opt_str_field(payload, "old_faction_id"),
        duration_held_secs,
        zone_id: opt_str_field(payload, "zone_id"),
        timestamp: timestamp_ms(payload)?,
    })
}

#[derive(Debug)]
pub struct AchievementPayload {
    pub character_id: String,
    pub achievement_id: String,
    pub timestamp: i64,
}

pub fn decode_achievement(payload: &Value) -> Result<AchievementPayload, DecodeError> {
    Ok(AchievementPayload {
        character_id: str_field(payload, "character_id")?,
        achievement_id: str_field(payload, "achievement_id")?,
        timestamp: timestamp_ms(payload)?,
    })
}

#[derive(Debug)]
pub struct VehicleDestroyPayload {
    pub attacker_id: String,
    pub attacker_loadout_id: String,
    pub attacker_weapon_id: String,
    pub attacker_vehicle_id: String,
    pub character_id: String,
    pub vehicle_id: String,
    pub zone_id: String,
    pub timestamp: i64,
}

pub fn decode_vehicle_destroy(payload: &Value) -> Result<VehicleDestroyPayload, DecodeError> {
    Ok(VehicleDestroyPayload {
        attacker_id: str_field(payload, "attacker_character_id")?,
        attacker_loadout_id: opt_str_field(payload, "attacker_loadout_id"),
        attacker_weapon_id: opt_str_field(payload, "attacker_weapon_id"),
        attacker_vehicle_id: opt_str_field(payload, "attacker_vehicle_id"),
        character_id: opt_str_field(payload, "character_id"),
        vehicle_id: str_field(payload, "vehicle_id")?,
        zone_id: opt_str_field(payload, "zone_id"),
        timestamp: timestamp_ms(payload)?,
    })
}

#[derive(Debug)]
pub struct PresencePayload {
    pub character_id: String,
    pub timestamp: i64,
}

pub fn decode_presence(payload: &Value) -> Result<PresencePayload, DecodeError> {
    Ok(PresencePayload {
        character_id: str_field(payload, "character_id")?,
        timestamp: timestamp_ms(payload)?,
    })
}

#[derive(Debug)]
pub struct ItemAddedPayload {
    pub character_id: String,
    pub item_id: String,
    pub timestamp: i64,
}

pub fn decode_item_added(payload: &Value) -> Result<ItemAddedPayload, DecodeError> {
    Ok(ItemAddedPayload {
        character_id: str_field(payload, "character_id")?,
        item_id: str_field(payload, "item_id")?,
        timestamp: timestamp_ms(payload)?,
    })
}

#[derive(Debug)]
pub struct MarkerPayload {
    pub mark: String,
    pub source_id: String,
    /// Already in milliseconds; markers are written by the tracker itself
    pub timestamp: i64,
}

pub fn decode_marker(payload: &Value) -> Result<MarkerPayload, DecodeError> {
    let raw_ts = str_field(payload, "timestamp")?;
    let timestamp = raw_ts.parse().map_err(|_| DecodeError::InvalidField {
        field: "timestamp",
        detail: raw_ts,
    })?;
    Ok(MarkerPayload {
        mark: str_field(payload, "mark")?,
        source_id: opt_str_field(payload, "sourceID"),
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamps_convert_to_millis() {
        let payload = json!({
            "character_id": "5428",
            "experience_id": "7",
            "amount": "75",
            "timestamp": "1600000000",
        });
        let decoded = decode_experience(&payload).unwrap();
        assert_eq!(decoded.timestamp, 1_600_000_000_000);
        assert_eq!(decoded.amount, Some(75));
    }

    #[test]
    fn malformed_amount_degrades_to_none() {
        let payload = json!({
            "character_id": "5428",
            "experience_id": "4",
            "amount": "not-a-number",
            "timestamp": "10",
        });
        let decoded = decode_experience(&payload).unwrap();
        assert_eq!(decoded.amount, None);
    }

    #[test]
    fn missing_required_field_fails() {
        let payload = json!({ "timestamp": "10" });
        assert!(matches!(
            decode_death(&payload),
            Err(DecodeError::MissingField { .. })
        ));
    }
}
