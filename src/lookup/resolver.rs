//! Metadata resolver contracts and the resolved-metadata cache.
//!
//! The engine never blocks on metadata. The dispatcher fires IDs at the
//! precache worker and moves on; resolved records land in a shared
//! [`MetadataCache`] that report generators consult later. Resolvers are
//! injected rather than global so tests run against fakes.

use hashbrown::HashMap;
use serde::Deserialize;

use crate::context::LookupError;
use crate::game_data::Faction;

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterInfo {
    pub character_id: String,
    pub name: String,
    #[serde(default)]
    pub outfit_tag: String,
    #[serde(default)]
    pub faction_id: String,
    #[serde(default)]
    pub online: bool,
}

impl CharacterInfo {
    pub fn faction(&self) -> Option<Faction> {
        match self.faction_id.as_str() {
            "1" => Some(Faction::Vs),
            "2" => Some(Faction::Nc),
            "3" => Some(Faction::Tr),
            "4" => Some(Faction::Ns),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeaponInfo {
    pub weapon_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutfitInfo {
    pub outfit_id: String,
    pub tag: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacilityInfo {
    pub facility_id: String,
    pub name: String,
    #[serde(default)]
    pub zone_id: String,
}

/// Batched, async metadata source. Implementations omit unknown IDs from
/// the result instead of failing; an error means the whole request failed
/// (transport, decode), and the caller retries or degrades.
pub trait MetadataResolver: Send + Sync + 'static {
    fn characters_by_id(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<CharacterInfo>, LookupError>> + Send;

    fn weapons_by_id(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<WeaponInfo>, LookupError>> + Send;

    fn outfits_by_id(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<OutfitInfo>, LookupError>> + Send;

    fn facilities_by_id(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<FacilityInfo>, LookupError>> + Send;
}

/// Everything the precache worker has resolved so far. Shared between the
/// worker and report generation; a miss just means the lookup has not
/// landed yet (or the ID is unknown upstream) and display degrades.
#[derive(Debug, Default)]
pub struct MetadataCache {
    characters: HashMap<String, CharacterInfo>,
    weapons: HashMap<String, WeaponInfo>,
    outfits: HashMap<String, OutfitInfo>,
    facilities: HashMap<String, FacilityInfo>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character(&self, id: &str) -> Option<&CharacterInfo> {
        self.characters.get(id)
    }

    pub fn weapon(&self, id: &str) -> Option<&WeaponInfo> {
        self.weapons.get(id)
    }

    pub fn outfit(&self, id: &str) -> Option<&OutfitInfo> {
        self.outfits.get(id)
    }

    pub fn facility(&self, id: &str) -> Option<&FacilityInfo> {
        self.facilities.get(id)
    }

    pub fn has_character(&self, id: &str) -> bool {
        self.characters.contains_key(id)
    }

    pub fn has_weapon(&self, id: &str) -> bool {
        self.weapons.contains_key(id)
    }

    pub fn insert_characters(&mut self, records: Vec<CharacterInfo>) {
        for record in records {
            self.characters.insert(record.character_id.clone(), record);
        }
    }

    pub fn insert_weapons(&mut self, records: Vec<WeaponInfo>) {
        for record in records {
            self.weapons.insert(record.weapon_id.clone(), record);
        }
    }

    pub fn insert_outfits(&mut self, records: Vec<OutfitInfo>) {
        for record in records {
            self.outfits.insert(record.outfit_id.clone(), record);
        }
    }

    pub fn insert_facilities(&mut self, records: Vec<FacilityInfo>) {
        for record in records {
            self.facilities.insert(record.facility_id.clone(), record);
        }
    }
}
