mod batcher;
mod resolver;

pub use batcher::{PrecacheHandle, PrecacheRequest, spawn_precache_worker};
pub use resolver::{
    CharacterInfo, FacilityInfo, MetadataCache, MetadataResolver, OutfitInfo, WeaponInfo,
};
