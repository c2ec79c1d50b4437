//! Lifecycle tracking for player-owned deployables.
//!
//! The feed never announces a deployable directly; its existence is
//! inferred from the experience ticks it generates (placement, spawn use,
//! destroy credit). Instance IDs are feed-assigned and only become known on
//! the first spawn tick, so a placement can create a record with an empty
//! ID that is adopted by the next tick from the same owner.

use hashbrown::HashMap;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeployableKind {
    Router,
    GroundVehicleSpawn,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct Deployable {
    /// Feed-assigned instance ID; empty until the first spawn tick
    pub id: String,
    pub owner_id: String,
    pub kind: DeployableKind,
    pub pulled_at: i64,
    pub first_spawn_at: Option<i64>,
    pub destroyed_at: Option<i64>,
    /// None when the retirement was inferred from a replacement rather
    /// than observed as a destroy event
    pub destroyed_by: Option<String>,
    pub spawn_count: u64,
    /// Timestamps of every spawn tick, for downstream usage charts
    pub spawns: Vec<i64>,
}

/// Active deployables keyed by instance ID plus an append-only archive.
/// Invariant: at most one active deployable per owner per kind.
#[derive(Debug, Clone, Default)]
pub struct DeployableTracker {
    active: HashMap<String, Deployable>,
    archive: Vec<Deployable>,
}

impl DeployableTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit placement. The previous active deployable of the same kind
    /// by this owner is retired; the feed rarely sends a destroy before a
    /// rebuild.
    pub fn on_place(
        &mut self,
        owner_id: &str,
        instance_id: &str,
        kind: DeployableKind,
        timestamp: i64,
    ) {
        self.retire_owner_active(owner_id, kind, timestamp);

        debug!(owner = owner_id, instance = instance_id, ?kind, "deployable placed");
        self.active.insert(
            instance_id.to_string(),
            Deployable {
                id: instance_id.to_string(),
                owner_id: owner_id.to_string(),
                kind,
                pulled_at: timestamp,
                first_spawn_at: None,
                destroyed_at: None,
                destroyed_by: None,
                spawn_count: 0,
                spawns: Vec::new(),
            },
        );
    }

    /// A character spawned on the deployable. An unknown instance ID
    /// implies a placement the feed never reported; the prior active
    /// instance for that owner/kind is archived with an inferred
    /// destruction time.
    pub fn on_spawn_tick(
        &mut self,
        owner_id: &str,
        instance_id: &str,
        kind: DeployableKind,
        timestamp: i64,
    ) {
        if !self.active.contains_key(instance_id) {
            // Adopt a pending placement with no ID yet, if one exists.
            let pending = self
                .active
                .iter()
                .find(|(_, d)| d.owner_id == owner_id && d.kind == kind && d.id.is_empty())
                .map(|(key, _)| key.clone());

            if let Some(key) = pending {
                let mut deployable = self.active.remove(&key).unwrap_or_else(|| unreachable!());
                deployable.id = instance_id.to_string();
                self.active.insert(instance_id.to_string(), deployable);
            } else {
                self.on_place(owner_id, instance_id, kind, timestamp);
            }
            debug!(
                owner = owner_id,
                instance = instance_id,
                ?kind,
                "deployable found from spawn tick"
            );
        }

        if let Some(deployable) = self.active.get_mut(instance_id) {
            deployable.spawn_count += 1;
            deployable.spawns.push(timestamp);
            deployable.first_spawn_at.get_or_insert(timestamp);
        }
    }

    /// Destroy credit for an active instance. No matching instance is a
    /// state inconsistency logged as a no-op.
    pub fn on_destroy(&mut self, instance_id: &str, timestamp: i64, destroyer_id: &str) {
        match self.active.remove(instance_id) {
            Some(mut deployable) => {
                deployable.destroyed_at = Some(timestamp);
                deployable.destroyed_by = Some(destroyer_id.to_string());
                debug!(
                    instance = instance_id,
                    destroyer = destroyer_id,
                    spawns = deployable.spawn_count,
                    lifetime_ms = timestamp - deployable.pulled_at,
                    "deployable destroyed"
                );
                self.archive.push(deployable);
            }
            None => {
                warn!(instance = instance_id, "destroy for unknown deployable, ignoring");
            }
        }
    }

    fn retire_owner_active(&mut self, owner_id: &str, kind: DeployableKind, timestamp: i64) {
        let replaced: Vec<String> = self
            .active
            .iter()
            .filter(|(_, d)| d.owner_id == owner_id && d.kind == kind)
            .map(|(key, _)| key.clone())
            .collect();

        for key in replaced {
            if let Some(mut deployable) = self.active.remove(&key) {
                deployable.destroyed_at = Some(timestamp);
                debug!(
                    owner = owner_id,
                    instance = %deployable.id,
                    "deployable replaced, archiving"
                );
                self.archive.push(deployable);
            }
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Deployable> {
        self.active.values()
    }

    pub fn get_active(&self, instance_id: &str) -> Option<&Deployable> {
        self.active.get(instance_id)
    }

    pub fn archive(&self) -> &[Deployable] {
        &self.archive
    }

    /// Move everything still active into the archive, with no destruction
    /// time. Called when tracking stops.
    pub fn finalize(&mut self) {
        let remaining: Vec<String> = self.active.keys().cloned().collect();
        for key in remaining {
            if let Some(deployable) = self.active.remove(&key) {
                self.archive.push(deployable);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacement_archives_prior_with_inferred_destruction() {
        let mut tracker = DeployableTracker::new();
        tracker.on_place("owner", "x", DeployableKind::Router, 1_000);
        tracker.on_spawn_tick("owner", "x", DeployableKind::Router, 2_000);
        tracker.on_spawn_tick("owner", "x", DeployableKind::Router, 3_000);
        tracker.on_spawn_tick("owner", "x", DeployableKind::Router, 4_000);

        tracker.on_place("owner", "y", DeployableKind::Router, 5_000);

        assert_eq!(tracker.archive().len(), 1);
        let archived = &tracker.archive()[0];
        assert_eq!(archived.id, "x");
        assert_eq!(archived.spawn_count, 3);
        assert_eq!(archived.destroyed_at, Some(5_000));
        assert_eq!(archived.destroyed_by, None);
        assert_eq!(archived.first_spawn_at, Some(2_000));
        assert!(tracker.get_active("y").is_some());
    }

    #[test]
    fn spawn_tick_for_new_instance_retires_owner_active() {
        let mut tracker = DeployableTracker::new();
        tracker.on_spawn_tick("owner", "x", DeployableKind::Router, 1_000);
        tracker.on_spawn_tick("owner", "y", DeployableKind::Router, 2_000);

        assert_eq!(tracker.archive().len(), 1);
        assert_eq!(tracker.archive()[0].id, "x");
        assert_eq!(tracker.archive()[0].destroyed_at, Some(2_000));
        assert_eq!(tracker.get_active("y").unwrap().spawn_count, 1);
    }

    #[test]
    fn different_kinds_track_independently() {
        let mut tracker = DeployableTracker::new();
        tracker.on_spawn_tick("owner", "x", DeployableKind::Router, 1_000);
        tracker.on_spawn_tick("owner", "s", DeployableKind::GroundVehicleSpawn, 2_000);

        assert!(tracker.archive().is_empty());
        assert!(tracker.get_active("x").is_some());
        assert!(tracker.get_active("s").is_some());
    }

    #[test]
    fn destroy_moves_to_archive_with_destroyer() {
        let mut tracker = DeployableTracker::new();
        tracker.on_spawn_tick("owner", "x", DeployableKind::Router, 1_000);
        tracker.on_destroy("x", 9_000, "enemy");

        assert!(tracker.get_active("x").is_none());
        let archived = &tracker.archive()[0];
        assert_eq!(archived.destroyed_at, Some(9_000));
        assert_eq!(archived.destroyed_by.as_deref(), Some("enemy"));
    }

    #[test]
    fn destroy_without_active_instance_is_a_noop() {
        let mut tracker = DeployableTracker::new();
        tracker.on_destroy("ghost", 1_000, "enemy");
        assert!(tracker.archive().is_empty());
    }

    #[test]
    fn placement_without_id_is_adopted_by_first_tick() {
        let mut tracker = DeployableTracker::new();
        tracker.on_place("owner", "", DeployableKind::Router, 1_000);
        tracker.on_spawn_tick("owner", "x", DeployableKind::Router, 2_000);

        let active = tracker.get_active("x").unwrap();
        assert_eq!(active.pulled_at, 1_000);
        assert_eq!(active.spawn_count, 1);
        assert!(tracker.archive().is_empty());
    }
}
