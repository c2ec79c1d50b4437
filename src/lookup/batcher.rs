//! Fire-and-forget metadata precaching.
//!
//! The dispatcher pushes IDs through an unbounded channel and never waits.
//! The worker coalesces them: collect until the channel goes quiet for the
//! debounce window or the batch-size threshold is hit, then resolve the
//! whole batch at once. Failed batches are logged and dropped; the IDs
//! will usually be requested again by later events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::context::TrackerConfig;

use super::resolver::{MetadataCache, MetadataResolver};

#[derive(Debug)]
pub enum PrecacheRequest {
    Character(String),
    Weapon(String),
}

/// Cheap cloneable sender half handed to the dispatcher.
#[derive(Clone)]
pub struct PrecacheHandle {
    tx: mpsc::UnboundedSender<PrecacheRequest>,
}

impl PrecacheHandle {
    pub fn character(&self, id: &str) {
        // "0" is the feed's null character (environment kills etc.)
        if id.is_empty() || id == "0" {
            return;
        }
        self.send(PrecacheRequest::Character(id.to_string()));
    }

    pub fn weapon(&self, id: &str) {
        if id.is_empty() || id == "0" {
            return;
        }
        self.send(PrecacheRequest::Weapon(id.to_string()));
    }

    fn send(&self, request: PrecacheRequest) {
        if self.tx.send(request).is_err() {
            debug!("precache worker gone, dropping lookup request");
        }
    }
}

pub fn spawn_precache_worker<R: MetadataResolver>(
    resolver: R,
    cache: Arc<Mutex<MetadataCache>>,
    config: &TrackerConfig,
) -> (PrecacheHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let debounce = Duration::from_millis(config.precache_debounce_ms);
    let batch_size = config.precache_batch_size;

    let handle = tokio::spawn(run_worker(resolver, cache, rx, debounce, batch_size));
    (PrecacheHandle { tx }, handle)
}

async fn run_worker<R: MetadataResolver>(
    resolver: R,
    cache: Arc<Mutex<MetadataCache>>,
    mut rx: mpsc::UnboundedReceiver<PrecacheRequest>,
    debounce: Duration,
    batch_size: usize,
) {
    let mut characters: Vec<String> = Vec::new();
    let mut weapons: Vec<String> = Vec::new();

    loop {
        let request = if characters.is_empty() && weapons.is_empty() {
            rx.recv().await
        } else {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(request) => request,
                Err(_) => {
                    // Channel went quiet; flush what we have.
                    flush(&resolver, &cache, &mut characters, &mut weapons).await;
                    continue;
                }
            }
        };

        match request {
            Some(PrecacheRequest::Character(id)) => {
                if !characters.contains(&id) && !cache.lock().await.has_character(&id) {
                    characters.push(id);
                }
            }
            Some(PrecacheRequest::Weapon(id)) => {
                if !weapons.contains(&id) && !cache.lock().await.has_weapon(&id) {
                    weapons.push(id);
                }
            }
            None => {
                flush(&resolver, &cache, &mut characters, &mut weapons).await;
                return;
            }
        }

        if characters.len() + weapons.len() >= batch_size {
            flush(&resolver, &cache, &mut characters, &mut weapons).await;
        }
    }
}

async fn flush<R: MetadataResolver>(
    resolver: &R,
    cache: &Arc<Mutex<MetadataCache>>,
    characters: &mut Vec<String>,
    weapons: &mut Vec<String>,
) {
    if !characters.is_empty() {
        let batch = std::mem::take(characters);
        debug!(count = batch.len(), "resolving character batch");
        match resolver.characters_by_id(&batch).await {
            Ok(records) => cache.lock().await.insert_characters(records),
            Err(err) => warn!(%err, "character batch lookup failed"),
        }
    }

    if !weapons.is_empty() {
        let batch = std::mem::take(weapons);
        debug!(count = batch.len(), "resolving weapon batch");
        match resolver.weapons_by_id(&batch).await {
            Ok(records) => cache.lock().await.insert_weapons(records),
            Err(err) => warn!(%err, "weapon batch lookup failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LookupError;
    use crate::lookup::resolver::{CharacterInfo, FacilityInfo, OutfitInfo, WeaponInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeResolver {
        batches: Arc<AtomicUsize>,
    }

    impl MetadataResolver for FakeResolver {
        async fn characters_by_id(
            &self,
            ids: &[String],
        ) -> Result<Vec<CharacterInfo>, LookupError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(ids
                .iter()
                .map(|id| CharacterInfo {
                    character_id: id.clone(),
                    name: format!("char-{id}"),
                    outfit_tag: String::new(),
                    faction_id: "2".to_string(),
                    online: true,
                })
                .collect())
        }

        async fn weapons_by_id(&self, ids: &[String]) -> Result<Vec<WeaponInfo>, LookupError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(ids
                .iter()
                .map(|id| WeaponInfo {
                    weapon_id: id.clone(),
                    name: format!("weapon-{id}"),
                    category: String::new(),
                })
                .collect())
        }

        async fn outfits_by_id(&self, _ids: &[String]) -> Result<Vec<OutfitInfo>, LookupError> {
            Ok(Vec::new())
        }

        async fn facilities_by_id(
            &self,
            _ids: &[String],
        ) -> Result<Vec<FacilityInfo>, LookupError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn requests_coalesce_into_one_batch() {
        let batches = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(Mutex::new(MetadataCache::new()));
        let config = TrackerConfig {
            precache_debounce_ms: 20,
            ..TrackerConfig::default()
        };
        let (handle, worker) = spawn_precache_worker(
            FakeResolver {
                batches: batches.clone(),
            },
            cache.clone(),
            &config,
        );

        handle.character("100");
        handle.character("200");
        handle.character("100"); // duplicate, coalesced
        handle.character("0"); // feed null, ignored
        drop(handle);
        worker.await.unwrap();

        assert_eq!(batches.load(Ordering::SeqCst), 1);
        let cache = cache.lock().await;
        assert_eq!(cache.character("100").unwrap().name, "char-100");
        assert!(cache.character("200").is_some());
        assert!(cache.character("0").is_none());
    }

    #[tokio::test]
    async fn batch_size_forces_early_flush() {
        let batches = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(Mutex::new(MetadataCache::new()));
        let config = TrackerConfig {
            precache_debounce_ms: 10_000,
            precache_batch_size: 3,
            ..TrackerConfig::default()
        };
        let (handle, worker) = spawn_precache_worker(
            FakeResolver {
                batches: batches.clone(),
            },
            cache.clone(),
            &config,
        );

        for id in ["1", "2", "3"] {
            handle.weapon(id);
        }

        // The threshold flush should land without waiting out the debounce.
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if cache.lock().await.weapon("3").is_some() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(batches.load(Ordering::SeqCst), 1);
        drop(handle);
        worker.await.unwrap();
    }
}
