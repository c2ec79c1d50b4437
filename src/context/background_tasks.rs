//! Handles for long-running tokio tasks owned by the tracker.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::tracker::Tracker;

/// Liveness/cooldown tick rate. 1 Hz matches the resolution of the
/// dead-timer display and keeps the lock traffic negligible.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Default)]
pub struct BackgroundTasks {
    pub liveness: Option<JoinHandle<()>>,
    pub precache: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub async fn abort_all(&mut self) {
        if let Some(handle) = self.liveness.take() {
            handle.abort();
        }
        if let Some(handle) = self.precache.take() {
            handle.abort();
        }
    }
}

/// Advance death timers and beacon cooldowns once a second. Shares the
/// tracker mutex with message processing, so ticks and dispatch never
/// mutate member state concurrently. Live mode only; replay drives
/// `Tracker::tick` explicitly with feed time.
pub fn spawn_liveness_tick(tracker: Arc<Mutex<Tracker>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            tracker.lock().await.tick(epoch_ms());
        }
    })
}

/// Wall-clock epoch milliseconds; the live feed stamps events on the same
/// epoch, so the two clocks are directly comparable.
pub fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
