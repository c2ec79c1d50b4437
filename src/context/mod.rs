mod background_tasks;
mod config;
mod error;

pub use background_tasks::{BackgroundTasks, epoch_ms, spawn_liveness_tick};
pub use config::TrackerConfig;
pub use error::{ConfigError, LookupError};
