pub mod context;
pub mod events;
pub mod feed;
pub mod game_data;
pub mod lookup;
pub mod squad;
pub mod state;
pub mod tracker;

// Re-exports for convenience
pub use context::{BackgroundTasks, TrackerConfig, epoch_ms, spawn_liveness_tick};
pub use events::{Event, EventHandler, EventKind, EventProcessor, HandlerRegistry};
pub use feed::{DecodeError, FeedMessage, classify};
pub use lookup::{
    CharacterInfo, MetadataCache, MetadataResolver, PrecacheHandle, spawn_precache_worker,
};
pub use squad::{MemberState, Squad, SquadMember, SquadTracker};
pub use state::{BaseExchange, CounterMap, SessionCache, TrackedPlayer};
pub use tracker::Tracker;
