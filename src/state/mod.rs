mod cache;
mod counter;
mod deployable;
mod player;

pub use cache::{BaseExchange, SessionCache, TimeTracking};
pub use counter::CounterMap;
pub use deployable::{Deployable, DeployableKind, DeployableTracker};
pub use player::TrackedPlayer;
