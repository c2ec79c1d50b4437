mod member;
mod squad;
mod tracker;


pub use member::{MemberState, SquadMember};
pub use squad::Squad;
pub use tracker::SquadTracker;
