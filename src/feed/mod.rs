pub mod decoder;
mod error;
mod message;

pub use error::DecodeError;
pub use message::{FeedMessage, StateChange, classify};
