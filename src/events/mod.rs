mod event;
mod handler;
mod processor;

#[cfg(test)]
mod processor_tests;

pub use event::{Event, EventKind};
pub use handler::{EventHandler, HandlerRegistry};
pub use processor::EventProcessor;
