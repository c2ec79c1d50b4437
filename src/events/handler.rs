//! Listener registration for dispatched events.

use super::event::{Event, EventKind};

/// Downstream consumer of the event stream. Called synchronously, once per
/// constructed event, in processing order. Handlers must not assume any
/// metadata lookup has resolved by the time they run.
pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &Event);
}

impl<F: FnMut(&Event) + Send> EventHandler for F {
    fn handle_event(&mut self, event: &Event) {
        self(event)
    }
}

/// Kind-keyed handler registry. Kept separate from the processor so the
/// dispatch hot path borrows only the cache.
pub struct HandlerRegistry {
    handlers: Vec<(EventKind, Box<dyn EventHandler>)>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn on(&mut self, kind: EventKind, handler: Box<dyn EventHandler>) {
        self.handlers.push((kind, handler));
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn emit(&mut self, event: &Event) {
        for (kind, handler) in &mut self.handlers {
            if *kind == event.kind() {
                handler.handle_event(event);
            }
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
