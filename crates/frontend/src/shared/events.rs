//! Cross-store side effects.
//!
//! Stores never reach into each other. When something one store does matters
//! to another (a cart reminder, an order being placed), it emits a
//! [`StoreEvent`] and the app decides who reacts.

use contracts::shared::ids::EntityId;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    /// The cart crossed the reminder threshold and the cooldown has passed.
    CartReminder { user_id: EntityId, item_count: u32 },
    /// An order was created by checkout or a smart list reorder.
    OrderPlaced { order_id: EntityId },
}

#[derive(Clone)]
pub struct EventSink(Arc<dyn Fn(StoreEvent) + Send + Sync>);

impl EventSink {
    pub fn new(handler: impl Fn(StoreEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    /// Sink that drops everything.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn emit(&self, event: StoreEvent) {
        log::debug!("store event: {:?}", event);
        (self.0)(event);
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventSink")
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records every event.
    pub fn recording_sink() -> (EventSink, Arc<Mutex<Vec<StoreEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink = EventSink::new(move |event| {
            if let Ok(mut events) = sink_seen.lock() {
                events.push(event);
            }
        });
        (sink, seen)
    }
}
