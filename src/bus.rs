//! Publish/subscribe bus shared by the chat layer, the command modules and
//! the overlay.
//!
//! Chat commands arrive as `<command>:start` events; command modules answer
//! with `stream:<command>` events carrying the payload the overlay renders.
//! The bus is created once at startup and handed to every component that
//! needs it.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// A named event with a JSON payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusEvent {
    pub name: String,
    pub data: Value,
}

impl BusEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Cheaply cloneable handle to the broadcast channel
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<BusEvent>>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    ///
    /// Subscribers that fall further behind see
    /// [`broadcast::error::RecvError::Lagged`] and skip the missed events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event, returning how many subscribers will see it.
    ///
    /// Publishing with nobody listening is not an error; the event is dropped.
    pub fn publish(&self, name: impl Into<String>, data: Value) -> usize {
        let event = BusEvent::new(name, data);
        tracing::debug!("Publishing event {}", event.name);
        match self.sender.send(Arc::new(event)) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::debug!("No subscribers for event {}", event.name);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BusEvent>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
