//! Chat command modules.
//!
//! Each module listens for `<command>:start` on the [`EventBus`] and answers
//! with a `stream:<command>` event the overlay renders. Failures are logged
//! and produce no overlay event; they never stop the listener.

pub mod commend;
pub mod overlay;
pub mod sortinghat;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::bus::{BusEvent, EventBus};
use crate::models::overlay::OVERLAY_COMMANDS;
use crate::user_store::UserStore;

/// Run `handler` for every `event` published on the bus.
///
/// The subscription is taken before this returns, so events published right
/// after the call are not missed. The task ends when the bus closes.
pub fn on<F, Fut>(bus: &EventBus, event: String, handler: F) -> JoinHandle<()>
where
    F: Fn(Arc<BusEvent>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut receiver = bus.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(received) if received.name == event => handler(received).await,
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Listener for {} skipped {} events", event, missed);
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("Event bus closed, stopping listener for {}", event);
                    break;
                }
            }
        }
    })
}

/// Start every command module
pub fn start(bus: &EventBus, users: &UserStore) -> Vec<JoinHandle<()>> {
    let mut handles: Vec<JoinHandle<()>> = OVERLAY_COMMANDS
        .iter()
        .map(|command| overlay::start(bus, command))
        .collect();

    handles.push(sortinghat::start(bus, users));
    handles.push(commend::start(bus, users));

    tracing::info!("Started {} chat command listeners", handles.len());
    handles
}

/// Names of every chat command a listener is started for
pub fn known_commands() -> Vec<&'static str> {
    OVERLAY_COMMANDS
        .iter()
        .map(|command| command.command)
        .chain([sortinghat::COMMAND, commend::COMMAND])
        .collect()
}

/// Read a string argument from a chat command payload
fn string_arg<'a>(event: &'a BusEvent, name: &str) -> &'a str {
    event
        .data
        .get(name)
        .and_then(|value| value.as_str())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::broadcast::Receiver;

    use crate::bus::BusEvent;

    /// Wait for the next event called `name`, skipping others
    pub async fn next_named(receiver: &mut Receiver<Arc<BusEvent>>, name: &str) -> Arc<BusEvent> {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let event = receiver.recv().await.unwrap();
                if event.name == name {
                    return event;
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
    }

    /// Assert that no event called `name` arrives within a short window
    pub async fn assert_silent(receiver: &mut Receiver<Arc<BusEvent>>, name: &str) {
        let waited = tokio::time::timeout(Duration::from_millis(200), async {
            loop {
                let event = receiver.recv().await.unwrap();
                if event.name == name {
                    return event;
                }
            }
        })
        .await;
        assert!(waited.is_err(), "unexpected {name} event");
    }
}
