//! `!sortinghat` - sorts the chatter into a house and shows it on stream.

use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::bus::EventBus;
use crate::constants::SORTINGHAT_DELAY_MS;
use crate::error::{AppError, Result};
use crate::models::overlay::{start_event, stream_event};
use crate::user_store::UserStore;

pub const COMMAND: &str = "sortinghat";

/// Listen for `sortinghat:start` with `{ "username": .. }`
pub fn start(bus: &EventBus, users: &UserStore) -> JoinHandle<()> {
    let publisher = bus.clone();
    let users = users.clone();

    super::on(bus, start_event(COMMAND), move |event| {
        let publisher = publisher.clone();
        let users = users.clone();
        async move {
            let username = super::string_arg(&event, "username");
            match sort(&users, username).await {
                Ok(payload) => {
                    publisher.publish(stream_event(COMMAND), payload);
                }
                Err(err) if err.is_internal() => {
                    tracing::error!("Sorting hat failed for {:?}: {}", username, err);
                }
                Err(err) => {
                    tracing::warn!("Sorting hat rejected {:?}: {}", username, err);
                }
            }
        }
    })
}

/// Make sure the user exists, draw a house and build the overlay payload
pub async fn sort(users: &UserStore, username: &str) -> Result<Value> {
    match users.create(username).await {
        Ok(_) | Err(AppError::UserAlreadyExists) => {}
        Err(err) => return Err(err),
    }

    let house = users.set_house(username).await?;

    Ok(json!({
        "username": username.trim(),
        "house": house,
        "delay": SORTINGHAT_DELAY_MS,
    }))
}
