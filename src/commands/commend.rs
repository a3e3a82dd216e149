//! `!commend <user>` - give another chatter a commend.

use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::bus::EventBus;
use crate::error::{AppError, Result};
use crate::models::overlay::{start_event, stream_event};
use crate::user_store::UserStore;

pub const COMMAND: &str = "commend";

/// Listen for `commend:start` with `{ "username": .., "target": .. }`
pub fn start(bus: &EventBus, users: &UserStore) -> JoinHandle<()> {
    let publisher = bus.clone();
    let users = users.clone();

    super::on(bus, start_event(COMMAND), move |event| {
        let publisher = publisher.clone();
        let users = users.clone();
        async move {
            let from = super::string_arg(&event, "username");
            let target = super::string_arg(&event, "target");
            match commend(&users, from, target).await {
                Ok(payload) => {
                    publisher.publish(stream_event(COMMAND), payload);
                }
                Err(err) if err.is_internal() => {
                    tracing::error!("Commend from {:?} to {:?} failed: {}", from, target, err);
                }
                Err(err) => {
                    tracing::warn!("Commend from {:?} to {:?} rejected: {}", from, target, err);
                }
            }
        }
    })
}

/// Add a commend to `target` on behalf of `from`.
///
/// Usernames compare exactly, matching how their records are keyed.
pub async fn commend(users: &UserStore, from: &str, target: &str) -> Result<Value> {
    if !from.trim().is_empty() && from.trim() == target.trim() {
        return Err(AppError::InvalidInput(
            "Users cannot commend themselves".to_string(),
        ));
    }

    let commends = users.commend(target).await?;

    Ok(json!({
        "from": from.trim(),
        "username": target.trim(),
        "commends": commends,
    }))
}
