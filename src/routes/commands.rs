use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::commands::known_commands;
use crate::error::{AppError, Result};
use crate::models::overlay::{start_event, Overlay, OVERLAY_COMMANDS};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct OverlaysResponse {
    pub overlays: Vec<Overlay>,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub event: String,
    pub listeners: usize,
}

/// Publish a chat command on the event bus, as if it was typed in chat
///
/// POST /api/commands/:command
///
/// The body is passed through as the event data (`{}` when empty).
pub async fn trigger_command(
    State(state): State<AppState>,
    Path(command): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<TriggerResponse>> {
    let command = command.trim_start_matches('!').to_ascii_lowercase();
    if !known_commands().iter().any(|known| *known == command) {
        tracing::warn!("Unknown command triggered: {}", command);
        return Err(AppError::UnknownCommand(command));
    }

    let data = body
        .map(|Json(value)| value)
        .unwrap_or_else(|| Value::Object(Default::default()));

    let event = start_event(&command);
    let listeners = state.bus.publish(event.clone(), data);
    if listeners == 0 {
        return Err(AppError::Bus(format!("no listeners for {event}")));
    }

    Ok(Json(TriggerResponse { event, listeners }))
}

/// Rendering metadata for every video overlay, read by the view layer
///
/// GET /api/overlays
pub async fn list_overlays() -> Json<OverlaysResponse> {
    let overlays = OVERLAY_COMMANDS.iter().map(|command| command.overlay()).collect();
    Json(OverlaysResponse { overlays })
}
