use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::keys;
use crate::models::user::validate_username;
use crate::{error::Result, AppError, AppState};

/// Query parameters for admin endpoints
#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    /// Admin secret key for authentication
    pub key: String,
}

/// Store statistics response
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub user_count: usize,
    pub store_backend: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub deleted: bool,
}

/// Reject the request unless admin endpoints are enabled and the key matches
fn authorize(state: &AppState, params: &AdminQuery) -> Result<()> {
    let admin_key = state
        .config
        .admin_secret_key
        .as_ref()
        .ok_or(AppError::Unauthorized)?;

    if params.key != *admin_key {
        tracing::warn!("Invalid admin key attempt");
        return Err(AppError::Unauthorized);
    }

    Ok(())
}

/// Admin stats endpoint
///
/// Returns user statistics for monitoring.
/// Requires admin secret key passed as query parameter.
///
/// GET /admin/stats?key=<admin_secret_key>
pub async fn admin_stats(
    State(state): State<AppState>,
    Query(params): Query<AdminQuery>,
) -> Result<Json<AdminStatsResponse>> {
    authorize(&state, &params)?;

    let user_count = state.users.list_usernames().await?.len();

    tracing::info!("Admin stats requested: {} users", user_count);

    Ok(Json(AdminStatsResponse {
        user_count,
        store_backend: state.config.store_backend.to_string(),
        environment: state.config.environment.clone(),
    }))
}

/// Remove a user record together with its index entry
///
/// DELETE /admin/users/:username?key=<admin_secret_key>
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<AdminQuery>,
) -> Result<Json<DeleteUserResponse>> {
    authorize(&state, &params)?;
    let username = validate_username(&username)?;

    let removed = state
        .users
        .store()
        .delete_hash_and_member(&keys::user(username), keys::USERS, username)
        .await?;

    if !removed {
        return Err(AppError::UserNotFound);
    }

    tracing::info!("Admin deleted user {}", username);

    Ok(Json(DeleteUserResponse { deleted: true }))
}
