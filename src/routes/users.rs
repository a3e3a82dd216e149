use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::House;
use crate::user_store::UserFields;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HouseResponse {
    pub house: Option<House>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommendsBody {
    pub commends: u64,
}

/// List every known username
///
/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>> {
    let users = state.users.list_usernames().await?;
    Ok(Json(UsersResponse { users }))
}

/// Create a user with the placeholder house
///
/// POST /api/users
///
/// Returns 409 Conflict if the user already exists.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>)> {
    let username = state.users.create(&payload.username).await?;
    Ok((StatusCode::CREATED, Json(CreateUserResponse { username })))
}

/// Every stored attribute of a user, as strings
///
/// GET /api/users/:username
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserFields>> {
    let fields = state.users.get_all(&username).await?;
    Ok(Json(fields))
}

/// GET /api/users/:username/house
pub async fn get_house(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<HouseResponse>> {
    let house = state.users.get_house(&username).await?;
    Ok(Json(HouseResponse { house }))
}

/// Sort the user into a random house
///
/// POST /api/users/:username/house
pub async fn sort_house(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<HouseResponse>> {
    let house = state.users.set_house(&username).await?;
    Ok(Json(HouseResponse { house: Some(house) }))
}

/// GET /api/users/:username/commends
pub async fn get_commends(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<CommendsBody>> {
    let commends = state.users.get_commends(&username).await?;
    Ok(Json(CommendsBody { commends }))
}

/// PUT /api/users/:username/commends
pub async fn set_commends(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<CommendsBody>,
) -> Result<Json<CommendsBody>> {
    let commends = state
        .users
        .set_commends(&username, payload.commends)
        .await?;
    Ok(Json(CommendsBody { commends }))
}

/// Add one commend
///
/// POST /api/users/:username/commends
pub async fn add_commend(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<CommendsBody>> {
    let commends = state.users.commend(&username).await?;
    Ok(Json(CommendsBody { commends }))
}
