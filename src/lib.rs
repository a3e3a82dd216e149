//! Stream Overlay Bot Library
//!
//! Chat commands trigger overlay payloads on a shared event bus, and a
//! per-user attribute store tracks house affiliation and commends.
//! This module exports the core types and functions for testing and reuse.

pub mod bus;
pub mod commands;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod user_store;

pub use bus::{BusEvent, EventBus};
pub use config::{Config, StoreBackend};
pub use db::{open_store, HashStore, MemoryStore, Store};
pub use error::{AppError, Result};
pub use user_store::UserStore;

use axum::{
    routing::{delete, get, post},
    Router,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub bus: EventBus,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState around an opened store and the shared bus
    pub fn new(store: Store, bus: EventBus, config: Config) -> Self {
        Self {
            users: UserStore::new(store),
            bus,
            config,
        }
    }
}

/// Build the HTTP router (without CORS or tracing layers)
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/users", get(routes::list_users).post(routes::create_user))
        .route("/api/users/:username", get(routes::get_user))
        .route(
            "/api/users/:username/house",
            get(routes::get_house).post(routes::sort_house),
        )
        .route(
            "/api/users/:username/commends",
            get(routes::get_commends)
                .put(routes::set_commends)
                .post(routes::add_commend),
        )
        .route("/api/commands/:command", post(routes::trigger_command))
        .route("/api/overlays", get(routes::list_overlays))
        .route("/admin/stats", get(routes::admin_stats))
        .route("/admin/users/:username", delete(routes::delete_user))
        .with_state(state)
}
