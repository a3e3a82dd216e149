use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{
    ERR_NO_USER_PROVIDED, ERR_USER_ALREADY_EXISTS, ERR_USER_HAS_NO_COMMENDS, ERR_USER_NOT_FOUND,
};
use crate::db::StoreError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", ERR_NO_USER_PROVIDED)]
    NoUserProvided,

    #[error("{}", ERR_USER_NOT_FOUND)]
    UserNotFound,

    #[error("{}", ERR_USER_HAS_NO_COMMENDS)]
    UserHasNoCommends,

    #[error("{}", ERR_USER_ALREADY_EXISTS)]
    UserAlreadyExists,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Corrupt user record: field {field} holds {value:?}")]
    CorruptRecord { field: String, value: String },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Event bus error: {0}")]
    Bus(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl AppError {
    /// Whether the error comes from the store rather than from the caller
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Store(_) | AppError::CorruptRecord { .. } | AppError::Bus(_)
        )
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Store(ref e) => {
                tracing::error!("Store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::CorruptRecord { ref field, ref value } => {
                tracing::error!("Corrupt user record: {} = {:?}", field, value);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Bus(ref e) => {
                tracing::error!("Event bus error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::NoUserProvided => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidInput(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::UserHasNoCommends => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::UnknownCommand(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::UserAlreadyExists => (StatusCode::CONFLICT, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
