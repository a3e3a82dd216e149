use crate::constants::{USERS_INDEX_KEY, USER_KEY_PREFIX};

/// Users index: set of every created username
pub const USERS: &str = USERS_INDEX_KEY;

/// User record: `user:<username>` -> hash of attribute fields
pub fn user(username: &str) -> String {
    format!("{USER_KEY_PREFIX}{username}")
}
