pub mod admin;
pub mod commands;
pub mod health;
pub mod users;

pub use admin::{admin_stats, delete_user};
pub use commands::{list_overlays, trigger_command};
pub use health::health_check;
pub use users::{
    add_commend, create_user, get_commends, get_house, get_user, list_users, set_commends,
    sort_house,
};
