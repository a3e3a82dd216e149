pub mod overlay;
pub mod user;

pub use overlay::{Overlay, OverlayCommand};
pub use user::{generate_house, House, UserRecord};
