use serde::Serialize;
use serde_json::{json, Value};

use crate::constants::{
    COMMAND_EVENT_SUFFIX, HPCWINS_DELAY_MS, HPCWINS_VIDEO, STREAM_EVENT_PREFIX, TWORAX_DELAY_MS,
    TWORAX_VIDEO,
};

/// Static configuration for a chat command that plays a video overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayCommand {
    /// Chat command name, without the leading `!`
    pub command: &'static str,
    /// Video path relative to the overlay's asset directory
    pub video: &'static str,
    /// How long the overlay stays on screen
    pub delay_ms: u64,
}

/// Rendering metadata the overlay view layer reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlay {
    /// Internal name of the overlay
    pub name: String,
    /// Event that shows the overlay
    pub event: String,
    /// Template rendered for the overlay
    pub view: String,
    /// Selector the template is mounted under
    pub selector: String,
}

/// `!hpcwins` - played when we win or make a big play
pub const HPCWINS: OverlayCommand = OverlayCommand {
    command: "hpcwins",
    video: HPCWINS_VIDEO,
    delay_ms: HPCWINS_DELAY_MS,
};

/// `!tworax` - played when we destroy two barracks
pub const TWORAX: OverlayCommand = OverlayCommand {
    command: "tworax",
    video: TWORAX_VIDEO,
    delay_ms: TWORAX_DELAY_MS,
};

/// Every video overlay command the bot knows about
pub static OVERLAY_COMMANDS: [OverlayCommand; 2] = [HPCWINS, TWORAX];

/// Look up a video overlay command by name
pub fn find_overlay_command(command: &str) -> Option<&'static OverlayCommand> {
    OVERLAY_COMMANDS.iter().find(|c| c.command == command)
}

/// Event published by the chat layer when `command` is typed
pub fn start_event(command: &str) -> String {
    format!("{command}{COMMAND_EVENT_SUFFIX}")
}

/// Event the overlay listens on for `command`
pub fn stream_event(command: &str) -> String {
    format!("{STREAM_EVENT_PREFIX}{command}")
}

impl OverlayCommand {
    pub fn overlay(&self) -> Overlay {
        Overlay {
            name: self.command.to_string(),
            event: stream_event(self.command),
            view: format!("views/{}.pug", self.command),
            selector: format!(".{}", self.command),
        }
    }

    /// Payload in the shape the overlay template reads:
    /// `{ "<command>_video": "<command><video>", "delay": <ms> }`
    pub fn assemble_payload(&self) -> Value {
        let mut payload = serde_json::Map::new();
        payload.insert(
            format!("{}_video", self.command),
            Value::String(format!("{}{}", self.command, self.video)),
        );
        payload.insert("delay".to_string(), json!(self.delay_ms));
        Value::Object(payload)
    }
}
