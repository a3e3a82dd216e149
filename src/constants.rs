/// Prefix for per-user hash records (`user:<username>`)
pub const USER_KEY_PREFIX: &str = "user:";

/// Set holding every username created through `UserStore::create`
pub const USERS_INDEX_KEY: &str = "users";

// =============================================================================
// User Record Fields
// =============================================================================

/// Existence marker; its presence means the user record exists
pub const FIELD_UID: &str = "uid";

/// Value written to `uid` on creation
pub const INITIAL_UID: &str = "0";

pub const FIELD_HOUSE: &str = "house";

pub const FIELD_COMMENDS: &str = "commends";

pub const FIELD_USERNAME: &str = "username";

/// Bookkeeping fields left out of `UserStore::get_all`
pub const BOOKKEEPING_FIELDS: [&str; 2] = [FIELD_UID, FIELD_USERNAME];

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_NO_USER_PROVIDED: &str = "no user provided";

pub const ERR_USER_NOT_FOUND: &str = "User Not Found";

pub const ERR_USER_HAS_NO_COMMENDS: &str = "User Has No Commends";

pub const ERR_USER_ALREADY_EXISTS: &str = "User already exists";

// =============================================================================
// Event Bus
// =============================================================================

/// Suffix of events published by the chat layer (`<command>:start`)
pub const COMMAND_EVENT_SUFFIX: &str = ":start";

/// Prefix of events consumed by the overlay (`stream:<command>`)
pub const STREAM_EVENT_PREFIX: &str = "stream:";

/// Default number of buffered events per subscriber
pub const DEFAULT_BUS_CAPACITY: usize = 256;

// =============================================================================
// Overlay Commands
// =============================================================================

/// Shown when the team wins or makes a big play
pub const HPCWINS_VIDEO: &str = "/video/hpcwins.mp4";
pub const HPCWINS_DELAY_MS: u64 = 10_000;

/// Shown when two barracks go down
pub const TWORAX_VIDEO: &str = "/video/tworax.mp4";
pub const TWORAX_DELAY_MS: u64 = 14_000;

/// How long the sorting overlay stays on screen
pub const SORTINGHAT_DELAY_MS: u64 = 8_000;
