pub mod commands;
pub mod events;
pub mod types;

pub use commands::BackendCommand;
pub use events::BackendEvent;
pub use types::{ChatRoom, Message, MessageFeed, User};

/// Current wall-clock time in Unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
