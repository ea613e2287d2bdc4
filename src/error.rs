use thiserror::Error;

pub type Result<T> = core::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat room not found: {0}")]
    ChatRoomNotFound(String),

    #[error("QR encoding failed: {0}")]
    QrEncoding(#[from] qrcode::types::QrError),

    #[error("Invalid share code: {0:?}")]
    InvalidShareCode(String),

    #[error("Push service rejected the request ({status}): {body}")]
    PushRejected { status: u16, body: String },

    #[error("Notification presentation failed: {0}")]
    Presentation(String),
}
