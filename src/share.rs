//! Room links that can be handed to someone else to join a room.

use qrcode::{Color, QrCode};

use crate::error::{ChatError, Result};

/// Modules of a QR code, row-major, without the quiet zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    pub width: usize,
    pub dark: Vec<bool>,
}

impl QrMatrix {
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.width + x]
    }
}

/// Link encoding a room id, e.g. `https://chat.example.app/chat/<id>`.
pub fn share_link(app_domain: &str, chat_room_id: &str) -> String {
    format!(
        "https://{}/chat/{chat_room_id}",
        app_domain.trim_end_matches('/')
    )
}

/// Scannable form of a share link.
pub fn share_qr(link: &str) -> Result<QrMatrix> {
    let code = QrCode::new(link.as_bytes())?;
    let dark = code
        .to_colors()
        .into_iter()
        .map(|color| color == Color::Dark)
        .collect();
    Ok(QrMatrix {
        width: code.width(),
        dark,
    })
}

/// Extract the room id from a pasted or scanned code: either a full link
/// (the last path segment wins) or a bare id.
pub fn parse_share_code(data: &str) -> Result<String> {
    let trimmed = data.trim().trim_end_matches('/');
    let candidate = trimmed.rsplit('/').next().unwrap_or_default().trim();

    if candidate.is_empty() {
        return Err(ChatError::InvalidShareCode(data.to_string()));
    }
    Ok(candidate.to_string())
}
