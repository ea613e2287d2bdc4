pub mod gate;
pub mod presenter;

pub use gate::NotificationGate;
pub use presenter::{NotificationPresenter, ToastPresenter, present_best_effort};

use serde::{Deserialize, Serialize};

use crate::common::Message;

/// Payload attached to a notification so a tap can route back to the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub chat_room_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub data: NotificationData,
}

impl LocalNotification {
    pub fn for_message(message: &Message) -> Self {
        Self {
            title: format!("New message from {}", message.sender_name),
            body: message.content.clone(),
            data: NotificationData {
                chat_room_id: message.chat_room_id.clone(),
            },
        }
    }
}
