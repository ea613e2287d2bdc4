use serde::{Deserialize, Serialize};

/// A named chat room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub created_by: String,
    pub is_active: bool,
}

/// A single chat message. `timestamp` is Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_room_id: String,
    pub content: String,
    pub sender_id: String,
    pub sender_name: String,
    pub timestamp: i64,
}

/// Local identity of whoever runs this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
}

/// Current snapshot of a room's messages, oldest first.
pub type MessageFeed = Vec<Message>;
