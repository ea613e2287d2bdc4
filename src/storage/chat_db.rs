use rusqlite::{OptionalExtension, Result as SqlResult, Row, params};
use std::path::Path;
use uuid::Uuid;

use super::database::Database;
use crate::common::{ChatRoom, Message, now_ms};
use crate::error::{ChatError, Result};

/// Messages returned when a caller does not ask for a specific amount.
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;

/// Backend store: rooms, memberships, messages and push tokens.
pub struct ChatDatabase {
    db: Database,
}

impl ChatDatabase {
    /// Open (or create) the database at `path`
    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Database::new(path)?;
        Self::from_database(db)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_database(Database::in_memory()?)
    }

    fn from_database(db: Database) -> Result<Self> {
        let chat_db = Self { db };
        chat_db.init_schema()?;
        Ok(chat_db)
    }

    fn init_schema(&self) -> SqlResult<()> {
        let conn = self.db.connection();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_rooms (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                created_by TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_room_members (
                chat_room_id TEXT NOT NULL REFERENCES chat_rooms(id),
                user_id TEXT NOT NULL,
                joined_at INTEGER NOT NULL,
                PRIMARY KEY (chat_room_id, user_id)
            )",
            [],
        )?;

        // `seq` keeps insertion order for messages sharing a timestamp
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                chat_room_id TEXT NOT NULL REFERENCES chat_rooms(id),
                content TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                sender_name TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS push_tokens (
                user_id TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chat_rooms_created_at ON chat_rooms(created_at)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_room_timestamp ON messages(chat_room_id, timestamp)",
            [],
        )?;

        Ok(())
    }

    // ========== Chat rooms ==========

    pub fn create_chat_room(&self, name: &str, user_id: &str) -> Result<ChatRoom> {
        let room = ChatRoom {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now_ms(),
            created_by: user_id.to_string(),
            is_active: true,
        };

        self.db.connection().execute(
            "INSERT INTO chat_rooms (id, name, created_at, created_by, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                room.id,
                room.name,
                room.created_at,
                room.created_by,
                room.is_active
            ],
        )?;

        log::info!("Created chat room {} ({})", room.name, room.id);
        Ok(room)
    }

    pub fn get_chat_room(&self, chat_room_id: &str) -> Result<Option<ChatRoom>> {
        let room = self
            .db
            .connection()
            .query_row(
                "SELECT id, name, created_at, created_by, is_active
                 FROM chat_rooms WHERE id = ?1",
                params![chat_room_id],
                room_from_row,
            )
            .optional()?;
        Ok(room)
    }

    /// Unknown or malformed ids simply don't exist.
    pub fn chat_room_exists(&self, chat_room_id: &str) -> Result<bool> {
        Ok(self.get_chat_room(chat_room_id)?.is_some())
    }

    /// All rooms, oldest first
    pub fn get_all_chat_rooms(&self) -> Result<Vec<ChatRoom>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT id, name, created_at, created_by, is_active
             FROM chat_rooms
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rooms = stmt
            .query_map([], room_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(rooms)
    }

    /// Rooms the user is a member of, newest first
    pub fn get_chat_rooms_for_user(&self, user_id: &str) -> Result<Vec<ChatRoom>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.name, r.created_at, r.created_by, r.is_active
             FROM chat_rooms r
             JOIN chat_room_members m ON m.chat_room_id = r.id
             WHERE m.user_id = ?1
             ORDER BY r.created_at DESC, r.rowid DESC",
        )?;

        let rooms = stmt
            .query_map(params![user_id], room_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(rooms)
    }

    // ========== Memberships ==========

    /// Returns `true` when the user was already a member.
    pub fn join_chat_room(&self, chat_room_id: &str, user_id: &str) -> Result<bool> {
        self.ensure_room(chat_room_id)?;

        let inserted = self.db.connection().execute(
            "INSERT OR IGNORE INTO chat_room_members (chat_room_id, user_id, joined_at)
             VALUES (?1, ?2, ?3)",
            params![chat_room_id, user_id, now_ms()],
        )?;

        Ok(inserted == 0)
    }

    // ========== Messages ==========

    pub fn send_message(
        &self,
        chat_room_id: &str,
        content: &str,
        sender_id: &str,
        sender_name: &str,
    ) -> Result<Message> {
        self.ensure_room(chat_room_id)?;

        let message = Message {
            id: Uuid::new_v4().to_string(),
            chat_room_id: chat_room_id.to_string(),
            content: content.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            timestamp: now_ms(),
        };
        self.insert_message(&message)?;
        Ok(message)
    }

    /// Insert a message as-is; a duplicate id is ignored.
    fn insert_message(&self, message: &Message) -> Result<()> {
        self.db.connection().execute(
            "INSERT OR IGNORE INTO messages (id, chat_room_id, content, sender_id, sender_name, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                message.chat_room_id,
                message.content,
                message.sender_id,
                message.sender_name,
                message.timestamp
            ],
        )?;
        Ok(())
    }

    /// The most recent `limit` messages of a room, oldest first.
    pub fn get_messages(&self, chat_room_id: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        let conn = self.db.connection();
        let limit = limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);

        let mut stmt = conn.prepare(
            "SELECT id, chat_room_id, content, sender_id, sender_name, timestamp
             FROM messages
             WHERE chat_room_id = ?1
             ORDER BY timestamp DESC, seq DESC
             LIMIT ?2",
        )?;

        let mut messages = stmt
            .query_map(params![chat_room_id, limit], |row| {
                Ok(Message {
                    id: row.get(0)?,
                    chat_room_id: row.get(1)?,
                    content: row.get(2)?,
                    sender_id: row.get(3)?,
                    sender_name: row.get(4)?,
                    timestamp: row.get(5)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        messages.reverse();
        Ok(messages)
    }

    // ========== Push tokens ==========

    pub fn register_push_token(&self, user_id: &str, token: &str) -> Result<()> {
        self.db.connection().execute(
            "INSERT OR REPLACE INTO push_tokens (user_id, token, updated_at)
             VALUES (?1, ?2, ?3)",
            params![user_id, token, now_ms()],
        )?;
        Ok(())
    }

    /// Tokens of every member of the room except `exclude_user_id`.
    pub fn push_tokens_for_room(
        &self,
        chat_room_id: &str,
        exclude_user_id: &str,
    ) -> Result<Vec<String>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT t.token
             FROM push_tokens t
             JOIN chat_room_members m ON m.user_id = t.user_id
             WHERE m.chat_room_id = ?1 AND t.user_id != ?2
             ORDER BY t.user_id",
        )?;

        let tokens = stmt
            .query_map(params![chat_room_id, exclude_user_id], |row| row.get(0))?
            .collect::<SqlResult<Vec<String>>>()?;
        Ok(tokens)
    }

    /// Changes whenever another client commits to the same database file.
    pub fn data_version(&self) -> Result<i64> {
        Ok(self.db.data_version()?)
    }

    fn ensure_room(&self, chat_room_id: &str) -> Result<()> {
        if self.chat_room_exists(chat_room_id)? {
            Ok(())
        } else {
            Err(ChatError::ChatRoomNotFound(chat_room_id.to_string()))
        }
    }
}

fn room_from_row(row: &Row<'_>) -> SqlResult<ChatRoom> {
    Ok(ChatRoom {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        created_by: row.get(3)?,
        is_active: row.get(4)?,
    })
}
