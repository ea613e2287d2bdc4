use crate::common::{ChatRoom, Message};
use crate::error::Result;
use crate::storage::ChatDatabase;

/// Read-only queries that can be subscribed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    AllChatRooms,
    ChatRoomsForUser { user_id: String },
    ChatRoom { chat_room_id: String },
    /// Most recent `limit` messages of a room, oldest first.
    Messages {
        chat_room_id: String,
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    ChatRooms(Vec<ChatRoom>),
    ChatRoom(Option<ChatRoom>),
    Messages(Vec<Message>),
}

impl Query {
    pub fn run(&self, db: &ChatDatabase) -> Result<QueryResult> {
        let result = match self {
            Query::AllChatRooms => QueryResult::ChatRooms(db.get_all_chat_rooms()?),
            Query::ChatRoomsForUser { user_id } => {
                QueryResult::ChatRooms(db.get_chat_rooms_for_user(user_id)?)
            }
            Query::ChatRoom { chat_room_id } => {
                QueryResult::ChatRoom(db.get_chat_room(chat_room_id)?)
            }
            Query::Messages {
                chat_room_id,
                limit,
            } => QueryResult::Messages(db.get_messages(chat_room_id, *limit)?),
        };
        Ok(result)
    }
}

/// State-changing (or remote-only) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateChatRoom {
        name: String,
        user_id: String,
    },
    JoinChatRoom {
        chat_room_id: String,
        user_id: String,
    },
    CheckChatRoomExists {
        chat_room_id: String,
    },
    SendMessage {
        chat_room_id: String,
        content: String,
        sender_id: String,
        sender_name: String,
    },
    RegisterPushToken {
        user_id: String,
        token: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationResult {
    ChatRoomCreated(ChatRoom),
    Joined { already_joined: bool },
    ChatRoomExists(bool),
    MessageSent(Message),
    PushTokenRegistered,
}

impl Mutation {
    pub fn apply(&self, db: &ChatDatabase) -> Result<MutationResult> {
        let result = match self {
            Mutation::CreateChatRoom { name, user_id } => {
                MutationResult::ChatRoomCreated(db.create_chat_room(name, user_id)?)
            }
            Mutation::JoinChatRoom {
                chat_room_id,
                user_id,
            } => {
                let already_joined = db.join_chat_room(chat_room_id, user_id)?;
                MutationResult::Joined { already_joined }
            }
            Mutation::CheckChatRoomExists { chat_room_id } => {
                MutationResult::ChatRoomExists(db.chat_room_exists(chat_room_id)?)
            }
            Mutation::SendMessage {
                chat_room_id,
                content,
                sender_id,
                sender_name,
            } => MutationResult::MessageSent(db.send_message(
                chat_room_id,
                content,
                sender_id,
                sender_name,
            )?),
            Mutation::RegisterPushToken { user_id, token } => {
                db.register_push_token(user_id, token)?;
                MutationResult::PushTokenRegistered
            }
        };
        Ok(result)
    }

    /// Whether the mutation can change the result of any query.
    pub fn is_write(&self) -> bool {
        !matches!(self, Mutation::CheckChatRoomExists { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_room_query_reports_missing_rooms() {
        let db = ChatDatabase::in_memory().unwrap();
        let room = db.create_chat_room("General", "u1").unwrap();

        let found = Query::ChatRoom {
            chat_room_id: room.id.clone(),
        }
        .run(&db)
        .unwrap();
        assert_eq!(found, QueryResult::ChatRoom(Some(room)));

        let missing = Query::ChatRoom {
            chat_room_id: "gone".to_string(),
        }
        .run(&db)
        .unwrap();
        assert_eq!(missing, QueryResult::ChatRoom(None));
    }

    #[test]
    fn create_then_join_reports_membership() {
        let db = ChatDatabase::in_memory().unwrap();
        let created = Mutation::CreateChatRoom {
            name: "General".to_string(),
            user_id: "u1".to_string(),
        }
        .apply(&db)
        .unwrap();
        let room = match created {
            MutationResult::ChatRoomCreated(room) => room,
            other => panic!("unexpected result {other:?}"),
        };

        let join = Mutation::JoinChatRoom {
            chat_room_id: room.id.clone(),
            user_id: "u1".to_string(),
        };
        assert_eq!(
            join.apply(&db).unwrap(),
            MutationResult::Joined {
                already_joined: false
            }
        );
        assert_eq!(
            join.apply(&db).unwrap(),
            MutationResult::Joined {
                already_joined: true
            }
        );

        let mine = Query::ChatRoomsForUser {
            user_id: "u1".to_string(),
        }
        .run(&db)
        .unwrap();
        assert_eq!(mine, QueryResult::ChatRooms(vec![room]));
    }

    #[test]
    fn only_existence_check_is_read_only() {
        let check = Mutation::CheckChatRoomExists {
            chat_room_id: "r".to_string(),
        };
        let token = Mutation::RegisterPushToken {
            user_id: "u".to_string(),
            token: "t".to_string(),
        };
        assert!(!check.is_write());
        assert!(token.is_write());
    }
}
