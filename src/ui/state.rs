use std::collections::HashMap;

use crate::backend::{Mutation, MutationResult, Query, QueryResult};
use crate::common::{BackendCommand, BackendEvent, ChatRoom, User};
use crate::notify::{NotificationData, NotificationPresenter};
use crate::share::parse_share_code;

use super::room_view::ChatRoomView;

const CREATE_FAILED: &str = "Failed to create chat room";
const JOIN_FAILED: &str = "Failed to join chat room";
const INVALID_CODE: &str = "Invalid code or chat room doesn't exist";

pub enum Screen {
    RoomList,
    CreateRoom {
        name_input: String,
        creating: bool,
        error: Option<String>,
    },
    JoinByCode {
        code_input: String,
        checking: bool,
        error: Option<String>,
    },
    ChatRoom(ChatRoomView),
}

/// What to do when a mutation we sent comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingAction {
    CreateRoom,
    Join { chat_room_id: String, name: String },
    CheckCode { chat_room_id: String },
    Send,
    RegisterPushToken,
}

/// Local UI state: what the backend last told us, plus navigation.
pub struct AppState {
    pub user: User,
    pub screen: Screen,
    /// `None` until the first result arrives
    pub rooms: Option<Vec<ChatRoom>>,
    pub my_rooms: Option<Vec<ChatRoom>>,
    pub status: Option<String>,
    message_limit: usize,
    pending: HashMap<u64, PendingAction>,
    next_request_id: u64,
}

impl AppState {
    pub fn new(user: User, message_limit: usize) -> Self {
        Self {
            user,
            screen: Screen::RoomList,
            rooms: None,
            my_rooms: None,
            status: None,
            message_limit,
            pending: HashMap::new(),
            next_request_id: 1,
        }
    }

    /// Subscriptions the room list needs for the whole session.
    pub fn startup_commands(&self) -> Vec<BackendCommand> {
        vec![
            BackendCommand::Subscribe(Query::AllChatRooms),
            BackendCommand::Subscribe(self.my_rooms_query()),
        ]
    }

    pub fn register_push_token(&mut self, token: &str) -> BackendCommand {
        self.invoke(
            PendingAction::RegisterPushToken,
            Mutation::RegisterPushToken {
                user_id: self.user.user_id.clone(),
                token: token.to_string(),
            },
        )
    }

    fn my_rooms_query(&self) -> Query {
        Query::ChatRoomsForUser {
            user_id: self.user.user_id.clone(),
        }
    }

    fn invoke(&mut self, action: PendingAction, mutation: Mutation) -> BackendCommand {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending.insert(request_id, action);
        BackendCommand::Invoke {
            request_id,
            mutation,
        }
    }

    pub fn is_member(&self, chat_room_id: &str) -> bool {
        self.my_rooms
            .as_ref()
            .is_some_and(|rooms| rooms.iter().any(|room| room.id == chat_room_id))
    }

    fn room_name(&self, chat_room_id: &str) -> String {
        self.rooms
            .iter()
            .flatten()
            .find(|room| room.id == chat_room_id)
            .map(|room| room.name.clone())
            .unwrap_or_else(|| "Chat".to_string())
    }

    // ========== Navigation ==========

    /// Open a room from the list, joining it first if needed.
    pub fn select_room(&mut self, room: &ChatRoom) -> Vec<BackendCommand> {
        if self.is_member(&room.id) {
            return self.open_room(room.id.clone(), room.name.clone());
        }
        vec![self.join(room.id.clone(), room.name.clone())]
    }

    fn join(&mut self, chat_room_id: String, name: String) -> BackendCommand {
        let mutation = Mutation::JoinChatRoom {
            chat_room_id: chat_room_id.clone(),
            user_id: self.user.user_id.clone(),
        };
        self.invoke(PendingAction::Join { chat_room_id, name }, mutation)
    }

    pub fn open_room(&mut self, chat_room_id: String, name: String) -> Vec<BackendCommand> {
        let mut commands = self.leave_room();
        let view = ChatRoomView::new(chat_room_id, name, self.message_limit);
        commands.push(BackendCommand::Subscribe(view.feed_query()));
        self.screen = Screen::ChatRoom(view);
        commands
    }

    /// Back to the room list. Leaving a chat room drops its subscription.
    pub fn leave_room(&mut self) -> Vec<BackendCommand> {
        let previous = std::mem::replace(&mut self.screen, Screen::RoomList);
        match previous {
            Screen::ChatRoom(view) => vec![BackendCommand::Unsubscribe(view.feed_query())],
            _ => Vec::new(),
        }
    }

    /// Route a tapped notification back to its room.
    pub fn open_notification(&mut self, data: &NotificationData) -> Vec<BackendCommand> {
        if let Screen::ChatRoom(view) = &self.screen {
            if view.chat_room_id == data.chat_room_id {
                return Vec::new();
            }
        }
        let name = self.room_name(&data.chat_room_id);
        self.open_room(data.chat_room_id.clone(), name)
    }

    pub fn show_create_room(&mut self) -> Vec<BackendCommand> {
        let commands = self.leave_room();
        self.screen = Screen::CreateRoom {
            name_input: String::new(),
            creating: false,
            error: None,
        };
        commands
    }

    pub fn show_join_by_code(&mut self) -> Vec<BackendCommand> {
        let commands = self.leave_room();
        self.screen = Screen::JoinByCode {
            code_input: String::new(),
            checking: false,
            error: None,
        };
        commands
    }

    // ========== Actions ==========

    pub fn submit_create_room(&mut self) -> Vec<BackendCommand> {
        let Screen::CreateRoom {
            name_input,
            creating,
            error,
        } = &mut self.screen
        else {
            return Vec::new();
        };

        let name = name_input.trim().to_string();
        if name.is_empty() || *creating {
            return Vec::new();
        }
        *creating = true;
        *error = None;

        let mutation = Mutation::CreateChatRoom {
            name,
            user_id: self.user.user_id.clone(),
        };
        vec![self.invoke(PendingAction::CreateRoom, mutation)]
    }

    pub fn submit_join_code(&mut self) -> Vec<BackendCommand> {
        let Screen::JoinByCode {
            code_input,
            checking,
            error,
        } = &mut self.screen
        else {
            return Vec::new();
        };
        if *checking {
            return Vec::new();
        }

        let chat_room_id = match parse_share_code(code_input) {
            Ok(id) => id,
            Err(err) => {
                log::debug!("Rejected share code: {err}");
                *error = Some(INVALID_CODE.to_string());
                return Vec::new();
            }
        };
        *checking = true;
        *error = None;

        let mutation = Mutation::CheckChatRoomExists {
            chat_room_id: chat_room_id.clone(),
        };
        vec![self.invoke(PendingAction::CheckCode { chat_room_id }, mutation)]
    }

    pub fn send_message(&mut self) -> Vec<BackendCommand> {
        let request_id = self.next_request_id;
        let Screen::ChatRoom(view) = &mut self.screen else {
            return Vec::new();
        };
        let Some(mutation) = view.compose(&self.user, request_id) else {
            return Vec::new();
        };

        self.next_request_id += 1;
        self.pending.insert(request_id, PendingAction::Send);
        vec![BackendCommand::Invoke {
            request_id,
            mutation,
        }]
    }

    // ========== Backend events ==========

    pub fn handle_event(
        &mut self,
        event: BackendEvent,
        presenter: &dyn NotificationPresenter,
    ) -> Vec<BackendCommand> {
        match event {
            BackendEvent::QueryUpdated { query, result } => {
                self.apply_query_result(query, result, presenter);
                Vec::new()
            }
            BackendEvent::QueryFailed { query, error } => {
                log::warn!("Live query {query:?} failed: {error}");
                if let (Query::Messages { chat_room_id, .. }, Screen::ChatRoom(view)) =
                    (&query, &mut self.screen)
                {
                    if view.chat_room_id == *chat_room_id {
                        view.error = Some("Failed to load messages".to_string());
                    }
                }
                Vec::new()
            }
            BackendEvent::MutationSettled {
                request_id,
                outcome,
            } => match self.pending.remove(&request_id) {
                Some(action) => self.settle(request_id, action, outcome),
                None => {
                    log::debug!("Ignoring result for unknown request {request_id}");
                    Vec::new()
                }
            },
        }
    }

    fn apply_query_result(
        &mut self,
        query: Query,
        result: QueryResult,
        presenter: &dyn NotificationPresenter,
    ) {
        match (query, result) {
            (Query::AllChatRooms, QueryResult::ChatRooms(rooms)) => self.rooms = Some(rooms),
            (Query::ChatRoomsForUser { user_id }, QueryResult::ChatRooms(rooms))
                if user_id == self.user.user_id =>
            {
                self.my_rooms = Some(rooms)
            }
            (Query::Messages { chat_room_id, .. }, QueryResult::Messages(feed)) => {
                if let Screen::ChatRoom(view) = &mut self.screen {
                    if view.chat_room_id == chat_room_id {
                        view.apply_feed(feed, &self.user, presenter);
                    }
                }
            }
            (query, _) => log::debug!("No view for query {query:?}"),
        }
    }

    fn settle(
        &mut self,
        request_id: u64,
        action: PendingAction,
        outcome: Result<MutationResult, String>,
    ) -> Vec<BackendCommand> {
        match (action, outcome) {
            (PendingAction::CreateRoom, Ok(MutationResult::ChatRoomCreated(room))) => {
                vec![self.join(room.id, room.name)]
            }
            (PendingAction::CreateRoom, outcome) => {
                log::error!("Error creating chat room: {outcome:?}");
                if let Screen::CreateRoom {
                    creating, error, ..
                } = &mut self.screen
                {
                    *creating = false;
                    *error = Some(CREATE_FAILED.to_string());
                }
                Vec::new()
            }
            (
                PendingAction::Join { chat_room_id, name },
                Ok(MutationResult::Joined { already_joined }),
            ) => {
                if already_joined {
                    log::info!("User is already a member of {chat_room_id}");
                }
                self.status = None;
                self.open_room(chat_room_id, name)
            }
            (PendingAction::Join { chat_room_id, .. }, outcome) => {
                log::error!("Failed to join {chat_room_id}: {outcome:?}");
                self.status = Some(JOIN_FAILED.to_string());
                match &mut self.screen {
                    Screen::CreateRoom {
                        creating, error, ..
                    } => {
                        *creating = false;
                        *error = Some(CREATE_FAILED.to_string());
                    }
                    Screen::JoinByCode {
                        checking, error, ..
                    } => {
                        *checking = false;
                        *error = Some(JOIN_FAILED.to_string());
                    }
                    _ => {}
                }
                Vec::new()
            }
            (
                PendingAction::CheckCode { chat_room_id },
                Ok(MutationResult::ChatRoomExists(true)),
            ) => {
                let name = self.room_name(&chat_room_id);
                vec![self.join(chat_room_id, name)]
            }
            (PendingAction::CheckCode { chat_room_id }, outcome) => {
                log::info!("Share code {chat_room_id} rejected: {outcome:?}");
                if let Screen::JoinByCode {
                    checking, error, ..
                } = &mut self.screen
                {
                    *checking = false;
                    *error = Some(INVALID_CODE.to_string());
                }
                Vec::new()
            }
            (PendingAction::Send, outcome) => {
                if let Err(err) = &outcome {
                    log::error!("Error sending message: {err}");
                }
                if let Screen::ChatRoom(view) = &mut self.screen {
                    view.on_send_settled(request_id, outcome.is_ok());
                }
                Vec::new()
            }
            (PendingAction::RegisterPushToken, outcome) => {
                match outcome {
                    Ok(_) => log::info!("Registered push token for {}", self.user.user_id),
                    Err(err) => log::warn!("Failed to register push token: {err}"),
                }
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Message;
    use crate::error::Result;
    use crate::notify::LocalNotification;

    struct Silent;

    impl NotificationPresenter for Silent {
        fn present(&self, _notification: &LocalNotification) -> Result<()> {
            Ok(())
        }
    }

    fn user() -> User {
        User {
            user_id: "u1".to_string(),
            username: "Alice".to_string(),
        }
    }

    fn room(id: &str, name: &str) -> ChatRoom {
        ChatRoom {
            id: id.to_string(),
            name: name.to_string(),
            created_at: 1,
            created_by: "u9".to_string(),
            is_active: true,
        }
    }

    fn invoked(commands: &[BackendCommand]) -> (u64, Mutation) {
        match commands {
            [BackendCommand::Invoke { request_id, mutation }] => (*request_id, mutation.clone()),
            other => panic!("expected a single invoke, got {other:?}"),
        }
    }

    fn settled(
        request_id: u64,
        outcome: std::result::Result<MutationResult, String>,
    ) -> BackendEvent {
        BackendEvent::MutationSettled {
            request_id,
            outcome,
        }
    }

    fn current_room(state: &AppState) -> &ChatRoomView {
        match &state.screen {
            Screen::ChatRoom(view) => view,
            _ => panic!("not in a chat room"),
        }
    }

    #[test]
    fn startup_subscribes_room_lists() {
        let state = AppState::new(user(), 100);
        let commands = state.startup_commands();
        assert!(matches!(
            commands.as_slice(),
            [
                BackendCommand::Subscribe(Query::AllChatRooms),
                BackendCommand::Subscribe(Query::ChatRoomsForUser { user_id })
            ] if user_id == "u1"
        ));
    }

    #[test]
    fn member_rooms_open_directly() {
        let mut state = AppState::new(user(), 100);
        state.handle_event(
            BackendEvent::QueryUpdated {
                query: Query::ChatRoomsForUser {
                    user_id: "u1".to_string(),
                },
                result: QueryResult::ChatRooms(vec![room("r1", "General")]),
            },
            &Silent,
        );

        let commands = state.select_room(&room("r1", "General"));
        assert!(matches!(
            commands.as_slice(),
            [BackendCommand::Subscribe(Query::Messages { chat_room_id, limit: Some(100) })]
                if chat_room_id == "r1"
        ));
        assert_eq!(current_room(&state).name, "General");
    }

    #[test]
    fn non_member_rooms_join_then_open() {
        let mut state = AppState::new(user(), 100);
        let (request_id, mutation) = invoked(&state.select_room(&room("r2", "Random")));
        assert_eq!(
            mutation,
            Mutation::JoinChatRoom {
                chat_room_id: "r2".to_string(),
                user_id: "u1".to_string(),
            }
        );

        let commands = state.handle_event(
            settled(request_id, Ok(MutationResult::Joined { already_joined: true })),
            &Silent,
        );
        assert!(matches!(commands.as_slice(), [BackendCommand::Subscribe(_)]));
        assert_eq!(current_room(&state).chat_room_id, "r2");
    }

    #[test]
    fn create_room_then_join_then_open() {
        let mut state = AppState::new(user(), 100);
        state.show_create_room();
        if let Screen::CreateRoom { name_input, .. } = &mut state.screen {
            *name_input = "  Book club ".to_string();
        }

        let (create_id, mutation) = invoked(&state.submit_create_room());
        assert_eq!(
            mutation,
            Mutation::CreateChatRoom {
                name: "Book club".to_string(),
                user_id: "u1".to_string(),
            }
        );
        // a second click while creating does nothing
        assert!(state.submit_create_room().is_empty());

        let (join_id, mutation) = invoked(&state.handle_event(
            settled(
                create_id,
                Ok(MutationResult::ChatRoomCreated(room("r3", "Book club"))),
            ),
            &Silent,
        ));
        assert!(matches!(mutation, Mutation::JoinChatRoom { .. }));

        state.handle_event(
            settled(join_id, Ok(MutationResult::Joined { already_joined: false })),
            &Silent,
        );
        assert_eq!(current_room(&state).name, "Book club");
    }

    #[test]
    fn failed_create_shows_error() {
        let mut state = AppState::new(user(), 100);
        state.show_create_room();
        if let Screen::CreateRoom { name_input, .. } = &mut state.screen {
            *name_input = "Room".to_string();
        }
        let (request_id, _) = invoked(&state.submit_create_room());

        state.handle_event(settled(request_id, Err("boom".to_string())), &Silent);
        match &state.screen {
            Screen::CreateRoom {
                creating, error, ..
            } => {
                assert!(!creating);
                assert_eq!(error.as_deref(), Some(CREATE_FAILED));
            }
            _ => panic!("should stay on create screen"),
        }
    }

    #[test]
    fn blank_room_name_is_ignored() {
        let mut state = AppState::new(user(), 100);
        state.show_create_room();
        assert!(state.submit_create_room().is_empty());
    }

    #[test]
    fn join_by_code_checks_then_joins() {
        let mut state = AppState::new(user(), 100);
        state.handle_event(
            BackendEvent::QueryUpdated {
                query: Query::AllChatRooms,
                result: QueryResult::ChatRooms(vec![room("r4", "Hikers")]),
            },
            &Silent,
        );
        state.show_join_by_code();
        if let Screen::JoinByCode { code_input, .. } = &mut state.screen {
            *code_input = "https://your-app-name.com/chat/r4".to_string();
        }

        let (check_id, mutation) = invoked(&state.submit_join_code());
        assert_eq!(
            mutation,
            Mutation::CheckChatRoomExists {
                chat_room_id: "r4".to_string()
            }
        );

        let (join_id, _) = invoked(&state.handle_event(
            settled(check_id, Ok(MutationResult::ChatRoomExists(true))),
            &Silent,
        ));
        state.handle_event(
            settled(join_id, Ok(MutationResult::Joined { already_joined: false })),
            &Silent,
        );
        assert_eq!(current_room(&state).name, "Hikers");
    }

    #[test]
    fn unknown_code_shows_error() {
        let mut state = AppState::new(user(), 100);
        state.show_join_by_code();
        if let Screen::JoinByCode { code_input, .. } = &mut state.screen {
            *code_input = "ghost".to_string();
        }
        let (check_id, _) = invoked(&state.submit_join_code());

        let commands = state.handle_event(
            settled(check_id, Ok(MutationResult::ChatRoomExists(false))),
            &Silent,
        );
        assert!(commands.is_empty());
        match &state.screen {
            Screen::JoinByCode {
                checking, error, ..
            } => {
                assert!(!checking);
                assert_eq!(error.as_deref(), Some(INVALID_CODE));
            }
            _ => panic!("should stay on join screen"),
        }
    }

    #[test]
    fn empty_code_is_rejected_locally() {
        let mut state = AppState::new(user(), 100);
        state.show_join_by_code();
        assert!(state.submit_join_code().is_empty());
        assert!(matches!(
            &state.screen,
            Screen::JoinByCode { error: Some(_), checking: false, .. }
        ));
    }

    #[test]
    fn feed_for_open_room_reaches_view_and_others_are_ignored() {
        let mut state = AppState::new(user(), 100);
        state.open_room("r1".to_string(), "General".to_string());

        let message = Message {
            id: "m1".to_string(),
            chat_room_id: "r1".to_string(),
            content: "hi".to_string(),
            sender_id: "u2".to_string(),
            sender_name: "Bob".to_string(),
            timestamp: 5,
        };
        state.handle_event(
            BackendEvent::QueryUpdated {
                query: Query::Messages {
                    chat_room_id: "elsewhere".to_string(),
                    limit: Some(100),
                },
                result: QueryResult::Messages(vec![message.clone()]),
            },
            &Silent,
        );
        assert!(current_room(&state).feed.is_none());

        state.handle_event(
            BackendEvent::QueryUpdated {
                query: Query::Messages {
                    chat_room_id: "r1".to_string(),
                    limit: Some(100),
                },
                result: QueryResult::Messages(vec![message]),
            },
            &Silent,
        );
        assert_eq!(current_room(&state).feed.as_ref().map(Vec::len), Some(1));
        assert!(current_room(&state).gate().is_armed());
    }

    #[test]
    fn send_round_trip_clears_input() {
        let mut state = AppState::new(user(), 100);
        state.open_room("r1".to_string(), "General".to_string());
        if let Screen::ChatRoom(view) = &mut state.screen {
            view.input_text = "hello".to_string();
        }

        let (request_id, mutation) = invoked(&state.send_message());
        assert!(matches!(mutation, Mutation::SendMessage { .. }));

        let message = Message {
            id: "m1".to_string(),
            chat_room_id: "r1".to_string(),
            content: "hello".to_string(),
            sender_id: "u1".to_string(),
            sender_name: "Alice".to_string(),
            timestamp: 5,
        };
        state.handle_event(
            settled(request_id, Ok(MutationResult::MessageSent(message))),
            &Silent,
        );
        assert!(current_room(&state).input_text.is_empty());
    }

    #[test]
    fn leaving_room_unsubscribes_feed() {
        let mut state = AppState::new(user(), 50);
        state.open_room("r1".to_string(), "General".to_string());

        let commands = state.leave_room();
        assert!(matches!(
            commands.as_slice(),
            [BackendCommand::Unsubscribe(Query::Messages { chat_room_id, limit: Some(50) })]
                if chat_room_id == "r1"
        ));
        assert!(matches!(state.screen, Screen::RoomList));
        assert!(state.leave_room().is_empty());
    }

    #[test]
    fn notification_opens_its_room_once() {
        let mut state = AppState::new(user(), 100);
        let data = NotificationData {
            chat_room_id: "r7".to_string(),
        };

        assert_eq!(state.open_notification(&data).len(), 1);
        assert_eq!(current_room(&state).name, "Chat");
        assert!(state.open_notification(&data).is_empty());
    }

    #[test]
    fn switching_rooms_swaps_subscription() {
        let mut state = AppState::new(user(), 100);
        state.open_room("r1".to_string(), "One".to_string());

        let commands = state.open_room("r2".to_string(), "Two".to_string());
        assert!(matches!(
            commands.as_slice(),
            [BackendCommand::Unsubscribe(_), BackendCommand::Subscribe(_)]
        ));
        assert_eq!(current_room(&state).chat_room_id, "r2");
    }

    #[tokio::test]
    async fn message_from_another_client_raises_one_notification() {
        use std::time::Duration;

        use tokio::sync::mpsc;

        use crate::backend::BackendClient;
        use crate::notify::ToastPresenter;
        use crate::storage::ChatDatabase;

        let path = std::env::temp_dir()
            .join(format!("room_chat_shared_{}.sqlite", uuid::Uuid::new_v4()));
        let alice_db = ChatDatabase::with_path(&path).unwrap();
        let room = alice_db.create_chat_room("General", "u1").unwrap();
        alice_db.join_chat_room(&room.id, "u1").unwrap();
        let bob_db = ChatDatabase::with_path(&path).unwrap();
        bob_db.join_chat_room(&room.id, "u2").unwrap();
        bob_db.send_message(&room.id, "old news", "u2", "Bob").unwrap();

        let (event_tx, mut event_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let backend = BackendClient::new(event_tx, cmd_rx, alice_db, None)
            .poll_every(Duration::from_millis(20));
        tokio::spawn(backend.run());

        let (presenter, mut shown) = ToastPresenter::channel(8);
        let mut state = AppState::new(user(), 100);
        for command in state.open_room(room.id.clone(), room.name.clone()) {
            cmd_tx.send(command).await.unwrap();
        }

        let history = event_rx.recv().await.unwrap();
        state.handle_event(history, &presenter);
        assert!(shown.try_recv().is_err());

        bob_db.send_message(&room.id, "hi Alice", "u2", "Bob").unwrap();
        let update = tokio::time::timeout(Duration::from_secs(3), event_rx.recv())
            .await
            .expect("feed update from the other client")
            .unwrap();
        state.handle_event(update, &presenter);

        let notification = shown.try_recv().unwrap();
        assert_eq!(notification.title, "New message from Bob");
        assert_eq!(notification.body, "hi Alice");
        assert_eq!(notification.data.chat_room_id, room.id);
        assert!(shown.try_recv().is_err());
        assert_eq!(current_room(&state).feed.as_ref().map(Vec::len), Some(2));
    }
}
