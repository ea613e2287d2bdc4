use crate::backend::{Mutation, Query};
use crate::common::{Message, MessageFeed, User, now_ms};
use crate::notify::{NotificationGate, NotificationPresenter, present_best_effort};

/// State of one open chat room. Dropped when the user leaves the room,
/// taking the notification gate with it.
pub struct ChatRoomView {
    pub chat_room_id: String,
    pub name: String,
    /// `None` until the first feed arrives
    pub feed: Option<MessageFeed>,
    pub input_text: String,
    pub scroll_to_bottom: bool,
    pub show_share: bool,
    pub error: Option<String>,
    limit: usize,
    gate: NotificationGate,
    pending_send: Option<u64>,
}

impl ChatRoomView {
    pub fn new(chat_room_id: String, name: String, limit: usize) -> Self {
        Self {
            chat_room_id,
            name,
            feed: None,
            input_text: String::new(),
            scroll_to_bottom: false,
            show_share: false,
            error: None,
            limit,
            gate: NotificationGate::new(),
            pending_send: None,
        }
    }

    pub fn feed_query(&self) -> Query {
        Query::Messages {
            chat_room_id: self.chat_room_id.clone(),
            limit: Some(self.limit),
        }
    }

    pub fn gate(&self) -> &NotificationGate {
        &self.gate
    }

    /// Replace the feed with the latest snapshot and run it through the gate.
    pub fn apply_feed(
        &mut self,
        feed: MessageFeed,
        viewer: &User,
        presenter: &dyn NotificationPresenter,
    ) {
        if let Some(notification) = self.gate.evaluate(&feed, &viewer.user_id, now_ms) {
            present_best_effort(presenter, &notification);
        }

        self.scroll_to_bottom = !feed.is_empty();
        self.feed = Some(feed);
    }

    pub fn can_send(&self) -> bool {
        self.pending_send.is_none() && !self.input_text.trim().is_empty()
    }

    /// Build the send mutation for the current input. The input stays in
    /// place until the backend confirms the message.
    pub fn compose(&mut self, user: &User, request_id: u64) -> Option<Mutation> {
        if !self.can_send() {
            return None;
        }

        self.pending_send = Some(request_id);
        self.error = None;
        Some(Mutation::SendMessage {
            chat_room_id: self.chat_room_id.clone(),
            content: self.input_text.trim().to_string(),
            sender_id: user.user_id.clone(),
            sender_name: user.username.clone(),
        })
    }

    pub fn on_send_settled(&mut self, request_id: u64, succeeded: bool) {
        if self.pending_send != Some(request_id) {
            return;
        }
        self.pending_send = None;

        if succeeded {
            self.input_text.clear();
        } else {
            self.error = Some("Failed to send message".to_string());
        }
    }

    pub fn is_sending(&self) -> bool {
        self.pending_send.is_some()
    }
}

pub fn is_own_message(message: &Message, user: &User) -> bool {
    message.sender_id == user.user_id
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::{ChatError, Result};
    use crate::notify::LocalNotification;

    #[derive(Default)]
    struct Recorder {
        shown: RefCell<Vec<LocalNotification>>,
        fail: bool,
    }

    impl NotificationPresenter for Recorder {
        fn present(&self, notification: &LocalNotification) -> Result<()> {
            self.shown.borrow_mut().push(notification.clone());
            if self.fail {
                Err(ChatError::Presentation("denied".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn viewer() -> User {
        User {
            user_id: "u1".to_string(),
            username: "Alice".to_string(),
        }
    }

    fn msg(id: &str, sender: &str) -> Message {
        Message {
            id: id.to_string(),
            chat_room_id: "room".to_string(),
            content: format!("text {id}"),
            sender_id: sender.to_string(),
            sender_name: sender.to_string(),
            // far in the future so the gate never sees it as stale
            timestamp: i64::MAX - 1,
        }
    }

    fn view() -> ChatRoomView {
        ChatRoomView::new("room".to_string(), "General".to_string(), 100)
    }

    #[test]
    fn history_is_silent_and_new_messages_notify() {
        let presenter = Recorder::default();
        let mut view = view();

        view.apply_feed(vec![msg("1", "u2")], &viewer(), &presenter);
        assert!(presenter.shown.borrow().is_empty());
        assert!(view.scroll_to_bottom);

        view.apply_feed(vec![msg("1", "u2"), msg("2", "u2")], &viewer(), &presenter);
        let shown = presenter.shown.borrow();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "New message from u2");
    }

    #[test]
    fn presentation_failure_does_not_stop_gate() {
        let presenter = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let mut view = view();

        view.apply_feed(vec![], &viewer(), &presenter);
        view.apply_feed(vec![msg("1", "u2")], &viewer(), &presenter);
        view.apply_feed(vec![msg("1", "u2")], &viewer(), &presenter);

        assert_eq!(presenter.shown.borrow().len(), 1);
        assert_eq!(view.gate().last_announced_message_id(), Some("1"));
        assert_eq!(view.feed.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn empty_feed_does_not_scroll() {
        let mut view = view();
        view.apply_feed(vec![], &viewer(), &Recorder::default());
        assert!(!view.scroll_to_bottom);
        assert_eq!(view.feed, Some(vec![]));
    }

    #[test]
    fn compose_trims_and_waits_for_confirmation() {
        let mut view = view();
        view.input_text = "   ".to_string();
        assert_eq!(view.compose(&viewer(), 1), None);

        view.input_text = "  hello  ".to_string();
        let mutation = view.compose(&viewer(), 2).unwrap();
        assert_eq!(
            mutation,
            Mutation::SendMessage {
                chat_room_id: "room".to_string(),
                content: "hello".to_string(),
                sender_id: "u1".to_string(),
                sender_name: "Alice".to_string(),
            }
        );
        assert!(view.is_sending());
        assert_eq!(view.compose(&viewer(), 3), None);
        assert_eq!(view.input_text, "  hello  ");

        view.on_send_settled(2, true);
        assert!(view.input_text.is_empty());
        assert!(!view.is_sending());
    }

    #[test]
    fn failed_send_keeps_input() {
        let mut view = view();
        view.input_text = "hello".to_string();
        view.compose(&viewer(), 5).unwrap();

        // unrelated request ids are ignored
        view.on_send_settled(6, true);
        assert!(view.is_sending());

        view.on_send_settled(5, false);
        assert_eq!(view.input_text, "hello");
        assert_eq!(view.error.as_deref(), Some("Failed to send message"));
        assert!(view.can_send());
    }

    #[test]
    fn own_messages_are_recognised() {
        assert!(is_own_message(&msg("1", "u1"), &viewer()));
        assert!(!is_own_message(&msg("1", "u2"), &viewer()));
    }
}
