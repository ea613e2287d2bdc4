//! Decides, for each delivery of a room's message feed, whether the newest
//! message deserves a local notification.
//!
//! The feed arrives as a full snapshot every time, so "what is new" is worked
//! out by comparing the last message's id with the last one announced.

use super::LocalNotification;
use crate::common::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    /// No feed seen yet; the first one is history and is never announced.
    AwaitingInitialLoad,
    /// History loaded; new messages from others are announced.
    Armed,
}

/// Per-view gate state. Created when a chat room opens, dropped when it closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationGate {
    phase: GatePhase,
    last_announced_message_id: Option<String>,
    last_announced_at: i64,
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationGate {
    pub fn new() -> Self {
        Self {
            phase: GatePhase::AwaitingInitialLoad,
            last_announced_message_id: None,
            last_announced_at: 0,
        }
    }

    #[cfg(test)]
    fn phase(&self) -> GatePhase {
        self.phase
    }

    pub fn is_armed(&self) -> bool {
        self.phase == GatePhase::Armed
    }

    pub fn last_announced_message_id(&self) -> Option<&str> {
        self.last_announced_message_id.as_deref()
    }

    pub fn last_announced_at(&self) -> i64 {
        self.last_announced_at
    }

    /// Look at the latest feed and return the notification to raise, if any.
    ///
    /// `now` is only called when a notification is actually produced.
    pub fn evaluate<F>(
        &mut self,
        feed: &[Message],
        viewer_id: &str,
        now: F,
    ) -> Option<LocalNotification>
    where
        F: FnOnce() -> i64,
    {
        let Some(last) = feed.last() else {
            self.phase = GatePhase::Armed;
            return None;
        };

        if self.phase == GatePhase::AwaitingInitialLoad {
            self.last_announced_message_id = Some(last.id.clone());
            self.phase = GatePhase::Armed;
            return None;
        }

        if self.last_announced_message_id.as_deref() == Some(last.id.as_str()) {
            return None;
        }

        // Own messages don't move the remembered id.
        if last.sender_id == viewer_id {
            return None;
        }

        if last.timestamp <= self.last_announced_at {
            log::debug!(
                "Skipping stale message {} ({} <= {})",
                last.id,
                last.timestamp,
                self.last_announced_at
            );
            return None;
        }

        let notification = LocalNotification::for_message(last);
        self.last_announced_message_id = Some(last.id.clone());
        self.last_announced_at = now();
        self.phase = GatePhase::Armed;
        Some(notification)
    }
}
