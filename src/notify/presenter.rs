use tokio::sync::mpsc;

use super::LocalNotification;
use crate::error::{ChatError, Result};

/// Shows a local notification on whatever surface the platform offers.
///
/// Callers treat presentation as best-effort: an error is logged and dropped.
pub trait NotificationPresenter {
    fn present(&self, notification: &LocalNotification) -> Result<()>;
}

/// Queues notifications for the in-app banner.
pub struct ToastPresenter {
    sender: mpsc::Sender<LocalNotification>,
}

impl ToastPresenter {
    /// Returns the presenter and the receiving end the UI drains each frame.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LocalNotification>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

impl NotificationPresenter for ToastPresenter {
    fn present(&self, notification: &LocalNotification) -> Result<()> {
        self.sender
            .try_send(notification.clone())
            .map_err(|err| ChatError::Presentation(err.to_string()))
    }
}

/// Present and swallow any failure. Presentation never affects the caller.
pub fn present_best_effort(
    presenter: &dyn NotificationPresenter,
    notification: &LocalNotification,
) {
    if let Err(err) = presenter.present(notification) {
        log::debug!("Dropping local notification {:?}: {err}", notification.title);
    }
}
