use futures::future::join_all;
use serde::Serialize;

use crate::common::Message;
use crate::error::{ChatError, Result};
use crate::notify::LocalNotification;

pub const EXPO_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

/// Expo caps a single push request at 100 messages.
const MAX_BATCH: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub to: String,
    #[serde(flatten)]
    pub notification: LocalNotification,
    pub sound: &'static str,
}

/// Sends remote push notifications for new messages.
#[derive(Clone)]
pub struct PushSender {
    client: reqwest::Client,
    endpoint: String,
}

impl PushSender {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn messages_for(message: &Message, tokens: &[String]) -> Vec<PushMessage> {
        let notification = LocalNotification::for_message(message);
        tokens
            .iter()
            .map(|token| PushMessage {
                to: token.clone(),
                notification: notification.clone(),
                sound: "default",
            })
            .collect()
    }

    /// Post one batch and return the service's JSON reply.
    pub async fn send(&self, messages: &[PushMessage]) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(messages)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::PushRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Deliver `message` to every token, batching as needed. Failures are logged.
    pub async fn fan_out(&self, message: &Message, tokens: &[String]) {
        if tokens.is_empty() {
            return;
        }

        let messages = Self::messages_for(message, tokens);
        let results = join_all(messages.chunks(MAX_BATCH).map(|batch| self.send(batch))).await;

        for result in results {
            if let Err(err) = result {
                log::warn!("Push fan-out for message {} failed: {err}", message.id);
            }
        }
    }
}
