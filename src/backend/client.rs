use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::live::LiveQueries;
use super::push::PushSender;
use super::queries::{Mutation, MutationResult, Query};
use crate::common::{BackendCommand, BackendEvent, Message};
use crate::error::Result;
use crate::storage::ChatDatabase;

/// How often the store is checked for writes made by other clients.
pub const STORE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Backend task: owns the store and the live queries, and answers UI
/// commands one at a time.
///
/// Other clients may write to the same database file. Their commits are
/// picked up by polling the store's data version, after which every live
/// query is re-run.
pub struct BackendClient {
    event_sender: mpsc::Sender<BackendEvent>,
    command_receiver: mpsc::Receiver<BackendCommand>,
    db: ChatDatabase,
    live: LiveQueries,
    push: Option<PushSender>,
    poll_interval: Duration,
    seen_data_version: Option<i64>,
}

impl BackendClient {
    pub fn new(
        event_sender: mpsc::Sender<BackendEvent>,
        command_receiver: mpsc::Receiver<BackendCommand>,
        db: ChatDatabase,
        push: Option<PushSender>,
    ) -> Self {
        Self {
            event_sender,
            command_receiver,
            db,
            live: LiveQueries::new(),
            push,
            poll_interval: STORE_POLL_INTERVAL,
            seen_data_version: None,
        }
    }

    pub fn poll_every(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub async fn run(mut self) -> Result<()> {
        log::info!("Backend event loop started");

        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let events = tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
                _ = poll.tick() => self.poll_store(),
            };

            for event in events {
                if let Err(err) = self.event_sender.send(event).await {
                    log::warn!("UI stopped listening for backend events: {err}");
                    return Ok(());
                }
            }
        }

        log::info!("Command channel closed; backend event loop stopped");
        Ok(())
    }

    /// Re-run live queries if another client committed since the last check.
    fn poll_store(&mut self) -> Vec<BackendEvent> {
        let version = match self.db.data_version() {
            Ok(version) => version,
            Err(err) => {
                log::warn!("Failed to read store version: {err}");
                return Vec::new();
            }
        };
        if self.seen_data_version.replace(version) == Some(version) || self.live.is_empty() {
            return Vec::new();
        }

        log::debug!("Store changed externally (data_version {version}); refreshing");
        self.refresh_events()
    }

    fn refresh_events(&mut self) -> Vec<BackendEvent> {
        let refresh = self.live.refresh(&self.db);
        refresh
            .changed
            .into_iter()
            .map(|(query, result)| BackendEvent::QueryUpdated { query, result })
            .chain(
                refresh
                    .failed
                    .into_iter()
                    .map(|(query, error)| BackendEvent::QueryFailed { query, error }),
            )
            .collect()
    }

    fn handle_command(&mut self, command: BackendCommand) -> Vec<BackendEvent> {
        match command {
            BackendCommand::Subscribe(query) => vec![self.subscribe(query)],
            BackendCommand::Unsubscribe(query) => {
                self.live.unsubscribe(&query);
                Vec::new()
            }
            BackendCommand::Invoke {
                request_id,
                mutation,
            } => self.invoke(request_id, mutation),
        }
    }

    fn subscribe(&mut self, query: Query) -> BackendEvent {
        match self.live.subscribe(query.clone(), &self.db) {
            Ok(result) => BackendEvent::QueryUpdated { query, result },
            Err(err) => {
                log::warn!("Query {query:?} failed: {err}");
                BackendEvent::QueryFailed {
                    query,
                    error: err.to_string(),
                }
            }
        }
    }

    fn invoke(&mut self, request_id: u64, mutation: Mutation) -> Vec<BackendEvent> {
        let outcome = mutation.apply(&self.db);

        let mut events = Vec::new();
        if let Ok(MutationResult::MessageSent(message)) = &outcome {
            self.spawn_push_fan_out(message);
        }

        let settled = match outcome {
            Ok(result) => Ok(result),
            Err(err) => {
                log::warn!("Mutation {mutation:?} failed: {err}");
                Err(err.to_string())
            }
        };
        let wrote = settled.is_ok() && mutation.is_write();

        events.push(BackendEvent::MutationSettled {
            request_id,
            outcome: settled,
        });

        if wrote {
            events.extend(self.refresh_events());
        }

        events
    }

    fn spawn_push_fan_out(&self, message: &Message) {
        let Some(push) = self.push.clone() else {
            return;
        };

        let tokens = match self
            .db
            .push_tokens_for_room(&message.chat_room_id, &message.sender_id)
        {
            Ok(tokens) => tokens,
            Err(err) => {
                log::warn!("Failed to load push tokens: {err}");
                return;
            }
        };

        let message = message.clone();
        tokio::spawn(async move {
            push.fan_out(&message, &tokens).await;
        });
    }
}
