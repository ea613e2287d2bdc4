use crate::backend::{Mutation, Query};

/// Commands the UI sends down to the backend task.
#[derive(Debug, Clone)]
pub enum BackendCommand {
    /// Start watching a query. The current result is delivered right away,
    /// then again every time it changes.
    Subscribe(Query),
    Unsubscribe(Query),
    /// Run a mutation; the outcome comes back tagged with `request_id`.
    Invoke { request_id: u64, mutation: Mutation },
}
