use crate::backend::{MutationResult, Query, QueryResult};

/// Events the backend task sends up to the UI.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    QueryUpdated {
        query: Query,
        result: QueryResult,
    },
    QueryFailed {
        query: Query,
        error: String,
    },
    MutationSettled {
        request_id: u64,
        outcome: Result<MutationResult, String>,
    },
}
