//! The reactive backend: live queries over the chat store, mutations, and
//! push fan-out for new messages.

pub mod client;
pub mod live;
pub mod push;
pub mod queries;

pub use client::BackendClient;
pub use push::PushSender;
pub use queries::{Mutation, MutationResult, Query, QueryResult};
