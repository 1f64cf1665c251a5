//! Access to the hosted backend: tables, conditional writes and the change feed.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Job, Profile, SupportTicket};
use crate::realtime::{ChannelSpec, Subscription};

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<crate::database::DatabaseError> for BackendError {
    fn from(err: crate::database::DatabaseError) -> Self {
        match err {
            crate::database::DatabaseError::Sqlx(e) => BackendError::Database(e),
            other => BackendError::Unavailable(other.to_string()),
        }
    }
}

/// Everything the portal collaborators need from the backend
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError>;

    /// All jobs the backend returns to this client; visibility is applied client-side
    async fn list_jobs(&self) -> Result<Vec<Job>, BackendError>;

    async fn count_unread_messages(&self, recipient_id: Uuid) -> Result<u64, BackendError>;

    /// Display name for a user, `None` when the profile does not exist
    async fn fetch_display_name(&self, user_id: Uuid) -> Result<Option<String>, BackendError>;

    /// Open and unassigned tickets, oldest first
    async fn list_open_tickets(&self) -> Result<Vec<SupportTicket>, BackendError>;

    /// Assign an open, unassigned ticket and move it to `in_progress`.
    /// Returns `false` when no row matched the condition.
    async fn assign_ticket(&self, ticket_id: Uuid, assignee: Uuid) -> Result<bool, BackendError>;

    async fn subscribe(&self, spec: ChannelSpec) -> Result<Subscription, BackendError>;
}
