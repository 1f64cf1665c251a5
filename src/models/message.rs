use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row of the `messages` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    #[serde(default)]
    pub job_id: Option<Uuid>,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender_id: Uuid, recipient_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            recipient_id,
            job_id: None,
            content: content.into(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_unread_for(&self, viewer: Uuid) -> bool {
        self.recipient_id == viewer && !self.is_read
    }
}
