//! Inbox message entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Denormalized sender fields embedded in messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSnapshot {
    /// Sender user id.
    pub id: Uuid,
    /// Sender display name at send time.
    pub name: String,
}

impl SenderSnapshot {
    /// Creates a new sender snapshot.
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A private message embedded in the recipient's profile inbox.
///
/// `text` holds ciphertext at rest; it is decrypted on read and never
/// returned to a client encrypted. Distinct from chat messages, which are
/// stored plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxMessage {
    /// Unique identifier.
    pub id: Uuid,
    /// Message text. Ciphertext at rest.
    pub text: String,
    /// Denormalized sender fields.
    pub sender: SenderSnapshot,
    /// Recipient user id.
    pub recipient_id: Uuid,
    /// Referenced project, for collaboration invites.
    pub project_id: Option<Uuid>,
    /// Referenced project title at send time.
    pub project_title: Option<String>,
    /// Whether the recipient has read the message.
    pub read: bool,
    /// Whether this message is a friend request.
    pub friend_request: bool,
    /// When the message was sent.
    pub sent_at: DateTime<Utc>,
}

impl InboxMessage {
    /// Creates a new message.
    pub fn new(sender: SenderSnapshot, recipient_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            recipient_id,
            project_id: None,
            project_title: None,
            read: false,
            friend_request: false,
            sent_at: Utc::now(),
        }
    }

    /// Attaches project context.
    pub fn with_project(mut self, project_id: Uuid, project_title: impl Into<String>) -> Self {
        self.project_id = Some(project_id);
        self.project_title = Some(project_title.into());
        self
    }

    /// Marks the message as a friend request.
    pub fn as_friend_request(mut self) -> Self {
        self.friend_request = true;
        self
    }
}
