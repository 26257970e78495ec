//! Per-project chat entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SenderSnapshot;

/// A single chat entry. Stored plaintext, unlike inbox messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Denormalized sender fields.
    pub sender: SenderSnapshot,
    /// Message text.
    pub content: String,
    /// When the message was posted.
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a new chat message.
    pub fn new(sender: SenderSnapshot, content: impl Into<String>) -> Self {
        Self {
            sender,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

/// The append-only chat log of a project. One room per project, created
/// lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    /// Unique identifier.
    pub id: Uuid,
    /// Join key to the owning project.
    pub project_id: Uuid,
    /// Messages, oldest first.
    pub messages: Vec<ChatMessage>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ChatRoom {
    /// Creates an empty room for a project.
    pub fn new(project_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_append_order() {
        let mut room = ChatRoom::new(Uuid::new_v4());
        let sender = SenderSnapshot::new(Uuid::new_v4(), "Alice");
        room.push_message(ChatMessage::new(sender.clone(), "first"));
        room.push_message(ChatMessage::new(sender, "second"));

        assert_eq!(room.messages.len(), 2);
        assert_eq!(room.messages[0].content, "first");
        assert_eq!(room.messages[1].content, "second");
    }
}
