//! Client-facing projections of the canonical entities.
//!
//! Ids travel as strings on the wire. Inbox message text never appears in
//! a profile projection; decrypted text is only filled in by the messages
//! endpoint itself, so ciphertext can never leak to a client.

use chrono::{DateTime, Utc};
use entities::{InboxMessage, PasswordRecord, Profile, ProjectSummary, User};
use serde::{Deserialize, Serialize};

/// Redacted user view returned by registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
}

impl UserView {
    /// Projects a user with password material redacted.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at: user.created_at,
        }
    }
}

/// A past password entry exposed in the session view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHistoryEntry {
    pub salt: String,
    pub hash: String,
}

impl From<&PasswordRecord> for PasswordHistoryEntry {
    fn from(record: &PasswordRecord) -> Self {
        Self {
            salt: record.salt.clone(),
            hash: record.hash.clone(),
        }
    }
}

/// Denormalized project listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummaryView {
    pub project_id: String,
    pub title: String,
    pub author: String,
    pub genres: Vec<String>,
    pub description: String,
    pub cover_image: String,
    pub url_path: String,
}

impl From<&ProjectSummary> for ProjectSummaryView {
    fn from(summary: &ProjectSummary) -> Self {
        Self {
            project_id: summary.project_id.to_string(),
            title: summary.title.clone(),
            author: summary.author.clone(),
            genres: summary.genres.clone(),
            description: summary.description.clone(),
            cover_image: summary.cover_image.clone(),
            url_path: summary.url_path.clone(),
        }
    }
}

/// Message sender fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderView {
    pub id: String,
    pub name: String,
}

/// An inbox message as shown to its recipient.
///
/// `text` is `None` in profile projections and holds the decrypted body
/// only when produced by the messages endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxMessageView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub sender: SenderView,
    pub recipient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,
    pub read: bool,
    pub friend_request: bool,
    pub sent_at: DateTime<Utc>,
}

impl InboxMessageView {
    /// Projects a message with its body withheld.
    pub fn redacted(message: &InboxMessage) -> Self {
        Self {
            id: message.id.to_string(),
            text: None,
            sender: SenderView {
                id: message.sender.id.to_string(),
                name: message.sender.name.clone(),
            },
            recipient_id: message.recipient_id.to_string(),
            project_id: message.project_id.map(|id| id.to_string()),
            project_title: message.project_title.clone(),
            read: message.read,
            friend_request: message.friend_request,
            sent_at: message.sent_at,
        }
    }

    /// Projects a message with a decrypted body.
    pub fn with_text(message: &InboxMessage, text: impl Into<String>) -> Self {
        let mut view = Self::redacted(message);
        view.text = Some(text.into());
        view
    }
}

/// Profile projection embedded in the session view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub about: String,
    pub authors: Vec<String>,
    pub books: Vec<String>,
    pub own_projects: Vec<ProjectSummaryView>,
    pub collaborating_projects: Vec<ProjectSummaryView>,
    pub messages: Vec<InboxMessageView>,
    pub friends: Vec<String>,
    pub blocked_users: Vec<String>,
}

impl ProfileView {
    /// Projects a profile. Message bodies are withheld.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            about: profile.about.clone(),
            authors: profile.authors.clone(),
            books: profile.books.clone(),
            own_projects: profile.own_projects.iter().map(Into::into).collect(),
            collaborating_projects: profile
                .collaborating_projects
                .iter()
                .map(Into::into)
                .collect(),
            messages: profile
                .messages
                .iter()
                .map(InboxMessageView::redacted)
                .collect(),
            friends: profile.friends.iter().map(|id| id.to_string()).collect(),
            blocked_users: profile
                .blocked_users
                .iter()
                .map(|id| id.to_string())
                .collect(),
        }
    }
}

/// The session view: a redacted, recomputed projection of a user record
/// exposed to an authenticated client.
///
/// `is_logged_in` is always true here: a session view only exists for a
/// live session, and session existence is the login state. The persisted
/// flag on the user record is advisory telemetry and is not consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub user_id: String,
    pub avatar_url: String,
    pub name: String,
    pub username: String,
    pub password_history: Vec<PasswordHistoryEntry>,
    pub email: String,
    pub profile: ProfileView,
    pub is_registered: bool,
    pub is_logged_in: bool,
    pub auth_token: String,
    /// One-shot marker set after a password change, consumed by the next
    /// session read.
    #[serde(default)]
    pub password_updated: bool,
}

impl SessionView {
    /// Pure projection of a user record into a session view.
    ///
    /// Must be recomputed, never incrementally patched, after any user
    /// mutation that should be visible to the client.
    pub fn project(user: &User, auth_token: impl Into<String>) -> Self {
        Self {
            user_id: user.id.to_string(),
            avatar_url: user.avatar_url.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            password_history: user.password_history.iter().map(Into::into).collect(),
            email: user.email.clone(),
            profile: ProfileView::from_profile(&user.profile),
            is_registered: user.is_registered,
            is_logged_in: true,
            auth_token: auth_token.into(),
            password_updated: false,
        }
    }
}

/// Public profile as shown to other users.
///
/// When the owner has hidden their profile only the identifying fields
/// are populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfileView {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
    pub profile_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub books: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_projects: Option<Vec<ProjectSummaryView>>,
}

impl PublicProfileView {
    /// Projects a user's public profile, honoring the visibility flag.
    pub fn from_user(user: &User) -> Self {
        if !user.profile_visible {
            return Self {
                id: user.id.to_string(),
                name: user.name.clone(),
                avatar_url: user.avatar_url.clone(),
                profile_visible: false,
                about: None,
                authors: None,
                books: None,
                own_projects: None,
            };
        }
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            profile_visible: true,
            about: Some(user.profile.about.clone()),
            authors: Some(user.profile.authors.clone()),
            books: Some(user.profile.books.clone()),
            own_projects: Some(
                user.profile.own_projects.iter().map(Into::into).collect(),
            ),
        }
    }
}

/// Denormalized owner fields on a project view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerView {
    pub name: String,
    pub avatar_url: String,
}

/// A full project document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectView {
    pub id: String,
    pub project_id: String,
    pub owner_id: String,
    pub owner: OwnerView,
    pub title: String,
    pub author: String,
    pub genres: Vec<String>,
    pub description: String,
    pub cover_image: String,
    pub collaborators: Vec<String>,
    pub published: bool,
    pub content: String,
    pub url_path: String,
    pub modified_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A folder item snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderItemView {
    pub item_id: String,
    pub label: String,
    pub file: bool,
    pub url_path: String,
}

/// A project folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderView {
    pub id: String,
    pub project_id: String,
    pub owner_id: String,
    pub label: String,
    pub folder: bool,
    pub admin_folder: bool,
    pub user_base_folder: bool,
    pub items: Vec<FolderItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// A project file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileView {
    pub id: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub owner_id: String,
    pub label: String,
    pub file: bool,
    pub content: String,
    pub url_path: String,
    pub updated_at: DateTime<Utc>,
}

/// A chat log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageView {
    pub sender: SenderView,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities::SenderSnapshot;
    use uuid::Uuid;

    fn user() -> User {
        let mut user = User::new(
            "alice@example.com",
            "alice",
            "Alice",
            PasswordRecord::new("salt", "hash"),
        );
        user.profile.push_message(InboxMessage::new(
            SenderSnapshot::new(Uuid::new_v4(), "Bob"),
            user.id,
            "ciphertext-blob",
        ));
        user
    }

    #[test]
    fn test_projection_is_idempotent() {
        let user = user();
        let first = SessionView::project(&user, "token");
        let second = SessionView::project(&user, "token");

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_projection_forces_logged_in() {
        let mut user = user();
        user.is_logged_in = false;
        let view = SessionView::project(&user, "token");

        assert!(view.is_logged_in);
        assert_eq!(view.auth_token, "token");
    }

    #[test]
    fn test_profile_projection_withholds_ciphertext() {
        let user = user();
        let view = SessionView::project(&user, "token");

        assert_eq!(view.profile.messages.len(), 1);
        assert!(view.profile.messages[0].text.is_none());
    }

    #[test]
    fn test_hidden_profile_is_reduced() {
        let mut user = user();
        user.profile_visible = false;
        let view = PublicProfileView::from_user(&user);

        assert!(!view.profile_visible);
        assert!(view.about.is_none());
        assert!(view.own_projects.is_none());
        assert_eq!(view.name, "Alice");
    }
}
