//! User-related entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{InboxMessage, ProjectSummary};

/// A salted password digest.
///
/// The salt is stored alongside the digest so that a candidate password can
/// be rehashed with the same parameters and compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRecord {
    /// Salt the digest was computed with.
    pub salt: String,
    /// The password digest.
    pub hash: String,
}

impl PasswordRecord {
    /// Creates a new password record.
    pub fn new(salt: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
            hash: hash.into(),
        }
    }
}

/// The profile subdocument embedded in a [`User`].
///
/// Several independent endpoint families mutate disjoint parts of this
/// struct (account, friends, messages, projects); every write goes through
/// a whole-document `update_user`, so there is no single writer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Free-form about text.
    pub about: String,
    /// Favorite author names, ordered.
    pub authors: Vec<String>,
    /// Favorite book titles, ordered.
    pub books: Vec<String>,
    /// Snapshots of projects this user owns.
    pub own_projects: Vec<ProjectSummary>,
    /// Snapshots of projects this user collaborates on.
    pub collaborating_projects: Vec<ProjectSummary>,
    /// Inbox messages, newest first.
    pub messages: Vec<InboxMessage>,
    /// Ids of accepted friends.
    pub friends: Vec<Uuid>,
    /// Ids of users this user has blocked.
    pub blocked_users: Vec<Uuid>,
}

impl Profile {
    /// Returns true if `user_id` is in this profile's friends list.
    pub fn is_friend(&self, user_id: Uuid) -> bool {
        self.friends.contains(&user_id)
    }

    /// Returns true if this profile's owner has blocked `user_id`.
    pub fn has_blocked(&self, user_id: Uuid) -> bool {
        self.blocked_users.contains(&user_id)
    }

    /// Returns true if a project with `project_id` appears among the owned
    /// project snapshots.
    pub fn owns_project(&self, project_id: Uuid) -> bool {
        self.own_projects.iter().any(|p| p.project_id == project_id)
    }

    /// Removes the owned-project snapshot matching `project_id`, if any.
    pub fn remove_own_project(&mut self, project_id: Uuid) -> bool {
        let before = self.own_projects.len();
        self.own_projects.retain(|p| p.project_id != project_id);
        self.own_projects.len() != before
    }

    /// Removes the collaborating-project snapshot matching `project_id`,
    /// if any.
    pub fn remove_collaborating_project(&mut self, project_id: Uuid) -> bool {
        let before = self.collaborating_projects.len();
        self.collaborating_projects
            .retain(|p| p.project_id != project_id);
        self.collaborating_projects.len() != before
    }

    /// Prepends an inbox message (newest first).
    pub fn push_message(&mut self, message: InboxMessage) {
        self.messages.insert(0, message);
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Email address, globally unique.
    pub email: String,
    /// Username, globally unique.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Avatar URI.
    pub avatar_url: String,
    /// Live password record.
    pub password: PasswordRecord,
    /// Every password this account has ever had, oldest first. Append-only;
    /// the last entry always equals `password`.
    pub password_history: Vec<PasswordRecord>,
    /// Profile subdocument.
    pub profile: Profile,
    /// Whether registration has been completed.
    pub is_registered: bool,
    /// Advisory login flag. Flipped by login/logout but never consulted for
    /// authorization; session existence is the real login state.
    pub is_logged_in: bool,
    /// Whether the profile is visible to other users.
    pub profile_visible: bool,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with the history seeded with exactly the live
    /// password record.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        name: impl Into<String>,
        password: PasswordRecord,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            name: name.into(),
            avatar_url: String::new(),
            password_history: vec![password.clone()],
            password,
            profile: Profile::default(),
            is_registered: true,
            is_logged_in: false,
            profile_visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the avatar URI.
    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = avatar_url.into();
        self
    }

    /// Replaces the live password and appends it to the history.
    pub fn set_password(&mut self, password: PasswordRecord) {
        self.password_history.push(password.clone());
        self.password = password;
        self.updated_at = Utc::now();
    }

    /// Refreshes the updated timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A transient pre-registration record, keyed by a hashed bearer token.
///
/// Promoted to a [`User`] by registration completion, at which point the
/// sensitive fields are nulled in place; the row itself is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreRegistration {
    /// Unique identifier.
    pub id: Uuid,
    /// Email address pending confirmation.
    pub email: Option<String>,
    /// Display name pending confirmation.
    pub name: Option<String>,
    /// Username pending confirmation.
    pub username: Option<String>,
    /// Salted password hash pending confirmation.
    pub password: Option<PasswordRecord>,
    /// SHA-256 hash of the single-use confirmation token. The raw token is
    /// never stored.
    pub token_hash: Option<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl PreRegistration {
    /// Creates a new pre-registration.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        password: PasswordRecord,
        token_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: Some(email.into()),
            name: Some(name.into()),
            username: Some(username.into()),
            password: Some(password),
            token_hash: Some(token_hash.into()),
            created_at: Utc::now(),
        }
    }

    /// Nulls the sensitive fields after promotion to a user.
    pub fn redeem(&mut self) {
        self.email = None;
        self.name = None;
        self.username = None;
        self.password = None;
        self.token_hash = None;
    }
}
