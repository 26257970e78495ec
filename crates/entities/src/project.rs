//! Project (document) entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Denormalized owner fields embedded in a [`Project`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSnapshot {
    /// Owner display name.
    pub name: String,
    /// Owner avatar URI.
    pub avatar_url: String,
}

impl OwnerSnapshot {
    /// Creates a new owner snapshot.
    pub fn new(name: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar_url: avatar_url.into(),
        }
    }
}

/// A writing project.
///
/// `project_id` is the stable application-level join key shared with
/// [`crate::ProjectFile`], [`crate::ProjectFolder`] and [`crate::ChatRoom`],
/// and with the [`ProjectSummary`] copies embedded in user profiles. It is
/// distinct from the storage id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Storage identifier.
    pub id: Uuid,
    /// Stable cross-entity join key.
    pub project_id: Uuid,
    /// Owning user id.
    pub owner_id: Uuid,
    /// Denormalized owner fields.
    pub owner: OwnerSnapshot,
    /// Title.
    pub title: String,
    /// Author byline.
    pub author: String,
    /// Genres, ordered.
    pub genres: Vec<String>,
    /// Description blurb.
    pub description: String,
    /// Cover image URI.
    pub cover_image: String,
    /// Collaborator user ids. The owner is implicitly a member and never
    /// appears here.
    pub collaborators: Vec<Uuid>,
    /// Whether the project is published.
    pub published: bool,
    /// Free-text content blob.
    pub content: String,
    /// Canonical URL path.
    pub url_path: String,
    /// Last-modified date shown to clients.
    pub modified_at: DateTime<Utc>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project with a fresh join key.
    pub fn new(owner_id: Uuid, owner: OwnerSnapshot, title: impl Into<String>) -> Self {
        let now = Utc::now();
        let project_id = Uuid::new_v4();
        Self {
            id: Uuid::new_v4(),
            project_id,
            owner_id,
            owner,
            title: title.into(),
            author: String::new(),
            genres: Vec::new(),
            description: String::new(),
            cover_image: String::new(),
            collaborators: Vec::new(),
            published: false,
            content: String::new(),
            url_path: format!("/projects/{project_id}"),
            modified_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the author byline.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the genres.
    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the cover image URI.
    pub fn with_cover_image(mut self, cover_image: impl Into<String>) -> Self {
        self.cover_image = cover_image.into();
        self
    }

    /// Returns true if `user_id` is in the collaborator list.
    pub fn is_collaborator(&self, user_id: Uuid) -> bool {
        self.collaborators.contains(&user_id)
    }

    /// Returns true if `user_id` is the owner or a collaborator.
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id || self.is_collaborator(user_id)
    }

    /// Produces the denormalized listing snapshot embedded in profiles.
    ///
    /// Every profile copy of a project must come from here so the copies
    /// cannot drift in shape.
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            project_id: self.project_id,
            title: self.title.clone(),
            author: self.author.clone(),
            genres: self.genres.clone(),
            description: self.description.clone(),
            cover_image: self.cover_image.clone(),
            url_path: self.url_path.clone(),
        }
    }

    /// Refreshes the modified and updated timestamps.
    pub fn touch_modified(&mut self) {
        let now = Utc::now();
        self.modified_at = now;
        self.updated_at = now;
    }

    /// Refreshes the updated timestamp without moving the client-visible
    /// modified date.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Denormalized project listing fields embedded in user profiles.
///
/// A copy, not a reference: metadata updates must be fanned out to every
/// embedded copy or they drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    /// Join key back to the canonical [`Project`].
    pub project_id: Uuid,
    /// Title at snapshot time.
    pub title: String,
    /// Author byline at snapshot time.
    pub author: String,
    /// Genres at snapshot time.
    pub genres: Vec<String>,
    /// Description at snapshot time.
    pub description: String,
    /// Cover image URI at snapshot time.
    pub cover_image: String,
    /// Canonical URL path.
    pub url_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creation() {
        let owner_id = Uuid::new_v4();
        let project = Project::new(owner_id, OwnerSnapshot::new("Alice", ""), "My Book")
            .with_description("A story")
            .with_genres(vec!["fantasy".to_string()]);

        assert_eq!(project.title, "My Book");
        assert_eq!(project.description, "A story");
        assert_ne!(project.id, project.project_id);
        assert!(project.url_path.contains(&project.project_id.to_string()));
        assert!(!project.published);
    }

    #[test]
    fn test_membership() {
        let owner_id = Uuid::new_v4();
        let collaborator = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let mut project = Project::new(owner_id, OwnerSnapshot::new("Alice", ""), "My Book");
        project.collaborators.push(collaborator);

        assert!(project.is_member(owner_id));
        assert!(project.is_member(collaborator));
        assert!(project.is_collaborator(collaborator));
        assert!(!project.is_collaborator(owner_id));
        assert!(!project.is_member(stranger));
    }

    #[test]
    fn test_summary_matches_project_fields() {
        let project = Project::new(Uuid::new_v4(), OwnerSnapshot::new("Alice", ""), "My Book")
            .with_author("A. Author");
        let summary = project.summary();

        assert_eq!(summary.project_id, project.project_id);
        assert_eq!(summary.title, project.title);
        assert_eq!(summary.author, project.author);
        assert_eq!(summary.url_path, project.url_path);
    }
}
