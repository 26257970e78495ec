//! Project file entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::FolderItem;

/// A file within a project.
///
/// `file` is true for ordinary leaf files and false for the single
/// master/root pseudo-file created with the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Unique identifier.
    pub id: Uuid,
    /// Join key to the owning project.
    pub project_id: Uuid,
    /// Containing folder.
    pub parent_id: Option<Uuid>,
    /// User that created the file.
    pub owner_id: Uuid,
    /// Display label.
    pub label: String,
    /// True for leaf files, false for the root pseudo-file.
    pub file: bool,
    /// Content blob. Saved last-writer-wins, no version token.
    pub content: String,
    /// Canonical URL path.
    pub url_path: String,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ProjectFile {
    /// Creates a leaf file inside `parent_id`.
    pub fn new(
        project_id: Uuid,
        parent_id: Uuid,
        owner_id: Uuid,
        label: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Self {
            id,
            project_id,
            parent_id: Some(parent_id),
            owner_id,
            label: label.into(),
            file: true,
            content: String::new(),
            url_path: format!("/files/{id}"),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the master/root pseudo-file for a project.
    pub fn root(project_id: Uuid, owner_id: Uuid, label: impl Into<String>) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Self {
            id,
            project_id,
            parent_id: None,
            owner_id,
            label: label.into(),
            file: false,
            content: String::new(),
            url_path: format!("/files/{id}"),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the initial content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Produces the denormalized snapshot embedded in the parent folder.
    pub fn as_item(&self) -> FolderItem {
        FolderItem {
            item_id: self.id,
            label: self.label.clone(),
            file: self.file,
            url_path: self.url_path.clone(),
        }
    }
}
