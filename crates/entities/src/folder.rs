//! Project folder entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Denormalized child snapshot embedded in a folder's item list.
///
/// Index metadata only; content edits to the canonical file are not
/// mirrored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderItem {
    /// Id of the canonical file or folder.
    pub item_id: Uuid,
    /// Label at snapshot time.
    pub label: String,
    /// True for leaf files, false for folders and the root pseudo-file.
    pub file: bool,
    /// URL path at snapshot time.
    pub url_path: String,
}

/// A folder within a project.
///
/// Exactly one folder per project has `admin_folder` set (the master
/// folder, created with the project); exactly one folder per
/// (project, user) pair has `user_base_folder` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFolder {
    /// Unique identifier.
    pub id: Uuid,
    /// Join key to the owning project.
    pub project_id: Uuid,
    /// User this folder belongs to.
    pub owner_id: Uuid,
    /// Display label.
    pub label: String,
    /// Always true; distinguishes folder rows from file rows in mixed
    /// listings.
    pub folder: bool,
    /// True for the single master folder of the project.
    pub admin_folder: bool,
    /// True for the per-(project, user) personal folder.
    pub user_base_folder: bool,
    /// Denormalized child snapshots.
    pub items: Vec<FolderItem>,
    /// Parent folder, if nested.
    pub parent_id: Option<Uuid>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ProjectFolder {
    /// Creates a plain folder.
    pub fn new(
        project_id: Uuid,
        owner_id: Uuid,
        label: impl Into<String>,
        parent_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            owner_id,
            label: label.into(),
            folder: true,
            admin_folder: false,
            user_base_folder: false,
            items: Vec::new(),
            parent_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the master folder for a project.
    pub fn admin(project_id: Uuid, owner_id: Uuid, label: impl Into<String>) -> Self {
        let mut folder = Self::new(project_id, owner_id, label, None);
        folder.admin_folder = true;
        folder
    }

    /// Creates the personal base folder for a (project, user) pair.
    pub fn user_base(project_id: Uuid, owner_id: Uuid, label: impl Into<String>) -> Self {
        let mut folder = Self::new(project_id, owner_id, label, None);
        folder.user_base_folder = true;
        folder
    }

    /// Appends a child snapshot.
    pub fn push_item(&mut self, item: FolderItem) {
        self.items.push(item);
        self.updated_at = Utc::now();
    }

    /// Removes the child snapshot for `item_id`, if present.
    pub fn remove_item(&mut self, item_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.item_id != item_id);
        if self.items.len() != before {
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_flags() {
        let project_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();

        let admin = ProjectFolder::admin(project_id, owner_id, "Master");
        assert!(admin.folder);
        assert!(admin.admin_folder);
        assert!(!admin.user_base_folder);

        let base = ProjectFolder::user_base(project_id, owner_id, "alice");
        assert!(base.user_base_folder);
        assert!(!base.admin_folder);

        let plain = ProjectFolder::new(project_id, owner_id, "Drafts", Some(base.id));
        assert!(!plain.admin_folder);
        assert_eq!(plain.parent_id, Some(base.id));
    }

    #[test]
    fn test_item_snapshots() {
        let mut folder = ProjectFolder::new(Uuid::new_v4(), Uuid::new_v4(), "Drafts", None);
        let item_id = Uuid::new_v4();
        folder.push_item(FolderItem {
            item_id,
            label: "chapter-1".to_string(),
            file: true,
            url_path: "/files/chapter-1".to_string(),
        });

        assert_eq!(folder.items.len(), 1);
        assert!(folder.remove_item(item_id));
        assert!(folder.items.is_empty());
        assert!(!folder.remove_item(item_id));
    }
}
