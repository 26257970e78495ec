//! Document store trait definitions.

use async_trait::async_trait;
use entities::{ChatRoom, PreRegistration, Project, ProjectFile, ProjectFolder, User};
use uuid::Uuid;

use crate::DocStoreResult;

/// Trait for document storage operations.
///
/// Lookups are by storage id or by field equality. A single document
/// write is atomic; sequences of writes are not, and no multi-document
/// transaction is assumed available.
#[async_trait]
pub trait DocStore: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Creates a new user.
    async fn create_user(&self, user: User) -> DocStoreResult<User>;

    /// Gets a user by ID.
    async fn get_user(&self, id: Uuid) -> DocStoreResult<Option<User>>;

    /// Gets a user by email.
    async fn get_user_by_email(&self, email: &str) -> DocStoreResult<Option<User>>;

    /// Gets a user by username.
    async fn get_user_by_username(&self, username: &str) -> DocStoreResult<Option<User>>;

    /// Updates a user (whole-document replace).
    async fn update_user(&self, user: User) -> DocStoreResult<User>;

    /// Deletes a user.
    async fn delete_user(&self, id: Uuid) -> DocStoreResult<()>;

    // =========================================================================
    // Pre-registration operations
    // =========================================================================

    /// Creates a new pre-registration.
    async fn create_pre_registration(
        &self,
        pre: PreRegistration,
    ) -> DocStoreResult<PreRegistration>;

    /// Gets a pre-registration by the hash of its confirmation token.
    async fn get_pre_registration_by_token_hash(
        &self,
        token_hash: &str,
    ) -> DocStoreResult<Option<PreRegistration>>;

    /// Gets a pending (unredeemed) pre-registration by email.
    async fn get_pre_registration_by_email(
        &self,
        email: &str,
    ) -> DocStoreResult<Option<PreRegistration>>;

    /// Gets a pending (unredeemed) pre-registration by username.
    async fn get_pre_registration_by_username(
        &self,
        username: &str,
    ) -> DocStoreResult<Option<PreRegistration>>;

    /// Updates a pre-registration (whole-document replace).
    async fn update_pre_registration(
        &self,
        pre: PreRegistration,
    ) -> DocStoreResult<PreRegistration>;

    // =========================================================================
    // Project operations
    // =========================================================================

    /// Creates a new project.
    async fn create_project(&self, project: Project) -> DocStoreResult<Project>;

    /// Gets a project by storage ID.
    async fn get_project(&self, id: Uuid) -> DocStoreResult<Option<Project>>;

    /// Gets a project by its stable join key.
    async fn get_project_by_project_id(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Option<Project>>;

    /// Lists projects owned by a user.
    async fn list_projects_by_owner(&self, owner_id: Uuid) -> DocStoreResult<Vec<Project>>;

    /// Lists projects a user collaborates on.
    async fn list_projects_by_collaborator(
        &self,
        user_id: Uuid,
    ) -> DocStoreResult<Vec<Project>>;

    /// Updates a project (whole-document replace).
    async fn update_project(&self, project: Project) -> DocStoreResult<Project>;

    /// Deletes a project by storage ID.
    async fn delete_project(&self, id: Uuid) -> DocStoreResult<()>;

    /// Conditionally appends a collaborator to a project, keyed by the
    /// stable join key.
    ///
    /// The membership check and the append happen under one write lock (or
    /// one transaction), closing the duplicate-append race between two
    /// concurrent calls for the same pair. Fails with `AlreadyExists` when
    /// the user is already a collaborator and `NotFound` when the project
    /// is absent. Returns the updated project.
    async fn add_project_collaborator(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DocStoreResult<Project>;

    /// Removes a collaborator from a project, keyed by the stable join
    /// key. Returns the updated project.
    async fn remove_project_collaborator(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DocStoreResult<Project>;

    // =========================================================================
    // Folder operations
    // =========================================================================

    /// Creates a new folder.
    async fn create_folder(&self, folder: ProjectFolder) -> DocStoreResult<ProjectFolder>;

    /// Gets a folder by ID.
    async fn get_folder(&self, id: Uuid) -> DocStoreResult<Option<ProjectFolder>>;

    /// Lists the folders of a project.
    async fn list_folders_by_project(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Vec<ProjectFolder>>;

    /// Updates a folder (whole-document replace).
    async fn update_folder(&self, folder: ProjectFolder) -> DocStoreResult<ProjectFolder>;

    /// Deletes a folder by ID.
    async fn delete_folder(&self, id: Uuid) -> DocStoreResult<()>;

    /// Deletes every folder of a project. Returns the number removed.
    async fn delete_folders_by_project(&self, project_id: Uuid) -> DocStoreResult<usize>;

    // =========================================================================
    // File operations
    // =========================================================================

    /// Creates a new file.
    async fn create_file(&self, file: ProjectFile) -> DocStoreResult<ProjectFile>;

    /// Gets a file by ID.
    async fn get_file(&self, id: Uuid) -> DocStoreResult<Option<ProjectFile>>;

    /// Lists the files of a project.
    async fn list_files_by_project(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Vec<ProjectFile>>;

    /// Updates a file (whole-document replace).
    async fn update_file(&self, file: ProjectFile) -> DocStoreResult<ProjectFile>;

    /// Deletes every file of a project. Returns the number removed.
    async fn delete_files_by_project(&self, project_id: Uuid) -> DocStoreResult<usize>;

    // =========================================================================
    // Chat room operations
    // =========================================================================

    /// Creates a chat room. Fails with `AlreadyExists` when the project
    /// already has one.
    async fn create_chat_room(&self, room: ChatRoom) -> DocStoreResult<ChatRoom>;

    /// Gets the chat room of a project.
    async fn get_chat_room_by_project(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Option<ChatRoom>>;

    /// Updates a chat room (whole-document replace).
    async fn update_chat_room(&self, room: ChatRoom) -> DocStoreResult<ChatRoom>;

    /// Deletes the chat room of a project. Returns true if one existed.
    async fn delete_chat_room_by_project(&self, project_id: Uuid) -> DocStoreResult<bool>;
}
