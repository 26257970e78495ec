//! In-memory document store implementation.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use entities::{ChatRoom, PreRegistration, Project, ProjectFile, ProjectFolder, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{DocStore, DocStoreError, DocStoreResult};

/// In-memory document store for tests and single-process mode.
#[derive(Debug, Default)]
pub struct MemoryDocStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    pre_registrations: Arc<RwLock<HashMap<Uuid, PreRegistration>>>,
    projects: Arc<RwLock<HashMap<Uuid, Project>>>,
    folders: Arc<RwLock<HashMap<Uuid, ProjectFolder>>>,
    files: Arc<RwLock<HashMap<Uuid, ProjectFile>>>,
    chat_rooms: Arc<RwLock<HashMap<Uuid, ChatRoom>>>,
}

impl MemoryDocStore {
    /// Creates a new in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocStore for MemoryDocStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> DocStoreResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(DocStoreError::already_exists("User", user.id.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> DocStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> DocStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> DocStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn update_user(&self, user: User) -> DocStoreResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(DocStoreError::not_found("User", user.id.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> DocStoreResult<()> {
        let mut users = self.users.write().await;
        if users.remove(&id).is_none() {
            return Err(DocStoreError::not_found("User", id.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // Pre-registration operations
    // =========================================================================

    async fn create_pre_registration(
        &self,
        pre: PreRegistration,
    ) -> DocStoreResult<PreRegistration> {
        let mut pres = self.pre_registrations.write().await;
        if pres.contains_key(&pre.id) {
            return Err(DocStoreError::already_exists(
                "PreRegistration",
                pre.id.to_string(),
            ));
        }
        pres.insert(pre.id, pre.clone());
        Ok(pre)
    }

    async fn get_pre_registration_by_token_hash(
        &self,
        token_hash: &str,
    ) -> DocStoreResult<Option<PreRegistration>> {
        let pres = self.pre_registrations.read().await;
        Ok(pres
            .values()
            .find(|p| p.token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn get_pre_registration_by_email(
        &self,
        email: &str,
    ) -> DocStoreResult<Option<PreRegistration>> {
        let pres = self.pre_registrations.read().await;
        Ok(pres
            .values()
            .find(|p| p.email.as_deref() == Some(email))
            .cloned())
    }

    async fn get_pre_registration_by_username(
        &self,
        username: &str,
    ) -> DocStoreResult<Option<PreRegistration>> {
        let pres = self.pre_registrations.read().await;
        Ok(pres
            .values()
            .find(|p| p.username.as_deref() == Some(username))
            .cloned())
    }

    async fn update_pre_registration(
        &self,
        pre: PreRegistration,
    ) -> DocStoreResult<PreRegistration> {
        let mut pres = self.pre_registrations.write().await;
        if !pres.contains_key(&pre.id) {
            return Err(DocStoreError::not_found(
                "PreRegistration",
                pre.id.to_string(),
            ));
        }
        pres.insert(pre.id, pre.clone());
        Ok(pre)
    }

    // =========================================================================
    // Project operations
    // =========================================================================

    async fn create_project(&self, project: Project) -> DocStoreResult<Project> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.id) {
            return Err(DocStoreError::already_exists(
                "Project",
                project.id.to_string(),
            ));
        }
        projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> DocStoreResult<Option<Project>> {
        let projects = self.projects.read().await;
        Ok(projects.get(&id).cloned())
    }

    async fn get_project_by_project_id(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Option<Project>> {
        let projects = self.projects.read().await;
        Ok(projects
            .values()
            .find(|p| p.project_id == project_id)
            .cloned())
    }

    async fn list_projects_by_owner(&self, owner_id: Uuid) -> DocStoreResult<Vec<Project>> {
        let projects = self.projects.read().await;
        Ok(projects
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_projects_by_collaborator(
        &self,
        user_id: Uuid,
    ) -> DocStoreResult<Vec<Project>> {
        let projects = self.projects.read().await;
        Ok(projects
            .values()
            .filter(|p| p.collaborators.contains(&user_id))
            .cloned()
            .collect())
    }

    async fn update_project(&self, project: Project) -> DocStoreResult<Project> {
        let mut projects = self.projects.write().await;
        if !projects.contains_key(&project.id) {
            return Err(DocStoreError::not_found("Project", project.id.to_string()));
        }
        projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> DocStoreResult<()> {
        let mut projects = self.projects.write().await;
        if projects.remove(&id).is_none() {
            return Err(DocStoreError::not_found("Project", id.to_string()));
        }
        Ok(())
    }

    async fn add_project_collaborator(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DocStoreResult<Project> {
        // Membership check and append under one write lock.
        let mut projects = self.projects.write().await;
        let project = projects
            .values_mut()
            .find(|p| p.project_id == project_id)
            .ok_or_else(|| DocStoreError::not_found("Project", project_id.to_string()))?;
        if project.collaborators.contains(&user_id) {
            return Err(DocStoreError::already_exists(
                "Collaborator",
                user_id.to_string(),
            ));
        }
        project.collaborators.push(user_id);
        project.touch();
        Ok(project.clone())
    }

    async fn remove_project_collaborator(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> DocStoreResult<Project> {
        let mut projects = self.projects.write().await;
        let project = projects
            .values_mut()
            .find(|p| p.project_id == project_id)
            .ok_or_else(|| DocStoreError::not_found("Project", project_id.to_string()))?;
        project.collaborators.retain(|c| *c != user_id);
        project.touch();
        Ok(project.clone())
    }

    // =========================================================================
    // Folder operations
    // =========================================================================

    async fn create_folder(&self, folder: ProjectFolder) -> DocStoreResult<ProjectFolder> {
        let mut folders = self.folders.write().await;
        if folders.contains_key(&folder.id) {
            return Err(DocStoreError::already_exists(
                "ProjectFolder",
                folder.id.to_string(),
            ));
        }
        folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn get_folder(&self, id: Uuid) -> DocStoreResult<Option<ProjectFolder>> {
        let folders = self.folders.read().await;
        Ok(folders.get(&id).cloned())
    }

    async fn list_folders_by_project(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Vec<ProjectFolder>> {
        let folders = self.folders.read().await;
        Ok(folders
            .values()
            .filter(|f| f.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_folder(&self, folder: ProjectFolder) -> DocStoreResult<ProjectFolder> {
        let mut folders = self.folders.write().await;
        if !folders.contains_key(&folder.id) {
            return Err(DocStoreError::not_found(
                "ProjectFolder",
                folder.id.to_string(),
            ));
        }
        folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn delete_folder(&self, id: Uuid) -> DocStoreResult<()> {
        let mut folders = self.folders.write().await;
        if folders.remove(&id).is_none() {
            return Err(DocStoreError::not_found("ProjectFolder", id.to_string()));
        }
        Ok(())
    }

    async fn delete_folders_by_project(&self, project_id: Uuid) -> DocStoreResult<usize> {
        let mut folders = self.folders.write().await;
        let before = folders.len();
        folders.retain(|_, f| f.project_id != project_id);
        Ok(before - folders.len())
    }

    // =========================================================================
    // File operations
    // =========================================================================

    async fn create_file(&self, file: ProjectFile) -> DocStoreResult<ProjectFile> {
        let mut files = self.files.write().await;
        if files.contains_key(&file.id) {
            return Err(DocStoreError::already_exists(
                "ProjectFile",
                file.id.to_string(),
            ));
        }
        files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn get_file(&self, id: Uuid) -> DocStoreResult<Option<ProjectFile>> {
        let files = self.files.read().await;
        Ok(files.get(&id).cloned())
    }

    async fn list_files_by_project(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Vec<ProjectFile>> {
        let files = self.files.read().await;
        Ok(files
            .values()
            .filter(|f| f.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_file(&self, file: ProjectFile) -> DocStoreResult<ProjectFile> {
        let mut files = self.files.write().await;
        if !files.contains_key(&file.id) {
            return Err(DocStoreError::not_found("ProjectFile", file.id.to_string()));
        }
        files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn delete_files_by_project(&self, project_id: Uuid) -> DocStoreResult<usize> {
        let mut files = self.files.write().await;
        let before = files.len();
        files.retain(|_, f| f.project_id != project_id);
        Ok(before - files.len())
    }

    // =========================================================================
    // Chat room operations
    // =========================================================================

    async fn create_chat_room(&self, room: ChatRoom) -> DocStoreResult<ChatRoom> {
        let mut rooms = self.chat_rooms.write().await;
        if rooms.values().any(|r| r.project_id == room.project_id) {
            return Err(DocStoreError::already_exists(
                "ChatRoom",
                room.project_id.to_string(),
            ));
        }
        rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn get_chat_room_by_project(
        &self,
        project_id: Uuid,
    ) -> DocStoreResult<Option<ChatRoom>> {
        let rooms = self.chat_rooms.read().await;
        Ok(rooms.values().find(|r| r.project_id == project_id).cloned())
    }

    async fn update_chat_room(&self, room: ChatRoom) -> DocStoreResult<ChatRoom> {
        let mut rooms = self.chat_rooms.write().await;
        if !rooms.contains_key(&room.id) {
            return Err(DocStoreError::not_found("ChatRoom", room.id.to_string()));
        }
        rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn delete_chat_room_by_project(&self, project_id: Uuid) -> DocStoreResult<bool> {
        let mut rooms = self.chat_rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, r| r.project_id != project_id);
        Ok(rooms.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities::{OwnerSnapshot, PasswordRecord};

    fn user(name: &str) -> User {
        User::new(
            format!("{name}@example.com"),
            name,
            name,
            PasswordRecord::new("salt", "hash"),
        )
    }

    #[tokio::test]
    async fn test_user_crud() {
        let store = MemoryDocStore::new();
        let alice = store.create_user(user("alice")).await.unwrap();

        assert!(store.get_user(alice.id).await.unwrap().is_some());
        assert!(store
            .get_user_by_email("alice@example.com")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_user_by_username("alice")
            .await
            .unwrap()
            .is_some());
        assert!(store.get_user_by_username("bob").await.unwrap().is_none());

        store.delete_user(alice.id).await.unwrap();
        assert!(store.get_user(alice.id).await.unwrap().is_none());
        assert!(store.delete_user(alice.id).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_user_id_rejected() {
        let store = MemoryDocStore::new();
        let alice = store.create_user(user("alice")).await.unwrap();
        let result = store.create_user(alice).await;
        assert!(matches!(result, Err(e) if e.is_already_exists()));
    }

    #[tokio::test]
    async fn test_project_lookup_by_join_key() {
        let store = MemoryDocStore::new();
        let owner_id = Uuid::new_v4();
        let project = store
            .create_project(Project::new(
                owner_id,
                OwnerSnapshot::new("Alice", ""),
                "My Book",
            ))
            .await
            .unwrap();

        let by_key = store
            .get_project_by_project_id(project.project_id)
            .await
            .unwrap();
        assert_eq!(by_key.unwrap().id, project.id);

        let owned = store.list_projects_by_owner(owner_id).await.unwrap();
        assert_eq!(owned.len(), 1);
    }

    #[tokio::test]
    async fn test_add_collaborator_is_conditional() {
        let store = MemoryDocStore::new();
        let project = store
            .create_project(Project::new(
                Uuid::new_v4(),
                OwnerSnapshot::new("Alice", ""),
                "My Book",
            ))
            .await
            .unwrap();
        let bob = Uuid::new_v4();

        let updated = store
            .add_project_collaborator(project.project_id, bob)
            .await
            .unwrap();
        assert_eq!(updated.collaborators, vec![bob]);

        // A second append for the same pair must fail, not duplicate.
        let result = store.add_project_collaborator(project.project_id, bob).await;
        assert!(matches!(result, Err(e) if e.is_already_exists()));

        let listed = store.list_projects_by_collaborator(bob).await.unwrap();
        assert_eq!(listed.len(), 1);

        let removed = store
            .remove_project_collaborator(project.project_id, bob)
            .await
            .unwrap();
        assert!(removed.collaborators.is_empty());
    }

    #[tokio::test]
    async fn test_folder_and_file_cascade_deletes() {
        let store = MemoryDocStore::new();
        let project_id = Uuid::new_v4();
        let other_project = Uuid::new_v4();
        let owner_id = Uuid::new_v4();

        let folder = store
            .create_folder(ProjectFolder::admin(project_id, owner_id, "Master"))
            .await
            .unwrap();
        store
            .create_folder(ProjectFolder::user_base(other_project, owner_id, "alice"))
            .await
            .unwrap();
        store
            .create_file(ProjectFile::new(project_id, folder.id, owner_id, "ch-1"))
            .await
            .unwrap();

        assert_eq!(store.delete_folders_by_project(project_id).await.unwrap(), 1);
        assert_eq!(store.delete_files_by_project(project_id).await.unwrap(), 1);
        assert_eq!(store.delete_folders_by_project(project_id).await.unwrap(), 0);
        assert_eq!(
            store
                .list_folders_by_project(other_project)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_one_chat_room_per_project() {
        let store = MemoryDocStore::new();
        let project_id = Uuid::new_v4();

        store.create_chat_room(ChatRoom::new(project_id)).await.unwrap();
        let result = store.create_chat_room(ChatRoom::new(project_id)).await;
        assert!(matches!(result, Err(e) if e.is_already_exists()));

        assert!(store.delete_chat_room_by_project(project_id).await.unwrap());
        assert!(!store.delete_chat_room_by_project(project_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_pre_registration_lookup_by_token_hash() {
        let store = MemoryDocStore::new();
        let pre = PreRegistration::new(
            "bob@example.com",
            "Bob",
            "bob",
            PasswordRecord::new("salt", "hash"),
            "token-hash",
        );
        store.create_pre_registration(pre.clone()).await.unwrap();

        let found = store
            .get_pre_registration_by_token_hash("token-hash")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, pre.id);

        let mut redeemed = pre;
        redeemed.redeem();
        store.update_pre_registration(redeemed).await.unwrap();

        // Redeemed rows no longer match by token or by email.
        assert!(store
            .get_pre_registration_by_token_hash("token-hash")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_pre_registration_by_email("bob@example.com")
            .await
            .unwrap()
            .is_none());
    }
}
