//! Projection fan-out and multi-document consistency.
//!
//! Project listing snapshots live embedded in user profiles, folder item
//! snapshots live embedded in their parent folders, and owner snapshots
//! live embedded in project documents. Every fan-out update goes through
//! this module so no handler hand-edits a denormalized copy.
//!
//! The store offers no multi-document transactions. Provisioning steps
//! are idempotent (each checks for an existing row first) so a crashed
//! sequence can be resumed; cascades are best-effort with every failed
//! sub-step logged by name.

use doc_store::DocStore;
use entities::{ChatRoom, OwnerSnapshot, Project, ProjectFile, ProjectFolder, User};
use uuid::Uuid;

use crate::error::ApiResult;

/// Label of the master folder created with every project.
pub const ADMIN_FOLDER_LABEL: &str = "Master";

/// Creates the chat room for a project unless one already exists.
pub async fn ensure_chat_room<S: DocStore>(store: &S, project_id: Uuid) -> ApiResult<()> {
    if store.get_chat_room_by_project(project_id).await?.is_some() {
        return Ok(());
    }
    match store.create_chat_room(ChatRoom::new(project_id)).await {
        Ok(_) => Ok(()),
        // Lost a creation race; the room exists, which is what we wanted.
        Err(e) if e.is_already_exists() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Creates the root pseudo-file and master folder unless they exist.
async fn ensure_admin_folder<S: DocStore>(store: &S, project: &Project) -> ApiResult<()> {
    let folders = store.list_folders_by_project(project.project_id).await?;
    if folders.iter().any(|f| f.admin_folder) {
        return Ok(());
    }

    let root = match store
        .list_files_by_project(project.project_id)
        .await?
        .into_iter()
        .find(|f| !f.file)
    {
        Some(root) => root,
        None => {
            store
                .create_file(ProjectFile::root(
                    project.project_id,
                    project.owner_id,
                    &project.title,
                ))
                .await?
        }
    };

    let mut admin = ProjectFolder::admin(project.project_id, project.owner_id, ADMIN_FOLDER_LABEL);
    admin.push_item(root.as_item());
    store.create_folder(admin).await?;
    Ok(())
}

/// Creates the personal base folder for a (project, user) pair unless it
/// exists.
pub async fn ensure_user_base_folder<S: DocStore>(
    store: &S,
    project_id: Uuid,
    user_id: Uuid,
    label: &str,
) -> ApiResult<()> {
    let folders = store.list_folders_by_project(project_id).await?;
    if folders
        .iter()
        .any(|f| f.user_base_folder && f.owner_id == user_id)
    {
        return Ok(());
    }
    store
        .create_folder(ProjectFolder::user_base(project_id, user_id, label))
        .await?;
    Ok(())
}

/// Fully provisions a new project.
///
/// Five side-effects: the document, the owner's listing snapshot, the
/// chat room, the root file with its master folder, and the owner's base
/// folder. Safe to re-run after a partial failure.
pub async fn provision_project<S: DocStore>(
    store: &S,
    owner: &mut User,
    project: Project,
) -> ApiResult<Project> {
    let project = store.create_project(project).await?;

    if !owner.profile.owns_project(project.project_id) {
        owner.profile.own_projects.push(project.summary());
        owner.touch();
        store.update_user(owner.clone()).await?;
    }

    ensure_chat_room(store, project.project_id).await?;
    ensure_admin_folder(store, &project).await?;
    ensure_user_base_folder(store, project.project_id, owner.id, &owner.username).await?;

    Ok(project)
}

/// Adds a collaborator: conditional membership append, listing snapshot,
/// base folder.
///
/// The append is not rolled back if a later step fails; re-running the
/// later steps is safe.
pub async fn add_collaborator_effects<S: DocStore>(
    store: &S,
    project_id: Uuid,
    collaborator: &mut User,
) -> ApiResult<Project> {
    let project = store
        .add_project_collaborator(project_id, collaborator.id)
        .await?;

    if !collaborator
        .profile
        .collaborating_projects
        .iter()
        .any(|p| p.project_id == project_id)
    {
        collaborator
            .profile
            .collaborating_projects
            .push(project.summary());
        collaborator.touch();
        store.update_user(collaborator.clone()).await?;
    }

    ensure_user_base_folder(store, project_id, collaborator.id, &collaborator.username).await?;

    Ok(project)
}

/// Removes a collaborator: membership, profile snapshot, base folder.
pub async fn remove_collaborator_effects<S: DocStore>(
    store: &S,
    project: &Project,
    user_id: Uuid,
) -> ApiResult<()> {
    store
        .remove_project_collaborator(project.project_id, user_id)
        .await?;

    match store.get_user(user_id).await {
        Ok(Some(mut user)) => {
            if user.profile.remove_collaborating_project(project.project_id) {
                user.touch();
                if let Err(e) = store.update_user(user).await {
                    tracing::error!(
                        project_id = %project.project_id, user_id = %user_id, error = %e,
                        "Collaborator removal step failed: profile snapshot"
                    );
                }
            }
        }
        Ok(None) => {}
        Err(e) => tracing::error!(
            project_id = %project.project_id, user_id = %user_id, error = %e,
            "Collaborator removal step failed: user lookup"
        ),
    }

    let folders = store.list_folders_by_project(project.project_id).await?;
    if let Some(base) = folders
        .into_iter()
        .find(|f| f.user_base_folder && f.owner_id == user_id)
    {
        if let Err(e) = store.delete_folder(base.id).await {
            tracing::warn!(
                project_id = %project.project_id, folder_id = %base.id, error = %e,
                "Collaborator removal step failed: base folder"
            );
        }
    }

    Ok(())
}

/// Fans a project's listing fields out to every embedded profile copy.
pub async fn sync_project_snapshots<S: DocStore>(store: &S, project: &Project) -> ApiResult<()> {
    let summary = project.summary();

    match store.get_user(project.owner_id).await {
        Ok(Some(mut owner)) => {
            let changed = owner
                .profile
                .own_projects
                .iter_mut()
                .find(|p| p.project_id == project.project_id)
                .map(|entry| {
                    let stale = *entry != summary;
                    if stale {
                        *entry = summary.clone();
                    }
                    stale
                })
                .unwrap_or(false);
            if changed {
                owner.touch();
                if let Err(e) = store.update_user(owner).await {
                    tracing::error!(
                        project_id = %project.project_id, user_id = %project.owner_id, error = %e,
                        "Snapshot sync failed: owner profile"
                    );
                }
            }
        }
        Ok(None) => {}
        Err(e) => tracing::error!(
            project_id = %project.project_id, error = %e,
            "Snapshot sync failed: owner lookup"
        ),
    }

    for &collaborator_id in &project.collaborators {
        match store.get_user(collaborator_id).await {
            Ok(Some(mut user)) => {
                let changed = user
                    .profile
                    .collaborating_projects
                    .iter_mut()
                    .find(|p| p.project_id == project.project_id)
                    .map(|entry| {
                        let stale = *entry != summary;
                        if stale {
                            *entry = summary.clone();
                        }
                        stale
                    })
                    .unwrap_or(false);
                if changed {
                    user.touch();
                    if let Err(e) = store.update_user(user).await {
                        tracing::error!(
                            project_id = %project.project_id, user_id = %collaborator_id, error = %e,
                            "Snapshot sync failed: collaborator profile"
                        );
                    }
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!(
                project_id = %project.project_id, user_id = %collaborator_id, error = %e,
                "Snapshot sync failed: collaborator lookup"
            ),
        }
    }

    Ok(())
}

/// Fans a user's name/avatar out to the owner snapshot on every owned
/// project document.
pub async fn sync_owner_snapshots<S: DocStore>(store: &S, owner: &User) -> ApiResult<()> {
    let snapshot = OwnerSnapshot::new(&owner.name, &owner.avatar_url);
    for mut project in store.list_projects_by_owner(owner.id).await? {
        if project.owner != snapshot {
            project.owner = snapshot.clone();
            project.touch();
            if let Err(e) = store.update_project(project).await {
                tracing::error!(
                    user_id = %owner.id, error = %e,
                    "Snapshot sync failed: project owner fields"
                );
            }
        }
    }
    Ok(())
}

/// Cascading project delete.
///
/// Removes files, folders, and the chat room by join key, then splices
/// the listing snapshot out of the owner's and every collaborator's
/// profile, then deletes the document itself. Best-effort: a failed
/// sub-step is logged with its name and the cascade continues.
pub async fn cascade_delete_project<S: DocStore>(store: &S, project: &Project) -> ApiResult<()> {
    let project_id = project.project_id;

    match store.delete_files_by_project(project_id).await {
        Ok(removed) => {
            tracing::debug!(project_id = %project_id, removed, "Cascade: files deleted");
        }
        Err(e) => tracing::error!(
            project_id = %project_id, error = %e,
            "Cascade step failed: files"
        ),
    }

    match store.delete_folders_by_project(project_id).await {
        Ok(removed) => {
            tracing::debug!(project_id = %project_id, removed, "Cascade: folders deleted");
        }
        Err(e) => tracing::error!(
            project_id = %project_id, error = %e,
            "Cascade step failed: folders"
        ),
    }

    if let Err(e) = store.delete_chat_room_by_project(project_id).await {
        tracing::error!(
            project_id = %project_id, error = %e,
            "Cascade step failed: chat room"
        );
    }

    match store.get_user(project.owner_id).await {
        Ok(Some(mut owner)) => {
            if owner.profile.remove_own_project(project_id) {
                owner.touch();
                if let Err(e) = store.update_user(owner).await {
                    tracing::error!(
                        project_id = %project_id, user_id = %project.owner_id, error = %e,
                        "Cascade step failed: owner profile"
                    );
                }
            }
        }
        Ok(None) => {}
        Err(e) => tracing::error!(
            project_id = %project_id, error = %e,
            "Cascade step failed: owner lookup"
        ),
    }

    for &collaborator_id in &project.collaborators {
        match store.get_user(collaborator_id).await {
            Ok(Some(mut user)) => {
                if user.profile.remove_collaborating_project(project_id) {
                    user.touch();
                    if let Err(e) = store.update_user(user).await {
                        tracing::error!(
                            project_id = %project_id, user_id = %collaborator_id, error = %e,
                            "Cascade step failed: collaborator profile"
                        );
                    }
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!(
                project_id = %project_id, user_id = %collaborator_id, error = %e,
                "Cascade step failed: collaborator lookup"
            ),
        }
    }

    store.delete_project(project.id).await?;
    tracing::info!(project_id = %project_id, "Project deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_store::MemoryDocStore;
    use entities::PasswordRecord;

    fn user(name: &str) -> User {
        User::new(
            format!("{name}@example.com"),
            name,
            name,
            PasswordRecord::new("salt", "hash"),
        )
    }

    async fn provisioned(store: &MemoryDocStore, owner: &mut User) -> Project {
        let project = Project::new(
            owner.id,
            OwnerSnapshot::new(&owner.name, &owner.avatar_url),
            "My Book",
        );
        provision_project(store, owner, project).await.unwrap()
    }

    #[tokio::test]
    async fn test_provision_creates_all_side_effects() {
        let store = MemoryDocStore::new();
        let mut alice = store.create_user(user("alice")).await.unwrap();
        let project = provisioned(&store, &mut alice).await;

        // Exactly two folders: the master and the owner's base folder.
        let folders = store
            .list_folders_by_project(project.project_id)
            .await
            .unwrap();
        assert_eq!(folders.len(), 2);
        assert_eq!(folders.iter().filter(|f| f.admin_folder).count(), 1);
        assert_eq!(folders.iter().filter(|f| f.user_base_folder).count(), 1);

        // The master folder indexes the root pseudo-file.
        let admin = folders.iter().find(|f| f.admin_folder).unwrap();
        assert_eq!(admin.items.len(), 1);
        assert!(!admin.items[0].file);

        // Empty chat room exists.
        let room = store
            .get_chat_room_by_project(project.project_id)
            .await
            .unwrap()
            .unwrap();
        assert!(room.messages.is_empty());

        // Owner profile carries the listing snapshot.
        let stored = store.get_user(alice.id).await.unwrap().unwrap();
        assert!(stored.profile.owns_project(project.project_id));
    }

    #[tokio::test]
    async fn test_provision_is_resumable() {
        let store = MemoryDocStore::new();
        let mut alice = store.create_user(user("alice")).await.unwrap();
        let project = provisioned(&store, &mut alice).await;

        // Re-running the ensure steps creates nothing new.
        ensure_chat_room(&store, project.project_id).await.unwrap();
        ensure_admin_folder(&store, &project).await.unwrap();
        ensure_user_base_folder(&store, project.project_id, alice.id, &alice.username)
            .await
            .unwrap();

        let folders = store
            .list_folders_by_project(project.project_id)
            .await
            .unwrap();
        assert_eq!(folders.len(), 2);
        let files = store
            .list_files_by_project(project.project_id)
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_collaborator_round_trip() {
        let store = MemoryDocStore::new();
        let mut alice = store.create_user(user("alice")).await.unwrap();
        let mut bob = store.create_user(user("bob")).await.unwrap();
        let project = provisioned(&store, &mut alice).await;

        let updated = add_collaborator_effects(&store, project.project_id, &mut bob)
            .await
            .unwrap();
        assert!(updated.is_collaborator(bob.id));

        let stored_bob = store.get_user(bob.id).await.unwrap().unwrap();
        assert_eq!(stored_bob.profile.collaborating_projects.len(), 1);

        let folders = store
            .list_folders_by_project(project.project_id)
            .await
            .unwrap();
        assert_eq!(
            folders
                .iter()
                .filter(|f| f.user_base_folder && f.owner_id == bob.id)
                .count(),
            1
        );

        let project = store
            .get_project_by_project_id(project.project_id)
            .await
            .unwrap()
            .unwrap();
        remove_collaborator_effects(&store, &project, bob.id)
            .await
            .unwrap();

        let stored_bob = store.get_user(bob.id).await.unwrap().unwrap();
        assert!(stored_bob.profile.collaborating_projects.is_empty());
        let folders = store
            .list_folders_by_project(project.project_id)
            .await
            .unwrap();
        assert!(!folders.iter().any(|f| f.user_base_folder && f.owner_id == bob.id));
    }

    #[tokio::test]
    async fn test_snapshot_fanout_covers_all_copies() {
        let store = MemoryDocStore::new();
        let mut alice = store.create_user(user("alice")).await.unwrap();
        let mut bob = store.create_user(user("bob")).await.unwrap();
        let project = provisioned(&store, &mut alice).await;
        add_collaborator_effects(&store, project.project_id, &mut bob)
            .await
            .unwrap();

        let mut project = store
            .get_project_by_project_id(project.project_id)
            .await
            .unwrap()
            .unwrap();
        project.title = "Renamed".to_string();
        project.touch();
        let project = store.update_project(project).await.unwrap();

        sync_project_snapshots(&store, &project).await.unwrap();

        let stored_alice = store.get_user(alice.id).await.unwrap().unwrap();
        assert_eq!(stored_alice.profile.own_projects[0].title, "Renamed");
        let stored_bob = store.get_user(bob.id).await.unwrap().unwrap();
        assert_eq!(stored_bob.profile.collaborating_projects[0].title, "Renamed");
    }

    #[tokio::test]
    async fn test_owner_snapshot_fanout() {
        let store = MemoryDocStore::new();
        let mut alice = store.create_user(user("alice")).await.unwrap();
        let project = provisioned(&store, &mut alice).await;

        alice.name = "Alice Writes".to_string();
        alice.touch();
        let alice = store.update_user(alice).await.unwrap();
        sync_owner_snapshots(&store, &alice).await.unwrap();

        let stored = store.get_project(project.id).await.unwrap().unwrap();
        assert_eq!(stored.owner.name, "Alice Writes");
    }

    #[tokio::test]
    async fn test_cascade_delete_is_complete() {
        let store = MemoryDocStore::new();
        let mut alice = store.create_user(user("alice")).await.unwrap();
        let mut bob = store.create_user(user("bob")).await.unwrap();
        let mut carol = store.create_user(user("carol")).await.unwrap();
        let project = provisioned(&store, &mut alice).await;
        add_collaborator_effects(&store, project.project_id, &mut bob)
            .await
            .unwrap();
        add_collaborator_effects(&store, project.project_id, &mut carol)
            .await
            .unwrap();

        let project = store
            .get_project_by_project_id(project.project_id)
            .await
            .unwrap()
            .unwrap();
        cascade_delete_project(&store, &project).await.unwrap();

        let project_id = project.project_id;
        assert!(store
            .get_project_by_project_id(project_id)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .list_folders_by_project(project_id)
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .list_files_by_project(project_id)
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .get_chat_room_by_project(project_id)
            .await
            .unwrap()
            .is_none());

        for id in [alice.id, bob.id, carol.id] {
            let stored = store.get_user(id).await.unwrap().unwrap();
            assert!(!stored.profile.owns_project(project_id));
            assert!(!stored
                .profile
                .collaborating_projects
                .iter()
                .any(|p| p.project_id == project_id));
        }
    }
}
