//! Folder endpoints.

use std::sync::Arc;

use api_protocol::{
    AddFolderRequest, AddFolderResponse, FolderItemView, FolderView, ListFoldersResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use doc_store::DocStore;
use entities::{FolderItem, ProjectFolder};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

use super::parse_id;

/// Converts an entity ProjectFolder to its wire view.
pub(crate) fn entity_to_view(folder: &ProjectFolder) -> FolderView {
    FolderView {
        id: folder.id.to_string(),
        project_id: folder.project_id.to_string(),
        owner_id: folder.owner_id.to_string(),
        label: folder.label.clone(),
        folder: folder.folder,
        admin_folder: folder.admin_folder,
        user_base_folder: folder.user_base_folder,
        items: folder
            .items
            .iter()
            .map(|item| FolderItemView {
                item_id: item.item_id.to_string(),
                label: item.label.clone(),
                file: item.file,
                url_path: item.url_path.clone(),
            })
            .collect(),
        parent_id: folder.parent_id.map(|id| id.to_string()),
    }
}

async fn authorize_member<S: DocStore>(
    state: &AppState<S>,
    current: &CurrentUser,
    project_id: uuid::Uuid,
) -> ApiResult<()> {
    let project = state
        .store
        .get_project_by_project_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    if !project.is_member(current.id) {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }
    Ok(())
}

/// Lists every folder of a project.
pub async fn list_folders<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ListFoldersResponse>> {
    let project_id = parse_id(&project_id, "project_id")?;
    authorize_member(&state, &current, project_id).await?;

    let folders = state.store.list_folders_by_project(project_id).await?;

    Ok(Json(ListFoldersResponse {
        folders: folders.iter().map(entity_to_view).collect(),
    }))
}

/// Adds a folder, mirroring it as an item snapshot in its parent.
pub async fn add_folder<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<AddFolderRequest>,
) -> ApiResult<Json<AddFolderResponse>> {
    let project_id = parse_id(&request.project_id, "project_id")?;
    authorize_member(&state, &current, project_id).await?;

    let parent = match request.parent_id.as_deref() {
        Some(parent_id) => {
            let parent_id = parse_id(parent_id, "parent_id")?;
            let parent = state
                .store
                .get_folder(parent_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Parent folder not found".to_string()))?;
            if parent.project_id != project_id {
                return Err(ApiError::NotFound("Parent folder not found".to_string()));
            }
            Some(parent)
        }
        None => None,
    };

    let folder = ProjectFolder::new(
        project_id,
        current.id,
        request.label,
        parent.as_ref().map(|p| p.id),
    );
    let folder = state.store.create_folder(folder).await?;

    // Snapshot into the parent's item list; the canonical row above is
    // authoritative.
    if let Some(mut parent) = parent {
        parent.push_item(FolderItem {
            item_id: folder.id,
            label: folder.label.clone(),
            file: false,
            url_path: String::new(),
        });
        state.store.update_folder(parent).await?;
    }

    tracing::info!(project_id = %project_id, folder_id = %folder.id, "Folder added");

    Ok(Json(AddFolderResponse {
        folder: entity_to_view(&folder),
    }))
}
