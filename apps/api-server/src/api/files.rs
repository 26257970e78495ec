//! File endpoints.

use std::sync::Arc;

use api_protocol::{
    AddFileRequest, AddFileResponse, FileView, GetFileResponse, SaveFileRequest,
    SaveFileResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use doc_store::DocStore;
use entities::ProjectFile;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

use super::parse_id;

/// Converts an entity ProjectFile to its wire view.
fn entity_to_view(file: &ProjectFile) -> FileView {
    FileView {
        id: file.id.to_string(),
        project_id: file.project_id.to_string(),
        parent_id: file.parent_id.map(|id| id.to_string()),
        owner_id: file.owner_id.to_string(),
        label: file.label.clone(),
        file: file.file,
        content: file.content.clone(),
        url_path: file.url_path.clone(),
        updated_at: file.updated_at,
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

/// Returns a file document.
pub async fn get_file<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Path(file_id): Path<String>,
) -> ApiResult<Json<GetFileResponse>> {
    let file_id = parse_id(&file_id, "file_id")?;
    let file = state
        .store
        .get_file(file_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;
    authorize_member(&state, &current, file.project_id).await?;

    Ok(Json(GetFileResponse {
        file: entity_to_view(&file),
    }))
}

/// Creates a file inside a folder, mirroring it as an item snapshot.
pub async fn add_file<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Path(folder_id): Path<String>,
    Json(request): Json<AddFileRequest>,
) -> ApiResult<Json<AddFileResponse>> {
    let folder_id = parse_id(&folder_id, "folder_id")?;
    let mut folder = state
        .store
        .get_folder(folder_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Folder not found".to_string()))?;
    authorize_member(&state, &current, folder.project_id).await?;

    let mut file = ProjectFile::new(folder.project_id, folder.id, current.id, request.label);
    if let Some(content) = request.content {
        file = file.with_content(content);
    }
    let file = state.store.create_file(file).await?;

    // Index snapshot only; later content edits are not mirrored here.
    folder.push_item(file.as_item());
    state.store.update_folder(folder).await?;

    tracing::info!(project_id = %file.project_id, file_id = %file.id, "File added");

    Ok(Json(AddFileResponse {
        file: entity_to_view(&file),
    }))
}

/// Overwrites file content. Last writer wins; there is no version token.
pub async fn save_file<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<SaveFileRequest>,
) -> ApiResult<Json<SaveFileResponse>> {
    let file_id = parse_id(&request.file_id, "file_id")?;
    let mut file = state
        .store
        .get_file(file_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;
    authorize_member(&state, &current, file.project_id).await?;

    file.content = request.content;
    file.updated_at = chrono::Utc::now();
    let file = state.store.update_file(file).await?;

    tracing::info!(file_id = %file.id, "File content saved");

    Ok(Json(SaveFileResponse {
        file: entity_to_view(&file),
    }))
}
