//! Project endpoints.

use std::sync::Arc;

use api_protocol::{
    AddCollaboratorRequest, AddCollaboratorResponse, CreateProjectRequest, CreateProjectResponse,
    DeleteProjectResponse, JoinProjectRequest, JoinProjectResponse, ListProjectSummariesResponse,
    LoadProjectRequest, LoadProjectResponse, LoadProjectsResponse, OwnerView,
    ProjectSummaryView, ProjectView, PublishProjectRequest, PublishProjectResponse,
    RemoveCollaboratorRequest, RemoveCollaboratorResponse, SaveProjectRequest,
    SaveProjectResponse, TouchProjectRequest, TouchProjectResponse, UpdateProjectRequest,
    UpdateProjectResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use doc_store::DocStore;
use entities::{OwnerSnapshot, Project};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::services::projections;
use crate::state::AppState;

use super::{load_current_user, parse_id};

/// Converts an entity Project to its wire view.
fn entity_to_view(project: &Project) -> ProjectView {
    ProjectView {
        id: project.id.to_string(),
        project_id: project.project_id.to_string(),
        owner_id: project.owner_id.to_string(),
        owner: OwnerView {
            name: project.owner.name.clone(),
            avatar_url: project.owner.avatar_url.clone(),
        },
        title: project.title.clone(),
        author: project.author.clone(),
        genres: project.genres.clone(),
        description: project.description.clone(),
        cover_image: project.cover_image.clone(),
        collaborators: project
            .collaborators
            .iter()
            .map(|id| id.to_string())
            .collect(),
        published: project.published,
        content: project.content.clone(),
        url_path: project.url_path.clone(),
        modified_at: project.modified_at,
        created_at: project.created_at,
        updated_at: project.updated_at,
    }
}

async fn load_member_project<S: DocStore>(
    state: &AppState<S>,
    current: &CurrentUser,
    project_id: &str,
) -> ApiResult<Project> {
    let project_id = parse_id(project_id, "project_id")?;
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
    Ok(project)
}

/// Creates a project with its full set of side-effects.
pub async fn create_project<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<Json<CreateProjectResponse>> {
    let mut owner = load_current_user(&state, &current).await?;

    let mut project = Project::new(
        owner.id,
        OwnerSnapshot::new(&owner.name, &owner.avatar_url),
        request.title.unwrap_or_else(|| "Untitled".to_string()),
    );
    if let Some(genres) = request.genres {
        project = project.with_genres(genres);
    }
    if let Some(description) = request.description {
        project = project.with_description(description);
    }
    if let Some(cover_image) = request.cover_image {
        project = project.with_cover_image(cover_image);
    }

    let project = projections::provision_project(&state.store, &mut owner, project).await?;

    tracing::info!(project_id = %project.project_id, owner_id = %owner.id, "Project created");

    Ok(Json(CreateProjectResponse {
        project: entity_to_view(&project),
    }))
}

/// Lists the caller's owned-project snapshots.
pub async fn list_projects<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ListProjectSummariesResponse>> {
    let user = load_current_user(&state, &current).await?;
    Ok(Json(ListProjectSummariesResponse {
        projects: user.profile.own_projects.iter().map(Into::into).collect(),
    }))
}

/// Lists the caller's collaborating-project snapshots.
pub async fn list_collaborations<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ListProjectSummariesResponse>> {
    let user = load_current_user(&state, &current).await?;
    Ok(Json(ListProjectSummariesResponse {
        projects: user
            .profile
            .collaborating_projects
            .iter()
            .map(ProjectSummaryView::from)
            .collect(),
    }))
}

/// Loads the caller's full project documents.
pub async fn load_projects<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<LoadProjectsResponse>> {
    let projects = state.store.list_projects_by_owner(current.id).await?;
    Ok(Json(LoadProjectsResponse {
        projects: projects.iter().map(entity_to_view).collect(),
    }))
}

/// Loads a single full project document.
pub async fn load_project<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<LoadProjectRequest>,
) -> ApiResult<Json<LoadProjectResponse>> {
    let project_id = parse_id(&request.project_id, "project_id")?;
    let project = state
        .store
        .get_project_by_project_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    // Published projects are readable by anyone with a session.
    if !project.is_member(current.id) && !project.published {
        return Err(ApiError::Forbidden(
            "Not a member of this project".to_string(),
        ));
    }

    Ok(Json(LoadProjectResponse {
        project: entity_to_view(&project),
    }))
}

/// Overwrites the project content. Last writer wins; there is no version
/// token.
pub async fn save_content<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<SaveProjectRequest>,
) -> ApiResult<Json<SaveProjectResponse>> {
    let mut project = load_member_project(&state, &current, &request.project_id).await?;

    project.content = request.content;
    project.touch_modified();
    let project = state.store.update_project(project).await?;

    tracing::info!(project_id = %project.project_id, "Project content saved");

    Ok(Json(SaveProjectResponse {
        project: entity_to_view(&project),
    }))
}

/// Updates listing metadata and fans it out to every profile snapshot.
pub async fn update_project<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Json<UpdateProjectResponse>> {
    let mut project = load_member_project(&state, &current, &request.project_id).await?;
    if project.owner_id != current.id {
        return Err(ApiError::Forbidden(
            "Only the owner can update project details".to_string(),
        ));
    }

    if let Some(title) = request.title {
        project.title = title;
    }
    if let Some(author) = request.author {
        project.author = author;
    }
    if let Some(genres) = request.genres {
        project.genres = genres;
    }
    if let Some(description) = request.description {
        project.description = description;
    }
    if let Some(cover_image) = request.cover_image {
        project.cover_image = cover_image;
    }
    project.touch();
    let project = state.store.update_project(project).await?;

    projections::sync_project_snapshots(&state.store, &project).await?;

    tracing::info!(project_id = %project.project_id, "Project updated");

    Ok(Json(UpdateProjectResponse {
        project: entity_to_view(&project),
    }))
}

/// Bumps the client-visible modified date.
pub async fn touch_date<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<TouchProjectRequest>,
) -> ApiResult<Json<TouchProjectResponse>> {
    let mut project = load_member_project(&state, &current, &request.project_id).await?;

    project.touch_modified();
    let project = state.store.update_project(project).await?;

    Ok(Json(TouchProjectResponse {
        project: entity_to_view(&project),
    }))
}

/// Publishes or unpublishes a project.
pub async fn publish_project<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<PublishProjectRequest>,
) -> ApiResult<Json<PublishProjectResponse>> {
    let mut project = load_member_project(&state, &current, &request.project_id).await?;
    if project.owner_id != current.id {
        return Err(ApiError::Forbidden(
            "Only the owner can publish a project".to_string(),
        ));
    }

    project.published = request.published;
    project.touch();
    let project = state.store.update_project(project).await?;

    tracing::info!(project_id = %project.project_id, published = project.published, "Project publish state changed");

    Ok(Json(PublishProjectResponse {
        project: entity_to_view(&project),
    }))
}

/// Joins a project as a collaborator, accepting an invitation.
pub async fn join_project<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<JoinProjectRequest>,
) -> ApiResult<Json<JoinProjectResponse>> {
    let project_id = parse_id(&request.project_id, "project_id")?;
    let project = state
        .store
        .get_project_by_project_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let mut joiner = load_current_user(&state, &current).await?;
    if project.owner_id == joiner.id {
        return Err(ApiError::Forbidden(
            "The owner is already a member".to_string(),
        ));
    }

    // The owner's block list gates who can take up an invitation.
    if let Some(owner) = state.store.get_user(project.owner_id).await? {
        if owner.profile.has_blocked(joiner.id) {
            return Err(ApiError::Forbidden("Cannot join this project".to_string()));
        }
    }

    let project = match projections::add_collaborator_effects(
        &state.store,
        project.project_id,
        &mut joiner,
    )
    .await
    {
        Err(ApiError::Store(e)) if e.is_already_exists() => {
            return Err(ApiError::Conflict("Already a collaborator".to_string()));
        }
        other => other?,
    };

    tracing::info!(project_id = %project.project_id, user_id = %joiner.id, "Collaborator joined");

    Ok(Json(JoinProjectResponse {
        project: entity_to_view(&project),
    }))
}

/// Adds another user as a collaborator.
pub async fn add_collaborator<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<AddCollaboratorRequest>,
) -> ApiResult<Json<AddCollaboratorResponse>> {
    let collaborator_id = parse_id(&request.collaborator_id, "collaborator_id")?;
    if collaborator_id == current.id {
        return Err(ApiError::Forbidden(
            "Cannot add yourself as a collaborator".to_string(),
        ));
    }

    let project = load_member_project(&state, &current, &request.project_id).await?;

    let mut collaborator = state
        .store
        .get_user(collaborator_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Blocking is checked on the candidate's side: someone who blocked
    // the requester cannot be pulled into their project.
    if collaborator.profile.has_blocked(current.id) {
        return Err(ApiError::Forbidden(
            "Cannot add this user as a collaborator".to_string(),
        ));
    }

    let project = match projections::add_collaborator_effects(
        &state.store,
        project.project_id,
        &mut collaborator,
    )
    .await
    {
        Err(ApiError::Store(e)) if e.is_already_exists() => {
            return Err(ApiError::Conflict("Already a collaborator".to_string()));
        }
        other => other?,
    };

    tracing::info!(project_id = %project.project_id, collaborator_id = %collaborator_id, "Collaborator added");

    Ok(Json(AddCollaboratorResponse {
        project: entity_to_view(&project),
    }))
}

/// Deletes a project and every dependent record.
pub async fn delete_project<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<DeleteProjectResponse>> {
    let project_id = parse_id(&project_id, "project_id")?;
    let project = state
        .store
        .get_project_by_project_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if project.owner_id != current.id {
        return Err(ApiError::Forbidden(
            "Only the owner can delete a project".to_string(),
        ));
    }

    projections::cascade_delete_project(&state.store, &project).await?;

    Ok(Json(DeleteProjectResponse {}))
}

/// Removes a collaborator, or leaves the project when no id is given.
pub async fn remove_collaborator<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<String>,
    Json(request): Json<RemoveCollaboratorRequest>,
) -> ApiResult<Json<RemoveCollaboratorResponse>> {
    let project_id = parse_id(&project_id, "project_id")?;
    let project = state
        .store
        .get_project_by_project_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let target_id = match request.collaborator_id.as_deref() {
        Some(id) => parse_id(id, "collaborator_id")?,
        None => current.id,
    };

    // Collaborators may remove themselves; only the owner removes others.
    if target_id != current.id && project.owner_id != current.id {
        return Err(ApiError::Forbidden(
            "Only the owner can remove other collaborators".to_string(),
        ));
    }
    if !project.is_collaborator(target_id) {
        return Err(ApiError::NotFound("Collaborator not found".to_string()));
    }

    projections::remove_collaborator_effects(&state.store, &project, target_id).await?;

    tracing::info!(project_id = %project.project_id, collaborator_id = %target_id, "Collaborator removed");

    Ok(Json(RemoveCollaboratorResponse {}))
}
