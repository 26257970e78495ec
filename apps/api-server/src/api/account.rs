//! Account endpoints.

use std::sync::Arc;

use api_protocol::{
    DeleteAccountResponse, SessionView, UpdateAccountRequest, UpdateAccountResponse,
};
use axum::{Extension, Json, extract::State};
use doc_store::DocStore;

use crate::error::ApiResult;
use crate::middleware::CurrentUser;
use crate::services::projections;
use crate::state::AppState;

use super::load_current_user;

/// Updates account fields and fans the new name/avatar out to owned
/// project documents.
pub async fn update_account<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<UpdateAccountRequest>,
) -> ApiResult<Json<UpdateAccountResponse>> {
    let mut user = load_current_user(&state, &current).await?;

    if let Some(name) = request.name {
        user.name = name;
    }
    if let Some(avatar_url) = request.avatar_url {
        user.avatar_url = avatar_url;
    }
    user.touch();
    let user = state.store.update_user(user).await?;

    projections::sync_owner_snapshots(&state.store, &user).await?;

    tracing::info!(user_id = %user.id, "Account updated");

    Ok(Json(UpdateAccountResponse {
        session: SessionView::project(&user, &current.session_token),
    }))
}

/// Deletes the account: cascades owned projects, leaves collaborations,
/// destroys the session, removes the user record.
pub async fn delete_account<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<DeleteAccountResponse>> {
    let user = load_current_user(&state, &current).await?;

    for project in state.store.list_projects_by_owner(user.id).await? {
        projections::cascade_delete_project(&state.store, &project).await?;
    }

    for project in state.store.list_projects_by_collaborator(user.id).await? {
        projections::remove_collaborator_effects(&state.store, &project, user.id).await?;
    }

    state.store.delete_user(user.id).await?;

    if let Err(e) = state.sessions.remove(&current.session_token).await {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to destroy session on account delete");
    }

    tracing::info!(user_id = %user.id, "Account deleted");

    Ok(Json(DeleteAccountResponse {}))
}
