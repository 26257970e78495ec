//! Profile endpoints.

use std::sync::Arc;

use api_protocol::{
    PublicProfileResponse, PublicProfileView, SessionView, UpdateProfileRequest,
    UpdateProfileResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use doc_store::DocStore;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

use super::{load_current_user, parse_id};

/// Updates the caller's profile fields.
pub async fn update_profile<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let mut user = load_current_user(&state, &current).await?;

    if let Some(about) = request.about {
        user.profile.about = about;
    }
    if let Some(authors) = request.authors {
        user.profile.authors = authors;
    }
    if let Some(books) = request.books {
        user.profile.books = books;
    }
    if let Some(profile_visible) = request.profile_visible {
        user.profile_visible = profile_visible;
    }
    user.touch();
    let user = state.store.update_user(user).await?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(UpdateProfileResponse {
        session: SessionView::project(&user, &current.session_token),
    }))
}

/// Returns another user's public profile, honoring their visibility flag.
pub async fn get_profile<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PublicProfileResponse>> {
    let user_id = parse_id(&id, "id")?;
    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(PublicProfileResponse {
        profile: PublicProfileView::from_user(&user),
    }))
}
