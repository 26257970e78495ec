//! Password management endpoints.

use std::sync::Arc;

use api_protocol::{
    ChangePasswordRequest, ChangePasswordResponse, CheckCurrentPasswordRequest,
    CheckCurrentPasswordResponse, CheckPasswordReuseRequest, CheckPasswordReuseResponse,
    FieldError, SessionView,
};
use axum::{Extension, Json, extract::State};
use doc_store::DocStore;
use entities::PasswordRecord;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

use super::load_current_user;

/// Changes the password: fresh salt, history append, session marker.
pub async fn change_password<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ChangePasswordResponse>> {
    if request.new_password.len() < 8 {
        return Err(ApiError::Validation(vec![FieldError::new(
            "new_password",
            "must be at least 8 characters",
        )]));
    }

    let mut user = load_current_user(&state, &current).await?;

    let hashed = auth::hash_new_password(&request.new_password)?;
    // Appends to the history; nothing is ever trimmed.
    user.set_password(PasswordRecord::new(hashed.salt, hashed.hash));
    let user = state.store.update_user(user).await?;

    state
        .sessions
        .mark_password_updated(&current.session_token)
        .await?;

    tracing::info!(user_id = %user.id, history_len = user.password_history.len(), "Password changed");

    let mut session = SessionView::project(&user, &current.session_token);
    session.password_updated = true;

    Ok(Json(ChangePasswordResponse { session }))
}

/// Checks a candidate against every password this account has ever had.
pub async fn check_reuse<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CheckPasswordReuseRequest>,
) -> ApiResult<Json<CheckPasswordReuseResponse>> {
    let user = load_current_user(&state, &current).await?;

    let mut clash = false;
    for record in &user.password_history {
        if auth::verify_password(&request.password, &record.salt, &record.hash)? {
            clash = true;
            break;
        }
    }

    Ok(Json(CheckPasswordReuseResponse { clash }))
}

/// Checks a candidate against the current password.
///
/// Compares against the last history entry, which by construction always
/// equals the live password record.
pub async fn check_current<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CheckCurrentPasswordRequest>,
) -> ApiResult<Json<CheckCurrentPasswordResponse>> {
    let user = load_current_user(&state, &current).await?;

    let record = user
        .password_history
        .last()
        .ok_or_else(|| ApiError::Internal("empty password history".to_string()))?;
    let valid = auth::verify_password(&request.password, &record.salt, &record.hash)?;

    Ok(Json(CheckCurrentPasswordResponse { valid }))
}
