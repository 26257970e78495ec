//! Registration, login, and session endpoints.

use std::sync::Arc;

use api_protocol::{
    FieldError, LoginRequest, LoginResponse, LogoutResponse, PreRegisterRequest,
    PreRegisterResponse, RegisterRequest, RegisterResponse, SessionResponse, SessionView,
    UserView,
};
use auth::{ConfirmationToken, SessionRecord, hash_token};
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
};
use doc_store::DocStore;
use entities::{PasswordRecord, PreRegistration, User};

use crate::error::{ApiError, ApiResult};
use crate::middleware::{CurrentUser, SESSION_COOKIE};
use crate::services::{avatar::gravatar_url, mailer};
use crate::state::AppState;

use super::load_current_user;

fn validate_pre_register(request: &PreRegisterRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if request.email.trim().is_empty() || !request.email.contains('@') {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    if request.name.trim().is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if request.username.trim().is_empty() {
        errors.push(FieldError::new("username", "must not be empty"));
    }
    if request.password.len() < 8 {
        errors.push(FieldError::new("password", "must be at least 8 characters"));
    }
    errors
}

/// Starts registration: validates, stores a pending record, and hands out
/// a single-use confirmation token.
pub async fn pre_register<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<PreRegisterRequest>,
) -> ApiResult<Json<PreRegisterResponse>> {
    let errors = validate_pre_register(&request);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // Duplicates are checked against completed users as well as pending
    // registrations, so completion can never mint a second user for an
    // address.
    if state.store.get_user_by_email(&request.email).await?.is_some()
        || state
            .store
            .get_pre_registration_by_email(&request.email)
            .await?
            .is_some()
    {
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }
    if state
        .store
        .get_user_by_username(&request.username)
        .await?
        .is_some()
        || state
            .store
            .get_pre_registration_by_username(&request.username)
            .await?
            .is_some()
    {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }

    let hashed = auth::hash_new_password(&request.password)?;
    let token = ConfirmationToken::generate();

    let pre = PreRegistration::new(
        request.email.clone(),
        request.name,
        request.username,
        PasswordRecord::new(hashed.salt, hashed.hash),
        token.token_hash.clone(),
    );
    state.store.create_pre_registration(pre).await?;

    mailer::dispatch(
        state.mailer.clone(),
        request.email,
        "Confirm your Quillshare registration".to_string(),
        format!("<p>Your confirmation token: <b>{}</b></p>", token.token),
    );

    tracing::info!("Pre-registration created");

    Ok(Json(PreRegisterResponse { token: token.token }))
}

/// Completes registration from a confirmation token.
pub async fn register<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    let mut pre = state
        .store
        .get_pre_registration_by_token_hash(&hash_token(&request.token))
        .await?
        .ok_or(ApiError::Auth(auth::AuthError::InvalidToken))?;

    let (Some(email), Some(name), Some(username), Some(password)) = (
        pre.email.clone(),
        pre.name.clone(),
        pre.username.clone(),
        pre.password.clone(),
    ) else {
        return Err(ApiError::Auth(auth::AuthError::InvalidToken));
    };

    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }
    if state.store.get_user_by_username(&username).await?.is_some() {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }

    let avatar = gravatar_url(&email, None);
    let user = User::new(email, username, name, password).with_avatar_url(avatar);
    let user = state.store.create_user(user).await?;

    // The pending row is kept; only its sensitive fields are nulled.
    pre.redeem();
    state.store.update_pre_registration(pre).await?;

    tracing::info!(user_id = %user.id, "Registration completed");

    Ok(Json(RegisterResponse {
        user: UserView::from_user(&user),
    }))
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Logs a user in and opens a session.
pub async fn login<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<(HeaderMap, Json<LoginResponse>)> {
    // The error is identical whether the username or the password was
    // wrong.
    let mut user = state
        .store
        .get_user_by_username(&request.username)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let matches =
        auth::verify_password(&request.password, &user.password.salt, &user.password.hash)?;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    // Advisory flag only; the session record is the real login state.
    user.is_logged_in = true;
    user.touch();
    let user = state.store.update_user(user).await?;

    let session = SessionRecord::new(user.id);
    state.sessions.store(&session).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        session_cookie(&session.token, state.config.session_ttl_secs)
            .parse()
            .map_err(|_| ApiError::Internal("invalid cookie header".to_string()))?,
    );

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        headers,
        Json(LoginResponse {
            session: SessionView::project(&user, &session.token),
        }),
    ))
}

/// Logs the current user out and destroys the session.
pub async fn logout<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<(HeaderMap, Json<LogoutResponse>)> {
    // Flip the advisory flag first; a session-destruction failure below
    // does not roll it back.
    if let Some(mut user) = state.store.get_user(current.id).await? {
        user.is_logged_in = false;
        user.touch();
        state.store.update_user(user).await?;
    }

    state.sessions.remove(&current.session_token).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        session_cookie("", 0)
            .parse()
            .map_err(|_| ApiError::Internal("invalid cookie header".to_string()))?,
    );

    tracing::info!(user_id = %current.id, "User logged out");

    Ok((headers, Json(LogoutResponse {})))
}

/// Returns a freshly recomputed session view.
pub async fn current_user<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<SessionResponse>> {
    let user = load_current_user(&state, &current).await?;

    let mut session = SessionView::project(&user, &current.session_token);
    // One-shot marker from a password change; cleared by this read.
    session.password_updated = state
        .sessions
        .take_password_updated(&current.session_token)
        .await?;

    Ok(Json(SessionResponse { session }))
}
