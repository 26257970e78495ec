//! API endpoints.

pub mod account;
pub mod auth;
pub mod chat;
pub mod email;
pub mod files;
pub mod folders;
pub mod friends;
pub mod messages;
pub mod password;
pub mod profile;
pub mod projects;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use doc_store::DocStore;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{CurrentUser, session_middleware};
use crate::state::AppState;

/// Creates the API router with all endpoints.
///
/// The verb/path pairs are part of the compatibility contract and must
/// not change. Everything outside the public set is session-gated.
pub fn create_router<S: DocStore + 'static>(state: Arc<AppState<S>>) -> Router<Arc<AppState<S>>> {
    let public = Router::new()
        .route("/login", post(auth::login))
        .route("/register/pre-register", post(auth::pre_register))
        .route("/register", post(auth::register))
        .route("/email/verify", post(email::verify))
        .route("/email/send", post(email::send_verification))
        .route("/email/send/reset", post(email::send_reset))
        // Health check
        .route("/health", get(health_check));

    let gated = Router::new()
        // Account & profile
        .route("/account", post(account::update_account).delete(account::delete_account))
        .route("/profile", post(profile::update_profile))
        .route("/profile/:id", get(profile::get_profile))
        .route("/user", get(auth::current_user))
        // Credentials
        .route("/changepassword", post(password::change_password))
        .route("/changepassword/check", post(password::check_reuse))
        .route("/changepassword/check/current", post(password::check_current))
        .route("/logout", delete(auth::logout))
        .route("/email/send/changepw", post(email::send_change_password))
        // Projects
        .route("/projects", get(projects::list_projects).post(projects::create_project))
        .route("/projects/loadprojects", get(projects::load_projects))
        .route("/projects/loadproject", post(projects::load_project))
        .route("/projects/save", put(projects::save_content))
        .route("/projects/update", put(projects::update_project))
        .route("/projects/date", put(projects::touch_date))
        .route("/projects/publish", put(projects::publish_project))
        .route("/projects/add", put(projects::join_project))
        .route("/projects/collaborators", post(projects::add_collaborator))
        .route("/projects/collaborations", get(projects::list_collaborations))
        .route("/projects/delete/:project_id", delete(projects::delete_project))
        .route(
            "/projects/delete/:project_id/collaborator",
            delete(projects::remove_collaborator),
        )
        // Folders & files
        .route("/folders/:project_id", get(folders::list_folders))
        .route("/folders/add", post(folders::add_folder))
        .route("/files/:file_id", get(files::get_file))
        .route("/files/save", post(files::save_file))
        .route("/files/add/:folder_id", post(files::add_file))
        // Messages & friends
        .route("/messages", get(messages::get_messages).post(messages::send_message))
        .route("/messages/set-read", put(messages::set_read))
        .route("/messages/request", post(messages::send_friend_request))
        .route("/messages/response", post(messages::respond_friend_request))
        .route("/messages/is-admin", post(messages::is_admin))
        .route("/messages/group", post(messages::send_group_message))
        .route("/friends/add", put(friends::add_friend))
        .route("/friends/block", put(friends::block_user))
        // Chat
        .route("/chat", post(chat::post_message))
        .route("/chat/:id", get(chat::get_chat_messages))
        .route("/chat/create", post(chat::create_room))
        .route_layer(from_fn_with_state(state, session_middleware::<S>));

    public.merge(gated)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Parses a wire id into a [`Uuid`], reporting a field validation error.
pub(crate) fn parse_id(value: &str, field: &str) -> ApiResult<Uuid> {
    value.parse().map_err(|_| {
        ApiError::Validation(vec![api_protocol::FieldError::new(
            field,
            "must be a valid id",
        )])
    })
}

/// Loads the authenticated caller's full user record.
pub(crate) async fn load_current_user<S: DocStore>(
    state: &AppState<S>,
    current: &CurrentUser,
) -> ApiResult<entities::User> {
    state
        .store
        .get_user(current.id)
        .await?
        .ok_or(ApiError::Unauthorized)
}
