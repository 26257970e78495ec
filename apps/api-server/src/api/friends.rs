//! Friend and block endpoints.

use std::sync::Arc;

use api_protocol::{
    AddFriendRequest, AddFriendResponse, BlockUserRequest, BlockUserResponse, SessionView,
};
use axum::{Extension, Json, extract::State};
use cipher::MessageCipher;
use doc_store::DocStore;
use entities::User;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::services::messaging;
use crate::state::AppState;

use super::load_current_user;

/// Makes two users friends of each other.
///
/// Two independent profile writes, not atomic. The original requester
/// gets an automatic "accepted" notification.
pub(crate) async fn make_friends<S: DocStore>(
    store: &S,
    cipher: &MessageCipher,
    accepter: &mut User,
    requester: &mut User,
) -> ApiResult<()> {
    if accepter.profile.is_friend(requester.id) || requester.profile.is_friend(accepter.id) {
        return Err(ApiError::Conflict("Already friends".to_string()));
    }

    accepter.profile.friends.push(requester.id);
    accepter.touch();
    store.update_user(accepter.clone()).await?;

    requester.profile.friends.push(accepter.id);
    requester.touch();
    store.update_user(requester.clone()).await?;

    let notice = format!("{} accepted your friend request", accepter.name);
    messaging::send_notification(store, cipher, accepter, requester, &notice).await?;

    Ok(())
}

/// Accepts a friendship directly by user id.
pub async fn add_friend<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<AddFriendRequest>,
) -> ApiResult<Json<AddFriendResponse>> {
    let friend_id = super::parse_id(&request.friend_id, "friend_id")?;
    if friend_id == current.id {
        return Err(ApiError::Conflict(
            "Cannot add yourself as a friend".to_string(),
        ));
    }

    let mut user = load_current_user(&state, &current).await?;
    let mut friend = state
        .store
        .get_user(friend_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    make_friends(&state.store, &state.cipher, &mut user, &mut friend).await?;

    tracing::info!(user_id = %user.id, friend_id = %friend_id, "Friends added");

    let user = state
        .store
        .get_user(user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(AddFriendResponse {
        session: SessionView::project(&user, &current.session_token),
    }))
}

/// Blocks another user. Unidirectional; enforced at message send time.
pub async fn block_user<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<BlockUserRequest>,
) -> ApiResult<Json<BlockUserResponse>> {
    let target_id = super::parse_id(&request.user_id, "user_id")?;
    if target_id == current.id {
        return Err(ApiError::Conflict("Cannot block yourself".to_string()));
    }

    // Verify the target exists before recording the block.
    state
        .store
        .get_user(target_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut user = load_current_user(&state, &current).await?;
    if !user.profile.has_blocked(target_id) {
        user.profile.blocked_users.push(target_id);
        user.touch();
        user = state.store.update_user(user).await?;
        tracing::info!(user_id = %user.id, blocked_id = %target_id, "User blocked");
    }

    Ok(Json(BlockUserResponse {
        session: SessionView::project(&user, &current.session_token),
    }))
}
