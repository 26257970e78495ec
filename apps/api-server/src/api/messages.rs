//! Inbox message endpoints.

use std::sync::Arc;

use api_protocol::{
    FriendResponseRequest, FriendResponseResponse, GetMessagesResponse, GroupMessageRequest,
    GroupMessageResponse, InboxMessageView, IsAdminRequest, IsAdminResponse, SendMessageRequest,
    SendMessageResponse, SetMessagesReadRequest, SetMessagesReadResponse,
};
use axum::{Extension, Json, extract::State};
use doc_store::DocStore;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::services::messaging;
use crate::state::AppState;

use super::{friends, load_current_user, parse_id};

async fn project_context<S: DocStore>(
    state: &AppState<S>,
    project_id: Option<&str>,
) -> ApiResult<Option<(Uuid, String)>> {
    let Some(project_id) = project_id else {
        return Ok(None);
    };
    let project_id = parse_id(project_id, "project_id")?;
    let project = state
        .store
        .get_project_by_project_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    Ok(Some((project.project_id, project.title)))
}

/// Returns the caller's inbox with every body decrypted.
///
/// Ciphertext never reaches a client; plaintext never persists.
pub async fn get_messages<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<GetMessagesResponse>> {
    let user = load_current_user(&state, &current).await?;

    let mut messages = Vec::with_capacity(user.profile.messages.len());
    for message in &user.profile.messages {
        let text = state.cipher.decrypt(&message.text)?;
        messages.push(InboxMessageView::with_text(message, text));
    }

    Ok(Json(GetMessagesResponse { messages }))
}

/// Sends a direct message.
pub async fn send_message<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let sender = load_current_user(&state, &current).await?;
    let recipient_id = parse_id(&request.recipient_id, "recipient_id")?;
    let mut recipient = state
        .store
        .get_user(recipient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipient not found".to_string()))?;

    let project = project_context(&state, request.project_id.as_deref()).await?;

    let message = messaging::send_inbox_message(
        &state.store,
        &state.cipher,
        &sender,
        &mut recipient,
        &request.text,
        project,
        false,
    )
    .await?;

    tracing::info!(recipient_id = %recipient_id, "Direct message sent");

    Ok(Json(SendMessageResponse {
        message_id: message.id.to_string(),
    }))
}

/// Sends a friend request message.
pub async fn send_friend_request<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let sender = load_current_user(&state, &current).await?;
    let recipient_id = parse_id(&request.recipient_id, "recipient_id")?;

    if recipient_id == sender.id {
        return Err(ApiError::Conflict(
            "Cannot send a friend request to yourself".to_string(),
        ));
    }

    let mut recipient = state
        .store
        .get_user(recipient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipient not found".to_string()))?;

    if sender.profile.is_friend(recipient_id) || recipient.profile.is_friend(sender.id) {
        return Err(ApiError::Conflict("Already friends".to_string()));
    }

    let project = project_context(&state, request.project_id.as_deref()).await?;

    let message = messaging::send_inbox_message(
        &state.store,
        &state.cipher,
        &sender,
        &mut recipient,
        &request.text,
        project,
        true,
    )
    .await?;

    tracing::info!(recipient_id = %recipient_id, "Friend request sent");

    Ok(Json(SendMessageResponse {
        message_id: message.id.to_string(),
    }))
}

/// Accepts or declines a friend request from the inbox.
pub async fn respond_friend_request<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<FriendResponseRequest>,
) -> ApiResult<Json<FriendResponseResponse>> {
    let mut user = load_current_user(&state, &current).await?;
    let message_id = parse_id(&request.message_id, "message_id")?;

    let message = user
        .profile
        .messages
        .iter_mut()
        .find(|m| m.id == message_id && m.friend_request)
        .ok_or_else(|| ApiError::NotFound("Friend request not found".to_string()))?;
    message.read = true;
    let requester_id = message.sender.id;

    if !request.accept {
        // Declines are quiet: the request is marked read, nobody is told.
        user.touch();
        state.store.update_user(user).await?;
        return Ok(Json(FriendResponseResponse { accepted: false }));
    }

    let mut requester = state
        .store
        .get_user(requester_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Requester not found".to_string()))?;

    friends::make_friends(&state.store, &state.cipher, &mut user, &mut requester).await?;

    tracing::info!(requester_id = %requester_id, "Friend request accepted");

    Ok(Json(FriendResponseResponse { accepted: true }))
}

/// Reports whether the caller owns the referenced project, gating the
/// "Collaborate" action on inbound messages.
pub async fn is_admin<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<IsAdminRequest>,
) -> ApiResult<Json<IsAdminResponse>> {
    let user = load_current_user(&state, &current).await?;
    let project_id = parse_id(&request.project_id, "project_id")?;

    Ok(Json(IsAdminResponse {
        is_admin: user.profile.owns_project(project_id),
    }))
}

/// Marks inbox messages as read.
pub async fn set_read<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<SetMessagesReadRequest>,
) -> ApiResult<Json<SetMessagesReadResponse>> {
    let mut ids = Vec::with_capacity(request.message_ids.len());
    for id in &request.message_ids {
        ids.push(parse_id(id, "message_ids")?);
    }

    let mut user = load_current_user(&state, &current).await?;
    let mut updated = 0;
    for message in user.profile.messages.iter_mut() {
        if ids.contains(&message.id) && !message.read {
            message.read = true;
            updated += 1;
        }
    }
    if updated > 0 {
        user.touch();
        state.store.update_user(user).await?;
    }

    Ok(Json(SetMessagesReadResponse { updated }))
}

/// Sends a message to several recipients, skipping those who blocked the
/// sender.
pub async fn send_group_message<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<GroupMessageRequest>,
) -> ApiResult<Json<GroupMessageResponse>> {
    if request.text.trim().is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    let sender = load_current_user(&state, &current).await?;
    let project = project_context(&state, request.project_id.as_deref()).await?;

    let mut delivered = 0;
    let mut skipped = 0;
    for recipient_id in &request.recipient_ids {
        let recipient_id = parse_id(recipient_id, "recipient_ids")?;
        let Some(mut recipient) = state.store.get_user(recipient_id).await? else {
            tracing::warn!(recipient_id = %recipient_id, "Group message recipient not found");
            skipped += 1;
            continue;
        };

        match messaging::send_inbox_message(
            &state.store,
            &state.cipher,
            &sender,
            &mut recipient,
            &request.text,
            project.clone(),
            false,
        )
        .await
        {
            Ok(_) => delivered += 1,
            Err(ApiError::Blocked) => {
                // A hard failure here would leak block state to the
                // sender; skip quietly.
                tracing::debug!(recipient_id = %recipient_id, "Group message recipient skipped");
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(delivered, skipped, "Group message sent");

    Ok(Json(GroupMessageResponse { delivered, skipped }))
}
