//! Per-project chat endpoints.

use std::sync::Arc;

use api_protocol::{
    ChatMessageView, CreateChatRoomRequest, CreateChatRoomResponse, GetChatMessagesResponse,
    PostChatMessageRequest, PostChatMessageResponse, SenderView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use doc_store::DocStore;
use entities::{ChatMessage, SenderSnapshot};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::services::projections;
use crate::state::AppState;

use super::{load_current_user, parse_id};

fn entity_to_view(message: &ChatMessage) -> ChatMessageView {
    ChatMessageView {
        sender: SenderView {
            id: message.sender.id.to_string(),
            name: message.sender.name.clone(),
        },
        content: message.content.clone(),
        sent_at: message.sent_at,
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

/// Lazily creates the chat room for a project.
pub async fn create_room<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateChatRoomRequest>,
) -> ApiResult<Json<CreateChatRoomResponse>> {
    let project_id = parse_id(&request.project_id, "project_id")?;
    authorize_member(&state, &current, project_id).await?;

    projections::ensure_chat_room(&state.store, project_id).await?;

    Ok(Json(CreateChatRoomResponse {}))
}

/// Appends a chat message.
///
/// Chat bodies stay plaintext, unlike inbox messages.
pub async fn post_message<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<PostChatMessageRequest>,
) -> ApiResult<Json<PostChatMessageResponse>> {
    let project_id = parse_id(&request.project_id, "project_id")?;
    authorize_member(&state, &current, project_id).await?;
    let user = load_current_user(&state, &current).await?;

    let mut room = state
        .store
        .get_chat_room_by_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chat room not found".to_string()))?;

    let message = ChatMessage::new(SenderSnapshot::new(user.id, &user.name), request.content);
    room.push_message(message.clone());
    state.store.update_chat_room(room).await?;

    tracing::info!(project_id = %project_id, "Chat message posted");

    Ok(Json(PostChatMessageResponse {
        message: entity_to_view(&message),
    }))
}

/// Returns the full chat log of a project. No pagination.
pub async fn get_chat_messages<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<GetChatMessagesResponse>> {
    let project_id = parse_id(&id, "id")?;
    authorize_member(&state, &current, project_id).await?;

    let room = state
        .store
        .get_chat_room_by_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chat room not found".to_string()))?;

    Ok(Json(GetChatMessagesResponse {
        messages: room.messages.iter().map(entity_to_view).collect(),
    }))
}
