//! API response types.

use serde::{Deserialize, Serialize};

use crate::types::*;

// ============================================================================
// Registration & Credentials
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreRegisterResponse {
    /// Single-use confirmation token, delivered out of band by email as
    /// well.
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordResponse {
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckPasswordReuseResponse {
    /// True when the candidate matches any previously used password.
    pub clash: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckCurrentPasswordResponse {
    pub valid: bool,
}

// ============================================================================
// Account & Profile
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAccountResponse {
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAccountResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileResponse {
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfileResponse {
    pub profile: PublicProfileView,
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectResponse {
    pub project: ProjectView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListProjectSummariesResponse {
    pub projects: Vec<ProjectSummaryView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadProjectsResponse {
    pub projects: Vec<ProjectView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadProjectResponse {
    pub project: ProjectView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveProjectResponse {
    pub project: ProjectView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProjectResponse {
    pub project: ProjectView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouchProjectResponse {
    pub project: ProjectView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishProjectResponse {
    pub project: ProjectView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinProjectResponse {
    pub project: ProjectView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCollaboratorResponse {
    pub project: ProjectView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCollaboratorResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteProjectResponse {}

// ============================================================================
// Folders & Files
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFoldersResponse {
    pub folders: Vec<FolderView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFolderResponse {
    pub folder: FolderView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetFileResponse {
    pub file: FileView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFileResponse {
    pub file: FileView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFileResponse {
    pub file: FileView,
}

// ============================================================================
// Messages & Friends
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMessagesResponse {
    pub messages: Vec<InboxMessageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetMessagesReadResponse {
    pub updated: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendResponseResponse {
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessageResponse {
    pub delivered: u32,
    /// Recipients skipped because they had blocked the sender.
    pub skipped: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFriendResponse {
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockUserResponse {
    pub session: SessionView,
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostChatMessageResponse {
    pub message: ChatMessageView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetChatMessagesResponse {
    pub messages: Vec<ChatMessageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRoomResponse {}

// ============================================================================
// Email
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailResponse {
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailResponse {}
