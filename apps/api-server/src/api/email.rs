//! Email verification endpoints.
//!
//! All sends are fire-and-forget: the transport result never blocks the
//! HTTP response.

use std::sync::Arc;

use api_protocol::{SendEmailRequest, SendEmailResponse, VerifyEmailRequest, VerifyEmailResponse};
use auth::{CodePurpose, VerificationCode, generate_verification_code};
use axum::{Extension, Json, extract::State};
use doc_store::DocStore;

use crate::error::ApiResult;
use crate::middleware::CurrentUser;
use crate::services::mailer;
use crate::state::AppState;

use super::load_current_user;

async fn issue_code<S: DocStore>(
    state: &AppState<S>,
    email: &str,
    purpose: CodePurpose,
    subject: &str,
) -> ApiResult<()> {
    let code = generate_verification_code();
    state
        .codes
        .store(&VerificationCode::new(email, &code, purpose))
        .await?;

    mailer::dispatch(
        state.mailer.clone(),
        email.to_string(),
        subject.to_string(),
        format!("<p>Your verification code: <b>{code}</b></p>"),
    );

    Ok(())
}

/// Sends a registration verification code.
pub async fn send_verification<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<SendEmailRequest>,
) -> ApiResult<Json<SendEmailResponse>> {
    issue_code(
        &state,
        &request.email,
        CodePurpose::Registration,
        "Your Quillshare verification code",
    )
    .await?;

    tracing::info!("Verification code issued");

    Ok(Json(SendEmailResponse {}))
}

/// Sends a password reset code.
///
/// Responds identically whether or not the address is known, so the
/// endpoint cannot be used to probe for accounts.
pub async fn send_reset<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<SendEmailRequest>,
) -> ApiResult<Json<SendEmailResponse>> {
    if state.store.get_user_by_email(&request.email).await?.is_none() {
        tracing::info!("Password reset requested for unknown address");
        return Ok(Json(SendEmailResponse {}));
    }

    issue_code(
        &state,
        &request.email,
        CodePurpose::PasswordReset,
        "Reset your Quillshare password",
    )
    .await?;

    tracing::info!("Password reset code issued");

    Ok(Json(SendEmailResponse {}))
}

/// Sends a password change authorization code to the caller's own
/// address.
pub async fn send_change_password<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<SendEmailResponse>> {
    let user = load_current_user(&state, &current).await?;

    issue_code(
        &state,
        &user.email,
        CodePurpose::PasswordChange,
        "Confirm your Quillshare password change",
    )
    .await?;

    tracing::info!(user_id = %user.id, "Password change code issued");

    Ok(Json(SendEmailResponse {}))
}

/// Verifies a registration code.
pub async fn verify<S: DocStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<VerifyEmailRequest>,
) -> ApiResult<Json<VerifyEmailResponse>> {
    let verified = state
        .codes
        .verify_and_consume(
            &request.email,
            CodePurpose::Registration,
            &request.code,
            state.config.code_ttl_secs,
        )
        .await?;

    Ok(Json(VerifyEmailResponse { verified }))
}
