//! Session middleware.
//!
//! Every gated route resolves the caller's session before the handler
//! runs. The session token arrives in the `quillshare_session` cookie (or
//! a bearer Authorization header, which carries the same opaque token).
//! Unauthenticated access yields a plain-text 401.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::{AUTHORIZATION, COOKIE}},
    middleware::Next,
    response::{IntoResponse, Response},
};
use doc_store::DocStore;
use uuid::Uuid;

use crate::state::AppState;

/// Cookie that carries the session token.
pub const SESSION_COOKIE: &str = "quillshare_session";

/// The authenticated caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User ID.
    pub id: Uuid,
    /// The session token the request authenticated with.
    pub session_token: String,
}

/// Extracts the session token from the cookie header, falling back to a
/// bearer Authorization header.
fn extract_token(request: &Request) -> Option<String> {
    let from_cookie = request
        .headers()
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (name == SESSION_COOKIE).then(|| value.to_string())
            })
        });
    if from_cookie.is_some() {
        return from_cookie;
    }

    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}

/// Session middleware.
///
/// Resolves the session token to a server-side record, enforces the TTL,
/// and stores the authenticated user in the request extensions.
pub async fn session_middleware<S: DocStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&request) else {
        return unauthorized();
    };

    let session = match state.sessions.get(&token).await {
        Ok(Some(session)) => session,
        Ok(None) => return unauthorized(),
        Err(e) => {
            tracing::error!(error = %e, "Session store failure");
            return unauthorized();
        }
    };

    if session.is_expired(state.config.session_ttl_secs) {
        if let Err(e) = state.sessions.remove(&token).await {
            tracing::warn!(error = %e, "Failed to evict expired session");
        }
        return unauthorized();
    }

    request.extensions_mut().insert(CurrentUser {
        id: session.user_id,
        session_token: token,
    });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_header(name: axum::http::HeaderName, value: &str) -> Request {
        Request::builder()
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let request = request_with_header(
            COOKIE,
            "theme=dark; quillshare_session=tok-123; lang=en",
        );
        assert_eq!(extract_token(&request), Some("tok-123".to_string()));
    }

    #[test]
    fn test_extract_token_from_bearer() {
        let request = request_with_header(AUTHORIZATION, "Bearer tok-456");
        assert_eq!(extract_token(&request), Some("tok-456".to_string()));
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let request = Request::builder()
            .header(COOKIE, "quillshare_session=cookie-tok")
            .header(AUTHORIZATION, "Bearer bearer-tok")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request), Some("cookie-tok".to_string()));
    }

    #[test]
    fn test_missing_token() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_token(&request), None);
    }
}
