//! Outbound mail dispatch.
//!
//! The transport itself is out of scope; the server only depends on this
//! trait. Every call site is fire-and-forget: failures are logged, never
//! retried, and never block the HTTP response.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Mail transport error.
#[derive(Debug, Error)]
pub enum MailError {
    /// Transport failure.
    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// Trait for outbound mail transports.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one HTML email.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// Transport that only logs. Used in dev mode and tests.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        tracing::info!(to = %to, subject = %subject, bytes = html.len(), "Email dispatched (log transport)");
        Ok(())
    }
}

/// Dispatches an email without blocking the caller. Errors are logged.
pub fn dispatch(mailer: Arc<dyn Mailer>, to: String, subject: String, html: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, &subject, &html).await {
            tracing::warn!(error = %e, to = %to, "Email send failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_sends() {
        let mailer = LogMailer;
        let result = mailer
            .send("alice@example.com", "Welcome", "<p>hello</p>")
            .await;
        assert!(result.is_ok());
    }
}
