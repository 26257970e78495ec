//! Server configuration.

use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database URL.
    pub database_url: String,
    /// Whether running in dev mode (relaxed secret requirements).
    pub dev_mode: bool,
    /// Base64url 256-bit key for the message cipher (required outside dev
    /// mode).
    pub message_key: Option<String>,
    /// Session time-to-live in seconds.
    pub session_ttl_secs: i64,
    /// Verification code time-to-live in seconds.
    pub code_ttl_secs: i64,
    /// Log level.
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let dev_mode = env::var("QUILLSHARE_DEV_MODE")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true);

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:quillshare.db?mode=rwc".to_string());

        let message_key = env::var("QUILLSHARE_MESSAGE_KEY").ok();
        if !dev_mode && message_key.is_none() {
            anyhow::bail!("QUILLSHARE_MESSAGE_KEY is required outside dev mode");
        }
        if let Some(key) = &message_key {
            cipher::MessageCipher::from_base64_key(key)
                .map_err(|e| anyhow::anyhow!("invalid QUILLSHARE_MESSAGE_KEY: {e}"))?;
        }

        Ok(Self {
            host: env::var("QUILLSHARE_SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("QUILLSHARE_SERVER_PORT")
                .unwrap_or_else(|_| "47013".to_string())
                .parse()
                .unwrap_or(47013),
            database_url,
            dev_mode,
            message_key,
            session_ttl_secs: env::var("QUILLSHARE_SESSION_TTL_SECS")
                .unwrap_or_else(|_| auth::DEFAULT_SESSION_TTL_SECS.to_string())
                .parse()
                .unwrap_or(auth::DEFAULT_SESSION_TTL_SECS),
            code_ttl_secs: env::var("QUILLSHARE_CODE_TTL_SECS")
                .unwrap_or_else(|_| auth::DEFAULT_CODE_TTL_SECS.to_string())
                .parse()
                .unwrap_or(auth::DEFAULT_CODE_TTL_SECS),
            log_level: env::var("QUILLSHARE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 47013,
            database_url: "sqlite::memory:".to_string(),
            dev_mode: true,
            message_key: None,
            session_ttl_secs: auth::DEFAULT_SESSION_TTL_SECS,
            code_ttl_secs: auth::DEFAULT_CODE_TTL_SECS,
            log_level: "info".to_string(),
        }
    }
}
