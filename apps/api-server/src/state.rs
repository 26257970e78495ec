//! Application state.

use std::sync::Arc;

use auth::{CodeStore, MemoryCodeStore, MemorySessionStore, SessionStore};
use cipher::MessageCipher;
use doc_store::DocStore;

use crate::config::Config;
use crate::services::mailer::{LogMailer, Mailer};

/// Shared application state.
pub struct AppState<S: DocStore> {
    /// Server configuration.
    pub config: Config,
    /// Document store.
    pub store: S,
    /// Server-side session records.
    pub sessions: Arc<dyn SessionStore>,
    /// Pending email verification codes.
    pub codes: Arc<dyn CodeStore>,
    /// Message cipher for inbox bodies.
    pub cipher: MessageCipher,
    /// Outbound mail transport.
    pub mailer: Arc<dyn Mailer>,
}

impl<S: DocStore> AppState<S> {
    /// Creates new application state.
    pub fn new(config: Config, store: S) -> Self {
        // Config::from_env validates the key and only allows it to be
        // missing in dev mode.
        let cipher = match config.message_key.as_deref() {
            Some(key) => MessageCipher::from_base64_key(key)
                .unwrap_or_else(|e| panic!("invalid QUILLSHARE_MESSAGE_KEY: {e}")),
            None => MessageCipher::from_passphrase("quillshare-dev-secret"),
        };

        Self {
            config,
            store,
            sessions: Arc::new(MemorySessionStore::new()),
            codes: Arc::new(MemoryCodeStore::new()),
            cipher,
            mailer: Arc::new(LogMailer),
        }
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Creates shared state from config and store.
pub fn create_shared_state<S: DocStore>(config: Config, store: S) -> SharedState<S> {
    Arc::new(AppState::new(config, store))
}
