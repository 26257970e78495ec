//! Inbox message delivery.
//!
//! All message sends funnel through here: the empty check runs before
//! encryption, the recipient's block list is consulted at send time, and
//! the body is encrypted before it is embedded in the recipient's
//! profile. Plaintext never persists.

use cipher::MessageCipher;
use doc_store::DocStore;
use entities::{InboxMessage, SenderSnapshot, User};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Delivers a message to a recipient's inbox.
///
/// Fails with `EmptyMessage` before touching the cipher, and with
/// `Blocked` when the recipient's block list contains the sender.
pub async fn send_inbox_message<S: DocStore>(
    store: &S,
    cipher: &MessageCipher,
    sender: &User,
    recipient: &mut User,
    text: &str,
    project: Option<(Uuid, String)>,
    friend_request: bool,
) -> ApiResult<InboxMessage> {
    if text.trim().is_empty() {
        return Err(ApiError::EmptyMessage);
    }
    if recipient.profile.has_blocked(sender.id) {
        return Err(ApiError::Blocked);
    }

    deliver(store, cipher, sender, recipient, text, project, friend_request).await
}

/// Delivers an automatic notification, bypassing the block check.
///
/// Used for system-generated messages such as the friend-request
/// "accepted" notice.
pub async fn send_notification<S: DocStore>(
    store: &S,
    cipher: &MessageCipher,
    sender: &User,
    recipient: &mut User,
    text: &str,
) -> ApiResult<InboxMessage> {
    deliver(store, cipher, sender, recipient, text, None, false).await
}

async fn deliver<S: DocStore>(
    store: &S,
    cipher: &MessageCipher,
    sender: &User,
    recipient: &mut User,
    text: &str,
    project: Option<(Uuid, String)>,
    friend_request: bool,
) -> ApiResult<InboxMessage> {
    let ciphertext = cipher.encrypt(text)?;

    let mut message = InboxMessage::new(
        SenderSnapshot::new(sender.id, &sender.name),
        recipient.id,
        ciphertext,
    );
    if let Some((project_id, project_title)) = project {
        message = message.with_project(project_id, project_title);
    }
    if friend_request {
        message = message.as_friend_request();
    }

    recipient.profile.push_message(message.clone());
    recipient.touch();
    store.update_user(recipient.clone()).await?;

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_store::MemoryDocStore;
    use entities::PasswordRecord;

    fn user(name: &str) -> User {
        User::new(
            format!("{name}@example.com"),
            name,
            name,
            PasswordRecord::new("salt", "hash"),
        )
    }

    fn cipher() -> MessageCipher {
        MessageCipher::from_passphrase("test-secret")
    }

    #[tokio::test]
    async fn test_body_is_encrypted_at_rest() {
        let store = MemoryDocStore::new();
        let cipher = cipher();
        let alice = store.create_user(user("alice")).await.unwrap();
        let mut bob = store.create_user(user("bob")).await.unwrap();

        send_inbox_message(&store, &cipher, &alice, &mut bob, "Let's collab", None, true)
            .await
            .unwrap();

        let stored = store.get_user(bob.id).await.unwrap().unwrap();
        let message = &stored.profile.messages[0];
        assert_ne!(message.text, "Let's collab");
        assert_eq!(cipher.decrypt(&message.text).unwrap(), "Let's collab");
        assert!(message.friend_request);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let store = MemoryDocStore::new();
        let alice = store.create_user(user("alice")).await.unwrap();
        let mut bob = store.create_user(user("bob")).await.unwrap();

        let result =
            send_inbox_message(&store, &cipher(), &alice, &mut bob, "   ", None, false).await;
        assert!(matches!(result, Err(ApiError::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_block_enforced_at_send_time() {
        let store = MemoryDocStore::new();
        let cipher = cipher();
        let alice = store.create_user(user("alice")).await.unwrap();
        let mut bob = store.create_user(user("bob")).await.unwrap();

        // A prior exchange succeeds.
        send_inbox_message(&store, &cipher, &alice, &mut bob, "hi", None, false)
            .await
            .unwrap();

        // Block added afterwards still stops the next send.
        bob.profile.blocked_users.push(alice.id);
        store.update_user(bob.clone()).await.unwrap();
        let result =
            send_inbox_message(&store, &cipher, &alice, &mut bob, "hi again", None, false).await;
        assert!(matches!(result, Err(ApiError::Blocked)));
    }

    #[tokio::test]
    async fn test_newest_first_ordering() {
        let store = MemoryDocStore::new();
        let cipher = cipher();
        let alice = store.create_user(user("alice")).await.unwrap();
        let mut bob = store.create_user(user("bob")).await.unwrap();

        send_inbox_message(&store, &cipher, &alice, &mut bob, "first", None, false)
            .await
            .unwrap();
        send_inbox_message(&store, &cipher, &alice, &mut bob, "second", None, false)
            .await
            .unwrap();

        let stored = store.get_user(bob.id).await.unwrap().unwrap();
        assert_eq!(cipher.decrypt(&stored.profile.messages[0].text).unwrap(), "second");
        assert_eq!(cipher.decrypt(&stored.profile.messages[1].text).unwrap(), "first");
    }
}
