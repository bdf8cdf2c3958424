//! Conversation threading: find-or-create a two-party conversation and
//! append messages to it.
//!
//! A conversation has exactly two states -- it does not exist, or it
//! exists with zero or more messages. The only transition is creation on
//! first message; there is no deletion or archival. Reading a thread that
//! was never started is a valid, non-exceptional state and yields an
//! empty sequence.
//!
//! The conversation update and the message insert are two writes with no
//! surrounding transaction. Both must succeed for the call to report
//! success; a failure between them surfaces as a storage error and the
//! caller must treat the state as unknown.

use std::collections::BTreeMap;
use std::sync::Arc;

use pulse_types::{ActorIdentity, Message, MessageView, UserId};
use tracing::{debug, info};

use crate::enrich::display_identity;
use crate::error::CoreError;
use crate::repo::{ConversationRepo, IdentityRepo};

/// The messaging service: conversation threading over the conversation
/// store, with sender identity enrichment at read time.
#[derive(Clone)]
pub struct MessagingService {
    conversations: Arc<dyn ConversationRepo>,
    identities: Arc<dyn IdentityRepo>,
}

impl MessagingService {
    /// Build the service over its stores.
    pub fn new(
        conversations: Arc<dyn ConversationRepo>,
        identities: Arc<dyn IdentityRepo>,
    ) -> Self {
        Self {
            conversations,
            identities,
        }
    }

    /// Send a direct message from `sender` to `receiver`.
    ///
    /// Finds the conversation for the unordered pair `{sender, receiver}`,
    /// creating it on first contact, then appends the new message to the
    /// thread. Sender identity is resolved at read time, not stored
    /// denormalized.
    ///
    /// Self-messaging (`sender == receiver`) is deliberately not guarded;
    /// the degenerate pair threads like any other.
    pub async fn send_message(
        &self,
        sender: UserId,
        receiver: UserId,
        text: String,
    ) -> Result<MessageView, CoreError> {
        let conversation = self
            .conversations
            .find_or_create_conversation(sender, receiver)
            .await?;

        let message = Message::new(sender, receiver, text);
        self.conversations.insert_message(&message).await?;
        self.conversations
            .append_to_thread(conversation.id, message.id)
            .await?;

        info!(
            conversation = %conversation.id,
            message = %message.id,
            "message appended to thread"
        );

        let sender_identity = display_identity(self.identities.as_ref(), sender).await;
        Ok(MessageView {
            message,
            sender: sender_identity,
        })
    }

    /// The full thread between `requester` and `counterpart`, oldest
    /// first, each message enriched with its sender's display identity.
    ///
    /// Returns an empty sequence when no conversation exists yet. No
    /// pagination: the full history is returned every call.
    pub async fn thread(
        &self,
        requester: UserId,
        counterpart: UserId,
    ) -> Result<Vec<MessageView>, CoreError> {
        let Some(conversation) = self
            .conversations
            .find_conversation(requester, counterpart)
            .await?
        else {
            debug!(%requester, %counterpart, "no conversation yet, returning empty thread");
            return Ok(Vec::new());
        };

        let messages = self.conversations.messages_of(conversation.id).await?;

        // Resolve each distinct sender once per read.
        let mut identities: BTreeMap<UserId, ActorIdentity> = BTreeMap::new();
        let mut views = Vec::with_capacity(messages.len());
        for message in messages {
            if !identities.contains_key(&message.sender) {
                let identity = display_identity(self.identities.as_ref(), message.sender).await;
                identities.insert(message.sender, identity);
            }
            let sender = identities
                .get(&message.sender)
                .cloned()
                .unwrap_or_else(|| ActorIdentity::unknown(message.sender));
            views.push(MessageView { message, sender });
        }

        Ok(views)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use pulse_types::{User, UNKNOWN_USERNAME};

    fn service(store: &Arc<MemoryStore>) -> MessagingService {
        MessagingService::new(store.clone(), store.clone())
    }

    async fn seed_user(store: &MemoryStore, name: &str) -> UserId {
        let user = User::new(name.to_owned(), format!("{name}@example.com"), "h".to_owned());
        let id = user.id;
        let _ = store.insert_user(&user).await;
        id
    }

    #[tokio::test]
    async fn first_message_creates_the_conversation() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let sent = svc.send_message(a, b, "hi".to_owned()).await;
        assert!(sent.is_ok());

        let convo = store.find_conversation(a, b).await.ok().flatten();
        assert!(convo.is_some());
        assert_eq!(convo.map(|c| c.messages.len()), Some(1));
    }

    #[tokio::test]
    async fn replies_land_in_the_same_conversation_in_order() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let a = seed_user(&store, "u1").await;
        let b = seed_user(&store, "u2").await;

        let first = svc.send_message(a, b, "hi".to_owned()).await;
        let second = svc.send_message(b, a, "hello".to_owned()).await;
        assert!(first.is_ok());
        assert!(second.is_ok());

        // Exactly one conversation for the unordered pair.
        let convo = store.find_conversation(b, a).await.ok().flatten();
        assert_eq!(convo.as_ref().map(|c| c.messages.len()), Some(2));

        // Both read directions return the same ordered thread.
        let forward = svc.thread(a, b).await.unwrap_or_default();
        let backward = svc.thread(b, a).await.unwrap_or_default();
        let texts = |views: &[MessageView]| {
            views
                .iter()
                .map(|v| v.message.text.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(texts(&forward), vec!["hi", "hello"]);
        assert_eq!(texts(&forward), texts(&backward));
    }

    #[tokio::test]
    async fn serialized_sends_never_duplicate_the_pair_conversation() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        for i in 0..6u8 {
            let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
            let sent = svc.send_message(from, to, format!("m{i}")).await;
            assert!(sent.is_ok());
        }

        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn thread_before_first_message_is_empty_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let thread = svc.thread(a, b).await;
        assert!(matches!(thread, Ok(ref v) if v.is_empty()));
    }

    #[tokio::test]
    async fn self_message_threads_normally() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let a = seed_user(&store, "solo").await;

        let sent = svc.send_message(a, a, "note to self".to_owned()).await;
        assert!(sent.is_ok());

        let thread = svc.thread(a, a).await.unwrap_or_default();
        assert_eq!(thread.len(), 1);
        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn messages_are_enriched_with_sender_identity() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let a = seed_user(&store, "ada").await;
        let b = seed_user(&store, "bob").await;

        let sent = svc.send_message(a, b, "hi".to_owned()).await;
        assert_eq!(sent.ok().map(|v| v.sender.username), Some("ada".to_owned()));

        let thread = svc.thread(a, b).await.unwrap_or_default();
        assert_eq!(
            thread.first().map(|v| v.sender.username.as_str()),
            Some("ada")
        );
    }

    #[tokio::test]
    async fn missing_sender_degrades_to_placeholder_identity() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        // Sender was never registered -- enrichment must not fail the send.
        let ghost = UserId::new();
        let b = seed_user(&store, "b").await;

        let sent = svc.send_message(ghost, b, "boo".to_owned()).await;
        assert_eq!(
            sent.ok().map(|v| v.sender.username),
            Some(UNKNOWN_USERNAME.to_owned())
        );
    }
}
