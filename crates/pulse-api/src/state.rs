//! Shared application state for the API server.
//!
//! [`AppState`] holds the four domain services and the session keys.
//! Handlers receive it as `State(Arc<AppState>)`; the services already
//! hold their repositories behind `Arc`, so the whole state is cheap to
//! share.

use std::sync::Arc;

use pulse_core::repo::{ContentRepo, ConversationRepo, IdentityRepo, NotificationRepo};
use pulse_core::{
    AccountService, ContentService, CredentialHasher, MemoryStore, MessagingService, SocialService,
};

use crate::auth::SessionKeys;

/// Shared state behind every handler.
pub struct AppState {
    /// Registration, login verification, profiles.
    pub accounts: AccountService,
    /// Post lifecycle, bookmarks, comment listing.
    pub content: ContentService,
    /// Like/dislike/comment/follow and the notification inbox.
    pub social: SocialService,
    /// Conversation threading.
    pub messaging: MessagingService,
    /// Session token keys.
    pub keys: SessionKeys,
}

impl AppState {
    /// Assemble the state from repositories, a hasher, and the session
    /// secret.
    pub fn new(
        identities: Arc<dyn IdentityRepo>,
        content: Arc<dyn ContentRepo>,
        conversations: Arc<dyn ConversationRepo>,
        notifications: Arc<dyn NotificationRepo>,
        hasher: Arc<dyn CredentialHasher>,
        session_secret: &str,
    ) -> Self {
        Self {
            accounts: AccountService::new(Arc::clone(&identities), hasher),
            content: ContentService::new(Arc::clone(&identities), Arc::clone(&content)),
            social: SocialService::new(Arc::clone(&identities), content, notifications),
            messaging: MessagingService::new(conversations, identities),
            keys: SessionKeys::new(session_secret),
        }
    }

    /// State over a single in-memory store. Used by tests and embedded
    /// setups that do not want `PostgreSQL`.
    pub fn in_memory(hasher: Arc<dyn CredentialHasher>, session_secret: &str) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            Arc::clone(&store) as Arc<dyn IdentityRepo>,
            Arc::clone(&store) as Arc<dyn ContentRepo>,
            Arc::clone(&store) as Arc<dyn ConversationRepo>,
            store as Arc<dyn NotificationRepo>,
            hasher,
            session_secret,
        )
    }
}
