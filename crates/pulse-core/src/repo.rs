//! Injectable repository traits over the four record stores.
//!
//! Services never touch a database directly; they speak these traits.
//! Mutation verbs are deliberately atomic (guarded set-add, set-remove,
//! list-append, find-or-create) rather than read-modify-write round
//! trips, which bounds the race window when concurrent requests target
//! the same record. The Postgres implementations live in `pulse-db`; an
//! in-memory implementation for tests and embedded use lives in
//! [`crate::memory`].

use async_trait::async_trait;
use pulse_types::{
    ActorIdentity, Comment, CommentId, Conversation, ConversationId, Gender, Message, MessageId,
    Notification, Post, PostId, User, UserId,
};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Identity store (users + follow graph)
// ---------------------------------------------------------------------------

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    /// New bio text.
    pub bio: Option<String>,
    /// New gender.
    pub gender: Option<Gender>,
    /// New profile picture reference from the blob store.
    pub profile_picture: Option<String>,
}

/// The user store and follow graph.
#[async_trait]
pub trait IdentityRepo: Send + Sync {
    /// Insert a freshly registered user.
    ///
    /// Fails with [`CoreError::Validation`] when the email is already
    /// registered.
    async fn insert_user(&self, user: &User) -> Result<(), CoreError>;

    /// Fetch a user by id.
    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, CoreError>;

    /// Look a user up by email (login path).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError>;

    /// Resolve the display identity for a user id.
    ///
    /// `Ok(None)` means the account no longer exists; callers degrade to
    /// [`ActorIdentity::unknown`] rather than failing the parent read.
    async fn identity_of(&self, id: UserId) -> Result<Option<ActorIdentity>, CoreError>;

    /// Whether `follower`'s following set contains `followee`.
    async fn is_following(&self, follower: UserId, followee: UserId) -> Result<bool, CoreError>;

    /// Add `target` to `user`'s following set (idempotent set-add).
    async fn add_following(&self, user: UserId, target: UserId) -> Result<(), CoreError>;

    /// Remove `target` from `user`'s following set (idempotent).
    async fn remove_following(&self, user: UserId, target: UserId) -> Result<(), CoreError>;

    /// Add `follower` to `user`'s followers set (idempotent set-add).
    async fn add_follower(&self, user: UserId, follower: UserId) -> Result<(), CoreError>;

    /// Remove `follower` from `user`'s followers set (idempotent).
    async fn remove_follower(&self, user: UserId, follower: UserId) -> Result<(), CoreError>;

    /// Toggle a post in the user's bookmark set.
    ///
    /// Returns `true` when the post is now bookmarked, `false` when the
    /// toggle removed it.
    async fn toggle_bookmark(&self, user: UserId, post: PostId) -> Result<bool, CoreError>;

    /// Apply a partial profile update, returning the updated record.
    async fn update_profile(
        &self,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<Option<User>, CoreError>;

    /// Every user except `excluding` (the suggested-user listing).
    async fn suggested_users(&self, excluding: UserId) -> Result<Vec<User>, CoreError>;

    /// Append a post id to the author's denormalized `posts` index.
    async fn attach_post(&self, user: UserId, post: PostId) -> Result<(), CoreError>;
}

// ---------------------------------------------------------------------------
// Content store (posts + comments)
// ---------------------------------------------------------------------------

/// The post and comment store.
///
/// Deleting a post or comment leaves any denormalized index entries
/// (`user.posts`, `post.comments`) dangling; reads reconcile by skipping
/// ids that no longer resolve.
#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Insert a new post.
    async fn insert_post(&self, post: &Post) -> Result<(), CoreError>;

    /// Fetch a post by id.
    async fn fetch_post(&self, id: PostId) -> Result<Option<Post>, CoreError>;

    /// Delete a post by id (idempotent).
    async fn delete_post(&self, id: PostId) -> Result<(), CoreError>;

    /// All posts, newest first.
    async fn all_posts(&self) -> Result<Vec<Post>, CoreError>;

    /// Posts by one author, newest first.
    async fn posts_by(&self, author: UserId) -> Result<Vec<Post>, CoreError>;

    /// Guarded set-add of `user` to the post's like set.
    ///
    /// Returns `true` only when the user was newly added -- the signal
    /// the fan-out uses to create at most one notification.
    async fn add_like(&self, post: PostId, user: UserId) -> Result<bool, CoreError>;

    /// Set-remove of `user` from the post's like set (idempotent).
    async fn remove_like(&self, post: PostId, user: UserId) -> Result<(), CoreError>;

    /// Insert a standalone comment record.
    async fn insert_comment(&self, comment: &Comment) -> Result<(), CoreError>;

    /// Append a comment id to the post's ordered comment index.
    async fn append_comment(&self, post: PostId, comment: CommentId) -> Result<(), CoreError>;

    /// Fetch a comment by id.
    async fn fetch_comment(&self, id: CommentId) -> Result<Option<Comment>, CoreError>;

    /// Delete a comment by id (idempotent).
    async fn delete_comment(&self, id: CommentId) -> Result<(), CoreError>;

    /// Comments on a post, newest first.
    async fn comments_of(&self, post: PostId) -> Result<Vec<Comment>, CoreError>;
}

// ---------------------------------------------------------------------------
// Conversation store (threads + messages)
// ---------------------------------------------------------------------------

/// The conversation and message store.
#[async_trait]
pub trait ConversationRepo: Send + Sync {
    /// Find the conversation for the unordered pair `{a, b}`, if any.
    async fn find_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Conversation>, CoreError>;

    /// Find the conversation for the unordered pair `{a, b}`, creating an
    /// empty one when the lookup misses.
    ///
    /// Implementations must make serialized calls converge on a single
    /// conversation per pair. The Postgres store backs this with a unique
    /// index on the sorted pair and re-selects on conflict.
    async fn find_or_create_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Conversation, CoreError>;

    /// Persist a new message record.
    async fn insert_message(&self, message: &Message) -> Result<(), CoreError>;

    /// Append a message id to the conversation's thread (list-append,
    /// never reorders).
    async fn append_to_thread(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), CoreError>;

    /// The conversation's messages in stored (send) order.
    async fn messages_of(&self, conversation: ConversationId) -> Result<Vec<Message>, CoreError>;
}

// ---------------------------------------------------------------------------
// Notification store
// ---------------------------------------------------------------------------

/// The notification store.
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    /// Persist a new notification. Records are immutable afterwards except
    /// for the read flag.
    async fn insert_notification(&self, notification: &Notification) -> Result<(), CoreError>;

    /// Notifications for a recipient, newest first, capped at `limit`.
    async fn notifications_for(
        &self,
        recipient: UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, CoreError>;

    /// Flip every unread notification for the recipient to read.
    /// Idempotent; returns the number of records transitioned.
    async fn mark_all_read(&self, recipient: UserId) -> Result<u64, CoreError>;
}
