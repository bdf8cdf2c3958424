//! In-memory store implementing every repository trait.
//!
//! Backed by [`tokio::sync::RwLock`]-protected [`BTreeMap`]s, one per
//! record family. In production the stores are backed by `PostgreSQL`
//! (`pulse-db`); the in-memory store is sufficient for tests and for
//! embedding a throwaway dev server.
//!
//! Each mutation takes a single write lock, so the atomic-verb contract
//! of the traits (guarded set-add, list-append, find-or-create) holds
//! exactly under serialized calls.

use std::collections::BTreeMap;

use async_trait::async_trait;
use pulse_types::{
    ActorIdentity, Comment, CommentId, Conversation, ConversationId, Message, MessageId,
    Notification, NotificationId, Post, PostId, User, UserId,
};
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::repo::{ContentRepo, ConversationRepo, IdentityRepo, NotificationRepo, ProfilePatch};

/// In-memory implementation of all four record stores.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<BTreeMap<UserId, User>>,
    posts: RwLock<BTreeMap<PostId, Post>>,
    comments: RwLock<BTreeMap<CommentId, Comment>>,
    conversations: RwLock<BTreeMap<ConversationId, Conversation>>,
    messages: RwLock<BTreeMap<MessageId, Message>>,
    notifications: RwLock<BTreeMap<NotificationId, Notification>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations currently held (test observability).
    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

// ---------------------------------------------------------------------------
// IdentityRepo
// ---------------------------------------------------------------------------

#[async_trait]
impl IdentityRepo for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), CoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(CoreError::Validation("Email already in use".to_owned()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, CoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn identity_of(&self, id: UserId) -> Result<Option<ActorIdentity>, CoreError> {
        Ok(self.users.read().await.get(&id).map(|u| {
            ActorIdentity::resolved(u.id, u.username.clone(), u.profile_picture.clone())
        }))
    }

    async fn is_following(&self, follower: UserId, followee: UserId) -> Result<bool, CoreError> {
        Ok(self
            .users
            .read()
            .await
            .get(&follower)
            .is_some_and(|u| u.following.contains(&followee)))
    }

    async fn add_following(&self, user: UserId, target: UserId) -> Result<(), CoreError> {
        let mut users = self.users.write().await;
        if let Some(u) = users.get_mut(&user)
            && !u.following.contains(&target)
        {
            u.following.push(target);
        }
        Ok(())
    }

    async fn remove_following(&self, user: UserId, target: UserId) -> Result<(), CoreError> {
        let mut users = self.users.write().await;
        if let Some(u) = users.get_mut(&user) {
            u.following.retain(|id| *id != target);
        }
        Ok(())
    }

    async fn add_follower(&self, user: UserId, follower: UserId) -> Result<(), CoreError> {
        let mut users = self.users.write().await;
        if let Some(u) = users.get_mut(&user)
            && !u.followers.contains(&follower)
        {
            u.followers.push(follower);
        }
        Ok(())
    }

    async fn remove_follower(&self, user: UserId, follower: UserId) -> Result<(), CoreError> {
        let mut users = self.users.write().await;
        if let Some(u) = users.get_mut(&user) {
            u.followers.retain(|id| *id != follower);
        }
        Ok(())
    }

    async fn toggle_bookmark(&self, user: UserId, post: PostId) -> Result<bool, CoreError> {
        let mut users = self.users.write().await;
        let u = users
            .get_mut(&user)
            .ok_or_else(|| CoreError::NotFound("User not found".to_owned()))?;
        if u.bookmarks.contains(&post) {
            u.bookmarks.retain(|id| *id != post);
            Ok(false)
        } else {
            u.bookmarks.push(post);
            Ok(true)
        }
    }

    async fn update_profile(
        &self,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<Option<User>, CoreError> {
        let mut users = self.users.write().await;
        let Some(u) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(bio) = patch.bio {
            u.bio = Some(bio);
        }
        if let Some(gender) = patch.gender {
            u.gender = Some(gender);
        }
        if let Some(picture) = patch.profile_picture {
            u.profile_picture = Some(picture);
        }
        Ok(Some(u.clone()))
    }

    async fn suggested_users(&self, excluding: UserId) -> Result<Vec<User>, CoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.id != excluding)
            .cloned()
            .collect())
    }

    async fn attach_post(&self, user: UserId, post: PostId) -> Result<(), CoreError> {
        let mut users = self.users.write().await;
        if let Some(u) = users.get_mut(&user)
            && !u.posts.contains(&post)
        {
            u.posts.push(post);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ContentRepo
// ---------------------------------------------------------------------------

#[async_trait]
impl ContentRepo for MemoryStore {
    async fn insert_post(&self, post: &Post) -> Result<(), CoreError> {
        self.posts.write().await.insert(post.id, post.clone());
        Ok(())
    }

    async fn fetch_post(&self, id: PostId) -> Result<Option<Post>, CoreError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn delete_post(&self, id: PostId) -> Result<(), CoreError> {
        self.posts.write().await.remove(&id);
        Ok(())
    }

    async fn all_posts(&self) -> Result<Vec<Post>, CoreError> {
        let mut posts: Vec<Post> = self.posts.read().await.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn posts_by(&self, author: UserId) -> Result<Vec<Post>, CoreError> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| p.author == author)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn add_like(&self, post: PostId, user: UserId) -> Result<bool, CoreError> {
        let mut posts = self.posts.write().await;
        let Some(p) = posts.get_mut(&post) else {
            // Guarded update against a vanished post: nothing to add.
            return Ok(false);
        };
        if p.likes.contains(&user) {
            Ok(false)
        } else {
            p.likes.push(user);
            Ok(true)
        }
    }

    async fn remove_like(&self, post: PostId, user: UserId) -> Result<(), CoreError> {
        let mut posts = self.posts.write().await;
        if let Some(p) = posts.get_mut(&post) {
            p.likes.retain(|id| *id != user);
        }
        Ok(())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), CoreError> {
        self.comments
            .write()
            .await
            .insert(comment.id, comment.clone());
        Ok(())
    }

    async fn append_comment(&self, post: PostId, comment: CommentId) -> Result<(), CoreError> {
        let mut posts = self.posts.write().await;
        if let Some(p) = posts.get_mut(&post) {
            p.comments.push(comment);
        }
        Ok(())
    }

    async fn fetch_comment(&self, id: CommentId) -> Result<Option<Comment>, CoreError> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), CoreError> {
        self.comments.write().await.remove(&id);
        Ok(())
    }

    async fn comments_of(&self, post: PostId) -> Result<Vec<Comment>, CoreError> {
        let mut comments: Vec<Comment> = self
            .comments
            .read()
            .await
            .values()
            .filter(|c| c.post == post)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }
}

// ---------------------------------------------------------------------------
// ConversationRepo
// ---------------------------------------------------------------------------

#[async_trait]
impl ConversationRepo for MemoryStore {
    async fn find_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Conversation>, CoreError> {
        Ok(self
            .conversations
            .read()
            .await
            .values()
            .find(|c| c.involves(a, b))
            .cloned())
    }

    async fn find_or_create_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Conversation, CoreError> {
        // Lookup and create happen under one write lock, so serialized
        // callers converge on a single conversation per unordered pair.
        let mut conversations = self.conversations.write().await;
        if let Some(existing) = conversations.values().find(|c| c.involves(a, b)) {
            return Ok(existing.clone());
        }
        let created = Conversation::between(a, b);
        conversations.insert(created.id, created.clone());
        Ok(created)
    }

    async fn insert_message(&self, message: &Message) -> Result<(), CoreError> {
        self.messages
            .write()
            .await
            .insert(message.id, message.clone());
        Ok(())
    }

    async fn append_to_thread(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), CoreError> {
        let mut conversations = self.conversations.write().await;
        let c = conversations
            .get_mut(&conversation)
            .ok_or_else(|| CoreError::NotFound("Conversation not found".to_owned()))?;
        c.messages.push(message);
        Ok(())
    }

    async fn messages_of(&self, conversation: ConversationId) -> Result<Vec<Message>, CoreError> {
        let order = self
            .conversations
            .read()
            .await
            .get(&conversation)
            .map(|c| c.messages.clone())
            .unwrap_or_default();

        // Resolve the ordered index, skipping dangling ids.
        let messages = self.messages.read().await;
        Ok(order
            .iter()
            .filter_map(|id| messages.get(id).cloned())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// NotificationRepo
// ---------------------------------------------------------------------------

#[async_trait]
impl NotificationRepo for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), CoreError> {
        self.notifications
            .write()
            .await
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn notifications_for(
        &self,
        recipient: UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, CoreError> {
        let mut records: Vec<Notification> = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records.truncate(limit);
        Ok(records)
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<u64, CoreError> {
        let mut notifications = self.notifications.write().await;
        let mut transitioned: u64 = 0;
        for n in notifications.values_mut() {
            if n.recipient == recipient && !n.is_read {
                n.is_read = true;
                transitioned = transitioned.saturating_add(1);
            }
        }
        Ok(transitioned)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let first = User::new("a".to_owned(), "same@example.com".to_owned(), "h".to_owned());
        let second = User::new("b".to_owned(), "same@example.com".to_owned(), "h".to_owned());

        assert!(store.insert_user(&first).await.is_ok());
        assert!(matches!(
            store.insert_user(&second).await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn add_like_reports_newly_added_exactly_once() {
        let store = MemoryStore::new();
        let author = UserId::new();
        let fan = UserId::new();
        let post = Post::new(author, "img".to_owned(), "c".to_owned());
        let _ = store.insert_post(&post).await;

        assert_eq!(store.add_like(post.id, fan).await.ok(), Some(true));
        assert_eq!(store.add_like(post.id, fan).await.ok(), Some(false));
        // Vanished post: guarded update adds nothing.
        assert_eq!(store.add_like(PostId::new(), fan).await.ok(), Some(false));
    }

    #[tokio::test]
    async fn find_or_create_is_order_independent() {
        let store = MemoryStore::new();
        let a = UserId::new();
        let b = UserId::new();

        let first = store.find_or_create_conversation(a, b).await.ok();
        let second = store.find_or_create_conversation(b, a).await.ok();
        assert_eq!(
            first.map(|c| c.id),
            second.map(|c| c.id),
        );
        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn messages_resolve_in_thread_order_and_skip_dangling() {
        let store = MemoryStore::new();
        let a = UserId::new();
        let b = UserId::new();
        let convo = store
            .find_or_create_conversation(a, b)
            .await
            .unwrap_or_else(|_| Conversation::between(a, b));

        let m1 = Message::new(a, b, "one".to_owned());
        let m2 = Message::new(b, a, "two".to_owned());
        for m in [&m1, &m2] {
            let _ = store.insert_message(m).await;
            let _ = store.append_to_thread(convo.id, m.id).await;
        }
        // A dangling id in the index is skipped, not an error.
        let _ = store.append_to_thread(convo.id, MessageId::new()).await;

        let texts: Vec<String> = store
            .messages_of(convo.id)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn mark_all_read_counts_transitions_only() {
        let store = MemoryStore::new();
        let recipient = UserId::new();
        let actor = UserId::new();
        for _ in 0..3 {
            let n = Notification::like(recipient, actor, PostId::new());
            let _ = store.insert_notification(&n).await;
        }

        assert_eq!(store.mark_all_read(recipient).await.ok(), Some(3));
        assert_eq!(store.mark_all_read(recipient).await.ok(), Some(0));
    }
}
