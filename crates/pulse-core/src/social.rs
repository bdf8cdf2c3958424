//! Social actions and their notification fan-out.
//!
//! Like, comment, and follow mutate the content/identity stores; like and
//! comment additionally write a notification when the actor is not the
//! post's author. Each fan-out is keyed off the *outcome* of an atomic
//! set operation (a like that was already present writes nothing), which
//! is what makes the like path idempotent end to end.
//!
//! Deliberate gaps carried over from the current product behavior:
//! dislike never retracts a previously issued like notification, and the
//! follow toggle emits no notification at all even though the kind exists
//! in the model.

use std::collections::BTreeMap;
use std::sync::Arc;

use pulse_types::{
    ActorIdentity, Comment, CommentId, CommentView, Notification, NotificationView, PostId,
    PostSummary, UserId,
};
use tracing::{debug, info, warn};

use crate::enrich::display_identity;
use crate::error::CoreError;
use crate::repo::{ContentRepo, IdentityRepo, NotificationRepo};

/// Maximum number of notifications returned per listing.
const NOTIFICATION_LIMIT: usize = 50;

/// Outcome of the follow toggle, used by the API layer for its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// The actor now follows the target.
    Followed,
    /// The actor no longer follows the target.
    Unfollowed,
}

/// The social-action service: like/dislike/comment/follow plus the
/// notification reads.
#[derive(Clone)]
pub struct SocialService {
    identities: Arc<dyn IdentityRepo>,
    content: Arc<dyn ContentRepo>,
    notifications: Arc<dyn NotificationRepo>,
}

impl SocialService {
    /// Build the service over its stores.
    pub fn new(
        identities: Arc<dyn IdentityRepo>,
        content: Arc<dyn ContentRepo>,
        notifications: Arc<dyn NotificationRepo>,
    ) -> Self {
        Self {
            identities,
            content,
            notifications,
        }
    }

    /// Like a post.
    ///
    /// Idempotent: a repeated like is a successful no-op and writes no
    /// second notification. Self-likes never notify.
    pub async fn like(&self, user: UserId, post_id: PostId) -> Result<(), CoreError> {
        let post = self
            .content
            .fetch_post(post_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Post not found".to_owned()))?;

        let newly_added = self.content.add_like(post_id, user).await?;
        if newly_added && post.author != user {
            self.notifications
                .insert_notification(&Notification::like(post.author, user, post_id))
                .await?;
            info!(actor = %user, recipient = %post.author, post = %post_id, "like notification created");
        }
        Ok(())
    }

    /// Remove a like from a post.
    ///
    /// Idempotent if the like was never present. A previously issued like
    /// notification is left intact -- there is no compensating delete.
    pub async fn dislike(&self, user: UserId, post_id: PostId) -> Result<(), CoreError> {
        if self.content.fetch_post(post_id).await?.is_none() {
            return Err(CoreError::NotFound("Post not found".to_owned()));
        }
        self.content.remove_like(post_id, user).await
    }

    /// Add a comment to a post.
    ///
    /// Rejects text that is empty after trimming. Fans out a comment
    /// notification to the post author unless the commenter is the author.
    pub async fn add_comment(
        &self,
        user: UserId,
        post_id: PostId,
        text: &str,
    ) -> Result<CommentView, CoreError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation("Comment text required".to_owned()));
        }

        let post = self
            .content
            .fetch_post(post_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Post not found".to_owned()))?;

        let comment = Comment::new(post_id, user, trimmed.to_owned());
        self.content.insert_comment(&comment).await?;
        self.content.append_comment(post_id, comment.id).await?;

        if post.author != user {
            self.notifications
                .insert_notification(&Notification::comment(post.author, user, post_id))
                .await?;
            info!(actor = %user, recipient = %post.author, post = %post_id, "comment notification created");
        }

        let author = display_identity(self.identities.as_ref(), user).await;
        Ok(CommentView { comment, author })
    }

    /// Delete a comment. Only the comment's author may delete it.
    pub async fn delete_comment(
        &self,
        user: UserId,
        comment_id: CommentId,
    ) -> Result<(), CoreError> {
        let comment = self
            .content
            .fetch_comment(comment_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Comment not found".to_owned()))?;

        if comment.author != user {
            return Err(CoreError::Forbidden("Not authorized to delete".to_owned()));
        }

        // The post's comment index is not pulled; dangling ids are
        // reconciled on read.
        self.content.delete_comment(comment_id).await
    }

    /// Toggle the follow relation from `follower` to `followee`.
    ///
    /// Self-follow is rejected. The two directional set updates are
    /// independent operations, not a transaction; brief asymmetry under
    /// concurrent toggles is tolerated. No follow notification is emitted.
    pub async fn follow_or_unfollow(
        &self,
        follower: UserId,
        followee: UserId,
    ) -> Result<FollowOutcome, CoreError> {
        if follower == followee {
            return Err(CoreError::Validation(
                "You cannot follow yourself".to_owned(),
            ));
        }

        let both_exist = self.identities.fetch_user(follower).await?.is_some()
            && self.identities.fetch_user(followee).await?.is_some();
        if !both_exist {
            return Err(CoreError::NotFound("User not found".to_owned()));
        }

        if self.identities.is_following(follower, followee).await? {
            self.identities.remove_following(follower, followee).await?;
            self.identities.remove_follower(followee, follower).await?;
            debug!(%follower, %followee, "unfollowed");
            Ok(FollowOutcome::Unfollowed)
        } else {
            self.identities.add_following(follower, followee).await?;
            self.identities.add_follower(followee, follower).await?;
            debug!(%follower, %followee, "followed");
            Ok(FollowOutcome::Followed)
        }
    }

    /// The recipient's notifications, newest first, capped at 50, each
    /// enriched with the actor's display identity and -- when the weak
    /// post reference still resolves -- a post summary.
    pub async fn notifications(&self, user: UserId) -> Result<Vec<NotificationView>, CoreError> {
        let records = self
            .notifications
            .notifications_for(user, NOTIFICATION_LIMIT)
            .await?;

        let mut identities: BTreeMap<UserId, ActorIdentity> = BTreeMap::new();
        let mut views = Vec::with_capacity(records.len());
        for record in &records {
            if !identities.contains_key(&record.actor) {
                let identity = display_identity(self.identities.as_ref(), record.actor).await;
                identities.insert(record.actor, identity);
            }
            let actor = identities
                .get(&record.actor)
                .cloned()
                .unwrap_or_else(|| ActorIdentity::unknown(record.actor));

            let post = match record.post {
                Some(post_id) => self.post_summary(post_id).await,
                None => None,
            };

            views.push(NotificationView::of(record, actor, post));
        }
        Ok(views)
    }

    /// Mark every unread notification for `user` as read. Idempotent.
    pub async fn mark_all_read(&self, user: UserId) -> Result<(), CoreError> {
        let transitioned = self.notifications.mark_all_read(user).await?;
        debug!(%user, transitioned, "notifications marked read");
        Ok(())
    }

    /// Resolve the weak post reference on a notification. A vanished post
    /// yields `None`, never an error.
    async fn post_summary(&self, post_id: PostId) -> Option<PostSummary> {
        match self.content.fetch_post(post_id).await {
            Ok(Some(post)) => {
                let author = display_identity(self.identities.as_ref(), post.author).await;
                Some(PostSummary::of(&post, author))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(post = %post_id, error = %e, "post summary lookup failed, omitting");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use pulse_types::{NotificationKind, Post, User};

    fn service(store: &Arc<MemoryStore>) -> SocialService {
        SocialService::new(store.clone(), store.clone(), store.clone())
    }

    async fn seed_user(store: &MemoryStore, name: &str) -> UserId {
        let user = User::new(name.to_owned(), format!("{name}@example.com"), "h".to_owned());
        let id = user.id;
        let _ = store.insert_user(&user).await;
        id
    }

    async fn seed_post(store: &MemoryStore, author: UserId) -> PostId {
        let post = Post::new(author, "img://1".to_owned(), "caption".to_owned());
        let id = post.id;
        let _ = store.insert_post(&post).await;
        id
    }

    #[tokio::test]
    async fn like_is_idempotent_and_notifies_once() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "author").await;
        let fan = seed_user(&store, "fan").await;
        let post = seed_post(&store, author).await;

        assert!(svc.like(fan, post).await.is_ok());
        assert!(svc.like(fan, post).await.is_ok());

        let likes = store
            .fetch_post(post)
            .await
            .ok()
            .flatten()
            .map(|p| p.likes.len());
        assert_eq!(likes, Some(1));

        let inbox = store.notifications_for(author, 50).await.unwrap_or_default();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox.first().map(|n| n.kind), Some(NotificationKind::Like));
        assert_eq!(inbox.first().map(|n| n.actor), Some(fan));
    }

    #[tokio::test]
    async fn self_like_never_notifies() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "author").await;
        let post = seed_post(&store, author).await;

        assert!(svc.like(author, post).await.is_ok());

        let inbox = store.notifications_for(author, 50).await.unwrap_or_default();
        assert!(inbox.is_empty());
    }

    #[tokio::test]
    async fn dislike_removes_the_like_but_leaves_the_notification() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "author").await;
        let fan = seed_user(&store, "fan").await;
        let post = seed_post(&store, author).await;

        assert!(svc.like(fan, post).await.is_ok());
        assert!(svc.dislike(fan, post).await.is_ok());
        // Idempotent when already absent.
        assert!(svc.dislike(fan, post).await.is_ok());

        let likes = store
            .fetch_post(post)
            .await
            .ok()
            .flatten()
            .map(|p| p.likes.len());
        assert_eq!(likes, Some(0));

        // No compensating delete of the like notification.
        let inbox = store.notifications_for(author, 50).await.unwrap_or_default();
        assert_eq!(inbox.len(), 1);
    }

    #[tokio::test]
    async fn like_of_missing_post_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let fan = seed_user(&store, "fan").await;

        let outcome = svc.like(fan, PostId::new()).await;
        assert!(matches!(outcome, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn comment_fan_out_and_empty_text_rejection() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "author").await;
        let fan = seed_user(&store, "fan").await;
        let post = seed_post(&store, author).await;

        let rejected = svc.add_comment(fan, post, "   ").await;
        assert!(matches!(rejected, Err(CoreError::Validation(_))));

        let added = svc.add_comment(fan, post, "  nice shot  ").await;
        assert_eq!(
            added.ok().map(|v| v.comment.text),
            Some("nice shot".to_owned())
        );

        let inbox = store.notifications_for(author, 50).await.unwrap_or_default();
        assert_eq!(
            inbox.first().map(|n| n.kind),
            Some(NotificationKind::Comment)
        );

        // Author commenting on their own post: no fan-out.
        let own = svc.add_comment(author, post, "thanks!").await;
        assert!(own.is_ok());
        let inbox = store.notifications_for(author, 50).await.unwrap_or_default();
        assert_eq!(inbox.len(), 1);
    }

    #[tokio::test]
    async fn only_the_author_may_delete_a_comment() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "author").await;
        let fan = seed_user(&store, "fan").await;
        let stranger = seed_user(&store, "stranger").await;
        let post = seed_post(&store, author).await;

        let comment_id = svc
            .add_comment(fan, post, "hot take")
            .await
            .ok()
            .map(|v| v.comment.id);
        let Some(comment_id) = comment_id else {
            assert!(comment_id.is_some());
            return;
        };

        let denied = svc.delete_comment(stranger, comment_id).await;
        assert!(matches!(denied, Err(CoreError::Forbidden(_))));
        assert!(store.fetch_comment(comment_id).await.ok().flatten().is_some());

        let allowed = svc.delete_comment(fan, comment_id).await;
        assert!(allowed.is_ok());
        assert!(store.fetch_comment(comment_id).await.ok().flatten().is_none());
    }

    #[tokio::test]
    async fn self_follow_is_rejected_without_mutation() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let a = seed_user(&store, "a").await;

        let outcome = svc.follow_or_unfollow(a, a).await;
        assert!(matches!(outcome, Err(CoreError::Validation(_))));

        let user = store.fetch_user(a).await.ok().flatten();
        assert_eq!(user.as_ref().map(|u| u.following.len()), Some(0));
        assert_eq!(user.as_ref().map(|u| u.followers.len()), Some(0));
    }

    #[tokio::test]
    async fn follow_toggle_updates_both_sides_and_reverses() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let first = svc.follow_or_unfollow(a, b).await;
        assert_eq!(first.ok(), Some(FollowOutcome::Followed));

        let follower = store.fetch_user(a).await.ok().flatten();
        let followee = store.fetch_user(b).await.ok().flatten();
        assert_eq!(
            follower.as_ref().map(|u| u.following.contains(&b)),
            Some(true)
        );
        assert_eq!(
            followee.as_ref().map(|u| u.followers.contains(&a)),
            Some(true)
        );

        let second = svc.follow_or_unfollow(a, b).await;
        assert_eq!(second.ok(), Some(FollowOutcome::Unfollowed));

        let follower = store.fetch_user(a).await.ok().flatten();
        assert_eq!(
            follower.as_ref().map(|u| u.following.contains(&b)),
            Some(false)
        );
    }

    #[tokio::test]
    async fn follow_emits_no_notification() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        assert!(svc.follow_or_unfollow(a, b).await.is_ok());
        let inbox = store.notifications_for(b, 50).await.unwrap_or_default();
        assert!(inbox.is_empty());
    }

    #[tokio::test]
    async fn notifications_are_newest_first_capped_and_enriched() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "author").await;
        let post = seed_post(&store, author).await;

        for i in 0..60u8 {
            let fan = seed_user(&store, &format!("fan{i}")).await;
            assert!(svc.like(fan, post).await.is_ok());
        }

        let views = svc.notifications(author).await.unwrap_or_default();
        assert_eq!(views.len(), 50);
        // Newest first: the last fan to like appears first.
        assert_eq!(
            views.first().map(|v| v.actor.username.clone()),
            Some("fan59".to_owned())
        );
        // The post summary resolves while the post exists.
        assert!(views.first().and_then(|v| v.post.as_ref()).is_some());
    }

    #[tokio::test]
    async fn dangling_post_reference_degrades_to_none() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "author").await;
        let fan = seed_user(&store, "fan").await;
        let post = seed_post(&store, author).await;

        assert!(svc.like(fan, post).await.is_ok());
        let _ = store.delete_post(post).await;

        let views = svc.notifications(author).await.unwrap_or_default();
        assert_eq!(views.len(), 1);
        assert!(views.first().map(|v| v.post.is_none()).unwrap_or(false));
    }

    #[tokio::test]
    async fn mark_all_read_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "author").await;
        let fan = seed_user(&store, "fan").await;
        let post = seed_post(&store, author).await;

        assert!(svc.like(fan, post).await.is_ok());
        assert!(svc.mark_all_read(author).await.is_ok());
        assert!(svc.mark_all_read(author).await.is_ok());

        let inbox = store.notifications_for(author, 50).await.unwrap_or_default();
        assert!(inbox.iter().all(|n| n.is_read));
    }
}
