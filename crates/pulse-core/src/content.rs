//! Post CRUD, bookmarks, and comment listing.
//!
//! Image bytes never pass through this layer: a post stores only the
//! opaque reference string the external blob store returned. Deleting a
//! post leaves the author's denormalized `posts` index dangling by
//! design; reads reconcile by skipping ids that no longer resolve.

use std::collections::BTreeMap;
use std::sync::Arc;

use pulse_types::{ActorIdentity, CommentView, Post, PostId, PostView, UserId};
use tracing::info;

use crate::enrich::display_identity;
use crate::error::CoreError;
use crate::repo::{ContentRepo, IdentityRepo};

/// The content service: post lifecycle, bookmark toggling, and comment
/// listing over the content store.
#[derive(Clone)]
pub struct ContentService {
    identities: Arc<dyn IdentityRepo>,
    content: Arc<dyn ContentRepo>,
}

impl ContentService {
    /// Build the service over its stores.
    pub fn new(identities: Arc<dyn IdentityRepo>, content: Arc<dyn ContentRepo>) -> Self {
        Self {
            identities,
            content,
        }
    }

    /// Create a post from a caption and an already-uploaded image
    /// reference, and index it on the author's profile.
    pub async fn create_post(
        &self,
        author: UserId,
        image: &str,
        caption: &str,
    ) -> Result<PostView, CoreError> {
        if image.trim().is_empty() {
            return Err(CoreError::Validation("Image is required".to_owned()));
        }

        let post = Post::new(author, image.to_owned(), caption.to_owned());
        self.content.insert_post(&post).await?;
        self.identities.attach_post(author, post.id).await?;
        info!(post = %post.id, %author, "post created");

        let identity = display_identity(self.identities.as_ref(), author).await;
        Ok(PostView {
            post,
            author: identity,
        })
    }

    /// Every post, newest first, enriched with author identities.
    pub async fn all_posts(&self) -> Result<Vec<PostView>, CoreError> {
        let posts = self.content.all_posts().await?;
        Ok(self.enrich(posts).await)
    }

    /// One author's posts, newest first.
    pub async fn posts_by(&self, author: UserId) -> Result<Vec<PostView>, CoreError> {
        let posts = self.content.posts_by(author).await?;
        Ok(self.enrich(posts).await)
    }

    /// Delete a post. Only its author may delete it. The author's `posts`
    /// index is left to dangle and is reconciled on read.
    pub async fn delete_post(&self, user: UserId, post_id: PostId) -> Result<(), CoreError> {
        let post = self
            .content
            .fetch_post(post_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Post not found".to_owned()))?;

        if post.author != user {
            return Err(CoreError::Forbidden("Unauthorized".to_owned()));
        }

        self.content.delete_post(post_id).await?;
        info!(post = %post_id, %user, "post deleted");
        Ok(())
    }

    /// Toggle a post in the user's bookmarks. Returns `true` when the
    /// post is now bookmarked.
    pub async fn toggle_bookmark(&self, user: UserId, post_id: PostId) -> Result<bool, CoreError> {
        self.identities.toggle_bookmark(user, post_id).await
    }

    /// A post's comments, newest first, enriched with author identities.
    pub async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentView>, CoreError> {
        if self.content.fetch_post(post_id).await?.is_none() {
            return Err(CoreError::NotFound("Post not found".to_owned()));
        }

        let comments = self.content.comments_of(post_id).await?;
        let mut identities: BTreeMap<UserId, ActorIdentity> = BTreeMap::new();
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            if !identities.contains_key(&comment.author) {
                let identity = display_identity(self.identities.as_ref(), comment.author).await;
                identities.insert(comment.author, identity);
            }
            let author = identities
                .get(&comment.author)
                .cloned()
                .unwrap_or_else(|| ActorIdentity::unknown(comment.author));
            views.push(CommentView { comment, author });
        }
        Ok(views)
    }

    /// Join a page of posts with their authors' display identities,
    /// resolving each distinct author once.
    async fn enrich(&self, posts: Vec<Post>) -> Vec<PostView> {
        let mut identities: BTreeMap<UserId, ActorIdentity> = BTreeMap::new();
        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            if !identities.contains_key(&post.author) {
                let identity = display_identity(self.identities.as_ref(), post.author).await;
                identities.insert(post.author, identity);
            }
            let author = identities
                .get(&post.author)
                .cloned()
                .unwrap_or_else(|| ActorIdentity::unknown(post.author));
            views.push(PostView { post, author });
        }
        views
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use pulse_types::User;

    fn service(store: &Arc<MemoryStore>) -> ContentService {
        ContentService::new(store.clone(), store.clone())
    }

    async fn seed_user(store: &MemoryStore, name: &str) -> UserId {
        let user = User::new(name.to_owned(), format!("{name}@example.com"), "h".to_owned());
        let id = user.id;
        let _ = store.insert_user(&user).await;
        id
    }

    #[tokio::test]
    async fn create_post_requires_an_image_and_indexes_the_author() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "ada").await;

        let rejected = svc.create_post(author, "  ", "caption").await;
        assert!(matches!(rejected, Err(CoreError::Validation(_))));

        let created = svc.create_post(author, "img://1", "first!").await;
        let post_id = created.ok().map(|v| v.post.id);
        assert!(post_id.is_some());

        let user = store.fetch_user(author).await.ok().flatten();
        assert_eq!(user.map(|u| u.posts.len()), Some(1));
    }

    #[tokio::test]
    async fn post_listings_are_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "ada").await;

        for i in 0..3u8 {
            let created = svc.create_post(author, "img://x", &format!("p{i}")).await;
            assert!(created.is_ok());
        }

        let all = svc.all_posts().await.unwrap_or_default();
        let captions: Vec<String> = all.iter().map(|v| v.post.caption.clone()).collect();
        assert_eq!(captions, vec!["p2", "p1", "p0"]);

        let mine = svc.posts_by(author).await.unwrap_or_default();
        assert_eq!(mine.len(), 3);
        assert_eq!(mine.first().map(|v| v.author.username.clone()), Some("ada".to_owned()));
    }

    #[tokio::test]
    async fn only_the_author_may_delete_a_post() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = seed_user(&store, "ada").await;
        let stranger = seed_user(&store, "eve").await;

        let post_id = svc
            .create_post(author, "img://1", "mine")
            .await
            .ok()
            .map(|v| v.post.id);
        let Some(post_id) = post_id else {
            assert!(post_id.is_some());
            return;
        };

        let denied = svc.delete_post(stranger, post_id).await;
        assert!(matches!(denied, Err(CoreError::Forbidden(_))));

        let allowed = svc.delete_post(author, post_id).await;
        assert!(allowed.is_ok());
        assert!(matches!(
            svc.delete_post(author, post_id).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn bookmark_toggles_on_and_off() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let user = seed_user(&store, "ada").await;
        let post_id = svc
            .create_post(user, "img://1", "save me")
            .await
            .ok()
            .map(|v| v.post.id)
            .unwrap_or_else(PostId::new);

        assert_eq!(svc.toggle_bookmark(user, post_id).await.ok(), Some(true));
        assert_eq!(svc.toggle_bookmark(user, post_id).await.ok(), Some(false));
    }

    #[tokio::test]
    async fn listing_comments_of_a_missing_post_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let outcome = svc.list_comments(PostId::new()).await;
        assert!(matches!(outcome, Err(CoreError::NotFound(_))));
    }
}
