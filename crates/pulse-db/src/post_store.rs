//! Posts and comments, backed by the `posts` and `comments` tables.
//!
//! The like set and the comment index live on the post row as `UUID[]`
//! columns. `add_like` is the guarded set-add the notification fan-out
//! depends on: the statement only matches when the user is absent from
//! the set, so the affected-row count is the "newly liked" signal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::{ContentRepo, CoreError};
use pulse_types::{Comment, CommentId, Post, PostId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `posts` and `comments` tables.
#[derive(Clone)]
pub struct PostStore {
    pool: PgPool,
}

impl PostStore {
    /// Create a new post store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepo for PostStore {
    async fn insert_post(&self, post: &Post) -> Result<(), CoreError> {
        let likes: Vec<Uuid> = post.likes.iter().copied().map(Uuid::from).collect();
        let comments: Vec<Uuid> = post.comments.iter().copied().map(Uuid::from).collect();
        sqlx::query(
            r"INSERT INTO posts (id, author, image, caption, likes, comments, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(post.id.into_inner())
        .bind(post.author.into_inner())
        .bind(&post.image)
        .bind(&post.caption)
        .bind(&likes)
        .bind(&comments)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn fetch_post(&self, id: PostId) -> Result<Option<Post>, CoreError> {
        let row = sqlx::query_as::<_, PostRow>(
            r"SELECT id, author, image, caption, likes, comments, created_at
              FROM posts
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(row.map(Post::from))
    }

    async fn delete_post(&self, id: PostId) -> Result<(), CoreError> {
        sqlx::query(r"DELETE FROM posts WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn all_posts(&self) -> Result<Vec<Post>, CoreError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r"SELECT id, author, image, caption, likes, comments, created_at
              FROM posts
              ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn posts_by(&self, author: UserId) -> Result<Vec<Post>, CoreError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r"SELECT id, author, image, caption, likes, comments, created_at
              FROM posts
              WHERE author = $1
              ORDER BY created_at DESC, id DESC",
        )
        .bind(author.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn add_like(&self, post: PostId, user: UserId) -> Result<bool, CoreError> {
        // Matches only when the user is not yet in the like set: one
        // affected row means "newly liked", zero means "already liked"
        // (or the post vanished, which the service checks beforehand).
        let result = sqlx::query(
            r"UPDATE posts SET likes = array_append(likes, $2)
              WHERE id = $1 AND NOT ($2 = ANY(likes))",
        )
        .bind(post.into_inner())
        .bind(user.into_inner())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_like(&self, post: PostId, user: UserId) -> Result<(), CoreError> {
        sqlx::query(r"UPDATE posts SET likes = array_remove(likes, $2) WHERE id = $1")
            .bind(post.into_inner())
            .bind(user.into_inner())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), CoreError> {
        sqlx::query(
            r"INSERT INTO comments (id, post, author, body, created_at)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id.into_inner())
        .bind(comment.post.into_inner())
        .bind(comment.author.into_inner())
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn append_comment(&self, post: PostId, comment: CommentId) -> Result<(), CoreError> {
        sqlx::query(
            r"UPDATE posts SET comments = array_append(comments, $2)
              WHERE id = $1 AND NOT ($2 = ANY(comments))",
        )
        .bind(post.into_inner())
        .bind(comment.into_inner())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn fetch_comment(&self, id: CommentId) -> Result<Option<Comment>, CoreError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"SELECT id, post, author, body, created_at FROM comments WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), CoreError> {
        sqlx::query(r"DELETE FROM comments WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn comments_of(&self, post: PostId) -> Result<Vec<Comment>, CoreError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"SELECT id, post, author, body, created_at
              FROM comments
              WHERE post = $1
              ORDER BY created_at DESC, id DESC",
        )
        .bind(post.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Full `posts` row.
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author: Uuid,
    image: String,
    caption: String,
    likes: Vec<Uuid>,
    comments: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id.into(),
            author: row.author.into(),
            image: row.image,
            caption: row.caption,
            likes: row.likes.into_iter().map(UserId::from).collect(),
            comments: row.comments.into_iter().map(CommentId::from).collect(),
            created_at: row.created_at,
        }
    }
}

/// Full `comments` row.
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post: Uuid,
    author: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id.into(),
            post: row.post.into(),
            author: row.author.into(),
            text: row.body,
            created_at: row.created_at,
        }
    }
}
