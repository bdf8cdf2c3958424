//! User accounts and the follow graph, backed by the `users` table.
//!
//! Follow, bookmark, and post-index mutations are single guarded UPDATE
//! statements over the `UUID[]` set columns, so concurrent toggles on the
//! same account never round-trip through a read-modify-write cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::{CoreError, IdentityRepo, ProfilePatch};
use pulse_types::{ActorIdentity, Gender, PostId, User, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `users` table.
#[derive(Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    /// Create a new user store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_row(&self, id: UserId) -> Result<Option<UserRow>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"SELECT id, username, email, password_hash, profile_picture, bio, gender,
                     followers, following, bookmarks, posts, created_at
              FROM users
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl IdentityRepo for UserStore {
    async fn insert_user(&self, user: &User) -> Result<(), CoreError> {
        let followers: Vec<Uuid> = user.followers.iter().copied().map(Uuid::from).collect();
        let following: Vec<Uuid> = user.following.iter().copied().map(Uuid::from).collect();
        let bookmarks: Vec<Uuid> = user.bookmarks.iter().copied().map(Uuid::from).collect();
        let posts: Vec<Uuid> = user.posts.iter().copied().map(Uuid::from).collect();

        sqlx::query(
            r"INSERT INTO users (id, username, email, password_hash, profile_picture, bio,
                                 gender, followers, following, bookmarks, posts, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(user.id.into_inner())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile_picture)
        .bind(&user.bio)
        .bind(user.gender.map(Gender::as_str))
        .bind(&followers)
        .bind(&following)
        .bind(&bookmarks)
        .bind(&posts)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // The unique index on email is the duplicate-registration
            // guard; surface it as a validation failure, not a 500.
            if e.as_database_error()
                .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
            {
                CoreError::Validation("Email already in use".to_owned())
            } else {
                DbError::Postgres(e).into()
            }
        })?;
        Ok(())
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, CoreError> {
        let row = self.fetch_row(id).await?;
        row.map(User::try_from).transpose().map_err(CoreError::from)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"SELECT id, username, email, password_hash, profile_picture, bio, gender,
                     followers, following, bookmarks, posts, created_at
              FROM users
              WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        row.map(User::try_from).transpose().map_err(CoreError::from)
    }

    async fn identity_of(&self, id: UserId) -> Result<Option<ActorIdentity>, CoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r"SELECT id, username, profile_picture FROM users WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(row.map(|r| ActorIdentity::resolved(r.id.into(), r.username, r.profile_picture)))
    }

    async fn is_following(&self, follower: UserId, followee: UserId) -> Result<bool, CoreError> {
        let following: Option<bool> =
            sqlx::query_scalar(r"SELECT $2 = ANY(following) FROM users WHERE id = $1")
                .bind(follower.into_inner())
                .bind(followee.into_inner())
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::from)?;
        Ok(following.unwrap_or(false))
    }

    async fn add_following(&self, user: UserId, target: UserId) -> Result<(), CoreError> {
        sqlx::query(
            r"UPDATE users SET following = array_append(following, $2)
              WHERE id = $1 AND NOT ($2 = ANY(following))",
        )
        .bind(user.into_inner())
        .bind(target.into_inner())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn remove_following(&self, user: UserId, target: UserId) -> Result<(), CoreError> {
        sqlx::query(r"UPDATE users SET following = array_remove(following, $2) WHERE id = $1")
            .bind(user.into_inner())
            .bind(target.into_inner())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn add_follower(&self, user: UserId, follower: UserId) -> Result<(), CoreError> {
        sqlx::query(
            r"UPDATE users SET followers = array_append(followers, $2)
              WHERE id = $1 AND NOT ($2 = ANY(followers))",
        )
        .bind(user.into_inner())
        .bind(follower.into_inner())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn remove_follower(&self, user: UserId, follower: UserId) -> Result<(), CoreError> {
        sqlx::query(r"UPDATE users SET followers = array_remove(followers, $2) WHERE id = $1")
            .bind(user.into_inner())
            .bind(follower.into_inner())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn toggle_bookmark(&self, user: UserId, post: PostId) -> Result<bool, CoreError> {
        // RETURNING evaluates against the updated row, so the scalar is
        // "is the post bookmarked now" -- exactly the toggle outcome.
        let now_bookmarked: Option<bool> = sqlx::query_scalar(
            r"UPDATE users
              SET bookmarks = CASE WHEN $2 = ANY(bookmarks)
                                   THEN array_remove(bookmarks, $2)
                                   ELSE array_append(bookmarks, $2)
                              END
              WHERE id = $1
              RETURNING $2 = ANY(bookmarks)",
        )
        .bind(user.into_inner())
        .bind(post.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        now_bookmarked.ok_or_else(|| CoreError::NotFound("User not found".to_owned()))
    }

    async fn update_profile(
        &self,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<Option<User>, CoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"UPDATE users
              SET bio = COALESCE($2, bio),
                  gender = COALESCE($3, gender),
                  profile_picture = COALESCE($4, profile_picture)
              WHERE id = $1
              RETURNING id, username, email, password_hash, profile_picture, bio, gender,
                        followers, following, bookmarks, posts, created_at",
        )
        .bind(id.into_inner())
        .bind(patch.bio)
        .bind(patch.gender.map(Gender::as_str))
        .bind(patch.profile_picture)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        row.map(User::try_from).transpose().map_err(CoreError::from)
    }

    async fn suggested_users(&self, excluding: UserId) -> Result<Vec<User>, CoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"SELECT id, username, email, password_hash, profile_picture, bio, gender,
                     followers, following, bookmarks, posts, created_at
              FROM users
              WHERE id <> $1
              ORDER BY created_at DESC, id DESC",
        )
        .bind(excluding.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| User::try_from(r).map_err(CoreError::from))
            .collect()
    }

    async fn attach_post(&self, user: UserId, post: PostId) -> Result<(), CoreError> {
        sqlx::query(
            r"UPDATE users SET posts = array_append(posts, $2)
              WHERE id = $1 AND NOT ($2 = ANY(posts))",
        )
        .bind(user.into_inner())
        .bind(post.into_inner())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Full `users` row.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    profile_picture: Option<String>,
    bio: Option<String>,
    gender: Option<String>,
    followers: Vec<Uuid>,
    following: Vec<Uuid>,
    bookmarks: Vec<Uuid>,
    posts: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, DbError> {
        let gender = row
            .gender
            .as_deref()
            .map(|g| {
                Gender::parse(g).ok_or_else(|| DbError::Decode(format!("unknown gender: {g}")))
            })
            .transpose()?;
        Ok(Self {
            id: row.id.into(),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            profile_picture: row.profile_picture,
            bio: row.bio,
            gender,
            followers: row.followers.into_iter().map(UserId::from).collect(),
            following: row.following.into_iter().map(UserId::from).collect(),
            bookmarks: row.bookmarks.into_iter().map(PostId::from).collect(),
            posts: row.posts.into_iter().map(PostId::from).collect(),
            created_at: row.created_at,
        })
    }
}

/// Projection used for read-time identity enrichment.
#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    username: String,
    profile_picture: Option<String>,
}
