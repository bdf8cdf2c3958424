//! Post endpoint handlers: creation, feeds, likes, deletion, bookmarks.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/v1/post/addpost` | Create a post |
//! | `GET` | `/api/v1/post/all` | Global feed, newest first |
//! | `GET` | `/api/v1/post/user/{id}` | One author's posts |
//! | `PUT` | `/api/v1/post/{postId}/like` | Like (idempotent) |
//! | `PUT` | `/api/v1/post/{postId}/dislike` | Remove a like (idempotent) |
//! | `DELETE` | `/api/v1/post/delete/{postId}` | Delete own post |
//! | `GET` | `/api/v1/post/{postId}/bookmark` | Toggle a bookmark |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /api/v1/post/addpost`.
#[derive(Debug, serde::Deserialize)]
pub struct AddPostBody {
    /// Reference to an already-uploaded image in the blob store.
    pub image: String,
    /// Caption text. May be empty.
    #[serde(default)]
    pub caption: String,
}

/// Create a post and index it on the author's profile.
pub async fn add_post(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddPostBody>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .content
        .create_post(user, &body.image, &body.caption)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "New post added",
            "post": post,
        })),
    ))
}

/// The global feed, newest first.
pub async fn all_posts(
    AuthUser(_): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.content.all_posts().await?;
    Ok(Json(json!({ "success": true, "posts": posts })))
}

/// One author's posts, newest first.
pub async fn user_posts(
    AuthUser(_): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(author): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.content.posts_by(author.into()).await?;
    Ok(Json(json!({ "success": true, "posts": posts })))
}

/// Like a post. Repeat likes are no-ops and never re-notify.
pub async fn like(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.social.like(user, post.into()).await?;
    Ok(Json(json!({ "success": true, "message": "Post liked" })))
}

/// Remove a like. Leaves any earlier like notification in place.
pub async fn dislike(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.social.dislike(user, post.into()).await?;
    Ok(Json(json!({ "success": true, "message": "Post disliked" })))
}

/// Delete the caller's own post.
pub async fn delete_post(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.content.delete_post(user, post.into()).await?;
    Ok(Json(json!({ "success": true, "message": "Post deleted" })))
}

/// Toggle the post in the caller's bookmark set.
pub async fn bookmark(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmarked = state.content.toggle_bookmark(user, post.into()).await?;
    let message = if bookmarked {
        "Post bookmarked"
    } else {
        "Post removed from bookmarks"
    };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "bookmarked": bookmarked,
    })))
}
