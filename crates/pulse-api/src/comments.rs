//! Comment endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/v1/post/{postId}/comment` | Add a comment |
//! | `GET` | `/api/v1/post/{postId}/comment/all` | List a post's comments |
//! | `DELETE` | `/api/v1/comments/{commentId}/delete` | Delete own comment |

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

/// Body of `POST /api/v1/post/{postId}/comment`.
#[derive(Debug, serde::Deserialize)]
pub struct CommentBody {
    /// Comment text; trimmed server-side and must be non-empty.
    pub text: String,
}

/// Add a comment to a post, notifying the post's author.
pub async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .social
        .add_comment(user, post.into(), &body.text)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Comment added",
            "comment": comment,
        })),
    ))
}

/// A post's comments, newest first, with author identities.
pub async fn list_comments(
    AuthUser(_): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state.content.list_comments(post.into()).await?;
    Ok(Json(json!({ "success": true, "comments": comments })))
}

/// Delete the caller's own comment.
pub async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(comment): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.social.delete_comment(user, comment.into()).await?;
    Ok(Json(json!({ "success": true, "message": "Comment deleted" })))
}
