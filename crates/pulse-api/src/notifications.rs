//! Notification inbox endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/v1/notifications` | Newest 50, enriched |
//! | `PUT` | `/api/v1/notifications/mark-all-read` | Flip all unread to read |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// The caller's notifications, newest first, capped at 50.
pub async fn list(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state.social.notifications(user).await?;
    Ok(Json(json!({
        "success": true,
        "notifications": notifications,
    })))
}

/// Mark every unread notification as read. Idempotent.
pub async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.social.mark_all_read(user).await?;
    Ok(Json(json!({
        "success": true,
        "message": "All notifications marked as read",
    })))
}
