//! Direct message endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/v1/message/send/{receiverId}` | Send a direct message |
//! | `GET` | `/api/v1/message/all/{receiverId}` | Full thread with that user |

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

/// Body of `POST /api/v1/message/send/{receiverId}`.
#[derive(Debug, serde::Deserialize)]
pub struct SendMessageBody {
    /// Message text.
    #[serde(rename = "textMessage")]
    pub text_message: String,
}

/// Send a direct message, creating the conversation on first contact.
pub async fn send_message(
    AuthUser(sender): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(receiver): Path<Uuid>,
    Json(body): Json<SendMessageBody>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .messaging
        .send_message(sender, receiver.into(), body.text_message)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "newMessage": message,
        })),
    ))
}

/// The full thread between the caller and the other user, in send order.
/// An empty list when the pair has never messaged.
pub async fn thread(
    AuthUser(sender): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(receiver): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state.messaging.thread(sender, receiver.into()).await?;
    Ok(Json(json!({ "success": true, "messages": messages })))
}
