//! Account and profile endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/v1/user/register` | Register a new account |
//! | `POST` | `/api/v1/user/login` | Log in, sets the `token` cookie |
//! | `GET` | `/api/v1/user/logout` | Clear the session cookie |
//! | `GET` | `/api/v1/user/me` | The authenticated user's record |
//! | `GET` | `/api/v1/user/{id}/profile` | Any user's profile |
//! | `POST` | `/api/v1/user/profile/edit` | Partial profile update |
//! | `GET` | `/api/v1/user/suggested` | Everyone except the caller |
//! | `POST` | `/api/v1/user/followorunfollow/{id}` | Toggle a follow |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use pulse_core::{FollowOutcome, ProfilePatch};
use pulse_types::Gender;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/user/register`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct RegisterBody {
    /// Display/login name.
    pub username: String,
    /// Email address, unique per account.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Plaintext password; hashed before storage.
    pub password: String,
}

/// Body of `POST /api/v1/user/login`.
#[derive(Debug, serde::Deserialize)]
pub struct LoginBody {
    /// Registered email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Body of `POST /api/v1/user/profile/edit`. Absent fields are left
/// untouched.
#[derive(Debug, serde::Deserialize)]
pub struct EditProfileBody {
    /// New bio text.
    pub bio: Option<String>,
    /// New gender.
    pub gender: Option<Gender>,
    /// New profile picture reference from the blob store.
    pub profile_picture: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Register a new account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()
        .map_err(|_| ApiError::Validation("Invalid email address".to_owned()))?;
    state
        .accounts
        .register(&body.username, &body.email, &body.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account created successfully",
        })),
    ))
}

/// Verify credentials and start a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .accounts
        .verify_credentials(&body.email, &body.password)
        .await?;
    let token = state.keys.issue(user.id)?;
    let jar = jar.add(auth::session_cookie(token));
    let message = format!("Welcome back {}", user.username);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": message,
            "user": user,
        })),
    ))
}

/// End the session by clearing the cookie. Stateless on the server side.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(auth::clear_session_cookie());
    (
        jar,
        Json(json!({
            "success": true,
            "message": "Logged out successfully",
        })),
    )
}

/// The authenticated user's own record.
pub async fn me(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.accounts.profile(user).await?;
    Ok(Json(json!({ "success": true, "user": profile })))
}

/// Any user's profile by id. Requires a session like every other route.
pub async fn profile(
    AuthUser(_): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.accounts.profile(id.into()).await?;
    Ok(Json(json!({ "success": true, "user": profile })))
}

/// Apply a partial profile update.
pub async fn edit_profile(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<EditProfileBody>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = ProfilePatch {
        bio: body.bio,
        gender: body.gender,
        profile_picture: body.profile_picture,
    };
    let updated = state.accounts.edit_profile(user, patch).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated",
        "user": updated,
    })))
}

/// Every account except the caller's, for the suggestion rail.
pub async fn suggested(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.accounts.suggested(user).await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// Toggle the follow relationship towards the target user.
pub async fn follow_or_unfollow(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .social
        .follow_or_unfollow(user, target.into())
        .await?;
    let message = match outcome {
        FollowOutcome::Followed => "Followed successfully",
        FollowOutcome::Unfollowed => "Unfollowed successfully",
    };
    Ok(Json(json!({ "success": true, "message": message })))
}
