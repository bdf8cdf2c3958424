//! HTTP API layer for the Pulse social backend.
//!
//! Exposes the domain services from `pulse-core` as a REST API under
//! `/api/v1`. Sessions are JWTs in an http-only `token` cookie; every
//! response body uses the `{"success": ..., "message": ...}` envelope.
//!
//! # Modules
//!
//! - [`router`] -- route table, CORS, tracing middleware
//! - [`server`] -- TCP bind and serve lifecycle
//! - [`state`] -- shared [`AppState`](state::AppState)
//! - [`auth`] -- session cookies, JWT keys, Argon2 hashing
//! - [`users`] / [`posts`] / [`comments`] / [`messages`] /
//!   [`notifications`] -- endpoint handlers
//! - [`error`] -- the [`ApiError`](error::ApiError) taxonomy

pub mod auth;
pub mod comments;
pub mod error;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod router;
pub mod server;
pub mod state;
pub mod users;

// Re-export primary types for convenience.
pub use auth::{Argon2Hasher, AuthUser, SessionKeys};
pub use error::ApiError;
pub use router::{build_router, cors_layer};
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
