//! `PostgreSQL` data layer for the Pulse social backend.
//!
//! Implements the repository traits from `pulse-core` over a shared
//! [`sqlx::PgPool`]. Each store owns a clone of the pool and covers one
//! collection family:
//!
//! - [`user_store`] -- accounts, the follow graph, bookmarks
//! - [`post_store`] -- posts, likes, comments
//! - [`conversation_store`] -- conversations, messages, thread order
//! - [`notification_store`] -- the activity inbox
//!
//! Set-valued fields (likes, followers, bookmarks, thread order) are
//! mutated with guarded single-statement updates rather than
//! read-modify-write cycles, which is how the domain layer's atomicity
//! contracts (at-most-one like notification, one conversation per pair)
//! hold under concurrent requests.
//!
//! # Modules
//!
//! - [`postgres`] -- connection pool, configuration, migrations
//! - [`error`] -- the [`DbError`] type

pub mod conversation_store;
pub mod error;
pub mod notification_store;
pub mod post_store;
pub mod postgres;
pub mod user_store;

// Re-export primary types for convenience.
pub use conversation_store::ConversationStore;
pub use error::DbError;
pub use notification_store::NotificationStore;
pub use post_store::PostStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use user_store::UserStore;
