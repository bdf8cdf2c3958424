//! Domain services for the Pulse social backend.
//!
//! This crate holds the two non-trivial cores of the system and the
//! seams they depend on:
//!
//! - **Conversation threading** ([`messaging`]) -- find-or-create a
//!   two-party conversation keyed by its unordered participant pair and
//!   append messages to it.
//! - **Social-action fan-out** ([`social`]) -- like/comment/follow
//!   mutations that, on qualifying actions, write a notification for the
//!   affected user.
//!
//! Services speak to storage exclusively through the repository traits in
//! [`repo`]; the traits expose atomic set/list mutations rather than
//! read-modify-write cycles so concurrent requests on the same record
//! contend as little as possible. `pulse-db` implements the traits over
//! `PostgreSQL`; [`memory`] implements them in process for tests and
//! embedded use.
//!
//! # Modules
//!
//! - [`repo`] -- repository traits and the profile patch type
//! - [`messaging`] -- conversation threading service
//! - [`social`] -- social actions and notification fan-out
//! - [`content`] -- post lifecycle, bookmarks, comment listing
//! - [`account`] -- registration, credential verification, profiles
//! - [`memory`] -- in-memory store implementing every trait
//! - [`error`] -- the [`CoreError`] taxonomy

pub mod account;
pub mod content;
mod enrich;
pub mod error;
pub mod memory;
pub mod messaging;
pub mod repo;
pub mod social;

// Re-export primary types for convenience.
pub use account::{AccountService, CredentialHasher};
pub use content::ContentService;
pub use error::CoreError;
pub use memory::MemoryStore;
pub use messaging::MessagingService;
pub use repo::{ContentRepo, ConversationRepo, IdentityRepo, NotificationRepo, ProfilePatch};
pub use social::{FollowOutcome, SocialService};
