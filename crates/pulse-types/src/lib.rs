//! Shared type definitions for the Pulse social backend.
//!
//! This crate is the single source of truth for all types used across the
//! Pulse workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the single-page client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (notification kinds, profile fields)
//! - [`structs`] -- Persistent entity records
//! - [`views`] -- Read-time enrichment projections

pub mod enums;
pub mod ids;
pub mod structs;
pub mod views;

// Re-export all public types at crate root for convenience.
pub use enums::{Gender, NotificationKind};
pub use ids::{CommentId, ConversationId, MessageId, NotificationId, PostId, UserId};
pub use structs::{Comment, Conversation, Message, Notification, Post, User};
pub use views::{
    ActorIdentity, CommentView, MessageView, NotificationView, PostSummary, PostView,
    DEFAULT_PROFILE_PICTURE, UNKNOWN_USERNAME,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::UserId::export_all();
        let _ = crate::ids::PostId::export_all();
        let _ = crate::ids::CommentId::export_all();
        let _ = crate::ids::ConversationId::export_all();
        let _ = crate::ids::MessageId::export_all();
        let _ = crate::ids::NotificationId::export_all();

        // Entities
        let _ = crate::structs::User::export_all();
        let _ = crate::structs::Post::export_all();
        let _ = crate::structs::Comment::export_all();
        let _ = crate::structs::Conversation::export_all();
        let _ = crate::structs::Message::export_all();
        let _ = crate::structs::Notification::export_all();

        // Views
        let _ = crate::views::ActorIdentity::export_all();
        let _ = crate::views::MessageView::export_all();
        let _ = crate::views::CommentView::export_all();
        let _ = crate::views::PostView::export_all();
        let _ = crate::views::NotificationView::export_all();
    }
}
