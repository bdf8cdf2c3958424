//! Read-time enrichment projections.
//!
//! Records store bare user ids; endpoints return them joined with the
//! actor's display identity resolved at read time, never denormalized
//! into the stored record. Resolution failures degrade to
//! [`ActorIdentity::unknown`] -- a missing user must never abort the
//! parent read.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::NotificationKind;
use crate::ids::{CommentId, NotificationId, PostId, UserId};
use crate::structs::{Comment, Message, Notification, Post};

/// Fallback avatar used when a profile has no picture of its own.
pub const DEFAULT_PROFILE_PICTURE: &str = "https://via.placeholder.com/150";

/// Username shown for actors whose account no longer resolves.
pub const UNKNOWN_USERNAME: &str = "unknown";

// ---------------------------------------------------------------------------
// ActorIdentity
// ---------------------------------------------------------------------------

/// The display identity of a user: what other users see next to content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActorIdentity {
    /// The user this identity belongs to.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Avatar reference, with the placeholder substituted for empty profiles.
    pub profile_picture: String,
}

impl ActorIdentity {
    /// Build a display identity, substituting the default avatar when the
    /// profile has none.
    pub fn resolved(id: UserId, username: String, profile_picture: Option<String>) -> Self {
        let profile_picture = match profile_picture {
            Some(p) if !p.trim().is_empty() => p,
            _ => DEFAULT_PROFILE_PICTURE.to_owned(),
        };
        Self {
            id,
            username,
            profile_picture,
        }
    }

    /// Placeholder identity for an actor that could not be resolved.
    pub fn unknown(id: UserId) -> Self {
        Self {
            id,
            username: UNKNOWN_USERNAME.to_owned(),
            profile_picture: DEFAULT_PROFILE_PICTURE.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Enriched views
// ---------------------------------------------------------------------------

/// A message joined with its sender's display identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MessageView {
    /// The stored message record.
    pub message: Message,
    /// The sender's display identity at read time.
    pub sender: ActorIdentity,
}

/// A comment joined with its author's display identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CommentView {
    /// The stored comment record.
    pub comment: Comment,
    /// The author's display identity at read time.
    pub author: ActorIdentity,
}

/// A post joined with its author's display identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PostView {
    /// The stored post record.
    pub post: Post,
    /// The author's display identity at read time.
    pub author: ActorIdentity,
}

/// Compact post projection embedded in notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PostSummary {
    /// The post id.
    pub id: PostId,
    /// Image reference.
    pub image: String,
    /// Caption text.
    pub caption: String,
    /// The post author's display identity.
    pub author: ActorIdentity,
}

impl PostSummary {
    /// Project a post into its notification summary.
    pub fn of(post: &Post, author: ActorIdentity) -> Self {
        Self {
            id: post.id,
            image: post.image.clone(),
            caption: post.caption.clone(),
            author,
        }
    }
}

/// A notification joined with its actor identity and, when the referenced
/// post still exists, a post summary.
///
/// `post` is `None` either when the kind has no post or when the weak
/// reference dangles; the client renders both the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NotificationView {
    /// The notification id.
    pub id: NotificationId,
    /// Which social action occurred.
    pub kind: NotificationKind,
    /// The acting user's display identity.
    pub actor: ActorIdentity,
    /// Summary of the referenced post, when it still exists.
    pub post: Option<PostSummary>,
    /// The referenced comment id, when the kind is a comment.
    pub comment: Option<CommentId>,
    /// Whether the recipient has seen this notification.
    pub is_read: bool,
    /// Notification creation time.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl NotificationView {
    /// Join a stored notification with resolved display data.
    pub fn of(
        notification: &Notification,
        actor: ActorIdentity,
        post: Option<PostSummary>,
    ) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            actor,
            post,
            comment: notification.comment,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}
