//! Core entity structs for the Pulse social backend.
//!
//! Covers the persistent records: [`User`], [`Post`], [`Comment`],
//! [`Conversation`], [`Message`], and [`Notification`]. Read-time
//! enrichment projections live in [`crate::views`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Gender, NotificationKind};
use crate::ids::{CommentId, ConversationId, MessageId, NotificationId, PostId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user account, including the follow graph adjacency lists.
///
/// `followers` / `following` are sets with best-effort symmetry: if A
/// follows B then B's `followers` contains A and A's `following` contains
/// B. Both sides are updated by two independent set operations, so brief
/// asymmetry under concurrent toggles is tolerated rather than prevented.
///
/// `posts` and `bookmarks` are denormalized id indexes. They may reference
/// records that have since been deleted; readers reconcile by skipping
/// dangling ids, never by failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct User {
    /// Unique account id.
    pub id: UserId,
    /// Display/login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Opaque credential hash. Never serialized outward.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    /// Reference to a profile image in the external blob store.
    pub profile_picture: Option<String>,
    /// Free-form profile text.
    pub bio: Option<String>,
    /// Self-reported gender.
    pub gender: Option<Gender>,
    /// Users following this account.
    pub followers: Vec<UserId>,
    /// Accounts this user follows.
    pub following: Vec<UserId>,
    /// Posts this user has bookmarked.
    pub bookmarks: Vec<PostId>,
    /// Posts authored by this user (back-reference index).
    pub posts: Vec<PostId>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a fresh account with empty social state.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            username,
            email,
            password_hash,
            profile_picture: None,
            bio: None,
            gender: None,
            followers: Vec::new(),
            following: Vec::new(),
            bookmarks: Vec::new(),
            posts: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A post: an image reference plus caption, with an embedded like set and
/// an ordered comment-id index.
///
/// A user id appears in `likes` at most once. `comments` is an insertion
/// ordered index of standalone [`Comment`] records; dangling ids are
/// skipped on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Post {
    /// Unique post id.
    pub id: PostId,
    /// Authoring user (owning reference).
    pub author: UserId,
    /// Opaque reference to the image in the external blob store.
    pub image: String,
    /// Caption text.
    pub caption: String,
    /// Users who liked this post (set semantics).
    pub likes: Vec<UserId>,
    /// Comment ids in insertion order.
    pub comments: Vec<CommentId>,
    /// Post creation time.
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post with no likes or comments.
    pub fn new(author: UserId, image: String, caption: String) -> Self {
        Self {
            id: PostId::new(),
            author,
            image,
            caption,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A standalone comment record referencing its post and author.
///
/// Text is guaranteed non-empty after trimming by the service layer.
/// Deletion is only permitted for the author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Comment {
    /// Unique comment id.
    pub id: CommentId,
    /// The post this comment belongs to.
    pub post: PostId,
    /// Authoring user.
    pub author: UserId,
    /// Comment text (trimmed, non-empty).
    pub text: String,
    /// Comment creation time.
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment. The caller is responsible for trimming and
    /// rejecting empty text before construction.
    pub fn new(post: PostId, author: UserId, text: String) -> Self {
        Self {
            id: CommentId::new(),
            post,
            author,
            text,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation & Message
// ---------------------------------------------------------------------------

/// A two-party conversation identified by its unordered participant pair.
///
/// At most one conversation exists per unordered pair (serialized calls;
/// the Postgres store enforces this with a unique index on the sorted
/// pair). `messages` is append-only and chronological; there is no
/// reordering, deletion, or archival transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Conversation {
    /// Unique conversation id.
    pub id: ConversationId,
    /// The two participants. Order carries no meaning.
    pub participants: [UserId; 2],
    /// Message ids in send order.
    pub messages: Vec<MessageId>,
    /// Conversation creation time (first message).
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation between two users.
    pub fn between(a: UserId, b: UserId) -> Self {
        Self {
            id: ConversationId::new(),
            participants: [a, b],
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Canonical (sorted) form of an unordered participant pair.
    ///
    /// `{A, B}` and `{B, A}` map to the same key, which is what makes the
    /// pair usable as a uniqueness constraint.
    pub fn pair_key(a: UserId, b: UserId) -> (UserId, UserId) {
        if a <= b { (a, b) } else { (b, a) }
    }

    /// Whether this conversation is the one for the unordered pair `{a, b}`.
    pub fn involves(&self, a: UserId, b: UserId) -> bool {
        let [p, q] = self.participants;
        Self::pair_key(p, q) == Self::pair_key(a, b)
    }
}

/// A direct message owned by exactly one conversation.
///
/// Ownership is expressed through the conversation's message list;
/// messages are never reparented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Message {
    /// Unique message id.
    pub id: MessageId,
    /// Sending user.
    pub sender: UserId,
    /// Receiving user.
    pub receiver: UserId,
    /// Message body.
    pub text: String,
    /// Send time.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message.
    pub fn new(sender: UserId, receiver: UserId, text: String) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            receiver,
            text,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A one-directional activity record (actor -> recipient).
///
/// Created exactly once per qualifying action. The only permitted update
/// is the `is_read` false -> true transition; records are never deleted in
/// normal operation. `post` and `comment` are weak references: the
/// referenced entity may disappear, and readers degrade to a placeholder
/// rather than fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Notification {
    /// Unique notification id.
    pub id: NotificationId,
    /// User being notified.
    pub recipient: UserId,
    /// User whose action triggered the notification.
    pub actor: UserId,
    /// Which social action occurred.
    pub kind: NotificationKind,
    /// The post involved, when the kind relates to a post.
    pub post: Option<PostId>,
    /// The comment involved, when the kind is a comment.
    pub comment: Option<CommentId>,
    /// Whether the recipient has seen this notification.
    pub is_read: bool,
    /// Notification creation time.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// A `like` notification for a post.
    pub fn like(recipient: UserId, actor: UserId, post: PostId) -> Self {
        Self::record(recipient, actor, NotificationKind::Like, Some(post), None)
    }

    /// A `comment` notification for a post.
    ///
    /// The comment itself is not referenced -- only the post. The model
    /// carries an optional comment reference for forward compatibility,
    /// but the fan-out has never populated it.
    pub fn comment(recipient: UserId, actor: UserId, post: PostId) -> Self {
        Self::record(recipient, actor, NotificationKind::Comment, Some(post), None)
    }

    fn record(
        recipient: UserId,
        actor: UserId,
        kind: NotificationKind,
        post: Option<PostId>,
        comment: Option<CommentId>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient,
            actor,
            kind,
            post,
            comment,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_independent() {
        let a = UserId::new();
        let b = UserId::new();
        assert_eq!(Conversation::pair_key(a, b), Conversation::pair_key(b, a));
    }

    #[test]
    fn involves_matches_either_order() {
        let a = UserId::new();
        let b = UserId::new();
        let convo = Conversation::between(a, b);
        assert!(convo.involves(a, b));
        assert!(convo.involves(b, a));
        assert!(!convo.involves(a, UserId::new()));
    }

    #[test]
    fn self_pair_is_its_own_key() {
        // Self-messaging is not guarded anywhere; the degenerate pair
        // {A, A} must still produce a stable key.
        let a = UserId::new();
        assert_eq!(Conversation::pair_key(a, a), (a, a));
    }

    #[test]
    fn notifications_start_unread() {
        let n = Notification::like(UserId::new(), UserId::new(), PostId::new());
        assert!(!n.is_read);
        assert_eq!(n.kind, NotificationKind::Like);
        assert!(n.comment.is_none());
    }

    #[test]
    fn password_hash_never_serializes() {
        let user = User::new(
            "ada".to_owned(),
            "ada@example.com".to_owned(),
            "$argon2id$secret".to_owned(),
        );
        let json = serde_json::to_string(&user).unwrap_or_default();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password"));
    }
}
