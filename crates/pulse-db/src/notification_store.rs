//! Notifications, backed by the `notifications` table.
//!
//! Records are append-only except for the read flag; `mark_all_read`
//! flips every unread row for the recipient in one statement and reports
//! the affected count.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::{CoreError, NotificationRepo};
use pulse_types::{CommentId, Notification, NotificationKind, PostId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the `notifications` table.
#[derive(Clone)]
pub struct NotificationStore {
    pool: PgPool,
}

impl NotificationStore {
    /// Create a new notification store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepo for NotificationStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), CoreError> {
        sqlx::query(
            r"INSERT INTO notifications (id, recipient, actor, kind, post, comment, is_read, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(notification.id.into_inner())
        .bind(notification.recipient.into_inner())
        .bind(notification.actor.into_inner())
        .bind(notification.kind.as_str())
        .bind(notification.post.map(PostId::into_inner))
        .bind(notification.comment.map(CommentId::into_inner))
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn notifications_for(
        &self,
        recipient: UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, CoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"SELECT id, recipient, actor, kind, post, comment, is_read, created_at
              FROM notifications
              WHERE recipient = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2",
        )
        .bind(recipient.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| Notification::try_from(r).map_err(CoreError::from))
            .collect()
    }

    async fn mark_all_read(&self, recipient: UserId) -> Result<u64, CoreError> {
        let result = sqlx::query(
            r"UPDATE notifications SET is_read = TRUE
              WHERE recipient = $1 AND is_read = FALSE",
        )
        .bind(recipient.into_inner())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Full `notifications` row.
#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient: Uuid,
    actor: Uuid,
    kind: String,
    post: Option<Uuid>,
    comment: Option<Uuid>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DbError;

    fn try_from(row: NotificationRow) -> Result<Self, DbError> {
        let kind = NotificationKind::parse(&row.kind)
            .ok_or_else(|| DbError::Decode(format!("unknown notification kind: {}", row.kind)))?;
        Ok(Self {
            id: row.id.into(),
            recipient: row.recipient.into(),
            actor: row.actor.into(),
            kind,
            post: row.post.map(PostId::from),
            comment: row.comment.map(CommentId::from),
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(kind: &str) -> NotificationRow {
        NotificationRow {
            id: Uuid::now_v7(),
            recipient: Uuid::now_v7(),
            actor: Uuid::now_v7(),
            kind: kind.to_owned(),
            post: Some(Uuid::now_v7()),
            comment: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn notification_row_converts_known_kinds() {
        for kind in ["like", "comment", "follow"] {
            let converted = Notification::try_from(sample_row(kind)).ok();
            assert_eq!(
                converted.map(|n| n.kind.as_str()),
                Some(kind),
                "kind {kind} should round-trip"
            );
        }
    }

    #[test]
    fn notification_row_rejects_unknown_kind() {
        assert!(Notification::try_from(sample_row("repost")).is_err());
    }
}
