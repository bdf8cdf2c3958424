//! Conversations and messages, backed by the `conversations`, `messages`,
//! and `conversation_messages` tables.
//!
//! The unique constraint on the sorted participant pair is what makes
//! `find_or_create_conversation` converge: a racing create loses the
//! `ON CONFLICT DO NOTHING` insert and the follow-up select lands on the
//! winner's row. Thread order comes from the `seq` identity column on the
//! join table, never from message timestamps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::{ConversationRepo, CoreError};
use pulse_types::{Conversation, ConversationId, Message, MessageId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Operations on the conversation and message tables.
#[derive(Clone)]
pub struct ConversationStore {
    pool: PgPool,
}

impl ConversationStore {
    /// Create a new conversation store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_by_pair(
        &self,
        low: Uuid,
        high: Uuid,
    ) -> Result<Option<Conversation>, DbError> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r"SELECT c.id, c.participant_low, c.participant_high, c.created_at,
                     ARRAY(SELECT cm.message_id
                           FROM conversation_messages cm
                           WHERE cm.conversation_id = c.id
                           ORDER BY cm.seq) AS messages
              FROM conversations c
              WHERE c.participant_low = $1 AND c.participant_high = $2",
        )
        .bind(low)
        .bind(high)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Conversation::from))
    }
}

#[async_trait]
impl ConversationRepo for ConversationStore {
    async fn find_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Conversation>, CoreError> {
        let (low, high) = Conversation::pair_key(a, b);
        self.select_by_pair(low.into_inner(), high.into_inner())
            .await
            .map_err(CoreError::from)
    }

    async fn find_or_create_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Conversation, CoreError> {
        let (low, high) = Conversation::pair_key(a, b);

        // Losing a race here is fine: DO NOTHING swallows the conflict
        // and the select below returns whichever row won.
        sqlx::query(
            r"INSERT INTO conversations (id, participant_low, participant_high, created_at)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (participant_low, participant_high) DO NOTHING",
        )
        .bind(ConversationId::new().into_inner())
        .bind(low.into_inner())
        .bind(high.into_inner())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.select_by_pair(low.into_inner(), high.into_inner())
            .await
            .map_err(CoreError::from)?
            .ok_or_else(|| CoreError::storage("conversation missing after upsert"))
    }

    async fn insert_message(&self, message: &Message) -> Result<(), CoreError> {
        sqlx::query(
            r"INSERT INTO messages (id, sender, receiver, body, created_at)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(message.id.into_inner())
        .bind(message.sender.into_inner())
        .bind(message.receiver.into_inner())
        .bind(&message.text)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn append_to_thread(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r"INSERT INTO conversation_messages (conversation_id, message_id)
              VALUES ($1, $2)
              ON CONFLICT DO NOTHING",
        )
        .bind(conversation.into_inner())
        .bind(message.into_inner())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn messages_of(&self, conversation: ConversationId) -> Result<Vec<Message>, CoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r"SELECT m.id, m.sender, m.receiver, m.body, m.created_at
              FROM conversation_messages cm
              JOIN messages m ON m.id = cm.message_id
              WHERE cm.conversation_id = $1
              ORDER BY cm.seq",
        )
        .bind(conversation.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Conversation row joined with its ordered message-id index.
#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: Uuid,
    participant_low: Uuid,
    participant_high: Uuid,
    created_at: DateTime<Utc>,
    messages: Vec<Uuid>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: row.id.into(),
            participants: [row.participant_low.into(), row.participant_high.into()],
            messages: row.messages.into_iter().map(MessageId::from).collect(),
            created_at: row.created_at,
        }
    }
}

/// Full `messages` row.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    sender: Uuid,
    receiver: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id.into(),
            sender: row.sender.into(),
            receiver: row.receiver.into(),
            text: row.body,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_row_keeps_thread_order() {
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();
        let row = ConversationRow {
            id: Uuid::now_v7(),
            participant_low: Uuid::now_v7(),
            participant_high: Uuid::now_v7(),
            created_at: Utc::now(),
            messages: vec![first, second],
        };
        let convo = Conversation::from(row);
        assert_eq!(
            convo.messages,
            vec![MessageId::from(first), MessageId::from(second)]
        );
    }

    #[test]
    fn conversation_row_participants_match_either_order() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let row = ConversationRow {
            id: Uuid::now_v7(),
            participant_low: a,
            participant_high: b,
            created_at: Utc::now(),
            messages: Vec::new(),
        };
        let convo = Conversation::from(row);
        assert!(convo.involves(b.into(), a.into()));
    }
}
