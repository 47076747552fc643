//! Message log — append-only chat history per room.
//!
//! Messages are immutable once written; there is no edit or delete path.
//! Display order is the client-supplied epoch-ms timestamp ascending, with
//! the insertion-ordered `seq` column breaking ties, so two messages with
//! colliding timestamps render in a stable order everywhere.

use sqlx::PgPool;
use uuid::Uuid;

use crate::frame::Data;

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("message content is empty")]
    Empty,
    #[error("room not found: {0}")]
    RoomNotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for MessageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "E_EMPTY",
            Self::RoomNotFound(_) => "E_ROOM_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// One chat message as stored and broadcast.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MessageRow {
    pub id: Uuid,
    pub room_id: Uuid,
    /// Display name of the author, not a stable user id.
    pub author: String,
    pub content: String,
    /// Epoch milliseconds; client-supplied when present at send time.
    pub created_at: i64,
}

/// Append a message to a room's log.
///
/// # Errors
///
/// `Empty` for blank content, `RoomNotFound` if the room row is gone,
/// `Database` otherwise.
pub async fn append_message(
    pool: &PgPool,
    room_id: Uuid,
    author: &str,
    content: &str,
    created_at_ms: i64,
) -> Result<MessageRow, MessageError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(MessageError::Empty);
    }

    let id = Uuid::new_v4();
    let result = sqlx::query(
        "INSERT INTO room_messages (id, room_id, author, content, created_at_ms)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(room_id)
    .bind(author)
    .bind(content)
    .bind(created_at_ms)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(MessageRow {
            id,
            room_id,
            author: author.to_owned(),
            content: content.to_owned(),
            created_at: created_at_ms,
        }),
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            Err(MessageError::RoomNotFound(room_id))
        }
        Err(e) => Err(e.into()),
    }
}

/// Full message history for a room, sorted by client timestamp ascending
/// with ties in insertion order.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_messages(pool: &PgPool, room_id: Uuid) -> Result<Vec<MessageRow>, MessageError> {
    let rows = sqlx::query_as::<_, (Uuid, Uuid, String, String, i64)>(
        "SELECT id, room_id, author, content, created_at_ms
         FROM room_messages
         WHERE room_id = $1
         ORDER BY created_at_ms ASC, seq ASC",
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, room_id, author, content, created_at)| MessageRow {
            id,
            room_id,
            author,
            content,
            created_at,
        })
        .collect())
}

/// Flatten a message into frame payload form.
#[must_use]
pub fn to_data(msg: &MessageRow) -> Data {
    let mut data = Data::new();
    data.insert("id".into(), serde_json::json!(msg.id));
    data.insert("room_id".into(), serde_json::json!(msg.room_id));
    data.insert("author".into(), serde_json::json!(msg.author));
    data.insert("content".into(), serde_json::json!(msg.content));
    data.insert("created_at".into(), serde_json::json!(msg.created_at));
    data
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
