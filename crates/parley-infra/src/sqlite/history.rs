//! SQLite history repository implementation.
//!
//! Implements `HistoryRepository` from `parley-core` with one row per session
//! in `chat_sessions` and one row per message in `chat_messages`. Messages are
//! only ever INSERTed; the autoincrement `seq` column fixes their order, so two
//! concurrent appends to the same session cannot overwrite each other.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use parley_core::history::repository::HistoryRepository;
use parley_types::error::RepositoryError;
use parley_types::history::{ChatMessage, ChatSession, MessagePart, MessageRole};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `HistoryRepository`.
pub struct SqliteHistoryRepository {
    pool: DatabasePool,
}

impl SqliteHistoryRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn fetch_messages(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT session_id, role, parts, timestamp FROM chat_messages
             WHERE session_id = ? ORDER BY seq ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                ChatMessageRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_message()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    user_id: String,
    session_name: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            session_name: row.try_get("session_name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self, messages: Vec<ChatMessage>) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;

        Ok(ChatSession {
            id,
            user_id: self.user_id,
            session_name: self.session_name,
            messages,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    session_id: String,
    role: String,
    parts: String,
    timestamp: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            parts: row.try_get("parts")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    /// Legacy `bot` rows come back as [`MessageRole::Model`].
    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let parts: Vec<MessagePart> = serde_json::from_str(&self.parts)
            .map_err(|e| RepositoryError::Query(format!("invalid message parts: {e}")))?;

        Ok(ChatMessage {
            role,
            parts,
            timestamp: parse_datetime(&self.timestamp)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fixed-width RFC 3339 so lexical order in SQL matches time order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn encode_parts(parts: &[MessagePart]) -> Result<String, RepositoryError> {
    serde_json::to_string(parts)
        .map_err(|e| RepositoryError::Query(format!("failed to encode message parts: {e}")))
}

impl HistoryRepository for SqliteHistoryRepository {
    async fn insert_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, session_name, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(&session.user_id)
        .bind(&session.session_name)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!(
                        "session {} already exists",
                        session.id
                    ));
                }
            }
            RepositoryError::Query(e.to_string())
        })?;

        Ok(session.clone())
    }

    async fn append_messages(
        &self,
        user_id: &str,
        session_id: &Uuid,
        messages: &[ChatMessage],
        at: DateTime<Utc>,
    ) -> Result<ChatSession, RepositoryError> {
        let id = session_id.to_string();
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let exists = sqlx::query("SELECT 1 FROM chat_sessions WHERE id = ? AND user_id = ?")
            .bind(&id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        for message in messages {
            sqlx::query(
                "INSERT INTO chat_messages (session_id, role, parts, timestamp)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(message.role.as_str())
            .bind(encode_parts(&message.parts)?)
            .bind(format_datetime(&message.timestamp))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        if !messages.is_empty() {
            sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
                .bind(format_datetime(&at))
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        self.get_session(user_id, session_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, session_name, created_at, updated_at FROM chat_sessions
             WHERE id = ? AND user_id = ?",
        )
        .bind(session_id.to_string())
        .bind(user_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row =
                    ChatSessionRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                let messages = self.fetch_messages(session_id).await?;
                Ok(Some(session_row.into_session(messages)?))
            }
            None => Ok(None),
        }
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        let session_rows = sqlx::query(
            "SELECT id, user_id, session_name, created_at, updated_at FROM chat_sessions
             WHERE user_id = ?
             ORDER BY updated_at DESC, created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let message_rows = sqlx::query(
            "SELECT m.session_id, m.role, m.parts, m.timestamp
             FROM chat_messages m
             JOIN chat_sessions s ON s.id = m.session_id
             WHERE s.user_id = ?
             ORDER BY m.seq ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut by_session: HashMap<String, Vec<ChatMessage>> = HashMap::new();
        for row in &message_rows {
            let message_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            let session_id = message_row.session_id.clone();
            by_session
                .entry(session_id)
                .or_default()
                .push(message_row.into_message()?);
        }

        session_rows
            .iter()
            .map(|row| {
                let session_row =
                    ChatSessionRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                let messages = by_session.remove(&session_row.id).unwrap_or_default();
                session_row.into_session(messages)
            })
            .collect()
    }

    async fn delete_session(&self, user_id: &str, session_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ? AND user_id = ?")
            .bind(session_id.to_string())
            .bind(user_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn rename_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
        session_name: &str,
        at: DateTime<Utc>,
    ) -> Result<ChatSession, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chat_sessions SET session_name = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(session_name)
        .bind(format_datetime(&at))
        .bind(session_id.to_string())
        .bind(user_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_session(user_id, session_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
