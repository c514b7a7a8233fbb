//! Runtime choice of Session Store.
//!
//! `parley serve` uses SQLite by default and the in-memory store with
//! `--ephemeral`. `HistoryStore` lets the server state stay non-generic.

use chrono::{DateTime, Utc};
use parley_core::history::memory::InMemoryHistoryRepository;
use parley_core::history::repository::HistoryRepository;
use parley_types::error::RepositoryError;
use parley_types::history::{ChatMessage, ChatSession};
use uuid::Uuid;

use crate::sqlite::history::SqliteHistoryRepository;

pub enum HistoryStore {
    Sqlite(SqliteHistoryRepository),
    Memory(InMemoryHistoryRepository),
}

impl HistoryStore {
    /// Short label for logs and the health banner.
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryStore::Sqlite(_) => "sqlite",
            HistoryStore::Memory(_) => "memory",
        }
    }
}

impl HistoryRepository for HistoryStore {
    async fn insert_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        match self {
            HistoryStore::Sqlite(repo) => repo.insert_session(session).await,
            HistoryStore::Memory(repo) => repo.insert_session(session).await,
        }
    }

    async fn append_messages(
        &self,
        user_id: &str,
        session_id: &Uuid,
        messages: &[ChatMessage],
        at: DateTime<Utc>,
    ) -> Result<ChatSession, RepositoryError> {
        match self {
            HistoryStore::Sqlite(repo) => repo.append_messages(user_id, session_id, messages, at).await,
            HistoryStore::Memory(repo) => repo.append_messages(user_id, session_id, messages, at).await,
        }
    }

    async fn get_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        match self {
            HistoryStore::Sqlite(repo) => repo.get_session(user_id, session_id).await,
            HistoryStore::Memory(repo) => repo.get_session(user_id, session_id).await,
        }
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        match self {
            HistoryStore::Sqlite(repo) => repo.list_sessions(user_id).await,
            HistoryStore::Memory(repo) => repo.list_sessions(user_id).await,
        }
    }

    async fn delete_session(&self, user_id: &str, session_id: &Uuid) -> Result<(), RepositoryError> {
        match self {
            HistoryStore::Sqlite(repo) => repo.delete_session(user_id, session_id).await,
            HistoryStore::Memory(repo) => repo.delete_session(user_id, session_id).await,
        }
    }

    async fn rename_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
        session_name: &str,
        at: DateTime<Utc>,
    ) -> Result<ChatSession, RepositoryError> {
        match self {
            HistoryStore::Sqlite(repo) => {
                repo.rename_session(user_id, session_id, session_name, at)
                    .await
            }
            HistoryStore::Memory(repo) => {
                repo.rename_session(user_id, session_id, session_name, at)
                    .await
            }
        }
    }
}
