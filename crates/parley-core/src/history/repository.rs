//! HistoryRepository trait definition.
//!
//! Every operation is scoped to the owning user: a session id paired with the
//! wrong `user_id` behaves exactly like an unknown id.

use chrono::{DateTime, Utc};
use parley_types::error::RepositoryError;
use parley_types::history::{ChatMessage, ChatSession};
use uuid::Uuid;

/// Repository trait for chat session persistence.
///
/// Implementations live in parley-infra (`SqliteHistoryRepository`) and in
/// [`crate::history::memory`]. Uses native async fn in traits (RPITIT, Rust
/// 2024 edition).
pub trait HistoryRepository: Send + Sync {
    /// Store a freshly built session (id and timestamps already assigned).
    fn insert_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Atomically append `messages` to the end of the session's log and set
    /// `updated_at = at`.
    ///
    /// An empty `messages` only checks that the session exists. Returns
    /// `RepositoryError::NotFound` when the `(user_id, session_id)` pair does
    /// not exist.
    fn append_messages(
        &self,
        user_id: &str,
        session_id: &Uuid,
        messages: &[ChatMessage],
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Point lookup of one session, including its messages in insertion order.
    fn get_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// All sessions of a user, most recently updated first.
    ///
    /// Ties are broken by `created_at DESC`, then `id DESC`.
    fn list_sessions(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Delete a session and its messages.
    fn delete_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Change a session's name and set `updated_at = at`.
    fn rename_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
        session_name: &str,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;
}

/// Sort sessions into listing order: `updated_at DESC, created_at DESC, id DESC`.
pub fn sort_for_listing(sessions: &mut [ChatSession]) {
    sessions.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
}
