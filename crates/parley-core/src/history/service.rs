//! History service: validation and the session operations exposed over REST.
//!
//! HistoryService sits between the REST handlers and the Session Store. It
//! owns input validation, default session naming and timestamp assignment;
//! the repository owns atomicity.

use parley_types::error::{HistoryError, RepositoryError};
use parley_types::history::{ChatSession, NewMessage, default_session_name, now_micros};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::repository::HistoryRepository;

/// Orchestrates session creation, appends and lookups.
///
/// Generic over `HistoryRepository` so parley-core never depends on
/// parley-infra.
pub struct HistoryService<R: HistoryRepository> {
    repo: R,
}

impl<R: HistoryRepository> HistoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Access the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Create an empty session.
    ///
    /// A missing or blank name is replaced with `Session YYYY-MM-DD HH:MM:SS`.
    pub async fn create_session(
        &self,
        user_id: &str,
        session_name: Option<&str>,
    ) -> Result<ChatSession, HistoryError> {
        let user_id = require_user_id(user_id)?;
        let now = now_micros();
        let name = match session_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_session_name(now),
        };

        let session = ChatSession::new(user_id, name, now);
        let created = self
            .repo
            .insert_session(&session)
            .await
            .map_err(|e| storage_error("create_session", e))?;

        info!(user_id, session_id = %created.id, name = %created.session_name, "session created");
        Ok(created)
    }

    /// Append one message and return the updated session.
    pub async fn append_message(
        &self,
        user_id: &str,
        session_id: &Uuid,
        message: NewMessage,
    ) -> Result<ChatSession, HistoryError> {
        self.append_messages(user_id, session_id, vec![message]).await
    }

    /// Append many messages as one all-or-nothing push.
    ///
    /// Every element is validated before anything is written. An empty list
    /// is legal and only checks that the session exists.
    pub async fn append_messages(
        &self,
        user_id: &str,
        session_id: &Uuid,
        messages: Vec<NewMessage>,
    ) -> Result<ChatSession, HistoryError> {
        let user_id = require_user_id(user_id)?;
        for (index, message) in messages.iter().enumerate() {
            message
                .validate()
                .map_err(|reason| HistoryError::Validation(format!("message {index}: {reason}")))?;
        }

        let now = now_micros();
        let resolved: Vec<_> = messages.into_iter().map(|m| m.into_message(now)).collect();

        let session = self
            .repo
            .append_messages(user_id, session_id, &resolved, now)
            .await
            .map_err(|e| storage_error("append_messages", e))?;

        debug!(user_id, session_id = %session_id, count = resolved.len(), "messages appended");
        Ok(session)
    }

    /// Fetch one session, scoped to its owner.
    pub async fn get_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
    ) -> Result<ChatSession, HistoryError> {
        let user_id = require_user_id(user_id)?;
        self.repo
            .get_session(user_id, session_id)
            .await
            .map_err(|e| storage_error("get_session", e))?
            .ok_or_else(|| HistoryError::NotFound("Session".to_string()))
    }

    /// All sessions of a user, most recent first. Empty when there are none.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, HistoryError> {
        let user_id = require_user_id(user_id)?;
        self.repo
            .list_sessions(user_id)
            .await
            .map_err(|e| storage_error("list_sessions", e))
    }

    /// Delete a session and its messages.
    pub async fn delete_session(&self, user_id: &str, session_id: &Uuid) -> Result<(), HistoryError> {
        let user_id = require_user_id(user_id)?;
        self.repo
            .delete_session(user_id, session_id)
            .await
            .map_err(|e| storage_error("delete_session", e))?;
        info!(user_id, session_id = %session_id, "session deleted");
        Ok(())
    }

    /// Rename a session. The new name must not be blank.
    pub async fn rename_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
        session_name: &str,
    ) -> Result<ChatSession, HistoryError> {
        let user_id = require_user_id(user_id)?;
        let name = session_name.trim();
        if name.is_empty() {
            return Err(HistoryError::Validation(
                "sessionName must not be empty".to_string(),
            ));
        }
        self.repo
            .rename_session(user_id, session_id, name, now_micros())
            .await
            .map_err(|e| storage_error("rename_session", e))
    }
}

fn require_user_id(user_id: &str) -> Result<&str, HistoryError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(HistoryError::Validation("userId is required".to_string()));
    }
    Ok(trimmed)
}

/// Map a repository error, logging anything that is not a plain miss.
fn storage_error(operation: &str, e: RepositoryError) -> HistoryError {
    if !matches!(e, RepositoryError::NotFound) {
        error!(operation, error = %e, "session store failure");
    }
    HistoryError::from(e)
}
