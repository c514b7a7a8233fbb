//! In-memory Session Store using the per-user embedded-document layout.
//!
//! One [`UserHistory`] aggregate per user holds that user's sessions, each
//! embedding its messages. Every mutation runs under the write lock, so an
//! append pushes onto the matching session in place and two concurrent
//! appends to the same session both land, in the order the lock was taken.
//! Nothing survives a restart; used by tests and `parley serve --ephemeral`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parley_types::error::RepositoryError;
use parley_types::history::{ChatMessage, ChatSession};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{HistoryRepository, sort_for_listing};

/// All sessions belonging to one user.
#[derive(Debug, Clone, Default)]
pub struct UserHistory {
    pub user_id: String,
    pub sessions: Vec<ChatSession>,
}

impl UserHistory {
    fn session_mut(&mut self, session_id: &Uuid) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == *session_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryRepository {
    users: RwLock<HashMap<String, UserHistory>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryRepository for InMemoryHistoryRepository {
    async fn insert_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        let mut users = self.users.write().await;
        let history = users
            .entry(session.user_id.clone())
            .or_insert_with(|| UserHistory {
                user_id: session.user_id.clone(),
                sessions: Vec::new(),
            });

        if history.sessions.iter().any(|s| s.id == session.id) {
            return Err(RepositoryError::Conflict(format!(
                "session {} already exists",
                session.id
            )));
        }

        history.sessions.push(session.clone());
        Ok(session.clone())
    }

    async fn append_messages(
        &self,
        user_id: &str,
        session_id: &Uuid,
        messages: &[ChatMessage],
        at: DateTime<Utc>,
    ) -> Result<ChatSession, RepositoryError> {
        let mut users = self.users.write().await;
        let session = users
            .get_mut(user_id)
            .and_then(|h| h.session_mut(session_id))
            .ok_or(RepositoryError::NotFound)?;

        if !messages.is_empty() {
            session.messages.extend_from_slice(messages);
            session.updated_at = at;
        }

        Ok(session.clone())
    }

    async fn get_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .and_then(|h| h.sessions.iter().find(|s| s.id == *session_id))
            .cloned())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        let users = self.users.read().await;
        let mut sessions = users
            .get(user_id)
            .map(|h| h.sessions.clone())
            .unwrap_or_default();
        sort_for_listing(&mut sessions);
        Ok(sessions)
    }

    async fn delete_session(&self, user_id: &str, session_id: &Uuid) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let history = users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        let before = history.sessions.len();
        history.sessions.retain(|s| s.id != *session_id);
        if history.sessions.len() == before {
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
        let mut users = self.users.write().await;
        let session = users
            .get_mut(user_id)
            .and_then(|h| h.session_mut(session_id))
            .ok_or(RepositoryError::NotFound)?;
        session.session_name = session_name.to_string();
        session.updated_at = at;
        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use parley_types::history::{MessageRole, now_micros};

    use super::*;

    #[tokio::test]
    async fn test_sessions_are_scoped_to_owner() {
        let repo = InMemoryHistoryRepository::new();
        let session = ChatSession::new("alice", "mine", now_micros());
        repo.insert_session(&session).await.unwrap();

        assert!(repo.get_session("bob", &session.id).await.unwrap().is_none());
        assert!(repo.list_sessions("bob").await.unwrap().is_empty());
        let err = repo
            .append_messages(
                "bob",
                &session.id,
                &[ChatMessage::text(MessageRole::User, "hi")],
                now_micros(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let repo = InMemoryHistoryRepository::new();
        let session = ChatSession::new("alice", "mine", now_micros());
        repo.insert_session(&session).await.unwrap();
        let err = repo.insert_session(&session).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_orders_by_recency() {
        let repo = InMemoryHistoryRepository::new();
        let t0 = now_micros();
        let older = ChatSession::new("alice", "older", t0);
        let newer = ChatSession::new("alice", "newer", t0 + Duration::seconds(1));
        repo.insert_session(&older).await.unwrap();
        repo.insert_session(&newer).await.unwrap();

        let names: Vec<_> = repo
            .list_sessions("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.session_name)
            .collect();
        assert_eq!(names, vec!["newer", "older"]);

        // Appending to the older session moves it to the front.
        repo.append_messages(
            "alice",
            &older.id,
            &[ChatMessage::text(MessageRole::User, "bump")],
            t0 + Duration::seconds(2),
        )
        .await
        .unwrap();
        let first = repo.list_sessions("alice").await.unwrap().remove(0);
        assert_eq!(first.id, older.id);
    }

    #[tokio::test]
    async fn test_empty_append_does_not_touch_updated_at() {
        let repo = InMemoryHistoryRepository::new();
        let t0 = now_micros();
        let session = ChatSession::new("alice", "s", t0);
        repo.insert_session(&session).await.unwrap();

        let updated = repo
            .append_messages("alice", &session.id, &[], t0 + Duration::seconds(5))
            .await
            .unwrap();
        assert_eq!(updated.updated_at, t0);
        assert!(updated.messages.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let repo = Arc::new(InMemoryHistoryRepository::new());
        let session = ChatSession::new("alice", "s", now_micros());
        repo.insert_session(&session).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let repo = Arc::clone(&repo);
            let id = session.id;
            handles.push(tokio::spawn(async move {
                repo.append_messages(
                    "alice",
                    &id,
                    &[ChatMessage::text(MessageRole::User, format!("m{i}"))],
                    now_micros(),
                )
                .await
                .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let stored = repo.get_session("alice", &session.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 20);
    }

    #[tokio::test]
    async fn test_delete_and_rename_unknown_session() {
        let repo = InMemoryHistoryRepository::new();
        let id = Uuid::now_v7();
        assert!(matches!(
            repo.delete_session("alice", &id).await.unwrap_err(),
            RepositoryError::NotFound
        ));
        assert!(matches!(
            repo.rename_session("alice", &id, "x", now_micros())
                .await
                .unwrap_err(),
            RepositoryError::NotFound
        ));
    }
}
