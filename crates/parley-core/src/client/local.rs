//! In-process backend: drives a [`HistoryService`] directly, no HTTP.
//!
//! Used by `parley chat --local` and by the controller tests.

use parley_types::error::{BackendError, HistoryError};
use parley_types::history::{ChatSession, NewMessage};
use uuid::Uuid;

use super::backend::HistoryBackend;
use crate::history::repository::HistoryRepository;
use crate::history::service::HistoryService;

pub struct InProcessBackend<R: HistoryRepository> {
    service: HistoryService<R>,
}

impl<R: HistoryRepository> InProcessBackend<R> {
    pub fn new(repo: R) -> Self {
        Self {
            service: HistoryService::new(repo),
        }
    }

    pub fn service(&self) -> &HistoryService<R> {
        &self.service
    }
}

/// Same status mapping the REST layer applies.
fn to_backend_error(e: HistoryError) -> BackendError {
    match e {
        HistoryError::NotFound(_) => BackendError::NotFound,
        HistoryError::Validation(message) => BackendError::Rejected {
            status: 400,
            message,
        },
        HistoryError::Storage(message) => BackendError::Rejected {
            status: 500,
            message,
        },
    }
}

impl<R: HistoryRepository> HistoryBackend for InProcessBackend<R> {
    async fn health(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, BackendError> {
        self.service
            .list_sessions(user_id)
            .await
            .map_err(to_backend_error)
    }

    async fn get_session(&self, user_id: &str, session_id: &Uuid) -> Result<ChatSession, BackendError> {
        self.service
            .get_session(user_id, session_id)
            .await
            .map_err(to_backend_error)
    }

    async fn create_session(
        &self,
        user_id: &str,
        session_name: Option<&str>,
    ) -> Result<ChatSession, BackendError> {
        self.service
            .create_session(user_id, session_name)
            .await
            .map_err(to_backend_error)
    }

    async fn append_message(
        &self,
        user_id: &str,
        session_id: &Uuid,
        message: &NewMessage,
    ) -> Result<ChatSession, BackendError> {
        self.service
            .append_message(user_id, session_id, message.clone())
            .await
            .map_err(to_backend_error)
    }

    async fn delete_session(&self, user_id: &str, session_id: &Uuid) -> Result<(), BackendError> {
        self.service
            .delete_session(user_id, session_id)
            .await
            .map_err(to_backend_error)
    }

    async fn rename_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
        session_name: &str,
    ) -> Result<ChatSession, BackendError> {
        self.service
            .rename_session(user_id, session_id, session_name)
            .await
            .map_err(to_backend_error)
    }
}
