//! HistoryBackend trait: the History Service as seen from the chat client.
//!
//! Implemented over HTTP in parley-infra (`HttpHistoryClient`) and in-process
//! by [`crate::client::local::InProcessBackend`].

use parley_types::error::BackendError;
use parley_types::history::{ChatSession, NewMessage};
use uuid::Uuid;

pub trait HistoryBackend: Send + Sync {
    /// Liveness probe. Any error means the backend is unreachable.
    fn health(&self) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;

    fn list_sessions(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, BackendError>> + Send;

    fn get_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<ChatSession, BackendError>> + Send;

    fn create_session(
        &self,
        user_id: &str,
        session_name: Option<&str>,
    ) -> impl std::future::Future<Output = Result<ChatSession, BackendError>> + Send;

    fn append_message(
        &self,
        user_id: &str,
        session_id: &Uuid,
        message: &NewMessage,
    ) -> impl std::future::Future<Output = Result<ChatSession, BackendError>> + Send;

    fn delete_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;

    fn rename_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
        session_name: &str,
    ) -> impl std::future::Future<Output = Result<ChatSession, BackendError>> + Send;
}
