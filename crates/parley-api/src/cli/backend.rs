//! Client-side choice of History Service transport.
//!
//! `ClientBackend` lets `parley chat` and `parley session` run against a
//! remote server over HTTP or against the local SQLite store in-process.

use std::path::Path;

use parley_core::client::backend::HistoryBackend;
use parley_core::client::local::InProcessBackend;
use parley_infra::filesystem::ensure_data_dir;
use parley_infra::http::history_client::HttpHistoryClient;
use parley_infra::sqlite::history::SqliteHistoryRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::store::HistoryStore;
use parley_types::config::ClientConfig;
use parley_types::error::BackendError;
use parley_types::history::{ChatSession, NewMessage};
use uuid::Uuid;

use super::BackendArgs;

pub enum ClientBackend {
    Http(HttpHistoryClient),
    Local(InProcessBackend<HistoryStore>),
}

impl ClientBackend {
    /// Build the backend selected by the flags, falling back to the
    /// configured backend URL.
    pub async fn connect(
        args: &BackendArgs,
        config: &ClientConfig,
        data_dir: &Path,
    ) -> anyhow::Result<Self> {
        if args.local {
            ensure_data_dir(data_dir).await?;
            let pool = DatabasePool::open_in(data_dir).await?;
            let store = HistoryStore::Sqlite(SqliteHistoryRepository::new(pool));
            return Ok(ClientBackend::Local(InProcessBackend::new(store)));
        }

        let url = args.backend_url.as_deref().unwrap_or(&config.backend_url);
        Ok(ClientBackend::Http(HttpHistoryClient::new(url)?))
    }

    /// Where the sessions live, for banners and error panels.
    pub fn describe(&self) -> String {
        match self {
            ClientBackend::Http(client) => client.base_url().to_string(),
            ClientBackend::Local(_) => "local store".to_string(),
        }
    }
}

impl HistoryBackend for ClientBackend {
    async fn health(&self) -> Result<(), BackendError> {
        match self {
            ClientBackend::Http(b) => b.health().await,
            ClientBackend::Local(b) => b.health().await,
        }
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, BackendError> {
        match self {
            ClientBackend::Http(b) => b.list_sessions(user_id).await,
            ClientBackend::Local(b) => b.list_sessions(user_id).await,
        }
    }

    async fn get_session(&self, user_id: &str, session_id: &Uuid) -> Result<ChatSession, BackendError> {
        match self {
            ClientBackend::Http(b) => b.get_session(user_id, session_id).await,
            ClientBackend::Local(b) => b.get_session(user_id, session_id).await,
        }
    }

    async fn create_session(
        &self,
        user_id: &str,
        session_name: Option<&str>,
    ) -> Result<ChatSession, BackendError> {
        match self {
            ClientBackend::Http(b) => b.create_session(user_id, session_name).await,
            ClientBackend::Local(b) => b.create_session(user_id, session_name).await,
        }
    }

    async fn append_message(
        &self,
        user_id: &str,
        session_id: &Uuid,
        message: &NewMessage,
    ) -> Result<ChatSession, BackendError> {
        match self {
            ClientBackend::Http(b) => b.append_message(user_id, session_id, message).await,
            ClientBackend::Local(b) => b.append_message(user_id, session_id, message).await,
        }
    }

    async fn delete_session(&self, user_id: &str, session_id: &Uuid) -> Result<(), BackendError> {
        match self {
            ClientBackend::Http(b) => b.delete_session(user_id, session_id).await,
            ClientBackend::Local(b) => b.delete_session(user_id, session_id).await,
        }
    }

    async fn rename_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
        session_name: &str,
    ) -> Result<ChatSession, BackendError> {
        match self {
            ClientBackend::Http(b) => b.rename_session(user_id, session_id, session_name).await,
            ClientBackend::Local(b) => b.rename_session(user_id, session_id, session_name).await,
        }
    }
}

/// Resolve a session reference typed by the user.
///
/// Accepts a 1-based position in `sessions` or a full session id.
pub fn resolve_session_ref(sessions: &[ChatSession], reference: &str) -> Option<Uuid> {
    let reference = reference.trim();
    if let Ok(position) = reference.parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|i| sessions.get(i))
            .map(|s| s.id);
    }
    let id = reference.parse::<Uuid>().ok()?;
    sessions.iter().find(|s| s.id == id).map(|s| s.id)
}
