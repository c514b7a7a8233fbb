//! Application state for the History REST API.
//!
//! AppState pins the generic `HistoryService` to the runtime-selected
//! `HistoryStore` so handlers stay non-generic.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::history::memory::InMemoryHistoryRepository;
use parley_core::history::service::HistoryService;
use parley_infra::filesystem::ensure_data_dir;
use parley_infra::sqlite::history::SqliteHistoryRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::store::HistoryStore;

pub type ConcreteHistoryService = HistoryService<HistoryStore>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub history: Arc<ConcreteHistoryService>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the Session Store and wire the service.
    ///
    /// `ephemeral` keeps everything in memory; otherwise the SQLite database
    /// in `data_dir` is created and migrated.
    pub async fn init(data_dir: PathBuf, ephemeral: bool) -> anyhow::Result<Self> {
        let store = if ephemeral {
            HistoryStore::Memory(InMemoryHistoryRepository::new())
        } else {
            ensure_data_dir(&data_dir).await?;
            let pool = DatabasePool::open_in(&data_dir).await?;
            HistoryStore::Sqlite(SqliteHistoryRepository::new(pool))
        };
        tracing::info!(store = store.kind(), data_dir = %data_dir.display(), "session store ready");
        Ok(Self::with_store(store, data_dir))
    }

    pub fn with_store(store: HistoryStore, data_dir: PathBuf) -> Self {
        Self {
            history: Arc::new(HistoryService::new(store)),
            data_dir,
        }
    }

    /// Label of the active store (`sqlite` or `memory`).
    pub fn store_kind(&self) -> &'static str {
        self.history.repo().kind()
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory state for router tests.
    pub fn in_memory() -> Self {
        Self::with_store(
            HistoryStore::Memory(InMemoryHistoryRepository::new()),
            PathBuf::from("."),
        )
    }
}
