//! SQLite storage layer.
//!
//! The durable Session Store, backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod history;
pub mod pool;
