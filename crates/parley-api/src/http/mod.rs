//! History REST API.
//!
//! Axum router serving `/history/...` and `/health` with the
//! `{success, ...}` envelope and CORS support.

pub mod error;
pub mod handlers;
pub mod router;
