//! HTTP clients for the History Service and the external auth service.

pub mod auth_client;
pub mod history_client;
