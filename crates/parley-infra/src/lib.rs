//! Infrastructure layer for Parley.
//!
//! Contains implementations of the traits defined in `parley-core`: the SQLite
//! Session Store, the HTTP clients for the History Service, the auth service
//! and the generative-language endpoint, the credential file, plus config and
//! data-directory resolution.

pub mod config;
pub mod credentials;
pub mod filesystem;
pub mod http;
pub mod llm;
pub mod sqlite;
pub mod store;
