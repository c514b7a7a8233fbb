//! Configuration types for Parley.
//!
//! `ParleyConfig` represents the `config.toml` in the data directory. It has a
//! `[server]` table for the History Service and a `[client]` table for the
//! terminal chat client. Every field has a default, so an empty or missing
//! file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded from `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Bind address of the History Service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Endpoints and model used by the chat client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the History Service.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Base URL of the external authentication service, if any.
    #[serde(default)]
    pub auth_url: Option<String>,

    /// Model name passed to `generateContent`.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_model_base_url")]
    pub model_base_url: String,

    /// Per-request timeout for backend and model calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_model_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            auth_url: None,
            model: default_model(),
            model_base_url: default_model_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
