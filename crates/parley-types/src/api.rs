//! Wire shapes of the History REST API.
//!
//! Shared by the axum handlers (which deserialize requests) and the reqwest
//! client (which serializes them). Request fields are optional so that a
//! missing field surfaces as a validation error with a readable message
//! instead of a generic deserialization failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::{ChatSession, NewMessage};

/// Body of `POST /history/session`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
}

/// Body of `POST /history/message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendMessageRequest {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub message: Option<NewMessage>,
}

/// Body of `POST /history/messages/bulk`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendMessagesRequest {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub messages: Option<Vec<NewMessage>>,
}

/// Body of `PATCH /history/session/{sessionId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSessionRequest {
    pub user_id: Option<String>,
    pub session_name: Option<String>,
}

/// Query string carrying the owning user (`?userId=...`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

/// `{success, session}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnvelope {
    pub success: bool,
    pub session: ChatSession,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `{success, sessions, count}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListEnvelope {
    pub success: bool,
    pub sessions: Vec<ChatSession>,
    #[serde(default)]
    pub count: usize,
}

/// `{success, deleted}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEnvelope {
    pub success: bool,
    pub deleted: bool,
}

/// `{success: false, message}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}
