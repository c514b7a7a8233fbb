//! Chat session and message types for Parley.
//!
//! A [`ChatSession`] is a named, append-only log of [`ChatMessage`]s owned by
//! exactly one user. Messages are immutable once persisted.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Text of the message that seeds every freshly created session.
pub const WELCOME_MESSAGE: &str = "Hello! I'm your AI assistant. How can I help you today?";

/// Current time truncated to microseconds.
///
/// Stored timestamps carry microsecond precision, so every timestamp that
/// enters a session goes through this to keep reads equal to writes.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Human-readable session name derived from a point in time.
pub fn default_session_name(at: DateTime<Utc>) -> String {
    format!("Session {}", at.format("%Y-%m-%d %H:%M:%S"))
}

/// Author of a chat message.
///
/// Exactly two members. The legacy `bot` tag found in older records is
/// accepted on read and normalized to [`MessageRole::Model`]; it is never
/// written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

impl MessageRole {
    /// The stored/wire representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Model => "model",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "model" | "bot" => Ok(MessageRole::Model),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

impl<'de> Deserialize<'de> for MessageRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One text fragment of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePart {
    pub text: String,
}

impl MessagePart {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A persisted (or locally displayed) chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub parts: Vec<MessagePart>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Single-part message stamped with the current time.
    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![MessagePart::new(text)],
            timestamp: now_micros(),
        }
    }

    /// The fixed greeting shown at the top of a new or empty session.
    pub fn welcome() -> Self {
        Self::text(MessageRole::Model, WELCOME_MESSAGE)
    }

    /// Text of the first part, or an empty string.
    pub fn first_text(&self) -> &str {
        self.parts.first().map(|p| p.text.as_str()).unwrap_or_default()
    }
}

/// A message as submitted for appending.
///
/// The timestamp is optional on input; the History Service fills in the
/// current time when it is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewMessage {
    /// Check the shape invariants of a message before it is stored.
    pub fn validate(&self) -> Result<(), String> {
        if self.parts.is_empty() {
            return Err("message parts must not be empty".to_string());
        }
        Ok(())
    }

    /// Resolve into a stored message, defaulting the timestamp to `now`.
    pub fn into_message(self, now: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            role: self.role,
            parts: self.parts,
            timestamp: self.timestamp.map(|t| t.trunc_subsecs(6)).unwrap_or(now),
        }
    }
}

impl From<&ChatMessage> for NewMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            parts: message.parts.clone(),
            timestamp: Some(message.timestamp),
        }
    }
}

/// A chat session with its full, insertion-ordered message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    #[serde(alias = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub session_name: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// A fresh, empty session created at `at`.
    pub fn new(user_id: impl Into<String>, session_name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            session_name: session_name.into(),
            messages: Vec::new(),
            created_at: at,
            updated_at: at,
        }
    }
}

/// Listing shape for a session without its messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub session_name: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ChatSession> for SessionSummary {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id,
            session_name: session.session_name.clone(),
            message_count: session.messages.len(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
