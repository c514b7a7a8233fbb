use thiserror::Error;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by the History Service.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Missing or malformed input; maps to 400.
    #[error("{0}")]
    Validation(String),

    /// Unknown session (or session owned by another user); maps to 404.
    #[error("{0} not found")]
    NotFound(String),

    /// Storage failure; maps to 500 with a generic message.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for HistoryError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => HistoryError::NotFound("Session".to_string()),
            other => HistoryError::Storage(other.to_string()),
        }
    }
}

/// Errors from calls to the History Service made by the chat client.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached at all.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("session not found")]
    NotFound,

    /// The backend answered with a non-success status.
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid backend response: {0}")]
    Decode(String),
}

/// Errors from the external generative-language endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    /// Non-success HTTP status from the model endpoint.
    #[error("model API error: {status}")]
    Http { status: u16, body: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Errors while resolving the locally stored credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Please log in to access chat")]
    NotLoggedIn,

    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("credential storage error: {0}")]
    Storage(String),
}
