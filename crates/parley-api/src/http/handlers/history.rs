//! History HTTP handlers.
//!
//! Endpoints:
//! - POST   /history/session                  - Create a session (201)
//! - POST   /history/message                  - Append one message
//! - POST   /history/messages/bulk            - Append many messages at once
//! - GET    /history/session/{sessionId}      - Fetch a session (`?userId=`)
//! - GET    /history/user/{userId}/sessions   - List a user's sessions
//! - DELETE /history/session/{sessionId}      - Delete a session (`?userId=`)
//! - PATCH  /history/session/{sessionId}      - Rename a session

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use parley_types::api::{
    AppendMessageRequest, AppendMessagesRequest, CreateSessionRequest, DeleteEnvelope,
    RenameSessionRequest, SessionEnvelope, SessionListEnvelope, UserQuery,
};
use uuid::Uuid;

use crate::http::error::AppError;
use crate::state::AppState;

/// Parse a session id, returning a 400 error on invalid format.
fn parse_session_id(s: &str) -> Result<Uuid, AppError> {
    s.trim()
        .parse::<Uuid>()
        .map_err(|_| AppError::Validation("Invalid sessionId format".to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require_user(query: UserQuery) -> Result<String, AppError> {
    non_blank(query.user_id).ok_or_else(|| AppError::Validation("userId is required".to_string()))
}

fn found(session: parley_types::history::ChatSession) -> Json<SessionEnvelope> {
    Json(SessionEnvelope {
        success: true,
        session,
        message: None,
    })
}

/// POST /history/session - Create an empty session.
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionEnvelope>), AppError> {
    let Json(req) = payload?;
    let user_id = non_blank(req.user_id)
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))?;

    let session = state
        .history
        .create_session(&user_id, req.session_name.as_deref())
        .await?;

    Ok((StatusCode::CREATED, found(session)))
}

/// POST /history/message - Append one message to a session.
pub async fn append_message(
    State(state): State<AppState>,
    payload: Result<Json<AppendMessageRequest>, JsonRejection>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let Json(req) = payload?;
    let (Some(user_id), Some(session_id), Some(message)) =
        (non_blank(req.user_id), non_blank(req.session_id), req.message)
    else {
        return Err(AppError::Validation(
            "Missing userId, sessionId, or message".to_string(),
        ));
    };
    let session_id = parse_session_id(&session_id)?;

    let session = state
        .history
        .append_message(&user_id, &session_id, message)
        .await?;

    Ok(found(session))
}

/// POST /history/messages/bulk - Append many messages in one all-or-nothing push.
pub async fn append_messages(
    State(state): State<AppState>,
    payload: Result<Json<AppendMessagesRequest>, JsonRejection>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let Json(req) = payload?;
    let (Some(user_id), Some(session_id), Some(messages)) =
        (non_blank(req.user_id), non_blank(req.session_id), req.messages)
    else {
        return Err(AppError::Validation(
            "Missing userId, sessionId, or messages array".to_string(),
        ));
    };
    let session_id = parse_session_id(&session_id)?;
    let count = messages.len();

    let session = state
        .history
        .append_messages(&user_id, &session_id, messages)
        .await?;

    Ok(Json(SessionEnvelope {
        success: true,
        session,
        message: Some(format!("{count} messages added successfully")),
    }))
}

/// GET /history/session/{sessionId}?userId=... - Fetch one session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let Query(query) = query?;
    let user_id = require_user(query)?;

    let session = state.history.get_session(&user_id, &session_id).await?;
    Ok(found(session))
}

/// GET /history/user/{userId}/sessions - All sessions of a user, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionListEnvelope>, AppError> {
    let sessions = state.history.list_sessions(&user_id).await?;
    Ok(Json(SessionListEnvelope {
        success: true,
        count: sessions.len(),
        sessions,
    }))
}

/// DELETE /history/session/{sessionId}?userId=... - Delete a session and its messages.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<DeleteEnvelope>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let Query(query) = query?;
    let user_id = require_user(query)?;

    state.history.delete_session(&user_id, &session_id).await?;
    Ok(Json(DeleteEnvelope {
        success: true,
        deleted: true,
    }))
}

/// PATCH /history/session/{sessionId} - Rename a session.
pub async fn rename_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<RenameSessionRequest>, JsonRejection>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let Json(req) = payload?;
    let user_id = non_blank(req.user_id)
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))?;

    let session = state
        .history
        .rename_session(&user_id, &session_id, req.session_name.as_deref().unwrap_or_default())
        .await?;
    Ok(found(session))
}
