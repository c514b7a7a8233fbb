//! HttpHistoryClient -- [`HistoryBackend`] over the History REST API.

use parley_core::client::backend::HistoryBackend;
use parley_types::api::{
    AppendMessageRequest, CreateSessionRequest, DeleteEnvelope, ErrorEnvelope,
    RenameSessionRequest, SessionEnvelope, SessionListEnvelope,
};
use parley_types::error::BackendError;
use parley_types::history::{ChatSession, NewMessage};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use uuid::Uuid;

#[derive(Clone)]
pub struct HttpHistoryClient {
    base: Url,
    client: reqwest::Client,
}

impl HttpHistoryClient {
    /// Client for the History Service at `base_url` (e.g. `http://localhost:3000`).
    ///
    /// Uses reqwest's default timeouts.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let base = Url::parse(base_url)
            .map_err(|e| BackendError::Unavailable(format!("invalid backend URL '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::Unavailable(format!(
                "invalid backend URL '{base_url}'"
            )));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `base` with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            tracing::debug!(status = status.as_u16(), %message, "history request rejected");
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl HistoryBackend for HttpHistoryClient {
    async fn health(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.endpoint(&["health"]))
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BackendError::Unavailable(format!(
                "health check returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, BackendError> {
        let url = self.endpoint(&["history", "user", user_id, "sessions"]);
        let envelope: SessionListEnvelope = self.send(self.client.get(url)).await?;
        Ok(envelope.sessions)
    }

    async fn get_session(&self, user_id: &str, session_id: &Uuid) -> Result<ChatSession, BackendError> {
        let id = session_id.to_string();
        let url = self.endpoint(&["history", "session", &id]);
        let envelope: SessionEnvelope = self
            .send(self.client.get(url).query(&[("userId", user_id)]))
            .await?;
        Ok(envelope.session)
    }

    async fn create_session(
        &self,
        user_id: &str,
        session_name: Option<&str>,
    ) -> Result<ChatSession, BackendError> {
        let body = CreateSessionRequest {
            user_id: Some(user_id.to_string()),
            session_name: session_name.map(str::to_string),
        };
        let url = self.endpoint(&["history", "session"]);
        let envelope: SessionEnvelope = self.send(self.client.post(url).json(&body)).await?;
        Ok(envelope.session)
    }

    async fn append_message(
        &self,
        user_id: &str,
        session_id: &Uuid,
        message: &NewMessage,
    ) -> Result<ChatSession, BackendError> {
        let body = AppendMessageRequest {
            user_id: Some(user_id.to_string()),
            session_id: Some(session_id.to_string()),
            message: Some(message.clone()),
        };
        let url = self.endpoint(&["history", "message"]);
        let envelope: SessionEnvelope = self.send(self.client.post(url).json(&body)).await?;
        Ok(envelope.session)
    }

    async fn delete_session(&self, user_id: &str, session_id: &Uuid) -> Result<(), BackendError> {
        let id = session_id.to_string();
        let url = self.endpoint(&["history", "session", &id]);
        // A missing session is a 404, so any success body means deleted.
        let _: DeleteEnvelope = self
            .send(self.client.delete(url).query(&[("userId", user_id)]))
            .await?;
        Ok(())
    }

    async fn rename_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
        session_name: &str,
    ) -> Result<ChatSession, BackendError> {
        let body = RenameSessionRequest {
            user_id: Some(user_id.to_string()),
            session_name: Some(session_name.to_string()),
        };
        let id = session_id.to_string();
        let url = self.endpoint(&["history", "session", &id]);
        let envelope: SessionEnvelope = self.send(self.client.patch(url).json(&body)).await?;
        Ok(envelope.session)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Json;
    use axum::Router;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use parley_types::api::{HealthStatus, UserQuery};
    use parley_types::history::{MessageRole, now_micros};
    use tokio::sync::Mutex;

    use super::*;

    type Sessions = Arc<Mutex<Vec<ChatSession>>>;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Minimal stand-in for the History Service.
    fn stub(sessions: Sessions) -> Router {
        Router::new()
            .route(
                "/health",
                get(|| async {
                    Json(HealthStatus {
                        status: "ok".to_string(),
                        timestamp: now_micros(),
                        version: "test".to_string(),
                    })
                }),
            )
            .route(
                "/history/session",
                post(
                    |State(s): State<Sessions>, Json(req): Json<CreateSessionRequest>| async move {
                        let session = ChatSession::new(
                            req.user_id.unwrap_or_default(),
                            req.session_name.unwrap_or_else(|| "default".to_string()),
                            now_micros(),
                        );
                        s.lock().await.push(session.clone());
                        (
                            StatusCode::CREATED,
                            Json(SessionEnvelope {
                                success: true,
                                session,
                                message: None,
                            }),
                        )
                    },
                ),
            )
            .route(
                "/history/message",
                post(
                    |State(s): State<Sessions>, Json(req): Json<AppendMessageRequest>| async move {
                        let mut sessions = s.lock().await;
                        let id = req.session_id.unwrap_or_default();
                        let Some(session) = sessions.iter_mut().find(|x| x.id.to_string() == id)
                        else {
                            return (
                                StatusCode::NOT_FOUND,
                                Json(serde_json::json!({"success": false, "message": "Session not found"})),
                            )
                                .into_response();
                        };
                        if let Some(m) = req.message {
                            session.messages.push(m.into_message(now_micros()));
                        }
                        Json(SessionEnvelope {
                            success: true,
                            session: session.clone(),
                            message: None,
                        })
                        .into_response()
                    },
                ),
            )
            .route(
                "/history/session/{id}",
                get(
                    |State(s): State<Sessions>, Path(id): Path<Uuid>, Query(q): Query<UserQuery>| async move {
                        let sessions = s.lock().await;
                        match sessions
                            .iter()
                            .find(|x| x.id == id && Some(&x.user_id) == q.user_id.as_ref())
                        {
                            Some(session) => Json(SessionEnvelope {
                                success: true,
                                session: session.clone(),
                                message: None,
                            })
                            .into_response(),
                            None => (
                                StatusCode::NOT_FOUND,
                                Json(serde_json::json!({"success": false, "message": "Session not found"})),
                            )
                                .into_response(),
                        }
                    },
                )
                .delete(|State(s): State<Sessions>, Path(id): Path<Uuid>| async move {
                    let mut sessions = s.lock().await;
                    let before = sessions.len();
                    sessions.retain(|x| x.id != id);
                    if sessions.len() == before {
                        return (
                            StatusCode::NOT_FOUND,
                            Json(serde_json::json!({"success": false, "message": "Session not found"})),
                        )
                            .into_response();
                    }
                    Json(DeleteEnvelope {
                        success: true,
                        deleted: true,
                    })
                    .into_response()
                }),
            )
            .route(
                "/history/user/{user_id}/sessions",
                get(|State(s): State<Sessions>, Path(user_id): Path<String>| async move {
                    let sessions: Vec<ChatSession> = s
                        .lock()
                        .await
                        .iter()
                        .filter(|x| x.user_id == user_id)
                        .cloned()
                        .collect();
                    let count = sessions.len();
                    Json(SessionListEnvelope {
                        success: true,
                        sessions,
                        count,
                    })
                }),
            )
            .with_state(sessions)
    }

    #[tokio::test]
    async fn test_round_trip_against_stub() {
        let sessions: Sessions = Arc::default();
        let base = spawn(stub(sessions.clone())).await;
        let client = HttpHistoryClient::new(&base).unwrap();

        client.health().await.unwrap();

        let created = client.create_session("u 1", Some("Named")).await.unwrap();
        assert_eq!(created.session_name, "Named");

        let message = NewMessage::from(&parley_types::history::ChatMessage::text(
            MessageRole::User,
            "Hello",
        ));
        let updated = client
            .append_message("u 1", &created.id, &message)
            .await
            .unwrap();
        assert_eq!(updated.messages.len(), 1);

        // User ids with spaces survive the path and query encoding.
        let listed = client.list_sessions("u 1").await.unwrap();
        assert_eq!(listed.len(), 1);
        let fetched = client.get_session("u 1", &created.id).await.unwrap();
        assert_eq!(fetched.messages[0].first_text(), "Hello");

        client.delete_session("u 1", &created.id).await.unwrap();
        assert!(sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_and_rejections() {
        let base = spawn(stub(Arc::default())).await;
        let client = HttpHistoryClient::new(&base).unwrap();

        let err = client.get_session("u1", &Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound));

        let err = client
            .delete_session("u1", &Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_trusts_success_status_over_flag() {
        let router = Router::new().route(
            "/history/session/{id}",
            axum::routing::delete(|| async {
                Json(DeleteEnvelope {
                    success: true,
                    deleted: false,
                })
            }),
        );
        let base = spawn(router).await;
        let client = HttpHistoryClient::new(&base).unwrap();

        client.delete_session("u1", &Uuid::now_v7()).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_envelope_message_is_surfaced() {
        let router = Router::new().route(
            "/history/user/{user_id}/sessions",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"success": false, "message": "Internal server error"})),
                )
            }),
        );
        let base = spawn(router).await;
        let client = HttpHistoryClient::new(&base).unwrap();

        match client.list_sessions("u1").await.unwrap_err() {
            BackendError::Rejected { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal server error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_health() {
        let client = HttpHistoryClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            client.health().await.unwrap_err(),
            BackendError::Unavailable(_)
        ));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = HttpHistoryClient::new("http://example.test/api/").unwrap();
        assert_eq!(
            client.endpoint(&["history", "session"]).as_str(),
            "http://example.test/api/history/session"
        );
        assert!(HttpHistoryClient::new("not a url").is_err());
    }
}
