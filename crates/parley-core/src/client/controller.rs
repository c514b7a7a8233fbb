//! Chat client controller.
//!
//! Owns the local transcript of the active session and the sidebar list of
//! sessions, and keeps both loosely in step with the History Service. Local
//! state wins for display: a message is shown before it is persisted, and a
//! message that fails to persist stays on screen and is not retried.
//!
//! All methods take `&mut self`, so there is one logical thread of control.
//! A message is always persisted (or has failed to persist) before the
//! transcript containing it is sent to the model.

use std::sync::Arc;

use parley_types::error::BackendError;
use parley_types::history::{ChatMessage, ChatSession, MessageRole, NewMessage};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::backend::HistoryBackend;
use super::context::SessionContext;
use super::transcript::Transcript;
use crate::llm::provider::LanguageModel;

/// Prefix of the synthetic message shown when the model call fails.
pub const ERROR_MARKER: &str = "⚠️";

/// Shown when the model answers without any text.
pub const EMPTY_REPLY_MESSAGE: &str = "⚠️ No response from model";

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Initializing,
    /// The liveness probe or the initial load failed. Read-only.
    BackendUnavailable,
    Idle,
    /// A message is in flight. Submitting and creating sessions are refused.
    Sending,
}

impl ControllerState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ControllerState::Idle | ControllerState::Sending)
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("chat is not ready")]
    NotReady,

    #[error("a message is already being sent")]
    Busy,

    #[error("message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct ChatController<B: HistoryBackend, M: LanguageModel> {
    backend: B,
    model: M,
    context: Arc<SessionContext>,
    state: ControllerState,
    sessions: Vec<ChatSession>,
    active: Option<Uuid>,
    transcript: Transcript,
}

impl<B: HistoryBackend, M: LanguageModel> ChatController<B, M> {
    pub fn new(backend: B, model: M, context: Arc<SessionContext>) -> Self {
        Self {
            backend,
            model,
            context,
            state: ControllerState::Initializing,
            sessions: Vec::new(),
            active: None,
            transcript: Transcript::default(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Sidebar list, most recent first.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_session_id(&self) -> Option<Uuid> {
        self.active
    }

    /// The active session's entry in the sidebar list.
    pub fn active_session(&self) -> Option<&ChatSession> {
        let id = self.active?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    /// Probe the backend, then open the most recent session or create the
    /// first one.
    ///
    /// On failure the controller stays in [`ControllerState::BackendUnavailable`]
    /// and the error is returned for display.
    pub async fn initialize(&mut self) -> Result<(), ControllerError> {
        self.state = ControllerState::Initializing;
        let user_id = self.context.user_id.clone();

        if let Err(e) = self.backend.health().await {
            warn!(error = %e, "history backend unreachable");
            self.state = ControllerState::BackendUnavailable;
            return Err(e.into());
        }

        let result = self.load_initial(&user_id).await;
        match &result {
            Ok(()) => {
                self.state = ControllerState::Idle;
                info!(
                    user_id = %user_id,
                    sessions = self.sessions.len(),
                    active = ?self.active,
                    "chat ready"
                );
            }
            Err(e) => {
                warn!(error = %e, "initial session load failed");
                self.state = ControllerState::BackendUnavailable;
            }
        }
        result
    }

    async fn load_initial(&mut self, user_id: &str) -> Result<(), ControllerError> {
        self.sessions = self.backend.list_sessions(user_id).await?;
        match self.sessions.first().map(|s| s.id) {
            Some(most_recent) => self.open_session(most_recent).await,
            None => self.create_seeded_session(None).await,
        }
    }

    /// Submit a user message and wait for the model's reply.
    ///
    /// Returns the model-role message appended to the transcript, which is a
    /// synthetic warning when the model call fails or comes back empty. Model
    /// failures are never returned as errors.
    pub async fn send_message(&mut self, text: &str) -> Result<ChatMessage, ControllerError> {
        match self.state {
            ControllerState::Sending => return Err(ControllerError::Busy),
            ControllerState::Idle => {}
            _ => return Err(ControllerError::NotReady),
        }
        if text.trim().is_empty() {
            return Err(ControllerError::EmptyMessage);
        }
        if self.active.is_none() {
            return Err(ControllerError::NotReady);
        }

        self.state = ControllerState::Sending;

        let outgoing = ChatMessage::text(MessageRole::User, text);
        self.transcript.push(outgoing.clone());
        self.persist(&outgoing).await;

        let request = self.transcript.to_request();
        let reply = match self.model.generate(&request).await {
            Ok(response) => match response.first_text() {
                Some(text) if !text.trim().is_empty() => ChatMessage::text(MessageRole::Model, text),
                _ => {
                    warn!(model = self.model.model(), "model returned no text");
                    ChatMessage::text(MessageRole::Model, EMPTY_REPLY_MESSAGE)
                }
            },
            Err(e) => {
                warn!(provider = self.model.name(), error = %e, "model call failed");
                ChatMessage::text(MessageRole::Model, format!("{ERROR_MARKER} Error: {e}"))
            }
        };

        self.transcript.push(reply.clone());
        self.persist(&reply).await;

        self.state = ControllerState::Idle;
        Ok(reply)
    }

    /// Replace the transcript with another session's messages.
    ///
    /// No-op when `session_id` is already active.
    pub async fn switch_session(&mut self, session_id: Uuid) -> Result<(), ControllerError> {
        self.ensure_idle()?;
        if self.active == Some(session_id) {
            return Ok(());
        }
        self.open_session(session_id).await
    }

    /// Delete a session, then reselect or recreate so there is always an
    /// active session.
    pub async fn delete_session(&mut self, session_id: Uuid) -> Result<(), ControllerError> {
        self.ensure_idle()?;
        let user_id = self.context.user_id.clone();

        let was_active = self.active == Some(session_id);
        self.backend.delete_session(&user_id, &session_id).await?;
        info!(session_id = %session_id, "session deleted");

        self.sessions.retain(|s| s.id != session_id);
        if was_active {
            self.active = None;
            self.transcript = Transcript::default();
        }

        match self.backend.list_sessions(&user_id).await {
            Ok(sessions) => self.sessions = sessions,
            Err(e) => warn!(error = %e, "session list refresh failed; keeping local list"),
        }

        // On failure below `active` stays empty and sends report NotReady.
        if was_active {
            match self.sessions.first().map(|s| s.id) {
                Some(next) => self.open_session(next).await?,
                None => self.create_seeded_session(None).await?,
            }
        }
        Ok(())
    }

    /// Create a new session seeded with the welcome message and switch to it.
    pub async fn new_session(&mut self, session_name: Option<&str>) -> Result<(), ControllerError> {
        self.ensure_idle()?;
        self.create_seeded_session(session_name).await
    }

    /// Reload the sidebar list without touching the transcript.
    pub async fn refresh_sessions(&mut self) -> Result<(), ControllerError> {
        if !self.state.is_ready() {
            return Err(ControllerError::NotReady);
        }
        self.sessions = self
            .backend
            .list_sessions(&self.context.user_id)
            .await?;
        Ok(())
    }

    pub async fn rename_session(
        &mut self,
        session_id: Uuid,
        session_name: &str,
    ) -> Result<ChatSession, ControllerError> {
        self.ensure_idle()?;
        let renamed = self
            .backend
            .rename_session(&self.context.user_id, &session_id, session_name)
            .await?;
        if let Some(entry) = self.sessions.iter_mut().find(|s| s.id == session_id) {
            entry.session_name = renamed.session_name.clone();
            entry.updated_at = renamed.updated_at;
        }
        Ok(renamed)
    }

    fn ensure_idle(&self) -> Result<(), ControllerError> {
        match self.state {
            ControllerState::Idle => Ok(()),
            ControllerState::Sending => Err(ControllerError::Busy),
            _ => Err(ControllerError::NotReady),
        }
    }

    async fn open_session(&mut self, session_id: Uuid) -> Result<(), ControllerError> {
        let session = self
            .backend
            .get_session(&self.context.user_id, &session_id)
            .await?;
        debug!(session_id = %session_id, messages = session.messages.len(), "session opened");
        self.active = Some(session.id);
        self.transcript = Transcript::from_stored(session.messages);
        Ok(())
    }

    async fn create_seeded_session(&mut self, session_name: Option<&str>) -> Result<(), ControllerError> {
        let user_id = self.context.user_id.clone();
        let session = self.backend.create_session(&user_id, session_name).await?;
        info!(session_id = %session.id, name = %session.session_name, "session created");

        self.active = Some(session.id);
        self.transcript = Transcript::welcome();
        if let Some(welcome) = self.transcript.last().cloned() {
            self.persist(&welcome).await;
        }

        match self.backend.list_sessions(&user_id).await {
            Ok(sessions) => self.sessions = sessions,
            Err(e) => {
                warn!(error = %e, "session list refresh failed");
                self.sessions.insert(0, session);
            }
        }
        Ok(())
    }

    /// Best-effort write of one message to the active session.
    async fn persist(&self, message: &ChatMessage) {
        let Some(session_id) = self.active else {
            return;
        };
        if let Err(e) = self
            .backend
            .append_message(&self.context.user_id, &session_id, &NewMessage::from(message))
            .await
        {
            warn!(
                session_id = %session_id,
                role = %message.role,
                error = %e,
                "message not persisted; it stays visible locally and is not retried"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use parley_types::error::LlmError;
    use parley_types::history::WELCOME_MESSAGE;
    use parley_types::llm::{GenerateContentRequest, GenerateContentResponse};

    use super::*;
    use crate::client::local::InProcessBackend;
    use crate::history::memory::InMemoryHistoryRepository;

    /// In-process backend with switches for offline and failing calls.
    struct TestBackend {
        inner: InProcessBackend<InMemoryHistoryRepository>,
        offline: AtomicBool,
        fail_appends: AtomicBool,
        fail_lists: AtomicBool,
        fail_creates: AtomicBool,
    }

    impl TestBackend {
        fn new() -> Self {
            Self {
                inner: InProcessBackend::new(InMemoryHistoryRepository::new()),
                offline: AtomicBool::new(false),
                fail_appends: AtomicBool::new(false),
                fail_lists: AtomicBool::new(false),
                fail_creates: AtomicBool::new(false),
            }
        }

        fn check(&self) -> Result<(), BackendError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(BackendError::Unavailable("connection refused".to_string()));
            }
            Ok(())
        }

        fn tripped(flag: &AtomicBool) -> Result<(), BackendError> {
            if flag.load(Ordering::SeqCst) {
                return Err(BackendError::Rejected {
                    status: 500,
                    message: "Internal server error".to_string(),
                });
            }
            Ok(())
        }
    }

    impl HistoryBackend for TestBackend {
        async fn health(&self) -> Result<(), BackendError> {
            self.check()
        }

        async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, BackendError> {
            self.check()?;
            Self::tripped(&self.fail_lists)?;
            self.inner.list_sessions(user_id).await
        }

        async fn get_session(&self, user_id: &str, session_id: &Uuid) -> Result<ChatSession, BackendError> {
            self.check()?;
            self.inner.get_session(user_id, session_id).await
        }

        async fn create_session(
            &self,
            user_id: &str,
            session_name: Option<&str>,
        ) -> Result<ChatSession, BackendError> {
            self.check()?;
            Self::tripped(&self.fail_creates)?;
            self.inner.create_session(user_id, session_name).await
        }

        async fn append_message(
            &self,
            user_id: &str,
            session_id: &Uuid,
            message: &NewMessage,
        ) -> Result<ChatSession, BackendError> {
            self.check()?;
            Self::tripped(&self.fail_appends)?;
            self.inner.append_message(user_id, session_id, message).await
        }

        async fn delete_session(&self, user_id: &str, session_id: &Uuid) -> Result<(), BackendError> {
            self.check()?;
            self.inner.delete_session(user_id, session_id).await
        }

        async fn rename_session(
            &self,
            user_id: &str,
            session_id: &Uuid,
            session_name: &str,
        ) -> Result<ChatSession, BackendError> {
            self.check()?;
            self.inner
                .rename_session(user_id, session_id, session_name)
                .await
        }
    }

    /// Model that replays queued outcomes and records every request.
    #[derive(Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<GenerateContentResponse, LlmError>>>,
        requests: Mutex<Vec<GenerateContentRequest>>,
    }

    impl ScriptedModel {
        fn replying(outcomes: Vec<Result<GenerateContentResponse, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(outcomes.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<GenerateContentRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn generate(
            &self,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(GenerateContentResponse::from_text("ok")))
        }
    }

    fn context(user_id: &str) -> Arc<SessionContext> {
        Arc::new(SessionContext {
            token: None,
            user: None,
            user_id: user_id.to_string(),
        })
    }

    fn controller(model: ScriptedModel) -> ChatController<TestBackend, ScriptedModel> {
        ChatController::new(TestBackend::new(), model, context("u1"))
    }

    async fn stored(c: &ChatController<TestBackend, ScriptedModel>, id: Uuid) -> ChatSession {
        c.backend().inner.get_session("u1", &id).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_login_creates_one_seeded_session() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();

        assert_eq!(c.state(), ControllerState::Idle);
        assert_eq!(c.sessions().len(), 1);

        let session = stored(&c, c.active_session_id().unwrap()).await;
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, MessageRole::Model);
        assert_eq!(session.messages[0].first_text(), WELCOME_MESSAGE);
        assert_eq!(c.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_initialize_opens_most_recent_session() {
        let mut c = controller(ScriptedModel::default());
        let svc = c.backend().inner.service();
        let older = svc.create_session("u1", Some("older")).await.unwrap();
        let newer = svc.create_session("u1", Some("newer")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        svc.append_message(
            "u1",
            &older.id,
            NewMessage::from(&ChatMessage::text(MessageRole::User, "recent activity")),
        )
        .await
        .unwrap();

        c.initialize().await.unwrap();
        assert_eq!(c.active_session_id(), Some(older.id));
        assert_eq!(c.transcript()[0].first_text(), "recent activity");
        assert_eq!(c.sessions().len(), 2);
        assert_ne!(c.active_session_id(), Some(newer.id));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_offline_state() {
        let mut c = controller(ScriptedModel::default());
        c.backend().offline.store(true, Ordering::SeqCst);

        let err = c.initialize().await.unwrap_err();
        assert!(matches!(err, ControllerError::Backend(BackendError::Unavailable(_))));
        assert_eq!(c.state(), ControllerState::BackendUnavailable);
        assert!(matches!(
            c.send_message("Hello").await.unwrap_err(),
            ControllerError::NotReady
        ));
        assert!(matches!(
            c.new_session(None).await.unwrap_err(),
            ControllerError::NotReady
        ));
    }

    #[tokio::test]
    async fn test_send_persists_both_and_sends_full_transcript() {
        let model = ScriptedModel::replying(vec![Ok(GenerateContentResponse::from_text("Hi!"))]);
        let mut c = controller(model);
        c.initialize().await.unwrap();

        let reply = c.send_message("Hello").await.unwrap();
        assert_eq!(reply.role, MessageRole::Model);
        assert_eq!(reply.first_text(), "Hi!");
        assert_eq!(c.state(), ControllerState::Idle);

        let requests = c.model().requests();
        assert_eq!(requests.len(), 1);
        let roles: Vec<_> = requests[0].contents.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, vec!["model", "user"]);
        assert_eq!(requests[0].contents[1].parts[0].text, "Hello");

        let session = stored(&c, c.active_session_id().unwrap()).await;
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[1].first_text(), "Hello");
        assert_eq!(session.messages[2].first_text(), "Hi!");
        assert_eq!(c.transcript(), session.messages.as_slice());
    }

    #[tokio::test]
    async fn test_model_failure_becomes_persisted_warning() {
        let model = ScriptedModel::replying(vec![Err(LlmError::Http {
            status: 500,
            body: "internal".to_string(),
        })]);
        let mut c = controller(model);
        c.initialize().await.unwrap();
        let before = c.transcript().len();

        let reply = c.send_message("Hello").await.unwrap();
        assert_eq!(c.state(), ControllerState::Idle);
        assert_eq!(reply.role, MessageRole::Model);
        assert!(reply.first_text().starts_with(ERROR_MARKER));

        let transcript = c.transcript();
        assert_eq!(transcript.len(), before + 2);
        assert_eq!(transcript[before].role, MessageRole::User);
        assert_eq!(transcript[before].first_text(), "Hello");
        assert_eq!(transcript[before + 1], reply);

        let session = stored(&c, c.active_session_id().unwrap()).await;
        let tail = &session.messages[session.messages.len() - 2..];
        assert_eq!(tail[0].first_text(), "Hello");
        assert!(tail[1].first_text().contains("Error"));
        assert_eq!(tail[1].role, MessageRole::Model);
    }

    #[tokio::test]
    async fn test_empty_model_reply_is_marked() {
        let model = ScriptedModel::replying(vec![Ok(GenerateContentResponse::default())]);
        let mut c = controller(model);
        c.initialize().await.unwrap();

        let reply = c.send_message("Hello").await.unwrap();
        assert_eq!(reply.first_text(), EMPTY_REPLY_MESSAGE);
    }

    #[tokio::test]
    async fn test_model_reply_keeps_surrounding_whitespace() {
        let raw = "    indented code\n\n```\nfn main() {}\n```\n";
        let model = ScriptedModel::replying(vec![
            Ok(GenerateContentResponse::from_text(raw)),
            Ok(GenerateContentResponse::from_text(" \n\t ")),
        ]);
        let mut c = controller(model);
        c.initialize().await.unwrap();

        let reply = c.send_message("show me").await.unwrap();
        assert_eq!(reply.first_text(), raw);
        let session = stored(&c, c.active_session_id().unwrap()).await;
        assert_eq!(session.messages.last().unwrap().first_text(), raw);

        let blank = c.send_message("again").await.unwrap();
        assert_eq!(blank.first_text(), EMPTY_REPLY_MESSAGE);
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_message_visible() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        c.backend().fail_appends.store(true, Ordering::SeqCst);

        c.send_message("unsaved").await.unwrap();
        assert_eq!(c.transcript()[1].first_text(), "unsaved");
        assert_eq!(c.model().requests()[0].contents.len(), 2);

        let session = stored(&c, c.active_session_id().unwrap()).await;
        assert_eq!(session.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_and_busy_sends_are_rejected() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();

        assert!(matches!(
            c.send_message("   ").await.unwrap_err(),
            ControllerError::EmptyMessage
        ));

        c.state = ControllerState::Sending;
        assert!(matches!(
            c.send_message("Hello").await.unwrap_err(),
            ControllerError::Busy
        ));
        assert!(matches!(
            c.new_session(None).await.unwrap_err(),
            ControllerError::Busy
        ));
        assert!(c.model().requests().is_empty());
    }

    #[tokio::test]
    async fn test_switch_to_empty_session_shows_local_welcome() {
        let mut c = controller(ScriptedModel::default());
        let svc = c.backend().inner.service();
        let a = svc.create_session("u1", Some("A")).await.unwrap();
        svc.append_messages(
            "u1",
            &a.id,
            vec![
                NewMessage::from(&ChatMessage::text(MessageRole::User, "one")),
                NewMessage::from(&ChatMessage::text(MessageRole::Model, "two")),
                NewMessage::from(&ChatMessage::text(MessageRole::User, "three")),
            ],
        )
        .await
        .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let b = svc.create_session("u1", Some("B")).await.unwrap();

        c.initialize().await.unwrap();
        c.switch_session(a.id).await.unwrap();
        assert_eq!(c.transcript().len(), 3);
        let a_before = stored(&c, a.id).await;

        c.switch_session(b.id).await.unwrap();
        assert_eq!(c.active_session_id(), Some(b.id));
        assert_eq!(c.transcript().len(), 1);
        assert_eq!(c.transcript()[0].role, MessageRole::Model);
        assert_eq!(c.transcript()[0].first_text(), WELCOME_MESSAGE);

        // The welcome is local only, and A is untouched.
        assert!(stored(&c, b.id).await.messages.is_empty());
        assert_eq!(stored(&c, a.id).await.messages, a_before.messages);
    }

    #[tokio::test]
    async fn test_switch_to_active_session_is_noop() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        c.send_message("local").await.unwrap();
        let before = c.transcript().to_vec();

        c.backend().offline.store(true, Ordering::SeqCst);
        let active = c.active_session_id().unwrap();
        c.switch_session(active).await.unwrap();
        assert_eq!(c.transcript(), before.as_slice());
    }

    #[tokio::test]
    async fn test_deleting_only_session_creates_exactly_one() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        let original = c.active_session_id().unwrap();

        c.delete_session(original).await.unwrap();

        let listed = c.backend().inner.list_sessions("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_ne!(listed[0].id, original);
        assert_eq!(c.active_session_id(), Some(listed[0].id));
        assert_eq!(c.sessions().len(), 1);
        assert_eq!(listed[0].messages.len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_active_session_switches_to_next() {
        let mut c = controller(ScriptedModel::default());
        let svc = c.backend().inner.service();
        let keep = svc.create_session("u1", Some("keep")).await.unwrap();
        svc.append_message(
            "u1",
            &keep.id,
            NewMessage::from(&ChatMessage::text(MessageRole::User, "kept")),
        )
        .await
        .unwrap();

        c.initialize().await.unwrap();
        c.new_session(Some("doomed")).await.unwrap();
        let doomed = c.active_session_id().unwrap();
        assert_eq!(c.sessions().len(), 2);

        c.delete_session(doomed).await.unwrap();
        assert_eq!(c.active_session_id(), Some(keep.id));
        assert_eq!(c.transcript()[0].first_text(), "kept");
        assert_eq!(c.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_inactive_session_keeps_transcript() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        let first = c.active_session_id().unwrap();
        c.new_session(Some("second")).await.unwrap();
        let second = c.active_session_id().unwrap();
        let before = c.transcript().to_vec();

        c.delete_session(first).await.unwrap();
        assert_eq!(c.active_session_id(), Some(second));
        assert_eq!(c.transcript(), before.as_slice());
    }

    #[tokio::test]
    async fn test_delete_active_with_failed_relist_opens_remaining() {
        let mut c = controller(ScriptedModel::default());
        let svc = c.backend().inner.service();
        let keep = svc.create_session("u1", Some("keep")).await.unwrap();
        svc.append_message(
            "u1",
            &keep.id,
            NewMessage::from(&ChatMessage::text(MessageRole::User, "kept")),
        )
        .await
        .unwrap();

        c.initialize().await.unwrap();
        c.new_session(Some("doomed")).await.unwrap();
        let doomed = c.active_session_id().unwrap();
        c.backend().fail_lists.store(true, Ordering::SeqCst);

        c.delete_session(doomed).await.unwrap();
        assert_eq!(c.active_session_id(), Some(keep.id));
        assert!(c.sessions().iter().all(|s| s.id != doomed));
        assert_eq!(c.sessions().len(), 1);
        assert_eq!(c.transcript()[0].first_text(), "kept");
    }

    #[tokio::test]
    async fn test_delete_only_session_with_failed_relist_creates_replacement() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        let original = c.active_session_id().unwrap();
        c.backend().fail_lists.store(true, Ordering::SeqCst);

        c.delete_session(original).await.unwrap();
        let active = c.active_session_id().unwrap();
        assert_ne!(active, original);
        assert_eq!(c.sessions().len(), 1);
        assert_eq!(c.sessions()[0].id, active);
        assert_eq!(c.transcript()[0].first_text(), WELCOME_MESSAGE);

        c.send_message("still works").await.unwrap();
        assert_eq!(stored(&c, active).await.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_without_replacement_leaves_no_active_session() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        let original = c.active_session_id().unwrap();
        c.backend().fail_lists.store(true, Ordering::SeqCst);
        c.backend().fail_creates.store(true, Ordering::SeqCst);

        let err = c.delete_session(original).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Backend(BackendError::Rejected { status: 500, .. })
        ));
        assert_eq!(c.active_session_id(), None);
        assert!(c.sessions().is_empty());
        assert!(c.transcript().is_empty());
        assert!(matches!(
            c.send_message("into the void").await.unwrap_err(),
            ControllerError::NotReady
        ));
        assert!(c.model().requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_changes_nothing() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        let active = c.active_session_id().unwrap();
        let sessions_before = c.sessions().to_vec();
        let transcript_before = c.transcript().to_vec();
        c.backend().offline.store(true, Ordering::SeqCst);

        let err = c.delete_session(active).await.unwrap_err();
        assert!(matches!(err, ControllerError::Backend(BackendError::Unavailable(_))));
        assert_eq!(c.active_session_id(), Some(active));
        assert_eq!(c.sessions(), sessions_before.as_slice());
        assert_eq!(c.transcript(), transcript_before.as_slice());
    }

    #[tokio::test]
    async fn test_new_session_with_failed_relist_is_listed_first() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        let first = c.active_session_id().unwrap();
        c.backend().fail_lists.store(true, Ordering::SeqCst);

        c.new_session(Some("offline list")).await.unwrap();
        let active = c.active_session().unwrap();
        assert_eq!(active.session_name, "offline list");
        assert_eq!(c.sessions()[0].id, active.id);
        assert_eq!(c.sessions()[1].id, first);
        assert_eq!(stored(&c, active.id).await.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_create_keeps_current_session() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        let active = c.active_session_id().unwrap();
        let transcript_before = c.transcript().to_vec();
        c.backend().fail_creates.store(true, Ordering::SeqCst);

        assert!(c.new_session(Some("nope")).await.is_err());
        assert_eq!(c.active_session_id(), Some(active));
        assert_eq!(c.sessions().len(), 1);
        assert_eq!(c.transcript(), transcript_before.as_slice());
    }

    #[tokio::test]
    async fn test_new_session_is_seeded_and_listed_first() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        c.new_session(Some("Fresh")).await.unwrap();

        let active = c.active_session().unwrap();
        assert_eq!(active.session_name, "Fresh");
        assert_eq!(c.sessions()[0].id, active.id);
        assert_eq!(stored(&c, active.id).await.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_rename_updates_sidebar() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        let id = c.active_session_id().unwrap();

        c.rename_session(id, "Renamed").await.unwrap();
        assert_eq!(c.active_session().unwrap().session_name, "Renamed");
        assert_eq!(stored(&c, id).await.session_name, "Renamed");
    }

    #[tokio::test]
    async fn test_refresh_picks_up_external_sessions() {
        let mut c = controller(ScriptedModel::default());
        c.initialize().await.unwrap();
        let before = c.transcript().to_vec();

        c.backend()
            .inner
            .service()
            .create_session("u1", Some("from another device"))
            .await
            .unwrap();
        c.refresh_sessions().await.unwrap();

        assert_eq!(c.sessions().len(), 2);
        assert_eq!(c.transcript(), before.as_slice());
    }
}
