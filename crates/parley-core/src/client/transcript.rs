//! The local transcript: what the user sees for the active session.
//!
//! Display source of truth. The remote store is advisory and may lag behind
//! (or miss) messages shown here.

use parley_types::history::ChatMessage;
use parley_types::llm::GenerateContentRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// A transcript holding only the welcome greeting.
    pub fn welcome() -> Self {
        Self {
            messages: vec![ChatMessage::welcome()],
        }
    }

    /// Transcript for a fetched session; an empty log shows the greeting.
    pub fn from_stored(messages: Vec<ChatMessage>) -> Self {
        if messages.is_empty() {
            Self::welcome()
        } else {
            Self { messages }
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The whole transcript in display order, as a model request.
    pub fn to_request(&self) -> GenerateContentRequest {
        GenerateContentRequest::from_transcript(&self.messages)
    }
}
