//! LanguageModel trait definition.
//!
//! The one call the chat client makes to the external generative-language
//! endpoint: send the whole transcript, get candidates back.

use parley_types::error::LlmError;
use parley_types::llm::{GenerateContentRequest, GenerateContentResponse};

/// Trait for `generateContent`-style model backends.
///
/// Implementations live in parley-infra (`GeminiProvider`). Uses native async
/// fn in traits (RPITIT, Rust 2024 edition).
pub trait LanguageModel: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Send the transcript and receive the full response.
    fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> impl std::future::Future<Output = Result<GenerateContentResponse, LlmError>> + Send;
}
