//! GeminiProvider -- [`LanguageModel`] over the `generateContent` REST API.
//!
//! POSTs the transcript to `{base}/v1beta/models/{model}:generateContent`.
//! The API key travels as the `key` query parameter, is held in a
//! [`SecretString`] and never appears in logs.

use std::time::Duration;

use parley_core::llm::provider::LanguageModel;
use parley_types::error::LlmError;
use parley_types::llm::{GenerateContentRequest, GenerateContentResponse};
use secrecy::{ExposeSecret, SecretString};
use tracing::{Instrument, warn};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// No `Debug` derive: keeps the key out of debug output entirely.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Read the key from `GEMINI_API_KEY`.
    pub fn api_key_from_env() -> Result<SecretString, LlmError> {
        api_key_from(std::env::var(API_KEY_ENV).ok())
    }

    /// Like [`api_key_from_env`](Self::api_key_from_env), but a missing key
    /// yields an empty one. Model calls then fail and show up in the chat.
    pub fn api_key_from_env_or_empty() -> SecretString {
        or_empty_key(Self::api_key_from_env())
    }

    async fn call(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.expose_secret())])
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "generateContent failed");
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                code => LlmError::Http { status: code, body },
            });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {}", e.without_url()))
        })?;
        tracing::debug!(candidates = parsed.candidates.len(), "generateContent ok");
        Ok(parsed)
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl LanguageModel for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let span = tracing::info_span!(
            "chat",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = "gemini",
            gen_ai.request.model = %self.model,
            turns = request.contents.len(),
        );

        self.call(request).instrument(span).await
    }
}

fn api_key_from(value: Option<String>) -> Result<SecretString, LlmError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(SecretString::from(key)),
        _ => Err(LlmError::Provider {
            message: format!("{API_KEY_ENV} is not set"),
        }),
    }
}

fn or_empty_key(key: Result<SecretString, LlmError>) -> SecretString {
    key.unwrap_or_else(|e| {
        warn!(error = %e, "no model API key; replies will show the provider error");
        SecretString::from(String::new())
    })
}
