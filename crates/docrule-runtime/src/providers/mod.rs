//! Generative-model providers.
//!
//! The orchestrator only needs one capability from a model: turn a prompt
//! into raw text. [`LlmProvider`] captures that; the Gemini implementation
//! lives behind the `gemini` feature.
//!
//! ## Security
//!
//! Providers hold their API key as an [`ApiCredential`], which never shows
//! up in `Debug` or `Display` output.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::RuntimeConfig;

pub mod secrets;

#[cfg(feature = "gemini")]
mod gemini;

pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiProvider, GEMINI_DEFAULT_BASE_URL};

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Errors from LLM providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Model returned no text")]
    EmptyResponse,
}

/// Per-request generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    /// Model identifier
    pub model: String,

    /// Maximum tokens to generate
    pub max_output_tokens: u32,

    /// Sampling temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Transport timeout for one request
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        RuntimeConfig::default().completion_config()
    }
}

/// Raw model output plus bookkeeping.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text, unparsed
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Model that answered
    pub model: String,

    /// Why generation stopped
    pub finish_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A generative model the orchestrator can delegate rule checks to.
///
/// Implementations own their transport timeout; the orchestrator does not
/// impose one.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the model's raw text.
    async fn generate(
        &self,
        prompt: &str,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Build the provider configured by the environment, if any.
///
/// Returns `Ok(None)` when `GEMINI_API_KEY` is unset or blank, which
/// disables the LLM path entirely.
pub fn provider_from_env(
    config: &RuntimeConfig,
) -> Result<Option<Arc<dyn LlmProvider>>, ProviderError> {
    let Some(credential) = ApiCredential::from_env(GEMINI_API_KEY_ENV, "Gemini API key") else {
        tracing::info!("No {} set, LLM evaluation disabled", GEMINI_API_KEY_ENV);
        return Ok(None);
    };

    build_gemini(credential, config)
}

#[cfg(feature = "gemini")]
fn build_gemini(
    credential: ApiCredential,
    config: &RuntimeConfig,
) -> Result<Option<Arc<dyn LlmProvider>>, ProviderError> {
    let provider = GeminiProvider::with_credential(credential, config.request_timeout)?;
    tracing::info!(provider = "gemini", model = %config.model, "LLM evaluation enabled");
    Ok(Some(Arc::new(provider)))
}

#[cfg(not(feature = "gemini"))]
fn build_gemini(
    credential: ApiCredential,
    _config: &RuntimeConfig,
) -> Result<Option<Arc<dyn LlmProvider>>, ProviderError> {
    tracing::warn!(
        credential = %credential,
        "Gemini key present but the 'gemini' feature is disabled; using heuristics only"
    );
    Ok(None)
}
