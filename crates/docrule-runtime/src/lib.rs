//! # docrule-runtime
//!
//! Optional LLM-assisted rule evaluation for docrule.
//!
//! When a generative model is configured, each rule is sent to it with the
//! document text and the JSON answer becomes the verdict. When no model is
//! configured, or when any call in a batch fails, the heuristic analyzer
//! from `docrule-core` produces every verdict instead.
//!
//! ## Important
//!
//! A batch is never mixed: verdicts all come from the model or all come
//! from the heuristic. Callers never see an LLM error.
//!
//! ## Example
//!
//! ```rust,ignore
//! use docrule_core::{Document, RuleSet};
//! use docrule_runtime::RuntimeOrchestrator;
//!
//! let orchestrator = RuntimeOrchestrator::from_env()?;
//!
//! let document = Document::new("Signed by CEO. Dated 2024-01-01.")?;
//! let rules = RuleSet::new(["Must be signed", "Must be dated"])?;
//! let verdicts = orchestrator.evaluate(&rules, &document).await;
//! ```

use thiserror::Error;

pub mod config;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod providers;

pub use config::RuntimeConfig;
pub use orchestrator::{
    EvaluationOutcome, EvaluationPath, LlmEvaluationError, RuntimeOrchestrator,
    RuntimeOrchestratorBuilder,
};
pub use parser::{extract_verdict, ParseError, DEFAULT_EVIDENCE, DEFAULT_REASONING};
pub use prompts::build_prompt;
pub use providers::{
    provider_from_env, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    TokenUsage,
};

#[cfg(feature = "gemini")]
pub use providers::GeminiProvider;

/// Errors from building the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}
