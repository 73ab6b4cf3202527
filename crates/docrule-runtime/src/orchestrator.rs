//! Runtime orchestrator for batch rule evaluation.
//!
//! The orchestrator decides, per batch, which path produces the verdicts:
//! - No provider: heuristic analysis for every rule
//! - Provider: one LLM call per rule, all polled concurrently
//! - Any LLM failure: the whole batch is redone heuristically
//!
//! Failures on the LLM path are logged and never reach the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use thiserror::Error;

use docrule_core::{evaluate_with_jitter, jitter_from_seed, Document, RuleSet, VerdictRecord};

use crate::config::RuntimeConfig;
use crate::parser::{extract_verdict, ParseError};
use crate::prompts::build_prompt;
use crate::providers::{provider_from_env, CompletionConfig, LlmProvider, ProviderError};
use crate::RuntimeError;

/// Why a single LLM evaluation did not produce a verdict.
#[derive(Error, Debug)]
pub enum LlmEvaluationError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Which path produced a batch of verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationPath {
    /// No provider configured
    Heuristic,
    /// Every rule answered by the model
    Llm,
    /// LLM path attempted, batch redone heuristically
    Fallback,
}

impl std::fmt::Display for EvaluationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationPath::Heuristic => write!(f, "heuristic"),
            EvaluationPath::Llm => write!(f, "llm"),
            EvaluationPath::Fallback => write!(f, "fallback"),
        }
    }
}

/// Verdicts plus how they were obtained.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    /// One verdict per rule, in rule order
    pub verdicts: Vec<VerdictRecord>,

    /// Path that produced `verdicts`
    pub path: EvaluationPath,

    /// First LLM error, when `path` is `Fallback`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,

    /// When the batch finished
    pub evaluated_at: DateTime<Utc>,
}

/// Evaluates rule batches, preferring the LLM when one is configured.
///
/// # Architecture
/// - Fan-out: one prompt per rule, joined with `try_join_all`
/// - All-or-nothing: the first failure abandons the LLM batch
/// - Fallback: heuristic analysis with a fresh jitter source per batch
pub struct RuntimeOrchestrator {
    /// LLM provider; `None` disables the LLM path
    provider: Option<Arc<dyn LlmProvider>>,

    /// Configuration
    config: RuntimeConfig,

    /// Per-request settings derived from `config`
    completion: CompletionConfig,
}

impl RuntimeOrchestrator {
    /// Create an orchestrator.
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, config: RuntimeConfig) -> Self {
        let completion = config.completion_config();
        Self {
            provider,
            config,
            completion,
        }
    }

    /// Heuristic-only orchestrator.
    pub fn heuristic(config: RuntimeConfig) -> Self {
        Self::new(None, config)
    }

    /// Configuration and provider from the process environment.
    pub fn from_env() -> Result<Self, RuntimeError> {
        let config = RuntimeConfig::from_env()?;
        let provider = provider_from_env(&config)?;
        Ok(Self::new(provider, config))
    }

    /// Whether verdicts may come from the model.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// One verdict per rule, in rule order.
    pub async fn evaluate(&self, rules: &RuleSet, document: &Document) -> Vec<VerdictRecord> {
        self.evaluate_detailed(rules, document).await.verdicts
    }

    /// Like [`RuntimeOrchestrator::evaluate`], also reporting the path taken.
    ///
    /// # Execution Flow
    /// 1. Without a provider, analyze heuristically and return
    /// 2. Fan-out: build and send one prompt per rule
    /// 3. Fan-in: parse every answer, preserving rule order
    /// 4. On the first failure, discard everything and analyze heuristically
    pub async fn evaluate_detailed(&self, rules: &RuleSet, document: &Document) -> EvaluationOutcome {
        let Some(provider) = &self.provider else {
            return self.finish(self.heuristic_verdicts(rules, document), EvaluationPath::Heuristic, None);
        };

        let calls = rules
            .iter()
            .map(|rule| self.evaluate_rule(provider.as_ref(), rule, document.text()));

        match try_join_all(calls).await {
            Ok(verdicts) => self.finish(verdicts, EvaluationPath::Llm, None),
            Err(e) => {
                tracing::warn!(
                    provider = provider.name(),
                    rules = rules.len(),
                    error = %e,
                    "LLM evaluation failed, falling back to heuristic"
                );
                let verdicts = self.heuristic_verdicts(rules, document);
                self.finish(verdicts, EvaluationPath::Fallback, Some(e.to_string()))
            }
        }
    }

    /// Ask the model about a single rule.
    async fn evaluate_rule(
        &self,
        provider: &dyn LlmProvider,
        rule: &str,
        text: &str,
    ) -> Result<VerdictRecord, LlmEvaluationError> {
        let prompt = build_prompt(rule, text, self.config.max_context_chars);
        let response = provider.generate(&prompt, &self.completion).await?;
        Ok(extract_verdict(&response.content, rule)?)
    }

    fn heuristic_verdicts(&self, rules: &RuleSet, document: &Document) -> Vec<VerdictRecord> {
        evaluate_with_jitter(rules, document, jitter_from_seed(self.config.jitter_seed))
    }

    fn finish(
        &self,
        verdicts: Vec<VerdictRecord>,
        path: EvaluationPath,
        fallback_reason: Option<String>,
    ) -> EvaluationOutcome {
        let passed = verdicts.iter().filter(|v| v.is_pass()).count();
        tracing::info!(
            path = %path,
            rules = verdicts.len(),
            passed,
            "Rule evaluation complete"
        );

        EvaluationOutcome {
            verdicts,
            path,
            fallback_reason,
            evaluated_at: Utc::now(),
        }
    }
}

/// Builder for RuntimeOrchestrator.
pub struct RuntimeOrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: RuntimeConfig,
}

impl RuntimeOrchestratorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            provider: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the LLM provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set or clear the LLM provider.
    pub fn maybe_provider(mut self, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        self.provider = provider;
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<RuntimeOrchestrator, RuntimeError> {
        self.config.validate()?;
        Ok(RuntimeOrchestrator::new(self.provider, self.config))
    }
}

impl Default for RuntimeOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
