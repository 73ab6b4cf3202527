//! Runtime configuration.
//!
//! Read once at startup and handed to the orchestrator; nothing in the
//! evaluation path looks at the environment afterwards.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GEMINI_MODEL` | `gemini-1.0-pro-latest` |
//! | `MAX_CONTEXT_CHARS` | `12000` |
//! | `DOCRULE_LLM_TIMEOUT` | `30s` |
//! | `DOCRULE_JITTER_SEED` | unset |

use std::time::Duration;

use crate::providers::CompletionConfig;
use crate::RuntimeError;

pub const GEMINI_MODEL_ENV: &str = "GEMINI_MODEL";
pub const MAX_CONTEXT_CHARS_ENV: &str = "MAX_CONTEXT_CHARS";
pub const LLM_TIMEOUT_ENV: &str = "DOCRULE_LLM_TIMEOUT";
pub const JITTER_SEED_ENV: &str = "DOCRULE_JITTER_SEED";

pub const DEFAULT_MODEL: &str = "gemini-1.0-pro-latest";
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for LLM-assisted evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Model identifier passed to the provider
    pub model: String,

    /// Document characters embedded in a prompt; the rest is cut off
    pub max_context_chars: usize,

    /// Maximum tokens per model answer
    pub max_output_tokens: u32,

    /// Temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Transport timeout for a single model call
    pub request_timeout: Duration,

    /// Seed for heuristic confidence jitter; `None` uses the thread RNG
    pub jitter_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            max_output_tokens: 500,
            temperature: 0.0, // Deterministic
            request_timeout: DEFAULT_LLM_TIMEOUT,
            jitter_seed: None,
        }
    }
}

impl RuntimeConfig {
    /// Create a config for the given model with defaults elsewhere.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Load from process environment.
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    ///
    /// A missing, unparseable or zero `MAX_CONTEXT_CHARS` falls back to the
    /// default. A malformed timeout or seed is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(model) = var(GEMINI_MODEL_ENV) {
            config.model = model;
        }

        if let Some(raw) = var(MAX_CONTEXT_CHARS_ENV) {
            match raw.parse::<usize>() {
                Ok(chars) if chars > 0 => config.max_context_chars = chars,
                _ => tracing::warn!(
                    value = %raw,
                    default = DEFAULT_MAX_CONTEXT_CHARS,
                    "Ignoring invalid {}", MAX_CONTEXT_CHARS_ENV
                ),
            }
        }

        if let Some(raw) = var(LLM_TIMEOUT_ENV) {
            config.request_timeout = humantime::parse_duration(&raw).map_err(|e| {
                RuntimeError::InvalidConfig(format!("{}: {}", LLM_TIMEOUT_ENV, e))
            })?;
        }

        if let Some(raw) = var(JITTER_SEED_ENV) {
            let seed = raw.parse::<u64>().map_err(|e| {
                RuntimeError::InvalidConfig(format!("{}: {}", JITTER_SEED_ENV, e))
            })?;
            config.jitter_seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the jitter seed.
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    /// Set the prompt truncation bound.
    pub fn with_max_context_chars(mut self, chars: usize) -> Self {
        self.max_context_chars = chars;
        self
    }

    /// Check invariants the orchestrator relies on.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.model.trim().is_empty() {
            return Err(RuntimeError::InvalidConfig("model must not be empty".to_string()));
        }
        if self.max_context_chars == 0 {
            return Err(RuntimeError::InvalidConfig(
                "max_context_chars must be positive".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(RuntimeError::InvalidConfig(
                "request_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-request settings for the provider.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
            timeout: self.request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = RuntimeConfig::default();
        assert_eq!(config.model, "gemini-1.0-pro-latest");
        assert_eq!(config.max_context_chars, 12_000);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.jitter_seed, None);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("MAX_CONTEXT_CHARS", "5000"),
            ("DOCRULE_LLM_TIMEOUT", "2m 30s"),
            ("DOCRULE_JITTER_SEED", "99"),
        ]))
        .unwrap();

        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.max_context_chars, 5000);
        assert_eq!(config.request_timeout, Duration::from_secs(150));
        assert_eq!(config.jitter_seed, Some(99));
    }

    #[test]
    fn test_invalid_context_chars_falls_back() {
        for raw in ["abc", "0", "-5"] {
            let config =
                RuntimeConfig::from_lookup(lookup(&[("MAX_CONTEXT_CHARS", raw)])).unwrap();
            assert_eq!(config.max_context_chars, DEFAULT_MAX_CONTEXT_CHARS);
        }
    }

    #[test]
    fn test_invalid_timeout_is_error() {
        let result = RuntimeConfig::from_lookup(lookup(&[("DOCRULE_LLM_TIMEOUT", "soon")]));
        assert!(matches!(result, Err(RuntimeError::InvalidConfig(msg)) if msg.contains("DOCRULE_LLM_TIMEOUT")));
    }

    #[test]
    fn test_invalid_seed_is_error() {
        let result = RuntimeConfig::from_lookup(lookup(&[("DOCRULE_JITTER_SEED", "x")]));
        assert!(matches!(result, Err(RuntimeError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = RuntimeConfig::from_lookup(lookup(&[("DOCRULE_LLM_TIMEOUT", "0s")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_completion_config_mirrors_runtime() {
        let config = RuntimeConfig::new("gemini-pro");
        let completion = config.completion_config();
        assert_eq!(completion.model, "gemini-pro");
        assert_eq!(completion.timeout, DEFAULT_LLM_TIMEOUT);
    }
}
