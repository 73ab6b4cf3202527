//! Rule list parsing and validation.
//!
//! Rules arrive in several shapes: a JSON array from an API client, a single
//! form field that may or may not hold a JSON array, or a YAML/JSON rule
//! file on disk. All of them funnel into [`RuleSet`], which trims every entry,
//! drops the blank ones and refuses to be empty.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when building a rule set.
#[derive(Error, Debug)]
pub enum RuleSetError {
    #[error("Please provide at least one rule.")]
    Empty,

    #[error("Failed to read rules file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Accepted rule file layouts: a bare list, or a `rules:` key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleFile {
    Bare(Vec<String>),
    Keyed { rules: Vec<String> },
}

impl RuleFile {
    fn into_rules(self) -> Vec<String> {
        match self {
            RuleFile::Bare(rules) | RuleFile::Keyed { rules } => rules,
        }
    }
}

/// A validated, non-empty, order-preserving list of rules.
///
/// Duplicates are kept: each occurrence gets its own verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<String>,
}

impl RuleSet {
    /// Build from any list of strings, trimming and dropping blanks.
    pub fn new<I, S>(rules: I) -> Result<Self, RuleSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules: Vec<String> = rules
            .into_iter()
            .map(|rule| rule.as_ref().trim().to_string())
            .filter(|rule| !rule.is_empty())
            .collect();

        if rules.is_empty() {
            return Err(RuleSetError::Empty);
        }

        Ok(Self { rules })
    }

    /// Normalize a raw form field.
    ///
    /// A string holding a JSON array is used as that array. Anything else,
    /// including JSON that is not an array and text that is not JSON at all,
    /// is taken as one rule.
    pub fn from_input(raw: &str) -> Result<Self, RuleSetError> {
        match serde_json::from_str::<JsonValue>(raw) {
            Ok(JsonValue::Array(items)) => Self::from_json_items(&items),
            _ => Self::new([raw]),
        }
    }

    fn from_json_items(items: &[JsonValue]) -> Result<Self, RuleSetError> {
        Self::new(items.iter().map(|item| item.as_str().unwrap_or("")))
    }

    /// Parse a rule file from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleSetError> {
        let file: RuleFile = serde_yaml::from_str(yaml)?;
        Self::new(file.into_rules())
    }

    /// Parse a rule file from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RuleSetError> {
        let file: RuleFile = serde_json::from_str(json)?;
        Self::new(file.into_rules())
    }

    /// Parse a YAML rule file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a JSON rule file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a rule file, picking the format from its extension.
    ///
    /// `.json` is read as JSON, everything else as YAML (a superset).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_yaml_file(path)
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.rules.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.rules
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
