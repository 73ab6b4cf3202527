//! Core data model: documents, verdict status and verdict records.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when building a [`Document`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Document text is empty")]
    Empty,
}

/// Extracted plain text of an uploaded document.
///
/// Construction rejects whitespace-only text, so every `Document` handed to
/// the engine has something to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    pages: Option<u32>,
}

impl Document {
    /// Wrap extracted text. Fails with [`DocumentError::Empty`] if the text
    /// is empty after trimming.
    pub fn new(text: impl Into<String>) -> Result<Self, DocumentError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DocumentError::Empty);
        }
        Ok(Self { text, pages: None })
    }

    /// Attach the page count reported by the extractor.
    pub fn with_pages(mut self, pages: Option<u32>) -> Self {
        self.pages = pages;
        self
    }

    /// The full, untruncated text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Page count, if the extractor knew it.
    pub fn pages(&self) -> Option<u32> {
        self.pages
    }
}

/// Outcome of a single rule check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn is_pass(&self) -> bool {
        matches!(self, Status::Pass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound of the confidence scale.
pub const MAX_CONFIDENCE: u8 = 100;

/// Clamp an arbitrary score into `0..=100`.
pub fn clamp_confidence(raw: i64) -> u8 {
    raw.clamp(0, MAX_CONFIDENCE as i64) as u8
}

/// The verdict for one rule.
///
/// `confidence` is private so the `0..=100` range holds for every record,
/// including deserialized ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRecord {
    /// The rule exactly as the caller supplied it (after trimming)
    pub rule: String,

    /// Pass or fail
    pub status: Status,

    /// Supporting quote, or a fixed placeholder when there is none
    pub evidence: String,

    /// Short explanation of the verdict
    pub reasoning: String,

    #[serde(deserialize_with = "deserialize_confidence")]
    confidence: u8,
}

impl VerdictRecord {
    /// Build a record, clamping `confidence` into `0..=100`.
    pub fn new(
        rule: impl Into<String>,
        status: Status,
        evidence: impl Into<String>,
        reasoning: impl Into<String>,
        confidence: i64,
    ) -> Self {
        Self {
            rule: rule.into(),
            status,
            evidence: evidence.into(),
            reasoning: reasoning.into(),
            confidence: clamp_confidence(confidence),
        }
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn is_pass(&self) -> bool {
        self.status.is_pass()
    }
}

fn deserialize_confidence<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(clamp_confidence(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_rejects_blank_text() {
        assert_eq!(Document::new(""), Err(DocumentError::Empty));
        assert_eq!(Document::new(" \n\t "), Err(DocumentError::Empty));
    }

    #[test]
    fn test_document_keeps_text_untouched() {
        let doc = Document::new("  Hello.  ").unwrap().with_pages(Some(3));
        assert_eq!(doc.text(), "  Hello.  ");
        assert_eq!(doc.pages(), Some(3));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let high = VerdictRecord::new("r", Status::Pass, "e", "why", 150);
        assert_eq!(high.confidence(), 100);

        let low = VerdictRecord::new("r", Status::Fail, "e", "why", -4);
        assert_eq!(low.confidence(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let record = VerdictRecord::new("must be signed", Status::Pass, "Signed.", "ok", 80);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["rule"], "must be signed");
        assert_eq!(json["status"], "pass");
        assert_eq!(json["evidence"], "Signed.");
        assert_eq!(json["reasoning"], "ok");
        assert_eq!(json["confidence"], 80);
    }

    #[test]
    fn test_deserialize_clamps_confidence() {
        let record: VerdictRecord = serde_json::from_str(
            r#"{"rule":"r","status":"fail","evidence":"e","reasoning":"x","confidence":900}"#,
        )
        .unwrap();
        assert_eq!(record.confidence(), 100);
        assert_eq!(record.status, Status::Fail);
    }
}
