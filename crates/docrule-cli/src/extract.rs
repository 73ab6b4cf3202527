//! Document text extraction.
//!
//! PDFs go through Poppler's `pdftotext` (text) and `pdfinfo` (page count).
//! Anything without a `%PDF-` header is read as UTF-8 text, which keeps the
//! CLI usable on plain text files and in environments without Poppler.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Required tool not found on PATH: {0}")]
    ToolMissing(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: &'static str, message: String },
}

/// Extracted document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    /// Page count, when the source format has pages and it could be read
    pub pages: Option<u32>,
}

/// Turns uploaded bytes into text.
///
/// Extraction is blocking; async callers should run it on a blocking thread.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractError>;
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Poppler-backed extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Whether `pdftotext` is installed.
    pub fn available() -> bool {
        which::which("pdftotext").is_ok()
    }

    fn extract_pdf(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
        if !Self::available() {
            return Err(ExtractError::ToolMissing("pdftotext"));
        }

        let mut file = tempfile::Builder::new()
            .prefix("docrule-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let out = Command::new("pdftotext")
            .arg("-q")
            .arg("-enc")
            .arg("UTF-8")
            .arg(file.path())
            .arg("-") // write to stdout
            .output()?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(ExtractError::ToolFailed {
                tool: "pdftotext",
                message: if stderr.is_empty() {
                    format!("exit status {}", out.status)
                } else {
                    stderr
                },
            });
        }

        let text = String::from_utf8_lossy(&out.stdout).into_owned();
        let pages = page_count(file.path());
        tracing::debug!(bytes = bytes.len(), chars = text.len(), pages = ?pages, "Extracted PDF text");

        Ok(ExtractedText { text, pages })
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
        if is_pdf(bytes) {
            self.extract_pdf(bytes)
        } else {
            Ok(ExtractedText {
                text: String::from_utf8_lossy(bytes).into_owned(),
                pages: None,
            })
        }
    }
}

/// Page count from `pdfinfo`; `None` when the tool is missing or silent.
fn page_count(path: &Path) -> Option<u32> {
    which::which("pdfinfo").ok()?;

    let out = Command::new("pdfinfo").arg(path).output().ok()?;
    if !out.status.success() {
        return None;
    }
    parse_pdfinfo_pages(&String::from_utf8_lossy(&out.stdout))
}

fn parse_pdfinfo_pages(info: &str) -> Option<u32> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(!is_pdf(b"plain text"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn test_plain_text_passthrough() {
        let extracted = PdftotextExtractor::new()
            .extract("Signed by CEO. Dated 2024-01-01.".as_bytes())
            .unwrap();
        assert_eq!(extracted.text, "Signed by CEO. Dated 2024-01-01.");
        assert_eq!(extracted.pages, None);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let extracted = PdftotextExtractor::new().extract(&[b'o', b'k', 0xFF]).unwrap();
        assert!(extracted.text.starts_with("ok"));
    }

    #[test]
    fn test_parse_pdfinfo_pages() {
        let info = "Title:          Contract\nProducer:       LibreOffice\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_pdfinfo_pages(info), Some(12));
        assert_eq!(parse_pdfinfo_pages("Title: x\n"), None);
        assert_eq!(parse_pdfinfo_pages("Pages: many\n"), None);
    }

    #[test]
    fn test_errors_render() {
        assert_eq!(
            ExtractError::ToolMissing("pdftotext").to_string(),
            "Required tool not found on PATH: pdftotext"
        );
        let failed = ExtractError::ToolFailed {
            tool: "pdftotext",
            message: "Syntax Error".to_string(),
        };
        assert_eq!(failed.to_string(), "pdftotext failed: Syntax Error");
    }
}
