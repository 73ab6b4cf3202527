//! Rendering of check results for the terminal.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Serialize;

use docrule_core::VerdictRecord;
use docrule_runtime::{EvaluationOutcome, EvaluationPath};

/// Output format for `docrule check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON, same shape as the HTTP response plus the path
    Json,
    /// One block per rule
    #[default]
    Table,
}

/// Everything `docrule check` reports about one document.
#[derive(Debug, Serialize)]
pub struct CheckReport<'a> {
    pub pages: Option<u32>,
    pub path: EvaluationPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<&'a str>,
    pub results: &'a [VerdictRecord],
}

impl<'a> CheckReport<'a> {
    pub fn new(pages: Option<u32>, outcome: &'a EvaluationOutcome) -> Self {
        Self {
            pages,
            path: outcome.path,
            fallback_reason: outcome.fallback_reason.as_deref(),
            results: &outcome.verdicts,
        }
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|v| v.is_pass()).count()
    }

    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Table => Ok(self.render_table()),
        }
    }

    fn render_table(&self) -> String {
        let mut out = String::new();

        for verdict in self.results {
            let label = if verdict.is_pass() { "PASS" } else { "FAIL" };
            let _ = writeln!(out, "[{}] {:>3}%  {}", label, verdict.confidence(), verdict.rule);
            let _ = writeln!(out, "      evidence:  {}", verdict.evidence);
            let _ = writeln!(out, "      reasoning: {}", verdict.reasoning);
        }

        let pages = self
            .pages
            .map(|n| format!(", {} page(s)", n))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "\n{} of {} rule(s) passed (path: {}{})",
            self.passed(),
            self.results.len(),
            self.path,
            pages
        );

        if let Some(reason) = self.fallback_reason {
            let _ = writeln!(out, "LLM evaluation failed: {}", reason);
        }

        out
    }
}
