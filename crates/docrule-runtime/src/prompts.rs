//! Prompt construction for per-rule LLM evaluation.
//!
//! One prompt per rule. The document is embedded verbatim up to the
//! context limit; the model is asked for a single JSON object whose
//! fields mirror [`docrule_core::VerdictRecord`].

/// Opening instruction, before the document text.
pub const ANALYST_PREAMBLE: &str =
    "You are an AI compliance analyst. Analyze the provided document text and evaluate the rule.";

/// Closing instruction describing the expected answer.
pub const RESPONSE_FORMAT_INSTRUCTIONS: &str = "Respond strictly as a JSON object with fields:\n\
rule (string), status (\"pass\" or \"fail\"), evidence (short quote), reasoning (short sentence), confidence (0-100 integer).";

/// First `max_chars` characters of `text`.
///
/// Counts `char`s, not bytes, so the cut never splits a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Build the evaluation prompt for one rule.
///
/// Deterministic: the same inputs always give the same prompt.
pub fn build_prompt(rule: &str, text: &str, max_context_chars: usize) -> String {
    let document_text = truncate_chars(text, max_context_chars);

    format!(
        "{ANALYST_PREAMBLE}\nDocument text:\n\"\"\"\n{document_text}\n\"\"\"\n\nRule: \"{rule}\"\n\n{RESPONSE_FORMAT_INSTRUCTIONS}"
    )
}
