//! Rule keyword extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_KEYWORD_CHARS: Regex = Regex::new(r"[^a-z0-9\s]").unwrap();
}

/// Tokens shorter than this are ignored.
pub const MIN_KEYWORD_LEN: usize = 4;

/// Turn a rule into its keyword list.
///
/// The rule is lowercased, everything outside `[a-z0-9\s]` becomes a space,
/// and the result is split on single spaces. Only tokens of at least
/// [`MIN_KEYWORD_LEN`] characters survive. Order is kept and duplicates are
/// not removed: a repeated keyword scores once per occurrence.
pub fn keywordize(rule: &str) -> Vec<String> {
    let lowered = rule.to_lowercase();
    let cleaned = NON_KEYWORD_CHARS.replace_all(&lowered, " ");

    cleaned
        .split(' ')
        .filter(|token| token.chars().count() >= MIN_KEYWORD_LEN)
        .map(str::to_string)
        .collect()
}
