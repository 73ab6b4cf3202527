//! # docrule-core
//!
//! Heuristic document rule evaluation engine.
//!
//! Given the extracted text of a document and a list of natural-language
//! rules, this crate decides for each rule whether the document satisfies
//! it, quotes the sentence that supports the verdict, and reports a
//! confidence score.
//!
//! ## Key Guarantees
//!
//! 1. **No external calls**: evaluation is keyword overlap, nothing else
//! 2. **One verdict per rule**: output order matches input order, duplicates included
//! 3. **Bounded output**: status is pass or fail, confidence is within `0..=100`
//! 4. **Reproducible**: with a seeded [`JitterSource`] the output is fully deterministic
//!
//! ## Example
//!
//! ```rust
//! use docrule_core::{evaluate, Document, RuleSet, Status};
//!
//! let document = Document::new(
//!     "The contractor shall submit invoices monthly. Payment terms are net 30 days.",
//! )?;
//! let rules = RuleSet::new(["invoices must be submitted monthly"])?;
//!
//! let verdicts = evaluate(&rules, &document);
//! assert_eq!(verdicts[0].status, Status::Pass);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod rules;
pub mod types;

// Re-export main types at crate root
pub use analysis::{
    jitter_from_seed, keywordize, segment, FixedJitter, HeuristicAnalyzer, JitterSource,
    SeededJitter, ThreadJitter,
};
pub use rules::{RuleSet, RuleSetError};
pub use types::{clamp_confidence, Document, DocumentError, Status, VerdictRecord, MAX_CONFIDENCE};

/// Evaluate every rule heuristically with thread-local randomness.
pub fn evaluate(rules: &RuleSet, document: &Document) -> Vec<VerdictRecord> {
    HeuristicAnalyzer::new().analyze_all(rules, document)
}

/// Evaluate every rule heuristically with the given jitter source.
pub fn evaluate_with_jitter<J: JitterSource>(
    rules: &RuleSet,
    document: &Document,
    jitter: J,
) -> Vec<VerdictRecord> {
    HeuristicAnalyzer::with_jitter(jitter).analyze_all(rules, document)
}
