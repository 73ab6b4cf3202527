//! Heuristic analysis: segmentation, keywords, scoring.
//!
//! Everything here is synchronous and free of I/O. The only source of
//! variation is the injected [`JitterSource`].

mod heuristic;
mod jitter;
mod keywords;
mod segmenter;

pub use heuristic::{
    best_match, pass_threshold, HeuristicAnalyzer, SentenceMatch, NO_EVIDENCE,
    NO_OVERLAP_REASONING,
};
pub use jitter::{jitter_from_seed, FixedJitter, JitterSource, SeededJitter, ThreadJitter};
pub use keywords::{keywordize, MIN_KEYWORD_LEN};
pub use segmenter::{segment, SENTENCE_TERMINATORS};
