//! Keyword-overlap rule analyzer.
//!
//! Works without any external service. Each rule is reduced to keywords,
//! each sentence of the document is scored by how many keywords it contains,
//! and the best sentence decides the verdict.
//!
//! ## Scoring
//!
//! | Quantity | Formula |
//! |----------|---------|
//! | sentence score | keywords (with repetition) found as case-insensitive substrings |
//! | pass threshold | `max(1, ceil(keywords * 0.3))` |
//! | pass confidence | `min(98, 65 + score * 5 + jitter(10))` |
//! | fail confidence | `max(8, 35 - jitter(15))` |

use crate::rules::RuleSet;
use crate::types::{Document, Status, VerdictRecord};

use super::jitter::{JitterSource, ThreadJitter};
use super::keywords::keywordize;
use super::segmenter::segment;

/// Evidence reported when no sentence clears the threshold.
pub const NO_EVIDENCE: &str = "No supporting evidence found.";

/// Reasoning reported when no sentence clears the threshold.
pub const NO_OVERLAP_REASONING: &str =
    "No meaningful overlap between the rule and document sentences.";

const PASS_RATIO: f64 = 0.3;

const PASS_BASE_CONFIDENCE: i64 = 65;
const PASS_CONFIDENCE_PER_MATCH: i64 = 5;
const PASS_JITTER: u32 = 10;
const PASS_CONFIDENCE_CEILING: i64 = 98;

const FAIL_BASE_CONFIDENCE: i64 = 35;
const FAIL_JITTER: u32 = 15;
const FAIL_CONFIDENCE_FLOOR: i64 = 8;

/// The best-scoring sentence for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceMatch {
    /// Index into the segmented sentences
    pub index: usize,

    /// Number of keyword hits
    pub score: usize,
}

/// Minimum score a sentence needs for a rule with `keyword_count` keywords.
pub fn pass_threshold(keyword_count: usize) -> usize {
    // Plain f64 arithmetic: 10 keywords need 3 hits, 11 need 4.
    let scaled = (keyword_count as f64 * PASS_RATIO).ceil() as usize;
    scaled.max(1)
}

/// Find the highest-scoring sentence.
///
/// `sentences` must already be lowercased. Ties keep the earliest sentence;
/// a score of zero never counts as a match.
pub fn best_match(sentences: &[String], keywords: &[String]) -> Option<SentenceMatch> {
    let mut best: Option<SentenceMatch> = None;

    for (index, sentence) in sentences.iter().enumerate() {
        let score = keywords
            .iter()
            .filter(|keyword| sentence.contains(keyword.as_str()))
            .count();

        let best_score = best.map_or(0, |m| m.score);
        if score > best_score {
            best = Some(SentenceMatch { index, score });
        }
    }

    best
}

/// Sentences of one document, segmented once and shared across rules.
#[derive(Debug, Clone)]
struct SegmentedText {
    sentences: Vec<String>,
    lowered: Vec<String>,
}

impl SegmentedText {
    fn new(text: &str) -> Self {
        let sentences = segment(text);
        let lowered = sentences.iter().map(|s| s.to_lowercase()).collect();
        Self { sentences, lowered }
    }
}

/// Heuristic analyzer with an injected jitter source.
///
/// Status, evidence and reasoning depend only on the inputs; confidence
/// also consumes exactly one jitter draw per analyzed rule.
pub struct HeuristicAnalyzer<J = ThreadJitter> {
    jitter: J,
}

impl HeuristicAnalyzer<ThreadJitter> {
    pub fn new() -> Self {
        Self {
            jitter: ThreadJitter,
        }
    }
}

impl Default for HeuristicAnalyzer<ThreadJitter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: JitterSource> HeuristicAnalyzer<J> {
    pub fn with_jitter(jitter: J) -> Self {
        Self { jitter }
    }

    /// Evaluate one rule against raw document text.
    pub fn analyze(&mut self, text: &str, rule: &str) -> VerdictRecord {
        let segmented = SegmentedText::new(text);
        self.analyze_segmented(&segmented, rule)
    }

    /// Evaluate every rule against a document, in rule order.
    pub fn analyze_all(&mut self, rules: &RuleSet, document: &Document) -> Vec<VerdictRecord> {
        let segmented = SegmentedText::new(document.text());
        tracing::debug!(
            rules = rules.len(),
            sentences = segmented.sentences.len(),
            "Running heuristic analysis"
        );

        rules
            .iter()
            .map(|rule| self.analyze_segmented(&segmented, rule))
            .collect()
    }

    fn analyze_segmented(&mut self, segmented: &SegmentedText, rule: &str) -> VerdictRecord {
        let keywords = keywordize(rule);
        let threshold = pass_threshold(keywords.len());

        match best_match(&segmented.lowered, &keywords) {
            Some(found) if found.score >= threshold => {
                let jitter = self.jitter.jitter(PASS_JITTER) as i64;
                let confidence = (PASS_BASE_CONFIDENCE
                    + found.score as i64 * PASS_CONFIDENCE_PER_MATCH
                    + jitter)
                    .min(PASS_CONFIDENCE_CEILING);

                VerdictRecord::new(
                    rule,
                    Status::Pass,
                    segmented.sentences[found.index].clone(),
                    format!("Found {} keyword matches for the rule.", found.score),
                    confidence,
                )
            }
            _ => {
                let jitter = self.jitter.jitter(FAIL_JITTER) as i64;
                let confidence = (FAIL_BASE_CONFIDENCE - jitter).max(FAIL_CONFIDENCE_FLOOR);

                VerdictRecord::new(
                    rule,
                    Status::Fail,
                    NO_EVIDENCE,
                    NO_OVERLAP_REASONING,
                    confidence,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::jitter::{FixedJitter, SeededJitter};
    use proptest::prelude::*;

    const CONTRACT: &str =
        "The contractor shall submit invoices monthly. Payment terms are net 30 days.";

    fn lowered(sentences: &[&str]) -> Vec<String> {
        sentences.iter().map(|s| s.to_lowercase()).collect()
    }

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_pass_threshold() {
        assert_eq!(pass_threshold(0), 1);
        assert_eq!(pass_threshold(1), 1);
        assert_eq!(pass_threshold(3), 1);
        assert_eq!(pass_threshold(4), 2);
        assert_eq!(pass_threshold(7), 3);
        assert_eq!(pass_threshold(10), 3);
        assert_eq!(pass_threshold(11), 4);
    }

    #[test]
    fn test_best_match_prefers_first_on_tie() {
        let sentences = lowered(&["Payment due.", "Payment late.", "Payment payment due."]);
        let found = best_match(&sentences, &keywords(&["payment"])).unwrap();
        assert_eq!(found, SentenceMatch { index: 0, score: 1 });
    }

    #[test]
    fn test_best_match_counts_repeated_keywords() {
        let sentences = lowered(&["Nothing here.", "Date of the date."]);
        let found = best_match(&sentences, &keywords(&["date", "date"])).unwrap();
        assert_eq!(found, SentenceMatch { index: 1, score: 2 });
    }

    #[test]
    fn test_best_match_none_without_overlap() {
        let sentences = lowered(&["Nothing here."]);
        assert_eq!(best_match(&sentences, &keywords(&["payment"])), None);
        assert_eq!(best_match(&sentences, &[]), None);
        assert_eq!(best_match(&[], &keywords(&["payment"])), None);
    }

    #[test]
    fn test_invoice_rule_passes_on_first_sentence() {
        let mut analyzer = HeuristicAnalyzer::with_jitter(FixedJitter(0));
        let verdict = analyzer.analyze(CONTRACT, "invoices must be submitted monthly");

        assert_eq!(verdict.status, Status::Pass);
        assert_eq!(verdict.evidence, "The contractor shall submit invoices monthly.");
        assert_eq!(verdict.reasoning, "Found 2 keyword matches for the rule.");
        assert_eq!(verdict.confidence(), 75);
        assert_eq!(verdict.rule, "invoices must be submitted monthly");
    }

    #[test]
    fn test_unrelated_document_fails() {
        let mut analyzer = HeuristicAnalyzer::with_jitter(FixedJitter(0));
        let verdict = analyzer.analyze(
            "Unrelated content about weather.",
            "document must mention payment schedule",
        );

        assert_eq!(verdict.status, Status::Fail);
        assert_eq!(verdict.evidence, NO_EVIDENCE);
        assert_eq!(verdict.reasoning, NO_OVERLAP_REASONING);
        assert_eq!(verdict.confidence(), 35);
    }

    #[test]
    fn test_rule_without_keywords_always_fails() {
        let mut analyzer = HeuristicAnalyzer::with_jitter(FixedJitter(0));
        let verdict = analyzer.analyze(CONTRACT, "ok");
        assert_eq!(verdict.status, Status::Fail);
        assert_eq!(verdict.evidence, NO_EVIDENCE);
    }

    #[test]
    fn test_score_below_threshold_fails() {
        // 7 keywords need 3 hits; the sentence only has 2.
        let mut analyzer = HeuristicAnalyzer::with_jitter(FixedJitter(0));
        let verdict = analyzer.analyze(
            "Invoices are submitted quarterly.",
            "invoices submitted before every single calendar month",
        );
        assert_eq!(verdict.status, Status::Fail);
    }

    #[test]
    fn test_pass_confidence_ceiling() {
        let mut analyzer = HeuristicAnalyzer::with_jitter(FixedJitter(9));
        let verdict = analyzer.analyze(
            "alpha bravo charlie delta echo foxtrot golf hotel.",
            "alpha bravo charlie delta echo foxtrot golf hotel",
        );
        assert_eq!(verdict.status, Status::Pass);
        assert_eq!(verdict.confidence(), 98);
    }

    #[test]
    fn test_fail_confidence_floor() {
        let mut analyzer = HeuristicAnalyzer::with_jitter(FixedJitter(14));
        let verdict = analyzer.analyze("Nothing.", "payment schedule");
        assert_eq!(verdict.confidence(), 21);

        // Floor only kicks in below 8, which 35 - 14 never reaches.
        assert!(verdict.confidence() >= 8);
    }

    #[test]
    fn test_analyze_all_preserves_order_and_duplicates() {
        let rules = RuleSet::new(["payment terms", "ok", "payment terms"]).unwrap();
        let document = Document::new(CONTRACT).unwrap();
        let mut analyzer = HeuristicAnalyzer::with_jitter(FixedJitter(0));

        let verdicts = analyzer.analyze_all(&rules, &document);
        let statuses: Vec<Status> = verdicts.iter().map(|v| v.status).collect();
        let names: Vec<&str> = verdicts.iter().map(|v| v.rule.as_str()).collect();

        assert_eq!(statuses, vec![Status::Pass, Status::Fail, Status::Pass]);
        assert_eq!(names, vec!["payment terms", "ok", "payment terms"]);
        assert_eq!(verdicts[0].evidence, "Payment terms are net 30 days.");
    }

    #[test]
    fn test_analyze_all_matches_per_rule_analysis() {
        let rules = RuleSet::new(["submit invoices", "weather report", "net days"]).unwrap();
        let document = Document::new(CONTRACT).unwrap();

        let batch = HeuristicAnalyzer::with_jitter(SeededJitter::new(11)).analyze_all(&rules, &document);

        let mut single = HeuristicAnalyzer::with_jitter(SeededJitter::new(11));
        let one_by_one: Vec<VerdictRecord> = rules
            .iter()
            .map(|rule| single.analyze(document.text(), rule))
            .collect();

        assert_eq!(batch, one_by_one);
    }

    proptest! {
        #[test]
        fn prop_confidence_within_documented_ranges(
            text in "[a-z .!?]{0,200}",
            rule in "[a-z ]{0,60}",
            seed in any::<u64>(),
        ) {
            let mut analyzer = HeuristicAnalyzer::with_jitter(SeededJitter::new(seed));
            let verdict = analyzer.analyze(&text, &rule);

            match verdict.status {
                Status::Pass => {
                    prop_assert!(verdict.confidence() >= 70);
                    prop_assert!(verdict.confidence() <= 98);
                }
                Status::Fail => {
                    prop_assert!(verdict.confidence() >= 21);
                    prop_assert!(verdict.confidence() <= 35);
                    prop_assert_eq!(verdict.evidence.as_str(), NO_EVIDENCE);
                }
            }
        }

        #[test]
        fn prop_deterministic_modulo_jitter(
            text in "[a-zA-Z .!?]{0,200}",
            rule in "[a-zA-Z ]{0,60}",
            seed_a in any::<u64>(),
            seed_b in any::<u64>(),
        ) {
            let first = HeuristicAnalyzer::with_jitter(SeededJitter::new(seed_a)).analyze(&text, &rule);
            let second = HeuristicAnalyzer::with_jitter(SeededJitter::new(seed_b)).analyze(&text, &rule);

            prop_assert_eq!(first.status, second.status);
            prop_assert_eq!(first.evidence, second.evidence);
            prop_assert_eq!(first.reasoning, second.reasoning);
        }

        #[test]
        fn prop_pass_evidence_is_a_sentence(
            text in "[a-z .!?]{1,200}",
            rule in "[a-z ]{0,60}",
        ) {
            let verdict = HeuristicAnalyzer::with_jitter(FixedJitter(0)).analyze(&text, &rule);
            if verdict.is_pass() {
                prop_assert!(segment(&text).contains(&verdict.evidence));
            }
        }
    }
}
