//! Sentence segmentation.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Characters that close a sentence. They stay on the sentence they close.
pub const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Split text into trimmed, non-empty sentence-like units.
///
/// Whitespace runs collapse to single spaces first, then the text is cut
/// right after every terminator. Text without terminators comes back as a
/// single segment; blank text comes back empty.
pub fn segment(text: &str) -> Vec<String> {
    let collapsed = WHITESPACE_RUN.replace_all(text, " ");
    let mut sentences = Vec::new();
    let mut start = 0;

    for (idx, ch) in collapsed.char_indices() {
        if SENTENCE_TERMINATORS.contains(&ch) {
            let end = idx + ch.len_utf8();
            push_trimmed(&mut sentences, &collapsed[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &collapsed[start..]);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}
