//! Trigger scanning (sentence pre-classification).
//!
//! This module inspects a tagged sentence and produces a coarse signal that lets
//! the checker quickly decide which rules are worth matching: the set of
//! lowercased surface words it contains.
//!
//! A rule whose constraint sequence requires a literal word (see
//! `RuleMeta::required_words`) cannot fire on a sentence that lacks it, so the
//! checker drops it before running the matcher.
//!
//! ## Design notes
//!
//! - This is a *heuristic* scan. False positives are acceptable because the
//!   matcher still has to satisfy the full constraint sequence.
//! - Lemmas are not collected. Constraints that test lemmas (`INFLECTED`) never
//!   contribute required words.

use std::collections::HashSet;

/// Sentence characteristics used to gate rule activation.
#[derive(Debug, Clone, Default)]
pub struct TriggerInfo {
    pub words: HashSet<String>,
}

impl TriggerInfo {
    /// Collect the lowercased surface of every token.
    pub fn scan(sentence: &crate::TaggedSentence) -> Self {
        let words = sentence.tokens().iter().map(|t| t.surface().to_lowercase()).collect();
        TriggerInfo { words }
    }

    /// Whether every word in `required` occurs in the sentence.
    pub fn contains_all(&self, required: &[String]) -> bool {
        required.iter().all(|w| self.words.contains(w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaggedSentence;

    #[test]
    fn scan_lowercases_surfaces() {
        let s = TaggedSentence::parse("He Could of gone .").unwrap();
        let info = TriggerInfo::scan(&s);
        assert!(info.words.contains("could"));
        assert!(!info.words.contains("Could"));
        assert!(info.contains_all(&["could".into(), "of".into()]));
        assert!(!info.contains_all(&["could".into(), "have".into()]));
        assert!(info.contains_all(&[]));
    }
}
