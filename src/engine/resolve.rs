//! Match resolution.
//!
//! The matcher (`matcher.rs`) produces [`RawMatch`]es: token indices per
//! constraint. Resolution turns one into a user-facing [`RuleMatch`] by:
//!
//! - Applying the rule's position corrections to pick the reported span
//! - Rendering the message and out-of-message templates
//! - Extracting `<suggestion>` contents
//!
//! ```text
//! elements:  [[1] [2] [3]]     start_position_correction = 1
//!                 ^^^^^^^      end_position_correction   = 0
//! reported:  tokens 2..=3
//! ```
//!
//! Corrections are element indices, not token indices: an element matched by a
//! repeated constraint may cover several tokens, and an unmatched optional
//! element is stepped over towards the inside of the span.

use super::matcher::RawMatch;
use crate::api::RuleMatch;
use crate::error::CheckError;
use crate::rule::{Identifiable, PatternRule};
use crate::sentence::TaggedSentence;
use crate::suggestion::{MessageFormatter, extract_suggestions};

/// Reported token span (inclusive) for `raw` under the rule's corrections.
pub(crate) fn reported_span(rule: &PatternRule, raw: &RawMatch) -> Result<(usize, usize), CheckError> {
    let invalid = || CheckError::InvalidPositionCorrection {
        rule: rule.full_id(),
        start: rule.start_position_correction(),
        end: rule.end_position_correction(),
    };

    let count = raw.elements.len() as i64;
    let first = rule.start_position_correction() as i64;
    let last = count - 1 + rule.end_position_correction() as i64;
    if first < 0 || last >= count || first > last {
        return Err(invalid());
    }

    let window = &raw.elements[first as usize..=last as usize];
    let from = window.iter().find_map(|e| e.iter().min().copied());
    let to = window.iter().rev().find_map(|e| e.iter().max().copied());
    match (from, to) {
        (Some(from), Some(to)) if from <= to => Ok((from, to)),
        _ => Err(invalid()),
    }
}

/// Build the final [`RuleMatch`] for `raw`. Never mutates the rule.
pub(crate) fn resolve_match(
    rule: &PatternRule,
    sentence: &TaggedSentence,
    raw: &RawMatch,
) -> Result<RuleMatch, CheckError> {
    let (from_token, to_token) = reported_span(rule, raw)?;
    let full_id = rule.full_id();

    let formatter = MessageFormatter::new(
        &full_id,
        sentence,
        &raw.elements,
        rule.start_position_correction(),
        rule.end_position_correction(),
    );
    let message = match rule.message() {
        Some(template) => formatter.format(template, rule.suggestion_matches())?,
        None => String::new(),
    };
    let out_msg = match rule.suggestions_out_msg() {
        Some(template) => formatter.format(template, rule.suggestion_matches_out_msg())?,
        None => String::new(),
    };

    let mut suggestions: Vec<String> = Vec::new();
    for s in extract_suggestions(&message).into_iter().chain(extract_suggestions(&out_msg)) {
        if !suggestions.contains(&s) {
            suggestions.push(s);
        }
    }

    let tokens = sentence.tokens();
    let start = tokens[from_token].start();
    let end = tokens[to_token].end();

    tracing::debug!("[rule:match] id=\"{}\" span={}..{} chars={}..{}", full_id, from_token, to_token, start, end);

    Ok(RuleMatch {
        rule_id: rule.id().to_string(),
        sub_id: rule.sub_id().map(str::to_string),
        full_id,
        message,
        suggestions,
        from_token,
        to_token,
        start,
        end,
        text: sentence.covered_text(from_token, to_token),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::pattern_token::PatternToken;
    use crate::suggestion::{CaseConversion, Match};

    fn raw(elements: Vec<Vec<usize>>) -> RawMatch {
        let first = elements.iter().flatten().min().copied().unwrap();
        let last = elements.iter().flatten().max().copied().unwrap();
        RawMatch { elements, first, last }
    }

    fn rule(start: i32, end: i32) -> PatternRule {
        PatternRule::builder()
            .id("COULD_OF")
            .description("could of")
            .language(Language::new("en").unwrap())
            .tokens(vec![PatternToken::word("could"), PatternToken::word("of"), PatternToken::any()])
            .message(r"Did you mean <suggestion>\1 have</suggestion>?")
            .suggestions_out_msg(r"<suggestion>\1've</suggestion> <suggestion>\1 have</suggestion>")
            .suggestion_match_out_msg(Match::new(1).case_conversion(CaseConversion::AllLower))
            .start_position_correction(start)
            .end_position_correction(end)
            .build()
            .unwrap()
    }

    #[test]
    fn corrections_narrow_the_span() {
        let r = raw(vec![vec![1], vec![2], vec![3]]);
        assert_eq!(reported_span(&rule(0, 0), &r).unwrap(), (1, 3));
        assert_eq!(reported_span(&rule(1, 0), &r).unwrap(), (2, 3));
        assert_eq!(reported_span(&rule(0, -1), &r).unwrap(), (1, 2));
        assert!(matches!(reported_span(&rule(2, -1), &r), Err(CheckError::InvalidPositionCorrection { .. })));
        assert!(reported_span(&rule(-1, 0), &r).is_err());
        assert!(reported_span(&rule(0, 1), &r).is_err());
    }

    #[test]
    fn empty_optional_element_is_stepped_over() {
        let r = raw(vec![vec![1], vec![], vec![2]]);
        assert_eq!(reported_span(&rule(1, 0), &r).unwrap(), (2, 2));
        assert_eq!(reported_span(&rule(0, -1), &r).unwrap(), (1, 1));
        assert!(reported_span(&rule(1, -1), &r).is_err());
    }

    #[test]
    fn resolves_message_and_suggestions() {
        let s = TaggedSentence::parse("He Could of gone .").unwrap();
        let m = resolve_match(&rule(0, -1), &s, &raw(vec![vec![1], vec![2], vec![3]])).unwrap();

        assert_eq!(m.full_id, "COULD_OF");
        assert_eq!(m.message, "Did you mean <suggestion>Could have</suggestion>?");
        // The second out-of-message suggestion repeats the inline one.
        assert_eq!(m.suggestions, vec!["Could have", "could've"]);
        assert_eq!((m.from_token, m.to_token), (1, 2));
        assert_eq!((m.start, m.end), (3, 11));
        assert_eq!(m.text, "Could of");
    }
}
