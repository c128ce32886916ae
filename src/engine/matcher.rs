//! Constraint-sequence evaluator.
//!
//! Given one rule and one sentence, find every place where the rule's
//! constraints are satisfied in order. The output is a list of [`RawMatch`]es:
//! for each constraint, the token indices it consumed.
//!
//! ## Strategies
//!
//! The strategy is chosen once per rule in `compiled_rules.rs` from the rule's
//! classification and shape:
//!
//! ```text
//! Linear              fixed width, no groups/unification: window compare
//! Backtracking        optional / repeated / skipping constraints, AND-groups,
//!                     unification: depth-first search with backtracking
//! WholeSentenceRegex  regex over the rendered sentence text
//! ```
//!
//! ## Search order
//!
//! For each start token (only token 0 for sentence-start rules), the first
//! successful alternative wins. Alternatives are explored greedily: a
//! constraint is matched before it is skipped as optional, longer repetitions
//! before shorter ones, smaller skips before larger ones. After a match, the
//! scan resumes after its last token, so matches of one rule never overlap.
//!
//! ```text
//! constraints:  [could|would] [of] (skip 0)
//! tokens:        He  could  of  gone
//!                     ^start=1 -> [1] [2]  => RawMatch { elements: [[1], [2]] }
//! ```
//!
//! ## Immunized tokens
//!
//! Tokens covered by an anti-pattern match can be neither matched nor skipped
//! over. A start position that only matches through immunized tokens counts as
//! suppressed and the scan moves on by one token, so the rule may still match
//! later in the sentence.
//!
//! ## Cost
//!
//! Without unification, whether constraints `ci..` can complete depends only
//! on `(ci, pos, max_gap, vetoer)`, so failed states are remembered per start
//! token. Unification is decided on the full path and cannot share failures;
//! every search is capped at [`SEARCH_BUDGET`] steps per start token.

use super::compiled_rules::Strategy;
use crate::error::CheckError;
use crate::pattern_token::PatternToken;
use crate::rule::{Identifiable, PatternRule, RuleBody};
use crate::sentence::TaggedSentence;
use crate::unify::{Unifier, UnifierConfig};
use regex::Regex;
use std::collections::HashSet;

/// Search steps allowed per start token before a rule is abandoned.
pub(crate) const SEARCH_BUDGET: usize = 100_000;

/// Structural match of one rule, before filters and rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawMatch {
    /// Token indices consumed by each constraint (or by each regex group).
    pub elements: Vec<Vec<usize>>,
    /// First token of the raw span.
    pub first: usize,
    /// Last token of the raw span (inclusive).
    pub last: usize,
}

impl RawMatch {
    fn from_elements(elements: Vec<Vec<usize>>) -> Option<Self> {
        let first = elements.iter().flatten().min().copied()?;
        let last = elements.iter().flatten().max().copied()?;
        Some(RawMatch { elements, first, last })
    }

    /// Whether this match shares a token with `immunized`.
    pub(crate) fn touches(&self, immunized: &[bool]) -> bool {
        (self.first..=self.last).any(|i| immunized.get(i).copied().unwrap_or(false))
    }
}

/// Matches of one rule in one sentence.
#[derive(Debug, Default)]
pub(crate) struct Found {
    pub matches: Vec<RawMatch>,
    /// Candidates rejected because they touch immunized tokens.
    pub suppressed: usize,
}

/// Find all matches of `rule` in `sentence` that avoid `immunized` tokens.
pub(crate) fn find_matches(
    rule: &PatternRule,
    strategy: Strategy,
    sentence: &TaggedSentence,
    unifier: &UnifierConfig,
    immunized: Option<&[bool]>,
) -> Result<Found, CheckError> {
    let immunized = immunized.filter(|flags| flags.contains(&true));
    let mut found = Found::default();

    let tokens = match rule.body() {
        RuleBody::WholeSentenceRegex(re) => {
            for m in regex_matches(re, sentence) {
                if immunized.is_some_and(|flags| m.touches(flags)) {
                    tracing::debug!("[rule:suppressed] id=\"{}\" span={}..={}", rule.full_id(), m.first, m.last);
                    found.suppressed += 1;
                } else {
                    found.matches.push(m);
                }
            }
            return Ok(found);
        }
        RuleBody::Tokens(tokens) if tokens.is_empty() || sentence.is_empty() => return Ok(found),
        RuleBody::Tokens(tokens) => tokens,
    };

    let search = Search {
        tokens,
        sentence,
        grouped: rule.has_group_constraint(),
        unifier: rule.needs_unification().then_some(unifier),
        immunized,
    };
    // Same rule with immunization lifted, only consulted to count suppressed starts.
    let free = immunized.map(|_| Search { immunized: None, ..search });
    let exhausted = |_: Exhausted| CheckError::SearchLimit { rule: rule.full_id(), limit: SEARCH_BUDGET };
    let last_start = if rule.is_sentence_start() { 1 } else { sentence.len() };

    let mut start = 0;
    while start < last_start {
        match search.at(start, strategy).map_err(exhausted)? {
            Some(m) => {
                tracing::trace!("[match:raw] rule=\"{}\" span={}..={}", rule.full_id(), m.first, m.last);
                start = m.last + 1;
                found.matches.push(m);
            }
            None => {
                if let Some(free) = &free {
                    if let Some(m) = free.at(start, strategy).map_err(exhausted)? {
                        tracing::debug!("[rule:suppressed] id=\"{}\" span={}..={}", rule.full_id(), m.first, m.last);
                        found.suppressed += 1;
                    }
                }
                start += 1;
            }
        }
    }
    Ok(found)
}

/// Mark every token covered by any anti-pattern match.
pub(crate) fn immunized_tokens(
    anti_patterns: &[PatternRule],
    sentence: &TaggedSentence,
    unifier: &UnifierConfig,
) -> Result<Vec<bool>, CheckError> {
    let mut immunized = vec![false; sentence.len()];
    for anti in anti_patterns {
        let strategy = Strategy::for_rule(anti);
        for m in find_matches(anti, strategy, sentence, unifier, None)?.matches {
            for flag in &mut immunized[m.first..=m.last] {
                *flag = true;
            }
        }
    }
    Ok(immunized)
}

/// The step budget ran out.
#[derive(Debug)]
struct Exhausted;

/// `(ci, pos, max_gap, vetoer)`
type State = (usize, usize, Option<usize>, Option<usize>);

/// Per-start bookkeeping for [`Search::step`].
struct Walk {
    failed: HashSet<State>,
    memoize: bool,
    steps: usize,
}

struct Search<'a> {
    tokens: &'a [PatternToken],
    sentence: &'a TaggedSentence,
    grouped: bool,
    /// Present only for rules that need unification.
    unifier: Option<&'a UnifierConfig>,
    immunized: Option<&'a [bool]>,
}

impl<'a> Search<'a> {
    fn at(&self, start: usize, strategy: Strategy) -> Result<Option<RawMatch>, Exhausted> {
        match strategy {
            Strategy::Linear => Ok(self.linear_at(start)),
            _ => self.backtrack_at(start),
        }
    }

    fn is_immunized(&self, idx: usize) -> bool {
        self.immunized.is_some_and(|flags| flags.get(idx).copied().unwrap_or(false))
    }

    fn matches_at(&self, constraint: &PatternToken, idx: usize) -> bool {
        let Some(token) = self.sentence.tokens().get(idx) else {
            return false;
        };
        if self.is_immunized(idx) {
            return false;
        }
        let structural = if self.grouped { constraint.is_match_with_group(token) } else { constraint.is_match(token) };
        structural && !constraint.is_excepted(self.sentence, idx)
    }

    /// Window compare for fixed-width sequences without groups or unification.
    fn linear_at(&self, start: usize) -> Option<RawMatch> {
        if start + self.tokens.len() > self.sentence.len() {
            return None;
        }
        let all = self.tokens.iter().enumerate().all(|(offset, constraint)| {
            let idx = start + offset;
            let vetoed = offset > 0 && self.tokens[offset - 1].vetoes_following(&self.sentence.tokens()[idx]);
            !vetoed && self.matches_at(constraint, idx)
        });
        if !all {
            return None;
        }
        RawMatch::from_elements((start..start + self.tokens.len()).map(|i| vec![i]).collect())
    }

    fn backtrack_at(&self, start: usize) -> Result<Option<RawMatch>, Exhausted> {
        let mut walk = Walk { failed: HashSet::new(), memoize: self.unifier.is_none(), steps: 0 };
        let mut elements = Vec::with_capacity(self.tokens.len());
        if self.step(0, start, Some(0), None, &mut elements, &mut walk)? {
            Ok(RawMatch::from_elements(elements))
        } else {
            Ok(None)
        }
    }

    /// Try to satisfy constraints `ci..` with the next token at `pos`, allowing
    /// up to `max_gap` skipped tokens (`None` = unbounded). `vetoer` is the
    /// index of the last matched constraint, whose `Next` exceptions apply to
    /// the gap and the landing token; it is `None` until something matched.
    fn step(
        &self,
        ci: usize,
        pos: usize,
        max_gap: Option<usize>,
        vetoer: Option<usize>,
        elements: &mut Vec<Vec<usize>>,
        walk: &mut Walk,
    ) -> Result<bool, Exhausted> {
        let state = (ci, pos, max_gap, vetoer);
        if walk.memoize && walk.failed.contains(&state) {
            return Ok(false);
        }
        walk.steps += 1;
        if walk.steps > SEARCH_BUDGET {
            return Err(Exhausted);
        }

        let done = self.try_step(ci, pos, max_gap, vetoer, elements, walk)?;
        if !done && walk.memoize {
            walk.failed.insert(state);
        }
        Ok(done)
    }

    fn try_step(
        &self,
        ci: usize,
        pos: usize,
        max_gap: Option<usize>,
        vetoer: Option<usize>,
        elements: &mut Vec<Vec<usize>>,
        walk: &mut Walk,
    ) -> Result<bool, Exhausted> {
        if ci == self.tokens.len() {
            return Ok(vetoer.is_some() && self.unifies(elements));
        }

        let constraint = &self.tokens[ci];
        let len = self.sentence.len();
        let gap_limit = max_gap.unwrap_or(len).min(len.saturating_sub(pos));

        for gap in 0..=gap_limit {
            let landing = pos + gap;
            if landing >= len {
                break;
            }
            // A vetoed or immunized token can neither be matched nor skipped over.
            if vetoer.is_some_and(|v| self.tokens[v].vetoes_following(&self.sentence.tokens()[landing]))
                || self.is_immunized(landing)
            {
                break;
            }

            let run = self.run_length(constraint, landing);
            for count in (1..=run).rev() {
                elements.push((landing..landing + count).collect());
                let next_gap = if constraint.skip() < 0 { None } else { Some(constraint.skip() as usize) };
                if self.step(ci + 1, landing + count, next_gap, Some(ci), elements, walk)? {
                    return Ok(true);
                }
                elements.pop();
            }
        }

        if constraint.is_optional() {
            elements.push(Vec::new());
            if self.step(ci + 1, pos, max_gap, vetoer, elements, walk)? {
                return Ok(true);
            }
            elements.pop();
        }

        Ok(false)
    }

    /// How many consecutive tokens from `idx` this constraint can consume.
    fn run_length(&self, constraint: &PatternToken, idx: usize) -> usize {
        let max = constraint.max_occurrence().unwrap_or(usize::MAX);
        let mut n = 0;
        while n < max && self.matches_at(constraint, idx + n) {
            n += 1;
        }
        n
    }

    fn unifies(&self, elements: &[Vec<usize>]) -> bool {
        let Some(config) = self.unifier else {
            return true;
        };
        let mut unifier = Unifier::new(config);
        for (constraint, matched) in self.tokens.iter().zip(elements) {
            if let Some(unification) = constraint.unification() {
                for &idx in matched {
                    unifier.add(unification, &self.sentence.tokens()[idx]);
                }
            }
        }
        unifier.is_satisfied()
    }
}

/// Run a whole-sentence regex over the rendered text and map matches to tokens.
///
/// Capture groups become elements (`\1` is the first group); without groups
/// the whole match is the single element.
fn regex_matches(re: &Regex, sentence: &TaggedSentence) -> Vec<RawMatch> {
    let text = sentence.text();
    let mut out = Vec::new();

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() == whole.end() {
            continue;
        }

        let covered = |start: usize, end: usize| -> Vec<usize> {
            let (cs, ce) = (char_offset(text, start), char_offset(text, end));
            let Some(first) = sentence.token_at_char(cs) else {
                return Vec::new();
            };
            (first..sentence.len()).take_while(|&i| sentence.tokens()[i].start() < ce).collect()
        };

        let elements: Vec<Vec<usize>> = if caps.len() > 1 {
            (1..caps.len()).map(|g| caps.get(g).map(|m| covered(m.start(), m.end())).unwrap_or_default()).collect()
        } else {
            vec![covered(whole.start(), whole.end())]
        };

        if let Some(m) = RawMatch::from_elements(elements) {
            out.push(m);
        }
    }
    out
}

/// Character offset of byte offset `byte` in `text`.
pub(crate) fn char_offset(text: &str, byte: usize) -> usize {
    text.get(..byte).map(|s| s.chars().count()).unwrap_or_else(|| text.chars().count())
}
