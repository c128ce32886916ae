//! Token constraints.
//!
//! A [`PatternToken`] is one positional test in a rule's constraint sequence.
//! It can test the surface text (or a lemma), the part-of-speech tag, the
//! token's position in the sentence, and carries the sequencing attributes
//! the matcher needs: optionality, repetition and skip.
//!
//! ```text
//! PatternToken
//!   text:        "a" | /an?/          (surface, or lemma when INFLECTED)
//!   pos_tag:     /NNS?/
//!   flags:       NEGATED | CASE_SENSITIVE | SENTENCE_START | ...
//!   occurrence:  min 0..=1, max 1..=N or unbounded
//!   skip:        tokens allowed between this match and the next constraint
//!   and_group:   siblings that must match the *same* token
//!   exceptions:  vetoes on the current / next / previous token
//!   unification: cross-token agreement test
//! ```

use crate::error::ConfigError;
use crate::sentence::{AnalyzedToken, Reading, TaggedSentence};
use crate::unify::Unification;
use regex::{Regex, RegexBuilder};

bitflags::bitflags! {
    /// Boolean attributes of a token constraint.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TokenFlags: u16 {
        /// The text test must *fail*.
        const NEGATED        = 1 << 0;
        /// No reading may carry a matching POS tag.
        const POS_NEGATED    = 1 << 1;
        const CASE_SENSITIVE = 1 << 2;
        /// The text test applies to lemmas instead of the surface.
        const INFLECTED      = 1 << 3;
        const SENTENCE_START = 1 << 4;
        const SENTENCE_END   = 1 << 5;
    }
}

/// Literal or (anchored) regular-expression string test.
#[derive(Debug, Clone)]
pub enum StringMatcher {
    Literal { text: String, case_sensitive: bool },
    Regex(Regex),
}

impl StringMatcher {
    pub fn literal(text: impl Into<String>, case_sensitive: bool) -> Self {
        StringMatcher::Literal { text: text.into(), case_sensitive }
    }

    /// Compile `pattern` so that it must match the whole input.
    pub fn regex(pattern: &str, case_sensitive: bool) -> Result<Self, ConfigError> {
        RegexBuilder::new(&format!("^(?:{})$", pattern))
            .case_insensitive(!case_sensitive)
            .build()
            .map(StringMatcher::Regex)
            .map_err(|source| ConfigError::InvalidRegex { pattern: pattern.to_string(), source })
    }

    pub fn is_match(&self, input: &str) -> bool {
        match self {
            StringMatcher::Literal { text, case_sensitive: true } => text == input,
            StringMatcher::Literal { text, case_sensitive: false } => {
                text == input || text.to_lowercase() == input.to_lowercase()
            }
            StringMatcher::Regex(re) => re.is_match(input),
        }
    }

    /// The literal text, when this is not a regex.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            StringMatcher::Literal { text, .. } => Some(text),
            StringMatcher::Regex(_) => None,
        }
    }
}

/// Which token an exception is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionScope {
    Current,
    /// The following token, or every skipped token when the owner skips.
    Next,
    Previous,
}

#[derive(Debug, Clone)]
pub struct Exception {
    pub scope: ExceptionScope,
    pub token: PatternToken,
}

#[derive(Debug, Clone)]
pub struct PatternToken {
    text: Option<StringMatcher>,
    pos_tag: Option<StringMatcher>,
    flags: TokenFlags,
    min_occurrence: usize,
    /// `None` means unbounded.
    max_occurrence: Option<usize>,
    skip: i32,
    and_group: Vec<PatternToken>,
    exceptions: Vec<Exception>,
    unification: Option<Unification>,
}

impl PatternToken {
    pub fn builder() -> PatternTokenBuilder {
        PatternTokenBuilder::default()
    }

    /// Case-insensitive literal word.
    pub fn word(text: impl Into<String>) -> Self {
        PatternToken { text: Some(StringMatcher::literal(text, false)), ..PatternToken::any() }
    }

    /// Matches every token.
    pub fn any() -> Self {
        PatternToken {
            text: None,
            pos_tag: None,
            flags: TokenFlags::empty(),
            min_occurrence: 1,
            max_occurrence: Some(1),
            skip: 0,
            and_group: Vec::new(),
            exceptions: Vec::new(),
            unification: None,
        }
    }

    /// Any token carrying a POS tag matching `pattern`.
    pub fn pos(pattern: &str) -> Result<Self, ConfigError> {
        PatternToken::builder().pos(pattern).build()
    }

    /// Case-insensitive surface regex.
    pub fn word_regex(pattern: &str) -> Result<Self, ConfigError> {
        PatternToken::builder().word_regex(pattern).build()
    }

    pub fn text(&self) -> Option<&StringMatcher> {
        self.text.as_ref()
    }

    pub fn pos_tag(&self) -> Option<&StringMatcher> {
        self.pos_tag.as_ref()
    }

    pub fn flags(&self) -> TokenFlags {
        self.flags
    }

    pub fn is_negated(&self) -> bool {
        self.flags.contains(TokenFlags::NEGATED)
    }

    pub fn is_sentence_start(&self) -> bool {
        self.flags.contains(TokenFlags::SENTENCE_START)
    }

    pub fn is_sentence_end(&self) -> bool {
        self.flags.contains(TokenFlags::SENTENCE_END)
    }

    pub fn is_inflected(&self) -> bool {
        self.flags.contains(TokenFlags::INFLECTED)
    }

    pub fn min_occurrence(&self) -> usize {
        self.min_occurrence
    }

    pub fn max_occurrence(&self) -> Option<usize> {
        self.max_occurrence
    }

    pub fn is_optional(&self) -> bool {
        self.min_occurrence == 0
    }

    pub fn skip(&self) -> i32 {
        self.skip
    }

    pub fn has_and_group(&self) -> bool {
        !self.and_group.is_empty()
    }

    pub fn and_group(&self) -> &[PatternToken] {
        &self.and_group
    }

    pub fn exceptions(&self) -> &[Exception] {
        &self.exceptions
    }

    pub fn is_unified(&self) -> bool {
        self.unification.is_some()
    }

    pub fn unification(&self) -> Option<&Unification> {
        self.unification.as_ref()
    }

    /// Lowercased literal word this constraint requires, if any.
    ///
    /// Used for cheap sentence gating: only plain, non-negated, non-optional
    /// surface literals qualify.
    pub(crate) fn required_word(&self) -> Option<String> {
        if self.flags.intersects(TokenFlags::NEGATED | TokenFlags::INFLECTED) || self.is_optional() {
            return None;
        }
        self.text.as_ref()?.as_literal().map(str::to_lowercase)
    }

    /// Test this constraint alone (no AND-group, no exceptions) against `token`.
    ///
    /// Text and POS are checked against the same reading; any reading may
    /// satisfy them.
    pub fn is_match(&self, token: &AnalyzedToken) -> bool {
        if self.is_sentence_start() && !token.is_sentence_start() {
            return false;
        }
        if self.is_sentence_end() && !token.is_sentence_end() {
            return false;
        }

        if self.flags.contains(TokenFlags::POS_NEGATED) {
            if let Some(pos) = &self.pos_tag {
                let any_tag = token.readings().iter().any(|r| r.pos_tag.as_deref().is_some_and(|t| pos.is_match(t)));
                if any_tag {
                    return false;
                }
            }
        }

        let empty = Reading::default();
        let readings: &[Reading] = if token.readings().is_empty() { std::slice::from_ref(&empty) } else { token.readings() };
        readings.iter().any(|reading| self.matches_reading(token, reading))
    }

    /// Like [`is_match`](Self::is_match), and every AND-group sibling must match
    /// the same token as well.
    pub fn is_match_with_group(&self, token: &AnalyzedToken) -> bool {
        self.is_match(token) && self.and_group.iter().all(|sibling| sibling.is_match(token))
    }

    fn matches_reading(&self, token: &AnalyzedToken, reading: &Reading) -> bool {
        let text_ok = match &self.text {
            None => true,
            Some(matcher) => {
                let target = if self.is_inflected() { reading.lemma.as_deref() } else { Some(token.surface()) };
                target.is_some_and(|t| matcher.is_match(t)) != self.is_negated()
            }
        };

        let pos_ok = match &self.pos_tag {
            None => true,
            // Checked token-wide in `is_match`.
            Some(_) if self.flags.contains(TokenFlags::POS_NEGATED) => true,
            Some(matcher) => reading.pos_tag.as_deref().is_some_and(|t| matcher.is_match(t)),
        };

        text_ok && pos_ok
    }

    /// Does an exception veto the token at `idx` from being matched by this
    /// constraint? Covers `Current` and `Previous` scopes.
    pub(crate) fn is_excepted(&self, sentence: &TaggedSentence, idx: usize) -> bool {
        self.exceptions.iter().any(|exc| match exc.scope {
            ExceptionScope::Current => sentence.tokens().get(idx).is_some_and(|t| exc.token.is_match(t)),
            ExceptionScope::Previous => {
                idx > 0 && sentence.tokens().get(idx - 1).is_some_and(|t| exc.token.is_match(t))
            }
            ExceptionScope::Next => false,
        })
    }

    /// Does a `Next`-scoped exception veto `token`, which follows (or is skipped
    /// after) a token matched by this constraint?
    pub(crate) fn vetoes_following(&self, token: &AnalyzedToken) -> bool {
        self.exceptions.iter().any(|exc| exc.scope == ExceptionScope::Next && exc.token.is_match(token))
    }
}

/// Builder for [`PatternToken`]; regexes are compiled in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct PatternTokenBuilder {
    text: Option<(String, bool)>,
    pos_tag: Option<String>,
    flags: TokenFlags,
    min_occurrence: Option<usize>,
    max_occurrence: Option<Option<usize>>,
    skip: i32,
    and_group: Vec<PatternToken>,
    exceptions: Vec<Exception>,
    unification: Option<Unification>,
}

impl PatternTokenBuilder {
    pub fn word(mut self, text: impl Into<String>) -> Self {
        self.text = Some((text.into(), false));
        self
    }

    pub fn word_regex(mut self, pattern: impl Into<String>) -> Self {
        self.text = Some((pattern.into(), true));
        self
    }

    /// POS tag regex.
    pub fn pos(mut self, pattern: impl Into<String>) -> Self {
        self.pos_tag = Some(pattern.into());
        self
    }

    pub fn negate(mut self) -> Self {
        self.flags |= TokenFlags::NEGATED;
        self
    }

    pub fn negate_pos(mut self) -> Self {
        self.flags |= TokenFlags::POS_NEGATED;
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.flags |= TokenFlags::CASE_SENSITIVE;
        self
    }

    pub fn inflected(mut self) -> Self {
        self.flags |= TokenFlags::INFLECTED;
        self
    }

    pub fn sentence_start(mut self) -> Self {
        self.flags |= TokenFlags::SENTENCE_START;
        self
    }

    pub fn sentence_end(mut self) -> Self {
        self.flags |= TokenFlags::SENTENCE_END;
        self
    }

    pub fn optional(mut self) -> Self {
        self.min_occurrence = Some(0);
        self
    }

    pub fn min_occurrence(mut self, min: usize) -> Self {
        self.min_occurrence = Some(min);
        self
    }

    pub fn max_occurrence(mut self, max: usize) -> Self {
        self.max_occurrence = Some(Some(max));
        self
    }

    /// Repeat as often as possible.
    pub fn unbounded(mut self) -> Self {
        self.max_occurrence = Some(None);
        self
    }

    /// Tokens that may be skipped before the next constraint; `-1` = any number.
    pub fn skip(mut self, skip: i32) -> Self {
        self.skip = skip;
        self
    }

    /// Add an AND-group sibling.
    pub fn and(mut self, sibling: PatternToken) -> Self {
        self.and_group.push(sibling);
        self
    }

    pub fn exception(mut self, scope: ExceptionScope, token: PatternToken) -> Self {
        self.exceptions.push(Exception { scope, token });
        self
    }

    pub fn unify(mut self, unification: Unification) -> Self {
        self.unification = Some(unification);
        self
    }

    pub fn build(self) -> Result<PatternToken, ConfigError> {
        let case_sensitive = self.flags.contains(TokenFlags::CASE_SENSITIVE);

        let text = match self.text {
            Some((pattern, true)) => Some(StringMatcher::regex(&pattern, case_sensitive)?),
            Some((literal, false)) => Some(StringMatcher::literal(literal, case_sensitive)),
            None => None,
        };
        // POS tags are always compared case-sensitively.
        let pos_tag = self.pos_tag.as_deref().map(|p| StringMatcher::regex(p, true)).transpose()?;

        if self.flags.contains(TokenFlags::POS_NEGATED) && pos_tag.is_none() {
            return Err(ConfigError::InvalidToken("negated POS without a POS tag".to_string()));
        }

        let min_occurrence = self.min_occurrence.unwrap_or(1);
        let max_occurrence = self.max_occurrence.unwrap_or(Some(1));
        if min_occurrence > 1 {
            return Err(ConfigError::InvalidToken(format!("min occurrence must be 0 or 1, got {}", min_occurrence)));
        }
        if max_occurrence == Some(0) {
            return Err(ConfigError::InvalidToken("max occurrence must be at least 1".to_string()));
        }
        if self.skip < -1 {
            return Err(ConfigError::InvalidToken(format!("skip must be -1 or more, got {}", self.skip)));
        }

        Ok(PatternToken {
            text,
            pos_tag,
            flags: self.flags,
            min_occurrence,
            max_occurrence,
            skip: self.skip,
            and_group: self.and_group,
            exceptions: self.exceptions,
            unification: self.unification,
        })
    }
}
