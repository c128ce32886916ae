//! Pattern rules.
//!
//! A [`PatternRule`] is either an ordered sequence of [`PatternToken`]s or a
//! single whole-sentence regex ([`RuleBody`]), plus identity, message
//! templates, suggestion matches, position corrections, an optional filter and
//! a set of anti-patterns.
//!
//! ## Lifecycle
//!
//! Rules are configured through a [`PatternRuleBuilder`] (or the `rule!` macro,
//! or a [`RuleGroup`]) and validated once by [`PatternRuleBuilder::build`]. The
//! resulting `PatternRule` is immutable, so it can be shared across threads and
//! matched against many sentences concurrently.
//!
//! ```text
//! builder ── build() ──▶ PatternRule (frozen) ──▶ Checker / Matchable
//!    ▲                        │
//!    └──── into_builder() ────┘   (reconfigure, e.g. rule-group processing)
//! ```
//!
//! ## Classification
//!
//! The matcher picks its strategy from [`RuleClass`], computed once in
//! `build()`:
//!
//! - `NEEDS_UNIFICATION`: some constraint carries a unification test.
//! - `HAS_GROUP_CONSTRAINT`: some constraint has an AND-group, or unification
//!   is needed (both require evaluating constraints jointly).
//! - `SENTENCE_START`: the first constraint is flagged sentence-start.
//!
//! Whole-sentence-regex rules have no flags.

use crate::api::{Context, Options, RuleMatch};
use crate::error::{CheckError, ConfigError};
use crate::language::Language;
use crate::pattern_token::PatternToken;
use crate::sentence::TaggedSentence;
use crate::suggestion::Match;
use regex::Regex;
use std::fmt;

bitflags::bitflags! {
    /// Construction-time classification of a rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RuleClass: u8 {
        const NEEDS_UNIFICATION    = 1 << 0;
        const HAS_GROUP_CONSTRAINT = 1 << 1;
        const SENTENCE_START       = 1 << 2;
    }
}

impl RuleClass {
    /// Classify a constraint sequence.
    pub fn classify(tokens: &[PatternToken]) -> RuleClass {
        let mut class = RuleClass::empty();
        if tokens.iter().any(PatternToken::is_unified) {
            // Unification implies grouped evaluation.
            class |= RuleClass::NEEDS_UNIFICATION | RuleClass::HAS_GROUP_CONSTRAINT;
        } else if tokens.iter().any(PatternToken::has_and_group) {
            class |= RuleClass::HAS_GROUP_CONSTRAINT;
        }
        if tokens.first().is_some_and(PatternToken::is_sentence_start) {
            class |= RuleClass::SENTENCE_START;
        }
        class
    }
}

/// What a rule matches with.
#[derive(Debug, Clone)]
pub enum RuleBody {
    Tokens(Vec<PatternToken>),
    WholeSentenceRegex(Regex),
}

// --- Capabilities ------------------------------------------------------------

pub trait Identifiable {
    fn id(&self) -> &str;

    fn sub_id(&self) -> Option<&str> {
        None
    }

    /// `ID` or `ID[SUB_ID]`.
    fn full_id(&self) -> String {
        match self.sub_id() {
            Some(sub) => format!("{}[{}]", self.id(), sub),
            None => self.id().to_string(),
        }
    }

    fn description(&self) -> &str;
}

pub trait Matchable: Identifiable {
    fn supports_language(&self, language: &Language) -> bool;

    /// All matches of this rule in `sentence`, after anti-patterns and filters.
    fn match_sentence(&self, sentence: &TaggedSentence, context: &Context) -> Result<Vec<RuleMatch>, CheckError>;
}

/// Rules that keep state across sentences reset it here. Pattern rules keep
/// none.
pub trait Resettable {
    fn reset(&self) {}
}

// --- PatternRule -------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PatternRule {
    id: String,
    sub_id: Option<String>,
    description: String,
    language: Language,
    body: RuleBody,
    class: RuleClass,
    get_unified: bool,
    message: Option<String>,
    suggestions_out_msg: Option<String>,
    suggestion_matches: Vec<Match>,
    suggestion_matches_out_msg: Vec<Match>,
    start_position_correction: i32,
    end_position_correction: i32,
    filter: Option<String>,
    filter_args: Option<String>,
    anti_patterns: Vec<PatternRule>,
}

impl PatternRule {
    pub fn builder() -> PatternRuleBuilder {
        PatternRuleBuilder::default()
    }

    /// An anti-pattern for the rule `owner_id`: a token sequence whose match
    /// immunizes the tokens it covers.
    pub fn anti_pattern(owner_id: &str, language: Language, tokens: Vec<PatternToken>) -> Result<Self, ConfigError> {
        PatternRule::builder()
            .id(format!("{}_antipattern", owner_id))
            .description(format!("anti-pattern of {}", owner_id))
            .language(language)
            .tokens(tokens)
            .build()
    }

    /// Reopen the rule for configuration.
    pub fn into_builder(self) -> PatternRuleBuilder {
        let body = match self.body {
            RuleBody::Tokens(tokens) => BodySpec::Tokens(tokens),
            RuleBody::WholeSentenceRegex(re) => BodySpec::Regex(re.as_str().to_string()),
        };
        PatternRuleBuilder {
            id: Some(self.id),
            sub_id: self.sub_id,
            description: Some(self.description),
            language: Some(Ok(self.language)),
            body: Some(body),
            get_unified: self.get_unified,
            message: self.message,
            suggestions_out_msg: self.suggestions_out_msg,
            suggestion_matches: self.suggestion_matches,
            suggestion_matches_out_msg: self.suggestion_matches_out_msg,
            start_position_correction: self.start_position_correction,
            end_position_correction: self.end_position_correction,
            filter: self.filter,
            filter_args: self.filter_args,
            anti_patterns: self.anti_patterns,
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn body(&self) -> &RuleBody {
        &self.body
    }

    /// The constraint sequence, unless this is a whole-sentence-regex rule.
    pub fn pattern_tokens(&self) -> Option<&[PatternToken]> {
        match &self.body {
            RuleBody::Tokens(tokens) => Some(tokens),
            RuleBody::WholeSentenceRegex(_) => None,
        }
    }

    pub fn whole_sentence_regex(&self) -> Option<&Regex> {
        match &self.body {
            RuleBody::WholeSentenceRegex(re) => Some(re),
            RuleBody::Tokens(_) => None,
        }
    }

    pub fn class(&self) -> RuleClass {
        self.class
    }

    pub fn needs_unification(&self) -> bool {
        self.class.contains(RuleClass::NEEDS_UNIFICATION)
    }

    pub fn has_group_constraint(&self) -> bool {
        self.class.contains(RuleClass::HAS_GROUP_CONSTRAINT)
    }

    pub fn is_sentence_start(&self) -> bool {
        self.class.contains(RuleClass::SENTENCE_START)
    }

    pub fn is_get_unified(&self) -> bool {
        self.get_unified
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn suggestions_out_msg(&self) -> Option<&str> {
        self.suggestions_out_msg.as_deref()
    }

    pub fn suggestion_matches(&self) -> &[Match] {
        &self.suggestion_matches
    }

    pub fn suggestion_matches_out_msg(&self) -> &[Match] {
        &self.suggestion_matches_out_msg
    }

    pub fn start_position_correction(&self) -> i32 {
        self.start_position_correction
    }

    pub fn end_position_correction(&self) -> i32 {
        self.end_position_correction
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn filter_arguments(&self) -> Option<&str> {
        self.filter_args.as_deref()
    }

    /// Read-only view of the accumulated anti-patterns.
    pub fn anti_patterns(&self) -> &[PatternRule] {
        &self.anti_patterns
    }
}

impl Identifiable for PatternRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn sub_id(&self) -> Option<&str> {
        self.sub_id.as_deref()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl Matchable for PatternRule {
    fn supports_language(&self, language: &Language) -> bool {
        language.equals_consider_variants_if_specified(&self.language)
    }

    fn match_sentence(&self, sentence: &TaggedSentence, context: &Context) -> Result<Vec<RuleMatch>, CheckError> {
        crate::engine::check_rule(self, sentence, context, &Options::default())
    }
}

impl Resettable for PatternRule {}

impl fmt::Display for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.full_id())?;
        match &self.body {
            RuleBody::Tokens(tokens) => write!(f, "{} tokens", tokens.len())?,
            RuleBody::WholeSentenceRegex(re) => write!(f, "/{}/", re.as_str())?,
        }
        write!(f, ":{}", self.description)
    }
}

// --- Builder -----------------------------------------------------------------

#[derive(Debug, Clone)]
enum BodySpec {
    Tokens(Vec<PatternToken>),
    Regex(String),
}

/// Named optional fields, validated once in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct PatternRuleBuilder {
    id: Option<String>,
    sub_id: Option<String>,
    description: Option<String>,
    language: Option<Result<Language, ConfigError>>,
    body: Option<BodySpec>,
    get_unified: bool,
    message: Option<String>,
    suggestions_out_msg: Option<String>,
    suggestion_matches: Vec<Match>,
    suggestion_matches_out_msg: Vec<Match>,
    start_position_correction: i32,
    end_position_correction: i32,
    filter: Option<String>,
    filter_args: Option<String>,
    anti_patterns: Vec<PatternRule>,
}

impl PatternRuleBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sub_id = Some(sub_id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(Ok(language));
        self
    }

    /// Language from a tag such as `en-US`; a bad tag fails in `build()`.
    pub fn language_tag(mut self, tag: &str) -> Self {
        self.language = Some(Language::new(tag));
        self
    }

    /// Use a constraint sequence (replaces a previously set regex).
    pub fn tokens(mut self, tokens: Vec<PatternToken>) -> Self {
        self.body = Some(BodySpec::Tokens(tokens));
        self
    }

    /// Use a whole-sentence regex (replaces a previously set sequence).
    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.body = Some(BodySpec::Regex(pattern.into()));
        self
    }

    pub fn get_unified(mut self, get_unified: bool) -> Self {
        self.get_unified = get_unified;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn suggestions_out_msg(mut self, text: impl Into<String>) -> Self {
        self.suggestions_out_msg = Some(text.into());
        self
    }

    pub fn suggestion_match(mut self, m: Match) -> Self {
        self.suggestion_matches.push(m);
        self
    }

    pub fn suggestion_match_out_msg(mut self, m: Match) -> Self {
        self.suggestion_matches_out_msg.push(m);
        self
    }

    pub fn start_position_correction(mut self, correction: i32) -> Self {
        self.start_position_correction = correction;
        self
    }

    pub fn end_position_correction(mut self, correction: i32) -> Self {
        self.end_position_correction = correction;
        self
    }

    pub fn filter(mut self, name: impl Into<String>) -> Self {
        self.filter = Some(name.into());
        self
    }

    pub fn filter_arguments(mut self, args: impl Into<String>) -> Self {
        self.filter_args = Some(args.into());
        self
    }

    /// Append anti-patterns; earlier ones are kept.
    pub fn anti_patterns(mut self, anti_patterns: impl IntoIterator<Item = PatternRule>) -> Self {
        self.anti_patterns.extend(anti_patterns);
        self
    }

    pub fn build(self) -> Result<PatternRule, ConfigError> {
        let id = self.id.filter(|s| !s.trim().is_empty()).ok_or(ConfigError::MissingId)?;
        let description =
            self.description.filter(|s| !s.trim().is_empty()).ok_or_else(|| ConfigError::MissingDescription(id.clone()))?;
        let language = self.language.ok_or_else(|| ConfigError::MissingLanguage(id.clone()))??;

        let (body, class) = match self.body.ok_or_else(|| ConfigError::MissingBody(id.clone()))? {
            BodySpec::Tokens(tokens) => {
                let class = RuleClass::classify(&tokens);
                (RuleBody::Tokens(tokens), class)
            }
            BodySpec::Regex(pattern) => {
                let re = Regex::new(&pattern).map_err(|source| ConfigError::InvalidRegex { pattern, source })?;
                (RuleBody::WholeSentenceRegex(re), RuleClass::empty())
            }
        };

        Ok(PatternRule {
            id,
            sub_id: self.sub_id,
            description,
            language,
            body,
            class,
            get_unified: self.get_unified,
            message: self.message,
            suggestions_out_msg: self.suggestions_out_msg,
            suggestion_matches: self.suggestion_matches,
            suggestion_matches_out_msg: self.suggestion_matches_out_msg,
            start_position_correction: self.start_position_correction,
            end_position_correction: self.end_position_correction,
            filter: self.filter,
            filter_args: self.filter_args,
            anti_patterns: self.anti_patterns,
        })
    }
}

// --- Rule groups -------------------------------------------------------------

/// Several rules sharing one id and description, told apart by sub-ids
/// `"1"`, `"2"`, … in declaration order.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    id: String,
    description: String,
    rules: Vec<PatternRuleBuilder>,
}

impl RuleGroup {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        RuleGroup { id: id.into(), description: description.into(), rules: Vec::new() }
    }

    /// Add a member; its id is overwritten, its description defaults to the
    /// group's.
    pub fn rule(mut self, rule: PatternRuleBuilder) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> Result<Vec<PatternRule>, ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::EmptyGroup(self.id));
        }
        self.rules
            .into_iter()
            .enumerate()
            .map(|(idx, mut rule)| {
                if rule.description.is_none() {
                    rule.description = Some(self.description.clone());
                }
                rule.id(self.id.clone()).sub_id((idx + 1).to_string()).build()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern_token::PatternToken;
    use crate::unify::Unification;
    use proptest::prelude::*;

    fn en() -> Language {
        Language::new("en").unwrap()
    }

    fn base() -> PatternRuleBuilder {
        PatternRule::builder().id("R1").description("test rule").language(en())
    }

    fn unified() -> PatternToken {
        PatternToken::builder().word("x").unify(Unification::new(["number"])).build().unwrap()
    }

    fn grouped() -> PatternToken {
        PatternToken::builder().word("x").and(PatternToken::pos("NN").unwrap()).build().unwrap()
    }

    fn sentence_start() -> PatternToken {
        PatternToken::builder().sentence_start().build().unwrap()
    }

    #[test]
    fn full_id_with_and_without_sub_id() {
        let r = base().tokens(vec![PatternToken::word("a")]).build().unwrap();
        assert_eq!(r.full_id(), "R1");
        let r = r.into_builder().sub_id("S2").build().unwrap();
        assert_eq!(r.full_id(), "R1[S2]");
        assert_eq!(r.to_string(), "R1[S2]:1 tokens:test rule");
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert!(matches!(base().build(), Err(ConfigError::MissingBody(_))));
        assert!(matches!(
            PatternRule::builder().description("d").language(en()).regex("x").build(),
            Err(ConfigError::MissingId)
        ));
        assert!(matches!(
            PatternRule::builder().id("R").language(en()).regex("x").build(),
            Err(ConfigError::MissingDescription(_))
        ));
        assert!(matches!(
            PatternRule::builder().id("R").description("d").regex("x").build(),
            Err(ConfigError::MissingLanguage(_))
        ));
        assert!(matches!(
            PatternRule::builder().id("R").description("d").language_tag("???").regex("x").build(),
            Err(ConfigError::InvalidLanguageTag(_))
        ));
        assert!(matches!(base().regex("(").build(), Err(ConfigError::InvalidRegex { .. })));
    }

    #[test]
    fn either_body_suffices() {
        let tokens = base().tokens(vec![PatternToken::word("a")]).build().unwrap();
        assert!(tokens.pattern_tokens().is_some());
        assert!(tokens.whole_sentence_regex().is_none());

        let regex = base().regex(r"\balot\b").build().unwrap();
        assert!(regex.pattern_tokens().is_none());
        assert_eq!(regex.whole_sentence_regex().map(Regex::as_str), Some(r"\balot\b"));
        assert_eq!(regex.class(), RuleClass::empty());
    }

    #[test]
    fn classification_flags() {
        let r = base().tokens(vec![PatternToken::word("a"), unified()]).build().unwrap();
        assert!(r.needs_unification());
        assert!(r.has_group_constraint());
        assert!(!r.is_sentence_start());

        let r = base().tokens(vec![grouped()]).build().unwrap();
        assert!(!r.needs_unification());
        assert!(r.has_group_constraint());

        let r = base().tokens(vec![sentence_start(), PatternToken::word("a")]).build().unwrap();
        assert!(r.is_sentence_start());

        let r = base().tokens(vec![PatternToken::word("a"), sentence_start()]).build().unwrap();
        assert!(!r.is_sentence_start());

        let r = base().tokens(Vec::new()).build().unwrap();
        assert_eq!(r.class(), RuleClass::empty());
    }

    #[test]
    fn anti_patterns_accumulate() {
        let ap = |w: &str| PatternRule::anti_pattern("R1", en(), vec![PatternToken::word(w)]).unwrap();
        let r = base()
            .tokens(vec![PatternToken::word("a")])
            .anti_patterns(vec![ap("b")])
            .anti_patterns(vec![ap("c"), ap("d")])
            .build()
            .unwrap();
        assert_eq!(r.anti_patterns().len(), 3);
        assert_eq!(r.anti_patterns()[0].id(), "R1_antipattern");

        let first: Vec<String> = r.anti_patterns().iter().map(|a| a.to_string()).collect();
        let second: Vec<String> = r.anti_patterns().iter().map(|a| a.to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn reconfiguring_keeps_everything() {
        let r = base()
            .tokens(vec![PatternToken::word("a"), PatternToken::word("b")])
            .message(r"Use \2")
            .suggestions_out_msg("<suggestion>b</suggestion>")
            .suggestion_match(Match::new(2))
            .suggestion_match_out_msg(Match::new(1))
            .filter("regex_antipattern")
            .filter_arguments("regex:x")
            .get_unified(true)
            .build()
            .unwrap();
        let r = r.into_builder().start_position_correction(1).end_position_correction(-1).build().unwrap();

        assert_eq!(r.message(), Some(r"Use \2"));
        assert_eq!(r.suggestions_out_msg(), Some("<suggestion>b</suggestion>"));
        assert_eq!(r.suggestion_matches().len(), 1);
        assert_eq!(r.suggestion_matches_out_msg()[0].token_ref(), 1);
        assert_eq!(r.filter(), Some("regex_antipattern"));
        assert_eq!(r.filter_arguments(), Some("regex:x"));
        assert_eq!((r.start_position_correction(), r.end_position_correction()), (1, -1));
        assert!(r.is_get_unified());
    }

    #[test]
    fn language_gating() {
        let r = base().language_tag("en").regex("x").build().unwrap();
        assert!(r.supports_language(&Language::new("en-US").unwrap()));
        assert!(r.supports_language(&Language::new("en").unwrap()));
        assert!(!r.supports_language(&Language::new("de").unwrap()));

        let pinned = base().language_tag("en-GB").regex("x").build().unwrap();
        assert!(!pinned.supports_language(&Language::new("en-US").unwrap()));
        assert!(pinned.supports_language(&Language::new("en").unwrap()));
    }

    #[test]
    fn rule_group_assigns_sub_ids() {
        let rules = RuleGroup::new("THEN_THAN", "then vs than")
            .rule(PatternRule::builder().language(en()).tokens(vec![PatternToken::word("then")]))
            .rule(PatternRule::builder().language(en()).description("custom").regex("then"))
            .build()
            .unwrap();
        let ids: Vec<String> = rules.iter().map(|r| r.full_id()).collect();
        assert_eq!(ids, vec!["THEN_THAN[1]", "THEN_THAN[2]"]);
        assert_eq!(rules[0].description(), "then vs than");
        assert_eq!(rules[1].description(), "custom");

        assert!(matches!(RuleGroup::new("G", "g").build(), Err(ConfigError::EmptyGroup(_))));
    }

    // Each generated constraint: (unified, grouped, sentence_start).
    fn arb_tokens() -> impl Strategy<Value = Vec<(bool, bool, bool)>> {
        prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 0..8)
    }

    fn make(shape: &[(bool, bool, bool)]) -> Vec<PatternToken> {
        shape.iter()
            .map(|&(unify, group, start)| {
                let mut b = PatternToken::builder().word("w");
                if unify {
                    b = b.unify(Unification::new(["number"]));
                }
                if group {
                    b = b.and(PatternToken::any());
                }
                if start {
                    b = b.sentence_start();
                }
                b.build().unwrap()
            })
            .collect()
    }

    proptest! {
        #[test]
        fn unification_forces_group_flag(shape in arb_tokens()) {
            let class = RuleClass::classify(&make(&shape));
            let any_unified = shape.iter().any(|t| t.0);
            let any_grouped = shape.iter().any(|t| t.1);

            prop_assert_eq!(class.contains(RuleClass::NEEDS_UNIFICATION), any_unified);
            prop_assert_eq!(class.contains(RuleClass::HAS_GROUP_CONSTRAINT), any_unified || any_grouped);
        }

        #[test]
        fn sentence_start_follows_first_constraint(shape in arb_tokens()) {
            let class = RuleClass::classify(&make(&shape));
            let expected = shape.first().is_some_and(|t| t.2);
            prop_assert_eq!(class.contains(RuleClass::SENTENCE_START), expected);
        }

        #[test]
        fn built_rules_keep_classification(shape in arb_tokens()) {
            let tokens = make(&shape);
            let expected = RuleClass::classify(&tokens);
            let rule = base().tokens(tokens).build().unwrap();
            prop_assert_eq!(rule.class(), expected);
        }
    }
}
