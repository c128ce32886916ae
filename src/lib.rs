//! Rule-based grammar and style checking over tagged sentences.
//!
//! A [`PatternRule`] describes an error as a sequence of token constraints
//! ([`PatternToken`]) or as a whole-sentence regular expression, together with
//! a message, suggestion formatting and optional anti-patterns and filters.
//! Rules are built once through [`PatternRule::builder`] (or the [`rule!`]
//! macro) and are immutable afterwards, so a [`Checker`] can be shared across
//! threads.
//!
//! ```
//! use grammatica::{Checker, Context, Options, PatternRule, PatternToken, TaggedSentence};
//!
//! let rule = PatternRule::builder()
//!     .id("COULD_OF")
//!     .description("could of")
//!     .language_tag("en")
//!     .tokens(vec![PatternToken::word("could"), PatternToken::word("of")])
//!     .message(r"Did you mean <suggestion>\1 have</suggestion>?")
//!     .build()
//!     .unwrap();
//!
//! let rules = [rule];
//! let sentence = TaggedSentence::parse("I could of gone .").unwrap();
//! let run = Checker::new(&rules).check(&sentence, &Context::default(), &Options::default());
//! assert_eq!(run.matches[0].suggestions, vec!["could have"]);
//! ```

extern crate self as grammatica;

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod language;
mod pattern_token;
mod rule;
mod rules;
mod sentence;
mod suggestion;
mod unify;

pub use api::{
    CheckDetails, CheckResult, CheckResultVerbose, Context, Options, RuleMatch, check, check_verbose,
    check_verbose_with, check_with, default_rules,
};
pub use engine::{
    Checker, CompiledRules, FilterArgs, FilterRegistry, RegexAntiPatternFilter, RuleFilter, RuleIndex, RuleMeta,
    RuleTiming, RunMetrics, RunResult, Strategy, TriggerInfo,
};
pub use error::{CheckError, ConfigError};
pub use language::Language;
pub use pattern_token::{Exception, ExceptionScope, PatternToken, PatternTokenBuilder, StringMatcher, TokenFlags};
pub use rule::{
    Identifiable, Matchable, PatternRule, PatternRuleBuilder, Resettable, RuleBody, RuleClass, RuleGroup,
};
pub use sentence::{AnalyzedToken, Reading, TaggedSentence};
pub use suggestion::{CaseConversion, IncludeField, Match, MessageFormatter, extract_suggestions};
pub use unify::{Equivalence, Unification, UnifierConfig};
