use crate::engine::{self, FilterRegistry, RuleTiming};
use crate::error::{CheckError, ConfigError};
use crate::language::Language;
use crate::rule::{Identifiable, PatternRule};
use crate::sentence::TaggedSentence;
use crate::unify::UnifierConfig;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

static DEFAULT_RULES: Lazy<Result<Vec<PatternRule>, ConfigError>> = Lazy::new(crate::rules::en::rules::get);
static EN_UNIFIER: Lazy<Result<Arc<UnifierConfig>, ConfigError>> =
    Lazy::new(|| crate::rules::en::unifier::config().map(Arc::new));

/// Checking context.
///
/// This holds the environment a rule is matched in: the document language and
/// the language data the engine consults (unification features, filters).
#[derive(Debug, Clone)]
pub struct Context {
    /// Language of the checked text; rules for other languages are skipped.
    pub language: Language,
    /// Feature definitions for unification.
    pub unifier: Arc<UnifierConfig>,
    /// Filters available to rules by name.
    pub filters: Arc<FilterRegistry>,
}

impl Context {
    /// A context for `language` with its built-in unifier features (if any)
    /// and the built-in filters.
    pub fn for_language(language: Language) -> Self {
        let unifier = match (language.short_code(), &*EN_UNIFIER) {
            ("en", Ok(config)) => Arc::clone(config),
            ("en", Err(err)) => {
                tracing::warn!("[unifier:load] English features failed to build: {}", err);
                Arc::new(UnifierConfig::new())
            }
            _ => Arc::new(UnifierConfig::new()),
        };
        Context { language, unifier, filters: Arc::new(FilterRegistry::default()) }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::for_language(Language::english())
    }
}

/// Options that affect which rules run and how matches are post-processed.
#[derive(Debug, Clone)]
pub struct Options {
    /// Rule ids to skip; either a bare id (all members of a group) or a full
    /// id such as `THEN_THAN[2]`.
    pub disabled_rules: HashSet<String>,
    /// Drop candidates covered by anti-patterns. Turn off to diagnose
    /// suppression.
    pub apply_anti_patterns: bool,
}

impl Options {
    pub fn disable(mut self, id: impl Into<String>) -> Self {
        self.disabled_rules.insert(id.into());
        self
    }

    pub(crate) fn is_disabled(&self, rule: &PatternRule) -> bool {
        !self.disabled_rules.is_empty()
            && (self.disabled_rules.contains(rule.id()) || self.disabled_rules.contains(&rule.full_id()))
    }
}

impl Default for Options {
    fn default() -> Self {
        Options { disabled_rules: HashSet::new(), apply_anti_patterns: true }
    }
}

/// A problem found in a sentence.
///
/// `from_token`/`to_token` are inclusive token indices of the reported span;
/// `start`/`end` are character offsets into [`TaggedSentence::text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule_id: String,
    pub sub_id: Option<String>,
    /// `ID` or `ID[SUB_ID]`.
    pub full_id: String,
    /// Rendered message, `<suggestion>` markup included.
    pub message: String,
    pub suggestions: Vec<String>,
    pub from_token: usize,
    pub to_token: usize,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Text covered by the reported span.
    pub text: String,
}

/// Result from [`check`] and [`check_with`].
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// The checked sentence text.
    pub text: String,
    pub matches: Vec<RuleMatch>,
    /// Rules that failed on this sentence (they produced no matches).
    pub errors: Vec<CheckError>,
    /// Total elapsed time spent checking.
    pub elapsed: Duration,
}

/// Additional details returned by [`check_verbose`] and [`check_verbose_with`].
///
/// This is intentionally compact: it's meant for debugging rule gating and
/// suppression without dumping the engine's internal state.
#[derive(Debug, Clone, Default)]
pub struct CheckDetails {
    pub total: Duration,
    /// Full ids of rules that passed language, disabled and word gating.
    pub active_rules: Vec<String>,
    pub rules_total: usize,
    pub rules_gated_language: usize,
    pub rules_gated_words: usize,
    pub rules_disabled: usize,
    pub candidates: usize,
    /// Candidates dropped by anti-patterns.
    pub suppressed: usize,
    /// Candidates rejected by rule filters.
    pub filtered: usize,
    /// Per-rule timings; empty unless `debug` logging is enabled.
    pub per_rule: Vec<RuleTiming>,
}

/// Result from [`check_verbose`] and [`check_verbose_with`].
#[derive(Debug, Clone)]
pub struct CheckResultVerbose {
    pub text: String,
    pub matches: Vec<RuleMatch>,
    pub errors: Vec<CheckError>,
    pub elapsed: Duration,
    pub details: CheckDetails,
}

/// The built-in English rule set.
pub fn default_rules() -> Result<&'static [PatternRule], ConfigError> {
    match &*DEFAULT_RULES {
        Ok(rules) => Ok(rules.as_slice()),
        Err(err) => Err(err.clone()),
    }
}

/// Check `sentence` with the built-in rules and a default [`Context`].
///
/// # Example
/// ```
/// use grammatica::{TaggedSentence, check};
///
/// let sentence = TaggedSentence::parse("He could/MD of/IN gone/VBN .").unwrap();
/// let out = check(&sentence);
/// assert_eq!(out.matches[0].full_id, "COULD_OF");
/// ```
pub fn check(sentence: &TaggedSentence) -> CheckResult {
    check_with(sentence, &Context::default(), &Options::default())
}

/// Check `sentence` with the built-in rules and the provided `context`/`options`.
pub fn check_with(sentence: &TaggedSentence, context: &Context, options: &Options) -> CheckResult {
    let rules = match default_rules() {
        Ok(rules) => rules,
        Err(err) => return failed(sentence, err),
    };
    let run = engine::Checker::new(rules).check(sentence, context, options);

    CheckResult { text: sentence.text().to_string(), matches: run.matches, errors: run.errors, elapsed: run.metrics.total }
}

pub fn check_verbose(sentence: &TaggedSentence) -> CheckResultVerbose {
    check_verbose_with(sentence, &Context::default(), &Options::default())
}

/// Check `sentence` with `context`/`options` and return gating and
/// suppression details.
///
/// The default [`check_with`] path does not collect the active rule list.
pub fn check_verbose_with(sentence: &TaggedSentence, context: &Context, options: &Options) -> CheckResultVerbose {
    let rules = match default_rules() {
        Ok(rules) => rules,
        Err(err) => {
            let failed = failed(sentence, err);
            return CheckResultVerbose {
                text: failed.text,
                matches: failed.matches,
                errors: failed.errors,
                elapsed: failed.elapsed,
                details: CheckDetails::default(),
            };
        }
    };

    let checker = engine::Checker::new(rules);
    let active_rules = checker.active_rule_ids(sentence, context, options);
    let run = checker.check(sentence, context, options);
    let m = run.metrics;

    let details = CheckDetails {
        total: m.total,
        active_rules,
        rules_total: m.rules_total,
        rules_gated_language: m.rules_gated_language,
        rules_gated_words: m.rules_gated_words,
        rules_disabled: m.rules_disabled,
        candidates: m.candidates,
        suppressed: m.suppressed,
        filtered: m.filtered,
        per_rule: m.per_rule,
    };

    CheckResultVerbose { text: sentence.text().to_string(), matches: run.matches, errors: run.errors, elapsed: m.total, details }
}

fn failed(sentence: &TaggedSentence, err: ConfigError) -> CheckResult {
    tracing::warn!("[rules:load] built-in rules failed to build: {}", err);
    CheckResult {
        text: sentence.text().to_string(),
        matches: Vec::new(),
        errors: vec![CheckError::Config(err)],
        elapsed: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> TaggedSentence {
        TaggedSentence::parse(text).unwrap()
    }

    #[test]
    fn check_with_returns_matches() {
        let res = check_with(&parse("He could/MD of/IN gone/VBN ."), &Context::default(), &Options::default());

        assert_eq!(res.text, "He could of gone.");
        assert!(res.errors.is_empty());
        let m = res.matches.iter().find(|m| m.rule_id == "COULD_OF").unwrap();
        assert_eq!(m.text, "could of");
        assert_eq!((m.start, m.end), (3, 11));
        assert_eq!(m.suggestions, vec!["could have"]);
    }

    #[test]
    fn check_verbose_includes_gating_details() {
        let res = check_verbose_with(&parse("He could of gone ."), &Context::default(), &Options::default());

        assert_eq!(res.elapsed, res.details.total);
        assert!(res.details.active_rules.iter().any(|id| id == "COULD_OF"));
        assert!(res.details.rules_gated_words > 0);
        assert_eq!(
            res.details.rules_total,
            res.details.active_rules.len()
                + res.details.rules_gated_language
                + res.details.rules_gated_words
                + res.details.rules_disabled
        );
    }

    #[test]
    fn disabled_ids_match_bare_and_full_ids() {
        let sentence = parse("He could of gone .");
        let off = Options::default().disable("COULD_OF");
        assert!(check_with(&sentence, &Context::default(), &off).matches.iter().all(|m| m.rule_id != "COULD_OF"));

        let rule = default_rules().unwrap().iter().find(|r| r.sub_id().is_some()).unwrap();
        let options = Options::default().disable(rule.full_id());
        assert!(options.is_disabled(rule));
        assert!(!Options::default().is_disabled(rule));
    }

    #[test]
    fn other_languages_are_gated() {
        let ctx = Context::for_language(Language::new("de-DE").unwrap());
        let res = check_verbose_with(&parse("He could of gone ."), &ctx, &Options::default());
        assert!(res.matches.is_empty());
        assert_eq!(res.details.rules_gated_language, res.details.rules_total);
    }
}
