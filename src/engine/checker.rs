//! Rule runner.
//!
//! The checker applies a compiled rule set to one tagged sentence at a time.
//! It owns no per-sentence state, so one `Checker` can serve many threads.
//!
//! ## Per-sentence flow
//!
//! ```text
//! (0) trigger scan         -> lowercased words of the sentence
//! (1) gate each rule       -> language, disabled ids, required words
//! (2) immunize             -> tokens covered by anti-pattern matches
//! (3) match                -> RawMatch per occurrence, around them (matcher.rs)
//! (4) resolve              -> corrected span, message, suggestions (resolve.rs)
//! (5) filter               -> named RuleFilter may reject or rewrite (filter.rs)
//! (6) dedup + sort         -> one match per (full id, span)          (dedup.rs)
//! ```
//!
//! A rule that fails in (2) to (5) contributes a `CheckError` and no matches;
//! the remaining rules are unaffected.
//!
//! ## Debugging
//!
//! Gating and per-rule outcomes are logged at `debug`; raw matches at `trace`.

use super::compiled_rules::{CompiledRules, RuleId, Strategy};
use super::dedup::MatchKey;
use super::filter::FilterArgs;
use super::matcher::{find_matches, immunized_tokens};
use super::metrics::{RuleTiming, RunMetrics, RunResult};
use super::resolve::resolve_match;
use super::trigger::TriggerInfo;
use crate::api::{Context, Options, RuleMatch};
use crate::error::CheckError;
use crate::rule::{Identifiable, Matchable, PatternRule};
use crate::sentence::TaggedSentence;
use std::collections::HashSet;
use std::time::Instant;

/// Why a rule was (not) run on a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Active,
    Language,
    Disabled,
    MissingWord,
}

/// Candidate counts for one rule on one sentence.
#[derive(Debug, Default)]
struct Tally {
    candidates: usize,
    suppressed: usize,
    filtered: usize,
}

/// Applies a rule set to tagged sentences.
///
/// Usage: create with `Checker::new(&rules)` then call `check(sentence, context, options)`.
#[derive(Debug)]
pub struct Checker<'a> {
    compiled: CompiledRules<'a>,
}

impl<'a> Checker<'a> {
    pub fn new(rules: &'a [PatternRule]) -> Self {
        Self::new_compiled(CompiledRules::new(rules))
    }

    /// Create a checker from a pre-compiled rule set.
    pub fn new_compiled(compiled: CompiledRules<'a>) -> Self {
        Checker { compiled }
    }

    pub fn rules(&self) -> &[&'a PatternRule] {
        &self.compiled.rules
    }

    /// Full ids of the rules that pass every gate for `sentence`.
    pub fn active_rule_ids(&self, sentence: &TaggedSentence, context: &Context, options: &Options) -> Vec<String> {
        let trigger = TriggerInfo::scan(sentence);
        (0..self.compiled.rules.len())
            .filter(|&id| self.gate(id, &trigger, context, options) == Gate::Active)
            .map(|id| self.compiled.rules[id].full_id())
            .collect()
    }

    fn gate(&self, id: RuleId, trigger: &TriggerInfo, context: &Context, options: &Options) -> Gate {
        let rule = self.compiled.rules[id];
        if !rule.supports_language(&context.language) {
            Gate::Language
        } else if options.is_disabled(rule) {
            Gate::Disabled
        } else if !trigger.contains_all(&self.compiled.metas[id].required_words) {
            Gate::MissingWord
        } else {
            Gate::Active
        }
    }

    /// Check one sentence with every applicable rule.
    pub fn check(&self, sentence: &TaggedSentence, context: &Context, options: &Options) -> RunResult {
        let started = Instant::now();
        let trigger = TriggerInfo::scan(sentence);
        let timed = tracing::enabled!(tracing::Level::DEBUG);

        tracing::debug!("[trigger_scan] words={:?}", trigger.words);

        let mut metrics = RunMetrics { rules_total: self.compiled.rules.len(), ..RunMetrics::default() };
        let mut matches: Vec<RuleMatch> = Vec::new();
        let mut errors: Vec<CheckError> = Vec::new();

        for (id, rule) in self.compiled.rules.iter().enumerate() {
            match self.gate(id, &trigger, context, options) {
                Gate::Language => {
                    metrics.rules_gated_language += 1;
                    continue;
                }
                Gate::Disabled => {
                    metrics.rules_disabled += 1;
                    continue;
                }
                Gate::MissingWord => {
                    metrics.rules_gated_words += 1;
                    continue;
                }
                Gate::Active => metrics.rules_active += 1,
            }

            let rule_started = timed.then(Instant::now);
            let mut tally = Tally::default();
            let outcome = evaluate(rule, self.compiled.metas[id].strategy, sentence, context, options, &mut tally);

            metrics.candidates += tally.candidates;
            metrics.suppressed += tally.suppressed;
            metrics.filtered += tally.filtered;

            let reported = match outcome {
                Ok(found) => {
                    let n = found.len();
                    matches.extend(found);
                    n
                }
                Err(err) => {
                    tracing::warn!("[rule:error] id=\"{}\" {}", rule.full_id(), err);
                    errors.push(err);
                    0
                }
            };

            if let Some(t) = rule_started {
                metrics.per_rule.push(RuleTiming {
                    rule: rule.full_id(),
                    duration: t.elapsed(),
                    candidates: tally.candidates,
                    reported,
                });
            }
        }

        let matches = dedup_sorted(matches);

        tracing::debug!(
            "[active_rules] {}/{} rules active (language: {}, disabled: {}, words: {}) -> {} matches",
            metrics.rules_active,
            metrics.rules_total,
            metrics.rules_gated_language,
            metrics.rules_disabled,
            metrics.rules_gated_words,
            matches.len()
        );

        metrics.total = started.elapsed();
        RunResult { matches, errors, metrics }
    }
}

/// Match, suppress, resolve and filter one rule.
fn evaluate(
    rule: &PatternRule,
    strategy: Strategy,
    sentence: &TaggedSentence,
    context: &Context,
    options: &Options,
    tally: &mut Tally,
) -> Result<Vec<RuleMatch>, CheckError> {
    let immunized = if options.apply_anti_patterns && !rule.anti_patterns().is_empty() {
        Some(immunized_tokens(rule.anti_patterns(), sentence, &context.unifier)?)
    } else {
        None
    };

    let found = find_matches(rule, strategy, sentence, &context.unifier, immunized.as_deref())?;
    tally.candidates = found.matches.len() + found.suppressed;
    tally.suppressed = found.suppressed;
    let raw = found.matches;
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let filter = match rule.filter() {
        Some(name) if !raw.is_empty() => {
            let filter = context
                .filters
                .get(name)
                .ok_or_else(|| CheckError::UnknownFilter { rule: rule.full_id(), filter: name.to_string() })?;
            Some((name, filter))
        }
        _ => None,
    };

    let mut out = Vec::with_capacity(raw.len());
    for m in &raw {
        let resolved = resolve_match(rule, sentence, m)?;
        let Some((name, filter)) = filter else {
            out.push(resolved);
            continue;
        };

        let raw_args = rule.filter_arguments().unwrap_or_default();
        let args = FilterArgs::parse(raw_args, sentence, &m.elements).map_err(|reason| {
            CheckError::InvalidFilterArgs { rule: rule.full_id(), args: raw_args.to_string(), reason }
        })?;
        let accepted = filter.accept(resolved, &args, sentence).map_err(|reason| CheckError::FilterFailed {
            rule: rule.full_id(),
            filter: name.to_string(),
            reason,
        })?;
        match accepted {
            Some(kept) => out.push(kept),
            None => tally.filtered += 1,
        }
    }
    Ok(out)
}

fn dedup_sorted(matches: Vec<RuleMatch>) -> Vec<RuleMatch> {
    let mut seen = HashSet::new();
    let mut out: Vec<RuleMatch> = matches.into_iter().filter(|m| seen.insert(MatchKey::from_match(m))).collect();
    out.sort_by(|a, b| (a.start, a.end, &a.full_id).cmp(&(b.start, b.end, &b.full_id)));
    out
}

/// Matches of a single rule, without language or word gating.
pub(crate) fn check_rule(
    rule: &PatternRule,
    sentence: &TaggedSentence,
    context: &Context,
    options: &Options,
) -> Result<Vec<RuleMatch>, CheckError> {
    let mut tally = Tally::default();
    let found = evaluate(rule, Strategy::for_rule(rule), sentence, context, options, &mut tally)?;
    Ok(dedup_sorted(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Context;
    use crate::engine::{FilterRegistry, RuleFilter};
    use crate::language::Language;
    use crate::pattern_token::PatternToken;
    use std::sync::Arc;

    fn en() -> Language {
        Language::new("en").unwrap()
    }

    fn could_of() -> PatternRule {
        PatternRule::builder()
            .id("COULD_OF")
            .description("could of")
            .language(en())
            .tokens(vec![PatternToken::word("could"), PatternToken::word("of")])
            .message(r"Did you mean <suggestion>\1 have</suggestion>?")
            .anti_patterns(vec![
                PatternRule::anti_pattern("COULD_OF", en(), vec![PatternToken::word("of"), PatternToken::word("course")])
                    .unwrap(),
            ])
            .build()
            .unwrap()
    }

    fn parse(text: &str) -> TaggedSentence {
        TaggedSentence::parse(text).unwrap()
    }

    #[test]
    fn anti_pattern_overlap_suppresses_and_disjoint_does_not() {
        let rules = vec![could_of()];
        let checker = Checker::new(&rules);
        let ctx = Context::default();

        let hit = checker.check(&parse("I could of gone ."), &ctx, &Options::default());
        assert_eq!(hit.matches.len(), 1);
        assert_eq!(hit.matches[0].suggestions, vec!["could have"]);

        let suppressed = checker.check(&parse("I could of course go ."), &ctx, &Options::default());
        assert!(suppressed.matches.is_empty());
        assert_eq!(suppressed.metrics.candidates, 1);
        assert_eq!(suppressed.metrics.suppressed, 1);

        let disjoint = checker.check(&parse("I could of gone , of course ."), &ctx, &Options::default());
        assert_eq!(disjoint.matches.len(), 1);

        let diagnose = Options { apply_anti_patterns: false, ..Options::default() };
        assert_eq!(checker.check(&parse("I could of course go ."), &ctx, &diagnose).matches.len(), 1);
    }

    #[test]
    fn suppressed_candidate_leaves_later_match_reportable() {
        let rather = PatternToken::builder().word("rather").skip(-1).build().unwrap();
        let rule = PatternRule::builder()
            .id("RATHER_THEN")
            .description("rather then")
            .language(en())
            .tokens(vec![rather, PatternToken::word("then")])
            .message("Did you mean <suggestion>rather than</suggestion>?")
            .anti_patterns(vec![
                PatternRule::anti_pattern("RATHER_THEN", en(), vec![PatternToken::word("rather"), PatternToken::word("soon")])
                    .unwrap(),
            ])
            .build()
            .unwrap();
        let rules = vec![rule];
        let checker = Checker::new(&rules);

        let run = checker.check(&parse("rather soon rather then"), &Context::default(), &Options::default());
        assert!(run.errors.is_empty());
        assert_eq!(run.matches.len(), 1);
        assert_eq!((run.matches[0].from_token, run.matches[0].to_token), (2, 3));
        assert_eq!(run.metrics.candidates, 2);
        assert_eq!(run.metrics.suppressed, 1);
    }

    #[test]
    fn gates_are_counted() {
        let de = PatternRule::builder().id("DE").description("de").language_tag("de").regex("x").build().unwrap();
        let rules = vec![could_of(), de];
        let checker = Checker::new(&rules);
        let ctx = Context::default();

        let run = checker.check(&parse("nothing here"), &ctx, &Options::default());
        assert_eq!(run.metrics.rules_total, 2);
        assert_eq!(run.metrics.rules_gated_language, 1);
        assert_eq!(run.metrics.rules_gated_words, 1);
        assert_eq!(run.metrics.rules_active, 0);

        let mut options = Options::default();
        options.disabled_rules.insert("COULD_OF".into());
        let run = checker.check(&parse("could of"), &ctx, &options);
        assert_eq!(run.metrics.rules_disabled, 1);
        assert!(run.matches.is_empty());
        assert!(checker.active_rule_ids(&parse("could of"), &ctx, &Options::default()).contains(&"COULD_OF".into()));
    }

    #[test]
    fn failing_rule_does_not_block_others() {
        let broken = could_of().into_builder().id("BROKEN").filter("no_such_filter").build().unwrap();
        let rules = vec![broken, could_of()];
        let checker = Checker::new(&rules);

        let run = checker.check(&parse("could of"), &Context::default(), &Options::default());
        assert_eq!(run.matches.len(), 1);
        assert_eq!(run.matches[0].full_id, "COULD_OF");
        assert!(matches!(&run.errors[..], [CheckError::UnknownFilter { filter, .. }] if filter == "no_such_filter"));
    }

    #[derive(Debug)]
    struct Shout;

    impl RuleFilter for Shout {
        fn accept(
            &self,
            mut rule_match: RuleMatch,
            args: &FilterArgs,
            _sentence: &TaggedSentence,
        ) -> Result<Option<RuleMatch>, String> {
            if args.required("word")? == "would" {
                return Ok(None);
            }
            rule_match.message = rule_match.message.to_uppercase();
            Ok(Some(rule_match))
        }
    }

    #[test]
    fn custom_filter_rewrites_and_rejects() {
        let rule = PatternRule::builder()
            .id("MODAL_OF")
            .description("modal of")
            .language(en())
            .tokens(vec![PatternToken::word_regex("could|would").unwrap(), PatternToken::word("of")])
            .message("check")
            .filter("shout")
            .filter_arguments(r"word:\1")
            .build()
            .unwrap();
        let mut filters = FilterRegistry::new();
        filters.register("shout", Arc::new(Shout));
        let ctx = Context { filters: Arc::new(filters), ..Context::default() };

        let found = rule.match_sentence(&parse("could of , would of"), &ctx).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "CHECK");
        assert_eq!(found[0].text, "could of");
    }

    #[test]
    fn duplicates_are_reported_once_in_order() {
        let first = could_of();
        let same = could_of();
        let early = PatternRule::builder()
            .id("A_EARLY")
            .description("i")
            .language(en())
            .tokens(vec![PatternToken::word("I")])
            .build()
            .unwrap();
        let rules = vec![first, same, early];
        let run = Checker::new(&rules).check(&parse("I could of gone"), &Context::default(), &Options::default());
        let ids: Vec<&str> = run.matches.iter().map(|m| m.full_id.as_str()).collect();
        assert_eq!(ids, vec!["A_EARLY", "COULD_OF"]);
    }
}
