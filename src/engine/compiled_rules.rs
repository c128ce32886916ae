//! Rule compilation and indexing.
//!
//! This module holds the *static* side of the engine: metadata derived once
//! from the rule list so that checking a sentence is cheap and predictable.
//!
//! Checking is split into two phases:
//!
//! 1. **Compile/index rules** (this module): read each rule's frozen
//!    classification, pick a matching [`Strategy`], and collect the literal
//!    words the rule cannot match without.
//! 2. **Run** (see `checker.rs`): scan the sentence for its words
//!    (`trigger.rs`), select the rules whose required words are all present,
//!    then match, suppress, filter and resolve.
//!
//! ## Invariants
//!
//! - `RuleId` is an index into `CompiledRules::rules` and `CompiledRules::metas`.
//!   Those vectors stay aligned.
//! - A rule is indexed under its *first* required word only; the checker
//!   verifies the remaining ones.

use crate::pattern_token::PatternToken;
use crate::rule::{PatternRule, RuleBody, RuleClass};
use std::collections::HashMap;

/// Rule identifier (index into the rules vector).
pub(crate) type RuleId = usize;

/// How the matcher evaluates a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fixed-width sequence without groups or unification.
    Linear,
    /// Optional, repeated or skipping constraints, AND-groups or unification.
    Backtracking,
    WholeSentenceRegex,
}

impl Strategy {
    /// Pick the cheapest strategy that honours the rule's classification.
    pub fn for_rule(rule: &PatternRule) -> Strategy {
        match rule.body() {
            RuleBody::WholeSentenceRegex(_) => Strategy::WholeSentenceRegex,
            RuleBody::Tokens(tokens) => {
                let joint = rule.class().intersects(RuleClass::NEEDS_UNIFICATION | RuleClass::HAS_GROUP_CONSTRAINT);
                if joint || !tokens.iter().all(is_fixed_width) {
                    Strategy::Backtracking
                } else {
                    Strategy::Linear
                }
            }
        }
    }
}

fn is_fixed_width(token: &PatternToken) -> bool {
    token.min_occurrence() == 1 && token.max_occurrence() == Some(1) && token.skip() == 0
}

/// Metadata attached to a rule.
#[derive(Clone, Debug)]
pub struct RuleMeta {
    pub class: RuleClass,
    pub strategy: Strategy,
    /// Lowercased literal words that must all occur in a sentence.
    pub required_words: Vec<String>,
}

impl RuleMeta {
    pub fn new(rule: &PatternRule) -> Self {
        let mut required_words: Vec<String> =
            rule.pattern_tokens().unwrap_or_default().iter().filter_map(PatternToken::required_word).collect();
        required_words.dedup();

        RuleMeta { class: rule.class(), strategy: Strategy::for_rule(rule), required_words }
    }
}

#[derive(Default, Debug)]
pub struct RuleIndex {
    /// Rules without required words.
    pub always_on: Vec<RuleId>,
    /// Rules keyed by their first required word.
    pub by_word: HashMap<String, Vec<RuleId>>,
}

/// Pre-compiled rule set with metadata and indexes.
#[derive(Debug)]
pub struct CompiledRules<'a> {
    pub rules: Vec<&'a PatternRule>,
    pub metas: Vec<RuleMeta>,
    pub index: RuleIndex,
}

impl<'a> CompiledRules<'a> {
    /// Create a compiled rule set from a slice of rules.
    ///
    /// This does not copy or rewrite rules; it only reads their frozen
    /// classification and constraint sequences.
    pub fn new(rules: &'a [PatternRule]) -> Self {
        let rule_refs: Vec<&PatternRule> = rules.iter().collect();
        let metas: Vec<RuleMeta> = rule_refs.iter().map(|r| RuleMeta::new(r)).collect();

        let mut index = RuleIndex::default();
        for (id, meta) in metas.iter().enumerate() {
            match meta.required_words.first() {
                Some(word) => index.by_word.entry(word.clone()).or_default().push(id),
                None => index.always_on.push(id),
            }
        }

        CompiledRules { rules: rule_refs, metas, index }
    }
}
