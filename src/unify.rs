//! Unification: cross-token agreement.
//!
//! A [`Unification`] attached to a [`PatternToken`] says "the token matched here
//! must agree with the other unified tokens on these features". What a feature
//! *means* is language data, held in a [`UnifierConfig`]: each feature has a
//! list of [`Equivalence`] types (for `number`: `sg`, `pl`), and each type is
//! recognised by a small set of token constraints.
//!
//! ```text
//! feature "number"
//!   sg: word /this|that|a|an/  or  pos /NN|NNP/
//!   pl: word /these|those/     or  pos /NNS|NNPS/
//!
//! "these/DT cat/NN"   these -> {pl}   cat -> {sg}   {pl} ∩ {sg} = ∅  -> no agreement
//! ```
//!
//! Agreement holds when, for every requested feature, the intersection of the
//! types of all contributing tokens is non-empty. A negated unification fires
//! on *disagreement* instead.

use crate::pattern_token::PatternToken;
use crate::sentence::AnalyzedToken;
use std::collections::{BTreeSet, HashMap};

/// The agreement test carried by a token constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unification {
    features: Vec<String>,
    negate: bool,
}

impl Unification {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Unification { features: features.into_iter().map(Into::into).collect(), negate: false }
    }

    /// Succeed when the tokens do *not* agree.
    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }
}

/// One value of a feature, e.g. `sg` for `number`.
#[derive(Debug, Clone)]
pub struct Equivalence {
    name: String,
    tokens: Vec<PatternToken>,
}

impl Equivalence {
    /// A token belongs to this type when any of `tokens` matches it.
    pub fn new(name: impl Into<String>, tokens: Vec<PatternToken>) -> Self {
        Equivalence { name: name.into(), tokens }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, token: &AnalyzedToken) -> bool {
        self.tokens.iter().any(|t| t.is_match(token))
    }
}

/// Feature definitions for one language.
#[derive(Debug, Clone, Default)]
pub struct UnifierConfig {
    features: HashMap<String, Vec<Equivalence>>,
}

impl UnifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feature(mut self, name: impl Into<String>, equivalences: Vec<Equivalence>) -> Self {
        self.features.insert(name.into(), equivalences);
        self
    }

    pub fn feature(&self, name: &str) -> Option<&[Equivalence]> {
        self.features.get(name).map(Vec::as_slice)
    }

    /// Types of `feature` that `token` belongs to; `None` for an undefined feature.
    pub fn classify(&self, feature: &str, token: &AnalyzedToken) -> Option<BTreeSet<&str>> {
        let equivalences = self.features.get(feature)?;
        Some(equivalences.iter().filter(|e| e.contains(token)).map(Equivalence::name).collect())
    }
}

/// Evaluates the unification test over the tokens of one candidate match.
///
/// Built only for rules classified as needing unification.
#[derive(Debug)]
pub(crate) struct Unifier<'c> {
    config: &'c UnifierConfig,
    /// Running intersection per feature.
    state: HashMap<&'c str, BTreeSet<&'c str>>,
    undefined_feature: bool,
    negate: bool,
}

impl<'c> Unifier<'c> {
    pub(crate) fn new(config: &'c UnifierConfig) -> Self {
        Unifier { config, state: HashMap::new(), undefined_feature: false, negate: false }
    }

    /// Feed one matched token together with the unification of its constraint.
    pub(crate) fn add(&mut self, unification: &Unification, token: &AnalyzedToken) {
        self.negate |= unification.is_negated();
        for feature in unification.features() {
            let Some((key, _)) = self.config.features.get_key_value(feature.as_str()) else {
                self.undefined_feature = true;
                continue;
            };
            let types = self.config.classify(key, token).unwrap_or_default();
            match self.state.get_mut(key.as_str()) {
                Some(current) => current.retain(|t| types.contains(t)),
                None => {
                    self.state.insert(key.as_str(), types);
                }
            }
        }
    }

    /// Whether every feature still has a common type.
    pub(crate) fn agrees(&self) -> bool {
        !self.undefined_feature && self.state.values().all(|types| !types.is_empty())
    }

    /// Final verdict, honouring negation.
    pub(crate) fn is_satisfied(&self) -> bool {
        self.agrees() != self.negate
    }
}
