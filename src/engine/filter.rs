//! Post-match rule filters.
//!
//! A rule may name a filter (`PatternRule::filter`) and carry an argument
//! string (`PatternRule::filter_arguments`). After a candidate survives the
//! anti-patterns and is resolved, the checker looks the filter up by name in
//! the [`FilterRegistry`] and lets it accept, rewrite or reject the match.
//!
//! ## Arguments
//!
//! Space-separated `key:value` pairs. A value of the form `\N` is replaced
//! with the surface text matched by constraint `N` (1-based):
//!
//! ```text
//! args:     "regex:\ban\s+hour\b  word:\2"
//! parsed:   regex -> \ban\s+hour\b
//!           word  -> <text of constraint 2>
//! ```

use crate::api::RuleMatch;
use crate::sentence::TaggedSentence;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// A named post-match hook.
pub trait RuleFilter: Send + Sync + fmt::Debug {
    /// Return the (possibly rewritten) match to keep it, `None` to reject it.
    ///
    /// `Err` reports a filter that could not run, e.g. a missing argument.
    fn accept(
        &self,
        rule_match: RuleMatch,
        args: &FilterArgs,
        sentence: &TaggedSentence,
    ) -> Result<Option<RuleMatch>, String>;
}

/// Parsed filter arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterArgs {
    values: HashMap<String, String>,
}

impl FilterArgs {
    /// Parse `raw`, resolving `\N` values against `elements`.
    pub fn parse(raw: &str, sentence: &TaggedSentence, elements: &[Vec<usize>]) -> Result<Self, String> {
        let mut values = HashMap::new();
        for pair in raw.split_whitespace() {
            let (key, value) = pair.split_once(':').ok_or_else(|| format!("`{}` is not a key:value pair", pair))?;
            if key.is_empty() {
                return Err(format!("`{}` has an empty key", pair));
            }
            let value = match value.strip_prefix('\\').map(str::parse::<usize>) {
                Some(Ok(n)) => {
                    let tokens = n
                        .checked_sub(1)
                        .and_then(|i| elements.get(i))
                        .ok_or_else(|| format!("`{}` references constraint {} out of range", pair, n))?;
                    match (tokens.first(), tokens.last()) {
                        (Some(&first), Some(&last)) => sentence.covered_text(first, last),
                        _ => String::new(),
                    }
                }
                _ => value.to_string(),
            };
            if values.insert(key.to_string(), value).is_some() {
                return Err(format!("duplicate key `{}`", key));
            }
        }
        Ok(FilterArgs { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn required(&self, key: &str) -> Result<&str, String> {
        self.get(key).ok_or_else(|| format!("missing argument `{}`", key))
    }
}

/// Filters by name. Shared through `Context` behind an `Arc`.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn RuleFilter>>,
}

impl FilterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        FilterRegistry { filters: HashMap::new() }
    }

    /// A registry holding the built-in filters.
    pub fn with_builtin() -> Self {
        let mut registry = FilterRegistry::new();
        registry.register("regex_antipattern", Arc::new(RegexAntiPatternFilter::new()));
        registry
    }

    /// Add or replace the filter registered under `name`.
    pub fn register(&mut self, name: impl Into<String>, filter: Arc<dyn RuleFilter>) {
        self.filters.insert(name.into(), filter);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RuleFilter>> {
        self.filters.get(name)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Rejects a match when `regex` matches somewhere in the sentence text
/// overlapping the match's character span.
///
/// Compiled patterns are kept for the lifetime of the filter.
#[derive(Debug, Default)]
pub struct RegexAntiPatternFilter {
    cache: Mutex<HashMap<String, Regex>>,
}

impl RegexAntiPatternFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fn compiled(&self, pattern: &str) -> Result<Regex, String> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(re) = cache.get(pattern) {
            return Ok(re.clone());
        }
        let re = Regex::new(pattern).map_err(|e| e.to_string())?;
        cache.insert(pattern.to_string(), re.clone());
        Ok(re)
    }
}

impl RuleFilter for RegexAntiPatternFilter {
    fn accept(
        &self,
        rule_match: RuleMatch,
        args: &FilterArgs,
        sentence: &TaggedSentence,
    ) -> Result<Option<RuleMatch>, String> {
        let pattern = args.required("regex")?;
        let re = self.compiled(pattern)?;
        let text = sentence.text();

        let overlaps = re.find_iter(text).any(|m| {
            let start = super::matcher::char_offset(text, m.start());
            let end = super::matcher::char_offset(text, m.end());
            start < rule_match.end && end > rule_match.start
        });

        if overlaps {
            tracing::debug!("[filter:reject] id=\"{}\" filter=regex_antipattern", rule_match.full_id);
            Ok(None)
        } else {
            Ok(Some(rule_match))
        }
    }
}
