//! Engine run metrics.
//!
//! This module defines a small set of structs used to observe and debug the
//! checker's behavior on one sentence.
//!
//! The intended usage is:
//!
//! - `Checker::check` always fills the counters in [`RunMetrics`].
//! - Per-rule timings are only collected when `debug` logging is enabled for
//!   this crate, so the hot path does not pay for `Instant::now()` per rule.
//!
//! ## Counter semantics
//!
//! ```text
//! rules_total = rules_active + rules_gated_language + rules_gated_words + rules_disabled
//! candidates  = raw matches of active rules + suppressed
//! suppressed  = start positions that only match through anti-pattern tokens
//! filtered    = candidates rejected by a rule filter
//! ```

use crate::api::RuleMatch;
use crate::error::CheckError;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for `Checker::check`.
    pub total: Duration,
    pub rules_total: usize,
    /// Rules that passed every gate and were matched.
    pub rules_active: usize,
    pub rules_gated_language: usize,
    /// Rules skipped because a required word is missing from the sentence.
    pub rules_gated_words: usize,
    pub rules_disabled: usize,
    pub candidates: usize,
    pub suppressed: usize,
    pub filtered: usize,
    /// Per-rule timings (debug logging only).
    pub per_rule: Vec<RuleTiming>,
}

/// Time spent on one active rule.
#[derive(Debug, Clone)]
pub struct RuleTiming {
    pub rule: String,
    pub duration: Duration,
    pub candidates: usize,
    pub reported: usize,
}

/// Checker output bundled with counters and timings.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Final matches, sorted by (start, end, full id).
    pub matches: Vec<RuleMatch>,
    /// Per-rule failures; each failed rule is skipped for this sentence.
    pub errors: Vec<CheckError>,
    pub metrics: RunMetrics,
}
