//! Matching and checking engine.
//!
//! This module is the *public entry point* for the engine. It is split into
//! focused submodules under `src/engine/` while keeping public paths stable
//! (for example `crate::engine::Checker` and `crate::engine::FilterRegistry`).
//!
//! ## How the parts work together
//!
//! Checking a tagged sentence is a pipeline:
//!
//! ```text
//! rules (all)  ──┐
//!               │  CompiledRules::new           (compiled_rules.rs)
//!               └───────────────┬──────────────
//!                               │
//! sentence ─ TriggerInfo::scan ─┼─ gate rules (language, disabled, words)
//!           (trigger.rs)        │
//!                               v
//!                     find_matches (matcher.rs)
//!                       - linear or backtracking search
//!                       - AND-groups, exceptions, unification
//!                               │
//!                               v
//!                     immunized_tokens (matcher.rs)
//!                       - anti-pattern suppression
//!                               │
//!                               v
//!                     resolve_match (resolve.rs)
//!                       - position corrections, messages
//!                               │
//!                               v
//!                     RuleFilter::accept (filter.rs)
//!                               │
//!                               v
//!                     dedup via MatchKey (dedup.rs)
//!                               │
//!                               v
//!                        Vec<RuleMatch>
//! ```
//!
//! ## Responsibilities by module
//!
//! - `compiled_rules.rs`: derives `CompiledRules` from `PatternRule`s: the
//!   matching strategy and the required words of each rule.
//! - `trigger.rs`: scans the sentence for its words.
//! - `matcher.rs`: evaluates constraint sequences and whole-sentence regexes,
//!   producing raw token matches.
//! - `checker.rs`: the runner; gating, suppression, filtering, error collection.
//! - `resolve.rs`: turns raw matches into user-facing `RuleMatch`es.
//! - `filter.rs`: the `RuleFilter` trait, argument parsing, the registry.
//! - `dedup.rs`: keys that keep one match per rule and span.
//! - `metrics.rs`: counters and optional per-rule timings.
//!
//! ## Debugging
//!
//! The engine logs through `tracing`. Set `RUST_LOG=grammatica=debug` (or
//! `GRAMMATICA_DEBUG_RULES=1` with the CLI) to see gating and match traces.

#[path = "engine/checker.rs"]
mod checker;
#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/dedup.rs"]
mod dedup;
#[path = "engine/filter.rs"]
mod filter;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/trigger.rs"]
mod trigger;

pub(crate) use checker::check_rule;
#[allow(unused_imports)]
pub use checker::Checker;
#[allow(unused_imports)]
pub use compiled_rules::{CompiledRules, RuleIndex, RuleMeta, Strategy};
#[allow(unused_imports)]
pub use filter::{FilterArgs, FilterRegistry, RegexAntiPatternFilter, RuleFilter};
#[allow(unused_imports)]
pub use metrics::{RuleTiming, RunMetrics, RunResult};
#[allow(unused_imports)]
pub use trigger::TriggerInfo;
