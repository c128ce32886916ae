//! Error types.
//!
//! Two families:
//!
//! - [`ConfigError`]: raised while *building* languages, sentences, token
//!   constraints and rules. Construction is all-or-nothing, so a value that
//!   exists is a valid one.
//! - [`CheckError`]: raised while *checking* a sentence with one rule. The
//!   checker collects these per rule and keeps going with the others.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("rule id cannot be empty")]
    MissingId,

    #[error("rule `{0}`: description cannot be empty")]
    MissingDescription(String),

    #[error("rule `{0}`: language must be set")]
    MissingLanguage(String),

    #[error("rule `{0}`: a token sequence or a whole-sentence regex is required")]
    MissingBody(String),

    #[error("invalid regex `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid language tag `{0}`")]
    InvalidLanguageTag(String),

    #[error("invalid token constraint: {0}")]
    InvalidToken(String),

    #[error("invalid tagged token `{0}`")]
    InvalidTaggedToken(String),

    #[error("rule group `{0}` has no rules")]
    EmptyGroup(String),
}

#[derive(Debug, Clone, Error)]
pub enum CheckError {
    #[error("rule `{rule}`: unknown filter `{filter}`")]
    UnknownFilter { rule: String, filter: String },

    #[error("rule `{rule}`: invalid filter arguments `{args}`: {reason}")]
    InvalidFilterArgs { rule: String, args: String, reason: String },

    #[error("rule `{rule}`: token reference {index} is out of range")]
    InvalidTokenRef { rule: String, index: i64 },

    #[error("rule `{rule}`: position correction {start}/{end} leaves no tokens")]
    InvalidPositionCorrection { rule: String, start: i32, end: i32 },

    #[error("rule `{rule}`: filter `{filter}` failed: {reason}")]
    FilterFailed { rule: String, filter: String, reason: String },

    #[error("rule `{rule}`: pattern search gave up after {limit} steps")]
    SearchLimit { rule: String, limit: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
