//! Deduplication keys for reported matches.
//!
//! A rule group may contain near-identical members, and the whole-sentence
//! regex of one rule may overlap the token sequence of another. Reporting the
//! same problem twice is noise, so the checker keeps one match per key.
//!
//! ## What counts as "the same match"
//!
//! - Full rule id (`ID` or `ID[SUB]`)
//! - Reported token span (`from_token`, `to_token`), after position correction
//!
//! Messages are not part of the key: two matches of the same rule on the same
//! span are duplicates even if a filter rewrote one of them.

use crate::api::RuleMatch;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MatchKey {
    pub(crate) full_id: String,
    pub(crate) from_token: usize,
    pub(crate) to_token: usize,
}

impl MatchKey {
    pub(crate) fn from_match(m: &RuleMatch) -> Self {
        MatchKey { full_id: m.full_id.clone(), from_token: m.from_token, to_token: m.to_token }
    }
}
