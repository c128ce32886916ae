//! Suggestion matches and message rendering.
//!
//! A rule's message (and its out-of-message suggestion text) is a template with
//! `\N` placeholders, where `N` is the 1-based index of a constraint in the
//! rule's sequence. Each placeholder is filled from the tokens that constraint
//! matched.
//!
//! A [`Match`] customises how one placeholder is filled: which field to pull
//! (surface, lemma, POS tag), an optional regex replacement and a case
//! conversion. Matches are positional: the k-th placeholder in a template uses
//! the k-th `Match` of the corresponding sequence, and falls back to the plain
//! surface text when there is none.
//!
//! ```text
//! message:  "Did you mean <suggestion>\1 have</suggestion>?"     matched: [could][of]
//!                                       ^^ placeholder #0 -> Match #0 (if any)
//! ```

use crate::error::{CheckError, ConfigError};
use crate::sentence::TaggedSentence;
use regex::Regex;

/// What a [`Match`] pulls out of the referenced tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncludeField {
    #[default]
    Surface,
    Lemma,
    PosTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseConversion {
    #[default]
    None,
    StartUpper,
    StartLower,
    AllUpper,
    AllLower,
    /// Follow the case of the referenced surface text.
    PreserveCase,
}

/// Declarative extractor filling one message placeholder.
#[derive(Debug, Clone)]
pub struct Match {
    token_ref: usize,
    field: IncludeField,
    case_conversion: CaseConversion,
    regex_replace: Option<(Regex, String)>,
    span_relative: bool,
}

impl Match {
    /// Extract from the tokens matched by constraint `token_ref` (1-based).
    pub fn new(token_ref: usize) -> Self {
        Match {
            token_ref,
            field: IncludeField::Surface,
            case_conversion: CaseConversion::None,
            regex_replace: None,
            span_relative: false,
        }
    }

    pub fn field(mut self, field: IncludeField) -> Self {
        self.field = field;
        self
    }

    pub fn case_conversion(mut self, conversion: CaseConversion) -> Self {
        self.case_conversion = conversion;
        self
    }

    /// Replace every match of `pattern` in the extracted text with `replacement`
    /// (`$1`-style group references allowed).
    pub fn regex_replace(mut self, pattern: &str, replacement: impl Into<String>) -> Result<Self, ConfigError> {
        let re = Regex::new(pattern)
            .map_err(|source| ConfigError::InvalidRegex { pattern: pattern.to_string(), source })?;
        self.regex_replace = Some((re, replacement.into()));
        Ok(self)
    }

    /// Count `token_ref` from the reported span start instead of the first
    /// constraint. The start position correction shifts the reference and the
    /// end position correction bounds it to the reported span.
    pub fn span_relative(mut self) -> Self {
        self.span_relative = true;
        self
    }

    pub fn token_ref(&self) -> usize {
        self.token_ref
    }

    pub fn is_span_relative(&self) -> bool {
        self.span_relative
    }

    fn render(&self, sentence: &TaggedSentence, tokens: &[usize]) -> String {
        let raw = match self.field {
            IncludeField::Surface => surface_text(sentence, tokens),
            IncludeField::Lemma => tokens
                .iter()
                .filter_map(|&i| sentence.tokens().get(i))
                .map(|t| t.lemma().unwrap_or(t.surface()))
                .collect::<Vec<_>>()
                .join(" "),
            IncludeField::PosTag => tokens
                .first()
                .and_then(|&i| sentence.tokens().get(i))
                .and_then(|t| t.pos_tag())
                .unwrap_or_default()
                .to_string(),
        };

        let replaced = match &self.regex_replace {
            Some((re, replacement)) => re.replace_all(&raw, replacement.as_str()).into_owned(),
            None => raw,
        };

        let original = surface_text(sentence, tokens);
        convert_case(&replaced, self.case_conversion, &original)
    }
}

fn surface_text(sentence: &TaggedSentence, tokens: &[usize]) -> String {
    match (tokens.first(), tokens.last()) {
        (Some(&first), Some(&last)) => sentence.covered_text(first, last),
        _ => String::new(),
    }
}

fn convert_case(text: &str, conversion: CaseConversion, original: &str) -> String {
    match conversion {
        CaseConversion::None => text.to_string(),
        CaseConversion::StartUpper => map_first(text, |c| c.to_uppercase().collect()),
        CaseConversion::StartLower => map_first(text, |c| c.to_lowercase().collect()),
        CaseConversion::AllUpper => text.to_uppercase(),
        CaseConversion::AllLower => text.to_lowercase(),
        CaseConversion::PreserveCase => {
            let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
            if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
                text.to_uppercase()
            } else if letters.first().is_some_and(|c| c.is_uppercase()) {
                map_first(text, |c| c.to_uppercase().collect())
            } else {
                map_first(text, |c| c.to_lowercase().collect())
            }
        }
    }
}

fn map_first(text: &str, f: impl Fn(char) -> String) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => f(first) + chars.as_str(),
        None => String::new(),
    }
}

/// Renders message templates for one match. Never mutates the rule.
#[derive(Debug)]
pub struct MessageFormatter<'a> {
    pub(crate) rule_id: &'a str,
    pub(crate) sentence: &'a TaggedSentence,
    /// Token indices matched by each constraint (empty for a skipped optional one).
    pub(crate) elements: &'a [Vec<usize>],
    pub(crate) start_position_correction: i32,
    pub(crate) end_position_correction: i32,
}

impl<'a> MessageFormatter<'a> {
    pub fn new(
        rule_id: &'a str,
        sentence: &'a TaggedSentence,
        elements: &'a [Vec<usize>],
        start_position_correction: i32,
        end_position_correction: i32,
    ) -> Self {
        MessageFormatter { rule_id, sentence, elements, start_position_correction, end_position_correction }
    }

    /// Substitute every `\N` placeholder of `template`, using `matches` in order.
    pub fn format(&self, template: &str, matches: &[Match]) -> Result<String, CheckError> {
        let placeholder = crate::regex!(r"\\(\d+)");
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for (k, caps) in placeholder.captures_iter(template).enumerate() {
            let Some(whole) = caps.get(0) else { continue };
            let number: i64 = caps[1].parse().unwrap_or(i64::MAX);
            out.push_str(&template[last..whole.start()]);

            let text = match matches.get(k) {
                Some(m) => m.render(self.sentence, self.element_for(m)?),
                None => surface_text(self.sentence, self.element(number)?),
            };
            out.push_str(&text);
            last = whole.end();
        }

        out.push_str(&template[last..]);
        Ok(out)
    }

    fn element_for(&self, m: &Match) -> Result<&'a [usize], CheckError> {
        if !m.span_relative {
            return self.element(m.token_ref as i64);
        }
        let index = m.token_ref as i64 + self.start_position_correction as i64;
        let span_last = self.elements.len() as i64 + self.end_position_correction as i64;
        if index > span_last {
            return Err(CheckError::InvalidTokenRef { rule: self.rule_id.to_string(), index });
        }
        self.element(index)
    }

    fn element(&self, one_based: i64) -> Result<&'a [usize], CheckError> {
        usize::try_from(one_based)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.elements.get(i))
            .map(Vec::as_slice)
            .ok_or_else(|| CheckError::InvalidTokenRef { rule: self.rule_id.to_string(), index: one_based })
    }
}

/// Contents of every `<suggestion>…</suggestion>` in `message`, in order.
pub fn extract_suggestions(message: &str) -> Vec<String> {
    crate::regex!(r"(?s)<suggestion>(.*?)</suggestion>")
        .captures_iter(message)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence() -> TaggedSentence {
        TaggedSentence::parse("He/PRP:he could/MD:could of/IN:of Gone/VBN:go ./.").unwrap()
    }

    #[test]
    fn default_placeholders_use_surface_text() {
        let s = sentence();
        let elements = vec![vec![1], vec![2]];
        let f = MessageFormatter::new("COULD_OF", &s, &elements, 0, 0);
        let msg = f.format(r"Did you mean <suggestion>\1 have</suggestion> instead of '\1 \2'?", &[]).unwrap();
        assert_eq!(msg, "Did you mean <suggestion>could have</suggestion> instead of 'could of'?");
        assert_eq!(extract_suggestions(&msg), vec!["could have"]);
    }

    #[test]
    fn matches_fill_placeholders_in_order() {
        let s = sentence();
        let elements = vec![vec![1], vec![2], vec![3]];
        let f = MessageFormatter::new("R", &s, &elements, 0, 0);
        // A then B, even though B references an earlier token than A.
        let a = Match::new(3).field(IncludeField::Lemma);
        let b = Match::new(1).case_conversion(CaseConversion::AllUpper);
        let msg = f.format(r"\3 / \1", &[a, b]).unwrap();
        assert_eq!(msg, "go / COULD");
    }

    #[test]
    fn case_conversions() {
        assert_eq!(convert_case("have", CaseConversion::StartUpper, ""), "Have");
        assert_eq!(convert_case("Have", CaseConversion::StartLower, ""), "have");
        assert_eq!(convert_case("have", CaseConversion::PreserveCase, "Gone"), "Have");
        assert_eq!(convert_case("have", CaseConversion::PreserveCase, "GONE"), "HAVE");
        assert_eq!(convert_case("Have", CaseConversion::PreserveCase, "gone"), "have");
        assert_eq!(convert_case("", CaseConversion::StartUpper, ""), "");
    }

    #[test]
    fn regex_replace_and_pos_extraction() {
        let s = sentence();
        let elements = vec![vec![3]];
        let f = MessageFormatter::new("R", &s, &elements, 0, 0);
        let m = Match::new(1).regex_replace("one$", "o").unwrap().case_conversion(CaseConversion::StartLower);
        assert_eq!(f.format(r"\1", &[m]).unwrap(), "go");
        let tag = Match::new(1).field(IncludeField::PosTag);
        assert_eq!(f.format(r"[\1]", &[tag]).unwrap(), "[VBN]");
    }

    #[test]
    fn span_relative_refs_follow_start_correction() {
        let s = sentence();
        let elements = vec![vec![0], vec![1], vec![2]];
        let f = MessageFormatter::new("R", &s, &elements, 1, 0);
        let m = Match::new(1).span_relative();
        assert_eq!(f.format(r"\1", &[m]).unwrap(), "could");
        assert_eq!(f.format(r"\1", &[]).unwrap(), "He");
    }

    #[test]
    fn span_relative_refs_stay_inside_end_correction() {
        let s = sentence();
        let elements = vec![vec![0], vec![1], vec![2]];
        let whole = MessageFormatter::new("R", &s, &elements, 1, 0);
        assert_eq!(whole.format(r"\1", &[Match::new(2).span_relative()]).unwrap(), "of");

        let trimmed = MessageFormatter::new("R", &s, &elements, 1, -1);
        assert_eq!(trimmed.format(r"\1", &[Match::new(1).span_relative()]).unwrap(), "could");
        assert!(matches!(
            trimmed.format(r"\1", &[Match::new(2).span_relative()]),
            Err(CheckError::InvalidTokenRef { index: 3, .. })
        ));
        // Absolute references ignore the corrections.
        assert_eq!(trimmed.format(r"\1", &[Match::new(3)]).unwrap(), "of");
    }

    #[test]
    fn out_of_range_reference_is_an_error() {
        let s = sentence();
        let elements = vec![vec![0]];
        let f = MessageFormatter::new("R", &s, &elements, 0, 0);
        assert!(matches!(f.format(r"\2", &[]), Err(CheckError::InvalidTokenRef { index: 2, .. })));
        assert!(matches!(f.format(r"\0", &[]), Err(CheckError::InvalidTokenRef { index: 0, .. })));
    }

    #[test]
    fn skipped_optional_element_renders_empty() {
        let s = sentence();
        let elements = vec![vec![1], vec![]];
        let f = MessageFormatter::new("R", &s, &elements, 0, 0);
        assert_eq!(f.format(r"<\1|\2>", &[]).unwrap(), "<could|>");
    }

    #[test]
    fn suggestions_are_trimmed_and_nonempty() {
        let found = extract_suggestions("Use <suggestion> an </suggestion> or <suggestion></suggestion>.");
        assert_eq!(found, vec!["an"]);
    }
}
