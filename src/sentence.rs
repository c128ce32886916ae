//! Tagged sentence model.
//!
//! The tokenizer and part-of-speech tagger live outside this crate; what they
//! hand over is a [`TaggedSentence`]: an ordered list of [`AnalyzedToken`]s,
//! each with its surface text, zero or more [`Reading`]s (lemma + POS tag) and
//! sentence-boundary flags.
//!
//! For tests and the CLI there is also a compact text format:
//!
//! ```text
//! The/DT:the cats/NNS:cat saw/VBD:see|NN:saw it/PRP ./.
//! ```
//!
//! Items are separated by whitespace. Each item is `surface` or
//! `surface/READINGS`, where READINGS is a `|`-separated list of `TAG` or
//! `TAG:lemma`.

use crate::error::ConfigError;

/// One analysis of a token: a lemma and a part-of-speech tag, both optional.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reading {
    pub lemma: Option<String>,
    pub pos_tag: Option<String>,
}

impl Reading {
    pub fn new(pos_tag: impl Into<String>, lemma: impl Into<String>) -> Self {
        Reading { lemma: Some(lemma.into()), pos_tag: Some(pos_tag.into()) }
    }

    pub fn tag(pos_tag: impl Into<String>) -> Self {
        Reading { lemma: None, pos_tag: Some(pos_tag.into()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedToken {
    surface: String,
    readings: Vec<Reading>,
    /// Character offset of the token in [`TaggedSentence::text`].
    start: usize,
    whitespace_before: bool,
    sentence_start: bool,
    sentence_end: bool,
}

impl AnalyzedToken {
    /// A token with no readings. Offsets and boundary flags are assigned when
    /// the token is placed into a [`TaggedSentence`].
    pub fn new(surface: impl Into<String>) -> Self {
        let surface = surface.into();
        let whitespace_before = !is_closing_punctuation(&surface);
        AnalyzedToken {
            surface,
            readings: Vec::new(),
            start: 0,
            whitespace_before,
            sentence_start: false,
            sentence_end: false,
        }
    }

    pub fn with_reading(mut self, reading: Reading) -> Self {
        self.readings.push(reading);
        self
    }

    pub fn with_tag(self, pos_tag: &str, lemma: &str) -> Self {
        self.with_reading(Reading::new(pos_tag, lemma))
    }

    /// Render this token glued to the previous one.
    pub fn no_space_before(mut self) -> Self {
        self.whitespace_before = false;
        self
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Character offset one past the end of the token.
    pub fn end(&self) -> usize {
        self.start + self.surface.chars().count()
    }

    pub fn is_whitespace_before(&self) -> bool {
        self.whitespace_before
    }

    pub fn is_sentence_start(&self) -> bool {
        self.sentence_start
    }

    pub fn is_sentence_end(&self) -> bool {
        self.sentence_end
    }

    /// First lemma among the readings, if any.
    pub fn lemma(&self) -> Option<&str> {
        self.readings.iter().find_map(|r| r.lemma.as_deref())
    }

    /// First POS tag among the readings, if any.
    pub fn pos_tag(&self) -> Option<&str> {
        self.readings.iter().find_map(|r| r.pos_tag.as_deref())
    }

    pub fn has_pos_tag(&self, tag: &str) -> bool {
        self.readings.iter().any(|r| r.pos_tag.as_deref() == Some(tag))
    }

    /// Parse one item of the compact text format.
    fn parse_item(item: &str) -> Result<Self, ConfigError> {
        // Readings never contain `/`, so the last slash separates them.
        let (surface, readings) = match item.rsplit_once('/') {
            Some((surface, readings)) if !surface.is_empty() => (surface, Some(readings)),
            _ => (item, None),
        };

        let mut token = AnalyzedToken::new(surface);
        if let Some(readings) = readings {
            for reading in readings.split('|') {
                let reading = match reading.split_once(':') {
                    Some((tag, lemma)) if !tag.is_empty() && !lemma.is_empty() => Reading::new(tag, lemma),
                    None if !reading.is_empty() => Reading::tag(reading),
                    _ => return Err(ConfigError::InvalidTaggedToken(item.to_string())),
                };
                token.readings.push(reading);
            }
        }
        Ok(token)
    }
}

/// An ordered sequence of analyzed tokens plus its rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSentence {
    tokens: Vec<AnalyzedToken>,
    text: String,
}

impl TaggedSentence {
    /// Build a sentence from tokens, assigning offsets and boundary flags.
    pub fn new(mut tokens: Vec<AnalyzedToken>) -> Self {
        let mut text = String::new();
        let mut offset = 0;
        let last = tokens.len().saturating_sub(1);

        for (idx, token) in tokens.iter_mut().enumerate() {
            if idx > 0 && token.whitespace_before {
                text.push(' ');
                offset += 1;
            }
            token.start = offset;
            token.sentence_start = idx == 0;
            token.sentence_end = idx == last;
            text.push_str(&token.surface);
            offset += token.surface.chars().count();
        }

        TaggedSentence { tokens, text }
    }

    /// Parse the compact `surface/TAG:lemma` format (see module docs).
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let tokens = input.split_whitespace().map(AnalyzedToken::parse_item).collect::<Result<Vec<_>, _>>()?;
        Ok(TaggedSentence::new(tokens))
    }

    pub fn tokens(&self) -> &[AnalyzedToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The rendered sentence text that character offsets refer to.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text covered by tokens `from..=to`.
    pub fn covered_text(&self, from: usize, to: usize) -> String {
        match (self.tokens.get(from), self.tokens.get(to)) {
            (Some(first), Some(last)) if from <= to => {
                self.text.chars().skip(first.start).take(last.end() - first.start).collect()
            }
            _ => String::new(),
        }
    }

    /// Index of the token that contains character offset `offset`, or the
    /// first token starting after it.
    pub(crate) fn token_at_char(&self, offset: usize) -> Option<usize> {
        self.tokens.iter().position(|t| t.end() > offset)
    }
}

fn is_closing_punctuation(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')' | ']' | '}' | '%'))
}
