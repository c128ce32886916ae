//! Natural-language tags.
//!
//! A rule is written for one [`Language`]. A tag has a base language code and,
//! optionally, a country and a variant (`en`, `en-US`, `ca-ES-valencia`).
//!
//! Rules declared for a base language apply to all of its regional variants;
//! rules pinned to a country only apply to that exact country/variant.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    code: String,
    country: Option<String>,
    variant: Option<String>,
}

impl Language {
    /// Parse a tag such as `en`, `en-GB` or `ca-ES-valencia`.
    ///
    /// The language part is lowercased, the country uppercased. `_` is accepted
    /// as a separator as well.
    pub fn new(tag: &str) -> Result<Self, ConfigError> {
        let mut parts = tag.trim().split(['-', '_']);
        let code = parts.next().unwrap_or_default();
        if code.len() < 2 || code.len() > 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidLanguageTag(tag.to_string()));
        }

        let country = match parts.next() {
            Some(c) if !c.is_empty() && c.chars().all(|ch| ch.is_ascii_alphanumeric()) => Some(c.to_ascii_uppercase()),
            Some(_) => return Err(ConfigError::InvalidLanguageTag(tag.to_string())),
            None => None,
        };

        let variant = match parts.next() {
            Some(v) if !v.is_empty() => Some(v.to_ascii_lowercase()),
            Some(_) => return Err(ConfigError::InvalidLanguageTag(tag.to_string())),
            None => None,
        };

        if parts.next().is_some() {
            return Err(ConfigError::InvalidLanguageTag(tag.to_string()));
        }

        Ok(Language { code: code.to_ascii_lowercase(), country, variant })
    }

    /// Plain `en`, without country.
    pub fn english() -> Self {
        Language { code: "en".to_string(), country: None, variant: None }
    }

    /// Base language code, e.g. `en`.
    pub fn short_code(&self) -> &str {
        &self.code
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn has_country(&self) -> bool {
        self.country.is_some()
    }

    /// Full code including country and variant, e.g. `ca-ES-valencia`.
    pub fn full_code(&self) -> String {
        self.to_string()
    }

    /// Same base language, and, when *both* sides name a country, the same
    /// country and variant.
    ///
    /// ```text
    /// en     vs en-US  -> true
    /// en-US  vs en     -> true
    /// en-US  vs en-GB  -> false
    /// en-US  vs de     -> false
    /// ```
    pub fn equals_consider_variants_if_specified(&self, other: &Language) -> bool {
        if self.code != other.code {
            return false;
        }
        if self.has_country() && other.has_country() {
            return self.country == other.country && self.variant == other.variant;
        }
        true
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::new(s)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(country) = &self.country {
            write!(f, "-{}", country)?;
        }
        if let Some(variant) = &self.variant {
            write!(f, "-{}", variant)?;
        }
        Ok(())
    }
}
