//! Built-in rule sets, one module per language.

pub(crate) mod en;
