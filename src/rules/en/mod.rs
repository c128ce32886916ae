//! English rules and language data.

pub(crate) mod rules;
pub(crate) mod unifier;

#[cfg(test)]
mod tests;
