use crate::error::ConfigError;
use crate::pattern_token::PatternToken;
use crate::unify::{Equivalence, UnifierConfig};

/// English unification features.
///
/// `number`: `sg` / `pl`, from determiner words and Penn Treebank noun tags.
pub fn config() -> Result<UnifierConfig, ConfigError> {
    let number = vec![
        Equivalence::new(
            "sg",
            vec![PatternToken::word_regex("this|that|a|an|one|each|every|another")?, PatternToken::pos("NNP?")?],
        ),
        Equivalence::new(
            "pl",
            vec![PatternToken::word_regex("these|those|many|several|both|few")?, PatternToken::pos("NNP?S")?],
        ),
    ];

    Ok(UnifierConfig::new().with_feature("number", number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::TaggedSentence;

    #[test]
    fn number_types() {
        let config = config().unwrap();
        let s = TaggedSentence::parse("these/DT cat/NN Smiths/NNPS sheep/NN|NNS").unwrap();
        let types = |i: usize| config.classify("number", &s.tokens()[i]).unwrap().into_iter().collect::<Vec<_>>();

        assert_eq!(types(0), vec!["pl"]);
        assert_eq!(types(1), vec!["sg"]);
        assert_eq!(types(2), vec!["pl"]);
        assert_eq!(types(3), vec!["pl", "sg"]);
    }
}
