use crate::error::ConfigError;
use crate::pattern_token::{ExceptionScope, PatternToken};
use crate::rule::{PatternRule, RuleGroup};
use crate::suggestion::{CaseConversion, Match};
use crate::unify::Unification;

const EN: &str = "en";

/// "a" before a word starting with a vowel letter, unless the vowel is
/// pronounced as a consonant (`university`, `one`) or the word is an
/// acronym read letter by letter starting with "you" (`a USB stick`).
fn rule_a_vs_an() -> Result<PatternRule, ConfigError> {
    let vowel_word = PatternToken::builder()
        .word_regex("[aeiou].*")
        .exception(ExceptionScope::Current, PatternToken::word_regex("uni.*|use.*|usu.*|uti.*|eu.*|ewe.*|one|once|ubiq.*|ur[aeiou].*")?)
        .build()?;

    rule! {
        id: "EN_A_VS_AN",
        description: "Use of 'a' vs. 'an'",
        language: EN,
        tokens: [PatternToken::word("a"), vowel_word],
        message: r"Use <suggestion>\1</suggestion> instead of '\1' before the vowel sound of '\2'.",
        suggestion_match: Match::new(1).regex_replace("(?i)^a$", "an")?.case_conversion(CaseConversion::PreserveCase),
        end_position_correction: -1,
        filter: "regex_antipattern",
        filter_arguments: r"regex:\b[Aa]\s+U[A-Z]+\b",
    }
}

/// "could of" for "could have", but not "could, of course".
fn rule_could_of() -> Result<PatternRule, ConfigError> {
    let of_course = PatternRule::anti_pattern(
        "COULD_OF",
        EN.parse()?,
        vec![PatternToken::word("of"), PatternToken::word("course")],
    )?;

    rule! {
        id: "COULD_OF",
        description: "'could of' instead of 'could have'",
        language: EN,
        tokens: [PatternToken::word_regex("could|would|should|must|might")?, PatternToken::word("of")],
        message: r"Did you mean <suggestion>\1 have</suggestion>?",
        anti_patterns: vec![of_course],
    }
}

fn rule_det_noun_agreement() -> Result<PatternRule, ConfigError> {
    let disagree = Unification::new(["number"]).negated();
    let det = PatternToken::builder().word_regex("this|that|these|those").pos("DT").unify(disagree.clone()).build()?;
    let noun = PatternToken::builder().pos("NNP?S?").unify(disagree).build()?;

    rule! {
        id: "EN_DET_NOUN_AGREEMENT",
        description: "Determiner and noun disagree in number",
        language: EN,
        tokens: [det, noun],
        message: r"The determiner '\1' does not agree in number with '\2'.",
    }
}

fn rule_uppercase_sentence_start() -> Result<PatternRule, ConfigError> {
    let lowercase_first = PatternToken::builder()
        .word_regex("[a-z].*")
        .case_sensitive()
        .sentence_start()
        .exception(ExceptionScope::Current, PatternToken::builder().word_regex("i[A-Z].*").case_sensitive().build()?)
        .build()?;

    rule! {
        id: "UPPERCASE_SENTENCE_START",
        description: "Sentence starts with a lowercase letter",
        language: EN,
        tokens: [lowercase_first],
        message: r"This sentence does not start with an uppercase letter: <suggestion>\1</suggestion>",
        suggestion_match: Match::new(1).case_conversion(CaseConversion::StartUpper),
    }
}

fn rule_alot() -> Result<PatternRule, ConfigError> {
    rule! {
        id: "ALOT",
        description: "'alot' instead of 'a lot'",
        language: EN,
        regex: r"(?i)\b(alot)\b",
        message: r"Did you mean <suggestion>\1</suggestion>?",
        suggestion_match: Match::new(1).regex_replace("(?i)alot", "a lot")?.case_conversion(CaseConversion::PreserveCase),
    }
}

/// "more bigger": a comparative already ends in -er.
fn rule_more_comparative() -> Result<PatternRule, ConfigError> {
    let comparative = PatternToken::builder().pos("JJR").and(PatternToken::word_regex(".*er")?).build()?;

    rule! {
        id: "MORE_COMPARATIVE",
        description: "'more' before a comparative adjective",
        language: EN,
        tokens: [PatternToken::word("more"), comparative],
        message: r"'\2' is already comparative; use <suggestion>\2</suggestion> alone.",
    }
}

fn group_then_than() -> Result<Vec<PatternRule>, ConfigError> {
    let message = r"Did you mean <suggestion>than</suggestion>?";
    let rather = PatternToken::builder()
        .word("rather")
        .skip(3)
        .exception(ExceptionScope::Next, PatternToken::word_regex("than|[.!?]")?)
        .build()?;

    RuleGroup::new("THEN_THAN", "'then' instead of 'than' in comparisons")
        .rule(
            PatternRule::builder()
                .language_tag(EN)
                .tokens(vec![PatternToken::pos("JJR|RBR")?, PatternToken::word("then")])
                .message(message)
                .start_position_correction(1),
        )
        .rule(
            PatternRule::builder()
                .language_tag(EN)
                .description("'rather … then' instead of 'rather … than'")
                .tokens(vec![rather, PatternToken::word("then")])
                .message(message)
                .start_position_correction(1),
        )
        .rule(
            PatternRule::builder()
                .language_tag(EN)
                .tokens(vec![PatternToken::word("other"), PatternToken::word("then")])
                .message(message)
                .start_position_correction(1),
        )
        .build()
}

/// The English rule set, in reporting order for equal spans.
pub fn get() -> Result<Vec<PatternRule>, ConfigError> {
    let mut rules = vec![
        rule_a_vs_an()?,
        rule_could_of()?,
        rule_det_noun_agreement()?,
        rule_uppercase_sentence_start()?,
        rule_alot()?,
        rule_more_comparative()?,
    ];
    rules.extend(group_then_than()?);
    Ok(rules)
}
