use crate::engine::Checker;
use crate::rules::en;
use crate::{Context, Identifiable, Language, Options, PatternRule, PatternToken, TaggedSentence};

fn check(rules: &[PatternRule], input: &str) -> Vec<crate::RuleMatch> {
    let sentence = TaggedSentence::parse(input).unwrap();
    let run = Checker::new(rules).check(&sentence, &Context::default(), &Options::default());
    assert!(run.errors.is_empty(), "errors for '{}': {:?}", input, run.errors);
    run.matches
}

#[test]
fn english_examples_matching() {
    // (full id, input, reported text, suggestions)
    let cases: Vec<(&str, &str, &str, Vec<&str>)> = vec![
        ("EN_A_VS_AN", "It is a apple .", "a", vec!["an"]),
        ("EN_A_VS_AN", "A apple fell .", "A", vec!["An"]),
        ("EN_A_VS_AN", "She ate a orange/NN .", "a", vec!["an"]),
        ("COULD_OF", "I could of gone .", "could of", vec!["could have"]),
        ("COULD_OF", "You Should of asked .", "Should of", vec!["Should have"]),
        ("EN_DET_NOUN_AGREEMENT", "I like these/DT cat/NN .", "these cat", vec![]),
        ("EN_DET_NOUN_AGREEMENT", "Look at that/DT dogs/NNS !", "that dogs", vec![]),
        ("UPPERCASE_SENTENCE_START", "hello there .", "hello", vec!["Hello"]),
        ("ALOT", "I like it alot .", "alot", vec!["a lot"]),
        ("ALOT", "Alot of people came .", "Alot", vec!["A lot"]),
        ("MORE_COMPARATIVE", "This is more/RBR bigger/JJR .", "more bigger", vec!["bigger"]),
        ("THEN_THAN[1]", "He is taller/JJR then me .", "then", vec!["than"]),
        ("THEN_THAN[2]", "I would rather go home then stay .", "then", vec!["than"]),
        ("THEN_THAN[3]", "Nobody other then him .", "then", vec!["than"]),
    ];

    let rules = en::rules::get().unwrap();

    for (full_id, input, text, suggestions) in cases {
        let found = check(&rules, input);
        let m = found.iter().find(|m| m.full_id == full_id);
        assert!(m.is_some(), "{} did not fire on '{}' (matches: {:#?})", full_id, input, found);
        let m = m.unwrap();
        assert_eq!(m.text, text, "reported text of {} on '{}'", full_id, input);
        assert_eq!(m.suggestions, suggestions, "suggestions of {} on '{}'", full_id, input);
    }
}

#[test]
fn english_examples_not_matching() {
    // (full id that must stay silent, input)
    let cases: Vec<(&str, &str)> = vec![
        ("EN_A_VS_AN", "It is an apple ."),
        ("EN_A_VS_AN", "She studies at a university ."),
        ("EN_A_VS_AN", "It was a one time deal ."),
        ("EN_A_VS_AN", "Plug in a USB stick ."),
        ("COULD_OF", "You could , of course , go ."),
        ("COULD_OF", "You should of course ask ."),
        ("EN_DET_NOUN_AGREEMENT", "I like these/DT cats/NNS ."),
        ("EN_DET_NOUN_AGREEMENT", "I like this/DT sheep/NN|NNS ."),
        ("EN_DET_NOUN_AGREEMENT", "I know that/IN cats/NNS sleep ."),
        ("UPPERCASE_SENTENCE_START", "Hello there ."),
        ("UPPERCASE_SENTENCE_START", "iPhones are phones ."),
        ("ALOT", "I like it a lot ."),
        ("ALOT", "The allotment is big ."),
        ("MORE_COMPARATIVE", "This is more/RBR worse/JJR ."),
        ("MORE_COMPARATIVE", "This is more/RBR interesting/JJ ."),
        ("THEN_THAN[1]", "We ate and then/RB left ."),
        ("THEN_THAN[2]", "I would rather go home than stay then ."),
        ("THEN_THAN[2]", "I would rather go to the shop and then stay ."),
    ];

    let rules = en::rules::get().unwrap();

    for (full_id, input) in cases {
        let found = check(&rules, input);
        assert!(
            found.iter().all(|m| m.full_id != full_id),
            "{} unexpectedly fired on '{}' (matches: {:#?})",
            full_id,
            input,
            found
        );
    }
}

#[test]
fn built_in_rules_are_well_formed() {
    let rules = en::rules::get().unwrap();
    let ids: Vec<String> = rules.iter().map(|r| r.full_id()).collect();
    assert_eq!(
        ids,
        vec![
            "EN_A_VS_AN",
            "COULD_OF",
            "EN_DET_NOUN_AGREEMENT",
            "UPPERCASE_SENTENCE_START",
            "ALOT",
            "MORE_COMPARATIVE",
            "THEN_THAN[1]",
            "THEN_THAN[2]",
            "THEN_THAN[3]",
        ]
    );

    let by_id = |id: &str| rules.iter().find(|r| r.full_id() == id).unwrap();
    assert!(by_id("EN_DET_NOUN_AGREEMENT").needs_unification());
    assert!(by_id("MORE_COMPARATIVE").has_group_constraint());
    assert!(!by_id("MORE_COMPARATIVE").needs_unification());
    assert!(by_id("UPPERCASE_SENTENCE_START").is_sentence_start());
    assert!(!by_id("ALOT").is_sentence_start());
    assert_eq!(by_id("COULD_OF").anti_patterns().len(), 1);
    assert_eq!(by_id("THEN_THAN[2]").description(), "'rather … then' instead of 'rather … than'");
    assert_eq!(by_id("THEN_THAN[3]").description(), by_id("THEN_THAN[1]").description());
}

#[test]
fn anti_pattern_on_overlapping_span_suppresses_match() {
    // Rule matches tokens 2..=4 of "we saw the big dog today".
    let en = Language::new("en").unwrap();
    let tokens = vec![PatternToken::word("the"), PatternToken::word("big"), PatternToken::word("dog")];
    let base = PatternRule::builder().id("R").description("r").language(en.clone()).tokens(tokens);

    let overlapping = PatternRule::anti_pattern("R", en.clone(), vec![PatternToken::word("dog"), PatternToken::word("today")]).unwrap();
    let disjoint = PatternRule::anti_pattern("R", en, vec![PatternToken::word("we"), PatternToken::word("saw")]).unwrap();

    let plain = vec![base.clone().build().unwrap()];
    let found = check(&plain, "we saw the big dog today");
    assert_eq!(found.len(), 1);
    assert_eq!((found[0].from_token, found[0].to_token), (2, 4));

    let suppressed = vec![base.clone().anti_patterns(vec![overlapping]).build().unwrap()];
    assert!(check(&suppressed, "we saw the big dog today").is_empty());

    let kept = vec![base.anti_patterns(vec![disjoint]).build().unwrap()];
    assert_eq!(check(&kept, "we saw the big dog today").len(), 1);
}

#[test]
fn checker_is_shared_across_threads() {
    let rules = en::rules::get().unwrap();
    let checker = Checker::new(&rules);
    let context = Context::default();
    let inputs = ["I could of gone .", "hello there .", "It is a apple .", "He is taller/JJR then me ."];

    std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let checker = &checker;
                let context = &context;
                scope.spawn(move || {
                    let sentence = TaggedSentence::parse(input).unwrap();
                    checker.check(&sentence, context, &Options::default()).matches.len()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    });
}
