/// A lazily compiled, process-wide `Regex` for a literal pattern.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declarative rule construction; expands to `PatternRule::builder()` calls
/// and evaluates to `Result<PatternRule, ConfigError>`.
///
/// Any builder method taking one argument may follow the body as
/// `method: value`.
///
/// ```
/// use grammatica::{PatternToken, rule};
///
/// let r = rule! {
///     id: "COULD_OF",
///     description: "could of -> could have",
///     language: "en",
///     tokens: [PatternToken::word("could"), PatternToken::word("of")],
///     message: r"Did you mean <suggestion>\1 have</suggestion>?",
/// }
/// .unwrap();
/// assert_eq!(r.pattern_tokens().map(<[_]>::len), Some(2));
/// ```
#[macro_export]
macro_rules! rule {
    (
        id: $id:expr,
        description: $description:expr,
        language: $language:expr,
        tokens: [ $($tok:expr),* $(,)? ]
        $(, $method:ident : $value:expr)*
        $(,)?
    ) => {{
        $crate::PatternRule::builder()
            .id($id)
            .description($description)
            .language_tag($language)
            .tokens(vec![ $($tok),* ])
            $(.$method($value))*
            .build()
    }};
    (
        id: $id:expr,
        description: $description:expr,
        language: $language:expr,
        regex: $regex:expr
        $(, $method:ident : $value:expr)*
        $(,)?
    ) => {{
        $crate::PatternRule::builder()
            .id($id)
            .description($description)
            .language_tag($language)
            .regex($regex)
            $(.$method($value))*
            .build()
    }};
}
