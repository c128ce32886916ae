use grammatica::{CheckDetails, CheckResultVerbose, RuleMatch};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(res: &CheckResultVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Checking: \"{}\"", res.text), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Gating ━━━", ansi::GRAY));
    print_gating(&res.details, &palette);

    println!("\n{}", palette.paint("━━━ Matches ━━━", ansi::GRAY));
    if res.matches.is_empty() {
        println!("{}", palette.dim("  No problems found"));
        if res.details.suppressed > 0 || res.details.filtered > 0 {
            println!(
                "  {}",
                palette.paint(
                    format!(
                        "{} candidate(s) suppressed by anti-patterns, {} rejected by filters",
                        res.details.suppressed, res.details.filtered
                    ),
                    ansi::YELLOW
                )
            );
        }
    } else {
        for (idx, m) in res.matches.iter().enumerate() {
            print_match(idx, m, &palette);
        }
    }

    if !res.errors.is_empty() {
        println!("\n{}", palette.paint("━━━ Rule Errors ━━━", ansi::GRAY));
        for err in &res.errors {
            println!("  {} {}", palette.paint("✗", ansi::RED), err);
        }
    }

    if !res.details.per_rule.is_empty() {
        println!("\n{}", palette.paint("━━━ Rule Timings ━━━", ansi::GRAY));
        let mut timings = res.details.per_rule.clone();
        timings.sort_by(|a, b| b.duration.cmp(&a.duration));
        for t in timings.iter().take(10) {
            println!(
                "  {} {}  {} {}  {} {}",
                palette.paint(&t.rule, ansi::CYAN),
                palette.dim(format!("{:?}", t.duration)),
                palette.dim("candidates:"),
                palette.paint(t.candidates.to_string(), ansi::YELLOW),
                palette.dim("reported:"),
                palette.paint(t.reported.to_string(), ansi::YELLOW)
            );
        }
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!("  Total: {}", palette.paint(format!("{:?}", res.elapsed), ansi::GREEN));
    println!();
}

fn print_gating(details: &CheckDetails, palette: &ansi::Palette) {
    println!(
        "  {} {}  {} {}  {} {}  {} {}",
        palette.paint("active:", ansi::BLUE),
        palette.paint(format!("{}/{}", details.active_rules.len(), details.rules_total), ansi::GREEN),
        palette.dim("language:"),
        details.rules_gated_language,
        palette.dim("missing words:"),
        details.rules_gated_words,
        palette.dim("disabled:"),
        details.rules_disabled,
    );
    println!(
        "  {} {}  {} {}  {} {}",
        palette.dim("candidates:"),
        palette.paint(details.candidates.to_string(), ansi::YELLOW),
        palette.dim("suppressed:"),
        details.suppressed,
        palette.dim("filtered:"),
        details.filtered,
    );
    for id in details.active_rules.iter().take(10) {
        println!("    {}", palette.dim(id));
    }
    if details.active_rules.len() > 10 {
        println!("    {}", palette.dim(format!("... +{} more", details.active_rules.len() - 10)));
    }
}

fn print_match(idx: usize, m: &RuleMatch, palette: &ansi::Palette) {
    println!(
        "  {} {} {} {}",
        palette.paint(format!("[{}]", idx), ansi::GRAY),
        palette.bold(palette.paint(&m.text, ansi::RED)),
        palette.dim("│"),
        palette.paint(format!("chars {}..{} tokens {}..={}", m.start, m.end, m.from_token, m.to_token), ansi::YELLOW),
    );
    println!("      {} {}", palette.dim("rule:"), palette.paint(&m.full_id, ansi::CYAN));
    println!("      {} {}", palette.dim("message:"), m.message);
    if !m.suggestions.is_empty() {
        println!("      {} {}", palette.dim("suggest:"), palette.paint(m.suggestions.join(" | "), ansi::GREEN));
    }
}
