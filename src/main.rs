mod debug_report;

use grammatica::{Context, Language, Options, TaggedSentence, check_verbose_with};
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::EnvFilter;

const DEFAULT_LANGUAGE: &str = "en";

fn main() {
    init_logging();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let sentence = match TaggedSentence::parse(&config.input) {
        Ok(sentence) => sentence,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let ctx = Context::for_language(config.language);
    let mut opts = Options::default();
    for id in config.disabled {
        opts = opts.disable(id);
    }
    opts.apply_anti_patterns = config.anti_patterns;

    let res = check_verbose_with(&sentence, &ctx, &opts);
    debug_report::print_run(&res, config.color);

    if !res.errors.is_empty() {
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `GRAMMATICA_DEBUG_RULES=1` turns on engine traces.
fn init_logging() {
    let fallback = if std::env::var_os("GRAMMATICA_DEBUG_RULES").is_some() { "grammatica=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

struct CliConfig {
    input: String,
    language: Language,
    disabled: Vec<String>,
    anti_patterns: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut language = parse_language(DEFAULT_LANGUAGE)?;
    let mut disabled = Vec::new();
    let mut anti_patterns = true;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("grammatica {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--no-anti-patterns" => anti_patterns = false,
            "--language" | "-l" => {
                let value = args.next().ok_or_else(|| "error: --language expects a value".to_string())?;
                language = parse_language(&value)?;
            }
            "--disable" => {
                let value = args.next().ok_or_else(|| "error: --disable expects a value".to_string())?;
                disabled.extend(split_ids(&value));
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                set_input(&mut input, value)?;
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    set_input(&mut input, rest)?;
                }
                break;
            }
            _ if arg.starts_with("--language=") => {
                language = parse_language(arg.trim_start_matches("--language="))?;
            }
            _ if arg.starts_with("--disable=") => {
                disabled.extend(split_ids(arg.trim_start_matches("--disable=")));
            }
            _ if arg.starts_with("--input=") => {
                set_input(&mut input, arg.trim_start_matches("--input=").to_string())?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                set_input(&mut input, rest)?;
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, language, disabled, anti_patterns, color })
}

fn set_input(slot: &mut Option<String>, value: String) -> Result<(), String> {
    if slot.is_some() {
        return Err("error: input provided multiple times".to_string());
    }
    *slot = Some(value);
    Ok(())
}

fn split_ids(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split(',').map(str::trim).filter(|id| !id.is_empty()).map(str::to_string)
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn parse_language(value: &str) -> Result<Language, String> {
    Language::new(value).map_err(|_| format!("error: invalid --language '{value}' (expected a tag like en or en-US)"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "grammatica {version}

Rule-based grammar checker CLI. Input is one sentence of whitespace-separated
tokens, each optionally tagged as surface/TAG or surface/TAG:lemma
(alternative readings separated by '|').

Usage:
  grammatica [OPTIONS] [--] <tokens...>
  grammatica [OPTIONS] --input <text>

Options:
  -i, --input <text>         Sentence to check. If omitted, reads remaining args
                             or stdin when no args are provided.
  -l, --language <tag>       Language of the sentence. Default: {default_language}
  --disable <ids>            Comma-separated rule ids to skip (ID or ID[SUB]).
  --no-anti-patterns         Report matches even where an anti-pattern applies.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  RUST_LOG                   tracing filter, e.g. grammatica=debug
  GRAMMATICA_DEBUG_RULES     Set to enable engine debug traces.

Exit codes:
  0  Success.
  1  One or more rules failed on the input.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        default_language = DEFAULT_LANGUAGE
    )
}
