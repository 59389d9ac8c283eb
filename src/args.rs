//! Command-line token parsing for brief and free-text requests
//!
//! Both entry points accept `--key=value` and `--key value`. Values lose one
//! leading and one trailing quote character so that shell-quoted input such as
//! `--domain="fintech"` passed through an extra layer of quoting is normalized.

use std::collections::HashMap;
use std::fmt;

const OPTION_PREFIX: &str = "--";

/// Keys every brief request must carry, in reporting order
const REQUIRED_KEYS: [&str; 6] = ["level", "domain", "tech_focus", "stack", "duration", "count"];

/// Seniority the briefs are written for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Junior,
    Intermediate,
    Senior,
}

impl Level {
    pub const OPTIONS: [&'static str; 3] = ["junior", "intermediate", "senior"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Junior => "junior",
            Level::Intermediate => "intermediate",
            Level::Senior => "senior",
        }
    }

    /// Case-exact lookup
    fn parse(value: &str) -> Option<Self> {
        match value {
            "junior" => Some(Level::Junior),
            "intermediate" => Some(Level::Intermediate),
            "senior" => Some(Level::Senior),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of the stack the briefs concentrate on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechFocus {
    Frontend,
    Backend,
    Fullstack,
}

impl TechFocus {
    pub const OPTIONS: [&'static str; 3] = ["frontend", "backend", "fullstack"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TechFocus::Frontend => "frontend",
            TechFocus::Backend => "backend",
            TechFocus::Fullstack => "fullstack",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "frontend" => Some(TechFocus::Frontend),
            "backend" => Some(TechFocus::Backend),
            "fullstack" => Some(TechFocus::Fullstack),
            _ => None,
        }
    }
}

impl fmt::Display for TechFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated parameters of a brief request.
///
/// Only [`parse_brief_args`] constructs this type, so every instance satisfies
/// the field constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BriefConfig {
    level: Level,
    domain: String,
    tech_focus: TechFocus,
    stack: Vec<String>,
    duration: String,
    count: u32,
}

impl BriefConfig {
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn tech_focus(&self) -> TechFocus {
        self.tech_focus
    }

    /// Distinct technology names in the order given
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Parameters of a free-text request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskConfig {
    prompt: String,
    model: Option<String>,
}

impl AskConfig {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Model requested with `--model`, if any
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    /// One or more required options are absent or empty
    MissingArgument { keys: Vec<&'static str> },
    /// Value outside a fixed set of options
    InvalidEnumValue {
        key: &'static str,
        value: String,
        expected: &'static [&'static str],
    },
    /// Comma-separated list with no usable entries
    EmptyList { key: &'static str },
    /// Value is not a positive integer
    InvalidNumber { key: &'static str, value: String },
    /// Free-text prompt is blank
    EmptyPrompt,
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgError::MissingArgument { keys } => {
                write!(f, "Missing required CLI options: {}", keys.join(", "))
            }
            ArgError::InvalidEnumValue { key, value, expected } => write!(
                f,
                "Invalid {} \"{}\". Expected one of: {}",
                key,
                value,
                expected.join(", ")
            ),
            ArgError::EmptyList { key } => write!(
                f,
                "{} must contain at least one entry (comma separated).",
                key
            ),
            ArgError::InvalidNumber { key, value } => {
                write!(f, "{} must be a positive integer, got \"{}\".", key, value)
            }
            ArgError::EmptyPrompt => f.write_str("Prompt must not be empty."),
        }
    }
}

/// All validation failures found in one set of tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgsError {
    issues: Vec<ArgError>,
}

impl ArgsError {
    fn new(issues: Vec<ArgError>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[ArgError] {
        &self.issues
    }
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ArgsError {}

/// Options and positional words split out of a token list
struct Scanned {
    options: HashMap<String, String>,
    words: Vec<String>,
}

/// Split tokens into options and positional words.
///
/// `takes_value` decides whether `--key` may consume the following token as
/// its value. A following token that itself starts with `--` is never
/// consumed.
fn scan<S, F>(tokens: &[S], takes_value: F) -> Scanned
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let mut options = HashMap::new();
    let mut words = Vec::new();
    let mut iter = tokens.iter().map(AsRef::<str>::as_ref).peekable();

    while let Some(token) = iter.next() {
        let Some(body) = token.strip_prefix(OPTION_PREFIX) else {
            words.push(token.to_string());
            continue;
        };

        let (key, raw_value) = match body.split_once('=') {
            Some((key, value)) => (key, value.to_string()),
            None => {
                let has_value = takes_value(body)
                    && iter.peek().is_some_and(|next| !next.starts_with(OPTION_PREFIX));
                let value = if has_value { iter.next().unwrap_or_default() } else { "" };
                (body, value.to_string())
            }
        };

        if !key.is_empty() {
            options.insert(key.to_string(), strip_quotes(&raw_value).to_string());
        }
    }

    Scanned { options, words }
}

/// Remove one leading and one trailing quote character
fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
    value.strip_suffix(['"', '\'']).unwrap_or(value)
}

/// Split a comma-separated list, trimming entries and dropping empty and
/// repeated ones
fn split_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}

/// Strict count parsing: the whole value must be a positive `u32`, so
/// trailing garbage (`5abc`), fractions (`5.9`) and overflow are rejected
/// rather than truncated to their leading digits.
fn parse_count(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}

/// Parse the structured brief options.
///
/// Words that are not options are ignored. When any required key is missing
/// the error lists all of them; otherwise every invalid field is reported.
pub fn parse_brief_args<S: AsRef<str>>(tokens: &[S]) -> Result<BriefConfig, ArgsError> {
    let Scanned { options, .. } = scan(tokens, |_| true);

    let missing: Vec<&'static str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| options.get(*key).map_or(true, |v| v.is_empty()))
        .collect();
    if !missing.is_empty() {
        return Err(ArgsError::new(vec![ArgError::MissingArgument { keys: missing }]));
    }

    // Every required key is present past this point
    let value = |key: &str| options.get(key).map(String::as_str).unwrap_or_default();
    let mut issues = Vec::new();

    let level = Level::parse(value("level"));
    if level.is_none() {
        issues.push(ArgError::InvalidEnumValue {
            key: "level",
            value: value("level").to_string(),
            expected: &Level::OPTIONS,
        });
    }

    let tech_focus = TechFocus::parse(value("tech_focus"));
    if tech_focus.is_none() {
        issues.push(ArgError::InvalidEnumValue {
            key: "tech_focus",
            value: value("tech_focus").to_string(),
            expected: &TechFocus::OPTIONS,
        });
    }

    let stack = split_list(value("stack"));
    if stack.is_empty() {
        issues.push(ArgError::EmptyList { key: "stack" });
    }

    let count = parse_count(value("count"));
    if count.is_none() {
        issues.push(ArgError::InvalidNumber {
            key: "count",
            value: value("count").to_string(),
        });
    }

    match (level, tech_focus, count) {
        (Some(level), Some(tech_focus), Some(count)) if issues.is_empty() => Ok(BriefConfig {
            level,
            domain: value("domain").to_string(),
            tech_focus,
            stack,
            duration: value("duration").to_string(),
            count,
        }),
        _ => Err(ArgsError::new(issues)),
    }
}

/// Parse a free-text request: positional words form the prompt and
/// `--model` optionally selects the model.
pub fn parse_ask_args<S: AsRef<str>>(tokens: &[S]) -> Result<AskConfig, ArgsError> {
    let Scanned { options, words } = scan(tokens, |key| key == "model");

    let prompt = words.join(" ").trim().to_string();
    if prompt.is_empty() {
        return Err(ArgsError::new(vec![ArgError::EmptyPrompt]));
    }

    let model = options
        .get("model")
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    Ok(AskConfig { prompt, model })
}
