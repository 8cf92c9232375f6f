//! Best-effort field extraction from TeX source.
//!
//! This is pattern matching, not a TeX parser: each field is the first match
//! of a regex over comment-stripped text, with braced arguments closed by
//! depth counting so nesting is unbounded. Callers go through
//! [`FieldExtractor`] so the matching strategy can change without touching
//! orchestration.
use regex::Regex;
use std::sync::LazyLock;

// Command prefixes end at the opening brace; the argument is closed by
// `braced_argument`.
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\title\s*(?:\[[^\]]*\])?\s*\{").expect("valid title regex")
});

static ABSTRACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\\begin\{abstract\}(.*?)\\end\{abstract\}").expect("valid abstract regex")
});

static KEYWORDS_ENV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\\begin\{keywords\}(.*?)\\end\{keywords\}").expect("valid keywords regex")
});

static KEYWORDS_CMD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\keywords\s*\{").expect("valid keywords regex")
});

static INCLUSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(?:input|include)\s*\{([^{}]+)\}").expect("valid inclusion regex")
});

/// Front-matter fields pulled from the main source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Abstract,
    Keywords,
}

impl Field {
    pub fn heading(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Abstract => "Abstract",
            Field::Keywords => "Keywords",
        }
    }
}

pub trait FieldExtractor {
    /// Return the field's trimmed value, or `None` when absent or empty.
    fn extract(&self, source: &str, field: Field) -> Option<String>;
}

/// Regex-backed extractor. Expects comment-stripped input.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl FieldExtractor for PatternExtractor {
    fn extract(&self, source: &str, field: Field) -> Option<String> {
        match field {
            Field::Title => first_argument(&TITLE_RE, source),
            Field::Abstract => first_capture(&ABSTRACT_RE, source),
            Field::Keywords => first_capture(&KEYWORDS_ENV_RE, source)
                .or_else(|| first_argument(&KEYWORDS_CMD_RE, source)),
        }
    }
}

fn first_capture(re: &Regex, source: &str) -> Option<String> {
    non_empty(re.captures(source)?.get(1)?.as_str())
}

/// Value of the first balanced argument following a `prefix` match.
fn first_argument(prefix: &Regex, source: &str) -> Option<String> {
    prefix
        .find_iter(source)
        .find_map(|m| braced_argument(&source[m.end()..]))
        .and_then(non_empty)
}

/// Text up to the `}` closing an argument whose `{` was just consumed.
/// Escaped braces (`\{`, `\}`) do not count toward depth.
fn braced_argument(rest: &str) -> Option<&str> {
    let mut depth = 1usize;
    let mut escaped = false;
    for (idx, ch) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Drop line comments: everything from the first `%` not preceded by `\`.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(strip_line_comment(line));
        out.push('\n');
    }
    out
}

fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b'%' && (idx == 0 || bytes[idx - 1] != b'\\') {
            return &line[..idx];
        }
    }
    line
}

/// Arguments of every `\input{...}` and `\include{...}`, in source order.
pub fn inclusion_targets(source: &str) -> Vec<String> {
    INCLUSION_RE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|target| !target.is_empty())
        .collect()
}
