//! Best-effort first-error extraction from pdfTeX and BibTeX logs.
//!
//! These hints point the operator at a likely cause; they never decide
//! whether a step failed.
use serde::Serialize;
use std::fs;
use std::path::Path;

/// BibTeX messages that indicate the bibliography could not be built.
pub const BIBTEX_FATAL_PATTERNS: &[&str] = &[
    "missing a field name",
    "couldn't open database file",
    "couldn't open style file",
    "Repeated entry",
    "Illegal",
    "I found no \\citation commands",
];

/// A single log line with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub line: usize,
    pub text: String,
}

/// First line starting with `!`, pdfTeX's marker for fatal errors.
pub fn first_tex_error(log: &str) -> Option<LogLine> {
    first_line_matching(log, |line| line.starts_with('!'))
}

/// First line containing one of [`BIBTEX_FATAL_PATTERNS`].
pub fn first_bibtex_error(blg: &str) -> Option<LogLine> {
    first_line_matching(blg, |line| {
        BIBTEX_FATAL_PATTERNS
            .iter()
            .any(|pattern| line.contains(pattern))
    })
}

/// Read a log (lossily; TeX logs are not always UTF-8) and scan it.
pub fn scan_log(path: &Path, scan: fn(&str) -> Option<LogLine>) -> Option<LogLine> {
    let bytes = fs::read(path).ok()?;
    scan(&String::from_utf8_lossy(&bytes))
}

fn first_line_matching(text: &str, predicate: impl Fn(&str) -> bool) -> Option<LogLine> {
    text.lines()
        .enumerate()
        .find(|(_, line)| predicate(line))
        .map(|(idx, line)| LogLine {
            line: idx + 1,
            text: line.trim_end().to_string(),
        })
}
