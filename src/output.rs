//! Operator-facing status lines.
//!
//! Status goes to stderr so `build --json` can keep stdout machine-readable.
use colored::Colorize;

/// Announce that a stage is starting.
pub fn stage(name: &str) {
    eprintln!("{} {}", "==>".cyan().bold(), name.bold());
}

pub fn ok(stage: &str, detail: &str) {
    eprintln!("{} {stage}: {detail}", "OK:".green().bold());
}

pub fn failed(stage: &str, detail: &str) {
    eprintln!("{} {stage}: {detail}", "FAILED:".red().bold());
}

pub fn warn(stage: &str, detail: &str) {
    eprintln!("{} {stage}: {detail}", "WARN:".yellow().bold());
}

/// Indented follow-up line under a status line (log paths, first error lines).
pub fn detail(label: &str, value: &str) {
    eprintln!("    {} {value}", format!("{label}:").dimmed());
}
