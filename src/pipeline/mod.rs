//! The two PDF compile pipelines and their shared result type.
//!
//! A pipeline succeeds only when the external tool exits zero AND the
//! expected PDF exists afterwards.
pub mod annotated;
pub mod diagnostics;
pub mod standard;

use crate::util::exit_status_string;
use anyhow::{anyhow, Context, Result};
use diagnostics::LogLine;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Standard,
    Annotated,
}

impl PipelineKind {
    pub fn label(self) -> &'static str {
        match self {
            PipelineKind::Standard => "standard build",
            PipelineKind::Annotated => "annotated build",
        }
    }
}

/// The document being compiled: a source path and its base name.
#[derive(Debug, Clone)]
pub struct BuildTarget {
    source: PathBuf,
    name: String,
}

impl BuildTarget {
    pub fn from_source(source: &Path) -> Result<Self> {
        if !source.is_file() {
            return Err(anyhow!("main source {} does not exist", source.display()));
        }
        let name = source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| anyhow!("cannot derive a job name from {}", source.display()))?
            .to_string();
        Ok(Self {
            source: source.to_path_buf(),
            name,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Base name used for the standard job and the published PDF.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name of the source, as passed to the compiler.
    pub fn file_name(&self) -> &str {
        self.source
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.name)
    }

    /// Directory the compilers run in, so relative `\input`s resolve.
    pub fn source_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn annotated_job(&self) -> String {
        format!("{}_annotated", self.name)
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub pipeline: PipelineKind,
    pub success: bool,
    /// Step that failed (`latexmk`, `pass1`, `bibtex`, `pass2`, `pass3`, `publish`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Published PDF at the repository root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blg_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_error: Option<LogLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blg_error: Option<LogLine>,
}

impl PipelineReport {
    pub fn succeeded(pipeline: PipelineKind, artifact: PathBuf) -> Self {
        Self {
            pipeline,
            success: true,
            failed_step: None,
            message: None,
            artifact: Some(artifact),
            log_path: None,
            blg_path: None,
            log_error: None,
            blg_error: None,
        }
    }

    pub fn failed(pipeline: PipelineKind, step: &str, message: String) -> Self {
        Self {
            pipeline,
            success: false,
            failed_step: Some(step.to_string()),
            message: Some(message),
            artifact: None,
            log_path: None,
            blg_path: None,
            log_error: None,
            blg_error: None,
        }
    }

    pub fn with_logs(mut self, log_path: PathBuf, blg_path: PathBuf) -> Self {
        self.log_path = Some(log_path);
        self.blg_path = Some(blg_path);
        self
    }

    /// One-line failure description naming the pipeline and step.
    pub fn failure_summary(&self) -> String {
        format!(
            "{} failed at {}: {}",
            self.pipeline.label(),
            self.failed_step.as_deref().unwrap_or("unknown step"),
            self.message.as_deref().unwrap_or("no details")
        )
    }
}

/// Run an external tool to completion and describe a non-zero exit.
///
/// Returns `Ok(None)` on success, `Ok(Some(reason))` when the tool ran but
/// failed, and `Err` only when it could not be started.
pub(crate) fn run_tool(command: &mut Command, tool: &str) -> Result<Option<String>> {
    let start = Instant::now();
    let output = command
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("spawn {tool}"))?;
    let elapsed_ms = start.elapsed().as_millis();

    tracing::info!(
        tool,
        elapsed_ms,
        exit_code = output.status.code(),
        "tool run complete"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    if let Some(last) = stdout.lines().rev().find(|line| !line.trim().is_empty()) {
        tracing::debug!(tool, last_line = last.trim(), "tool stdout");
    }

    if output.status.success() {
        return Ok(None);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr_line = stderr.trim().lines().next().unwrap_or_default();
    let mut reason = format!("{tool} failed with {}", exit_status_string(&output.status));
    if !stderr_line.is_empty() {
        reason.push_str(&format!(" ({stderr_line})"));
    }
    Ok(Some(reason))
}
