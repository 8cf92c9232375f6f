//! Build orchestration: preflight, source resolution, clean, contract
//! snapshot, then the standard and annotated pipelines.
//!
//! Stages run strictly in order and the first failure ends the run. The
//! contract snapshot is advisory: its failure is reported but never stops
//! compilation.
use crate::clean::clean_build_outputs;
use crate::config::BuildConfig;
use crate::contract::{self, find_main_source};
use crate::extract::PatternExtractor;
use crate::output;
use crate::pipeline::annotated::run_annotated;
use crate::pipeline::standard::run_standard;
use crate::pipeline::{BuildTarget, PipelineReport};
use crate::toolchain::{SearchPath, Toolchain};
use crate::util::display_path;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preflight,
    Source,
    Clean,
    Contract,
    Standard,
    Annotated,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Preflight => "preflight",
            Stage::Source => "source",
            Stage::Clean => "clean",
            Stage::Contract => "contract",
            Stage::Standard => "standard build",
            Stage::Annotated => "annotated build",
        }
    }
}

/// Machine-readable record of a `build` run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildSummary {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_report: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub pipelines: Vec<PipelineReport>,
}

impl BuildSummary {
    fn fail(mut self, stage: Stage, error: String) -> Self {
        output::failed(stage.label(), &error);
        tracing::error!(stage = stage.label(), %error, "build stage failed");
        self.success = false;
        self.failed_stage = Some(stage);
        self.error = Some(error);
        self
    }

    fn fail_pipeline(mut self, stage: Stage, report: PipelineReport) -> Self {
        let error = report.failure_summary();
        output::failed(stage.label(), &error);
        if let Some(path) = &report.log_path {
            output::detail("log", &path.display().to_string());
        }
        if let Some(path) = &report.blg_path {
            output::detail("bibtex log", &path.display().to_string());
        }
        if let Some(line) = &report.log_error {
            output::detail(&format!("log line {}", line.line), &line.text);
        }
        if let Some(line) = &report.blg_error {
            output::detail(&format!("bibtex log line {}", line.line), &line.text);
        }
        tracing::error!(stage = stage.label(), %error, "build stage failed");
        self.pipelines.push(report);
        self.success = false;
        self.failed_stage = Some(stage);
        self.error = Some(error);
        self
    }
}

/// Run the whole orchestration. Failures are recorded in the summary rather
/// than returned, so callers can always print it.
pub fn run_build(config: &BuildConfig, search: &SearchPath) -> BuildSummary {
    let summary = BuildSummary::default();
    let root = config.paths.root();

    output::stage(Stage::Preflight.label());
    tracing::debug!(entries = search.dirs().len(), "tool search path assembled");
    let toolchain = match Toolchain::resolve(&config.tools, search) {
        Ok(toolchain) => toolchain,
        Err(err) => return summary.fail(Stage::Preflight, format!("{err:#}")),
    };
    output::ok(Stage::Preflight.label(), "latexmk, pdflatex and bibtex found");

    let source = match &config.source {
        Some(source) => Ok(source.clone()),
        None => find_main_source(root),
    };
    let target = match source.and_then(|source| BuildTarget::from_source(&source)) {
        Ok(target) => target,
        Err(err) => return summary.fail(Stage::Source, format!("{err:#}")),
    };
    let mut summary = BuildSummary {
        source: Some(target.source().to_path_buf()),
        ..summary
    };
    output::ok(
        Stage::Source.label(),
        &display_path(target.source(), Some(root)),
    );

    if config.clean {
        output::stage(Stage::Clean.label());
        match clean_build_outputs(&config.paths) {
            Ok(removed) => output::ok(
                Stage::Clean.label(),
                &format!("removed {} director(ies)", removed.len()),
            ),
            Err(err) => return summary.fail(Stage::Clean, format!("{err:#}")),
        }
    }

    output::stage(Stage::Contract.label());
    match contract::write_report(
        &config.paths,
        Some(target.source()),
        &PatternExtractor,
        config.clean,
    ) {
        Ok(written) => {
            output::ok(
                Stage::Contract.label(),
                &display_path(&written.path, Some(root)),
            );
            for warning in written.snapshot.warnings() {
                output::warn(Stage::Contract.label(), &warning);
                summary.warnings.push(warning);
            }
            summary.contract_report = Some(written.path);
        }
        Err(err) => {
            let warning = format!("contract snapshot skipped: {err:#}");
            output::warn(Stage::Contract.label(), &warning);
            tracing::warn!(%warning, "contract snapshot failed");
            summary.warnings.push(warning);
        }
    }

    output::stage(Stage::Standard.label());
    match run_standard(&toolchain, &target, &config.paths) {
        Ok(report) if report.success => {
            output::ok(Stage::Standard.label(), &artifact_label(&report, config));
            summary.pipelines.push(report);
        }
        Ok(report) => return summary.fail_pipeline(Stage::Standard, report),
        Err(err) => return summary.fail(Stage::Standard, format!("{err:#}")),
    }

    output::stage(Stage::Annotated.label());
    match run_annotated(&toolchain, &target, &config.paths, &config.annotated) {
        Ok(report) if report.success => {
            output::ok(Stage::Annotated.label(), &artifact_label(&report, config));
            summary.pipelines.push(report);
        }
        Ok(report) => {
            output::warn(
                Stage::Annotated.label(),
                "standard build completed before this failure",
            );
            return summary.fail_pipeline(Stage::Annotated, report);
        }
        Err(err) => return summary.fail(Stage::Annotated, format!("{err:#}")),
    }

    summary.success = true;
    summary
}

fn artifact_label(report: &PipelineReport, config: &BuildConfig) -> String {
    report
        .artifact
        .as_deref()
        .map(|path| display_path(path, Some(config.paths.root())))
        .unwrap_or_default()
}
