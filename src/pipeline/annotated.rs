//! Annotated build: explicit pdflatex/bibtex passes under a separate job name
//! with the annotation macro defined ahead of the source.
//!
//! Step order is fixed: `pass1` (aux + citations), `bibtex`, then `pass2` and
//! `pass3` to settle citations and cross-references.
use super::diagnostics::{first_bibtex_error, first_tex_error, scan_log};
use super::{run_tool, BuildTarget, PipelineKind, PipelineReport};
use crate::config::{AnnotatedOptions, BIBINPUTS_ENV};
use crate::paths::RepoPaths;
use crate::toolchain::Toolchain;
use crate::util::{copy_artifact, display_path, path_to_string};
use anyhow::{Context, Result};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const KIND: PipelineKind = PipelineKind::Annotated;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Pass1,
    Bibtex,
    Pass2,
    Pass3,
}

const STEPS: [Step; 4] = [Step::Pass1, Step::Bibtex, Step::Pass2, Step::Pass3];

impl Step {
    fn name(self) -> &'static str {
        match self {
            Step::Pass1 => "pass1",
            Step::Bibtex => "bibtex",
            Step::Pass2 => "pass2",
            Step::Pass3 => "pass3",
        }
    }
}

/// Output locations for one job inside its output directory.
struct JobLayout {
    out_dir: PathBuf,
    job: String,
}

impl JobLayout {
    fn file(&self, extension: &str) -> PathBuf {
        self.out_dir.join(format!("{}.{extension}", self.job))
    }
}

pub fn run_annotated(
    toolchain: &Toolchain,
    target: &BuildTarget,
    paths: &RepoPaths,
    options: &AnnotatedOptions,
) -> Result<PipelineReport> {
    let layout = JobLayout {
        out_dir: paths.annotated_build_dir(),
        job: target.annotated_job(),
    };
    fs::create_dir_all(&layout.out_dir)
        .with_context(|| format!("create {}", layout.out_dir.display()))?;

    for step in STEPS {
        let failure = match step {
            Step::Bibtex => run_bibtex(toolchain, target, &layout, options),
            _ => run_pass(toolchain, target, &layout, options, step),
        };
        if let Some(message) = failure {
            return Ok(failed_with_diagnostics(step, message, &layout));
        }

        let expected = match step {
            Step::Pass1 => Some(layout.file("aux")),
            Step::Pass3 => Some(layout.file("pdf")),
            Step::Bibtex | Step::Pass2 => None,
        };
        if let Some(expected) = expected.filter(|path| !path.is_file()) {
            let message = format!(
                "{} exited 0 but {} was not produced",
                step.name(),
                display_path(&expected, Some(paths.root()))
            );
            return Ok(failed_with_diagnostics(step, message, &layout));
        }
        tracing::debug!(step = step.name(), job = %layout.job, "annotated step complete");
    }

    let published = paths.published_artifact(&format!("{}.pdf", layout.job));
    copy_artifact(&layout.file("pdf"), &published)?;
    tracing::info!(artifact = %published.display(), "annotated build published");
    Ok(PipelineReport::succeeded(KIND, published))
}

fn run_pass(
    toolchain: &Toolchain,
    target: &BuildTarget,
    layout: &JobLayout,
    options: &AnnotatedOptions,
    step: Step,
) -> Option<String> {
    let out_dir = match path_to_string(&layout.out_dir, "annotated output") {
        Ok(out_dir) => out_dir,
        Err(err) => return Some(format!("{err:#}")),
    };
    let mut command = toolchain.command(&toolchain.pdflatex);
    command
        .args(["-interaction=nonstopmode", "-halt-on-error"])
        .arg(format!("-output-directory={out_dir}"))
        .arg(format!("-jobname={}", layout.job))
        .arg(annotated_input(&options.macro_name, target.file_name()))
        .current_dir(target.source_dir());
    step_failure(&mut command, step)
}

fn run_bibtex(
    toolchain: &Toolchain,
    target: &BuildTarget,
    layout: &JobLayout,
    options: &AnnotatedOptions,
) -> Option<String> {
    let bibinputs = match bibinputs_value(
        &layout.out_dir,
        target.source_dir(),
        options.inherited_bibinputs.as_deref(),
    ) {
        Ok(value) => value,
        Err(err) => return Some(format!("{err:#}")),
    };
    // The override lives on the child command only; this process's
    // environment is never touched.
    let mut command = toolchain.command(&toolchain.bibtex);
    command
        .arg(&layout.job)
        .env(BIBINPUTS_ENV, &bibinputs)
        .current_dir(&layout.out_dir);
    step_failure(&mut command, Step::Bibtex)
}

fn step_failure(command: &mut std::process::Command, step: Step) -> Option<String> {
    let tool = match step {
        Step::Bibtex => "bibtex",
        _ => "pdflatex",
    };
    match run_tool(command, tool) {
        Ok(failure) => failure,
        Err(err) => Some(format!("{err:#}")),
    }
}

/// `\def\<macro>{}\input{<file>}`: the source sees the macro as defined.
pub fn annotated_input(macro_name: &str, file_name: &str) -> String {
    format!("\\def\\{macro_name}{{}}\\input{{{file_name}}}")
}

/// Bibliography search path for the bibtex step: the job's output directory,
/// the source directory, then whatever was inherited. With nothing inherited
/// a trailing empty entry keeps kpathsea's default path.
pub fn bibinputs_value(
    out_dir: &Path,
    source_dir: &Path,
    inherited: Option<&std::ffi::OsStr>,
) -> Result<OsString> {
    let mut entries = vec![out_dir.to_path_buf(), source_dir.to_path_buf()];
    match inherited.filter(|value| !value.is_empty()) {
        Some(value) => entries.extend(env::split_paths(value)),
        None => entries.push(PathBuf::new()),
    }
    env::join_paths(entries).context("join BIBINPUTS entries")
}

fn failed_with_diagnostics(step: Step, message: String, layout: &JobLayout) -> PipelineReport {
    let log_path = layout.file("log");
    let blg_path = layout.file("blg");
    let mut report =
        PipelineReport::failed(KIND, step.name(), message).with_logs(log_path, blg_path);
    report.log_error = report
        .log_path
        .as_deref()
        .and_then(|path| scan_log(path, first_tex_error));
    report.blg_error = report
        .blg_path
        .as_deref()
        .and_then(|path| scan_log(path, first_bibtex_error));
    report
}
