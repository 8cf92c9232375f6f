//! Standard build: a single latexmk run that manages its own passes and
//! bibliography resolution.
use super::{run_tool, BuildTarget, PipelineKind, PipelineReport};
use crate::paths::RepoPaths;
use crate::toolchain::Toolchain;
use crate::util::{copy_artifact, display_path, path_to_string};
use anyhow::{Context, Result};
use std::fs;

const KIND: PipelineKind = PipelineKind::Standard;
const STEP: &str = "latexmk";

pub fn run_standard(
    toolchain: &Toolchain,
    target: &BuildTarget,
    paths: &RepoPaths,
) -> Result<PipelineReport> {
    let out_dir = paths.build_dir();
    fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    let out_dir_str = path_to_string(&out_dir, "build output")?;

    let log_path = out_dir.join(format!("{}.log", target.name()));
    let blg_path = out_dir.join(format!("{}.blg", target.name()));
    let pdf_path = out_dir.join(format!("{}.pdf", target.name()));

    let mut command = toolchain.command(&toolchain.latexmk);
    command
        .args([
            "-pdf",
            "-bibtex",
            "-interaction=nonstopmode",
            "-halt-on-error",
        ])
        .arg(format!("-outdir={out_dir_str}"))
        .arg(format!("-auxdir={out_dir_str}"))
        .arg(target.file_name())
        .current_dir(target.source_dir());

    let failure = match run_tool(&mut command, STEP) {
        Ok(failure) => failure,
        Err(err) => Some(format!("{err:#}")),
    };
    if let Some(message) = failure {
        return Ok(PipelineReport::failed(KIND, STEP, message).with_logs(log_path, blg_path));
    }

    if !pdf_path.is_file() {
        let message = format!(
            "latexmk exited 0 but {} was not produced",
            display_path(&pdf_path, Some(paths.root()))
        );
        return Ok(PipelineReport::failed(KIND, STEP, message).with_logs(log_path, blg_path));
    }

    let published = paths.published_artifact(&format!("{}.pdf", target.name()));
    copy_artifact(&pdf_path, &published)?;
    tracing::info!(artifact = %published.display(), "standard build published");
    Ok(PipelineReport::succeeded(KIND, published))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{
        paper_repo, process_lock, FakeTools, BIBTEX_OK, LATEXMK_FAIL, LATEXMK_NO_PDF,
        PDFLATEX_OK,
    };

    fn run(tools: &FakeTools, repo: &std::path::Path) -> PipelineReport {
        let toolchain =
            Toolchain::resolve(&tools.commands(), &tools.search_path()).expect("toolchain");
        let target = BuildTarget::from_source(&repo.join("paper.tex")).expect("target");
        run_standard(&toolchain, &target, &RepoPaths::new(repo.to_path_buf())).expect("run")
    }

    #[test]
    fn publishes_pdf_to_repo_root() {
        let _guard = process_lock();
        let tools = FakeTools::passing();
        let repo = paper_repo();

        let report = run(&tools, repo.path());

        assert!(report.success, "{report:?}");
        assert_eq!(report.artifact, Some(repo.path().join("paper.pdf")));
        assert!(repo.path().join("paper.pdf").is_file());
        assert!(repo.path().join("build").join("paper.pdf").is_file());
    }

    #[test]
    fn zero_exit_without_pdf_is_a_failure() {
        let _guard = process_lock();
        let tools = FakeTools::with_scripts(LATEXMK_NO_PDF, PDFLATEX_OK, BIBTEX_OK);
        let repo = paper_repo();

        let report = run(&tools, repo.path());

        assert!(!report.success);
        assert_eq!(report.failed_step.as_deref(), Some("latexmk"));
        assert!(report
            .message
            .as_deref()
            .is_some_and(|m| m.contains("build/paper.pdf was not produced")));
        assert!(!repo.path().join("paper.pdf").exists());
    }

    #[test]
    fn non_zero_exit_reports_log_locations() {
        let _guard = process_lock();
        let tools = FakeTools::with_scripts(LATEXMK_FAIL, PDFLATEX_OK, BIBTEX_OK);
        let repo = paper_repo();

        let report = run(&tools, repo.path());

        assert!(!report.success);
        assert_eq!(
            report.message.as_deref(),
            Some("latexmk failed with exit status 12")
        );
        assert_eq!(report.log_path, Some(repo.path().join("build/paper.log")));
        assert_eq!(report.blg_path, Some(repo.path().join("build/paper.blg")));
        assert_eq!(report.log_error, None);
    }
}
