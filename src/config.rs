//! Build configuration assembled from CLI flags and the environment.
//!
//! The environment is read once here; everything downstream receives plain
//! values so no stage depends on ambient process state.
use crate::cli::BuildArgs;
use crate::paths::RepoPaths;
use std::ffi::OsString;
use std::path::PathBuf;

pub const LATEXMK_ENV: &str = "PAPERBUILD_LATEXMK";
pub const PDFLATEX_ENV: &str = "PAPERBUILD_PDFLATEX";
pub const BIBTEX_ENV: &str = "PAPERBUILD_BIBTEX";

/// Bibliography search path variable honored by bibtex.
pub const BIBINPUTS_ENV: &str = "BIBINPUTS";

/// Macro defined ahead of `\input` in the annotated build.
pub const ANNOTATION_MACRO: &str = "ANNOTATED";

const DEFAULT_LATEXMK: &str = "latexmk";
const DEFAULT_PDFLATEX: &str = "pdflatex";
const DEFAULT_BIBTEX: &str = "bibtex";

/// External tool commands, before PATH resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommands {
    pub latexmk: String,
    pub pdflatex: String,
    pub bibtex: String,
}

impl ToolCommands {
    /// Resolve each command with fallback: explicit arg > env var > default.
    pub fn resolve(latexmk: Option<&str>, pdflatex: Option<&str>, bibtex: Option<&str>) -> Self {
        Self {
            latexmk: resolve_command(latexmk, LATEXMK_ENV, DEFAULT_LATEXMK),
            pdflatex: resolve_command(pdflatex, PDFLATEX_ENV, DEFAULT_PDFLATEX),
            bibtex: resolve_command(bibtex, BIBTEX_ENV, DEFAULT_BIBTEX),
        }
    }
}

fn resolve_command(explicit: Option<&str>, env_var: &str, default: &str) -> String {
    explicit
        .map(|s| s.to_string())
        .or_else(|| std::env::var(env_var).ok().filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| default.to_string())
}

/// Settings for the annotated pipeline.
#[derive(Debug, Clone)]
pub struct AnnotatedOptions {
    /// Macro name injected as `\def\<name>{}` before the source.
    pub macro_name: String,
    /// `BIBINPUTS` inherited by this process; appended after the build-local
    /// entries when bibtex runs.
    pub inherited_bibinputs: Option<OsString>,
}

impl AnnotatedOptions {
    pub fn from_env() -> Self {
        Self {
            macro_name: ANNOTATION_MACRO.to_string(),
            inherited_bibinputs: std::env::var_os(BIBINPUTS_ENV),
        }
    }
}

/// Everything the orchestrator needs for one `build` invocation.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub paths: RepoPaths,
    pub source: Option<PathBuf>,
    pub clean: bool,
    pub tools: ToolCommands,
    pub annotated: AnnotatedOptions,
}

impl BuildConfig {
    pub fn from_args(paths: RepoPaths, args: &BuildArgs) -> Self {
        let source = args.source.as_ref().map(|source| {
            if source.is_absolute() {
                source.clone()
            } else {
                paths.root().join(source)
            }
        });
        Self {
            paths,
            source,
            clean: !args.no_clean,
            tools: ToolCommands::resolve(
                args.latexmk.as_deref(),
                args.pdflatex.as_deref(),
                args.bibtex.as_deref(),
            ),
            annotated: AnnotatedOptions::from_env(),
        }
    }
}
