//! External tool preflight.
//!
//! All three TeX tools are resolved up front against an explicit search path.
//! A missing tool fails the build before anything on disk is touched.
use crate::config::ToolCommands;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Common TeX install locations that are often missing from a login PATH.
pub const KNOWN_TEX_DIRS: &[&str] = &[
    "/Library/TeX/texbin",
    "/usr/texbin",
    "/usr/local/texlive/bin",
    "/opt/homebrew/bin",
    "/usr/local/bin",
];

/// Ordered list of directories searched for tools and handed to children as
/// `PATH`. The process environment itself is never modified.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Inherited `PATH` followed by any known TeX directories present on disk.
    pub fn from_env() -> Self {
        let inherited = env::var_os("PATH")
            .map(|value| env::split_paths(&value).collect())
            .unwrap_or_default();
        let mut known: Vec<PathBuf> = KNOWN_TEX_DIRS.iter().map(PathBuf::from).collect();
        if let Some(home) = dirs::home_dir() {
            known.push(home.join(".local").join("bin"));
        }
        Self::new(inherited).with_existing(&known)
    }

    /// Append each candidate that is an existing directory not already listed.
    pub fn with_existing(mut self, candidates: &[PathBuf]) -> Self {
        for candidate in candidates {
            if candidate.is_dir() && !self.dirs.contains(candidate) {
                tracing::debug!(dir = %candidate.display(), "adding TeX directory to search path");
                self.dirs.push(candidate.clone());
            }
        }
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn joined(&self) -> Result<OsString> {
        env::join_paths(&self.dirs).context("join search path entries")
    }
}

/// Resolved absolute paths of the external tools.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub latexmk: PathBuf,
    pub pdflatex: PathBuf,
    pub bibtex: PathBuf,
    search_path: OsString,
}

impl Toolchain {
    /// Resolve every tool, reporting all missing ones in a single error.
    pub fn resolve(commands: &ToolCommands, search: &SearchPath) -> Result<Self> {
        let search_path = search.joined()?;
        let cwd = env::current_dir().context("resolve current directory")?;
        let mut missing = Vec::new();
        let mut lookup = |name: &str| match which::which_in(name, Some(&search_path), &cwd) {
            Ok(path) => {
                tracing::debug!(tool = name, path = %path.display(), "resolved tool");
                Some(path)
            }
            Err(_) => {
                missing.push(name.to_string());
                None
            }
        };
        let latexmk = lookup(&commands.latexmk);
        let pdflatex = lookup(&commands.pdflatex);
        let bibtex = lookup(&commands.bibtex);

        match (latexmk, pdflatex, bibtex) {
            (Some(latexmk), Some(pdflatex), Some(bibtex)) => Ok(Self {
                latexmk,
                pdflatex,
                bibtex,
                search_path,
            }),
            _ => Err(anyhow!(
                "required tool(s) not found on PATH: {}",
                missing.join(", ")
            )),
        }
    }

    /// Start a command for `program` with the augmented search path as `PATH`.
    pub fn command(&self, program: &Path) -> Command {
        let mut command = Command::new(program);
        command.env("PATH", &self.search_path);
        command
    }
}
