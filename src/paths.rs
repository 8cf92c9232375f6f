//! Typed paths into the paper repository layout.
//!
//! Every generated location is derived here so the cleaner, the pipelines and
//! the contract extractor agree on where outputs live.
use std::path::{Path, PathBuf};

const BUILD_DIR: &str = "build";
const ANNOTATED_BUILD_DIR: &str = "build_annotated";
const CONTRACTS_DIR_REL: &str = "artifacts/contracts";
const CONTRACT_REPORT_FILE: &str = "contracts.md";

/// Convenience wrapper for locating repository artifacts.
#[derive(Debug, Clone)]
pub struct RepoPaths {
    root: PathBuf,
}

impl RepoPaths {
    /// Create a path helper rooted at the repository root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Return the repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `build/` directory used by the standard pipeline.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    /// Return the `build_annotated/` directory used by the annotated pipeline.
    pub fn annotated_build_dir(&self) -> PathBuf {
        self.root.join(ANNOTATED_BUILD_DIR)
    }

    /// Return the `artifacts/contracts/` directory.
    pub fn contracts_dir(&self) -> PathBuf {
        self.root.join(CONTRACTS_DIR_REL)
    }

    /// Return the `artifacts/contracts/contracts.md` path.
    pub fn contract_report_path(&self) -> PathBuf {
        self.contracts_dir().join(CONTRACT_REPORT_FILE)
    }

    /// Return the directories removed before a build.
    pub fn build_output_dirs(&self) -> [PathBuf; 2] {
        [self.build_dir(), self.annotated_build_dir()]
    }

    /// Return `<root>/<file_name>`, where finished PDFs are published.
    pub fn published_artifact(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}
