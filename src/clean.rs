//! Removal of generated output directories.
//!
//! Missing targets are a no-op, so cleaning is idempotent.
use crate::paths::RepoPaths;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Remove `build/` and `build_annotated/`. Returns the paths actually removed.
pub fn clean_build_outputs(paths: &RepoPaths) -> Result<Vec<PathBuf>> {
    remove_all(&paths.build_output_dirs())
}

/// Remove `artifacts/contracts/`. Returns the paths actually removed.
pub fn clean_contract_outputs(paths: &RepoPaths) -> Result<Vec<PathBuf>> {
    remove_all(&[paths.contracts_dir()])
}

fn remove_all(targets: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for target in targets {
        if remove_target(target)? {
            tracing::debug!(path = %target.display(), "removed generated output");
            removed.push(target.clone());
        }
    }
    Ok(removed)
}

fn remove_target(path: &Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err).with_context(|| format!("stat {}", path.display())),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path).with_context(|| format!("remove {}", path.display()))?;
    } else {
        fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(true)
}
