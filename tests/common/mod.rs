//! Shared fixtures for CLI integration tests: a fake TeX toolchain on a
//! private PATH and a throwaway paper repository.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

/// Tests write executable scripts and then spawn them; forking while another
/// thread still has a script open for writing fails with ETXTBSY.
pub fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub const LATEXMK_OK: &str = r#"#!/bin/sh
out=""
src=""
for arg in "$@"; do
  case "$arg" in
    -outdir=*) out="${arg#-outdir=}" ;;
    -*) ;;
    *) src="$arg" ;;
  esac
done
base=$(basename "$src" .tex)
mkdir -p "$out"
printf '%%PDF-1.5\n' > "$out/$base.pdf"
"#;

pub const LATEXMK_NO_PDF: &str = "#!/bin/sh\nexit 0\n";

pub const PDFLATEX_OK: &str = r#"#!/bin/sh
out=""
job=""
for arg in "$@"; do
  case "$arg" in
    -output-directory=*) out="${arg#-output-directory=}" ;;
    -jobname=*) job="${arg#-jobname=}" ;;
  esac
done
mkdir -p "$out"
printf 'aux\n' > "$out/$job.aux"
printf 'This is pdfTeX\n' > "$out/$job.log"
printf '%%PDF-1.5\n' > "$out/$job.pdf"
"#;

pub const BIBTEX_OK: &str = r#"#!/bin/sh
printf '%s\n' "$BIBINPUTS" > bibinputs.txt
printf 'bbl\n' > "$1.bbl"
"#;

pub const BIBTEX_FAIL: &str = r#"#!/bin/sh
cat > "$1.blg" <<'EOF'
This is BibTeX, Version 0.99d
I found no \citation commands---while reading file paper_annotated.aux
EOF
exit 2
"#;

pub const PAPER_TEX: &str = r"\documentclass{article}
\title{Example Title} % working title
\begin{document}
\begin{abstract}
We compile papers twice.
\end{abstract}
\input{sections/contract}
\end{document}
";

pub const CONTRACT_TEX: &str = r"\section{Contract}
The build publishes two PDFs.
";

/// A paper repository plus a directory of fake tools.
pub struct Workspace {
    pub repo: TempDir,
    tools: TempDir,
}

impl Workspace {
    pub fn passing() -> Self {
        Self::with_tools(LATEXMK_OK, PDFLATEX_OK, BIBTEX_OK)
    }

    pub fn with_tools(latexmk: &str, pdflatex: &str, bibtex: &str) -> Self {
        let repo = tempfile::tempdir().expect("create repo dir");
        fs::write(repo.path().join("main.tex"), PAPER_TEX).expect("write main.tex");
        fs::create_dir_all(repo.path().join("sections")).expect("create sections");
        fs::write(repo.path().join("sections/contract.tex"), CONTRACT_TEX)
            .expect("write contract.tex");

        let tools = tempfile::tempdir().expect("create tools dir");
        write_script(&tools.path().join("latexmk"), latexmk);
        write_script(&tools.path().join("pdflatex"), pdflatex);
        write_script(&tools.path().join("bibtex"), bibtex);
        Self { repo, tools }
    }

    pub fn root(&self) -> &Path {
        self.repo.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.repo.path().join(relative)
    }

    /// `paperbuild --root <repo> <args>` with only the fake tools on PATH.
    pub fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_paperbuild"));
        command
            .arg("--root")
            .arg(self.repo.path())
            .args(args)
            .env("PATH", format!("{}:/usr/bin:/bin", self.tools.path().display()))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("BIBINPUTS")
            .env_remove("PAPERBUILD_LATEXMK")
            .env_remove("PAPERBUILD_PDFLATEX")
            .env_remove("PAPERBUILD_BIBTEX");
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run paperbuild")
    }
}

pub fn write_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod script");
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
