//! Fake TeX toolchain scripts for unit tests.
use crate::config::ToolCommands;
use crate::toolchain::SearchPath;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that write scripts and spawn them. A fork in one test
/// thread while another holds a script open for writing makes exec fail
/// with ETXTBSY.
pub fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
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

pub const LATEXMK_FAIL: &str = "#!/bin/sh\nexit 12\n";

pub const PDFLATEX_OK: &str = r#"#!/bin/sh
out=""
job=""
last=""
for arg in "$@"; do
  case "$arg" in
    -output-directory=*) out="${arg#-output-directory=}" ;;
    -jobname=*) job="${arg#-jobname=}" ;;
  esac
  last="$arg"
done
mkdir -p "$out"
printf 'pass\n' >> "$out/steps.log"
printf '%s\n' "$last" >> "$out/$job.passes"
printf 'aux\n' > "$out/$job.aux"
printf 'This is pdfTeX\n' > "$out/$job.log"
printf '%%PDF-1.5\n' > "$out/$job.pdf"
"#;

/// Writes the aux file on every pass but never a PDF.
pub const PDFLATEX_NO_PDF: &str = r#"#!/bin/sh
out=""
job=""
for arg in "$@"; do
  case "$arg" in
    -output-directory=*) out="${arg#-output-directory=}" ;;
    -jobname=*) job="${arg#-jobname=}" ;;
  esac
done
mkdir -p "$out"
printf 'pass\n' >> "$out/steps.log"
printf 'aux\n' > "$out/$job.aux"
"#;

/// Succeeds on the first pass and fails on every later one.
pub const PDFLATEX_FAIL_AFTER_FIRST: &str = r#"#!/bin/sh
out=""
job=""
for arg in "$@"; do
  case "$arg" in
    -output-directory=*) out="${arg#-output-directory=}" ;;
    -jobname=*) job="${arg#-jobname=}" ;;
  esac
done
mkdir -p "$out"
printf 'pass\n' >> "$out/steps.log"
if [ "$(grep -c pass "$out/steps.log")" -ge 2 ]; then
  printf '! LaTeX Error: Label(s) may have changed.\n' > "$out/$job.log"
  exit 1
fi
printf 'aux\n' > "$out/$job.aux"
"#;

pub const PDFLATEX_FAIL: &str = r#"#!/bin/sh
out=""
job=""
for arg in "$@"; do
  case "$arg" in
    -output-directory=*) out="${arg#-output-directory=}" ;;
    -jobname=*) job="${arg#-jobname=}" ;;
  esac
done
mkdir -p "$out"
cat > "$out/$job.log" <<'EOF'
This is pdfTeX, Version 3.14
(./paper.tex
! Undefined control sequence.
l.12 \badmacro
EOF
exit 1
"#;

pub const BIBTEX_OK: &str = r#"#!/bin/sh
printf 'bibtex\n' >> steps.log
printf '%s\n' "$BIBINPUTS" > bibinputs.txt
printf 'bbl\n' > "$1.bbl"
"#;

pub const BIBTEX_FAIL: &str = r#"#!/bin/sh
cat > "$1.blg" <<'EOF'
This is BibTeX, Version 0.99d
Database file #1: refs.bib
I couldn't open database file refs.bib
---line 3 of file paper_annotated.aux
EOF
exit 2
"#;

pub fn write_script(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create script dir");
    }
    fs::write(path, body).expect("write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod script");
}

/// A temp directory holding `latexmk`, `pdflatex` and `bibtex` scripts.
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    pub fn passing() -> Self {
        Self::with_scripts(LATEXMK_OK, PDFLATEX_OK, BIBTEX_OK)
    }

    pub fn with_scripts(latexmk: &str, pdflatex: &str, bibtex: &str) -> Self {
        let dir = tempfile::tempdir().expect("tools dir");
        let tools = Self { dir };
        write_script(&tools.bin_dir().join("latexmk"), latexmk);
        write_script(&tools.bin_dir().join("pdflatex"), pdflatex);
        write_script(&tools.bin_dir().join("bibtex"), bibtex);
        tools
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn commands(&self) -> ToolCommands {
        ToolCommands::resolve(Some("latexmk"), Some("pdflatex"), Some("bibtex"))
    }

    /// Fake bin dir plus the system dirs the scripts need for coreutils.
    pub fn search_path(&self) -> SearchPath {
        SearchPath::new(vec![
            self.bin_dir(),
            PathBuf::from("/usr/bin"),
            PathBuf::from("/bin"),
        ])
    }
}

/// Create a minimal paper repository with `paper.tex` and return its root.
pub fn paper_repo() -> TempDir {
    let dir = tempfile::tempdir().expect("repo dir");
    fs::write(
        dir.path().join("paper.tex"),
        "\\documentclass{article}\n\\title{Example Title}\n\\begin{document}\n\\end{document}\n",
    )
    .expect("write paper.tex");
    dir
}
