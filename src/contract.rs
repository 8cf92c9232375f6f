//! Contract snapshot: front matter plus the contract section, as Markdown.
//!
//! Locating the main source is the only hard failure. Every other missing
//! piece renders as a "not found" marker so the report always has the same
//! sections.
use crate::clean::clean_contract_outputs;
use crate::extract::{inclusion_targets, strip_comments, Field, FieldExtractor};
use crate::paths::RepoPaths;
use crate::util::{display_path, write_text};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub const NOT_FOUND: &str = "_not found_";
const REPORT_HEADER: &str = "# Contract Snapshot";
const TEX_EXTENSION: &str = "tex";

/// A labelled file-name predicate. Lists of these are tried in order and the
/// first matcher with any hit wins.
pub struct NameMatcher {
    pub label: &'static str,
    pub matches: fn(&str) -> bool,
}

pub const MAIN_SOURCE_MATCHERS: &[NameMatcher] = &[
    NameMatcher {
        label: "numbered prefix",
        matches: has_numbered_prefix,
    },
    NameMatcher {
        label: "theorem name",
        matches: mentions_theorem,
    },
    NameMatcher {
        label: "first source",
        matches: any_source,
    },
];

fn has_numbered_prefix(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn mentions_theorem(name: &str) -> bool {
    name.to_lowercase().contains("theorem")
}

fn any_source(_name: &str) -> bool {
    true
}

fn mentions_contract(name: &str) -> bool {
    name.to_lowercase().contains("contract")
}

/// Inputs shared by the contract locators.
struct ContractSearch<'a> {
    base_dir: &'a Path,
    source: &'a str,
    candidates: &'a [PathBuf],
}

struct ContractLocator {
    label: &'static str,
    locate: fn(&ContractSearch<'_>) -> Option<PathBuf>,
}

const CONTRACT_LOCATORS: &[ContractLocator] = &[
    ContractLocator {
        label: "inclusion directive",
        locate: contract_from_inclusions,
    },
    ContractLocator {
        label: "file name",
        locate: contract_from_file_names,
    },
];

fn contract_from_inclusions(search: &ContractSearch<'_>) -> Option<PathBuf> {
    inclusion_targets(search.source)
        .iter()
        .map(|target| resolve_inclusion(search.base_dir, target))
        .find(|path| file_name_str(path).is_some_and(mentions_contract))
}

fn contract_from_file_names(search: &ContractSearch<'_>) -> Option<PathBuf> {
    search
        .candidates
        .iter()
        .find(|path| file_name_str(path).is_some_and(mentions_contract))
        .cloned()
}

/// Extracted title, abstract and keywords; each may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub keywords: Option<String>,
}

impl FrontMatter {
    pub fn extract(source: &str, extractor: &dyn FieldExtractor) -> Self {
        Self {
            title: extractor.extract(source, Field::Title),
            abstract_text: extractor.extract(source, Field::Abstract),
            keywords: extractor.extract(source, Field::Keywords),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => self.title.as_deref(),
            Field::Abstract => self.abstract_text.as_deref(),
            Field::Keywords => self.keywords.as_deref(),
        }
    }

    /// Fields that were not found, in report order.
    pub fn missing(&self) -> Vec<Field> {
        [Field::Title, Field::Abstract, Field::Keywords]
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }
}

/// The selected contract file, if any, and its text when readable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractDocument {
    pub path: Option<PathBuf>,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContractSnapshot {
    pub main_source: PathBuf,
    pub front_matter: FrontMatter,
    pub contract: ContractDocument,
    pub generated_at: DateTime<Utc>,
}

impl ContractSnapshot {
    /// Operator-facing notes for every missing field and a missing contract.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self
            .front_matter
            .missing()
            .into_iter()
            .map(|field| format!("{} not found", field.heading().to_lowercase()))
            .collect();
        if self.contract.text.is_none() {
            warnings.push("contract section not found".to_string());
        }
        warnings
    }
}

/// A snapshot after it has been written to disk.
#[derive(Debug, Clone)]
pub struct WrittenReport {
    pub path: PathBuf,
    pub snapshot: ContractSnapshot,
}

/// Locate the main source under `root`.
pub fn find_main_source(root: &Path) -> Result<PathBuf> {
    let candidates = list_tex_files(root)?;
    pick_main_source(root, &candidates)
}

fn pick_main_source(root: &Path, candidates: &[PathBuf]) -> Result<PathBuf> {
    let (path, label) = first_match(candidates, MAIN_SOURCE_MATCHERS)
        .ok_or_else(|| anyhow!("no .tex source found under {}", root.display()))?;
    tracing::debug!(path = %path.display(), matcher = label, "selected main source");
    Ok(path.to_path_buf())
}

/// Return the first candidate accepted by the earliest matcher that accepts any.
pub fn first_match<'a>(
    candidates: &'a [PathBuf],
    matchers: &[NameMatcher],
) -> Option<(&'a Path, &'static str)> {
    matchers.iter().find_map(|matcher| {
        candidates
            .iter()
            .find(|path| file_name_str(path).is_some_and(matcher.matches))
            .map(|path| (path.as_path(), matcher.label))
    })
}

/// `.tex` files directly under `dir`, sorted by file name.
pub fn list_tex_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        let is_tex = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(TEX_EXTENSION));
        if is_tex && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Resolve an `\input` argument the way TeX does for the common case:
/// relative to the including file, with `.tex` implied.
pub fn resolve_inclusion(base_dir: &Path, target: &str) -> PathBuf {
    let mut path = base_dir.join(target);
    if path.extension().is_none() {
        path.set_extension(TEX_EXTENSION);
    }
    path
}

fn locate_contract(main_source: &Path, source: &str, candidates: &[PathBuf]) -> ContractDocument {
    let search = ContractSearch {
        base_dir: main_source.parent().unwrap_or_else(|| Path::new(".")),
        source,
        candidates,
    };
    let Some((path, label)) = CONTRACT_LOCATORS
        .iter()
        .find_map(|locator| (locator.locate)(&search).map(|path| (path, locator.label)))
    else {
        return ContractDocument::default();
    };
    tracing::debug!(path = %path.display(), locator = label, "selected contract file");

    let text = if path.is_file() {
        match fs::read(&path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).trim().to_string())
                .filter(|text| !text.is_empty()),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "contract file unreadable");
                None
            }
        }
    } else {
        tracing::warn!(path = %path.display(), "contract file referenced but missing");
        None
    };
    ContractDocument {
        path: Some(path),
        text,
    }
}

/// Read the main source and contract file under `root`. An explicit
/// `main_source` is used as given; otherwise it is discovered.
pub fn extract_snapshot(
    root: &Path,
    main_source: Option<&Path>,
    extractor: &dyn FieldExtractor,
) -> Result<ContractSnapshot> {
    let candidates = list_tex_files(root)?;
    let main_source = match main_source {
        Some(path) => path.to_path_buf(),
        None => pick_main_source(root, &candidates)?,
    };
    let bytes =
        fs::read(&main_source).with_context(|| format!("read {}", main_source.display()))?;
    let source = strip_comments(&String::from_utf8_lossy(&bytes));

    let front_matter = FrontMatter::extract(&source, extractor);
    let contract = locate_contract(&main_source, &source, &candidates);

    Ok(ContractSnapshot {
        main_source,
        front_matter,
        contract,
        generated_at: Utc::now(),
    })
}

/// Render the snapshot as Markdown. Paths are shown relative to `root`.
pub fn render_report(snapshot: &ContractSnapshot, root: &Path) -> String {
    let mut out = String::new();
    out.push_str(REPORT_HEADER);
    out.push_str("\n\n");
    out.push_str(&format!(
        "Generated: {}\n",
        snapshot
            .generated_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    out.push_str(&format!(
        "Main source: `{}`\n",
        display_path(&snapshot.main_source, Some(root))
    ));

    for field in [Field::Title, Field::Abstract, Field::Keywords] {
        out.push_str(&format!("\n## {}\n\n", field.heading()));
        push_block(&mut out, snapshot.front_matter.get(field));
    }

    out.push_str("\n## Contract\n\n");
    if let Some(path) = &snapshot.contract.path {
        out.push_str(&format!("Source: `{}`\n\n", display_path(path, Some(root))));
    }
    push_block(&mut out, snapshot.contract.text.as_deref());
    out
}

fn push_block(out: &mut String, value: Option<&str>) {
    let Some(value) = value else {
        out.push_str(NOT_FOUND);
        out.push('\n');
        return;
    };
    let fence = "`".repeat(longest_backtick_run(value).max(2) + 1);
    out.push_str(&format!("{fence}tex\n{value}\n{fence}\n"));
}

fn longest_backtick_run(value: &str) -> usize {
    value
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0)
}

/// Extract, optionally clear `artifacts/contracts/`, and write the report.
pub fn write_report(
    paths: &RepoPaths,
    main_source: Option<&Path>,
    extractor: &dyn FieldExtractor,
    clean: bool,
) -> Result<WrittenReport> {
    let snapshot = extract_snapshot(paths.root(), main_source, extractor)?;
    if clean {
        clean_contract_outputs(paths)?;
    }
    let path = paths.contract_report_path();
    write_text(&path, &render_report(&snapshot, paths.root()))?;
    tracing::info!(
        path = %path.display(),
        missing_fields = snapshot.front_matter.missing().len(),
        contract_found = snapshot.contract.text.is_some(),
        "contract report written"
    );
    Ok(WrittenReport { path, snapshot })
}

fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}
