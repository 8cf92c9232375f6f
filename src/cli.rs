//! CLI argument parsing for the paper build workflow.
//!
//! Each subcommand maps to one standalone procedure: `build` runs the whole
//! orchestration, `clean` and `contract` run their single stage.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "paperbuild",
    version,
    about = "Compile the paper (standard + annotated) and snapshot its contract section",
    after_help = "Commands:\n  build     Clean, snapshot the contract, then compile both PDF variants\n  clean     Remove build/ and build_annotated/\n  contract  Write artifacts/contracts/contracts.md from the TeX sources\n\nExamples:\n  paperbuild build\n  paperbuild build --no-clean --json\n  paperbuild --root ../paper contract",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Repository root containing the TeX sources
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Build(BuildArgs),
    Clean(CleanArgs),
    Contract(ContractArgs),
}

/// Build command inputs.
#[derive(Parser, Debug)]
#[command(about = "Run clean, contract snapshot, standard and annotated compiles")]
pub struct BuildArgs {
    /// Skip removing previous build outputs
    #[arg(long)]
    pub no_clean: bool,

    /// Main TeX source (defaults to main-source discovery under --root)
    #[arg(long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Print the build summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// latexmk command (overrides PAPERBUILD_LATEXMK)
    #[arg(long, value_name = "CMD")]
    pub latexmk: Option<String>,

    /// pdflatex command (overrides PAPERBUILD_PDFLATEX)
    #[arg(long, value_name = "CMD")]
    pub pdflatex: Option<String>,

    /// bibtex command (overrides PAPERBUILD_BIBTEX)
    #[arg(long, value_name = "CMD")]
    pub bibtex: Option<String>,
}

/// Clean command inputs.
#[derive(Parser, Debug)]
#[command(about = "Remove generated build directories")]
pub struct CleanArgs {
    /// Also remove artifacts/contracts
    #[arg(long)]
    pub all: bool,
}

/// Contract command inputs.
#[derive(Parser, Debug)]
#[command(about = "Extract front matter and the contract section to Markdown")]
pub struct ContractArgs {
    /// Keep existing artifacts/contracts content
    #[arg(long)]
    pub no_clean: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_flags_parse() {
        let args = RootArgs::parse_from([
            "paperbuild",
            "--root",
            "/tmp/paper",
            "build",
            "--no-clean",
            "--bibtex",
            "bibtex8",
        ]);
        assert_eq!(args.root, PathBuf::from("/tmp/paper"));
        let Command::Build(build) = args.command else {
            panic!("expected build command");
        };
        assert!(build.no_clean);
        assert!(!build.json);
        assert_eq!(build.bibtex.as_deref(), Some("bibtex8"));
        assert!(build.latexmk.is_none());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = RootArgs::parse_from(["paperbuild", "contract", "-vv", "--no-clean"]);
        assert_eq!(args.verbose, 2);
        assert!(matches!(
            args.command,
            Command::Contract(ContractArgs { no_clean: true })
        ));
    }
}
