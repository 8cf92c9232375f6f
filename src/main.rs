use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

mod clean;
mod cli;
mod config;
mod contract;
mod extract;
mod output;
mod paths;
mod pipeline;
#[cfg(all(test, unix))]
mod test_support;
mod toolchain;
mod util;
mod workflow;

use cli::{BuildArgs, CleanArgs, Command, ContractArgs, LogFormat, RootArgs};
use config::BuildConfig;
use extract::PatternExtractor;
use paths::RepoPaths;
use toolchain::SearchPath;
use util::display_path;

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_tracing(args.verbose, args.log_format);

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            output::failed("paperbuild", &format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8, format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = match verbose {
        0 => "paperbuild=warn",
        1 => "paperbuild=debug",
        _ => "paperbuild=trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match format {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn run(args: RootArgs) -> Result<ExitCode> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("resolve repository root {}", args.root.display()))?;
    let paths = RepoPaths::new(root);

    match args.command {
        Command::Build(build) => cmd_build(paths, &build),
        Command::Clean(clean) => cmd_clean(&paths, &clean),
        Command::Contract(contract) => cmd_contract(&paths, &contract),
    }
}

fn cmd_build(paths: RepoPaths, args: &BuildArgs) -> Result<ExitCode> {
    let config = BuildConfig::from_args(paths, args);
    let summary = workflow::run_build(&config, &SearchPath::from_env());

    if args.json {
        let text = serde_json::to_string_pretty(&summary).context("serialize build summary")?;
        println!("{text}");
    }
    if summary.success {
        output::ok("build", "standard and annotated PDFs published");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_clean(paths: &RepoPaths, args: &CleanArgs) -> Result<ExitCode> {
    let mut removed = clean::clean_build_outputs(paths)?;
    if args.all {
        removed.extend(clean::clean_contract_outputs(paths)?);
    }
    if removed.is_empty() {
        output::ok("clean", "nothing to remove");
    }
    for path in &removed {
        output::ok("clean", &format!("removed {}", display_path(path, Some(paths.root()))));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_contract(paths: &RepoPaths, args: &ContractArgs) -> Result<ExitCode> {
    let written = contract::write_report(paths, None, &PatternExtractor, !args.no_clean)?;
    let snapshot = &written.snapshot;
    output::ok(
        "contract",
        &format!(
            "{} from {}",
            display_path(&written.path, Some(paths.root())),
            display_path(&snapshot.main_source, Some(paths.root()))
        ),
    );
    for warning in snapshot.warnings() {
        output::warn("contract", &warning);
    }
    Ok(ExitCode::SUCCESS)
}
