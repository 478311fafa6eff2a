//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves dataset paths (`.env` / `CRE_DATA_DIR`)
//! - runs the load → compute pipeline
//! - prints tables and writes optional exports

use clap::Parser;
use tracing::info;

use crate::analysis::{default_groups, summarize_groups};
use crate::cli::{Command, CorrelateArgs, GroupsArgs, RecoveryArgs};
use crate::error::AppError;

pub mod config;
pub mod pipeline;

use config::DataDir;

/// Entry point for the `cre` binary.
pub fn run() -> Result<(), AppError> {
    // `cre` and `cre --baseline 2019-Q4` behave like `cre recovery ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let data_dir = DataDir::from_env();

    match cli.command {
        Command::Recovery(args) => handle_recovery(&args, &data_dir),
        Command::Correlate(args) => handle_correlate(&args, &data_dir),
        Command::Groups(args) => handle_groups(&args, &data_dir),
    }
}

fn handle_recovery(args: &RecoveryArgs, data_dir: &DataDir) -> Result<(), AppError> {
    let config = config::recovery_config_from_args(args, data_dir);
    let run = pipeline::run_recovery(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, config.baseline, config.current)
    );
    println!(
        "{}",
        crate::report::format_recovery_table(&run.report.summaries, config.top_n)
    );

    let diagnostics = crate::report::format_diagnostics(&run.report.diagnostics, &run.ingest.row_errors);
    if !diagnostics.is_empty() {
        println!("{diagnostics}");
    }

    if let Some(path) = &config.export_csv {
        crate::io::export::write_recovery_csv(path, &run.report.summaries)?;
        info!(path = %path.display(), "wrote recovery CSV");
    }
    if let Some(path) = &config.export_json {
        crate::io::export::write_report_json(path, &run.report)?;
        info!(path = %path.display(), "wrote recovery JSON");
    }

    Ok(())
}

fn handle_correlate(args: &CorrelateArgs, data_dir: &DataDir) -> Result<(), AppError> {
    let config = config::correlate_config_from_args(args, data_dir);
    let run = pipeline::run_correlate(&config)?;

    println!("Occupancy vs. state unemployment (most negative first):\n");
    println!("{}", crate::report::format_correlations(&run.report));

    if !run.unmatched_states.is_empty() {
        println!(
            "No unemployment rows for mapped states: {}",
            run.unmatched_states.join(", ")
        );
    }

    Ok(())
}

fn handle_groups(args: &GroupsArgs, data_dir: &DataDir) -> Result<(), AppError> {
    let config = config::groups_config_from_args(args, data_dir);
    let run = pipeline::run_recovery(&config)?;
    let groups = summarize_groups(&run.report.summaries, &default_groups());

    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, config.baseline, config.current)
    );
    println!("{}", crate::report::format_groups(&groups));

    Ok(())
}

/// Rewrite argv so `cre` defaults to `cre recovery`.
///
/// Rules:
/// - `cre`                          -> `cre recovery`
/// - `cre --baseline 2019-Q4 ...`   -> `cre recovery --baseline 2019-Q4 ...`
/// - `cre --help/--version/-h`      -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("recovery".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "recovery" | "correlate" | "groups");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "recovery".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_recovery() {
        assert_eq!(rewrite_args(args(&["cre"])), args(&["cre", "recovery"]));
    }

    #[test]
    fn leading_flags_are_recovery_flags() {
        assert_eq!(
            rewrite_args(args(&["cre", "--baseline", "2019-Q4"])),
            args(&["cre", "recovery", "--baseline", "2019-Q4"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(rewrite_args(args(&["cre", "groups"])), args(&["cre", "groups"]));
        assert_eq!(rewrite_args(args(&["cre", "--help"])), args(&["cre", "--help"]));
    }
}
