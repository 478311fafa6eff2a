//! Command-line parsing for the CRE recovery tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! metric code. Paths that are not given on the command line are resolved later
//! against `CRE_DATA_DIR` (see `app::config`).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::analysis::parse_market_state;
use crate::domain::Period;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "cre",
    version,
    about = "Office-market recovery metrics from occupancy and unemployment CSVs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Baseline / trough / current occupancy per market, ranked by recovery.
    Recovery(RecoveryArgs),
    /// Correlate market occupancy with state unemployment rates.
    Correlate(CorrelateArgs),
    /// Average recovery ratios across market groups.
    Groups(GroupsArgs),
}

/// Occupancy dataset location and column names.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Occupancy CSV (default: `$CRE_DATA_DIR/Major Market Occupancy Data-revised.csv`).
    #[arg(long, value_name = "CSV")]
    pub occupancy: Option<PathBuf>,

    /// Column holding the market name.
    #[arg(long, default_value = "market")]
    pub entity_col: String,

    /// Column holding the year.
    #[arg(long, default_value = "year")]
    pub year_col: String,

    /// Column holding the quarter label (Q1..Q4).
    #[arg(long, default_value = "quarter")]
    pub quarter_col: String,

    /// Column holding the value (proportion, or rent for price data).
    #[arg(long, default_value = "avg_occupancy_proportion")]
    pub value_col: String,

    /// Keep only rows of this building class, e.g. `--class A`.
    #[arg(long, value_name = "CLASS")]
    pub class: Option<String>,

    /// Column holding the building class.
    #[arg(long, default_value = "internal_class")]
    pub class_col: String,
}

/// Baseline/current period selection.
#[derive(Debug, Args, Clone)]
pub struct PeriodArgs {
    /// Baseline period, e.g. 2020-Q1.
    #[arg(long, default_value = "2020-Q1")]
    pub baseline: Period,

    /// Pin "current" to this period instead of each market's latest.
    #[arg(long)]
    pub current: Option<Period>,
}

#[derive(Debug, Args, Clone)]
pub struct RecoveryArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub periods: PeriodArgs,

    /// Show only the top-N markets (0 = all).
    #[arg(long, default_value_t = 0)]
    pub top: usize,

    /// Export per-market results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the full report (including diagnostics) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Unemployment CSV (default: `$CRE_DATA_DIR/Unemployment.csv`).
    #[arg(long, value_name = "CSV")]
    pub unemployment: Option<PathBuf>,

    /// Extra market→state mapping, e.g. `--map Phoenix=AZ` (repeatable).
    #[arg(long = "map", value_name = "MARKET=ST", value_parser = parse_market_state)]
    pub market_states: Vec<(String, String)>,
}

#[derive(Debug, Args, Clone)]
pub struct GroupsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub periods: PeriodArgs,
}
