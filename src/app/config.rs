//! CLI arguments → run configuration.
//!
//! `.env` is read once (via `dotenvy`) so `CRE_DATA_DIR` can point at the
//! directory holding the standard dataset files.

use std::path::PathBuf;

use crate::cli::{CorrelateArgs, DataArgs, GroupsArgs, PeriodArgs, RecoveryArgs};
use crate::domain::{ColumnSpec, CorrelateConfig, RecoveryConfig, RowFilter};

pub const DATA_DIR_ENV: &str = "CRE_DATA_DIR";
pub const OCCUPANCY_FILE: &str = "Major Market Occupancy Data-revised.csv";
pub const UNEMPLOYMENT_FILE: &str = "Unemployment.csv";

/// Where default dataset file names are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir(PathBuf);

impl DataDir {
    /// Resolve from `.env` / the process environment, falling back to `.`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self(dir)
    }

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self(dir.into())
    }

    fn resolve(&self, explicit: Option<&PathBuf>, default_file: &str) -> PathBuf {
        explicit.cloned().unwrap_or_else(|| self.0.join(default_file))
    }
}

pub fn recovery_config_from_args(args: &RecoveryArgs, dir: &DataDir) -> RecoveryConfig {
    RecoveryConfig {
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
        top_n: args.top,
        ..base_recovery_config(&args.data, &args.periods, dir)
    }
}

pub fn groups_config_from_args(args: &GroupsArgs, dir: &DataDir) -> RecoveryConfig {
    base_recovery_config(&args.data, &args.periods, dir)
}

pub fn correlate_config_from_args(args: &CorrelateArgs, dir: &DataDir) -> CorrelateConfig {
    CorrelateConfig {
        occupancy_path: dir.resolve(args.data.occupancy.as_ref(), OCCUPANCY_FILE),
        unemployment_path: dir.resolve(args.unemployment.as_ref(), UNEMPLOYMENT_FILE),
        columns: columns_from_args(&args.data),
        market_states: args.market_states.clone(),
    }
}

fn base_recovery_config(data: &DataArgs, periods: &PeriodArgs, dir: &DataDir) -> RecoveryConfig {
    RecoveryConfig {
        occupancy_path: dir.resolve(data.occupancy.as_ref(), OCCUPANCY_FILE),
        columns: columns_from_args(data),
        baseline: periods.baseline,
        current: periods.current,
        top_n: 0,
        export_csv: None,
        export_json: None,
    }
}

fn columns_from_args(data: &DataArgs) -> ColumnSpec {
    ColumnSpec {
        entity: data.entity_col.clone(),
        year: data.year_col.clone(),
        quarter: data.quarter_col.clone(),
        value: data.value_col.clone(),
        filter: data
            .class
            .as_ref()
            .map(|class| RowFilter::new(data.class_col.clone(), class.clone())),
    }
}
