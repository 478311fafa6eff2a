//! Shared domain types.
//!
//! These types are kept plain and serializable so they can be:
//!
//! - passed between the loader, calculator and formatters by reference
//! - exported to JSON/CSV without intermediate row structs

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::period::Period;

/// One row of a market time series (e.g. office occupancy for a market/quarter).
///
/// `value` is conventionally a proportion in `[0, 1]` but is not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub entity: String,
    pub period: Period,
    pub value: f64,
}

impl ObservationRecord {
    pub fn new(entity: impl Into<String>, period: Period, value: f64) -> Self {
        Self {
            entity: entity.into(),
            period,
            value,
        }
    }
}

/// Baseline, trough and current observations for one entity, joined.
///
/// Ratios are percentages of the baseline value and are `NaN` when the
/// baseline is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySummary {
    pub entity: String,
    pub baseline_period: Period,
    pub baseline_value: f64,
    pub trough_period: Period,
    pub trough_value: f64,
    pub current_period: Period,
    pub current_value: f64,
    pub trough_ratio: f64,
    pub current_ratio: f64,
}

impl RecoverySummary {
    /// Percentage points regained between trough and current.
    pub fn rebound(&self) -> f64 {
        self.current_ratio - self.trough_ratio
    }
}

/// A data-quality condition found while computing recovery metrics.
///
/// Diagnostics are returned next to the result instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The entity has data but no observation at the baseline period; it is
    /// excluded from the summaries.
    MissingBaseline { entity: String },
    /// A pinned current period was requested and the entity has no
    /// observation there; it is excluded from the summaries.
    MissingCurrent { entity: String, period: Period },
    /// Baseline value is zero; ratios are undefined (`NaN`).
    ZeroBaseline { entity: String },
    /// Baseline value is NaN or infinite; ratios are undefined (`NaN`).
    UndefinedBaseline { entity: String },
    /// Every value for the entity is NaN, so no minimum exists; excluded.
    NoTrough { entity: String },
    /// Several periods share the minimum value; the earliest one was used.
    TiedTrough { entity: String, periods: Vec<Period> },
    /// More than one observation for `(entity, period)`; the first was kept.
    DuplicateObservation { entity: String, period: Period },
}

impl Diagnostic {
    pub fn entity(&self) -> &str {
        match self {
            Diagnostic::MissingBaseline { entity }
            | Diagnostic::MissingCurrent { entity, .. }
            | Diagnostic::ZeroBaseline { entity }
            | Diagnostic::UndefinedBaseline { entity }
            | Diagnostic::NoTrough { entity }
            | Diagnostic::TiedTrough { entity, .. }
            | Diagnostic::DuplicateObservation { entity, .. } => entity,
        }
    }

    /// Whether the entity was dropped from (or made unusable in) the summaries.
    pub fn is_exclusion(&self) -> bool {
        matches!(
            self,
            Diagnostic::MissingBaseline { .. }
                | Diagnostic::MissingCurrent { .. }
                | Diagnostic::ZeroBaseline { .. }
                | Diagnostic::UndefinedBaseline { .. }
                | Diagnostic::NoTrough { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingBaseline { entity } => {
                write!(f, "{entity}: no observation at the baseline period (excluded)")
            }
            Diagnostic::MissingCurrent { entity, period } => {
                write!(f, "{entity}: no observation at current period {period} (excluded)")
            }
            Diagnostic::ZeroBaseline { entity } => {
                write!(f, "{entity}: baseline value is zero (ratios undefined)")
            }
            Diagnostic::UndefinedBaseline { entity } => {
                write!(f, "{entity}: baseline value is not finite (ratios undefined)")
            }
            Diagnostic::NoTrough { entity } => {
                write!(f, "{entity}: no finite value to take a trough from (excluded)")
            }
            Diagnostic::TiedTrough { entity, periods } => {
                let labels: Vec<String> = periods.iter().map(Period::to_string).collect();
                write!(f, "{entity}: trough tied across {} (earliest used)", labels.join(", "))
            }
            Diagnostic::DuplicateObservation { entity, period } => {
                write!(f, "{entity}: duplicate observation for {period} (first kept)")
            }
        }
    }
}

/// Output of a recovery computation: ordered summaries plus diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub summaries: Vec<RecoverySummary>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One unemployment-rate observation for a state (rows may be monthly).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnemploymentRecord {
    pub state: String,
    pub period: Period,
    pub rate: f64,
}

/// Keep only rows whose `column` equals `value` (ASCII case-insensitive).
///
/// Price/availability exports carry one row per building class, so a market
/// appears several times per quarter unless a single class is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, cell: &str) -> bool {
        cell.trim().eq_ignore_ascii_case(self.value.trim())
    }
}

/// Column names for an occupancy-style CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub entity: String,
    pub year: String,
    pub quarter: String,
    pub value: String,
    pub filter: Option<RowFilter>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            entity: "market".to_string(),
            year: "year".to_string(),
            quarter: "quarter".to_string(),
            value: "avg_occupancy_proportion".to_string(),
            filter: None,
        }
    }
}

/// A `recovery`/`groups` run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `.env` defaults).
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub occupancy_path: PathBuf,
    pub columns: ColumnSpec,
    pub baseline: Period,
    /// Pin "current" to a fixed period instead of each entity's latest.
    pub current: Option<Period>,
    /// Limit the printed table (0 = all rows).
    pub top_n: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// A `correlate` run's configuration.
#[derive(Debug, Clone)]
pub struct CorrelateConfig {
    pub occupancy_path: PathBuf,
    pub unemployment_path: PathBuf,
    pub columns: ColumnSpec,
    /// Extra `(market, state)` pairs layered over the default mapping.
    pub market_states: Vec<(String, String)>,
}
