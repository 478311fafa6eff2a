//! Shared load → compute workflow used by every subcommand.
//!
//! The CSV is loaded once into an `IngestedData` snapshot and passed by
//! reference into the calculators; nothing is cached behind the caller's back.
//! Front-ends only deal with presentation (tables, exports).

use tracing::{debug, warn};

use crate::analysis::{CorrelationReport, MarketStateMap, correlate_unemployment, unmatched_states};
use crate::domain::{CorrelateConfig, RecoveryConfig, RecoveryReport};
use crate::error::AppError;
use crate::io::ingest::{IngestedData, IngestedUnemployment, RowError, load_observations, load_unemployment};
use crate::recovery::RecoveryCalculator;

/// All computed outputs of a single `cre recovery` run.
#[derive(Debug, Clone)]
pub struct RecoveryRun {
    pub ingest: IngestedData,
    pub report: RecoveryReport,
}

/// All computed outputs of a single `cre correlate` run.
#[derive(Debug, Clone)]
pub struct CorrelateRun {
    pub ingest: IngestedData,
    pub unemployment: IngestedUnemployment,
    pub report: CorrelationReport,
    /// Mapped states with no unemployment rows at all.
    pub unmatched_states: Vec<String>,
}

/// Load the occupancy CSV and compute recovery metrics.
pub fn run_recovery(config: &RecoveryConfig) -> Result<RecoveryRun, AppError> {
    let ingest = load_observations(&config.occupancy_path, &config.columns)?;
    log_ingest("occupancy", ingest.rows_read, ingest.rows_used(), &ingest.row_errors);

    Ok(run_recovery_with_data(config, ingest))
}

/// Compute recovery metrics over an already-loaded snapshot.
pub fn run_recovery_with_data(config: &RecoveryConfig, ingest: IngestedData) -> RecoveryRun {
    let mut calculator = RecoveryCalculator::new(config.baseline);
    if let Some(current) = config.current {
        calculator = calculator.with_current(current);
    }

    let report = calculator.compute(&ingest.observations);
    debug!(
        baseline = %config.baseline,
        markets = report.summaries.len(),
        diagnostics = report.diagnostics.len(),
        "computed recovery summaries"
    );
    for d in report.diagnostics.iter().filter(|d| d.is_exclusion()) {
        warn!(market = d.entity(), "{d}");
    }

    RecoveryRun { ingest, report }
}

/// Load occupancy + unemployment CSVs and correlate them per market.
pub fn run_correlate(config: &CorrelateConfig) -> Result<CorrelateRun, AppError> {
    let ingest = load_observations(&config.occupancy_path, &config.columns)?;
    log_ingest("occupancy", ingest.rows_read, ingest.rows_used(), &ingest.row_errors);

    let unemployment = load_unemployment(&config.unemployment_path)?;
    log_ingest(
        "unemployment",
        unemployment.rows_read,
        unemployment.records.len(),
        &unemployment.row_errors,
    );

    let mut map = MarketStateMap::default();
    map.extend(config.market_states.iter().cloned());

    let report = correlate_unemployment(&ingest.observations, &unemployment.records, &map);
    let unmatched_states = unmatched_states(&map, &unemployment.records);
    if !unmatched_states.is_empty() {
        warn!(states = ?unmatched_states, "mapped states have no unemployment data");
    }
    debug!(
        markets = report.correlations.len(),
        skipped = report.skipped.len(),
        "computed unemployment correlations"
    );

    Ok(CorrelateRun {
        ingest,
        unemployment,
        report,
        unmatched_states,
    })
}

fn log_ingest(dataset: &str, rows_read: usize, rows_used: usize, row_errors: &[RowError]) {
    debug!(dataset, rows_read, rows_used, "loaded CSV");
    if let Some(first) = row_errors.first() {
        warn!(
            dataset,
            skipped = row_errors.len(),
            first_line = first.line,
            "{}",
            first.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnSpec, Diagnostic, Period, Quarter, RowFilter};
    use crate::io::ingest::read_observations;

    const CSV: &str = "\
market,year,quarter,avg_occupancy_proportion
Austin,2020,Q1,0.95
Austin,2020,Q2,0.40
Austin,2024,Q3,0.70
Houston,2020,Q1,0.90
Houston,2020,Q2,0.30
Houston,2024,Q2,0.60
";

    fn config(current: Option<Period>) -> RecoveryConfig {
        RecoveryConfig {
            occupancy_path: "unused.csv".into(),
            columns: ColumnSpec::default(),
            baseline: Period::new(2020, Quarter::Q1),
            current,
            top_n: 0,
            export_csv: None,
            export_json: None,
        }
    }

    #[test]
    fn snapshot_is_reused_without_reloading() {
        let ingest = read_observations(CSV.as_bytes(), &ColumnSpec::default()).unwrap();

        let latest = run_recovery_with_data(&config(None), ingest.clone());
        assert_eq!(latest.report.summaries.len(), 2);

        let pinned = run_recovery_with_data(&config(Some(Period::new(2024, Quarter::Q3))), ingest);
        assert_eq!(pinned.report.summaries.len(), 1);
        assert_eq!(pinned.report.summaries[0].entity, "Austin");
    }

    #[test]
    fn class_a_rent_recovery_has_no_duplicate_rows() {
        let csv = "\
market,year,quarter,internal_class,internal_class_rent
Austin,2020,Q1,A,50.0
Austin,2020,Q1,O,40.0
Austin,2024,Q3,A,45.0
Austin,2024,Q3,O,30.0
";
        let columns = ColumnSpec {
            value: "internal_class_rent".to_string(),
            filter: Some(RowFilter::new("internal_class", "A")),
            ..ColumnSpec::default()
        };
        let ingest = read_observations(csv.as_bytes(), &columns).unwrap();
        let run = run_recovery_with_data(&config(None), ingest);

        assert!(
            !run.report
                .diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::DuplicateObservation { .. }))
        );
        assert!((run.report.summaries[0].current_ratio - 90.0).abs() < 1e-9);
    }

    #[test]
    fn missing_file_is_exit_code_2() {
        let mut cfg = config(None);
        cfg.occupancy_path = "/definitely/not/here.csv".into();
        assert_eq!(run_recovery(&cfg).unwrap_err().exit_code(), 2);
    }
}
