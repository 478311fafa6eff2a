//! CSV ingest and normalization.
//!
//! This module is the data-access side of the pipeline: it turns a market CSV
//! export into an immutable snapshot of typed records that is then handed to the
//! calculators by reference.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (rows keep file order)
//! - **Separation of concerns**: no metric logic here

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{ColumnSpec, ObservationRecord, Period, Quarter, UnemploymentRecord};
use crate::error::AppError;

/// Summary stats about the observations actually loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_records: usize,
    pub n_entities: usize,
    pub first_period: Period,
    pub last_period: Period,
    pub value_min: f64,
    pub value_max: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: observations + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub observations: Vec<ObservationRecord>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Rows dropped by `ColumnSpec::filter` (not errors).
    pub rows_filtered: usize,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.observations.len()
    }
}

/// Unemployment ingest output.
#[derive(Debug, Clone)]
pub struct IngestedUnemployment {
    pub records: Vec<UnemploymentRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load an occupancy-style CSV from disk.
pub fn load_observations(path: &Path, columns: &ColumnSpec) -> Result<IngestedData, AppError> {
    let file = open(path)?;
    read_observations(file, columns)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

/// Parse an occupancy-style CSV from any reader.
pub fn read_observations<R: Read>(reader: R, columns: &ColumnSpec) -> Result<IngestedData, AppError> {
    let mut reader = csv_reader(reader);
    let header_map = read_header_map(&mut reader)?;

    for name in [&columns.entity, &columns.year, &columns.quarter, &columns.value] {
        ensure_column(&header_map, name)?;
    }
    if let Some(filter) = &columns.filter {
        ensure_column(&header_map, &filter.column)?;
    }

    let mut observations = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_filtered = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if let Some(filter) = &columns.filter {
            let cell = header_map
                .get(&normalize_header_name(&filter.column))
                .and_then(|idx| record.get(*idx))
                .unwrap_or("");
            if !filter.matches(cell) {
                rows_filtered += 1;
                continue;
            }
        }

        match parse_observation(&record, &header_map, columns) {
            Ok(obs) => observations.push(obs),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let stats = compute_stats(&observations)
        .ok_or_else(|| AppError::new(3, "No valid rows remain after parsing."))?;

    Ok(IngestedData {
        observations,
        stats,
        row_errors,
        rows_read,
        rows_filtered,
    })
}

/// Load an unemployment CSV from disk.
pub fn load_unemployment(path: &Path) -> Result<IngestedUnemployment, AppError> {
    let file = open(path)?;
    read_unemployment(file).map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

/// Parse an unemployment CSV.
///
/// Requires `state` and `unemployment_rate`, plus either `year` + `quarter` or
/// a `date` column (`YYYY-MM-DD` / `YYYY-MM`).
pub fn read_unemployment<R: Read>(reader: R) -> Result<IngestedUnemployment, AppError> {
    let mut reader = csv_reader(reader);
    let header_map = read_header_map(&mut reader)?;

    ensure_column(&header_map, "state")?;
    ensure_column(&header_map, "unemployment_rate")?;
    let has_quarter = header_map.contains_key("year") && header_map.contains_key("quarter");
    if !has_quarter && !header_map.contains_key("date") {
        return Err(AppError::new(
            2,
            "Unemployment CSV needs either `year` + `quarter` columns or a `date` column.",
        ));
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_unemployment(&record, &header_map, has_quarter));
        match parsed {
            Ok(rec) => records.push(rec),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if records.is_empty() {
        return Err(AppError::new(3, "No valid unemployment rows remain after parsing."));
    }

    Ok(IngestedUnemployment {
        records,
        row_errors,
        rows_read,
    })
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn read_header_map<R: Read>(reader: &mut csv::Reader<R>) -> Result<HashMap<String, usize>, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?;
    Ok(build_header_map(headers))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_column(header_map: &HashMap<String, usize>, name: &str) -> Result<(), AppError> {
    if header_map.contains_key(&normalize_header_name(name)) {
        Ok(())
    } else {
        Err(AppError::new(2, format!("Missing required column: `{name}`")))
    }
}

fn parse_observation(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    columns: &ColumnSpec,
) -> Result<ObservationRecord, String> {
    let entity = get_required(record, header_map, &columns.entity)?.to_string();
    let year = parse_year(get_required(record, header_map, &columns.year)?)?;
    let quarter = get_required(record, header_map, &columns.quarter)?.parse::<Quarter>()?;
    let value = parse_f64(get_required(record, header_map, &columns.value)?, &columns.value)?;

    Ok(ObservationRecord::new(entity, Period::new(year, quarter), value))
}

fn parse_unemployment(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    has_quarter: bool,
) -> Result<UnemploymentRecord, String> {
    let state = get_required(record, header_map, "state")?.to_ascii_uppercase();
    let rate = parse_f64(get_required(record, header_map, "unemployment_rate")?, "unemployment_rate")?;

    let period = if has_quarter {
        let year = parse_year(get_required(record, header_map, "year")?)?;
        let quarter = get_required(record, header_map, "quarter")?.parse::<Quarter>()?;
        Period::new(year, quarter)
    } else {
        Period::from_date(parse_date(get_required(record, header_map, "date")?)?)
    };

    Ok(UnemploymentRecord { state, period, rate })
}

fn compute_stats(observations: &[ObservationRecord]) -> Option<DatasetStats> {
    let first_period = observations.iter().map(|o| o.period).min()?;
    let last_period = observations.iter().map(|o| o.period).max()?;

    let mut value_min = f64::INFINITY;
    let mut value_max = f64::NEG_INFINITY;
    for o in observations {
        value_min = value_min.min(o.value);
        value_max = value_max.max(o.value);
    }

    let entities: BTreeSet<&str> = observations.iter().map(|o| o.entity.as_str()).collect();

    Some(DatasetStats {
        n_records: observations.len(),
        n_entities: entities.len(),
        first_period,
        last_period,
        value_min,
        value_max,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(&normalize_header_name(name))
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_year(s: &str) -> Result<i32, String> {
    // Some exports write years as floats ("2020.0").
    let trimmed = s.strip_suffix(".0").unwrap_or(s);
    trimmed
        .parse::<i32>()
        .map_err(|_| format!("Invalid year '{s}'."))
}

fn parse_f64(s: &str, column: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{column}` value '{s}'.")),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    // Monthly series are often written without a day.
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Ok(d);
    }
    Err(format!("Invalid date '{s}'. Expected YYYY-MM-DD or YYYY-MM."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowFilter;

    const OCCUPANCY: &str = "\
\u{feff}Market,Year,Quarter,avg_occupancy_proportion,starting_occupancy_proportion
Austin,2020,Q1,0.95,0.95
Austin,2020,Q2,0.40,0.95
Austin,2024,Q3,0.70,0.95
Boston,2020,Q5,0.80,0.80
Boston,20x0,Q1,0.80,0.80
Boston,2020,Q1,,0.80
Boston,2020.0,q1,0.81,0.80
";

    #[test]
    fn reads_observations_and_collects_row_errors() {
        let data = read_observations(OCCUPANCY.as_bytes(), &ColumnSpec::default()).unwrap();

        assert_eq!(data.rows_read, 7);
        assert_eq!(data.rows_used(), 4);
        assert_eq!(data.row_errors.len(), 3);
        assert_eq!(data.row_errors[0].line, 5);
        assert!(data.row_errors[0].message.contains("Q5"));
        assert!(data.row_errors[2].message.contains("Missing required value"));

        let boston = data.observations.last().unwrap();
        assert_eq!(boston.entity, "Boston");
        assert_eq!(boston.period, Period::new(2020, Quarter::Q1));

        assert_eq!(data.stats.n_entities, 2);
        assert_eq!(data.stats.first_period, Period::new(2020, Quarter::Q1));
        assert_eq!(data.stats.last_period, Period::new(2024, Quarter::Q3));
        assert_eq!(data.stats.value_min, 0.40);
    }

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let csv = "market,year,value\nAustin,2020,0.9\n";
        let err = read_observations(csv.as_bytes(), &ColumnSpec::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("quarter"));
    }

    #[test]
    fn custom_columns_are_honored() {
        let csv = "metro,yr,qtr,availability_proportion\nDenver,2021,Q2,0.2\n";
        let columns = ColumnSpec {
            entity: "metro".to_string(),
            year: "yr".to_string(),
            quarter: "qtr".to_string(),
            value: "availability_proportion".to_string(),
            filter: None,
        };
        let data = read_observations(csv.as_bytes(), &columns).unwrap();
        assert_eq!(data.observations[0].entity, "Denver");
    }

    const PRICE_AVAILABILITY: &str = "\
market,year,quarter,internal_class,availability_proportion,internal_class_rent
Austin,2020,Q1,A,0.18,52.10
Austin,2020,Q1,O,0.21,38.40
Austin,2024,Q3,a,0.27,55.00
Austin,2024,Q3,O,0.30,39.75
Boston,2020,Q1,,0.12,70.00
";

    fn class_a(value: &str) -> ColumnSpec {
        ColumnSpec {
            value: value.to_string(),
            filter: Some(RowFilter::new("internal_class", "A")),
            ..ColumnSpec::default()
        }
    }

    #[test]
    fn class_filter_keeps_one_row_per_market_quarter() {
        let data = read_observations(PRICE_AVAILABILITY.as_bytes(), &class_a("availability_proportion")).unwrap();

        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_filtered, 3);
        assert!(data.row_errors.is_empty());
        let values: Vec<(Period, f64)> = data.observations.iter().map(|o| (o.period, o.value)).collect();
        assert_eq!(
            values,
            vec![
                (Period::new(2020, Quarter::Q1), 0.18),
                (Period::new(2024, Quarter::Q3), 0.27),
            ]
        );
    }

    #[test]
    fn class_filter_works_with_rent_as_the_value() {
        let data = read_observations(PRICE_AVAILABILITY.as_bytes(), &class_a("internal_class_rent")).unwrap();
        assert_eq!(data.observations.len(), 2);
        assert_eq!(data.observations[1].value, 55.00);
    }

    #[test]
    fn unfiltered_class_rows_collide_as_duplicates() {
        let columns = ColumnSpec {
            value: "availability_proportion".to_string(),
            ..ColumnSpec::default()
        };
        let data = read_observations(PRICE_AVAILABILITY.as_bytes(), &columns).unwrap();
        let austin_2020: Vec<_> = data
            .observations
            .iter()
            .filter(|o| o.entity == "Austin" && o.period == Period::new(2020, Quarter::Q1))
            .collect();
        assert_eq!(austin_2020.len(), 2);
    }

    #[test]
    fn missing_filter_column_is_a_schema_error() {
        let csv = "market,year,quarter,avg_occupancy_proportion\nAustin,2020,Q1,0.9\n";
        let columns = ColumnSpec {
            filter: Some(RowFilter::new("internal_class", "A")),
            ..ColumnSpec::default()
        };
        let err = read_observations(csv.as_bytes(), &columns).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("internal_class"));
    }

    #[test]
    fn no_usable_rows_is_exit_code_3() {
        let csv = "market,year,quarter,avg_occupancy_proportion\nAustin,2020,Q9,0.9\n";
        let err = read_observations(csv.as_bytes(), &ColumnSpec::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn unemployment_accepts_quarter_or_date_columns() {
        let by_quarter = "year,quarter,state,unemployment_rate\n2020,Q2,tx,12.9\n";
        let data = read_unemployment(by_quarter.as_bytes()).unwrap();
        assert_eq!(data.records[0].state, "TX");
        assert_eq!(data.records[0].period, Period::new(2020, Quarter::Q2));

        let by_date = "date,state,unemployment_rate\n2020-05,CA,16.1\n2020-11-01,CA,9.0\nbad,CA,1.0\n";
        let data = read_unemployment(by_date.as_bytes()).unwrap();
        assert_eq!(data.records.len(), 2);
        assert_eq!(data.records[0].period, Period::new(2020, Quarter::Q2));
        assert_eq!(data.records[1].period, Period::new(2020, Quarter::Q4));
        assert_eq!(data.row_errors.len(), 1);
    }

    #[test]
    fn unemployment_without_period_columns_is_rejected() {
        let csv = "state,unemployment_rate\nTX,4.0\n";
        assert_eq!(read_unemployment(csv.as_bytes()).unwrap_err().exit_code(), 2);
    }
}
