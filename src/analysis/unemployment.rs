//! Office occupancy vs. state unemployment, per market.
//!
//! Unemployment rows are averaged to quarterly state rates, joined to each
//! market's occupancy series through a market→state mapping, and summarized as
//! a Pearson correlation plus a least-squares line.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::{ObservationRecord, Period, UnemploymentRecord};
use crate::math::{fit_line, pearson};

/// Markets whose primary state is known out of the box.
const DEFAULT_MARKET_STATES: [(&str, &str); 11] = [
    ("Manhattan", "NY"),
    ("San Francisco", "CA"),
    ("Los Angeles", "CA"),
    ("Chicago", "IL"),
    ("Boston", "MA"),
    ("Dallas/Ft Worth", "TX"),
    ("Houston", "TX"),
    ("Washington D.C.", "DC"),
    ("Philadelphia", "PA"),
    ("South Bay/San Jose", "CA"),
    ("Austin", "TX"),
];

/// Market name → two-letter state code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketStateMap {
    states: BTreeMap<String, String>,
}

impl Default for MarketStateMap {
    fn default() -> Self {
        Self::from_pairs(
            DEFAULT_MARKET_STATES
                .iter()
                .map(|(m, s)| (m.to_string(), s.to_string())),
        )
    }
}

impl MarketStateMap {
    pub fn empty() -> Self {
        Self {
            states: BTreeMap::new(),
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut map = Self::empty();
        map.extend(pairs);
        map
    }

    /// Add or replace mappings. State codes are upper-cased.
    pub fn extend(&mut self, pairs: impl IntoIterator<Item = (String, String)>) {
        for (market, state) in pairs {
            self.states.insert(market, state.trim().to_ascii_uppercase());
        }
    }

    pub fn state_for(&self, market: &str) -> Option<&str> {
        self.states.get(market).map(String::as_str)
    }
}

/// Parse a `Market=ST` CLI pair.
pub fn parse_market_state(s: &str) -> Result<(String, String), String> {
    let (market, state) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid mapping '{s}'. Expected Market=ST."))?;
    let market = market.trim();
    let state = state.trim();
    if market.is_empty() || state.is_empty() {
        return Err(format!("Invalid mapping '{s}'. Expected Market=ST."));
    }
    Ok((market.to_string(), state.to_string()))
}

/// Mean unemployment rate per `(state, period)`.
pub fn quarterly_unemployment(records: &[UnemploymentRecord]) -> BTreeMap<(String, Period), f64> {
    let mut sums: BTreeMap<(String, Period), (f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = sums.entry((r.state.clone(), r.period)).or_insert((0.0, 0));
        entry.0 += r.rate;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, n))| (key, sum / n as f64))
        .collect()
}

/// Per-market comparison of occupancy against state unemployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketCorrelation {
    pub market: String,
    pub state: String,
    /// Number of quarters with both occupancy and unemployment.
    pub n: usize,
    /// Pearson correlation; `NaN` when either series is constant.
    pub correlation: f64,
    /// Occupancy change per percentage point of unemployment, when defined.
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub correlations: Vec<MarketCorrelation>,
    /// Markets left out and why.
    pub skipped: Vec<(String, String)>,
}

/// Correlate each market's occupancy with its state's quarterly unemployment.
///
/// Results are ordered by correlation ascending (most negative first), NaN last,
/// ties by market name.
pub fn correlate_unemployment(
    observations: &[ObservationRecord],
    unemployment: &[UnemploymentRecord],
    map: &MarketStateMap,
) -> CorrelationReport {
    let quarterly = quarterly_unemployment(unemployment);

    let mut by_market: BTreeMap<&str, BTreeMap<Period, f64>> = BTreeMap::new();
    for o in observations {
        // First observation per period wins, matching the recovery calculator.
        by_market
            .entry(o.entity.as_str())
            .or_default()
            .entry(o.period)
            .or_insert(o.value);
    }

    let mut report = CorrelationReport::default();

    for (market, series) in by_market {
        let Some(state) = map.state_for(market) else {
            report
                .skipped
                .push((market.to_string(), "no state mapping".to_string()));
            continue;
        };

        let (rates, occupancy): (Vec<f64>, Vec<f64>) = series
            .iter()
            .filter_map(|(period, value)| {
                quarterly
                    .get(&(state.to_string(), *period))
                    .map(|rate| (*rate, *value))
            })
            .unzip();

        if rates.len() < 2 {
            report.skipped.push((
                market.to_string(),
                format!("only {} quarter(s) with {state} unemployment data", rates.len()),
            ));
            continue;
        }

        let line = fit_line(&rates, &occupancy);
        report.correlations.push(MarketCorrelation {
            market: market.to_string(),
            state: state.to_string(),
            n: rates.len(),
            correlation: pearson(&rates, &occupancy),
            slope: line.map(|l| l.slope),
            intercept: line.map(|l| l.intercept),
        });
    }

    report.correlations.sort_by(|a, b| {
        let by_corr = match (a.correlation.is_nan(), b.correlation.is_nan()) {
            (false, false) => a
                .correlation
                .partial_cmp(&b.correlation)
                .unwrap_or(Ordering::Equal),
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => Ordering::Equal,
        };
        by_corr.then_with(|| a.market.cmp(&b.market))
    });

    report
}

/// States referenced by the mapping that never appear in the unemployment data.
pub fn unmatched_states(map: &MarketStateMap, unemployment: &[UnemploymentRecord]) -> Vec<String> {
    let present: BTreeSet<&str> = unemployment.iter().map(|r| r.state.as_str()).collect();
    let wanted: BTreeSet<&str> = map.states.values().map(String::as_str).collect();
    wanted
        .difference(&present)
        .map(|s| s.to_string())
        .collect()
}
