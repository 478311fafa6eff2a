//! Baseline / trough / current recovery metrics per market.
//!
//! For every entity present at the baseline period:
//! - trough = minimum value over all periods (earliest period wins a tie)
//! - current = latest period, or a pinned period when configured
//! - ratios = value / baseline * 100
//!
//! Results are sorted by current ratio (descending), then entity name. Entities
//! that cannot be summarized are reported as `Diagnostic`s rather than errors.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::{Diagnostic, ObservationRecord, Period, RecoveryReport, RecoverySummary};

/// Stateless recovery calculator. Cheap to construct; reuse freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryCalculator {
    baseline: Period,
    current: Option<Period>,
}

impl RecoveryCalculator {
    pub fn new(baseline: Period) -> Self {
        Self { baseline, current: None }
    }

    /// Use `period` as "current" for every entity instead of each entity's latest.
    pub fn with_current(mut self, period: Period) -> Self {
        self.current = Some(period);
        self
    }

    /// Compute summaries for `observations`. Pure: same input, same report.
    pub fn compute(&self, observations: &[ObservationRecord]) -> RecoveryReport {
        let mut diagnostics = Vec::new();
        let mut summaries = Vec::new();

        for (entity, mut series) in group_by_entity(observations) {
            dedup_periods(entity, &mut series, &mut diagnostics);

            let Some(baseline) = value_at(&series, self.baseline) else {
                diagnostics.push(Diagnostic::MissingBaseline {
                    entity: entity.to_string(),
                });
                continue;
            };

            let current = match self.current {
                Some(period) => match value_at(&series, period) {
                    Some(rec) => rec,
                    None => {
                        diagnostics.push(Diagnostic::MissingCurrent {
                            entity: entity.to_string(),
                            period,
                        });
                        continue;
                    }
                },
                // Series is sorted by period, so the last record is the latest.
                None => {
                    let Some(rec) = series.last() else { continue };
                    *rec
                }
            };

            let Some(trough) = find_trough(entity, &series, &mut diagnostics) else {
                diagnostics.push(Diagnostic::NoTrough {
                    entity: entity.to_string(),
                });
                continue;
            };

            let (trough_ratio, current_ratio) = if baseline.value == 0.0 {
                diagnostics.push(Diagnostic::ZeroBaseline {
                    entity: entity.to_string(),
                });
                (f64::NAN, f64::NAN)
            } else if !baseline.value.is_finite() {
                diagnostics.push(Diagnostic::UndefinedBaseline {
                    entity: entity.to_string(),
                });
                (f64::NAN, f64::NAN)
            } else {
                (
                    trough.value / baseline.value * 100.0,
                    current.value / baseline.value * 100.0,
                )
            };

            summaries.push(RecoverySummary {
                entity: entity.to_string(),
                baseline_period: baseline.period,
                baseline_value: baseline.value,
                trough_period: trough.period,
                trough_value: trough.value,
                current_period: current.period,
                current_value: current.value,
                trough_ratio,
                current_ratio,
            });
        }

        summaries.sort_by(compare_summaries);

        RecoveryReport { summaries, diagnostics }
    }
}

/// Compute recovery summaries against `baseline`, using each entity's latest
/// period as "current".
pub fn compute_recovery(observations: &[ObservationRecord], baseline: Period) -> RecoveryReport {
    RecoveryCalculator::new(baseline).compute(observations)
}

fn group_by_entity(observations: &[ObservationRecord]) -> BTreeMap<&str, Vec<&ObservationRecord>> {
    let mut groups: BTreeMap<&str, Vec<&ObservationRecord>> = BTreeMap::new();
    for obs in observations {
        groups.entry(obs.entity.as_str()).or_default().push(obs);
    }
    groups
}

/// Sort by period and keep only the first record for each period.
fn dedup_periods(entity: &str, series: &mut Vec<&ObservationRecord>, diagnostics: &mut Vec<Diagnostic>) {
    // Stable sort: among duplicates, input order is preserved.
    series.sort_by_key(|r| r.period);

    let mut seen: Option<Period> = None;
    series.retain(|r| {
        if seen == Some(r.period) {
            diagnostics.push(Diagnostic::DuplicateObservation {
                entity: entity.to_string(),
                period: r.period,
            });
            return false;
        }
        seen = Some(r.period);
        true
    });
}

fn value_at<'a>(series: &[&'a ObservationRecord], period: Period) -> Option<&'a ObservationRecord> {
    series
        .binary_search_by_key(&period, |r| r.period)
        .ok()
        .map(|idx| series[idx])
}

/// Minimum value over the (period-sorted) series; NaN values never win.
fn find_trough<'a>(
    entity: &str,
    series: &[&'a ObservationRecord],
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<&'a ObservationRecord> {
    let mut best: Option<&ObservationRecord> = None;
    for rec in series.iter().copied().filter(|r| !r.value.is_nan()) {
        // Strict `<` keeps the earliest period on ties.
        if best.is_none_or(|b| rec.value < b.value) {
            best = Some(rec);
        }
    }
    let best = best?;

    let tied: Vec<Period> = series
        .iter()
        .filter(|r| r.value == best.value)
        .map(|r| r.period)
        .collect();
    if tied.len() > 1 {
        diagnostics.push(Diagnostic::TiedTrough {
            entity: entity.to_string(),
            periods: tied,
        });
    }

    Some(best)
}

/// Current ratio descending, NaN last, then entity ascending.
fn compare_summaries(a: &RecoverySummary, b: &RecoverySummary) -> Ordering {
    let by_ratio = match (a.current_ratio.is_nan(), b.current_ratio.is_nan()) {
        (false, false) => b
            .current_ratio
            .partial_cmp(&a.current_ratio)
            .unwrap_or(Ordering::Equal),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
    };
    by_ratio.then_with(|| a.entity.cmp(&b.entity))
}
