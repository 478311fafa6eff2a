//! Recovery averages over named market groups.

use serde::Serialize;

use crate::domain::RecoverySummary;

/// A named set of markets compared as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketGroup {
    pub name: String,
    pub members: Vec<String>,
}

impl MarketGroup {
    pub fn new(name: impl Into<String>, members: &[&str]) -> Self {
        Self {
            name: name.into(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// The stock groupings used in market commentary.
pub fn default_groups() -> Vec<MarketGroup> {
    vec![
        MarketGroup::new(
            "Tech Hubs",
            &["San Francisco", "South Bay/San Jose", "Austin", "Seattle"],
        ),
        MarketGroup::new("Financial Centers", &["Manhattan", "Chicago", "Boston"]),
        MarketGroup::new(
            "Regional Centers",
            &["Philadelphia", "Washington D.C.", "Los Angeles"],
        ),
        MarketGroup::new("Southern Markets", &["Dallas/Ft Worth", "Houston", "Austin"]),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    /// Members with a recovery summary.
    pub present: Vec<String>,
    /// Members absent from the recovery result.
    pub missing: Vec<String>,
    /// Mean over present members with a defined ratio; `NaN` if none.
    pub mean_trough_ratio: f64,
    pub mean_current_ratio: f64,
}

/// Average trough/current ratios for each group.
pub fn summarize_groups(summaries: &[RecoverySummary], groups: &[MarketGroup]) -> Vec<GroupSummary> {
    groups
        .iter()
        .map(|group| {
            let mut present = Vec::new();
            let mut missing = Vec::new();
            let mut members = Vec::new();

            for name in &group.members {
                match summaries.iter().find(|s| &s.entity == name) {
                    Some(s) => {
                        present.push(name.clone());
                        members.push(s);
                    }
                    None => missing.push(name.clone()),
                }
            }

            GroupSummary {
                name: group.name.clone(),
                present,
                missing,
                mean_trough_ratio: finite_mean(members.iter().map(|s| s.trough_ratio)),
                mean_current_ratio: finite_mean(members.iter().map(|s| s.current_ratio)),
            }
        })
        .collect()
}

fn finite_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Period, Quarter};

    fn summary(entity: &str, trough_ratio: f64, current_ratio: f64) -> RecoverySummary {
        let period = Period::new(2020, Quarter::Q1);
        RecoverySummary {
            entity: entity.to_string(),
            baseline_period: period,
            baseline_value: 1.0,
            trough_period: period,
            trough_value: trough_ratio / 100.0,
            current_period: period,
            current_value: current_ratio / 100.0,
            trough_ratio,
            current_ratio,
        }
    }

    #[test]
    fn averages_present_members_and_lists_missing() {
        let summaries = vec![
            summary("Manhattan", 20.0, 64.0),
            summary("Chicago", 30.0, 66.0),
            summary("Austin", 40.0, 74.0),
        ];
        let groups = summarize_groups(&summaries, &default_groups());

        let financial = groups.iter().find(|g| g.name == "Financial Centers").unwrap();
        assert_eq!(financial.present, ["Manhattan", "Chicago"]);
        assert_eq!(financial.missing, ["Boston"]);
        assert!((financial.mean_current_ratio - 65.0).abs() < 1e-12);
        assert!((financial.mean_trough_ratio - 25.0).abs() < 1e-12);

        let regional = groups.iter().find(|g| g.name == "Regional Centers").unwrap();
        assert!(regional.present.is_empty());
        assert!(regional.mean_current_ratio.is_nan());
    }

    #[test]
    fn undefined_ratios_do_not_poison_the_mean() {
        let summaries = vec![summary("Houston", f64::NAN, f64::NAN), summary("Austin", 40.0, 74.0)];
        let groups = summarize_groups(&summaries, &[MarketGroup::new("Texas", &["Houston", "Austin"])]);
        assert_eq!(groups[0].present.len(), 2);
        assert_eq!(groups[0].mean_current_ratio, 74.0);
    }
}
