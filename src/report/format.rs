//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the metric code stays clean and testable
//! - output changes are localized

use crate::analysis::{CorrelationReport, GroupSummary};
use crate::domain::{Diagnostic, Period, RecoverySummary};
use crate::io::ingest::{DatasetStats, IngestedData, RowError};

/// Shown wherever a ratio is undefined (zero baseline, empty group).
const NOT_AVAILABLE: &str = "N/A";

/// Dataset header printed above every table.
pub fn format_run_summary(ingest: &IngestedData, baseline: Period, current: Option<Period>) -> String {
    let mut out = String::new();

    out.push_str("=== cre - Office Market Recovery ===\n");
    out.push_str(&format_stats(&ingest.stats));
    out.push_str(&format!(
        "Rows: read={} | used={} | skipped={} | filtered={}\n",
        ingest.rows_read,
        ingest.rows_used(),
        ingest.row_errors.len(),
        ingest.rows_filtered
    ));
    out.push_str(&format!("Baseline: {baseline}\n"));
    match current {
        Some(p) => out.push_str(&format!("Current: {p} (pinned)\n")),
        None => out.push_str("Current: latest per market\n"),
    }
    out.push('\n');

    out
}

fn format_stats(stats: &DatasetStats) -> String {
    format!(
        "Data: markets={} | records={} | periods=[{}, {}] | value=[{:.3}, {:.3}]\n",
        stats.n_entities, stats.n_records, stats.first_period, stats.last_period, stats.value_min, stats.value_max
    )
}

/// Recovery table, optionally limited to the first `top_n` rows (0 = all).
pub fn format_recovery_table(summaries: &[RecoverySummary], top_n: usize) -> String {
    let limit = if top_n == 0 { summaries.len() } else { top_n };
    let mut out = String::new();

    push_line(
        &mut out,
        format!(
            "{:<22} {:>9} {:>8} {:>9} {:>8} {:>9} {:>8} {:>8} {:>8}",
            "market", "baseline", "value", "trough", "value", "current", "value", "trough%", "current%"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<22} {:-<9} {:-<8} {:-<9} {:-<8} {:-<9} {:-<8} {:-<8} {:-<8}",
            "", "", "", "", "", "", "", "", ""
        ),
    );

    for s in summaries.iter().take(limit) {
        push_line(
            &mut out,
            format!(
                "{:<22} {:>9} {:>8.3} {:>9} {:>8.3} {:>9} {:>8.3} {:>8} {:>8}",
                truncate(&s.entity, 22),
                s.baseline_period.to_string(),
                s.baseline_value,
                s.trough_period.to_string(),
                s.trough_value,
                s.current_period.to_string(),
                s.current_value,
                fmt_pct(s.trough_ratio),
                fmt_pct(s.current_ratio),
            ),
        );
    }

    if limit < summaries.len() {
        out.push_str(&format!("... {} more\n", summaries.len() - limit));
    }

    out
}

/// Diagnostics and row errors; empty string when there is nothing to report.
pub fn format_diagnostics(diagnostics: &[Diagnostic], row_errors: &[RowError]) -> String {
    let mut out = String::new();

    if !diagnostics.is_empty() {
        out.push_str("Diagnostics:\n");
        for d in diagnostics {
            out.push_str(&format!("- {d}\n"));
        }
    }

    if !row_errors.is_empty() {
        out.push_str(&format!("Skipped rows ({}):\n", row_errors.len()));
        for e in row_errors.iter().take(10) {
            out.push_str(&format!("- line {}: {}\n", e.line, e.message));
        }
        if row_errors.len() > 10 {
            out.push_str(&format!("- ... {} more\n", row_errors.len() - 10));
        }
    }

    out
}

pub fn format_correlations(report: &CorrelationReport) -> String {
    let mut out = String::new();

    push_line(
        &mut out,
        format!(
            "{:<22} {:<5} {:>4} {:>11} {:>10} {:>10}",
            "market", "state", "n", "correlation", "slope", "intercept"
        ),
    );
    push_line(
        &mut out,
        format!("{:-<22} {:-<5} {:-<4} {:-<11} {:-<10} {:-<10}", "", "", "", "", "", ""),
    );

    for c in &report.correlations {
        push_line(
            &mut out,
            format!(
                "{:<22} {:<5} {:>4} {:>11} {:>10} {:>10}",
                truncate(&c.market, 22),
                c.state,
                c.n,
                fmt_num(c.correlation, 3),
                c.slope.map(|v| fmt_num(v, 4)).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                c.intercept.map(|v| fmt_num(v, 4)).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
        );
    }

    if !report.skipped.is_empty() {
        out.push_str("\nSkipped markets:\n");
        for (market, reason) in &report.skipped {
            out.push_str(&format!("- {market}: {reason}\n"));
        }
    }

    out
}

pub fn format_groups(groups: &[GroupSummary]) -> String {
    let mut out = String::new();

    push_line(
        &mut out,
        format!("{:<20} {:>8} {:>9} {:<}", "group", "trough%", "current%", "markets"),
    );
    push_line(&mut out, format!("{:-<20} {:-<8} {:-<9} {:-<7}", "", "", "", ""));

    for g in groups {
        let mut members = g.present.join(", ");
        if !g.missing.is_empty() {
            members.push_str(&format!(" (missing: {})", g.missing.join(", ")));
        }
        push_line(
            &mut out,
            format!(
                "{:<20} {:>8} {:>9} {}",
                truncate(&g.name, 20),
                fmt_pct(g.mean_trough_ratio),
                fmt_pct(g.mean_current_ratio),
                members
            ),
        );
    }

    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_pct(v: f64) -> String {
    fmt_num(v, 1)
}

fn fmt_num(v: f64, decimals: usize) -> String {
    if v.is_finite() {
        format!("{v:.decimals$}")
    } else {
        NOT_AVAILABLE.to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Quarter;

    fn summary(entity: &str, baseline: f64, current: f64) -> RecoverySummary {
        RecoverySummary {
            entity: entity.to_string(),
            baseline_period: Period::new(2020, Quarter::Q1),
            baseline_value: baseline,
            trough_period: Period::new(2020, Quarter::Q2),
            trough_value: 0.0,
            current_period: Period::new(2024, Quarter::Q3),
            current_value: current,
            trough_ratio: if baseline == 0.0 { f64::NAN } else { 0.0 },
            current_ratio: if baseline == 0.0 { f64::NAN } else { current / baseline * 100.0 },
        }
    }

    #[test]
    fn recovery_table_shows_na_for_undefined_ratio() {
        let table = format_recovery_table(&[summary("Austin", 0.95, 0.70), summary("Test", 0.0, 0.5)], 0);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("Austin"));
        assert!(lines[2].ends_with("73.7"));
        assert!(lines[3].ends_with("N/A"));
    }

    #[test]
    fn recovery_table_respects_top_n() {
        let rows = vec![summary("A", 1.0, 0.9), summary("B", 1.0, 0.8), summary("C", 1.0, 0.7)];
        let table = format_recovery_table(&rows, 2);
        assert!(table.contains("... 1 more"));
        assert!(!table.lines().any(|l| l.starts_with("C ")));
    }

    #[test]
    fn diagnostics_section_is_empty_when_clean() {
        assert!(format_diagnostics(&[], &[]).is_empty());

        let text = format_diagnostics(
            &[Diagnostic::MissingBaseline {
                entity: "Phoenix".to_string(),
            }],
            &[RowError {
                line: 4,
                message: "Invalid year 'x'.".to_string(),
            }],
        );
        assert!(text.contains("Phoenix: no observation at the baseline period"));
        assert!(text.contains("line 4: Invalid year"));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("Washington D.C.", 32), "Washington D.C.");
        assert_eq!(truncate("South Bay/San Jose", 10), "South Bay.");
    }
}
