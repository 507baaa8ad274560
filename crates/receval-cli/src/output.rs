//! Output formatting for evaluation results.
//!
//! Supports both a human-readable table and JSON for scripting. Undefined
//! metric values print as `n/a` in tables and `null` in JSON.

use receval_core::metrics::MetricResult;
use receval_core::pipeline::EvaluationReport;
use receval_core::stats::{interpret_cohens_d, BootstrapResult, TTestResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::PathBuf;

/// Width of the metric-name column
const NAME_WIDTH: usize = 10;
/// Width of each value column
const VALUE_WIDTH: usize = 9;

/// One fold written by `receval split`.
#[derive(Debug, Serialize)]
pub struct SplitFile {
    pub fold: usize,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub train_preferences: usize,
    pub test_preferences: usize,
}

/// Summary of `receval split`.
#[derive(Debug, Serialize)]
pub struct SplitSummary {
    pub input: PathBuf,
    pub users: usize,
    pub preferences: usize,
    pub folds: Vec<SplitFile>,
    pub warnings: usize,
}

/// Comparison of two prediction sets on one metric.
#[derive(Debug, Serialize)]
pub struct MetricComparison {
    pub metric: String,
    pub a: BootstrapResult,
    pub b: BootstrapResult,
    pub t_test: Option<TTestResult>,
    pub cohens_d: f64,
}

/// Result of `receval compare`.
#[derive(Debug, Serialize)]
pub struct ComparisonReport {
    pub a: PathBuf,
    pub b: PathBuf,
    pub comparisons: Vec<MetricComparison>,
}

/// Pretty-printed JSON.
pub fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an evaluation report as a table with one row per metric.
pub fn format_human(report: &EvaluationReport) -> String {
    if report.metrics.is_empty() {
        return "No metrics computed".to_string();
    }

    let cutoffs: BTreeSet<usize> = report
        .metrics
        .values()
        .flat_map(|m| m.per_cutoff.keys().copied())
        .collect();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Strategy: {} ({} fold{})\n",
        report.strategy,
        report.folds.len(),
        if report.folds.len() == 1 { "" } else { "s" }
    );

    let _ = write!(
        out,
        "{:<nw$}{:>vw$}",
        "metric",
        "all",
        nw = NAME_WIDTH,
        vw = VALUE_WIDTH
    );
    for k in &cutoffs {
        let _ = write!(out, "{:>vw$}", format!("@{}", k), vw = VALUE_WIDTH);
    }
    out.push('\n');

    for (name, result) in &report.metrics {
        let _ = write!(
            out,
            "{:<nw$}{:>vw$}",
            name,
            value(result.global),
            nw = NAME_WIDTH,
            vw = VALUE_WIDTH
        );
        for &k in &cutoffs {
            let cell = if result.per_cutoff.contains_key(&k) {
                value(result.at(k))
            } else {
                String::new()
            };
            let _ = write!(out, "{:>vw$}", cell, vw = VALUE_WIDTH);
        }
        out.push('\n');
    }

    let notes = coverage_notes(report);
    if !notes.is_empty() {
        out.push('\n');
        out.push_str(&notes);
    }

    out.trim_end().to_string()
}

fn coverage_notes(report: &EvaluationReport) -> String {
    let mut out = String::new();
    for (name, result) in &report.metrics {
        if let Some(c) = result.coverage {
            let _ = writeln!(
                out,
                "{}: compared {} pairs, skipped {} (missing users) + {} (missing items)",
                name, c.compared, c.empty_users, c.empty_items
            );
        }
    }
    let failures: usize = report.folds.iter().map(|f| f.recommendation_failures).sum();
    if failures > 0 {
        let _ = writeln!(out, "recommender failed for {} user(s)", failures);
    }
    if !report.warnings.is_empty() {
        let _ = writeln!(
            out,
            "{} user(s) have too few ratings for a test preference",
            report.warnings.len()
        );
    }
    out
}

/// Formats a split summary.
pub fn format_split(summary: &SplitSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Split {} ({} users, {} preferences) into {} fold{}:",
        summary.input.display(),
        summary.users,
        summary.preferences,
        summary.folds.len(),
        if summary.folds.len() == 1 { "" } else { "s" }
    );
    for fold in &summary.folds {
        let _ = writeln!(
            out,
            "  {}. train {:>8} → {}",
            fold.fold,
            fold.train_preferences,
            fold.train_path.display()
        );
        let _ = writeln!(
            out,
            "     test  {:>8} → {}",
            fold.test_preferences,
            fold.test_path.display()
        );
    }
    if summary.warnings > 0 {
        let _ = writeln!(
            out,
            "{} user(s) have too few ratings for a test preference",
            summary.warnings
        );
    }
    out.trim_end().to_string()
}

/// Formats a two-system comparison.
pub fn format_comparison(report: &ComparisonReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "A: {}", report.a.display());
    let _ = writeln!(out, "B: {}\n", report.b.display());

    for cmp in &report.comparisons {
        let _ = writeln!(out, "{}", cmp.metric);
        let _ = writeln!(out, "  A      {}", cmp.a.format(4));
        let _ = writeln!(out, "  B      {}", cmp.b.format(4));
        match &cmp.t_test {
            Some(t) => {
                let _ = writeln!(out, "  test   {} ({} users)", t.format(), t.pairs);
            }
            None => {
                let _ = writeln!(out, "  test   n/a (fewer than 2 paired users)");
            }
        }
        let _ = writeln!(
            out,
            "  effect d={:.3} ({})",
            cmp.cohens_d,
            interpret_cohens_d(cmp.cohens_d)
        );
    }
    out.trim_end().to_string()
}

/// Metric values for the users scored on `result`, NaN dropped.
pub fn defined_values(result: &MetricResult) -> Vec<f64> {
    result
        .per_user
        .values()
        .copied()
        .filter(|v| !v.is_nan())
        .collect()
}

fn value(v: f64) -> String {
    if v.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.4}", v)
    }
}
