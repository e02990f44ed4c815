//! Common utilities for report generation.
//!
//! Shared helpers for date formatting and output file naming.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

use super::period::ReportType;

/// Format a date the way report headers show it (e.g. "2025年3月14日").
pub fn format_japanese_date(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// Deterministic artifact path:
/// `<root>/customer_<id>/<type>_report_<report id>_<timestamp>.pdf`.
pub fn report_output_path(
    reports_root: &Path,
    customer_id: i64,
    report_type: ReportType,
    report_id: i64,
    generated_at: NaiveDateTime,
) -> PathBuf {
    let filename = format!(
        "{}_report_{}_{}.pdf",
        report_type.as_str(),
        report_id,
        generated_at.format("%Y%m%d%H%M%S")
    );
    reports_root
        .join(format!("customer_{}", customer_id))
        .join(filename)
}
