//! Report period resolution.
//!
//! Converts a report's type, nominal date and free-form period label into a
//! concrete inclusive window of local date-times.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ReportError;

lazy_static! {
    static ref KANJI_MONTH: Regex = Regex::new(r"^\s*(\S+?)\s*年\s*(\S+?)\s*月\s*$").unwrap();
    static ref DASH_MONTH: Regex = Regex::new(r"^\s*([^-\s]+)-([^-\s]+)\s*$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Daily,
    Monthly,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for ReportType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            other => Err(ReportError::InvalidReportType(other.to_string())),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive `[start, end]` window in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PeriodWindow {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at <= self.end
    }
}

fn last_instant() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

fn day_window(date: NaiveDate) -> PeriodWindow {
    PeriodWindow {
        start: date.and_time(NaiveTime::MIN),
        end: date.and_time(last_instant()),
    }
}

/// Parse a month label written as `2025年03月` or `2025-03`.
pub fn parse_month_label(label: &str) -> Result<(i32, u32), ReportError> {
    let invalid = || ReportError::InvalidPeriodFormat(label.to_string());

    let captures = KANJI_MONTH
        .captures(label)
        .or_else(|| DASH_MONTH.captures(label))
        .ok_or_else(invalid)?;

    let year: i32 = captures[1].parse().map_err(|_| invalid())?;
    let month: u32 = captures[2].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

fn month_window(year: i32, month: u32, label: &str) -> Result<PeriodWindow, ReportError> {
    let invalid = || ReportError::InvalidPeriodFormat(label.to_string());
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next_first.pred_opt().ok_or_else(invalid)?;

    Ok(PeriodWindow {
        start: first.and_time(NaiveTime::MIN),
        end: last.and_time(last_instant()),
    })
}

/// Resolve the data window a report covers.
///
/// Daily reports cover the calendar day of `report_date`; monthly reports
/// cover the calendar month named by `report_period`.
pub fn resolve_period(
    report_type: &str,
    report_date: NaiveDate,
    report_period: &str,
) -> Result<PeriodWindow, ReportError> {
    match ReportType::from_str(report_type)? {
        ReportType::Daily => Ok(day_window(report_date)),
        ReportType::Monthly => {
            let (year, month) = parse_month_label(report_period)?;
            month_window(year, month, report_period)
        }
    }
}
