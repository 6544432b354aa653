//! Reporting-period helpers.
//!
//! A reporting period is a calendar-month bucket in `YYYY-MM` form —
//! the aggregation grain for monthly summaries.

use chrono::{Datelike, NaiveDate};

use crate::error::CoreError;

/// Derive the reporting period from an activity date.
///
/// Example: 2024-03-17 → "2024-03".
pub fn period_from_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Validate an explicitly supplied reporting period.
///
/// Accepts exactly `YYYY-MM` with a month in 01..=12.
pub fn validate_period(period: &str) -> Result<(), CoreError> {
    let bytes = period.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && period[..4].chars().all(|c| c.is_ascii_digit())
        && period[5..].chars().all(|c| c.is_ascii_digit());
    if well_formed {
        if let Ok(month) = period[5..].parse::<u32>() {
            if (1..=12).contains(&month) {
                return Ok(());
            }
        }
    }
    Err(CoreError::Validation(format!(
        "invalid reporting period '{period}' (expected YYYY-MM)"
    )))
}
