pub mod admin_logs;
pub mod categories;
pub mod customers;
pub mod items;
pub mod menus;
pub mod orders;
pub mod production;
pub mod reports;
pub mod subscriptions;

use crate::error::{AppError, Result};
use chrono::NaiveDate;
use rusqlite::ErrorCode;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| AppError::validation(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

/// Validates and normalises a `YYYY-MM-DD` date.
pub(crate) fn validate_date(value: &str) -> Result<String> {
    Ok(parse_date(value)?.format(DATE_FORMAT).to_string())
}

pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Blank optional strings are stored as NULL.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turns a UNIQUE violation into a conflict with a readable message.
pub(crate) fn unique_violation(err: rusqlite::Error, message: impl Into<String>) -> AppError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            AppError::conflict(message)
        }
        other => AppError::Database(other),
    }
}
