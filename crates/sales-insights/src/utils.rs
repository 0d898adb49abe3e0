//! Shared utilities for the sales pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use crate::error::{Result, SalesError};
use chrono::NaiveDate;
use polars::prelude::*;
use std::cmp::Ordering;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Look up a column as a materialized Series.
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|column| column.as_materialized_series())
        .map_err(|_| SalesError::ColumnNotFound(name.to_string()))
}

/// Fail with `InvalidColumnType` unless the column has exactly `dtype`.
pub fn require_dtype(df: &DataFrame, name: &str, dtype: &DataType) -> Result<()> {
    let series = require_column(df, name)?;
    if series.dtype() != dtype {
        return Err(SalesError::InvalidColumnType {
            column: name.to_string(),
            expected: dtype.to_string(),
            found: series.dtype().to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Value Extraction Utilities
// =============================================================================

/// Collect a column as owned strings, nulls preserved.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = require_column(df, name)?.cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Collect a numeric column as f64, nulls preserved.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = require_column(df, name)?;
    if !is_numeric_dtype(series.dtype()) {
        return Err(SalesError::InvalidColumnType {
            column: name.to_string(),
            expected: "numeric".to_string(),
            found: series.dtype().to_string(),
        });
    }
    let series = series.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Collect an integer column as i64, nulls preserved.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = require_column(df, name)?;
    if !is_numeric_dtype(series.dtype()) {
        return Err(SalesError::InvalidColumnType {
            column: name.to_string(),
            expected: "integer".to_string(),
            found: series.dtype().to_string(),
        });
    }
    let series = series.cast(&DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

/// Collect a `Date` column as calendar dates, nulls preserved.
pub fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    require_dtype(df, name, &DataType::Date)?;
    let days = require_column(df, name)?.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|value| value.and_then(date_from_epoch_days))
        .collect())
}

// =============================================================================
// Date Utilities
// =============================================================================

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

/// Convert a polars `Date` physical value (days since the Unix epoch).
pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_FROM_CE)?)
}

/// Convert a calendar date to days since the Unix epoch.
pub fn epoch_days(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - UNIX_EPOCH_FROM_CE
}

// =============================================================================
// Ordering and Formatting Utilities
// =============================================================================

/// Order two group keys: numerically when both parse as integers,
/// lexicographically otherwise.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// Format an amount as dollars with thousands separators, e.g. `$1,234.56`.
pub fn format_currency(amount: f64) -> String {
    let rounded = format!("{:.2}", amount.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

// =============================================================================
// Tests
// =============================================================================
