//! Type conversion functions for data cleaning.
//!
//! Conversions are strict: blank cells become nulls, anything else must parse
//! or the whole run fails with the offending row and value.

use crate::error::{Result, SalesError};
use crate::utils::{epoch_days, is_numeric_dtype};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Date-only layouts accepted in the `Date` column.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Timestamp layouts accepted in the `Date` column; the time is discarded.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse each non-blank cell with `parse`, keeping blanks as nulls.
fn parse_cells<T>(
    series: &Series,
    expected: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    let values = series.str()?;
    let mut parsed = Vec::with_capacity(values.len());

    for (idx, value) in values.into_iter().enumerate() {
        match value.map(str::trim) {
            None | Some("") => parsed.push(None),
            Some(text) => match parse(text) {
                Some(v) => parsed.push(Some(v)),
                None => {
                    return Err(SalesError::InvalidValue {
                        column: series.name().to_string(),
                        row: idx + 1,
                        value: text.to_string(),
                        expected: expected.to_string(),
                    });
                }
            },
        }
    }

    Ok(parsed)
}

fn unsupported(series: &Series, expected: &str) -> SalesError {
    SalesError::InvalidColumnType {
        column: series.name().to_string(),
        expected: expected.to_string(),
        found: series.dtype().to_string(),
    }
}

/// Trim text cells, turning blank ones into nulls.
pub(crate) fn string_to_trimmed(series: &Series) -> Result<Series> {
    if series.dtype() != &DataType::String {
        return Ok(series.cast(&DataType::String)?);
    }

    let values: Vec<Option<String>> = series
        .str()?
        .into_iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        })
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

/// Whole numbers an f64 can hold without leaving i64.
const I64_RANGE: std::ops::Range<f64> =
    -9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0;

/// Convert a text column to Int64.
///
/// Integral decimals such as `"2.0"` are accepted, fractional ones are not.
pub(crate) fn string_to_i64(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::Int64 => Ok(series.clone()),
        DataType::String => {
            let values = parse_cells(series, "integer", |text| {
                text.parse::<i64>().ok().or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|v| v.fract() == 0.0 && I64_RANGE.contains(v))
                        .map(|v| v as i64)
                })
            })?;
            Ok(Series::new(series.name().clone(), values))
        }
        dtype if is_numeric_dtype(dtype) => Ok(series.cast(&DataType::Int64)?),
        _ => Err(unsupported(series, "integer")),
    }
}

/// Convert a text column to Float64.
pub(crate) fn string_to_f64(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::Float64 => Ok(series.clone()),
        DataType::String => {
            let values = parse_cells(series, "number", |text| {
                text.parse::<f64>().ok().filter(|v| v.is_finite())
            })?;
            Ok(Series::new(series.name().clone(), values))
        }
        dtype if is_numeric_dtype(dtype) => Ok(series.cast(&DataType::Float64)?),
        _ => Err(unsupported(series, "number")),
    }
}

/// Parse a calendar date from any accepted layout.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Convert a text column to a polars `Date` column.
pub(crate) fn string_to_date(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::Date => Ok(series.clone()),
        DataType::Datetime(_, _) => Ok(series.cast(&DataType::Date)?),
        DataType::String => {
            let days: Vec<Option<i32>> = parse_cells(series, "date (YYYY-MM-DD)", parse_date)?
                .into_iter()
                .map(|date| date.map(epoch_days))
                .collect();
            Ok(Series::new(series.name().clone(), days).cast(&DataType::Date)?)
        }
        _ => Err(unsupported(series, "date")),
    }
}
