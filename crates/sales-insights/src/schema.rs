//! Column names of the transaction snapshot and header validation.
//!
//! The snapshot is produced by an external SQL dump, so its header is not
//! trusted: names are compared after normalisation and the frame is either
//! renamed to the canonical names, re-aligned by name, or rejected with an
//! error naming the offending columns.

use crate::error::{Result, SalesError};
use polars::prelude::*;
use std::collections::HashSet;

pub const TRANSACTION_ID: &str = "Transaction ID";
pub const DATE: &str = "Date";
pub const CUSTOMER_ID: &str = "Customer_ID";
pub const GENDER: &str = "Gender";
pub const AGE: &str = "Age";
pub const PRODUCT_CATEGORY: &str = "Product_Category";
pub const QUANTITY: &str = "Quantity";
pub const PRICE_PER_UNIT: &str = "Price_Per_Unit";
pub const TOTAL_PRICE: &str = "Total_Price";

/// Derived bucket column added by the cleaner.
pub const AGE_GROUP: &str = "Age_Group";

/// The nine source columns, in snapshot order.
pub const EXPECTED_COLUMNS: [&str; 9] = [
    TRANSACTION_ID,
    DATE,
    CUSTOMER_ID,
    GENDER,
    AGE,
    PRODUCT_CATEGORY,
    QUANTITY,
    PRICE_PER_UNIT,
    TOTAL_PRICE,
];

/// Normalise a header cell for comparison.
///
/// Strips a UTF-8 BOM and surrounding whitespace, lowercases ASCII letters and
/// maps spaces and hyphens to underscores, so `"transaction-id "` and
/// `"Transaction ID"` compare equal.
pub fn normalize_column_name(name: &str) -> String {
    name.trim_start_matches('\u{feff}')
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Resolve a header against [`EXPECTED_COLUMNS`].
///
/// Returns, for each expected column, the index of the header cell that
/// carries it.
pub fn resolve_columns<S: AsRef<str>>(header: &[S]) -> Result<Vec<usize>> {
    if header.len() != EXPECTED_COLUMNS.len() {
        return Err(SalesError::ColumnCountMismatch {
            expected: EXPECTED_COLUMNS.len(),
            found: header.len(),
        });
    }

    let normalized: Vec<String> = header
        .iter()
        .map(|name| normalize_column_name(name.as_ref()))
        .collect();
    let expected: Vec<String> = EXPECTED_COLUMNS
        .iter()
        .map(|name| normalize_column_name(name))
        .collect();

    if normalized == expected {
        return Ok((0..EXPECTED_COLUMNS.len()).collect());
    }

    let mut positions = Vec::with_capacity(expected.len());
    let mut missing = Vec::new();
    for (canonical, wanted) in EXPECTED_COLUMNS.iter().zip(&expected) {
        match normalized.iter().position(|name| name == wanted) {
            Some(idx) => positions.push(idx),
            None => missing.push((*canonical).to_string()),
        }
    }

    let known: HashSet<&str> = expected.iter().map(String::as_str).collect();
    let unexpected: Vec<String> = header
        .iter()
        .zip(&normalized)
        .filter(|(_, name)| !known.contains(name.as_str()))
        .map(|(original, _)| original.as_ref().trim().to_string())
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(SalesError::SchemaMismatch {
            missing,
            unexpected,
        });
    }

    Ok(positions)
}

/// Return a frame holding exactly the nine source columns, in canonical order
/// and under their canonical names.
///
/// Idempotent: a frame that already conforms is returned unchanged.
pub fn conform(df: DataFrame) -> Result<DataFrame> {
    let header: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let positions = resolve_columns(&header)?;

    let columns = df.get_columns();
    let mut conformed = Vec::with_capacity(EXPECTED_COLUMNS.len());
    for (canonical, idx) in EXPECTED_COLUMNS.iter().zip(positions) {
        let mut column = columns[idx].clone();
        column.rename((*canonical).into());
        conformed.push(column);
    }

    Ok(DataFrame::new(conformed)?)
}
