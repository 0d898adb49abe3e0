//! Restricting cleaned transactions to one calendar year.

use crate::error::{Result, ResultExt};
use crate::schema::DATE;
use crate::utils::require_dtype;
use polars::prelude::*;
use tracing::debug;

/// Keep the records whose `Date` falls within `year`.
///
/// The input is left untouched. The result may be empty, and filtering it
/// again by the same year returns an equal frame.
pub fn filter_by_year(df: &DataFrame, year: i32) -> Result<DataFrame> {
    require_dtype(df, DATE, &DataType::Date)?;

    let filtered = df
        .clone()
        .lazy()
        .filter(col(DATE).dt().year().eq(lit(year)))
        .collect()
        .context(format!("Filtering transactions to {year}"))?;

    debug!(
        "Kept {} of {} transactions dated {}",
        filtered.height(),
        df.height(),
        year
    );
    Ok(filtered)
}
