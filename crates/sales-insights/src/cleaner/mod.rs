//! Data cleaning module for transaction snapshots.
//!
//! This module provides functionality for:
//! - Coercing the nine source columns to their types
//! - Removing records that repeat a transaction id
//! - Dropping records with missing fields
//! - Deriving the age bucket of every record

mod converters;

use crate::error::{Result, ResultExt};
use crate::schema::{
    self, AGE, AGE_GROUP, CUSTOMER_ID, DATE, EXPECTED_COLUMNS, GENDER, PRICE_PER_UNIT,
    PRODUCT_CATEGORY, QUANTITY, TOTAL_PRICE, TRANSACTION_ID,
};
use crate::types::AgeGroup;
use crate::utils::{i64_values, require_column, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Row counts recorded while cleaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningStats {
    pub rows_before: usize,
    pub duplicates_removed: usize,
    pub incomplete_removed: usize,
    pub rows_after: usize,
    /// Remaining records whose age has no bucket.
    pub ungrouped_ages: usize,
}

impl CleaningStats {
    /// Human-readable description of what cleaning did.
    pub fn actions(&self) -> Vec<String> {
        let mut actions = Vec::new();

        if self.duplicates_removed > 0 {
            actions.push(format!(
                "Removed {} duplicate transactions ({:.1}%)",
                self.duplicates_removed,
                percentage(self.duplicates_removed, self.rows_before)
            ));
        } else {
            actions.push("No duplicate transactions found".to_string());
        }

        if self.incomplete_removed > 0 {
            actions.push(format!(
                "Removed {} transactions with missing fields ({:.1}%)",
                self.incomplete_removed,
                percentage(self.incomplete_removed, self.rows_before)
            ));
        } else {
            actions.push("No transactions with missing fields found".to_string());
        }

        if self.ungrouped_ages > 0 {
            actions.push(format!(
                "{} transactions have an age outside 0-{} and no age group",
                self.ungrouped_ages,
                AgeGroup::MAX_AGE
            ));
        }

        actions.push(format!(
            "Kept {} of {} transactions",
            self.rows_after, self.rows_before
        ));
        actions
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Data cleaner turning a loaded snapshot into typed, unique, complete records.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean a loaded snapshot.
    ///
    /// This includes:
    /// 1. Conforming the header to the expected schema
    /// 2. Coercing every source column to its type
    /// 3. Keeping the first record of each transaction id
    /// 4. Removing records with a missing source field
    /// 5. Adding the `Age_Group` column
    ///
    /// Cleaning an already cleaned frame returns an equal frame.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, CleaningStats)> {
        info!("Cleaning {} transactions...", df.height());

        let mut df = df;
        if df.get_column_index(AGE_GROUP).is_some() {
            df = df.drop(AGE_GROUP)?;
        }

        let df = schema::conform(df)?;
        let mut stats = CleaningStats {
            rows_before: df.height(),
            ..Default::default()
        };

        let df = self.coerce_types(df)?;

        let before = df.height();
        let df = self.remove_duplicates(df)?;
        stats.duplicates_removed = before - df.height();
        if stats.duplicates_removed > 0 {
            warn!(
                "Removed {} records with a repeated transaction id",
                stats.duplicates_removed
            );
        } else {
            debug!("No duplicate transaction ids found");
        }

        let before = df.height();
        let df = self.remove_incomplete(df)?;
        stats.incomplete_removed = before - df.height();
        if stats.incomplete_removed > 0 {
            warn!(
                "Removed {} records with missing fields",
                stats.incomplete_removed
            );
        } else {
            debug!("No records with missing fields found");
        }

        let (df, ungrouped) = self.add_age_groups(df)?;
        stats.ungrouped_ages = ungrouped;
        stats.rows_after = df.height();
        if ungrouped > 0 {
            warn!("{} records have an age outside every age group", ungrouped);
        }

        info!(
            "Cleaning kept {} of {} transactions",
            stats.rows_after, stats.rows_before
        );
        Ok((df, stats))
    }

    fn coerce_types(&self, mut df: DataFrame) -> Result<DataFrame> {
        for name in [TRANSACTION_ID, CUSTOMER_ID, GENDER, PRODUCT_CATEGORY] {
            let converted = converters::string_to_trimmed(require_column(&df, name)?)?;
            df.with_column(converted)?;
        }
        for name in [AGE, QUANTITY] {
            let converted = converters::string_to_i64(require_column(&df, name)?)?;
            df.with_column(converted)?;
        }
        for name in [PRICE_PER_UNIT, TOTAL_PRICE] {
            let converted = converters::string_to_f64(require_column(&df, name)?)?;
            df.with_column(converted)?;
        }
        let converted = converters::string_to_date(require_column(&df, DATE)?)?;
        df.with_column(converted)?;

        debug!("Coerced column types");
        Ok(df)
    }

    /// Keep the first record of every transaction id, in file order.
    fn remove_duplicates(&self, df: DataFrame) -> Result<DataFrame> {
        let ids = string_values(&df, TRANSACTION_ID)?;
        let mut seen = HashSet::with_capacity(ids.len());
        let keep: Vec<bool> = ids.into_iter().map(|id| seen.insert(id)).collect();

        if keep.iter().all(|&k| k) {
            return Ok(df);
        }
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        df.filter(&mask).context("Removing duplicate transactions")
    }

    /// Drop records with a null in any source column.
    fn remove_incomplete(&self, df: DataFrame) -> Result<DataFrame> {
        let mut keep = vec![true; df.height()];
        for name in EXPECTED_COLUMNS {
            let present = require_column(&df, name)?.is_not_null();
            for (k, ok) in keep.iter_mut().zip(&present) {
                *k &= ok.unwrap_or(false);
            }
        }

        if keep.iter().all(|&k| k) {
            return Ok(df);
        }
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        df.filter(&mask).context("Removing incomplete transactions")
    }

    /// Append `Age_Group` and count the records left without a bucket.
    fn add_age_groups(&self, mut df: DataFrame) -> Result<(DataFrame, usize)> {
        let groups: Vec<Option<&str>> = i64_values(&df, AGE)?
            .into_iter()
            .map(|age| age.and_then(AgeGroup::from_age).map(|group| group.label()))
            .collect();
        let ungrouped = groups.iter().filter(|group| group.is_none()).count();

        df.with_column(Series::new(AGE_GROUP.into(), groups))?;
        Ok((df, ungrouped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date_values;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn raw_frame(rows: &[[Option<&str>; 9]]) -> DataFrame {
        let columns: Vec<Column> = EXPECTED_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<Option<&str>> = rows.iter().map(|row| row[idx]).collect();
                Column::new((*name).into(), values)
            })
            .collect();
        DataFrame::new(columns).unwrap()
    }

    fn row<'a>(
        id: &'a str,
        date: &'a str,
        customer: &'a str,
        age: &'a str,
        total: &'a str,
    ) -> [Option<&'a str>; 9] {
        [
            Some(id),
            Some(date),
            Some(customer),
            Some("Male"),
            Some(age),
            Some("Clothing"),
            Some("1"),
            Some(total),
            Some(total),
        ]
    }

    #[test]
    fn test_clean_types_and_age_group() {
        let df = raw_frame(&[row("T1", "2023-01-05", "C1", "30", "40")]);
        let (cleaned, stats) = DataCleaner.clean(df).unwrap();

        assert_eq!(cleaned.width(), 10);
        assert_eq!(cleaned.column(DATE).unwrap().dtype(), &DataType::Date);
        assert_eq!(cleaned.column(AGE).unwrap().dtype(), &DataType::Int64);
        assert_eq!(cleaned.column(QUANTITY).unwrap().dtype(), &DataType::Int64);
        assert_eq!(cleaned.column(TOTAL_PRICE).unwrap().dtype(), &DataType::Float64);
        assert_eq!(
            string_values(&cleaned, AGE_GROUP).unwrap(),
            vec![Some("26-35".to_string())]
        );
        assert_eq!(
            date_values(&cleaned, DATE).unwrap(),
            vec![NaiveDate::from_ymd_opt(2023, 1, 5)]
        );
        assert_eq!(stats.rows_after, 1);
    }

    #[test]
    fn test_clean_keeps_first_duplicate() {
        let df = raw_frame(&[
            row("T1", "2023-01-05", "C1", "30", "40"),
            row("T2", "2023-02-10", "C2", "60", "500"),
            row("T1", "2023-03-01", "C9", "30", "999"),
        ]);
        let (cleaned, stats) = DataCleaner.clean(df).unwrap();

        assert_eq!(stats.duplicates_removed, 1);
        assert_eq!(
            string_values(&cleaned, CUSTOMER_ID).unwrap(),
            vec![Some("C1".to_string()), Some("C2".to_string())]
        );
    }

    #[test]
    fn test_clean_drops_incomplete_records() {
        let mut missing_gender = row("T2", "2023-02-10", "C2", "60", "500");
        missing_gender[3] = None;
        let mut blank_total = row("T3", "2023-02-11", "C3", "40", "10");
        blank_total[8] = Some("  ");

        let df = raw_frame(&[
            row("T1", "2023-01-05", "C1", "30", "40"),
            missing_gender,
            blank_total,
        ]);
        let (cleaned, stats) = DataCleaner.clean(df).unwrap();

        assert_eq!(cleaned.height(), 1);
        assert_eq!(stats.incomplete_removed, 2);
        assert_eq!(stats.rows_before, 3);
    }

    #[test]
    fn test_clean_out_of_range_age_keeps_record() {
        let df = raw_frame(&[row("T1", "2023-01-05", "C1", "150", "40")]);
        let (cleaned, stats) = DataCleaner.clean(df).unwrap();

        assert_eq!(cleaned.height(), 1);
        assert_eq!(stats.ungrouped_ages, 1);
        assert_eq!(string_values(&cleaned, AGE_GROUP).unwrap(), vec![None]);
    }

    #[test]
    fn test_clean_fails_on_unparseable_value() {
        let df = raw_frame(&[
            row("T1", "2023-01-05", "C1", "30", "40"),
            row("T2", "yesterday", "C2", "30", "40"),
        ]);
        let err = DataCleaner.clean(df).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VALUE");
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let df = raw_frame(&[
            row("T1", "2023-01-05", "C1", "30", "40"),
            row("T1", "2023-01-05", "C1", "30", "40"),
            row("T2", "2023-02-10", "C2", "150", "500"),
        ]);
        let (once, _) = DataCleaner.clean(df).unwrap();
        let (twice, stats) = DataCleaner.clean(once.clone()).unwrap();

        assert!(once.equals_missing(&twice));
        assert_eq!(stats.duplicates_removed, 0);
        assert_eq!(stats.incomplete_removed, 0);
    }

    #[test]
    fn test_cleaning_actions() {
        let stats = CleaningStats {
            rows_before: 10,
            duplicates_removed: 1,
            incomplete_removed: 0,
            rows_after: 9,
            ungrouped_ages: 2,
        };
        let actions = stats.actions();
        assert_eq!(actions[0], "Removed 1 duplicate transactions (10.0%)");
        assert_eq!(actions[1], "No transactions with missing fields found");
        assert!(actions[2].contains("2 transactions have an age outside"));
        assert_eq!(actions[3], "Kept 9 of 10 transactions");
    }
}
