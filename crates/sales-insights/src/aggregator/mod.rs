//! Summary tables computed from the transactions of one year.
//!
//! Grouping runs on polars lazy frames; ordering is applied afterwards on the
//! typed rows so ties resolve the same way on every run.

mod tables;

pub use tables::{
    AgeGroupSales, CategorySales, CustomerSales, GenderCategorySales, GenderSalesRow,
    MonthlySales, SalesSummary,
};

use crate::error::{Result, ResultExt};
use crate::schema::{AGE_GROUP, CUSTOMER_ID, DATE, GENDER, PRODUCT_CATEGORY, QUANTITY, TOTAL_PRICE};
use crate::types::AgeGroup;
use crate::utils::{compare_keys, f64_values, i64_values, require_dtype, string_values};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

const YEAR_KEY: &str = "year";
const MONTH_KEY: &str = "month";

/// Computes the five summary tables. Every operation is independent and
/// reads only the frame it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct SalesAggregator;

/// Key with its summed sales and quantity.
type KeyedTotal = (String, f64, i64);

impl SalesAggregator {
    /// Compute all five tables for the transactions of `year`.
    ///
    /// `df` is expected to be filtered to `year` already.
    pub fn aggregate(&self, df: &DataFrame, year: i32) -> Result<SalesSummary> {
        info!("Aggregating {} transactions for {}", df.height(), year);

        let summary = SalesSummary {
            year,
            monthly: self.monthly_sales(df).context("Monthly sales")?,
            customers: self.customer_sales(df).context("Customer sales")?,
            categories: self.category_sales(df).context("Category sales")?,
            age_groups: self.age_group_sales(df).context("Age group sales")?,
            gender_categories: self
                .gender_category_sales(df)
                .context("Gender by category sales")?,
        };

        debug!(
            "{} months, {} customers, {} categories, {} genders",
            summary.monthly.len(),
            summary.customers.len(),
            summary.categories.len(),
            summary.gender_categories.rows.len()
        );
        Ok(summary)
    }

    /// Total sales per calendar month present, ascending by month.
    pub fn monthly_sales(&self, df: &DataFrame) -> Result<Vec<MonthlySales>> {
        require_dtype(df, DATE, &DataType::Date)?;

        let grouped = df
            .clone()
            .lazy()
            .group_by([
                col(DATE).dt().year().cast(DataType::Int32).alias(YEAR_KEY),
                col(DATE).dt().month().cast(DataType::Int32).alias(MONTH_KEY),
            ])
            .agg([col(TOTAL_PRICE).sum()])
            .collect()?;

        let years = i64_values(&grouped, YEAR_KEY)?;
        let months = i64_values(&grouped, MONTH_KEY)?;
        let totals = f64_values(&grouped, TOTAL_PRICE)?;

        let mut monthly: Vec<MonthlySales> = years
            .into_iter()
            .zip(months)
            .zip(totals)
            .filter_map(|((year, month), total)| {
                let month = NaiveDate::from_ymd_opt(
                    i32::try_from(year?).ok()?,
                    u32::try_from(month?).ok()?,
                    1,
                )?;
                Some(MonthlySales {
                    month,
                    total_sales: total.unwrap_or(0.0),
                })
            })
            .collect();

        monthly.sort_by_key(|m| m.month);
        Ok(monthly)
    }

    /// Sales and quantity per customer, highest spender first.
    pub fn customer_sales(&self, df: &DataFrame) -> Result<Vec<CustomerSales>> {
        Ok(ranked(keyed_totals(df, CUSTOMER_ID)?)
            .into_iter()
            .map(|(customer_id, total_sales, quantity)| CustomerSales {
                customer_id,
                total_sales,
                quantity,
            })
            .collect())
    }

    /// Sales and quantity per product category, best seller first.
    pub fn category_sales(&self, df: &DataFrame) -> Result<Vec<CategorySales>> {
        Ok(ranked(keyed_totals(df, PRODUCT_CATEGORY)?)
            .into_iter()
            .map(|(category, total_sales, quantity)| CategorySales {
                category,
                total_sales,
                quantity,
            })
            .collect())
    }

    /// Sales and quantity for each of the six age buckets, in bucket order.
    ///
    /// Records without a bucket are left out; empty buckets carry zeros.
    pub fn age_group_sales(&self, df: &DataFrame) -> Result<Vec<AgeGroupSales>> {
        let totals: HashMap<AgeGroup, (f64, i64)> = keyed_totals(df, AGE_GROUP)?
            .into_iter()
            .filter_map(|(label, total, quantity)| {
                AgeGroup::from_label(&label).map(|group| (group, (total, quantity)))
            })
            .collect();

        Ok(AgeGroup::ALL
            .into_iter()
            .map(|age_group| {
                let (total_sales, quantity) = totals.get(&age_group).copied().unwrap_or((0.0, 0));
                AgeGroupSales {
                    age_group,
                    total_sales,
                    quantity,
                }
            })
            .collect())
    }

    /// Gender by category matrix of total sales, both axes ascending.
    pub fn gender_category_sales(&self, df: &DataFrame) -> Result<GenderCategorySales> {
        let grouped = df
            .clone()
            .lazy()
            .group_by([col(GENDER), col(PRODUCT_CATEGORY)])
            .agg([col(TOTAL_PRICE).sum()])
            .collect()?;

        let cells: Vec<(String, String, f64)> = string_values(&grouped, GENDER)?
            .into_iter()
            .zip(string_values(&grouped, PRODUCT_CATEGORY)?)
            .zip(f64_values(&grouped, TOTAL_PRICE)?)
            .filter_map(|((gender, category), total)| {
                Some((gender?, category?, total.unwrap_or(0.0)))
            })
            .collect();

        let mut genders: Vec<String> = cells.iter().map(|(g, _, _)| g.clone()).collect();
        genders.sort_by(|a, b| compare_keys(a, b));
        genders.dedup();
        let mut categories: Vec<String> = cells.iter().map(|(_, c, _)| c.clone()).collect();
        categories.sort_by(|a, b| compare_keys(a, b));
        categories.dedup();

        let mut rows: Vec<GenderSalesRow> = genders
            .into_iter()
            .map(|gender| GenderSalesRow {
                gender,
                sales: vec![None; categories.len()],
            })
            .collect();

        for (gender, category, total) in cells {
            let row = rows.iter_mut().find(|row| row.gender == gender);
            let column = categories.iter().position(|c| *c == category);
            if let (Some(row), Some(column)) = (row, column) {
                row.sales[column] = Some(total);
            }
        }

        Ok(GenderCategorySales { categories, rows })
    }
}

/// Sum sales and quantity per distinct non-null value of `key`.
fn keyed_totals(df: &DataFrame, key: &str) -> Result<Vec<KeyedTotal>> {
    let grouped = df
        .clone()
        .lazy()
        .group_by([col(key)])
        .agg([col(TOTAL_PRICE).sum(), col(QUANTITY).sum()])
        .collect()?;

    let keys = string_values(&grouped, key)?;
    let totals = f64_values(&grouped, TOTAL_PRICE)?;
    let quantities = i64_values(&grouped, QUANTITY)?;

    Ok(keys
        .into_iter()
        .zip(totals)
        .zip(quantities)
        .filter_map(|((key, total), quantity)| {
            Some((key?, total.unwrap_or(0.0), quantity.unwrap_or(0)))
        })
        .collect())
}

/// Order by descending sales, ties by ascending key.
fn ranked(mut rows: Vec<KeyedTotal>) -> Vec<KeyedTotal> {
    rows.sort_by(|a, b| compare_keys(&a.0, &b.0));
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    rows
}
