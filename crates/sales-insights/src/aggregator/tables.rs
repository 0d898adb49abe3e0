//! Typed rows of the five summary tables.

use crate::types::AgeGroup;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Total sales of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySales {
    /// First day of the month.
    pub month: NaiveDate,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSales {
    pub customer_id: String,
    pub total_sales: f64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySales {
    pub category: String,
    pub total_sales: f64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroupSales {
    pub age_group: AgeGroup,
    pub total_sales: f64,
    pub quantity: i64,
}

/// One gender's sales across the categories of a [`GenderCategorySales`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderSalesRow {
    pub gender: String,
    /// Parallel to [`GenderCategorySales::categories`]; `None` where the
    /// gender bought nothing in that category.
    pub sales: Vec<Option<f64>>,
}

/// Gender by category matrix of total sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenderCategorySales {
    pub categories: Vec<String>,
    pub rows: Vec<GenderSalesRow>,
}

impl GenderCategorySales {
    /// Sales for one cell, `None` when the combination has no records.
    pub fn get(&self, gender: &str, category: &str) -> Option<f64> {
        let column = self.categories.iter().position(|c| c == category)?;
        self.rows
            .iter()
            .find(|row| row.gender == gender)
            .and_then(|row| row.sales.get(column).copied().flatten())
    }

    pub fn genders(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.gender.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The five summary tables for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub year: i32,
    /// One row per month present, ascending.
    pub monthly: Vec<MonthlySales>,
    /// Ranked by descending sales, ties by ascending id.
    pub customers: Vec<CustomerSales>,
    /// Ranked by descending sales, ties by ascending name.
    pub categories: Vec<CategorySales>,
    /// Always the six buckets in ascending order.
    pub age_groups: Vec<AgeGroupSales>,
    pub gender_categories: GenderCategorySales,
}

impl SalesSummary {
    /// Revenue for the year, the sum of the monthly totals.
    pub fn total_sales(&self) -> f64 {
        self.monthly.iter().map(|m| m.total_sales).sum()
    }

    /// True when no transaction fell in the year.
    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty()
    }
}
