//! Headline figures derived from the summary tables.

use crate::aggregator::{AgeGroupSales, CategorySales, CustomerSales, MonthlySales, SalesSummary};
use serde::{Deserialize, Serialize};

/// Scalars the text report is built from.
///
/// Every "best" or "worst" pick is `None` when the year has no matching
/// records. Ties resolve to the earliest row of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInsights {
    pub year: i32,
    pub highest_month: Option<MonthlySales>,
    pub lowest_month: Option<MonthlySales>,
    /// Sum of the monthly totals.
    pub total_sales: f64,
    pub top_customer: Option<CustomerSales>,
    pub unique_customers: usize,
    pub top_category: Option<CategorySales>,
    pub unique_categories: usize,
    /// Bucket with the highest sales; `None` when no record has a bucket.
    pub top_age_group: Option<AgeGroupSales>,
}

impl SalesInsights {
    pub fn from_summary(summary: &SalesSummary) -> Self {
        let mut highest: Option<&MonthlySales> = None;
        let mut lowest: Option<&MonthlySales> = None;
        for month in &summary.monthly {
            if highest.is_none_or(|h| month.total_sales > h.total_sales) {
                highest = Some(month);
            }
            if lowest.is_none_or(|l| month.total_sales < l.total_sales) {
                lowest = Some(month);
            }
        }

        let mut top_age_group: Option<&AgeGroupSales> = None;
        for group in summary
            .age_groups
            .iter()
            .filter(|g| g.total_sales != 0.0 || g.quantity != 0)
        {
            if top_age_group.is_none_or(|t| group.total_sales > t.total_sales) {
                top_age_group = Some(group);
            }
        }

        Self {
            year: summary.year,
            highest_month: highest.cloned(),
            lowest_month: lowest.cloned(),
            total_sales: summary.total_sales(),
            top_customer: summary.customers.first().cloned(),
            unique_customers: summary.customers.len(),
            top_category: summary.categories.first().cloned(),
            unique_categories: summary.categories.len(),
            top_age_group: top_age_group.cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::GenderCategorySales;
    use crate::types::AgeGroup;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn month(m: u32, total: f64) -> MonthlySales {
        MonthlySales {
            month: NaiveDate::from_ymd_opt(2023, m, 1).unwrap(),
            total_sales: total,
        }
    }

    fn age_groups(totals: [f64; 6]) -> Vec<AgeGroupSales> {
        AgeGroup::ALL
            .into_iter()
            .zip(totals)
            .map(|(age_group, total_sales)| AgeGroupSales {
                age_group,
                total_sales,
                quantity: if total_sales > 0.0 { 1 } else { 0 },
            })
            .collect()
    }

    fn summary(monthly: Vec<MonthlySales>, ages: [f64; 6]) -> SalesSummary {
        SalesSummary {
            year: 2023,
            monthly,
            customers: vec![
                CustomerSales {
                    customer_id: "C2".to_string(),
                    total_sales: 500.0,
                    quantity: 1,
                },
                CustomerSales {
                    customer_id: "C1".to_string(),
                    total_sales: 40.0,
                    quantity: 2,
                },
            ],
            categories: vec![CategorySales {
                category: "Electronics".to_string(),
                total_sales: 500.0,
                quantity: 1,
            }],
            age_groups: age_groups(ages),
            gender_categories: GenderCategorySales::default(),
        }
    }

    #[test]
    fn test_insights_from_summary() {
        let summary = summary(
            vec![month(1, 40.0), month(2, 500.0)],
            [0.0, 40.0, 0.0, 0.0, 500.0, 0.0],
        );
        let insights = SalesInsights::from_summary(&summary);

        assert_eq!(insights.highest_month, Some(month(2, 500.0)));
        assert_eq!(insights.lowest_month, Some(month(1, 40.0)));
        assert_eq!(insights.total_sales, 540.0);
        assert_eq!(insights.top_customer.unwrap().customer_id, "C2");
        assert_eq!(insights.unique_customers, 2);
        assert_eq!(insights.top_category.unwrap().category, "Electronics");
        assert_eq!(insights.unique_categories, 1);
        assert_eq!(
            insights.top_age_group.map(|g| g.age_group),
            Some(AgeGroup::From56To65)
        );
    }

    #[test]
    fn test_insights_ties_pick_earliest() {
        let summary = summary(
            vec![month(3, 10.0), month(4, 10.0)],
            [0.0, 10.0, 10.0, 0.0, 0.0, 0.0],
        );
        let insights = SalesInsights::from_summary(&summary);

        assert_eq!(insights.highest_month.unwrap().month.format("%m").to_string(), "03");
        assert_eq!(insights.lowest_month.unwrap().month.format("%m").to_string(), "03");
        assert_eq!(
            insights.top_age_group.unwrap().age_group,
            AgeGroup::From26To35
        );
    }

    #[test]
    fn test_insights_empty_year() {
        let mut summary = summary(vec![], [0.0; 6]);
        summary.customers.clear();
        summary.categories.clear();
        let insights = SalesInsights::from_summary(&summary);

        assert_eq!(insights.highest_month, None);
        assert_eq!(insights.lowest_month, None);
        assert_eq!(insights.total_sales, 0.0);
        assert_eq!(insights.top_customer, None);
        assert_eq!(insights.unique_customers, 0);
        assert_eq!(insights.top_category, None);
        assert_eq!(insights.top_age_group, None);
    }
}
