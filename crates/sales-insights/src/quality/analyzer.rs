use crate::error::Result;
use crate::schema::{AGE, PRICE_PER_UNIT, QUANTITY, TOTAL_PRICE, TRANSACTION_ID};
use crate::types::{AgeGroup, DataQualityIssue, Severity};
use crate::utils::{f64_values, i64_values, string_values};
use polars::prelude::*;
use std::collections::HashMap;

/// How many offending transaction ids an issue lists.
const MAX_EXAMPLES: usize = 5;

pub struct DataQualityAnalyzer;

impl DataQualityAnalyzer {
    /// Run every check against cleaned transactions.
    ///
    /// `tolerance` is the largest accepted absolute gap between `Total_Price`
    /// and `Quantity * Price_Per_Unit`.
    pub fn identify_issues(df: &DataFrame, tolerance: f64) -> Result<Vec<DataQualityIssue>> {
        let ids = string_values(df, TRANSACTION_ID)?;
        let mut issues = Vec::new();

        issues.extend(Self::analyze_total_price(df, &ids, tolerance)?);
        issues.extend(Self::analyze_age_range(df, &ids)?);
        issues.extend(Self::analyze_negative_values(df, &ids)?);

        Ok(issues)
    }

    fn analyze_total_price(
        df: &DataFrame,
        ids: &[Option<String>],
        tolerance: f64,
    ) -> Result<Option<DataQualityIssue>> {
        let quantities = f64_values(df, QUANTITY)?;
        let prices = f64_values(df, PRICE_PER_UNIT)?;
        let totals = f64_values(df, TOTAL_PRICE)?;

        let mut max_gap: f64 = 0.0;
        let flagged: Vec<usize> = quantities
            .iter()
            .zip(&prices)
            .zip(&totals)
            .enumerate()
            .filter_map(|(idx, ((quantity, price), total))| {
                let gap = ((*total)? - (*quantity)? * (*price)?).abs();
                (gap > tolerance).then(|| {
                    max_gap = max_gap.max(gap);
                    idx
                })
            })
            .collect();

        if flagged.is_empty() {
            return Ok(None);
        }

        let mut details = Self::base_details(&flagged, ids, df.height());
        details.insert("tolerance".to_string(), serde_json::json!(tolerance));
        details.insert(
            "max_difference".to_string(),
            serde_json::json!((max_gap * 100.0).round() / 100.0),
        );

        Ok(Some(DataQualityIssue {
            issue_type: "total_price_mismatch".to_string(),
            severity: Self::severity_for_share(flagged.len(), df.height()),
            affected_columns: vec![
                QUANTITY.to_string(),
                PRICE_PER_UNIT.to_string(),
                TOTAL_PRICE.to_string(),
            ],
            description: format!(
                "{} transactions have a total price that differs from quantity x unit price by more than {:.2}",
                flagged.len(),
                tolerance
            ),
            detection_details: details,
        }))
    }

    fn analyze_age_range(
        df: &DataFrame,
        ids: &[Option<String>],
    ) -> Result<Option<DataQualityIssue>> {
        let ages = i64_values(df, AGE)?;
        let flagged: Vec<usize> = ages
            .iter()
            .enumerate()
            .filter(|(_, age)| matches!(age, Some(a) if AgeGroup::from_age(*a).is_none()))
            .map(|(idx, _)| idx)
            .collect();

        if flagged.is_empty() {
            return Ok(None);
        }

        let mut details = Self::base_details(&flagged, ids, df.height());
        details.insert(
            "valid_range".to_string(),
            serde_json::json!(format!("0-{}", AgeGroup::MAX_AGE)),
        );

        Ok(Some(DataQualityIssue {
            issue_type: "age_out_of_range".to_string(),
            severity: Severity::Medium,
            affected_columns: vec![AGE.to_string()],
            description: format!(
                "{} transactions have an age outside 0-{}; they are left out of the age group totals",
                flagged.len(),
                AgeGroup::MAX_AGE
            ),
            detection_details: details,
        }))
    }

    fn analyze_negative_values(
        df: &DataFrame,
        ids: &[Option<String>],
    ) -> Result<Option<DataQualityIssue>> {
        let mut negative = vec![false; df.height()];
        let mut columns = Vec::new();

        for name in [QUANTITY, PRICE_PER_UNIT, TOTAL_PRICE] {
            let values = f64_values(df, name)?;
            let mut found = false;
            for (flag, value) in negative.iter_mut().zip(values) {
                if value.is_some_and(|v| v < 0.0) {
                    *flag = true;
                    found = true;
                }
            }
            if found {
                columns.push(name.to_string());
            }
        }

        let flagged: Vec<usize> = negative
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag)
            .map(|(idx, _)| idx)
            .collect();

        if flagged.is_empty() {
            return Ok(None);
        }

        Ok(Some(DataQualityIssue {
            issue_type: "negative_values".to_string(),
            severity: Severity::High,
            description: format!(
                "{} transactions carry negative amounts in {}",
                flagged.len(),
                columns.join(", ")
            ),
            affected_columns: columns,
            detection_details: Self::base_details(&flagged, ids, df.height()),
        }))
    }

    fn base_details(
        flagged: &[usize],
        ids: &[Option<String>],
        total_rows: usize,
    ) -> HashMap<String, serde_json::Value> {
        let examples: Vec<&str> = flagged
            .iter()
            .filter_map(|&idx| ids.get(idx).and_then(|id| id.as_deref()))
            .take(MAX_EXAMPLES)
            .collect();
        let percentage = if total_rows == 0 {
            0.0
        } else {
            flagged.len() as f64 / total_rows as f64 * 100.0
        };

        let mut details = HashMap::new();
        details.insert("affected_count".to_string(), serde_json::json!(flagged.len()));
        details.insert(
            "affected_percentage".to_string(),
            serde_json::json!((percentage * 10.0).round() / 10.0),
        );
        details.insert("example_transactions".to_string(), serde_json::json!(examples));
        details
    }

    fn severity_for_share(count: usize, total_rows: usize) -> Severity {
        let share = if total_rows == 0 {
            0.0
        } else {
            count as f64 / total_rows as f64
        };
        if share >= 0.10 {
            Severity::High
        } else if share >= 0.01 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CUSTOMER_ID, DATE, GENDER, PRODUCT_CATEGORY};

    fn create_frame(ages: &[i64], quantities: &[i64], prices: &[f64], totals: &[f64]) -> DataFrame {
        let n = ages.len();
        let ids: Vec<String> = (1..=n).map(|i| format!("T{i}")).collect();
        df![
            TRANSACTION_ID => ids,
            DATE => vec!["2023-01-01"; n],
            CUSTOMER_ID => vec!["C1"; n],
            GENDER => vec!["Male"; n],
            AGE => ages,
            PRODUCT_CATEGORY => vec!["Clothing"; n],
            QUANTITY => quantities,
            PRICE_PER_UNIT => prices,
            TOTAL_PRICE => totals,
        ]
        .unwrap()
    }

    #[test]
    fn test_identify_issues_clean_data() {
        let df = create_frame(&[30, 60], &[2, 1], &[20.0, 500.0], &[40.0, 500.0]);
        let issues = DataQualityAnalyzer::identify_issues(&df, 0.01).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_total_price_mismatch_detected() {
        let df = create_frame(&[30, 60], &[2, 1], &[20.0, 500.0], &[45.0, 500.0]);
        let issues = DataQualityAnalyzer::identify_issues(&df, 0.01).unwrap();

        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.issue_type, "total_price_mismatch");
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.detection_details["affected_count"], serde_json::json!(1));
        assert_eq!(
            issue.detection_details["example_transactions"],
            serde_json::json!(["T1"])
        );
        assert_eq!(issue.detection_details["max_difference"], serde_json::json!(5.0));
    }

    #[test]
    fn test_total_price_within_tolerance() {
        let df = create_frame(&[30], &[3], &[0.1], &[0.3]);
        let issues = DataQualityAnalyzer::identify_issues(&df, 0.01).unwrap();
        assert!(issues.is_empty());

        let df = create_frame(&[30], &[1], &[10.0], &[10.5]);
        let issues = DataQualityAnalyzer::identify_issues(&df, 1.0).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_age_out_of_range_detected() {
        let df = create_frame(&[150, 30, -2], &[1, 1, 1], &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]);
        let issues = DataQualityAnalyzer::identify_issues(&df, 0.01).unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "age_out_of_range");
        assert_eq!(issues[0].affected_columns, vec![AGE.to_string()]);
        assert_eq!(
            issues[0].detection_details["example_transactions"],
            serde_json::json!(["T1", "T3"])
        );
    }

    #[test]
    fn test_negative_values_detected() {
        let df = create_frame(&[30, 30], &[-1, 2], &[10.0, 5.0], &[-10.0, 10.0]);
        let issues = DataQualityAnalyzer::identify_issues(&df, 0.01).unwrap();

        let negative = issues
            .iter()
            .find(|i| i.issue_type == "negative_values")
            .expect("negative values issue");
        assert_eq!(negative.severity, Severity::High);
        assert_eq!(
            negative.affected_columns,
            vec![QUANTITY.to_string(), TOTAL_PRICE.to_string()]
        );
        assert_eq!(negative.detection_details["affected_count"], serde_json::json!(1));
    }

    #[test]
    fn test_severity_for_share() {
        assert_eq!(DataQualityAnalyzer::severity_for_share(1, 1000), Severity::Low);
        assert_eq!(DataQualityAnalyzer::severity_for_share(20, 1000), Severity::Medium);
        assert_eq!(DataQualityAnalyzer::severity_for_share(200, 1000), Severity::High);
        assert_eq!(DataQualityAnalyzer::severity_for_share(0, 0), Severity::Low);
    }
}
