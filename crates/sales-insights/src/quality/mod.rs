//! Data quality analysis module.
//!
//! This module provides non-fatal checks on cleaned transactions such as
//! inconsistent totals, ages outside the bucket range and negative amounts.

mod analyzer;

pub use analyzer::DataQualityAnalyzer;
