//! Chart rendering module.
//!
//! Seven views of a year's sales rendered with `plotters` into PNG files,
//! either one file per view or all of them on a 3x3 dashboard grid.
//!
//! The geometry helpers ([`histogram_bins`], [`pie_slices`]) are pure so
//! they can be checked without a font or a bitmap backend.

mod renderer;

pub use renderer::ChartRenderer;

use crate::aggregator::SalesSummary;
use crate::error::Result;
use crate::schema::{AGE, QUANTITY, TOTAL_PRICE};
use crate::utils::f64_values;
use polars::prelude::DataFrame;

/// Number of equal-width bins of the quantity histogram.
pub const HISTOGRAM_BINS: usize = 10;

/// File name of the combined dashboard image.
pub const DASHBOARD_FILE: &str = "sales_dashboard.png";

/// One chart of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartView {
    MonthlySales,
    CategorySales,
    AgeGroupSales,
    CategoryShare,
    AgeVsTotal,
    QuantityHistogram,
    GenderCategorySales,
}

impl ChartView {
    /// Every view, in dashboard order.
    pub const ALL: [ChartView; 7] = [
        ChartView::MonthlySales,
        ChartView::CategorySales,
        ChartView::AgeGroupSales,
        ChartView::CategoryShare,
        ChartView::AgeVsTotal,
        ChartView::QuantityHistogram,
        ChartView::GenderCategorySales,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::MonthlySales => "monthly_sales.png",
            Self::CategorySales => "category_sales.png",
            Self::AgeGroupSales => "age_group_sales.png",
            Self::CategoryShare => "category_share.png",
            Self::AgeVsTotal => "age_vs_total_scatter.png",
            Self::QuantityHistogram => "quantity_histogram.png",
            Self::GenderCategorySales => "gender_category_sales.png",
        }
    }

    pub fn title(&self, year: i32) -> String {
        match self {
            Self::MonthlySales => format!("Monthly Sales Trends ({year})"),
            Self::CategorySales => format!("Product Popularity by Total Sales ({year})"),
            Self::AgeGroupSales => format!("Sales by Age Group ({year})"),
            Self::CategoryShare => format!("Sales Distribution by Product Category ({year})"),
            // Plots every cleaned transaction, not just the year.
            Self::AgeVsTotal => "Scatter Plot of Total Sales by Age".to_string(),
            Self::QuantityHistogram => format!("Histogram of Units Sold ({year})"),
            Self::GenderCategorySales => {
                format!("Sales by Gender and Product Category ({year})")
            }
        }
    }
}

/// Everything the chart views plot.
#[derive(Debug, Clone)]
pub struct ChartData<'a> {
    pub summary: &'a SalesSummary,
    /// `(age, total_price)` of every cleaned transaction, across all years.
    pub age_vs_total: Vec<(f64, f64)>,
    /// Quantity of every transaction in the year.
    pub quantities: Vec<f64>,
}

impl<'a> ChartData<'a> {
    /// Collect plot inputs from the cleaned and the year-filtered frames.
    pub fn from_frames(
        summary: &'a SalesSummary,
        cleaned: &DataFrame,
        filtered: &DataFrame,
    ) -> Result<Self> {
        let age_vs_total = f64_values(cleaned, AGE)?
            .into_iter()
            .zip(f64_values(cleaned, TOTAL_PRICE)?)
            .filter_map(|(age, total)| Some((age?, total?)))
            .collect();
        let quantities = f64_values(filtered, QUANTITY)?.into_iter().flatten().collect();

        Ok(Self {
            summary,
            age_vs_total,
            quantities,
        })
    }
}

/// One bar of a histogram over `[start, end)`; the last bin is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Split `values` into `bins` equal-width bins spanning their range.
///
/// A range of zero width is widened to half a unit on each side.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for value in finite {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| HistogramBin {
            start: min + width * idx as f64,
            end: if idx + 1 == bins {
                max
            } else {
                min + width * (idx + 1) as f64
            },
            count,
        })
        .collect()
}

/// One wedge of a pie chart. Angles are in degrees, counter-clockwise from
/// the positive x axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    /// Position of the value in the input.
    pub index: usize,
    pub fraction: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

/// Angle the first wedge starts at.
const PIE_START_ANGLE: f64 = 90.0;

/// Lay out wedges for the positive entries of `values`, in input order.
pub fn pie_slices(values: &[f64]) -> Vec<PieSlice> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 || !total.is_finite() {
        return Vec::new();
    }

    let mut angle = PIE_START_ANGLE;
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0.0)
        .map(|(index, value)| {
            let fraction = value / total;
            let start_angle = angle;
            angle += fraction * 360.0;
            PieSlice {
                index,
                fraction,
                start_angle,
                end_angle: angle,
            }
        })
        .collect()
}
