use super::{histogram_bins, pie_slices, ChartData, ChartView, DASHBOARD_FILE, HISTOGRAM_BINS};
use crate::aggregator::{GenderCategorySales, MonthlySales};
use crate::error::{Result, SalesError};
use chrono::Datelike;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

const FONT: &str = "sans-serif";
const TITLE_SIZE: u32 = 20;
const SALES_AXIS: &str = "Total Sales ($)";
const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const ORANGE: RGBColor = RGBColor(255, 165, 0);
const GREEN_BAR: RGBColor = RGBColor(0, 128, 0);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const TEAL: RGBColor = RGBColor(0, 128, 128);

/// Degrees covered by one straight edge of a pie wedge.
const ARC_STEP: f64 = 2.0;

/// Renders chart views into PNG files under one directory.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    output_dir: PathBuf,
    width: u32,
    height: u32,
}

impl ChartRenderer {
    /// `width` and `height` size a single chart; the dashboard is three
    /// charts wide and three tall.
    pub fn new(output_dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            width,
            height,
        }
    }

    /// Render every view into its own file and return the written paths.
    pub fn render_charts(&self, data: &ChartData<'_>) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;

        let mut written = Vec::with_capacity(ChartView::ALL.len());
        for view in ChartView::ALL {
            let path = self.output_dir.join(view.file_name());
            {
                let root =
                    BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
                root.fill(&WHITE).map_err(chart_error)?;
                draw_view(view, &root, data)?;
                root.present().map_err(chart_error)?;
            }

            debug!("Rendered {:?} to {}", view, path.display());
            written.push(path);
        }

        info!(
            "Rendered {} charts into {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }

    /// Render all views on a 3x3 grid. The two trailing cells stay blank.
    pub fn render_dashboard(&self, data: &ChartData<'_>) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(DASHBOARD_FILE);
        {
            let root =
                BitMapBackend::new(&path, (self.width * 3, self.height * 3)).into_drawing_area();
            root.fill(&WHITE).map_err(chart_error)?;

            let cells = root.split_evenly((3, 3));
            for (view, cell) in ChartView::ALL.into_iter().zip(cells.iter()) {
                draw_view(view, cell, data)?;
            }
            root.present().map_err(chart_error)?;
        }

        info!("Rendered dashboard to {}", path.display());
        Ok(path)
    }
}

fn chart_error<E: fmt::Display>(err: E) -> SalesError {
    SalesError::ChartRenderingFailed(err.to_string())
}

fn draw_view<DB: DrawingBackend>(
    view: ChartView,
    area: &DrawingArea<DB, Shift>,
    data: &ChartData<'_>,
) -> Result<()> {
    let summary = data.summary;
    let title = view.title(summary.year);

    match view {
        ChartView::MonthlySales => draw_monthly(area, &title, &summary.monthly),
        ChartView::CategorySales | ChartView::CategoryShare => {
            let labels: Vec<String> = summary.categories.iter().map(|c| c.category.clone()).collect();
            let values: Vec<f64> = summary.categories.iter().map(|c| c.total_sales).collect();
            if view == ChartView::CategoryShare {
                draw_pie(area, &title, &labels, &values)
            } else {
                draw_bars(area, &title, "Product Category", &labels, &values, &ORANGE)
            }
        }
        ChartView::AgeGroupSales => {
            let labels: Vec<String> = summary
                .age_groups
                .iter()
                .map(|g| g.age_group.label().to_string())
                .collect();
            let values: Vec<f64> = summary.age_groups.iter().map(|g| g.total_sales).collect();
            draw_bars(area, &title, "Age Group", &labels, &values, &GREEN_BAR)
        }
        ChartView::AgeVsTotal => draw_scatter(area, &title, &data.age_vs_total),
        ChartView::QuantityHistogram => draw_histogram(area, &title, &data.quantities),
        ChartView::GenderCategorySales => {
            draw_grouped_bars(area, &title, &summary.gender_categories)
        }
    }
}

/// Axis bounds that include zero, with headroom above the tallest value.
fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let mut max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= min {
        max = min + 1.0;
    }
    let pad = (max - min) * 0.1;
    (if min < 0.0 { min - pad } else { min }, max + pad)
}

fn centered(size: u32) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

fn draw_empty<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, title: &str) -> Result<()> {
    let area = area
        .titled(title, (FONT, TITLE_SIZE).into_font())
        .map_err(chart_error)?;
    let (width, height) = area.dim_in_pixel();
    area.draw(&Text::new(
        "No sales recorded for this period",
        ((width / 2) as i32, (height / 2) as i32),
        centered(16),
    ))
    .map_err(chart_error)?;
    Ok(())
}

fn month_label(x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || !(1.0..=12.0).contains(&rounded) {
        return String::new();
    }
    MONTH_ABBREVIATIONS[rounded as usize - 1].to_string()
}

fn draw_monthly<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    monthly: &[MonthlySales],
) -> Result<()> {
    if monthly.is_empty() {
        return draw_empty(area, title);
    }

    let points: Vec<(f64, f64)> = monthly
        .iter()
        .map(|m| (f64::from(m.month.month()), m.total_sales))
        .collect();
    let totals: Vec<f64> = points.iter().map(|p| p.1).collect();
    let (y_min, y_max) = value_range(&totals);

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, TITLE_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0.5f64..12.5f64, y_min..y_max)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&|x| month_label(*x))
        .x_desc("Month")
        .y_desc(SALES_AXIS)
        .draw()
        .map_err(chart_error)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))
        .map_err(chart_error)?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))
        .map_err(chart_error)?;

    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    x_desc: &str,
    labels: &[String],
    values: &[f64],
    color: &RGBColor,
) -> Result<()> {
    if values.is_empty() {
        return draw_empty(area, title);
    }

    let (y_min, y_max) = value_range(values);
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, TITLE_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..values.len() as u32).into_segmented(), y_min..y_max)
        .map_err(chart_error)?;

    let label_of = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(idx) => labels.get(*idx as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(values.len())
        .x_label_formatter(&label_of)
        .x_desc(x_desc)
        .y_desc(SALES_AXIS)
        .draw()
        .map_err(chart_error)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(color.filled())
                .margin(8)
                .data(values.iter().enumerate().map(|(idx, v)| (idx as u32, *v))),
        )
        .map_err(chart_error)?;

    Ok(())
}

fn polar(center: (f64, f64), radius: f64, degrees: f64) -> (i32, i32) {
    let theta = degrees.to_radians();
    (
        (center.0 + radius * theta.cos()).round() as i32,
        (center.1 - radius * theta.sin()).round() as i32,
    )
}

fn draw_pie<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    labels: &[String],
    values: &[f64],
) -> Result<()> {
    let slices = pie_slices(values);
    if slices.is_empty() {
        return draw_empty(area, title);
    }

    let area = area
        .titled(title, (FONT, TITLE_SIZE).into_font())
        .map_err(chart_error)?;
    let (width, height) = area.dim_in_pixel();
    let center = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    let radius = f64::from(width.min(height)) * 0.38;

    for (idx, slice) in slices.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let sweep = slice.end_angle - slice.start_angle;
        let steps = ((sweep / ARC_STEP).ceil() as usize).max(1);

        let mut outline = Vec::with_capacity(steps + 2);
        outline.push(polar(center, 0.0, 0.0));
        for step in 0..=steps {
            let angle = slice.start_angle + sweep * step as f64 / steps as f64;
            outline.push(polar(center, radius, angle));
        }
        area.draw(&Polygon::new(outline, color.filled()))
            .map_err(chart_error)?;

        let middle = slice.start_angle + sweep / 2.0;
        area.draw(&Text::new(
            format!("{:.1}%", slice.fraction * 100.0),
            polar(center, radius * 0.6, middle),
            centered(14),
        ))
        .map_err(chart_error)?;
        if let Some(label) = labels.get(slice.index) {
            area.draw(&Text::new(
                label.clone(),
                polar(center, radius * 1.15, middle),
                centered(14),
            ))
            .map_err(chart_error)?;
        }
    }

    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    points: &[(f64, f64)],
) -> Result<()> {
    if points.is_empty() {
        return draw_empty(area, title);
    }

    let ages: Vec<f64> = points.iter().map(|p| p.0).collect();
    let totals: Vec<f64> = points.iter().map(|p| p.1).collect();
    let (x_min, x_max) = value_range(&ages);
    let (y_min, y_max) = value_range(&totals);

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, TITLE_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .x_desc("Age")
        .y_desc(SALES_AXIS)
        .draw()
        .map_err(chart_error)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 3, PURPLE.mix(0.5).filled())),
        )
        .map_err(chart_error)?;

    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    values: &[f64],
) -> Result<()> {
    let bins = histogram_bins(values, HISTOGRAM_BINS);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return draw_empty(area, title);
    };

    let tallest = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, TITLE_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(first.start..last.end, 0f64..tallest as f64 * 1.1)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .x_desc("Units Sold")
        .y_desc("Frequency")
        .draw()
        .map_err(chart_error)?;

    chart
        .draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                TEAL.mix(0.7).filled(),
            )
        }))
        .map_err(chart_error)?;

    Ok(())
}

fn draw_grouped_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    matrix: &GenderCategorySales,
) -> Result<()> {
    if matrix.is_empty() {
        return draw_empty(area, title);
    }

    // Each gender owns one slot per category plus a spacer slot.
    let categories = matrix.categories.len() as u32;
    let stride = categories + 1;
    let slots = matrix.rows.len() as u32 * stride;
    let label_slot = categories.saturating_sub(1) / 2;

    let values: Vec<f64> = matrix
        .rows
        .iter()
        .flat_map(|row| row.sales.iter().flatten().copied())
        .collect();
    let (y_min, y_max) = value_range(&values);

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, TITLE_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..slots).into_segmented(), y_min..y_max)
        .map_err(chart_error)?;

    let genders: Vec<&str> = matrix.genders().collect();
    let label_of = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(idx) if *idx % stride == label_slot => genders
            .get((*idx / stride) as usize)
            .map(|g| g.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots as usize)
        .x_label_formatter(&label_of)
        .x_desc("Gender")
        .y_desc(SALES_AXIS)
        .draw()
        .map_err(chart_error)?;

    for (col, category) in matrix.categories.iter().enumerate() {
        let color = Palette99::pick(col).to_rgba();
        let bars: Vec<(u32, f64)> = matrix
            .rows
            .iter()
            .enumerate()
            .filter_map(|(row_idx, row)| {
                let value = row.sales.get(col).copied().flatten()?;
                Some((row_idx as u32 * stride + col as u32, value))
            })
            .collect();

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(color.filled())
                    .margin(1)
                    .data(bars),
            )
            .map_err(chart_error)?
            .label(category.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_error)?;

    Ok(())
}
