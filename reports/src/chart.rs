//! Static charts drawn to PNG with `plotters`.
//!
//! [`StackedChart`] splits every row into a positive and a negative pass so
//! bars of opposite sign never overlap, then overlays the row totals as a
//! line. [`LineChart`] draws one polyline per column. Both are pure models
//! until [`StackedChart::write_png`] / [`LineChart::write_png`] paint them
//! into an in-memory bitmap. The bitmap carries the title, the axis
//! descriptions and the index ticks; legends are emitted as HTML by the
//! caller.

use std::fs;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::Path;

use chrono::NaiveDate;
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use serde::Deserialize;

use crate::error::{ReportError, Result};
use crate::file::create_new;
use crate::table::DataTable;

/// Per-column colours for charts, cycled when there are more columns.
pub const SERIES_COLOURS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Colour of the running-total line on stacked charts.
pub const TOTAL_COLOUR: &str = "#000000";

// Same palette as SERIES_COLOURS, for the bitmap.
const SERIES_RGB: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];
const TOTAL_RGB: RGBColor = RGBColor(0, 0, 0);
const BACKGROUND: RGBColor = RGBColor(255, 255, 255);
const AXIS: RGBColor = RGBColor(64, 64, 64);
const GRID: RGBColor = RGBColor(225, 225, 225);

const MARGIN: u32 = 16;
const MIN_SIDE: u32 = 100;
const X_LABEL_AREA: u32 = 48;
const Y_LABEL_AREA: u32 = 64;
const TITLE_FONT: (&str, u32) = ("sans-serif", 24);
const BAR_HALF_WIDTH: f64 = 0.4;
const MAX_X_TICKS: usize = 12;
const Y_DESC: &str = "Value";

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;
type Axes<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Bitmap dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChartSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 720,
        }
    }
}

/// Colour assigned to column `idx`.
pub fn series_colour(idx: usize) -> &'static str {
    SERIES_COLOURS[idx % SERIES_COLOURS.len()]
}

fn series_rgb(idx: usize) -> RGBColor {
    SERIES_RGB[idx % SERIES_RGB.len()]
}

/// One legend row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendEntry {
    /// Series name
    pub label: String,
    /// CSS hex colour
    pub colour: &'static str,
}

/// One stacked piece of a bar, `start..end` in value space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Data column the piece belongs to
    pub column: usize,
    /// Value where the piece begins (closer to zero)
    pub start: f64,
    /// Value where the piece ends
    pub end: f64,
}

/// All segments for one row plus the row total.
#[derive(Clone, Debug, PartialEq)]
pub struct StackedBar {
    /// Index label of the row
    pub label: String,
    /// Positive segments first, then negative ones
    pub segments: Vec<Segment>,
    /// Sum of the row, missing values counted as zero
    pub total: f64,
}

impl StackedBar {
    /// Top of the positive stack (0 when there are no positive values).
    pub fn positive_top(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.end > s.start)
            .map(|s| s.end)
            .fold(0.0, f64::max)
    }

    /// Bottom of the negative stack (0 when there are no negative values).
    pub fn negative_bottom(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.end < s.start)
            .map(|s| s.end)
            .fold(0.0, f64::min)
    }
}

/// Index name and row labels, drawn along the x axis.
#[derive(Clone, Debug, PartialEq)]
struct IndexAxis {
    name: String,
    labels: Vec<String>,
}

impl IndexAxis {
    fn of(data: &DataTable) -> Self {
        Self {
            name: data.index_name().to_string(),
            labels: data.index().to_vec(),
        }
    }

    /// Tick text at `x`; only whole positions that name a row get one.
    fn tick(&self, x: f64) -> String {
        let slot = x.round();
        if (x - slot).abs() > 1e-6 || slot < 0.0 {
            return String::new();
        }
        self.labels
            .get(slot as usize)
            .map(|label| month_tick(label))
            .unwrap_or_default()
    }
}

// Date-like labels are shortened to year and month.
fn month_tick(label: &str) -> String {
    label
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(|day| day.format("%Y-%m").to_string())
        .unwrap_or_else(|| label.to_string())
}

/// Text drawn around the plot area.
#[derive(Clone, Copy)]
struct Captions<'a> {
    title: &'a str,
    axis: &'a IndexAxis,
}

/// A chart model that can paint itself onto any `plotters` backend.
trait Plot {
    fn axis(&self) -> &IndexAxis;

    /// Draw onto `root`; `captions` is `None` when fonts are unavailable.
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        captions: Option<Captions<'_>>,
    ) -> DrawResult<DB>;
}

/// Positive/negative stacked bar chart with a cumulative-sum overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct StackedChart {
    columns: Vec<String>,
    axis: IndexAxis,
    bars: Vec<StackedBar>,
}

impl StackedChart {
    /// Build the model. Missing and non-numeric cells count as zero.
    pub fn from_table(data: &DataTable) -> Self {
        let totals = data.row_totals();
        let bars = data
            .iter_rows()
            .zip(totals)
            .map(|((label, cells), total)| {
                let values: Vec<f64> = cells.iter().map(|c| c.as_f64().unwrap_or(0.0)).collect();
                let mut segments = Vec::new();

                let mut top = 0.0;
                for (column, &value) in values.iter().enumerate() {
                    if value > 0.0 {
                        segments.push(Segment { column, start: top, end: top + value });
                        top += value;
                    }
                }
                let mut bottom = 0.0;
                for (column, &value) in values.iter().enumerate() {
                    if value < 0.0 {
                        segments.push(Segment { column, start: bottom, end: bottom + value });
                        bottom += value;
                    }
                }

                StackedBar {
                    label: label.to_string(),
                    segments,
                    total,
                }
            })
            .collect();

        Self {
            columns: data.columns().to_vec(),
            axis: IndexAxis::of(data),
            bars,
        }
    }

    /// Bars in row order.
    pub fn bars(&self) -> &[StackedBar] {
        &self.bars
    }

    /// One entry per column plus the total line.
    pub fn legend(&self) -> Vec<LegendEntry> {
        let mut entries = column_legend(&self.columns);
        entries.push(LegendEntry {
            label: "Total".into(),
            colour: TOTAL_COLOUR,
        });
        entries
    }

    fn value_range(&self) -> Range<f64> {
        let (lo, hi) = self.bars.iter().fold((0.0f64, 0.0f64), |(lo, hi), bar| {
            (
                lo.min(bar.negative_bottom()).min(bar.total),
                hi.max(bar.positive_top()).max(bar.total),
            )
        });
        padded(lo, hi)
    }

    /// Draw to a new PNG at `path` titled `title`. Never overwrites.
    pub fn write_png(&self, path: &Path, title: &str, size: ChartSize) -> Result<()> {
        write_plot(self, path, title, size)
    }
}

impl Plot for StackedChart {
    fn axis(&self) -> &IndexAxis {
        &self.axis
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        captions: Option<Captions<'_>>,
    ) -> DrawResult<DB> {
        let slots = self.bars.len().max(1) as f64;
        let x = -0.5..slots - 0.5;
        let mut chart = axes(root, captions, x.clone(), self.value_range())?;

        chart.draw_series(self.bars.iter().enumerate().flat_map(|(idx, bar)| {
            let centre = idx as f64;
            bar.segments.iter().map(move |s| {
                Rectangle::new(
                    [(centre - BAR_HALF_WIDTH, s.start), (centre + BAR_HALF_WIDTH, s.end)],
                    series_rgb(s.column).filled(),
                )
            })
        }))?;
        chart.draw_series(LineSeries::new([(x.start, 0.0), (x.end, 0.0)], &AXIS))?;
        chart.draw_series(LineSeries::new(
            self.bars.iter().enumerate().map(|(idx, bar)| (idx as f64, bar.total)),
            TOTAL_RGB.stroke_width(2),
        ))?;
        Ok(())
    }
}

/// Multi-series line chart for targets without a browser plotting library.
#[derive(Clone, Debug, PartialEq)]
pub struct LineChart {
    columns: Vec<String>,
    axis: IndexAxis,
    series: Vec<Vec<Option<f64>>>,
    points: usize,
}

impl LineChart {
    /// Build the model. Missing values leave a gap in their line.
    pub fn from_table(data: &DataTable) -> Self {
        let series = (0..data.column_count())
            .map(|idx| data.column(idx).map(|c| c.as_f64()).collect())
            .collect();
        Self {
            columns: data.columns().to_vec(),
            axis: IndexAxis::of(data),
            series,
            points: data.row_count(),
        }
    }

    /// One entry per column.
    pub fn legend(&self) -> Vec<LegendEntry> {
        column_legend(&self.columns)
    }

    fn value_range(&self) -> Range<f64> {
        let mut values = self.series.iter().flatten().flatten().copied();
        match values.next() {
            Some(first) => {
                let (lo, hi) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
                padded(lo, hi)
            }
            None => padded(0.0, 0.0),
        }
    }

    /// Draw to a new PNG at `path` titled `title`. Never overwrites.
    pub fn write_png(&self, path: &Path, title: &str, size: ChartSize) -> Result<()> {
        write_plot(self, path, title, size)
    }
}

impl Plot for LineChart {
    fn axis(&self) -> &IndexAxis {
        &self.axis
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        captions: Option<Captions<'_>>,
    ) -> DrawResult<DB> {
        let steps = self.points.saturating_sub(1).max(1) as f64;
        let mut chart = axes(root, captions, 0.0..steps, self.value_range())?;

        for (idx, values) in self.series.iter().enumerate() {
            let style = series_rgb(idx).stroke_width(2);
            for run in runs(values) {
                if let [only] = run.as_slice() {
                    chart.draw_series(std::iter::once(Circle::new(*only, 2, style.filled())))?;
                } else {
                    chart.draw_series(LineSeries::new(run, style))?;
                }
            }
        }
        Ok(())
    }
}

// A missing value splits a line into runs of consecutive points.
fn runs(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut run = Vec::new();
    for (row, value) in values.iter().enumerate() {
        match value {
            Some(v) => run.push((row as f64, *v)),
            None if !run.is_empty() => runs.push(std::mem::take(&mut run)),
            None => {}
        }
    }
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

/// Plot area with grid and frame. With captions the title, tick labels and
/// axis descriptions are drawn too.
fn axes<'a, DB: DrawingBackend>(
    root: &'a DrawingArea<DB, Shift>,
    captions: Option<Captions<'_>>,
    x: Range<f64>,
    y: Range<f64>,
) -> std::result::Result<Axes<'a, DB>, DrawingAreaErrorKind<DB::ErrorType>> {
    let mut builder = ChartBuilder::on(root);
    builder.margin(MARGIN);
    if let Some(captions) = captions {
        builder
            .caption(captions.title, TITLE_FONT)
            .x_label_area_size(X_LABEL_AREA)
            .y_label_area_size(Y_LABEL_AREA);
    }
    let mut chart = builder.build_cartesian_2d(x.clone(), y.clone())?;

    match captions {
        Some(captions) => {
            let ticks = |value: &f64| captions.axis.tick(*value);
            let tick_count = captions.axis.labels.len().clamp(1, MAX_X_TICKS);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .light_line_style(&GRID)
                .bold_line_style(&GRID)
                .axis_style(&AXIS)
                .x_labels(tick_count)
                .x_label_formatter(&ticks)
                .x_desc(captions.axis.name.as_str())
                .y_desc(Y_DESC)
                .draw()?;
        }
        None => {
            for step in 1..5 {
                let value = y.start + (y.end - y.start) * f64::from(step) / 5.0;
                chart.draw_series(LineSeries::new([(x.start, value), (x.end, value)], &GRID))?;
            }
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x.start, y.start), (x.end, y.end)],
                &AXIS,
            )))?;
        }
    }
    Ok(chart)
}

/// Paint into a buffer, falling back to an unlabelled chart when text
/// cannot be drawn, then encode the buffer as a new PNG.
fn write_plot<P: Plot>(plot: &P, path: &Path, title: &str, size: ChartSize) -> Result<()> {
    let dims = (size.width.max(MIN_SIDE), size.height.max(MIN_SIDE));
    let mut buf = vec![0u8; dims.0 as usize * dims.1 as usize * 3];
    let captions = Captions {
        title,
        axis: plot.axis(),
    };
    if let Err(err) = paint(plot, &mut buf, dims, Some(captions)) {
        tracing::warn!(
            "chart text for {} could not be drawn ({}); writing it unlabelled",
            path.display(),
            err
        );
        paint(plot, &mut buf, dims, None)?;
    }
    let img = RgbImage::from_raw(dims.0, dims.1, buf)
        .ok_or_else(|| ReportError::Plot("bitmap buffer does not match the chart size".into()))?;
    save(&img, path)
}

fn paint<P: Plot>(
    plot: &P,
    buf: &mut [u8],
    dims: (u32, u32),
    captions: Option<Captions<'_>>,
) -> Result<()> {
    let root = BitMapBackend::with_buffer(buf, dims).into_drawing_area();
    root.fill(&BACKGROUND)
        .and_then(|()| plot.draw(&root, captions))
        .and_then(|()| root.present())
        .map_err(|e| ReportError::Plot(e.to_string()))
}

fn save(img: &RgbImage, path: &Path) -> Result<()> {
    let file = create_new(path)?;
    let mut out = BufWriter::new(file);
    let written: Result<()> = img
        .write_to(&mut out, ImageFormat::Png)
        .map_err(Into::into)
        .and_then(|_| out.flush().map_err(Into::into));
    drop(out);
    if written.is_err() {
        let _ = fs::remove_file(path);
    }
    tracing::debug!("wrote chart {}", path.display());
    written
}

fn column_legend(columns: &[String]) -> Vec<LegendEntry> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, label)| LegendEntry {
            label: label.clone(),
            colour: series_colour(idx),
        })
        .collect()
}

fn padded(lo: f64, hi: f64) -> Range<f64> {
    if (hi - lo).abs() < f64::EPSILON {
        return lo - 1.0..hi + 1.0;
    }
    let pad = (hi - lo) * 0.05;
    lo - pad..hi + pad
}
