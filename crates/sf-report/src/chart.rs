//! Charts over table columns, rendered to PNG.
//!
//! The bitmap backend is built without a font stack, so the image itself
//! carries no text. Every chart has a [`LegendEntry`] per bar, point or
//! slice (label, value and the colour it is drawn in), and the document
//! embedding the image writes that legend beside it.

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::PI;
use std::fmt;

use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::table::Table;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 500;

/// Text columns with at most this many distinct values are suggested as pies.
pub const PIE_MAX_DISTINCT: usize = 20;

const HISTOGRAM_BINS: usize = 10;
const BLANK_LABEL: &str = "(blank)";

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
    Histogram,
    CountBar,
}

/// A labelled series ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Names one mark of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub value: String,
    /// RGB of the bar, point or slice.
    pub color: (u8, u8, u8),
}

impl fmt::Display for LegendEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// PNG bytes of a drawn chart plus what is needed to place and label it.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    /// How to read the legend against the image, e.g. "Bars, left to right".
    pub legend_heading: String,
    pub legend: Vec<LegendEntry>,
}

impl RenderedChart {
    /// At most `max` legend entries, plus an "and N more" line when some
    /// were left out.
    pub fn legend_lines(&self, max: usize) -> (&[LegendEntry], Option<String>) {
        if self.legend.len() <= max {
            return (&self.legend, None);
        }
        let hidden = self.legend.len() - max;
        (&self.legend[..max], Some(format!("... and {} more", hidden)))
    }
}

impl Chart {
    /// Chart `y` against `x`. Rows whose `y` cell is not a number are skipped.
    ///
    /// `Histogram` and `CountBar` only look at `x`.
    pub fn from_columns(kind: ChartKind, table: &Table, x: &str, y: &str) -> Result<Chart> {
        match kind {
            ChartKind::Histogram => return Chart::histogram(table, x),
            ChartKind::CountBar => return Chart::value_counts(ChartKind::CountBar, table, x),
            ChartKind::Bar | ChartKind::Pie | ChartKind::Line => {}
        }

        let xs = table.column(x)?;
        let ys = table.column(y)?;
        let mut labels = Vec::new();
        let mut values = Vec::new();
        for (label, value) in xs.into_iter().zip(ys) {
            match parse_number(value) {
                Some(v) if kind != ChartKind::Pie || v > 0.0 => {
                    labels.push(label.to_string());
                    values.push(v);
                }
                _ => {}
            }
        }

        if values.is_empty() {
            return Err(Error::new(ErrorKind::NoData(format!(
                "column {} has no numeric values",
                y
            ))));
        }
        Ok(Chart {
            kind,
            title: format!("{} by {}", y, x),
            labels,
            values,
        })
    }

    /// Distribution of a numeric column over equal-width bins.
    pub fn histogram(table: &Table, column: &str) -> Result<Chart> {
        let numbers: Vec<f64> = table
            .column(column)?
            .into_iter()
            .filter_map(parse_number)
            .collect();
        if numbers.is_empty() {
            return Err(Error::new(ErrorKind::NoData(format!(
                "column {} has no numeric values",
                column
            ))));
        }

        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let bins = if max > min { HISTOGRAM_BINS } else { 1 };
        let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

        let mut counts = vec![0.0; bins];
        for n in &numbers {
            let index = (((n - min) / width).floor() as usize).min(bins - 1);
            counts[index] += 1.0;
        }
        let labels = (0..bins)
            .map(|i| {
                let low = min + width * i as f64;
                let high = if bins == 1 { max } else { low + width };
                format!("{}-{}", format_number(low), format_number(high))
            })
            .collect();

        Ok(Chart {
            kind: ChartKind::Histogram,
            title: format!("Distribution of {}", column),
            labels,
            values: counts,
        })
    }

    /// Occurrences of each value of a column, most frequent first.
    pub fn count_bar(table: &Table, column: &str) -> Result<Chart> {
        Chart::value_counts(ChartKind::CountBar, table, column)
    }

    fn value_counts(kind: ChartKind, table: &Table, column: &str) -> Result<Chart> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for cell in table.column(column)? {
            let label = if cell.is_empty() { BLANK_LABEL } else { cell };
            *counts.entry(label).or_default() += 1;
        }
        if counts.is_empty() {
            return Err(Error::new(ErrorKind::NoData(format!(
                "column {} is empty",
                column
            ))));
        }

        let mut ordered: Vec<(&str, usize)> = counts.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        Ok(Chart {
            kind,
            title: format!("{} counts", column),
            labels: ordered.iter().map(|(label, _)| label.to_string()).collect(),
            values: ordered.iter().map(|(_, count)| *count as f64).collect(),
        })
    }

    pub fn render(&self) -> Result<RenderedChart> {
        Ok(RenderedChart {
            title: self.title.clone(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            png: self.render_png(DEFAULT_WIDTH, DEFAULT_HEIGHT)?,
            legend_heading: self.legend_heading().to_string(),
            legend: self.legend(),
        })
    }

    /// Reading order of the marks in the drawn image.
    pub fn legend_heading(&self) -> &'static str {
        match self.kind {
            ChartKind::Pie => "Slices, clockwise from the top",
            ChartKind::Line => "Points, left to right",
            ChartKind::Bar | ChartKind::Histogram | ChartKind::CountBar => "Bars, left to right",
        }
    }

    /// One entry per drawn mark, in drawing order. Pie entries carry their
    /// share of the total; slices that are not drawn are left out.
    pub fn legend(&self) -> Vec<LegendEntry> {
        let total: f64 = self.values.iter().filter(|v| **v > 0.0).sum();
        self.labels
            .iter()
            .zip(&self.values)
            .enumerate()
            .filter(|(_, (_, value))| self.kind != ChartKind::Pie || **value > 0.0)
            .map(|(i, (label, value))| {
                let value = match self.kind {
                    ChartKind::Pie => {
                        format!("{} ({:.1}%)", format_number(*value), value / total * 100.0)
                    }
                    _ => format_number(*value),
                };
                LegendEntry {
                    label: label.clone(),
                    value,
                    color: self.mark_color(i).rgb(),
                }
            })
            .collect()
    }

    fn mark_color(&self, index: usize) -> RGBAColor {
        match self.kind {
            ChartKind::Line => BLUE.to_rgba(),
            _ => Palette99::pick(index).to_rgba(),
        }
    }

    pub fn render_png(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        if self.values.is_empty() {
            return Err(Error::new(ErrorKind::NoData(self.title.clone())));
        }
        debug!(kind = ?self.kind, points = self.values.len(), "Rendering chart");

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(chart_error)?;
            match self.kind {
                ChartKind::Pie => draw_pie(&root, &self.values)?,
                ChartKind::Line => draw_line(&root, &self.values)?,
                ChartKind::Bar | ChartKind::Histogram | ChartKind::CountBar => {
                    draw_bars(&root, &self.values)?
                }
            }
            root.present().map_err(chart_error)?;
        }
        encode_png(buffer, width, height)
    }
}

/// One chart per column: numeric columns get a histogram, text columns with
/// few distinct values a pie of value counts, anything else a count bar.
/// Columns with no values at all are skipped.
pub fn suggest_charts(table: &Table) -> Vec<Chart> {
    let mut charts = Vec::new();
    for column in &table.columns {
        let Ok(cells) = table.column(column) else {
            continue;
        };
        let filled: Vec<&str> = cells.into_iter().filter(|c| !c.is_empty()).collect();
        if filled.is_empty() {
            continue;
        }

        let chart = if filled.iter().all(|c| parse_number(c).is_some()) {
            Chart::histogram(table, column)
        } else if filled.iter().collect::<BTreeSet<_>>().len() <= PIE_MAX_DISTINCT {
            Chart::value_counts(ChartKind::Pie, table, column)
        } else {
            Chart::count_bar(table, column)
        };
        if let Ok(chart) = chart {
            charts.push(chart);
        }
    }
    charts
}

pub(crate) fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn chart_error<E: std::fmt::Display>(err: E) -> Error {
    Error::new(ErrorKind::Chart(err.to_string()))
}

fn value_range(values: &[f64]) -> (f64, f64) {
    let low = values.iter().copied().fold(0.0, f64::min);
    let high = values.iter().copied().fold(0.0, f64::max);
    let pad = ((high - low) * 0.05).max(1e-9);
    if high > low {
        (if low < 0.0 { low - pad } else { low }, high + pad)
    } else {
        (low, low + 1.0)
    }
}

fn draw_bars(root: &Canvas<'_>, values: &[f64]) -> Result<()> {
    let (low, high) = value_range(values);
    let count = values.len() as f64;
    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .build_cartesian_2d(0f64..count, low..high)
        .map_err(chart_error)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, v)| {
            let x = i as f64;
            Rectangle::new([(x + 0.1, 0.0), (x + 0.9, *v)], Palette99::pick(i).filled())
        }))
        .map_err(chart_error)?;
    chart
        .draw_series([
            PathElement::new(vec![(0.0, 0.0), (count, 0.0)], BLACK),
            PathElement::new(vec![(0.0, low), (0.0, high)], BLACK),
        ])
        .map_err(chart_error)?;
    Ok(())
}

fn draw_line(root: &Canvas<'_>, values: &[f64]) -> Result<()> {
    let (low, high) = value_range(values);
    let last = (values.len().max(2) - 1) as f64;
    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .build_cartesian_2d(0f64..last, low..high)
        .map_err(chart_error)?;

    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();
    chart
        .draw_series(std::iter::once(PathElement::new(
            points.clone(),
            BLUE.stroke_width(2),
        )))
        .map_err(chart_error)?;
    chart
        .draw_series(points.into_iter().map(|p| Circle::new(p, 4, BLUE.filled())))
        .map_err(chart_error)?;
    chart
        .draw_series([
            PathElement::new(vec![(0.0, low), (last, low)], BLACK),
            PathElement::new(vec![(0.0, low), (0.0, high)], BLACK),
        ])
        .map_err(chart_error)?;
    Ok(())
}

fn draw_pie(root: &Canvas<'_>, values: &[f64]) -> Result<()> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return Err(Error::new(ErrorKind::NoData(
            "pie needs positive values".to_string(),
        )));
    }

    let (width, height) = root.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = (width.min(height) as f64 / 2.0 - 20.0).max(10.0);
    let to_pixel = |angle: f64| -> (i32, i32) {
        (
            (center.0 + radius * angle.cos()).round() as i32,
            (center.1 + radius * angle.sin()).round() as i32,
        )
    };

    let mut start = -PI / 2.0;
    for (i, value) in values.iter().enumerate().filter(|(_, v)| **v > 0.0) {
        let sweep = value / total * 2.0 * PI;
        let steps = ((sweep / 0.05).ceil() as usize).max(1);
        let mut points = Vec::with_capacity(steps + 2);
        points.push((center.0.round() as i32, center.1.round() as i32));
        for step in 0..=steps {
            points.push(to_pixel(start + sweep * step as f64 / steps as f64));
        }
        root.draw(&Polygon::new(points, Palette99::pick(i).filled()))
            .map_err(chart_error)?;
        start += sweep;
    }
    Ok(())
}

fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    let image = image::RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        Error::new(ErrorKind::Image(
            "pixel buffer does not match chart size".to_string(),
        ))
    })?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image).write_to(
        &mut std::io::Cursor::new(&mut png),
        image::ImageOutputFormat::Png,
    )?;
    Ok(png)
}
