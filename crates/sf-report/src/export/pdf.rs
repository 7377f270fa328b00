use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, Color, Image as PdfImage, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
};
use tracing::debug;

use crate::chart::RenderedChart;
use crate::error::{Error, Result};
use crate::table::{Table, NO_RECORDS};

// A4 landscape, millimetres.
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const ROW_HEIGHT: f32 = 6.5;
const CELL_FONT_SIZE: f32 = 8.0;
const CELL_PADDING: f32 = 1.5;
// Average Helvetica glyph width at CELL_FONT_SIZE.
const CHAR_WIDTH: f32 = 1.45;
const CHART_DPI: f32 = 150.0;
const MM_PER_INCH: f32 = 25.4;
const LEGEND_FONT_SIZE: f32 = 9.0;
const LEGEND_LINE: f32 = 5.0;
const LEGEND_SWATCH: f32 = 3.0;
// Helvetica at LEGEND_FONT_SIZE.
const LEGEND_CHAR_WIDTH: f32 = 1.65;
const LEGEND_MAX_ENTRIES: usize = 30;

/// Render a report: title, `generated on` line, the table as a grid, then
/// one chart per page with its legend to the right of the image.
pub fn to_pdf(
    title: &str,
    table: &Table,
    charts: &[RenderedChart],
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let mut layer = doc.get_page(page).get_layer(layer);

    let mut y = PAGE_HEIGHT - MARGIN - 6.0;
    layer.use_text(title, 16.0, Mm(MARGIN), Mm(y), &bold);
    y -= 7.0;
    layer.use_text(
        format!(
            "generated on {}",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        9.0,
        Mm(MARGIN),
        Mm(y),
        &regular,
    );
    y -= 8.0;

    if table.is_empty() {
        layer.use_text(NO_RECORDS, 10.0, Mm(MARGIN), Mm(y), &regular);
    } else {
        let grid = Grid::new(table.columns.len());
        let mut top = y;
        grid.draw_row(&layer, &table.columns, y, &bold);
        y -= ROW_HEIGHT;

        for row in &table.rows {
            if y - ROW_HEIGHT < MARGIN {
                grid.close(&layer, top, y);
                layer = new_page(&doc, "Table");
                y = PAGE_HEIGHT - MARGIN;
                top = y;
                grid.draw_row(&layer, &table.columns, y, &bold);
                y -= ROW_HEIGHT;
            }
            grid.draw_row(&layer, row, y, &regular);
            y -= ROW_HEIGHT;
        }
        grid.close(&layer, top, y);
    }

    for chart in charts {
        let layer = new_page(&doc, "Chart");
        layer.use_text(
            chart.title.as_str(),
            14.0,
            Mm(MARGIN),
            Mm(PAGE_HEIGHT - MARGIN - 6.0),
            &bold,
        );
        let decoded = image::load_from_memory(&chart.png)?;
        let image = PdfImage::from_dynamic_image(&image::DynamicImage::ImageRgb8(
            decoded.to_rgb8(),
        ));
        image.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(MARGIN)),
                dpi: Some(CHART_DPI),
                ..Default::default()
            },
        );
        let image_width = chart.width as f32 / CHART_DPI * MM_PER_INCH;
        draw_legend(&layer, chart, MARGIN + image_width + 8.0, &regular, &bold);
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)?;
    writer
        .into_inner()
        .map_err(|err| Error::from(err.into_error()))
}

pub fn save_pdf(
    path: impl AsRef<Path>,
    title: &str,
    table: &Table,
    charts: &[RenderedChart],
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = table.len(), charts = charts.len(), "Writing PDF");
    std::fs::write(path, to_pdf(title, table, charts, generated_at)?)?;
    Ok(())
}

fn draw_legend(
    layer: &PdfLayerReference,
    chart: &RenderedChart,
    left: f32,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let max_chars = ((PAGE_WIDTH - MARGIN - left - LEGEND_SWATCH - 2.0) / LEGEND_CHAR_WIDTH)
        .max(1.0) as usize;
    let mut y = PAGE_HEIGHT - MARGIN - 16.0;
    layer.use_text(
        fit(&chart.legend_heading, max_chars),
        LEGEND_FONT_SIZE,
        Mm(left),
        Mm(y),
        bold,
    );

    let (entries, more) = chart.legend_lines(LEGEND_MAX_ENTRIES);
    for entry in entries {
        y -= LEGEND_LINE;
        let (r, g, b) = entry.color;
        layer.set_fill_color(rgb(r, g, b));
        layer.add_rect(Rect::new(
            Mm(left),
            Mm(y),
            Mm(left + LEGEND_SWATCH),
            Mm(y + LEGEND_SWATCH),
        ));
        layer.set_fill_color(rgb(0, 0, 0));
        layer.use_text(
            fit(&entry.to_string(), max_chars),
            LEGEND_FONT_SIZE,
            Mm(left + LEGEND_SWATCH + 2.0),
            Mm(y),
            regular,
        );
    }
    if let Some(more) = more {
        y -= LEGEND_LINE;
        layer.use_text(more, LEGEND_FONT_SIZE, Mm(left), Mm(y), regular);
    }
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn new_page(doc: &PdfDocumentReference, name: &str) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), name);
    doc.get_page(page).get_layer(layer)
}

struct Grid {
    columns: usize,
    column_width: f32,
    max_chars: usize,
}

impl Grid {
    fn new(columns: usize) -> Self {
        let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns.max(1) as f32;
        let max_chars = ((column_width - 2.0 * CELL_PADDING) / CHAR_WIDTH).max(1.0) as usize;
        Self {
            columns,
            column_width,
            max_chars,
        }
    }

    /// Draw the top rule and the cell texts of a row starting at `top`.
    fn draw_row(
        &self,
        layer: &PdfLayerReference,
        cells: &[String],
        top: f32,
        font: &IndirectFontRef,
    ) {
        rule(layer, MARGIN, PAGE_WIDTH - MARGIN, top, top);
        let baseline = top - ROW_HEIGHT + 2.0;
        for (i, cell) in cells.iter().enumerate().take(self.columns) {
            let x = MARGIN + i as f32 * self.column_width + CELL_PADDING;
            layer.use_text(
                fit(cell, self.max_chars),
                CELL_FONT_SIZE,
                Mm(x),
                Mm(baseline),
                font,
            );
        }
    }

    /// Bottom rule and column separators for the rows between `top` and `bottom`.
    fn close(&self, layer: &PdfLayerReference, top: f32, bottom: f32) {
        rule(layer, MARGIN, PAGE_WIDTH - MARGIN, bottom, bottom);
        for i in 0..=self.columns {
            let x = MARGIN + i as f32 * self.column_width;
            rule(layer, x, x, top, bottom);
        }
    }
}

fn rule(layer: &PdfLayerReference, x1: f32, x2: f32, y1: f32, y2: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y2)), false),
        ],
        is_closed: false,
    });
}

fn fit(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let keep = max_chars.saturating_sub(3);
    let mut cut: String = flat.chars().take(keep).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Chart, ChartKind};

    fn generated() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_pdf_with_table_and_chart() {
        let table = Table::new(
            vec!["Job Name".into(), "State".into()],
            (0..80)
                .map(|i| {
                    let state = if i % 2 == 0 { "WAITING" } else { "DELETED" };
                    vec![format!("Job {}", i), state.into()]
                })
                .collect(),
        );
        let chart = Chart::from_columns(ChartKind::CountBar, &table, "State", "State")
            .unwrap()
            .render()
            .unwrap();

        let bytes = to_pdf("Scheduled Jobs Report", &table, &[chart], generated()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_with_long_legend() {
        let table = Table::new(
            vec!["Name".into()],
            (0..45).map(|i| vec![format!("Account {}", i)]).collect(),
        );
        let chart = Chart::count_bar(&table, "Name").unwrap().render().unwrap();
        assert_eq!(chart.legend.len(), 45);

        let bytes = to_pdf("Accounts", &table, &[chart], generated()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_for_empty_table() {
        let bytes = to_pdf("Empty", &Table::default(), &[], generated()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_fit_truncates() {
        assert_eq!(fit("short", 10), "short");
        assert_eq!(fit("a much longer value", 10), "a much ...");
        assert_eq!(fit("two\nlines", 20), "two lines");
    }
}
