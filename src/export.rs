//! Writing a result table (and its charts) to a file chosen by extension.

use std::path::Path;

use chrono::Utc;
use sfdesk_report::{export, suggest_charts, Chart, RenderedChart, Table};
use tracing::info;

use crate::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Xlsx,
    Pdf,
    Pptx,
}

impl ReportFormat {
    /// Format implied by the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "xlsx" => Ok(ReportFormat::Xlsx),
            "pdf" => Ok(ReportFormat::Pdf),
            "pptx" => Ok(ReportFormat::Pptx),
            other => Err(Error::validation(format!(
                "unsupported export extension '{other}' (use csv, xlsx, pdf or pptx)"
            ))),
        }
    }
}

fn render_all(charts: &[Chart]) -> Result<Vec<RenderedChart>> {
    charts
        .iter()
        .map(|chart| chart.render().map_err(Error::from))
        .collect()
}

/// Write `table` to `path`.
///
/// PDF appends `charts` after the table. A presentation needs at least one
/// chart, so it falls back to the suggested charts for the table.
pub fn write_report(
    path: &Path,
    title: &str,
    table: &Table,
    charts: &[Chart],
) -> Result<ReportFormat> {
    let format = ReportFormat::from_path(path)?;
    match format {
        ReportFormat::Csv => export::save_csv(table, path)?,
        ReportFormat::Xlsx => export::save_xlsx(table, path)?,
        ReportFormat::Pdf => {
            export::save_pdf(path, title, table, &render_all(charts)?, Utc::now())?
        }
        ReportFormat::Pptx => {
            let suggested;
            let charts = if charts.is_empty() {
                suggested = suggest_charts(table);
                &suggested[..]
            } else {
                charts
            };
            if charts.is_empty() {
                return Err(Error::new(ErrorKind::Report(sfdesk_report::ErrorKind::NoData(
                    "nothing in the table can be charted".to_string(),
                ))));
            }
            export::save_pptx(path, &render_all(charts)?)?
        }
    }
    info!(path = %path.display(), ?format, rows = table.len(), "Report written");
    Ok(format)
}
