//! # sfdesk-report
//!
//! Turns Salesforce query results into tables, draws charts from them and
//! exports both to CSV, Excel, PDF and PowerPoint.
//!
//! ```rust,ignore
//! use sfdesk_report::{export, Chart, ChartKind, Table};
//!
//! let table = Table::from_records(&records);
//! let chart = Chart::from_columns(ChartKind::Bar, &table, "StageName", "Amount")?.render()?;
//! export::save_pdf("pipeline.pdf", "Pipeline", &table, &[chart], chrono::Utc::now())?;
//! ```

mod chart;
mod error;
pub mod export;
mod table;

pub use chart::{
    suggest_charts, Chart, ChartKind, LegendEntry, RenderedChart, DEFAULT_HEIGHT, DEFAULT_WIDTH,
    PIE_MAX_DISTINCT,
};
pub use error::{Error, ErrorKind, Result};
pub use table::{cell_text, render_text, Table, CHILD_SEPARATOR, NO_RECORDS};
