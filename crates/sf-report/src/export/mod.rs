//! File exporters for report tables and charts.

pub mod csv;
pub mod excel;
pub mod pdf;
pub mod pptx;

pub use self::csv::{load_csv, read_csv, save_csv, to_csv_bytes, write_csv};
pub use excel::{save_xlsx, to_xlsx};
pub use pdf::{save_pdf, to_pdf};
pub use pptx::{save_pptx, to_pptx};
