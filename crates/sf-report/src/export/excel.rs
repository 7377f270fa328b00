use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::chart::parse_number;
use crate::error::Result;
use crate::table::Table;

const SHEET_NAME: &str = "Report";

/// Build an `.xlsx` workbook: bold header row, one row per record, numeric
/// cells written as numbers.
pub fn to_xlsx(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, header) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let excel_row = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            match as_number(cell) {
                Some(number) => worksheet.write_number(excel_row, col as u16, number)?,
                None => worksheet.write_string(excel_row, col as u16, cell)?,
            };
        }
    }
    worksheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

pub fn save_xlsx(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = table.len(), "Writing Excel workbook");
    std::fs::write(path, to_xlsx(table)?)?;
    Ok(())
}

/// Numbers, but not codes with leading zeros such as `00123`.
fn as_number(cell: &str) -> Option<f64> {
    let digits = cell.strip_prefix('-').unwrap_or(cell);
    let leading_zero = digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.");
    if leading_zero {
        return None;
    }
    parse_number(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_xlsx_is_a_zip_with_sheet() {
        let table = Table::new(
            vec!["Name".into(), "Amount".into()],
            vec![
                vec!["Acme".into(), "1500.25".into()],
                vec!["Globex".into(), "".into()],
            ],
        );
        let bytes = to_xlsx(&table).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains("<v>1500.25</v>"));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number("42"), Some(42.0));
        assert_eq!(as_number("-0.5"), Some(-0.5));
        assert_eq!(as_number("0"), Some(0.0));
        assert_eq!(as_number("00123"), None);
        assert_eq!(as_number("001xx000003DgAAAAS"), None);
        assert_eq!(as_number("NaN"), None);
    }
}
