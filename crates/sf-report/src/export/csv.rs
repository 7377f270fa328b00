use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::table::Table;

/// Write a header row and one record per row, comma delimited.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    Ok(buffer)
}

pub fn save_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = table.len(), "Writing CSV");
    write_csv(table, std::fs::File::create(path)?)
}

/// Read a CSV with a header row into a table.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<std::result::Result<Vec<Vec<String>>, _>>()?;
    Ok(Table::new(columns, rows))
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<Table> {
    read_csv(std::fs::File::open(path)?)
}
