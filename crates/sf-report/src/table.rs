//! Flattening query results into tables.
//!
//! Salesforce returns records as nested JSON: lookups come back as objects
//! (`"CreatedBy": {"attributes": {...}, "Name": "Ann"}`) and subqueries as
//! `{"totalSize", "done", "records"}` envelopes. A [`Table`] is the flat,
//! ordered, all-strings shape every renderer and exporter works from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// Shown instead of an empty grid.
pub const NO_RECORDS: &str = "No records found.";

/// Joins child values folded into one cell by [`Table::from_records`].
pub const CHILD_SEPARATOR: &str = "; ";

/// Ordered columns and string cells. Every row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from explicit columns and rows. Short rows are padded
    /// with empty cells and long rows are cut to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Flatten records: `attributes` dropped, nested objects become dotted
    /// columns, columns ordered by first appearance, null rendered empty.
    /// A subquery result becomes one `Rel.Field` column per child field with
    /// the children's values joined by [`CHILD_SEPARATOR`]; use
    /// [`from_parent_child`](Self::from_parent_child) for a row per child.
    pub fn from_records(records: &[Value]) -> Self {
        let mut builder = TableBuilder::default();
        for record in records {
            let mut cells = Vec::new();
            flatten_record("", record, &mut cells);
            builder.push(cells);
        }
        builder.finish()
    }

    /// Summary mode for a query with a child subquery: one row per
    /// (parent, child) pair, child fields prefixed with `child_relationship.`.
    /// A parent without children yields one row with empty child cells.
    pub fn from_parent_child(records: &[Value], child_relationship: &str) -> Self {
        let mut builder = TableBuilder::default();
        for record in records {
            let mut parent_cells = Vec::new();
            if let Value::Object(map) = record {
                for (key, value) in map {
                    if key == "attributes" || key == child_relationship {
                        continue;
                    }
                    flatten_value(key, value, &mut parent_cells);
                }
            }

            let children = record
                .get(child_relationship)
                .and_then(|rel| rel.get("records"))
                .and_then(Value::as_array)
                .filter(|children| !children.is_empty());

            match children {
                Some(children) => {
                    for child in children {
                        let mut cells = parent_cells.clone();
                        flatten_record(child_relationship, child, &mut cells);
                        builder.push(cells);
                    }
                }
                None => builder.push(parent_cells),
            }
        }
        builder.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let index = self
            .column_index(name)
            .ok_or_else(|| Error::new(ErrorKind::UnknownColumn(name.to_string())))?;
        Ok(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Pick and rename columns: each `(source, header)` pair becomes one
    /// output column. A source column that is absent yields empty cells.
    pub fn project(&self, selection: &[(&str, &str)]) -> Table {
        let indexes: Vec<Option<usize>> = selection
            .iter()
            .map(|(source, _)| self.column_index(source))
            .collect();
        let columns = selection.iter().map(|(_, header)| header.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indexes
                    .iter()
                    .map(|index| index.map(|i| row[i].clone()).unwrap_or_default())
                    .collect()
            })
            .collect();
        Table { columns, rows }
    }
}

/// Render an aligned text grid, or [`NO_RECORDS`] for an empty table.
pub fn render_text(table: &Table) -> String {
    if table.is_empty() {
        return NO_RECORDS.to_string();
    }

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[String]| {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" | ");
        line.trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&format_line(&table.columns));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &table.rows {
        out.push('\n');
        out.push_str(&format_line(row));
    }
    out
}

/// Text form of a JSON scalar as shown in a cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn flatten_record(prefix: &str, record: &Value, out: &mut Vec<(String, String)>) {
    match record {
        Value::Object(map) => {
            for (key, value) in map {
                if key == "attributes" {
                    continue;
                }
                let column = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_value(&column, value, out);
            }
        }
        other => out.push((prefix.to_string(), cell_text(other))),
    }
}

fn flatten_value(column: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => match subquery_records(map) {
            Some(children) => flatten_children(column, children, out),
            None => flatten_record(column, value, out),
        },
        other => out.push((column.to_string(), cell_text(other))),
    }
}

/// Child rows of a subquery envelope (`totalSize`, `done`, `records`).
fn subquery_records(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    if map.contains_key("totalSize") && map.contains_key("done") {
        map.get("records").and_then(Value::as_array)
    } else {
        None
    }
}

/// Fold a parent's child rows into one cell per child column, the children's
/// values joined with [`CHILD_SEPARATOR`] in record order.
fn flatten_children(column: &str, children: &[Value], out: &mut Vec<(String, String)>) {
    let mut builder = TableBuilder::default();
    for child in children {
        let mut cells = Vec::new();
        flatten_record(column, child, &mut cells);
        builder.push(cells);
    }
    let table = builder.finish();
    for (index, name) in table.columns.iter().enumerate() {
        let joined = table
            .rows
            .iter()
            .map(|row| row[index].as_str())
            .collect::<Vec<_>>()
            .join(CHILD_SEPARATOR);
        out.push((name.clone(), joined));
    }
}

#[derive(Default)]
struct TableBuilder {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    rows: Vec<Vec<(usize, String)>>,
}

impl TableBuilder {
    fn push(&mut self, cells: Vec<(String, String)>) {
        let row = cells
            .into_iter()
            .map(|(column, text)| {
                let next = self.columns.len();
                let index = *self.positions.entry(column.clone()).or_insert(next);
                if index == next {
                    self.columns.push(column);
                }
                (index, text)
            })
            .collect();
        self.rows.push(row);
    }

    fn finish(self) -> Table {
        let width = self.columns.len();
        let rows = self
            .rows
            .into_iter()
            .map(|cells| {
                let mut row = vec![String::new(); width];
                for (index, text) in cells {
                    row[index] = text;
                }
                row
            })
            .collect();
        Table {
            columns: self.columns,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_records_flattens_and_orders() {
        let records = vec![
            json!({
                "attributes": {"type": "SetupAuditTrail", "url": "/x"},
                "Action": "createScratchOrg",
                "CreatedDate": "2024-05-01T10:00:00.000+0000",
                "CreatedBy": {"attributes": {"type": "User"}, "Name": "Ann Admin"}
            }),
            json!({
                "attributes": {"type": "SetupAuditTrail"},
                "Action": "changedPassword",
                "CreatedDate": "2024-05-02T10:00:00.000+0000",
                "CreatedBy": {"Name": null},
                "Section": "Manage Users"
            }),
        ];

        let table = Table::from_records(&records);
        assert_eq!(
            table.columns,
            vec!["Action", "CreatedDate", "CreatedBy.Name", "Section"]
        );
        assert_eq!(table.rows[0][2], "Ann Admin");
        assert_eq!(table.rows[0][3], "");
        assert_eq!(table.rows[1][2], "");
        assert_eq!(table.rows[1][3], "Manage Users");
    }

    #[test]
    fn test_from_records_scalars() {
        let table = Table::from_records(&[json!({
            "Amount": 1500.5,
            "IsWon": true,
            "CloseDate": null
        })]);
        assert_eq!(table.rows[0], vec!["1500.5", "true", ""]);
    }

    #[test]
    fn test_parent_child_summary() {
        let records = vec![
            json!({
                "attributes": {"type": "Account"},
                "Name": "Acme",
                "Contacts": {
                    "totalSize": 2,
                    "done": true,
                    "records": [
                        {"attributes": {"type": "Contact"}, "LastName": "Smith"},
                        {"attributes": {"type": "Contact"}, "LastName": "Jones"}
                    ]
                }
            }),
            json!({"attributes": {"type": "Account"}, "Name": "Globex", "Contacts": null}),
        ];

        let table = Table::from_parent_child(&records, "Contacts");
        assert_eq!(table.columns, vec!["Name", "Contacts.LastName"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["Acme".to_string(), "Smith".to_string()],
                vec!["Acme".to_string(), "Jones".to_string()],
                vec!["Globex".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn test_from_records_folds_subquery() {
        let records = vec![
            json!({
                "attributes": {"type": "Account"},
                "Name": "Acme",
                "Contacts": {"totalSize": 2, "done": true, "records": [
                    {"attributes": {"type": "Contact"}, "LastName": "Smith", "Email": "s@acme.com"},
                    {"attributes": {"type": "Contact"}, "LastName": "Jones", "Email": null}
                ]}
            }),
            json!({
                "attributes": {"type": "Account"},
                "Name": "Initech",
                "Contacts": {"totalSize": 1, "done": true, "records": [
                    {"attributes": {"type": "Contact"}, "LastName": "Lumbergh"}
                ]}
            }),
        ];
        let table = Table::from_records(&records);

        assert_eq!(table.columns, vec!["Name", "Contacts.LastName", "Contacts.Email"]);
        assert_eq!(table.rows[0], vec!["Acme", "Smith; Jones", "s@acme.com; "]);
        assert_eq!(table.rows[1], vec!["Initech", "Lumbergh", ""]);
        assert!(table.rows.iter().flatten().all(|cell| !cell.contains("attributes")));
    }

    #[test]
    fn test_render_text_empty() {
        assert_eq!(render_text(&Table::default()), "No records found.");
        assert_eq!(render_text(&Table::from_records(&[])), NO_RECORDS);
    }

    #[test]
    fn test_render_text_aligned() {
        let table = Table::new(
            vec!["Name".into(), "Stage".into()],
            vec![
                vec!["Acme deal".into(), "Won".into()],
                vec!["X".into(), "Prospecting".into()],
            ],
        );
        let text = render_text(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name      | Stage");
        assert_eq!(lines[1], "----------+------------");
        assert_eq!(lines[2], "Acme deal | Won");
        assert_eq!(lines[3], "X         | Prospecting");
    }

    #[test]
    fn test_project_and_column() {
        let table = Table::from_records(&[json!({
            "Id": "08exx",
            "CronJobDetail": {"Name": "Nightly"},
            "State": "WAITING"
        })]);
        let report = table.project(&[
            ("CronJobDetail.Name", "Job Name"),
            ("State", "State"),
            ("NextFireTime", "Next Fire Time"),
        ]);
        assert_eq!(report.columns, vec!["Job Name", "State", "Next Fire Time"]);
        assert_eq!(report.rows[0], vec!["Nightly", "WAITING", ""]);
        assert_eq!(report.column("State").unwrap(), vec!["WAITING"]);
        assert!(report.column("Missing").is_err());
    }
}
