//! Org API limits.

use serde::Serialize;
use serde_json::Value;
use sfdesk_report::Table;
use sfdesk_rest::SalesforceApi;
use tracing::instrument;

use crate::error::Result;

pub const LIMITS_TITLE: &str = "API Limits Report";

/// One entry of the `limits` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitRow {
    pub name: String,
    pub max: i64,
    pub remaining: i64,
    pub used: i64,
}

/// Flatten the `limits` document, keeping the order Salesforce returns.
///
/// `filter` keeps names containing it, ignoring case. Entries without a
/// numeric `Max` are skipped.
pub fn limit_rows(limits: &Value, filter: Option<&str>) -> Vec<LimitRow> {
    let needle = filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);

    let Some(map) = limits.as_object() else {
        return Vec::new();
    };

    map.iter()
        .filter(|(name, _)| match &needle {
            Some(needle) => name.to_lowercase().contains(needle),
            None => true,
        })
        .filter_map(|(name, entry)| {
            let max = entry.get("Max")?.as_i64()?;
            let remaining = entry.get("Remaining").and_then(Value::as_i64).unwrap_or(0);
            Some(LimitRow {
                name: name.clone(),
                max,
                remaining,
                used: max - remaining,
            })
        })
        .collect()
}

pub fn limits_table(rows: &[LimitRow]) -> Table {
    Table::new(
        vec!["Name".into(), "Max".into(), "Remaining".into(), "Used".into()],
        rows.iter()
            .map(|row| {
                vec![
                    row.name.clone(),
                    row.max.to_string(),
                    row.remaining.to_string(),
                    row.used.to_string(),
                ]
            })
            .collect(),
    )
}

/// Current limits as a Name / Max / Remaining / Used table.
#[instrument(skip(api))]
pub async fn api_limits<A: SalesforceApi>(api: &A, filter: Option<&str>) -> Result<Table> {
    let limits = api.limits().await?;
    Ok(limits_table(&limit_rows(&limits, filter)))
}
