//! Parent chains over self-referencing `ParentId` lookups.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use sfdesk_client::security::{soql, url};
use sfdesk_report::Table;
use sfdesk_rest::SalesforceApi;
use tracing::{instrument, warn};

use crate::error::{Error, ErrorKind, Result};

const PARENT_FIELD: &str = "ParentId";
// 15-character Ids are case-sensitive; the 18-character form only appends a
// checksum, so the first 15 characters identify the record.
const ID_KEY_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    pub id: String,
    pub name: String,
}

fn id_key(id: &str) -> &str {
    id.get(..ID_KEY_LEN).unwrap_or(id)
}

fn check_sobject(sobject: &str) -> Result<()> {
    if soql::is_safe_sobject_name(sobject) {
        Ok(())
    } else {
        Err(Error::validation(format!("invalid object name: {sobject}")))
    }
}

/// First 100 records of `sobject` by name, for picking a starting record.
#[instrument(skip(api))]
pub async fn list_records<A: SalesforceApi>(api: &A, sobject: &str) -> Result<Table> {
    check_sobject(sobject)?;
    let query = format!("SELECT Id, Name FROM {sobject} ORDER BY Name LIMIT 100");
    let records = api.query(&query).await?;
    Ok(Table::from_records(&records).project(&[("Id", "Id"), ("Name", "Name")]))
}

/// Walk `ParentId` upward from `id` and return the chain root first.
///
/// The walk stops at a record without a parent, at a parent that cannot be
/// read, or when an Id repeats. The 15- and 18-character forms of an Id
/// count as the same record.
#[instrument(skip(api))]
pub async fn record_hierarchy<A: SalesforceApi>(
    api: &A,
    sobject: &str,
    id: &str,
) -> Result<Vec<HierarchyNode>> {
    check_sobject(sobject)?;
    if !url::is_valid_salesforce_id(id) {
        return Err(Error::validation(format!("invalid record Id: {id}")));
    }

    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(id.to_string());

    while let Some(current) = next.take() {
        if !seen.insert(id_key(&current).to_string()) {
            warn!(id = %current, "Hierarchy cycle detected, stopping");
            break;
        }

        let query = format!(
            "SELECT Id, Name, {PARENT_FIELD} FROM {sobject} WHERE Id = '{}'",
            soql::escape_string(&current)
        );
        let Some(record) = api.query(&query).await?.into_iter().next() else {
            if chain.is_empty() {
                return Err(Error::new(ErrorKind::NotFound(format!(
                    "{sobject} record {current}"
                ))));
            }
            break;
        };

        let field = |name: &str| {
            record
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        chain.push(HierarchyNode {
            id: field("Id"),
            name: field("Name"),
        });
        next = Some(field(PARENT_FIELD)).filter(|parent| !parent.is_empty());
    }

    chain.reverse();
    Ok(chain)
}

/// One line per level, `→` repeated by depth.
pub fn render_hierarchy(chain: &[HierarchyNode]) -> String {
    if chain.is_empty() {
        return "No hierarchy found.".to_string();
    }
    chain
        .iter()
        .enumerate()
        .map(|(depth, node)| {
            let line = format!("{} (ID: {})", node.name, node.id);
            if depth == 0 {
                line
            } else {
                format!("{} {}", "→".repeat(depth), line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
