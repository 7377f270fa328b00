//! Setup audit trail and login history.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use sfdesk_client::security::{soql, url};
use sfdesk_report::Table;
use sfdesk_rest::SalesforceApi;
use tracing::{debug, instrument};

use super::text_at;
use crate::error::Result;

pub const SETUP_AUDIT_SOQL: &str =
    "SELECT Action, CreatedDate, CreatedBy.Name FROM SetupAuditTrail ORDER BY CreatedDate DESC LIMIT 100";

pub const LOGIN_HISTORY_SOQL: &str =
    "SELECT UserId, LoginTime, SourceIp, LoginType, Status FROM LoginHistory ORDER BY LoginTime DESC LIMIT 100";

pub const SETUP_AUDIT_TITLE: &str = "Audit Logs Report";
pub const LOGIN_HISTORY_TITLE: &str = "Login History Report";

/// Shown for a login whose user could not be resolved.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Latest setup changes. `Created By` is the creator's name, or `None` when
/// the change has no creator (automated processes).
#[instrument(skip(api))]
pub async fn setup_audit_trail<A: SalesforceApi>(api: &A) -> Result<Table> {
    let records = api.query(SETUP_AUDIT_SOQL).await?;
    let rows = records
        .iter()
        .map(|record| {
            vec![
                text_at(record, "/Action").unwrap_or_default().to_string(),
                text_at(record, "/CreatedDate").unwrap_or_default().to_string(),
                text_at(record, "/CreatedBy/Name").unwrap_or("None").to_string(),
            ]
        })
        .collect();

    Ok(Table::new(
        vec!["Action".into(), "Created Date".into(), "Created By".into()],
        rows,
    ))
}

/// Latest logins with the user id replaced by the user's name.
#[instrument(skip(api))]
pub async fn login_history<A: SalesforceApi>(api: &A) -> Result<Table> {
    let records = api.query(LOGIN_HISTORY_SOQL).await?;

    let user_ids: BTreeSet<&str> = records
        .iter()
        .filter_map(|record| text_at(record, "/UserId"))
        .filter(|id| url::is_valid_salesforce_id(id))
        .collect();
    let names = user_names(api, &user_ids).await?;

    let rows = records
        .iter()
        .map(|record| {
            let user = text_at(record, "/UserId")
                .and_then(|id| names.get(id))
                .map(String::as_str)
                .unwrap_or(UNKNOWN_USER);
            vec![
                user.to_string(),
                text_at(record, "/LoginTime").unwrap_or_default().to_string(),
                text_at(record, "/SourceIp").unwrap_or_default().to_string(),
                text_at(record, "/LoginType").unwrap_or_default().to_string(),
                text_at(record, "/Status").unwrap_or_default().to_string(),
            ]
        })
        .collect();

    Ok(Table::new(
        vec![
            "User".into(),
            "Login Time".into(),
            "Source IP".into(),
            "Login Type".into(),
            "Status".into(),
        ],
        rows,
    ))
}

/// One `SELECT Id, Name FROM User WHERE Id IN (...)` for all ids.
async fn user_names<A: SalesforceApi>(
    api: &A,
    ids: &BTreeSet<&str>,
) -> Result<HashMap<String, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("'{}'", soql::escape_string(id)))
        .collect();
    let query = format!("SELECT Id, Name FROM User WHERE Id IN ({})", quoted.join(", "));
    let users = api.query(&query).await?;
    debug!(requested = ids.len(), resolved = users.len(), "Resolved user names");

    Ok(users
        .iter()
        .filter_map(|user: &Value| {
            Some((
                text_at(user, "/Id")?.to_string(),
                text_at(user, "/Name")?.to_string(),
            ))
        })
        .collect())
}
