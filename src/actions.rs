//! Record actions: quick-create forms, generic CRUD, file upload and CSV
//! import.
//!
//! Every action reports an [`ActionOutcome`]; Salesforce errors become the
//! outcome message instead of propagating.

use std::path::Path;

use base64::Engine;
use serde::Serialize;
use serde_json::{Map, Value};
use sfdesk_client::security::soql;
use sfdesk_report::Table;
use sfdesk_rest::SalesforceApi;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::outcome::ActionOutcome;

pub const CREATED: &str = "Record created successfully.";
pub const UPDATED: &str = "Record updated successfully.";
pub const DELETED: &str = "Record deleted successfully.";

// ============================================================================
// Generic CRUD
// ============================================================================

#[instrument(skip(api, record))]
pub async fn create_record<A: SalesforceApi>(
    api: &A,
    sobject: &str,
    record: &Value,
) -> ActionOutcome {
    match api.create(sobject, record).await {
        Ok(id) => {
            info!(%id, "Record created");
            ActionOutcome::ok(Some(id), CREATED)
        }
        Err(e) => {
            warn!(error = %e, "Create failed");
            ActionOutcome::failed(e.to_string())
        }
    }
}

#[instrument(skip(api, record))]
pub async fn update_record<A: SalesforceApi>(
    api: &A,
    sobject: &str,
    id: &str,
    record: &Value,
) -> ActionOutcome {
    match api.update(sobject, id, record).await {
        Ok(()) => ActionOutcome::ok(Some(id.to_string()), UPDATED),
        Err(e) => {
            warn!(error = %e, "Update failed");
            ActionOutcome::failed(e.to_string())
        }
    }
}

#[instrument(skip(api))]
pub async fn delete_record<A: SalesforceApi>(api: &A, sobject: &str, id: &str) -> ActionOutcome {
    match api.delete(sobject, id).await {
        Ok(()) => ActionOutcome::ok(Some(id.to_string()), DELETED),
        Err(e) => {
            warn!(error = %e, "Delete failed");
            ActionOutcome::failed(e.to_string())
        }
    }
}

/// One field of an object as shown by `describe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub label: String,
    pub name: String,
    pub field_type: String,
    pub updateable: bool,
    pub nillable: bool,
}

/// Field list of `sobject`, in describe order.
#[instrument(skip(api))]
pub async fn describe_object<A: SalesforceApi>(
    api: &A,
    sobject: &str,
) -> Result<Vec<FieldSummary>> {
    let describe = api.describe(sobject).await?;
    Ok(describe
        .fields
        .into_iter()
        .map(|field| FieldSummary {
            label: field.label,
            name: field.name,
            field_type: field.field_type,
            updateable: field.updateable,
            nillable: field.nillable,
        })
        .collect())
}

pub fn fields_table(fields: &[FieldSummary]) -> Table {
    let yes_no = |b: bool| if b { "Yes" } else { "No" }.to_string();
    Table::new(
        vec![
            "Label".into(),
            "Name".into(),
            "Type".into(),
            "Updateable".into(),
            "Nillable".into(),
        ],
        fields
            .iter()
            .map(|f| {
                vec![
                    f.label.clone(),
                    f.name.clone(),
                    f.field_type.clone(),
                    yes_no(f.updateable),
                    yes_no(f.nillable),
                ]
            })
            .collect(),
    )
}

// ============================================================================
// Name lookups
// ============================================================================

/// Id of the first `sobject` record whose Name equals `name`.
#[instrument(skip(api))]
pub async fn lookup_id<A: SalesforceApi>(
    api: &A,
    sobject: &str,
    name: &str,
) -> Result<Option<String>> {
    if !soql::is_safe_sobject_name(sobject) {
        return Err(Error::validation(format!("invalid object name: {sobject}")));
    }
    let query = format!(
        "SELECT Id FROM {} WHERE Name = '{}' LIMIT 1",
        sobject,
        soql::escape_string(name)
    );
    let records = api.query(&query).await?;
    Ok(records
        .first()
        .and_then(|r| r.get("Id"))
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Resolve an optional name to an Id. A name that matches nothing is a
/// failed outcome.
async fn resolve<A: SalesforceApi>(
    api: &A,
    sobject: &str,
    name: Option<&str>,
) -> std::result::Result<Option<String>, ActionOutcome> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    match lookup_id(api, sobject, name).await {
        Ok(Some(id)) => Ok(Some(id)),
        Ok(None) => Err(ActionOutcome::failed(format!("{sobject} '{name}' not found."))),
        Err(e) => Err(ActionOutcome::failed(e.to_string())),
    }
}

// ============================================================================
// Quick-create forms
// ============================================================================

/// Record body builder that leaves out empty values.
#[derive(Default)]
struct Fields(Map<String, Value>);

impl Fields {
    fn text(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.0.insert(name.to_string(), Value::String(value.to_string()));
        }
        self
    }

    fn value(mut self, name: &str, value: Option<Value>) -> Self {
        if let Some(value) = value {
            self.0.insert(name.to_string(), value);
        }
        self
    }

    fn build(self) -> Value {
        Value::Object(self.0)
    }
}

fn required(field: &str, value: &str) -> std::result::Result<(), ActionOutcome> {
    if value.trim().is_empty() {
        Err(ActionOutcome::failed(format!("{field} is required.")))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewContact {
    pub salutation: Option<String>,
    pub first_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub account_name: Option<String>,
}

pub async fn create_contact<A: SalesforceApi>(api: &A, contact: &NewContact) -> ActionOutcome {
    if let Err(outcome) = required("Last Name", &contact.last_name) {
        return outcome;
    }
    let account_id = match resolve(api, "Account", contact.account_name.as_deref()).await {
        Ok(id) => id,
        Err(outcome) => return outcome,
    };

    let record = Fields::default()
        .text("Salutation", contact.salutation.as_deref())
        .text("FirstName", contact.first_name.as_deref())
        .text("LastName", Some(contact.last_name.as_str()))
        .text("Email", contact.email.as_deref())
        .text("Phone", contact.phone.as_deref())
        .text("AccountId", account_id.as_deref())
        .build();
    create_record(api, "Contact", &record).await
}

#[derive(Debug, Clone, Default)]
pub struct NewOpportunity {
    pub name: String,
    pub account_name: Option<String>,
    /// `YYYY-MM-DD`.
    pub close_date: String,
    pub stage_name: String,
    pub amount: Option<f64>,
}

pub async fn create_opportunity<A: SalesforceApi>(api: &A, opp: &NewOpportunity) -> ActionOutcome {
    for (field, value) in [
        ("Name", &opp.name),
        ("Close Date", &opp.close_date),
        ("Stage", &opp.stage_name),
    ] {
        if let Err(outcome) = required(field, value) {
            return outcome;
        }
    }
    let account_id = match resolve(api, "Account", opp.account_name.as_deref()).await {
        Ok(id) => id,
        Err(outcome) => return outcome,
    };

    let record = Fields::default()
        .text("Name", Some(opp.name.as_str()))
        .text("AccountId", account_id.as_deref())
        .text("CloseDate", Some(opp.close_date.as_str()))
        .text("StageName", Some(opp.stage_name.as_str()))
        .value("Amount", opp.amount.map(Value::from))
        .build();
    create_record(api, "Opportunity", &record).await
}

#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub subject: String,
    /// ISO 8601 date-time.
    pub start: String,
    /// ISO 8601 date-time.
    pub end: String,
    /// Contact or Lead Id.
    pub who_id: Option<String>,
    /// Related record Id (Account, Opportunity...).
    pub what_id: Option<String>,
}

pub async fn create_event<A: SalesforceApi>(api: &A, event: &NewEvent) -> ActionOutcome {
    for (field, value) in [
        ("Subject", &event.subject),
        ("Start", &event.start),
        ("End", &event.end),
    ] {
        if let Err(outcome) = required(field, value) {
            return outcome;
        }
    }

    let record = Fields::default()
        .text("Subject", Some(event.subject.as_str()))
        .text("StartDateTime", Some(event.start.as_str()))
        .text("EndDateTime", Some(event.end.as_str()))
        .text("WhoId", event.who_id.as_deref())
        .text("WhatId", event.what_id.as_deref())
        .build();
    create_record(api, "Event", &record).await
}

#[derive(Debug, Clone, Default)]
pub struct NewCase {
    pub subject: String,
    pub status: Option<String>,
    pub origin: Option<String>,
    pub priority: Option<String>,
    pub description: Option<String>,
    pub account_name: Option<String>,
}

pub async fn create_case<A: SalesforceApi>(api: &A, case: &NewCase) -> ActionOutcome {
    if let Err(outcome) = required("Subject", &case.subject) {
        return outcome;
    }
    let account_id = match resolve(api, "Account", case.account_name.as_deref()).await {
        Ok(id) => id,
        Err(outcome) => return outcome,
    };

    let record = Fields::default()
        .text("Subject", Some(case.subject.as_str()))
        .text("Status", case.status.as_deref())
        .text("Origin", case.origin.as_deref())
        .text("Priority", case.priority.as_deref())
        .text("Description", case.description.as_deref())
        .text("AccountId", account_id.as_deref())
        .build();
    create_record(api, "Case", &record).await
}

#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub first_name: Option<String>,
    pub last_name: String,
    pub company: String,
    pub email: Option<String>,
    pub status: Option<String>,
}

pub async fn create_lead<A: SalesforceApi>(api: &A, lead: &NewLead) -> ActionOutcome {
    for (field, value) in [("Last Name", &lead.last_name), ("Company", &lead.company)] {
        if let Err(outcome) = required(field, value) {
            return outcome;
        }
    }

    let record = Fields::default()
        .text("FirstName", lead.first_name.as_deref())
        .text("LastName", Some(lead.last_name.as_str()))
        .text("Company", Some(lead.company.as_str()))
        .text("Email", lead.email.as_deref())
        .text("Status", lead.status.as_deref())
        .build();
    create_record(api, "Lead", &record).await
}

// ============================================================================
// Files and bulk import
// ============================================================================

/// Upload bytes as a new `ContentVersion`.
#[instrument(skip(api, data), fields(size = data.len()))]
pub async fn upload_bytes<A: SalesforceApi>(
    api: &A,
    file_name: &str,
    data: &[u8],
) -> ActionOutcome {
    if let Err(outcome) = required("File name", file_name) {
        return outcome;
    }
    let record = serde_json::json!({
        "Title": file_name,
        "PathOnClient": file_name,
        "VersionData": base64::engine::general_purpose::STANDARD.encode(data),
        "IsMajorVersion": true,
    });
    create_record(api, "ContentVersion", &record).await
}

/// Upload a local file; its file name becomes the title.
pub async fn upload_file<A: SalesforceApi>(api: &A, path: &Path) -> Result<ActionOutcome> {
    let data = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(upload_bytes(api, &file_name, &data).await)
}

/// Create one `sobject` record per table row; headers are field names and
/// empty cells are left out. Every row is attempted.
#[instrument(skip(api, table), fields(rows = table.len()))]
pub async fn import_table<A: SalesforceApi>(
    api: &A,
    sobject: &str,
    table: &Table,
) -> Vec<ActionOutcome> {
    let mut outcomes = Vec::with_capacity(table.len());
    for row in &table.rows {
        let mut fields = Fields::default();
        for (column, cell) in table.columns.iter().zip(row) {
            fields = fields.text(column.trim(), Some(cell.as_str()));
        }
        outcomes.push(create_record(api, sobject, &fields.build()).await);
    }

    let created = outcomes.iter().filter(|o| o.success).count();
    debug!(created, failed = outcomes.len() - created, "Import finished");
    outcomes
}

pub async fn import_csv<A: SalesforceApi>(
    api: &A,
    sobject: &str,
    path: &Path,
) -> Result<Vec<ActionOutcome>> {
    let table = sfdesk_report::export::load_csv(path)?;
    Ok(import_table(api, sobject, &table).await)
}
