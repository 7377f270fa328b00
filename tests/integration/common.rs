//! In-memory Salesforce for viewer and action tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};
use sfdesk::rest::{
    DescribeGlobalResult, DescribeSObjectResult, Error, ErrorKind, Result, SalesforceApi,
};

/// Answers queries from a table keyed by the exact SOQL text and records
/// every call. Unknown queries return no rows.
#[derive(Default)]
pub struct FakeApi {
    rows: HashMap<String, Vec<Value>>,
    counts: HashMap<String, u64>,
    describes: HashMap<String, Value>,
    limits: Value,
    /// `(field, value)` pairs that make a create fail.
    rejections: Vec<(String, String)>,
    pub queries: Mutex<Vec<String>>,
    pub created: Mutex<Vec<(String, Value)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, soql: &str, rows: Value) -> Self {
        let rows = rows.as_array().cloned().unwrap_or_default();
        self.rows.insert(soql.to_string(), rows);
        self
    }

    pub fn with_count(mut self, soql: &str, count: u64) -> Self {
        self.counts.insert(soql.to_string(), count);
        self
    }

    pub fn with_describe(mut self, describe: Value) -> Self {
        let name = describe["name"].as_str().unwrap_or_default().to_string();
        self.describes.insert(name, describe);
        self
    }

    pub fn with_limits(mut self, limits: Value) -> Self {
        self.limits = limits;
        self
    }

    /// Fail creates whose `field` equals `value`.
    pub fn reject_create(mut self, field: &str, value: &str) -> Self {
        self.rejections.push((field.to_string(), value.to_string()));
        self
    }

    pub fn issued(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<(String, Value)> {
        self.created.lock().unwrap().clone()
    }
}

fn salesforce_error(code: &str, message: &str) -> Error {
    Error::new(ErrorKind::Salesforce {
        error_code: code.to_string(),
        message: message.to_string(),
    })
}

impl SalesforceApi for FakeApi {
    async fn query(&self, soql: &str) -> Result<Vec<Value>> {
        self.queries.lock().unwrap().push(soql.to_string());
        Ok(self.rows.get(soql).cloned().unwrap_or_default())
    }

    async fn count(&self, soql: &str) -> Result<u64> {
        self.queries.lock().unwrap().push(soql.to_string());
        Ok(self.counts.get(soql).copied().unwrap_or(0))
    }

    async fn search(&self, sosl: &str) -> Result<Vec<Value>> {
        self.queries.lock().unwrap().push(sosl.to_string());
        Ok(self.rows.get(sosl).cloned().unwrap_or_default())
    }

    async fn describe(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        let describe = self
            .describes
            .get(sobject)
            .cloned()
            .ok_or_else(|| salesforce_error("NOT_FOUND", &format!("{sobject} not found")))?;
        serde_json::from_value(describe)
            .map_err(|e| Error::new(ErrorKind::Json(e.to_string())))
    }

    async fn describe_global(&self) -> Result<DescribeGlobalResult> {
        let sobjects: Vec<Value> = self
            .describes
            .values()
            .map(|d| json!({"name": d["name"], "label": d["label"], "queryable": true}))
            .collect();
        serde_json::from_value(json!({ "sobjects": sobjects }))
            .map_err(|e| Error::new(ErrorKind::Json(e.to_string())))
    }

    async fn create(&self, sobject: &str, record: &Value) -> Result<String> {
        for (field, value) in &self.rejections {
            if record.get(field).and_then(Value::as_str) == Some(value.as_str()) {
                return Err(salesforce_error(
                    "FIELD_CUSTOM_VALIDATION_EXCEPTION",
                    &format!("{field} may not be {value}"),
                ));
            }
        }
        let mut created = self.created.lock().unwrap();
        created.push((sobject.to_string(), record.clone()));
        Ok(format!("001{:012}AAA", created.len()))
    }

    async fn update(&self, _sobject: &str, _id: &str, _record: &Value) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _sobject: &str, id: &str) -> Result<()> {
        if id.starts_with("001") {
            Ok(())
        } else {
            Err(salesforce_error("ENTITY_IS_DELETED", "entity is deleted"))
        }
    }

    async fn limits(&self) -> Result<Value> {
        Ok(self.limits.clone())
    }
}

/// An Account describe with a text, a numeric and a boolean field plus the
/// Owner lookup and the Contacts child relationship.
pub fn account_describe() -> Value {
    json!({
        "name": "Account",
        "label": "Account",
        "fields": [
            {"name": "Id", "label": "Account ID", "type": "id"},
            {"name": "Name", "label": "Account Name", "type": "string", "updateable": true},
            {"name": "AnnualRevenue", "label": "Annual Revenue", "type": "currency", "updateable": true, "nillable": true},
            {"name": "IsPartner", "label": "Partner", "type": "boolean"},
            {"name": "OwnerId", "label": "Owner ID", "type": "reference",
             "referenceTo": ["User"], "relationshipName": "Owner"}
        ],
        "childRelationships": [
            {"childSObject": "Contact", "field": "AccountId", "relationshipName": "Contacts"}
        ]
    })
}
