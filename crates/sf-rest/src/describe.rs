//! Describe types.
//!
//! Only the parts of the describe payloads that sfdesk reads are modelled;
//! everything else in the response is ignored.

use serde::{Deserialize, Serialize};

// ============================================================================
// Describe Global Types
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeGlobalResult {
    #[serde(default)]
    pub encoding: Option<String>,

    #[serde(rename = "maxBatchSize", default)]
    pub max_batch_size: Option<u32>,

    pub sobjects: Vec<SObjectBasicInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SObjectBasicInfo {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub deletable: bool,
    #[serde(default)]
    pub searchable: bool,
}

// ============================================================================
// Describe SObject Types
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeSObjectResult {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub deletable: bool,

    #[serde(rename = "childRelationships", default)]
    pub child_relationships: Vec<ChildRelationship>,
    #[serde(default)]
    pub fields: Vec<FieldDescribe>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChildRelationship {
    #[serde(rename = "childSObject")]
    pub child_sobject: String,
    pub field: String,
    #[serde(rename = "relationshipName")]
    pub relationship_name: Option<String>,
}

// ============================================================================
// Field Describe Types
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDescribe {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub nillable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub groupable: bool,

    #[serde(rename = "referenceTo", default)]
    pub reference_to: Option<Vec<String>>,
    #[serde(rename = "relationshipName")]
    pub relationship_name: Option<String>,

    #[serde(rename = "picklistValues", default)]
    pub picklist_values: Option<Vec<PicklistValue>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PicklistValue {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "defaultValue", default)]
    pub default_value: bool,
}
