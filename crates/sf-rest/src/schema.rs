//! Object schema derived from a describe call.
//!
//! The query builder reads field types from here to decide how filter values
//! are rendered, and the CLI uses it to list what an object can be joined to.

use serde::{Deserialize, Serialize};

use crate::describe::DescribeSObjectResult;
use crate::query_builder::{Operator, ValueKind};

/// A queryable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub label: String,
    pub field_type: String,
    /// Active picklist values, empty for non-picklist fields.
    pub picklist_values: Vec<String>,
}

impl SchemaField {
    /// How values compared against this field are rendered in SOQL.
    pub fn value_kind(&self) -> ValueKind {
        ValueKind::for_field_type(&self.field_type)
    }

    /// Operators that make sense for this field's type.
    pub fn operators(&self) -> &'static [Operator] {
        operators_for(&self.field_type)
    }
}

/// A lookup from this object to a parent object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRelationship {
    /// Relationship name used in dotted paths (`Owner`).
    pub relationship_name: String,
    /// The lookup field on this object (`OwnerId`).
    pub field: String,
    /// First `referenceTo` target (`User`).
    pub target: String,
}

/// A child relationship usable as a nested subquery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRelation {
    /// Relationship name used in the subquery FROM clause (`Contacts`).
    pub relationship_name: String,
    pub child_sobject: String,
}

/// Fields and relationships of one SObject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSchema {
    pub name: String,
    pub label: String,
    pub fields: Vec<SchemaField>,
    pub parents: Vec<ParentRelationship>,
    pub children: Vec<ChildRelation>,
}

impl ObjectSchema {
    pub fn from_describe(describe: DescribeSObjectResult) -> Self {
        let mut parents = Vec::new();
        let fields = describe
            .fields
            .into_iter()
            .map(|field| {
                if let (Some(relationship_name), Some(target)) = (
                    field.relationship_name.as_ref(),
                    field.reference_to.as_ref().and_then(|refs| refs.first()),
                ) {
                    parents.push(ParentRelationship {
                        relationship_name: relationship_name.clone(),
                        field: field.name.clone(),
                        target: target.clone(),
                    });
                }

                let picklist_values = field
                    .picklist_values
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|p| p.active)
                    .map(|p| p.value)
                    .collect();

                SchemaField {
                    name: field.name,
                    label: field.label,
                    field_type: field.field_type,
                    picklist_values,
                }
            })
            .collect();

        let children = describe
            .child_relationships
            .into_iter()
            .filter_map(|child| {
                child.relationship_name.map(|relationship_name| ChildRelation {
                    relationship_name,
                    child_sobject: child.child_sobject,
                })
            })
            .collect();

        Self {
            name: describe.name,
            label: describe.label,
            fields,
            parents,
            children,
        }
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn parent(&self, relationship_name: &str) -> Option<&ParentRelationship> {
        self.parents
            .iter()
            .find(|p| p.relationship_name.eq_ignore_ascii_case(relationship_name))
    }

    pub fn child(&self, relationship_name: &str) -> Option<&ChildRelation> {
        self.children
            .iter()
            .find(|c| c.relationship_name.eq_ignore_ascii_case(relationship_name))
    }

    /// Value rendering for a field on this object. Unknown fields and dotted
    /// paths are treated as text.
    pub fn value_kind(&self, field: &str) -> ValueKind {
        self.field(field)
            .map(SchemaField::value_kind)
            .unwrap_or(ValueKind::Text)
    }
}

/// Operators offered for a Salesforce field type.
///
/// Picklists only compare for equality or membership.
pub fn operators_for(field_type: &str) -> &'static [Operator] {
    use Operator as Op;
    match field_type.to_ascii_lowercase().as_str() {
        "picklist" | "multipicklist" => &[Op::Eq, Op::In],
        "boolean" => &[Op::Eq, Op::Ne],
        "int" | "double" | "currency" | "percent" | "long" | "date" | "datetime" => &[
            Op::Eq,
            Op::Ne,
            Op::Gt,
            Op::Lt,
            Op::Ge,
            Op::Le,
            Op::In,
            Op::Between,
        ],
        _ => &[Op::Eq, Op::Ne, Op::Gt, Op::Lt, Op::Like, Op::In],
    }
}
