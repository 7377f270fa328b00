//! Dynamic SOQL builder.
//!
//! A [`QuerySpec`] describes what the operator picked: an object, its fields,
//! optionally one parent relationship and one child subquery, filters,
//! grouping, ordering and a row limit. [`QuerySpec::build_for`] renders it to
//! SOQL using an [`ObjectSchema`] to decide how each filter value is written.
//!
//! ```rust
//! use sfdesk_rest::{Filter, Operator, QuerySpec};
//!
//! let soql = QuerySpec::new("Account")
//!     .select(["Name", "Industry"])
//!     .filter(Filter::new("Industry", Operator::Eq, "Tech"))
//!     .limit(50)
//!     .build()
//!     .unwrap();
//! assert_eq!(soql, "SELECT Name, Industry FROM Account WHERE Industry = 'Tech' LIMIT 50");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sfdesk_client::security::soql;

use crate::error::{Error, Result};
use crate::schema::ObjectSchema;

/// Row limit applied when none is chosen.
pub const DEFAULT_LIMIT: u32 = 100;

const AGGREGATE_FUNCTIONS: &[&str] = &["COUNT", "COUNT_DISTINCT", "SUM", "AVG", "MIN", "MAX"];

// ============================================================================
// Operators and value rendering
// ============================================================================

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
    In,
    Between,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
        Operator::Like,
        Operator::In,
        Operator::Between,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .or_else(|| (s == "<>").then_some(Operator::Ne))
            .ok_or_else(|| Error::invalid_query(format!("unknown operator '{}'", s)))
    }
}

/// How a filter value is written into the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Single-quoted and escaped.
    Text,
    /// Written as-is; must look like a number.
    Numeric,
    /// Written as-is; booleans, dates, datetimes and date literals.
    Literal,
}

impl ValueKind {
    /// Map a describe field type to its value rendering.
    pub fn for_field_type(field_type: &str) -> Self {
        match field_type.to_ascii_lowercase().as_str() {
            "int" | "double" | "currency" | "percent" | "long" => ValueKind::Numeric,
            "boolean" | "date" | "datetime" => ValueKind::Literal,
            _ => ValueKind::Text,
        }
    }

    fn render(self, value: &str) -> Result<String> {
        match self {
            ValueKind::Text => Ok(format!("'{}'", soql::escape_string(value))),
            ValueKind::Numeric => {
                let value = value.trim();
                if is_numeric_literal(value) {
                    Ok(value.to_string())
                } else {
                    Err(Error::invalid_query(format!(
                        "'{}' is not a number",
                        value
                    )))
                }
            }
            ValueKind::Literal => {
                let value = value.trim();
                let well_formed = !value.is_empty()
                    && value
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || "-:+._".contains(c));
                if well_formed {
                    Ok(value.to_string())
                } else {
                    Err(Error::invalid_query(format!(
                        "'{}' is not a valid literal",
                        value
                    )))
                }
            }
        }
    }
}

fn is_numeric_literal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Sort direction of an ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(Error::invalid_query(format!(
                "unknown sort direction '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    fn render(&self) -> Result<String> {
        check_path(&self.field)?;
        Ok(format!("ORDER BY {} {}", self.field, self.direction.as_str()))
    }
}

// ============================================================================
// Filters
// ============================================================================

/// One `field operator value` triple of a WHERE clause.
///
/// Without an explicit [`ValueKind`] the kind comes from the object schema
/// when one is available, and defaults to text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    pub values: Vec<String>,
    pub kind: Option<ValueKind>,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            values: vec![value.into()],
            kind: None,
        }
    }

    pub fn in_list<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            operator: Operator::In,
            values: values.into_iter().map(Into::into).collect(),
            kind: None,
        }
    }

    pub fn between(
        field: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Between,
            values: vec![low.into(), high.into()],
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn render(&self, kind: ValueKind) -> Result<String> {
        check_path(&self.field)?;
        let field = &self.field;

        match self.operator {
            Operator::In => {
                if self.values.is_empty() {
                    return Err(Error::invalid_query(format!(
                        "IN filter on {} has no values",
                        field
                    )));
                }
                let rendered = self
                    .values
                    .iter()
                    .map(|v| kind.render(v))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{} IN ({})", field, rendered.join(", ")))
            }
            Operator::Between => match self.values.as_slice() {
                [low, high] => Ok(format!(
                    "{} >= {} AND {} <= {}",
                    field,
                    kind.render(low)?,
                    field,
                    kind.render(high)?
                )),
                _ => Err(Error::invalid_query(format!(
                    "BETWEEN filter on {} needs exactly two values",
                    field
                ))),
            },
            op => match self.values.as_slice() {
                [value] => Ok(format!("{} {} {}", field, op, kind.render(value)?)),
                _ => Err(Error::invalid_query(format!(
                    "{} filter on {} needs exactly one value",
                    op, field
                ))),
            },
        }
    }
}

/// Parses `Field OP value`.
///
/// `IN` takes a comma-separated list, optionally in parentheses, and
/// `BETWEEN` takes `low,high`. Surrounding quotes on values are dropped.
impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::invalid_query(format!("expected 'Field OP value', got '{}'", s));

        let (field, rest) = s.trim().split_once(char::is_whitespace).ok_or_else(malformed)?;
        let rest = rest.trim_start();
        let (op, value) = rest.split_once(char::is_whitespace).ok_or_else(malformed)?;
        let operator: Operator = op.parse()?;
        let value = value.trim();

        let filter = match operator {
            Operator::In => {
                let list = value
                    .strip_prefix('(')
                    .and_then(|v| v.strip_suffix(')'))
                    .unwrap_or(value);
                Filter::in_list(field, list.split(',').map(|v| strip_quotes(v.trim())))
            }
            Operator::Between => {
                let (low, high) = value.split_once(',').ok_or_else(malformed)?;
                Filter::between(field, strip_quotes(low.trim()), strip_quotes(high.trim()))
            }
            op => Filter::new(field, op, strip_quotes(value)),
        };
        Ok(filter)
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ============================================================================
// Relationships
// ============================================================================

/// Fields read through one parent lookup, rendered as `Rel.Field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentSelection {
    pub relationship: String,
    pub fields: Vec<String>,
}

impl ParentSelection {
    pub fn new<I, S>(relationship: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            relationship: relationship.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// A nested subquery over a child relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildQuery {
    pub relationship: String,
    pub fields: Vec<String>,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u32>,
}

impl ChildQuery {
    pub fn new<I, S>(relationship: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            relationship: relationship.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn render(&self, kind_of: &dyn Fn(&str) -> ValueKind) -> Result<String> {
        check_identifier(&self.relationship)?;
        if self.fields.is_empty() {
            return Err(Error::invalid_query(format!(
                "no fields selected for {}",
                self.relationship
            )));
        }
        for field in &self.fields {
            check_select_item(field)?;
        }

        let mut parts = vec![format!(
            "SELECT {} FROM {}",
            self.fields.join(", "),
            self.relationship
        )];
        if !self.filters.is_empty() {
            let conditions = self
                .filters
                .iter()
                .map(|f| f.render(f.kind.unwrap_or_else(|| kind_of(&f.field))))
                .collect::<Result<Vec<_>>>()?;
            parts.push(format!("WHERE {}", conditions.join(" AND ")));
        }
        if let Some(order) = &self.order_by {
            parts.push(order.render()?);
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }
        Ok(format!("({})", parts.join(" ")))
    }
}

// ============================================================================
// QuerySpec
// ============================================================================

/// Everything needed to render one SOQL query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub sobject: String,
    pub fields: Vec<String>,
    pub parent: Option<ParentSelection>,
    pub child: Option<ChildQuery>,
    pub filters: Vec<Filter>,
    pub group_by: Vec<String>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u32>,
}

impl QuerySpec {
    pub fn new(sobject: impl Into<String>) -> Self {
        Self {
            sobject: sobject.into(),
            fields: Vec::new(),
            parent: None,
            child: None,
            filters: Vec::new(),
            group_by: Vec::new(),
            order_by: None,
            limit: Some(DEFAULT_LIMIT),
        }
    }

    /// Append fields to the SELECT list, keeping their order.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_parent(mut self, parent: ParentSelection) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_child(mut self, child: ChildQuery) -> Self {
        self.child = Some(child);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by.push(field.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Drop the LIMIT clause entirely.
    pub fn no_limit(mut self) -> Self {
        self.limit = None;
        self
    }

    /// Render without a schema: filter values are quoted unless the filter
    /// carries its own [`ValueKind`].
    pub fn build(&self) -> Result<String> {
        self.render(&|_| ValueKind::Text, &|_| ValueKind::Text)
    }

    /// Check names, fields and filter shapes without rendering against a
    /// schema. Everything this rejects, [`build_for`](Self::build_for)
    /// rejects too.
    pub fn validate(&self) -> Result<()> {
        self.build().map(drop)
    }

    /// Render using field types from `schema` for value quoting. Child
    /// subquery filters are quoted as text; use
    /// [`build_with_child`](Self::build_with_child) to type them.
    pub fn build_for(&self, schema: &ObjectSchema) -> Result<String> {
        self.render(&|field| schema.value_kind(field), &|_| ValueKind::Text)
    }

    /// Like [`build_for`](Self::build_for), with `child_schema` describing
    /// the object behind the child relationship.
    pub fn build_with_child(
        &self,
        schema: &ObjectSchema,
        child_schema: &ObjectSchema,
    ) -> Result<String> {
        self.render(
            &|field| schema.value_kind(field),
            &|field| child_schema.value_kind(field),
        )
    }

    fn render(
        &self,
        kind_of: &dyn Fn(&str) -> ValueKind,
        child_kind_of: &dyn Fn(&str) -> ValueKind,
    ) -> Result<String> {
        check_identifier(&self.sobject)?;
        if self.fields.is_empty() {
            return Err(Error::invalid_query(format!(
                "no fields selected for {}",
                self.sobject
            )));
        }

        let mut select = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            check_select_item(field)?;
            select.push(field.clone());
        }

        if let Some(parent) = &self.parent {
            check_identifier(&parent.relationship)?;
            if parent.fields.is_empty() {
                return Err(Error::invalid_query(format!(
                    "no fields selected for {}",
                    parent.relationship
                )));
            }
            for field in &parent.fields {
                check_path(field)?;
                select.push(format!("{}.{}", parent.relationship, field));
            }
        }

        if let Some(child) = &self.child {
            select.push(child.render(child_kind_of)?);
        }

        let mut soql = format!("SELECT {} FROM {}", select.join(", "), self.sobject);

        if !self.filters.is_empty() {
            let conditions = self
                .filters
                .iter()
                .map(|f| f.render(f.kind.unwrap_or_else(|| kind_of(&f.field))))
                .collect::<Result<Vec<_>>>()?;
            soql.push_str(" WHERE ");
            soql.push_str(&conditions.join(" AND "));
        }

        if !self.group_by.is_empty() {
            for field in &self.group_by {
                check_path(field)?;
            }
            soql.push_str(" GROUP BY ");
            soql.push_str(&self.group_by.join(", "));
        }

        if let Some(order) = &self.order_by {
            soql.push(' ');
            soql.push_str(&order.render()?);
        }

        if let Some(limit) = self.limit {
            soql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok(soql)
    }
}

// ============================================================================
// Identifier checks
// ============================================================================

fn check_identifier(name: &str) -> Result<()> {
    if soql::is_safe_sobject_name(name) {
        Ok(())
    } else {
        Err(Error::invalid_query(format!("invalid name '{}'", name)))
    }
}

fn check_path(path: &str) -> Result<()> {
    if soql::is_safe_field_path(path) {
        Ok(())
    } else {
        Err(Error::invalid_query(format!("invalid field '{}'", path)))
    }
}

/// A field path, or an aggregate call such as `COUNT(Id)`, `SUM(Amount)`
/// or `COUNT()`.
fn check_select_item(item: &str) -> Result<()> {
    if soql::is_safe_field_path(item) {
        return Ok(());
    }
    let aggregate = item
        .split_once('(')
        .and_then(|(func, rest)| rest.strip_suffix(')').map(|arg| (func, arg)))
        .is_some_and(|(func, arg)| {
            let known = AGGREGATE_FUNCTIONS
                .iter()
                .any(|f| f.eq_ignore_ascii_case(func));
            let count_all = arg.is_empty() && func.eq_ignore_ascii_case("COUNT");
            known && (count_all || soql::is_safe_field_path(arg))
        });
    if aggregate {
        Ok(())
    } else {
        Err(Error::invalid_query(format!("invalid field '{}'", item)))
    }
}
