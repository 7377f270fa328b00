//! Query builder, search and object browsing.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use sfdesk_report::{Chart, ChartKind, Table};
use sfdesk_rest::{
    ChildQuery, Filter, ParentSelection, QuerySpec, SalesforceApi, SearchSpec, SortDirection,
    DEFAULT_LIMIT,
};
use tracing::debug;

use super::show;
use crate::actions;
use crate::error::{Error, Result};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Object to query, e.g. Account
    #[arg(short, long, required_unless_present = "soql")]
    pub object: Option<String>,

    /// Comma-separated fields
    #[arg(short, long, value_delimiter = ',', required_unless_present = "soql")]
    pub fields: Vec<String>,

    /// Parent fields as Relationship:Field1,Field2
    #[arg(long)]
    pub parent: Option<String>,

    /// Child subquery as Relationship:Field1,Field2
    #[arg(long)]
    pub child: Option<String>,

    /// Child subquery filter "Field OP value"; repeatable
    #[arg(long = "child-where", requires = "child")]
    pub child_filters: Vec<Filter>,

    /// Child subquery order, "Field [ASC|DESC]"
    #[arg(long, requires = "child")]
    pub child_order_by: Option<String>,

    /// Child subquery row limit (default 100)
    #[arg(long, requires = "child")]
    pub child_limit: Option<u32>,

    /// Filter "Field OP value"; repeat to AND several
    #[arg(short = 'w', long = "where")]
    pub filters: Vec<Filter>,

    #[arg(long)]
    pub group_by: Option<String>,

    /// "Field [ASC|DESC]"
    #[arg(long)]
    pub order_by: Option<String>,

    /// Row limit (default 100)
    #[arg(short, long, conflicts_with = "no_limit")]
    pub limit: Option<u32>,

    /// Return every row
    #[arg(long)]
    pub no_limit: bool,

    /// Run this SOQL as-is instead of building one
    #[arg(long, conflicts_with_all = ["object", "fields", "parent", "child", "filters"])]
    pub soql: Option<String>,

    /// Print the SOQL before running it
    #[arg(long)]
    pub show_soql: bool,

    /// One row per parent and child pair (needs --child)
    #[arg(long, requires = "child")]
    pub summary: bool,

    #[arg(long)]
    pub chart: Option<ChartArg>,

    /// Category column of the chart
    #[arg(long, requires = "chart")]
    pub x: Option<String>,

    /// Value column of the chart
    #[arg(long, requires = "chart")]
    pub y: Option<String>,

    /// Write the result to a file (.csv, .xlsx, .pdf, .pptx)
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ChartArg {
    Bar,
    Pie,
    Line,
    Histogram,
    CountBar,
}

impl From<ChartArg> for ChartKind {
    fn from(arg: ChartArg) -> Self {
        match arg {
            ChartArg::Bar => ChartKind::Bar,
            ChartArg::Pie => ChartKind::Pie,
            ChartArg::Line => ChartKind::Line,
            ChartArg::Histogram => ChartKind::Histogram,
            ChartArg::CountBar => ChartKind::CountBar,
        }
    }
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to find
    pub term: String,

    /// Objects to return as Object:Field1,Field2; repeatable
    #[arg(short, long)]
    pub returning: Vec<String>,

    #[arg(short, long)]
    pub limit: Option<u32>,

    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// `Rel:F1,F2` into the relationship name and its fields.
fn relationship_fields(arg: &str) -> Result<(String, Vec<String>)> {
    let (name, fields) = arg.split_once(':').ok_or_else(|| {
        Error::validation(format!("expected Relationship:Field1,Field2, got '{arg}'"))
    })?;
    let fields: Vec<String> = fields
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect();
    if name.trim().is_empty() || fields.is_empty() {
        return Err(Error::validation(format!(
            "expected Relationship:Field1,Field2, got '{arg}'"
        )));
    }
    Ok((name.trim().to_string(), fields))
}

fn order_by(arg: &str) -> Result<(String, SortDirection)> {
    let mut parts = arg.split_whitespace();
    let field = parts
        .next()
        .ok_or_else(|| Error::validation("--order-by needs a field"))?;
    let direction = match parts.next() {
        Some(direction) => direction.parse()?,
        None => SortDirection::Asc,
    };
    Ok((field.to_string(), direction))
}

/// Assemble the query from the arguments. Returns the SOQL and, for summary
/// mode, the child relationship to expand.
pub(crate) async fn build_soql<A: SalesforceApi>(
    api: &A,
    args: &QueryArgs,
) -> Result<(String, Option<String>)> {
    if let Some(soql) = &args.soql {
        return Ok((soql.clone(), None));
    }
    let sobject = args
        .object
        .as_deref()
        .ok_or_else(|| Error::validation("--object is required"))?;

    let mut spec = QuerySpec::new(sobject).select(args.fields.iter().map(|f| f.trim()));
    if let Some(parent) = &args.parent {
        let (relationship, fields) = relationship_fields(parent)?;
        spec = spec.with_parent(ParentSelection::new(relationship, fields));
    }
    let mut child_relationship = None;
    if let Some(child) = &args.child {
        let (relationship, fields) = relationship_fields(child)?;
        child_relationship = Some(relationship.clone());
        let mut child = ChildQuery::new(relationship, fields)
            .limit(args.child_limit.unwrap_or(DEFAULT_LIMIT));
        for filter in &args.child_filters {
            child = child.filter(filter.clone());
        }
        if let Some(arg) = &args.child_order_by {
            let (field, direction) = order_by(arg)?;
            child = child.order_by(field, direction);
        }
        spec = spec.with_child(child);
    }
    for filter in &args.filters {
        spec = spec.filter(filter.clone());
    }
    if let Some(field) = &args.group_by {
        spec = spec.group_by(field.trim());
    }
    if let Some(arg) = &args.order_by {
        let (field, direction) = order_by(arg)?;
        spec = spec.order_by(field, direction);
    }
    if args.no_limit {
        spec = spec.no_limit();
    } else if let Some(limit) = args.limit {
        spec = spec.limit(limit);
    }

    // everything checkable offline fails here, before any describe call
    spec.validate()?;

    let schema = api.schema(sobject).await?;
    let soql = match (&child_relationship, args.child_filters.is_empty()) {
        (Some(relationship), false) => {
            let child = schema.child(relationship).ok_or_else(|| {
                Error::validation(format!(
                    "{sobject} has no child relationship '{relationship}'"
                ))
            })?;
            let child_schema = api.schema(&child.child_sobject).await?;
            spec.build_with_child(&schema, &child_schema)?
        }
        _ => spec.build_for(&schema)?,
    };
    let summary = if args.summary { child_relationship } else { None };
    Ok((soql, summary))
}

pub async fn run_query<A: SalesforceApi>(api: &A, args: QueryArgs) -> Result<()> {
    let (soql, summary) = build_soql(api, &args).await?;
    debug!(%soql, "Running query");
    if args.show_soql {
        writeln!(io::stdout(), "{soql}")?;
    }

    let records = api.query(&soql).await?;
    let table = match &summary {
        Some(relationship) => Table::from_parent_child(&records, relationship),
        None => Table::from_records(&records),
    };

    let mut charts = Vec::new();
    if let Some(kind) = args.chart {
        let x = args
            .x
            .as_deref()
            .ok_or_else(|| Error::validation("--chart needs --x"))?;
        let y = args.y.as_deref().unwrap_or(x);
        charts.push(Chart::from_columns(kind.into(), &table, x, y)?);
    }

    let title = args.object.as_deref().unwrap_or("Query");
    show(&table, &format!("{title} Report"), args.export.as_deref(), &charts)
}

pub async fn run_search<A: SalesforceApi>(api: &A, args: SearchArgs) -> Result<()> {
    let mut spec = SearchSpec::new(&args.term);
    for returning in &args.returning {
        spec = match returning.split_once(':') {
            Some(_) => {
                let (sobject, fields) = relationship_fields(returning)?;
                spec.returning(sobject, fields)
            }
            None => spec.returning(returning.trim(), Vec::<String>::new()),
        };
    }
    if let Some(limit) = args.limit {
        spec = spec.limit(limit);
    }

    let sosl = spec.build()?;
    debug!(%sosl, "Running search");
    let records = api.search(&sosl).await?;
    let table = Table::from_records(&records);
    show(&table, "Search Results", args.export.as_deref(), &[])
}

pub async fn run_objects<A: SalesforceApi>(api: &A) -> Result<()> {
    let global = api.describe_global().await?;
    let mut out = io::stdout();
    for sobject in global.sobjects.iter().filter(|s| s.queryable) {
        writeln!(out, "{:<40}  {}", sobject.name, sobject.label)?;
    }
    Ok(())
}

pub async fn run_describe<A: SalesforceApi>(
    api: &A,
    sobject: &str,
    export: Option<&Path>,
) -> Result<()> {
    let fields = actions::describe_object(api, sobject).await?;
    let table = actions::fields_table(&fields);
    show(&table, &format!("{sobject} Fields"), export, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use clap::Parser;
    use serde_json::json;
    use sfdesk_rest::SalesforceRestClient;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Parser)]
    struct QueryCli {
        #[command(flatten)]
        args: QueryArgs,
    }

    fn parse(args: &[&str]) -> QueryArgs {
        QueryCli::try_parse_from(std::iter::once("query").chain(args.iter().copied()))
            .unwrap()
            .args
    }

    async fn mount_describe(server: &MockServer, describe: serde_json::Value) {
        let name = describe["name"].as_str().unwrap().to_string();
        Mock::given(method("GET"))
            .and(path(format!("/services/data/v62.0/sobjects/{name}/describe")))
            .respond_with(ResponseTemplate::new(200).set_body_json(describe))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_malformed_field_fails_before_describe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        let client = SalesforceRestClient::new(server.uri(), "token").unwrap();

        let args = parse(&["-o", "Account", "-f", "Id FROM User --"]);
        let err = build_soql(&client, &args).await.unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::Api(sfdesk_rest::ErrorKind::InvalidQuery(_))
        ));
    }

    #[tokio::test]
    async fn test_child_filters_typed_by_child_describe() {
        let server = MockServer::start().await;
        mount_describe(
            &server,
            json!({
                "name": "Account",
                "label": "Account",
                "fields": [{"name": "Name", "label": "Account Name", "type": "string"}],
                "childRelationships": [
                    {"childSObject": "Opportunity", "field": "AccountId",
                     "relationshipName": "Opportunities"}
                ]
            }),
        )
        .await;
        mount_describe(
            &server,
            json!({
                "name": "Opportunity",
                "label": "Opportunity",
                "fields": [
                    {"name": "Name", "label": "Name", "type": "string"},
                    {"name": "Amount", "label": "Amount", "type": "currency"},
                    {"name": "CloseDate", "label": "Close Date", "type": "date"}
                ]
            }),
        )
        .await;
        let client = SalesforceRestClient::new(server.uri(), "token").unwrap();

        let args = parse(&[
            "-o",
            "Account",
            "-f",
            "Name",
            "--child",
            "Opportunities:Name,Amount",
            "--child-where",
            "Amount > 1000",
            "--child-order-by",
            "CloseDate DESC",
        ]);
        let (soql, summary) = build_soql(&client, &args).await.unwrap();
        assert_eq!(
            soql,
            "SELECT Name, (SELECT Name, Amount FROM Opportunities WHERE Amount > 1000 \
             ORDER BY CloseDate DESC LIMIT 100) FROM Account LIMIT 100"
        );
        assert!(summary.is_none());
    }

    #[test]
    fn test_child_options_need_child() {
        let parsed = QueryCli::try_parse_from([
            "query",
            "-o",
            "Account",
            "-f",
            "Name",
            "--child-limit",
            "5",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_relationship_fields() {
        let (name, fields) = relationship_fields("Owner: Name, Email").unwrap();
        assert_eq!(name, "Owner");
        assert_eq!(fields, vec!["Name", "Email"]);

        assert!(relationship_fields("Owner").is_err());
        assert!(relationship_fields("Owner:").is_err());
    }

    #[test]
    fn test_order_by() {
        assert_eq!(order_by("Name").unwrap(), ("Name".to_string(), SortDirection::Asc));
        assert_eq!(
            order_by("CreatedDate desc").unwrap(),
            ("CreatedDate".to_string(), SortDirection::Desc)
        );
        assert!(order_by("Name sideways").is_err());
    }
}
