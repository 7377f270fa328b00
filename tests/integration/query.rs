//! Query and search building against a described object, and exporting the
//! result.

use serde_json::json;
use sfdesk::export::{write_report, ReportFormat};
use sfdesk::report::{Chart, ChartKind, Table};
use sfdesk::rest::{
    ChildQuery, Filter, Operator, ParentSelection, QuerySpec, SalesforceApi, SearchSpec,
    SortDirection,
};

use super::common::{account_describe, FakeApi};

#[tokio::test]
async fn test_filter_values_follow_field_types() {
    let api = FakeApi::new().with_describe(account_describe());
    let schema = api.schema("Account").await.unwrap();

    let soql = QuerySpec::new("Account")
        .select(["Name", "AnnualRevenue"])
        .with_parent(ParentSelection::new("Owner", ["Name"]))
        .filter("AnnualRevenue > 1000000".parse::<Filter>().unwrap())
        .filter(Filter::new("IsPartner", Operator::Eq, "true"))
        .filter(Filter::new("Name", Operator::Like, "Ac%"))
        .order_by("Name", SortDirection::Asc)
        .build_for(&schema)
        .unwrap();

    assert_eq!(
        soql,
        "SELECT Name, AnnualRevenue, Owner.Name FROM Account \
         WHERE AnnualRevenue > 1000000 AND IsPartner = true AND Name LIKE 'Ac%' \
         ORDER BY Name ASC LIMIT 100"
    );
}

#[tokio::test]
async fn test_numeric_field_rejects_text() {
    let api = FakeApi::new().with_describe(account_describe());
    let schema = api.schema("Account").await.unwrap();

    let result = QuerySpec::new("Account")
        .select(["Name"])
        .filter(Filter::new("AnnualRevenue", Operator::Gt, "lots"))
        .build_for(&schema);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_summary_rows_for_child_query() {
    let soql = QuerySpec::new("Account")
        .select(["Name"])
        .with_child(ChildQuery::new("Contacts", ["LastName"]))
        .build()
        .unwrap();
    assert_eq!(
        soql,
        "SELECT Name, (SELECT LastName FROM Contacts) FROM Account LIMIT 100"
    );

    let api = FakeApi::new().with_rows(
        &soql,
        json!([
            {"attributes": {"type": "Account"}, "Name": "Acme",
             "Contacts": {"totalSize": 2, "done": true, "records": [
                 {"attributes": {"type": "Contact"}, "LastName": "Lovelace"},
                 {"attributes": {"type": "Contact"}, "LastName": "Hopper"}
             ]}},
            {"attributes": {"type": "Account"}, "Name": "Globex", "Contacts": null}
        ]),
    );
    let records = api.query(&soql).await.unwrap();
    let table = Table::from_parent_child(&records, "Contacts");

    assert_eq!(table.columns, vec!["Name", "Contacts.LastName"]);
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows[1], vec!["Acme", "Hopper"]);
    assert_eq!(table.rows[2], vec!["Globex", ""]);
}

#[test]
fn test_search_builds_returning_clause() {
    let sosl = SearchSpec::new("Acme")
        .returning("Account", ["Name", "Industry"])
        .returning("Contact", Vec::<String>::new())
        .limit(20)
        .build()
        .unwrap();

    assert!(sosl.starts_with("FIND {Acme} IN ALL FIELDS RETURNING "));
    assert!(sosl.contains("Account(Name, Industry)"));
    assert!(sosl.ends_with("LIMIT 20"));
}

#[test]
fn test_query_result_exports() {
    let table = Table::from_records(&[
        json!({"StageName": "Prospecting", "Amount": 100.0}),
        json!({"StageName": "Closed Won", "Amount": 250.0}),
        json!({"StageName": "Prospecting", "Amount": 50.0}),
    ]);
    let chart = Chart::from_columns(ChartKind::Bar, &table, "StageName", "Amount").unwrap();
    let dir = tempfile::TempDir::new().unwrap();

    for (name, format) in [
        ("pipeline.csv", ReportFormat::Csv),
        ("pipeline.xlsx", ReportFormat::Xlsx),
        ("pipeline.pdf", ReportFormat::Pdf),
        ("pipeline.pptx", ReportFormat::Pptx),
    ] {
        let path = dir.path().join(name);
        let written =
            write_report(&path, "Pipeline", &table, std::slice::from_ref(&chart)).unwrap();
        assert_eq!(written, format);
        assert!(std::fs::metadata(&path).unwrap().len() > 0, "{name} is empty");
    }

    let err = write_report(&dir.path().join("pipeline.docx"), "Pipeline", &table, &[]);
    assert!(err.is_err());
}
