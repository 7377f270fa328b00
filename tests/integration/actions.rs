//! Record actions, uploads and CSV import over the in-memory org.

use std::io::Write;

use serde_json::json;
use sfdesk::actions::{self, NewContact, NewLead, NewOpportunity};
use sfdesk::report::Table;

use super::common::{account_describe, FakeApi};

const ACME_LOOKUP: &str = "SELECT Id FROM Account WHERE Name = 'Acme' LIMIT 1";
const ACME_ID: &str = "001000000000042AAA";

#[tokio::test]
async fn test_create_contact_links_account_by_name() {
    let api = FakeApi::new().with_rows(ACME_LOOKUP, json!([{"Id": ACME_ID}]));
    let contact = NewContact {
        first_name: Some("Ada".into()),
        last_name: "Lovelace".into(),
        email: Some("  ".into()),
        account_name: Some("Acme".into()),
        ..Default::default()
    };

    let outcome = actions::create_contact(&api, &contact).await;
    assert!(outcome.success, "{outcome}");
    assert_eq!(outcome.message, actions::CREATED);

    let created = api.created();
    assert_eq!(created.len(), 1);
    let (sobject, record) = &created[0];
    assert_eq!(sobject, "Contact");
    assert_eq!(
        record,
        &json!({"FirstName": "Ada", "LastName": "Lovelace", "AccountId": ACME_ID})
    );
}

#[tokio::test]
async fn test_unknown_account_fails_without_create() {
    let api = FakeApi::new();
    let opp = NewOpportunity {
        name: "Big Deal".into(),
        account_name: Some("Nobody Inc".into()),
        close_date: "2024-12-31".into(),
        stage_name: "Prospecting".into(),
        amount: Some(5000.0),
    };

    let outcome = actions::create_opportunity(&api, &opp).await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Account 'Nobody Inc' not found.");
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn test_required_fields_checked_before_any_call() {
    let api = FakeApi::new();
    let lead = NewLead {
        last_name: "Hopper".into(),
        company: " ".into(),
        ..Default::default()
    };

    let outcome = actions::create_lead(&api, &lead).await;
    assert!(!outcome.success);
    assert_eq!(outcome.to_string(), "Error: Company is required.");
    assert!(api.issued().is_empty());
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn test_salesforce_rejection_becomes_outcome() {
    let api = FakeApi::new().reject_create("Name", "Blocked");
    let outcome = actions::create_record(&api, "Account", &json!({"Name": "Blocked"})).await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("FIELD_CUSTOM_VALIDATION_EXCEPTION"));
    assert!(outcome.id.is_none());
}

#[tokio::test]
async fn test_update_and_delete_outcomes() {
    let api = FakeApi::new();

    let updated =
        actions::update_record(&api, "Account", ACME_ID, &json!({"Name": "Acme 2"})).await;
    assert_eq!(updated.to_string(), format!("{} (Id: {ACME_ID})", actions::UPDATED));

    let deleted = actions::delete_record(&api, "Account", "003000000000001AAA").await;
    assert!(!deleted.success);
}

#[tokio::test]
async fn test_upload_file_sends_base64_content() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"hello").unwrap();

    let api = FakeApi::new();
    let outcome = actions::upload_file(&api, &path).await.unwrap();
    assert!(outcome.success);

    let (sobject, record) = &api.created()[0];
    assert_eq!(sobject, "ContentVersion");
    assert_eq!(record["Title"], "notes.txt");
    assert_eq!(record["PathOnClient"], "notes.txt");
    assert_eq!(record["VersionData"], "aGVsbG8=");
}

#[tokio::test]
async fn test_import_csv_reports_every_row() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("accounts.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "Name,Industry").unwrap();
    writeln!(file, "Acme,Technology").unwrap();
    writeln!(file, "Blocked,Retail").unwrap();
    writeln!(file, "Initech,").unwrap();
    drop(file);

    let api = FakeApi::new().reject_create("Name", "Blocked");
    let outcomes = actions::import_csv(&api, "Account", &path).await.unwrap();

    let success: Vec<bool> = outcomes.iter().map(|o| o.success).collect();
    assert_eq!(success, vec![true, false, true]);

    let created = api.created();
    assert_eq!(created.len(), 2);
    // empty cells are left out
    assert_eq!(created[1].1, json!({"Name": "Initech"}));
}

#[tokio::test]
async fn test_import_table_empty() {
    let api = FakeApi::new();
    let table = Table::new(vec!["Name".into()], Vec::new());
    assert!(actions::import_table(&api, "Account", &table).await.is_empty());
}

#[tokio::test]
async fn test_describe_object_fields_table() {
    let api = FakeApi::new().with_describe(account_describe());
    let fields = actions::describe_object(&api, "Account").await.unwrap();
    assert_eq!(fields.len(), 5);

    let table = actions::fields_table(&fields);
    assert_eq!(table.columns, vec!["Label", "Name", "Type", "Updateable", "Nillable"]);
    assert_eq!(
        table.rows[2],
        vec!["Annual Revenue", "AnnualRevenue", "currency", "Yes", "Yes"]
    );
}

#[tokio::test]
async fn test_lookup_id_escapes_name() {
    let api = FakeApi::new();
    let id = actions::lookup_id(&api, "Account", "O'Brien & Sons").await.unwrap();
    assert!(id.is_none());
    assert_eq!(
        api.issued(),
        vec!["SELECT Id FROM Account WHERE Name = 'O\\'Brien & Sons' LIMIT 1".to_string()]
    );

    assert!(actions::lookup_id(&api, "Account; DROP", "x").await.is_err());
}
