//! Admin viewers and the record hierarchy over the in-memory org.

use serde_json::json;
use sfdesk::{admin, hierarchy, ErrorKind};

use super::common::FakeApi;

const ADA: &str = "005000000000001AAA";
const GRACE: &str = "005000000000002AAA";
const GONE: &str = "005000000000009AAA";

#[tokio::test]
async fn test_login_history_resolves_names_in_one_query() {
    let api = FakeApi::new()
        .with_rows(
            admin::LOGIN_HISTORY_SOQL,
            json!([
                {"UserId": ADA, "LoginTime": "2024-05-01T09:00:00.000+0000", "SourceIp": "10.0.0.1",
                 "LoginType": "Application", "Status": "Success"},
                {"UserId": GRACE, "LoginTime": "2024-05-01T08:00:00.000+0000", "SourceIp": "10.0.0.2",
                 "LoginType": "Application", "Status": "Invalid Password"},
                {"UserId": ADA, "LoginTime": "2024-04-30T17:00:00.000+0000", "SourceIp": "10.0.0.1",
                 "LoginType": "Remote Access 2.0", "Status": "Success"},
                {"UserId": GONE, "LoginTime": "2024-04-29T17:00:00.000+0000", "SourceIp": "10.0.0.3",
                 "LoginType": "Application", "Status": "Success"}
            ]),
        )
        .with_rows(
            &format!("SELECT Id, Name FROM User WHERE Id IN ('{ADA}', '{GRACE}', '{GONE}')"),
            json!([
                {"Id": ADA, "Name": "Ada Lovelace"},
                {"Id": GRACE, "Name": "Grace Hopper"}
            ]),
        );

    let table = admin::login_history(&api).await.unwrap();
    assert_eq!(
        table.columns,
        vec!["User", "Login Time", "Source IP", "Login Type", "Status"]
    );
    let users: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(
        users,
        vec!["Ada Lovelace", "Grace Hopper", "Ada Lovelace", admin::UNKNOWN_USER]
    );
    assert_eq!(table.rows[1][4], "Invalid Password");

    // the history query plus a single name lookup
    assert_eq!(api.issued().len(), 2);
}

#[tokio::test]
async fn test_login_history_without_rows_skips_lookup() {
    let api = FakeApi::new();
    let table = admin::login_history(&api).await.unwrap();

    assert!(table.is_empty());
    assert_eq!(api.issued(), vec![admin::LOGIN_HISTORY_SOQL.to_string()]);
}

#[tokio::test]
async fn test_setup_audit_trail_without_creator() {
    let api = FakeApi::new().with_rows(
        admin::SETUP_AUDIT_SOQL,
        json!([
            {"Action": "createdUser", "CreatedDate": "2024-05-01T10:00:00.000+0000",
             "CreatedBy": {"Name": "Ada Lovelace"}},
            {"Action": "changedPassword", "CreatedDate": "2024-05-01T11:00:00.000+0000",
             "CreatedBy": null}
        ]),
    );

    let table = admin::setup_audit_trail(&api).await.unwrap();
    assert_eq!(table.rows[0][2], "Ada Lovelace");
    assert_eq!(table.rows[1], vec!["changedPassword", "2024-05-01T11:00:00.000+0000", "None"]);
}

#[tokio::test]
async fn test_home_metrics() {
    let api = FakeApi::new()
        .with_count(admin::ACTIVE_USERS_SOQL, 42)
        .with_count(admin::QUEUED_JOBS_SOQL, 3)
        .with_limits(json!({
            "FileStorageMB": {"Max": 20, "Remaining": 15},
            "DailyApiRequests": {"Max": 15000, "Remaining": 14000},
            "ConcurrentAsyncGetReportInstances": {"Max": 200, "Remaining": 200}
        }));

    let metrics = admin::home_metrics(&api).await.unwrap();
    assert_eq!(metrics.active_users, 42);
    assert_eq!(metrics.queued_jobs, 3);

    // home order, absent limits omitted, others ignored
    let names: Vec<&str> = metrics.limits.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["DailyApiRequests", "FileStorageMB"]);
    assert_eq!(metrics.limits[0].used, 1000);

    let text = metrics.to_string();
    assert!(text.contains("Active users:  42"));
    assert!(text.contains("DailyApiRequests: 14000 / 15000 remaining"));
}

#[tokio::test]
async fn test_api_limits_filter() {
    let api = FakeApi::new().with_limits(json!({
        "DailyApiRequests": {"Max": 15000, "Remaining": 14000},
        "DailyBulkApiBatches": {"Max": 15000, "Remaining": 15000},
        "DataStorageMB": {"Max": 5, "Remaining": 4}
    }));

    let table = admin::api_limits(&api, Some("daily")).await.unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[0], vec!["DailyApiRequests", "15000", "14000", "1000"]);
}

#[tokio::test]
async fn test_users_and_profiles_defaults() {
    let api = FakeApi::new()
        .with_rows(
            admin::USERS_SOQL,
            json!([
                {"Id": ADA, "Name": "Ada Lovelace", "Username": "ada@acme.com",
                 "Profile": {"Name": "System Administrator"}, "UserRole": null,
                 "IsActive": true, "UserType": "Standard"},
                {"Id": GRACE, "Name": "Grace Hopper", "Username": "grace@acme.com",
                 "Profile": null, "UserRole": {"Name": "CEO"},
                 "IsActive": false, "UserType": "Standard"}
            ]),
        )
        .with_rows(
            admin::PROFILES_SOQL,
            json!([{"Id": "00e000000000001AAA", "Name": "Read Only", "UserLicense": null}]),
        );

    let users = admin::users(&api).await.unwrap();
    assert_eq!(
        users.rows[0],
        vec![
            "Ada Lovelace",
            "ada@acme.com",
            "System Administrator",
            "No Role",
            "Active",
            "Standard"
        ]
    );
    assert_eq!(users.rows[1][2], "No Profile");
    assert_eq!(users.rows[1][4], "Inactive");

    let profiles = admin::profiles(&api).await.unwrap();
    assert_eq!(profiles.rows[0], vec!["Read Only", "N/A"]);
}

#[tokio::test]
async fn test_roles_tree_and_table() {
    let api = FakeApi::new().with_rows(
        admin::ROLES_SOQL,
        json!([
            {"Id": "00E000000000002AAA", "Name": "VP Sales", "ParentRoleId": "00E000000000001AAA"},
            {"Id": "00E000000000001AAA", "Name": "CEO", "ParentRoleId": null},
            {"Id": "00E000000000003AAA", "Name": "Sales Rep", "ParentRoleId": "00E000000000002AAA"}
        ]),
    );

    let (tree, table) = admin::roles(&api).await.unwrap();
    assert_eq!(admin::render_role_tree(&tree), "CEO\n  VP Sales\n    Sales Rep\n");
    assert_eq!(table.rows[2], vec!["    Sales Rep", "2", "00E000000000003AAA"]);
}

#[tokio::test]
async fn test_record_hierarchy_stops_on_cycle() {
    let a = "001000000000001AAA";
    let b = "001000000000002AAA";
    let query = |id: &str| format!("SELECT Id, Name, ParentId FROM Account WHERE Id = '{id}'");
    let api = FakeApi::new()
        .with_rows(&query(a), json!([{"Id": a, "Name": "Acme EMEA", "ParentId": b}]))
        .with_rows(&query(b), json!([{"Id": b, "Name": "Acme Global", "ParentId": a}]));

    let chain = hierarchy::record_hierarchy(&api, "Account", a).await.unwrap();
    let names: Vec<&str> = chain.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Acme Global", "Acme EMEA"]);
    assert_eq!(api.issued().len(), 2);
    assert_eq!(
        hierarchy::render_hierarchy(&chain),
        format!("Acme Global (ID: {b})\n→ Acme EMEA (ID: {a})")
    );
}

#[tokio::test]
async fn test_record_hierarchy_cycle_across_id_lengths() {
    let a15 = "001000000000001";
    let a = "001000000000001AAA";
    let b = "001000000000002AAA";
    let query = |id: &str| format!("SELECT Id, Name, ParentId FROM Account WHERE Id = '{id}'");
    let emea = json!([{"Id": a, "Name": "Acme EMEA", "ParentId": b}]);
    let api = FakeApi::new()
        .with_rows(&query(a15), emea.clone())
        .with_rows(&query(a), emea)
        .with_rows(&query(b), json!([{"Id": b, "Name": "Acme Global", "ParentId": a}]));

    let chain = hierarchy::record_hierarchy(&api, "Account", a15).await.unwrap();
    let names: Vec<&str> = chain.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Acme Global", "Acme EMEA"]);
    assert_eq!(api.issued(), vec![query(a15), query(b)]);
}

#[tokio::test]
async fn test_record_hierarchy_missing_record() {
    let api = FakeApi::new();
    let err = hierarchy::record_hierarchy(&api, "Account", "001000000000001AAA")
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotFound(_)));

    let err = hierarchy::record_hierarchy(&api, "Account", "not-an-id")
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Validation(_)));
}
