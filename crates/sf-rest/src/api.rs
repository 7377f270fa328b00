//! The narrow Salesforce surface the admin tooling is written against.
//!
//! Viewers and actions take `&impl SalesforceApi` so they can run against
//! [`SalesforceRestClient`] in production and an in-memory fake in tests.

use std::future::Future;

use serde_json::Value;

use crate::describe::{DescribeGlobalResult, DescribeSObjectResult};
use crate::error::Result;
use crate::schema::ObjectSchema;
use crate::SalesforceRestClient;

pub trait SalesforceApi: Send + Sync {
    /// Run a SOQL query and return every row, following pagination.
    fn query(&self, soql: &str) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// Run a `SELECT COUNT() ...` query and return `totalSize`.
    fn count(&self, soql: &str) -> impl Future<Output = Result<u64>> + Send;

    /// Run a SOSL search and return the matching rows.
    fn search(&self, sosl: &str) -> impl Future<Output = Result<Vec<Value>>> + Send;

    fn describe(&self, sobject: &str)
        -> impl Future<Output = Result<DescribeSObjectResult>> + Send;

    fn describe_global(&self) -> impl Future<Output = Result<DescribeGlobalResult>> + Send;

    /// Create a record and return its Id.
    fn create(&self, sobject: &str, record: &Value)
        -> impl Future<Output = Result<String>> + Send;

    fn update(
        &self,
        sobject: &str,
        id: &str,
        record: &Value,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, sobject: &str, id: &str) -> impl Future<Output = Result<()>> + Send;

    fn limits(&self) -> impl Future<Output = Result<Value>> + Send;

    /// Describe `sobject` and reduce it to an [`ObjectSchema`].
    fn schema(&self, sobject: &str) -> impl Future<Output = Result<ObjectSchema>> + Send {
        async move {
            self.describe(sobject)
                .await
                .map(ObjectSchema::from_describe)
        }
    }
}

impl SalesforceApi for SalesforceRestClient {
    async fn query(&self, soql: &str) -> Result<Vec<Value>> {
        SalesforceRestClient::query_all(self, soql).await
    }

    async fn count(&self, soql: &str) -> Result<u64> {
        SalesforceRestClient::query::<Value>(self, soql)
            .await
            .map(|result| result.total_size)
    }

    async fn search(&self, sosl: &str) -> Result<Vec<Value>> {
        SalesforceRestClient::search::<Value>(self, sosl)
            .await
            .map(|result| result.search_records)
    }

    async fn describe(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        self.describe_sobject(sobject).await
    }

    async fn describe_global(&self) -> Result<DescribeGlobalResult> {
        SalesforceRestClient::describe_global(self).await
    }

    async fn create(&self, sobject: &str, record: &Value) -> Result<String> {
        SalesforceRestClient::create(self, sobject, record).await
    }

    async fn update(&self, sobject: &str, id: &str, record: &Value) -> Result<()> {
        SalesforceRestClient::update(self, sobject, id, record).await
    }

    async fn delete(&self, sobject: &str, id: &str) -> Result<()> {
        SalesforceRestClient::delete(self, sobject, id).await
    }

    async fn limits(&self) -> Result<Value> {
        SalesforceRestClient::limits(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn run_schema<A: SalesforceApi>(api: &A) -> Result<ObjectSchema> {
        api.schema("Case").await
    }

    #[tokio::test]
    async fn test_schema_through_trait() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects/Case/describe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Case",
                "label": "Case",
                "fields": [
                    {"name": "Subject", "label": "Subject", "type": "string"},
                    {"name": "AccountId", "label": "Account ID", "type": "reference",
                     "referenceTo": ["Account"], "relationshipName": "Account"}
                ],
                "childRelationships": [
                    {"childSObject": "CaseComment", "field": "ParentId", "relationshipName": "CaseComments"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let schema = run_schema(&client).await.expect("schema should load");
        assert_eq!(schema.parent("Account").unwrap().target, "Account");
        assert_eq!(schema.child("CaseComments").unwrap().child_sobject, "CaseComment");
    }

    #[tokio::test]
    async fn test_count_reads_total_size() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalSize": 42,
                "done": true,
                "records": []
            })))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let count = SalesforceApi::count(&client, "SELECT COUNT() FROM User WHERE IsActive = true")
            .await
            .unwrap();
        assert_eq!(count, 42);
    }

    #[tokio::test]
    async fn test_search_rows_through_trait() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "searchRecords": [{"Id": "003xx000004TmiQAAS", "Name": "Jane"}]
            })))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let rows = SalesforceApi::search(&client, "FIND {Jane}").await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
