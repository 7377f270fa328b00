use tracing::instrument;

use sfdesk_client::security::soql;

use crate::describe::{DescribeGlobalResult, DescribeSObjectResult};
use crate::error::{Error, ErrorKind, Result};

impl super::SalesforceRestClient {
    /// Get a list of all SObjects available in the org.
    #[instrument(skip(self))]
    pub async fn describe_global(&self) -> Result<DescribeGlobalResult> {
        self.client.rest_get("sobjects").await.map_err(Into::into)
    }

    /// Get detailed metadata for a specific SObject.
    ///
    /// This is equivalent to calling `/services/data/vXX.0/sobjects/{sobject}/describe`.
    #[instrument(skip(self))]
    pub async fn describe_sobject(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        if !soql::is_safe_sobject_name(sobject) {
            return Err(Error::new(ErrorKind::Salesforce {
                error_code: "INVALID_SOBJECT".to_string(),
                message: "Invalid SObject name".to_string(),
            }));
        }
        let path = format!("sobjects/{}/describe", sobject);
        self.client.rest_get(&path).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use crate::SalesforceRestClient;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_describe_sobject_invalid_name() {
        let client = SalesforceRestClient::new("https://test.salesforce.com", "token").unwrap();
        let result = client.describe_sobject("Bad'; DROP--").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("INVALID_SOBJECT"));
    }

    #[tokio::test]
    async fn test_describe_sobject_wiremock() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects/Contact/describe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Contact",
                "label": "Contact",
                "createable": true,
                "fields": [
                    {"name": "LastName", "label": "Last Name", "type": "string", "nillable": false},
                    {"name": "AccountId", "label": "Account ID", "type": "reference",
                     "referenceTo": ["Account"], "relationshipName": "Account", "nillable": true}
                ],
                "childRelationships": []
            })))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let describe = client
            .describe_sobject("Contact")
            .await
            .expect("describe should succeed");
        assert_eq!(describe.fields.len(), 2);
        assert_eq!(describe.fields[1].reference_to.as_deref(), Some(&["Account".to_string()][..]));
    }

    #[tokio::test]
    async fn test_describe_unknown_object_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects/Nope__c/describe"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!([{
                "errorCode": "NOT_FOUND",
                "message": "The requested resource does not exist"
            }])))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let err = client.describe_sobject("Nope__c").await.unwrap_err();
        assert_eq!(err.error_code(), Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_describe_global_wiremock() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "encoding": "UTF-8",
                "maxBatchSize": 200,
                "sobjects": [
                    {"name": "Account", "label": "Account", "queryable": true},
                    {"name": "AccountChangeEvent", "label": "Account Change Event", "queryable": false}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let global = client.describe_global().await.expect("describe_global should succeed");
        assert_eq!(global.sobjects.len(), 2);
        assert!(!global.sobjects[1].queryable);
    }
}
