//! REST resources used by sfdesk, one file per resource family.

use sfdesk_client::SalesforceClient;

use crate::error::Result;

mod crud;
mod describe;
mod limits;
mod query;
mod search;

/// Session-bound REST client. Usually built from a logged-in session with
/// [`from_client`](Self::from_client).
#[derive(Debug, Clone)]
pub struct SalesforceRestClient {
    client: SalesforceClient,
}

impl SalesforceRestClient {
    /// Client for an instance URL and access token with default HTTP settings.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let client = SalesforceClient::new(instance_url, access_token)?;
        Ok(Self { client })
    }

    pub fn from_client(client: SalesforceClient) -> Self {
        Self { client }
    }

    pub fn instance_url(&self) -> &str {
        self.client.instance_url()
    }

    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }
}

/// Body of the `search` resource.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SearchResult<T> {
    #[serde(rename = "searchRecords", default = "Vec::new")]
    pub search_records: Vec<T>,
}
