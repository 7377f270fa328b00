use tracing::instrument;

use crate::error::Result;

impl super::SalesforceRestClient {
    /// Get API limits for the org.
    #[instrument(skip(self))]
    pub async fn limits(&self) -> Result<serde_json::Value> {
        self.client.rest_get("limits").await.map_err(Into::into)
    }
}
