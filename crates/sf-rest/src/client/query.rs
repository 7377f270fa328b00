use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::Result;
use crate::QueryResult;

impl super::SalesforceRestClient {
    /// Execute a SOQL query.
    ///
    /// Returns the first page of results. Use `query_all` for automatic pagination.
    ///
    /// # Security
    ///
    /// Values interpolated into the query must be escaped with
    /// `sfdesk_client::security::soql::escape_string`, or the query built
    /// with [`QuerySpec`](crate::QuerySpec), which escapes for you.
    #[instrument(skip(self))]
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        self.client.query(soql).await.map_err(Into::into)
    }

    /// Execute a SOQL query and return all results (automatic pagination).
    #[instrument(skip(self))]
    pub async fn query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        self.client.query_all(soql).await.map_err(Into::into)
    }
}
