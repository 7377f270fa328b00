use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::Result;

impl super::SalesforceRestClient {
    /// Execute a SOSL search.
    ///
    /// Build the SOSL with [`SearchSpec`](crate::SearchSpec) so the search
    /// term is escaped.
    #[instrument(skip(self))]
    pub async fn search<T: DeserializeOwned>(&self, sosl: &str) -> Result<super::SearchResult<T>> {
        self.client.search(sosl).await.map_err(Into::into)
    }
}
