//! Record create, update and delete.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use sfdesk_client::security::{soql, url as url_security};

use crate::error::{Error, ErrorKind, Result};

/// Body of `POST sobjects/{type}`.
#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
    success: bool,
    #[serde(default)]
    errors: Vec<RecordError>,
}

#[derive(Debug, Deserialize)]
struct RecordError {
    #[serde(rename = "statusCode", default)]
    status_code: String,
    message: String,
}

fn check_sobject(sobject: &str) -> Result<()> {
    if soql::is_safe_sobject_name(sobject) {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Salesforce {
            error_code: "INVALID_SOBJECT".to_string(),
            message: "Invalid SObject name".to_string(),
        }))
    }
}

fn check_id(id: &str) -> Result<()> {
    if url_security::is_valid_salesforce_id(id) {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Salesforce {
            error_code: "INVALID_ID".to_string(),
            message: "Invalid Salesforce ID format".to_string(),
        }))
    }
}

impl super::SalesforceRestClient {
    /// Create a record and return its Id.
    ///
    /// A 2xx answer with `success: false` is still an error; its first
    /// status code becomes the error code.
    #[instrument(skip(self, record))]
    pub async fn create<T: Serialize>(&self, sobject: &str, record: &T) -> Result<String> {
        check_sobject(sobject)?;
        let path = format!("sobjects/{}", sobject);
        let response: CreateResponse = self.client.rest_post(&path, record).await?;

        if response.success {
            return Ok(response.id);
        }
        let error_code = response
            .errors
            .first()
            .map(|e| e.status_code.clone())
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| "CREATE_FAILED".to_string());
        let message = response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::new(ErrorKind::Salesforce {
            error_code,
            message,
        }))
    }

    /// Patch the given fields of a record.
    #[instrument(skip(self, record))]
    pub async fn update<T: Serialize>(&self, sobject: &str, id: &str, record: &T) -> Result<()> {
        check_sobject(sobject)?;
        check_id(id)?;
        let path = format!("sobjects/{}/{}", sobject, id);
        self.client.rest_patch(&path, record).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, sobject: &str, id: &str) -> Result<()> {
        check_sobject(sobject)?;
        check_id(id)?;
        let path = format!("sobjects/{}/{}", sobject, id);
        self.client.rest_delete(&path).await.map_err(Into::into)
    }
}
