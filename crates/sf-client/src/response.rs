//! HTTP response handling with Salesforce error mapping.

use serde::de::DeserializeOwned;

use crate::error::{Error, ErrorKind, Result};

/// Wrapper around an HTTP response.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// Get the response body as text.
    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(Into::into)
    }

    /// Deserialize the response body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.inner.bytes().await?;
        serde_json::from_slice(&body).map_err(Into::into)
    }

    /// Turn a non-2xx response into an [`Error`], passing successes through.
    pub async fn check_salesforce_error(self) -> Result<Response> {
        if self.is_success() {
            return Ok(self);
        }

        let status = self.status();
        let body = self.text().await.unwrap_or_default();
        Err(parse_error_response(status, &body))
    }
}

/// Map an error body to an error kind.
///
/// Salesforce answers REST failures with `[{"errorCode", "message", "fields"}]`;
/// anything else falls back to a status-based kind with a sanitized body.
fn parse_error_response(status: u16, body: &str) -> Error {
    if let Ok(errors) = serde_json::from_str::<Vec<SalesforceErrorResponse>>(body) {
        if let Some(err) = errors.into_iter().next() {
            return api_error(status, err);
        }
    }

    if let Ok(err) = serde_json::from_str::<SalesforceErrorResponse>(body) {
        return api_error(status, err);
    }

    let sanitized = sanitize_error_message(body);
    let kind = match status {
        401 => ErrorKind::Authentication(sanitized),
        403 => ErrorKind::Authorization(sanitized),
        404 => ErrorKind::NotFound(sanitized),
        429 => ErrorKind::RateLimited(sanitized),
        _ => ErrorKind::Http {
            status,
            message: sanitized,
        },
    };

    Error::new(kind)
}

fn api_error(status: u16, err: SalesforceErrorResponse) -> Error {
    let message = sanitize_error_message(&err.message);
    let kind = if status == 401 {
        ErrorKind::Authentication(format!("{}: {}", err.error_code, message))
    } else {
        ErrorKind::SalesforceApi {
            error_code: err.error_code,
            message,
            fields: err.fields.unwrap_or_default(),
        }
    };
    Error::new(kind)
}

/// Sanitize an error message so it can be logged or shown.
///
/// - Redacts anything shaped like a Salesforce access token (`00D...!...`)
/// - Redacts `sid=` session ids and `<sessionId>` elements
/// - Truncates messages longer than 500 characters
pub fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = message.to_string();

    let redactions = [
        (r"00[A-Za-z0-9]{13,}![A-Za-z0-9_.]+", "[REDACTED_TOKEN]"),
        (r"sid=[A-Za-z0-9]{20,}", "sid=[REDACTED]"),
        (r"<sessionId>[^<]*</sessionId>", "<sessionId>[REDACTED]</sessionId>"),
    ];
    for (pattern, replacement) in redactions {
        if let Ok(re) = regex_lite::Regex::new(pattern) {
            sanitized = re.replace_all(&sanitized, replacement).into_owned();
        }
    }

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}

/// Salesforce API error response format.
#[derive(Debug, serde::Deserialize)]
struct SalesforceErrorResponse {
    #[serde(alias = "errorCode")]
    error_code: String,
    message: String,
    fields: Option<Vec<String>>,
}
