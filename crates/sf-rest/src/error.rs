//! Error types for sfdesk-rest.

/// Result type alias for sfdesk-rest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfdesk-rest operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for a query that cannot be built.
    pub(crate) fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidQuery(message.into()))
    }

    /// Returns true if the session was rejected and the caller must log in again.
    pub fn is_auth_error(&self) -> bool {
        self.kind.is_auth_error()
    }

    /// The Salesforce error code, if any.
    pub fn error_code(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Salesforce { error_code, .. } => Some(error_code),
            ErrorKind::Client(sfdesk_client::ErrorKind::SalesforceApi { error_code, .. }) => {
                Some(error_code)
            }
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Error from the HTTP layer, classification preserved.
    #[error("{0}")]
    Client(sfdesk_client::ErrorKind),

    /// Salesforce rejected an operation or an argument failed validation.
    #[error("Salesforce error: {error_code} - {message}")]
    Salesforce { error_code: String, message: String },

    /// A query or search could not be built.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// See [`Error::is_auth_error`].
    pub fn is_auth_error(&self) -> bool {
        match self {
            ErrorKind::Client(sfdesk_client::ErrorKind::Authentication(_)) => true,
            ErrorKind::Client(sfdesk_client::ErrorKind::SalesforceApi { error_code, .. }) => {
                error_code == "INVALID_SESSION_ID"
            }
            _ => false,
        }
    }
}

impl From<sfdesk_client::Error> for Error {
    fn from(err: sfdesk_client::Error) -> Self {
        Self {
            kind: ErrorKind::Client(err.kind),
            source: err.source,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}
