//! Error types for sfdesk-auth.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

/// Result type alias for sfdesk-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfdesk-auth operations.
///
/// Error messages are sanitized to prevent accidental credential exposure.
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

    /// Returns true for local input problems caught before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind, ErrorKind::Validation(_))
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Input rejected before anything was persisted or sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// OAuth error response from Salesforce.
    #[error("OAuth error: {error} - {description}")]
    OAuth { error: String, description: String },

    /// SOAP fault returned by the login endpoint.
    #[error("SOAP fault: {code} - {message}")]
    SoapFault { code: String, message: String },

    /// Every login method failed.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// No active session, or the session timed out.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// HTTP error during authentication.
    #[error("HTTP error: {0}")]
    Http(String),

    /// XML parse error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Local database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Hashing or encryption failure.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::with_source(ErrorKind::Database(err.to_string()), err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::with_source(ErrorKind::Xml(err.to_string()), err)
    }
}

impl From<sfdesk_client::Error> for Error {
    fn from(err: sfdesk_client::Error) -> Self {
        let message = sfdesk_client::sanitize_error_message(&err.to_string());
        Error::with_source(ErrorKind::Http(message), err)
    }
}
