//! Error types for sfdesk.

/// Result type alias for sfdesk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfdesk operations.
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

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation(message.into()))
    }

    /// Returns true if the stored session is gone or was rejected by
    /// Salesforce and the user has to log in again.
    pub fn needs_login(&self) -> bool {
        match &self.kind {
            ErrorKind::Auth(sfdesk_auth::ErrorKind::SessionExpired(_)) => true,
            ErrorKind::Api(kind) => kind.is_auth_error(),
            _ => false,
        }
    }

    /// Returns true for missing or broken local configuration, the only
    /// failures that stop the program.
    pub fn is_config(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Config(_) | ErrorKind::Auth(sfdesk_auth::ErrorKind::Config(_))
        )
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Local account or login failure.
    #[error("{0}")]
    Auth(sfdesk_auth::ErrorKind),

    /// Salesforce API failure, including malformed queries.
    #[error("{0}")]
    Api(sfdesk_rest::ErrorKind),

    /// Rendering or export failure.
    #[error("{0}")]
    Report(sfdesk_report::ErrorKind),

    /// Input rejected before any call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A record action Salesforce refused.
    #[error("{0}")]
    Action(String),

    /// A looked-up record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or unusable local configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<sfdesk_auth::Error> for Error {
    fn from(err: sfdesk_auth::Error) -> Self {
        Self {
            kind: ErrorKind::Auth(err.kind),
            source: err.source,
        }
    }
}

impl From<sfdesk_rest::Error> for Error {
    fn from(err: sfdesk_rest::Error) -> Self {
        Self {
            kind: ErrorKind::Api(err.kind),
            source: err.source,
        }
    }
}

impl From<sfdesk_report::Error> for Error {
    fn from(err: sfdesk_report::Error) -> Self {
        Self {
            kind: ErrorKind::Report(err.kind),
            source: err.source,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}
