//! Error types for sfdesk-report.

/// Result type alias for sfdesk-report operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfdesk-report operations.
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
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A named column does not exist in the table.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// The selected data cannot be charted.
    #[error("Nothing to chart: {0}")]
    NoData(String),

    /// Chart drawing failed.
    #[error("Chart error: {0}")]
    Chart(String),

    /// Image encoding or decoding failed.
    #[error("Image error: {0}")]
    Image(String),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Excel workbook error.
    #[error("Excel error: {0}")]
    Excel(String),

    /// PDF error.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Zip archive error.
    #[error("Archive error: {0}")]
    Archive(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Error::with_source(ErrorKind::Excel(err.to_string()), err)
    }
}

impl From<printpdf::Error> for Error {
    fn from(err: printpdf::Error) -> Self {
        Error::new(ErrorKind::Pdf(err.to_string()))
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::with_source(ErrorKind::Image(err.to_string()), err)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::with_source(ErrorKind::Archive(err.to_string()), err)
    }
}
