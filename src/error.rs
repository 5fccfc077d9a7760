//! Error types for the sigstamp library.

use std::io;
use thiserror::Error;

/// Result type alias for stamping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while stamping a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source document could not be opened.
    #[error("failed to open document: {0}")]
    DocumentOpen(String),

    /// Page index is out of range.
    #[error("page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// The anchor marker was not found anywhere in the searched pages.
    #[error("marker '{0}' not found in document")]
    AnchorNotFound(String),

    /// The stamp configuration is unusable (zero target size, missing file).
    #[error("invalid stamp configuration: {0}")]
    InvalidConfiguration(String),

    /// The raster signature image could not be decoded.
    #[error("image decode error: {0}")]
    ImageDecode(String),

    /// The vector signature graphic could not be parsed.
    #[error("vector decode error: {0}")]
    VectorDecode(String),

    /// Error reading PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The overlay could not be merged onto the target page.
    #[error("overlay merge error: {0}")]
    Merge(String),

    /// The stamped document could not be persisted.
    #[error("failed to persist output: {0}")]
    Persist(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::ImageDecode(err.to_string()),
        }
    }
}
