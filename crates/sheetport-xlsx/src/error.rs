//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur during XLSX reading/writing
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// A cell reference failed to parse or arrived out of order
    #[error("Malformed cell reference: {0}")]
    MalformedReference(String),

    /// A cell referenced a shared string that does not exist
    #[error("Shared string index {0} out of range (count: {1})")]
    SharedStringIndex(u32, usize),

    /// The " (n)" suffix search ran off its cap
    #[error("Could not assign a unique sheet name for '{0}'")]
    SheetNameExhausted(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] sheetport_core::Error),
}
