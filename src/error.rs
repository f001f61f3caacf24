//! Error types for the xlsx-extract library.

use std::io;
use thiserror::Error;

/// Result type alias for xlsx-extract operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
///
/// Structural and selection errors are always raised before the first row of an
/// extraction is emitted. Streaming errors abort an extraction mid-sheet; rows
/// already delivered stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The package itself is unusable (archive, required parts, workbook index).
    Structural,
    /// The requested sheet selection matches nothing.
    Selection,
    /// A worksheet could not be read to the end.
    Streaming,
}

impl ErrorKind {
    /// Lowercase name, as used in rendered output.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Structural => "structural",
            ErrorKind::Selection => "selection",
            ErrorKind::Streaming => "streaming",
        }
    }
}

/// Errors that can occur while extracting spreadsheet data.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input file does not exist.
    #[error("Archive not found: {0}")]
    ArchiveNotFound(String),

    /// The ZIP container's central structure could not be read.
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// The archive is a valid ZIP but not a spreadsheet package.
    #[error("Not a spreadsheet package: {0}")]
    NotSpreadsheet(String),

    /// A part's compressed data failed to inflate or verify while it was read.
    #[error("Corrupt part data: {0}")]
    CorruptPart(String),

    /// A required package part is missing.
    #[error("Missing part: {0}")]
    MissingPart(String),

    /// The workbook index references something that cannot be resolved.
    #[error("Malformed workbook: {0}")]
    MalformedWorkbook(String),

    /// No sheet matches the requested selector.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// The extraction options are contradictory or unparsable.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// A worksheet part ended in the middle of a row or cell.
    #[error("Truncated worksheet: {0}")]
    TruncatedWorksheet(String),

    /// A cell references a shared string beyond the end of the table.
    #[error("Shared string index {index} out of range (table has {len} entries)")]
    SharedStringOutOfRange {
        /// Referenced index.
        index: usize,
        /// Number of entries in the shared string table.
        len: usize,
    },

    /// A cell's literal content does not match its declared type.
    #[error("Invalid value {value:?} in cell {cell}")]
    InvalidCellValue {
        /// Cell reference, or `?` when the cell carries none.
        cell: String,
        /// Offending literal.
        value: String,
    },

    /// A date-styled cell holds a serial that is not a representable date.
    #[error("Invalid date serial: {0}")]
    InvalidDate(f64),

    /// Error while rendering output.
    #[error("Render error: {0}")]
    Render(String),
}

impl Error {
    /// Classify this error as structural, selection or streaming.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SheetNotFound(_) | Error::InvalidOptions(_) => ErrorKind::Selection,
            Error::XmlParse(_)
            | Error::CorruptPart(_)
            | Error::TruncatedWorksheet(_)
            | Error::SharedStringOutOfRange { .. }
            | Error::InvalidCellValue { .. }
            | Error::InvalidDate(_)
            | Error::Render(_) => ErrorKind::Streaming,
            Error::Io(_)
            | Error::ArchiveNotFound(_)
            | Error::CorruptArchive(_)
            | Error::NotSpreadsheet(_)
            | Error::MissingPart(_)
            | Error::MalformedWorkbook(_) => ErrorKind::Structural,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => {
                Error::MissingPart("file not found".to_string())
            }
            other => Error::CorruptArchive(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            // Reads of a part only fail when its compressed data is damaged
            quick_xml::Error::Io(e) => Error::CorruptPart(e.to_string()),
            other => Error::XmlParse(other.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON error: {}", err))
    }
}
