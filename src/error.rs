//! Error types for document reading, workbook editing and conversion

use std::path::PathBuf;
use thiserror::Error;

/// The input could not be read as a Word document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a zip package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid .docx file: {0}")]
    Invalid(String),

    #[error("failed to parse document: {0}")]
    Parse(String),
}

impl From<docx_rs::ReaderError> for DocumentError {
    fn from(err: docx_rs::ReaderError) -> Self {
        DocumentError::Parse(err.to_string())
    }
}

/// The spreadsheet package could not be read, edited or written
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed XML in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("workbook is missing part {0}")]
    MissingPart(String),

    #[error("template sheet \"{0}\" not found in workbook")]
    MissingTemplateSheet(String),

    #[error("invalid cell reference \"{0}\"")]
    CellReference(String),
}

impl WorkbookError {
    pub(crate) fn xml(part: &str, message: impl ToString) -> Self {
        WorkbookError::Xml {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}

/// Why the conversion of one input file was aborted
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Could not open Word file: {path}")]
    UnreadableDocument {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("Could not create folder: {path}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write to destination {path}")]
    CopySource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Excel template {path} does not exist")]
    MissingTemplate { path: PathBuf },

    #[error("Could not write to destination {path}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not open Excel file: {path}")]
    UnreadableWorkbook {
        path: PathBuf,
        #[source]
        source: WorkbookError,
    },

    #[error("Could not fill Excel file: {path}")]
    FillWorkbook {
        path: PathBuf,
        #[source]
        source: WorkbookError,
    },

    #[error("Could not write image {path}")]
    WriteImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
