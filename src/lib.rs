//! htd2xlsx: ERIGrid Holistic Test Description converter
//!
//! This library reads test descriptions written in the HTD Word template,
//! extracts the test case, test specification and experiment specification
//! records, and writes each record into its own sheet of an Excel workbook
//! built from the HTD Excel template.

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub(crate) mod opc;
pub mod workbook;

// Re-export commonly used types
pub use config::Settings;
pub use convert::{collect_inputs, convert_batch, convert_file, BatchReport, ConvertOptions, Conversion};
pub use document::{load_records, DocumentView, Extraction, FieldValue, Graphic, Record, RecordKind};
pub use error::{ConvertError, DocumentError, WorkbookError};
pub use workbook::{write_record, SheetSummary, Workbook};
