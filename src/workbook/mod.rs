//! Spreadsheet output
//!
//! Edits an existing .xlsx template at the package level: worksheets are
//! parsed just far enough to read labels, clone sheets and write text, and
//! every other part is written back as it was read.

pub mod cell;
pub mod package;
pub mod shared_strings;
pub mod sheet;
pub mod styles;
#[allow(clippy::module_inception)]
pub mod workbook;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cell::CellRef;
pub use sheet::Worksheet;
pub use workbook::{sanitize_title, unique_title, Workbook};
pub use writer::{write_diagrams, write_extraction, write_record, SheetSummary};
