//! Document reading and record extraction
//!
//! This module reads Word (.docx) test descriptions and turns their tables
//! and headed paragraphs into label-keyed records.

pub mod extractor;
pub(crate) mod io;
pub mod media;
pub mod models;
pub(crate) mod parsing;
pub mod view;

pub use extractor::extract;
pub use media::MediaStore;
pub use models::*;
pub use parsing::heading::Headline;
pub use parsing::numbering::{ListInfo, ListKind, NumberingDefinitions};
pub use view::DocumentView;

use crate::error::DocumentError;
use std::path::Path;

/// Open a document and extract its records in one step
pub fn load_records(file_path: &Path) -> Result<(DocumentView, Extraction), DocumentError> {
    let view = DocumentView::open(file_path)?;
    let extraction = extract(&view);
    Ok((view, extraction))
}
