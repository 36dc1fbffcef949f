//! Package-level access to .docx files
//!
//! This module handles file validation and raw access to the package parts
//! that docx-rs does not expose.

use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use crate::error::DocumentError;
use crate::opc::{parse_relationships, resolve_target};

const PACKAGE_RELATIONSHIPS: &str = "_rels/.rels";
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

/// Validates that the bytes form a .docx package and returns the archive
pub(crate) fn open_docx_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, DocumentError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let has_default_part = archive.by_name(DEFAULT_DOCUMENT_PART).is_ok();
    if !has_default_part && main_document_part(&mut archive).is_none() {
        // Check if it might be an Excel file
        let is_workbook = archive.by_name("xl/workbook.xml").is_ok();
        if is_workbook {
            return Err(DocumentError::Invalid(
                "this appears to be an Excel file (.xlsx), not a Word document".to_string(),
            ));
        }

        return Err(DocumentError::Invalid(
            "missing word/document.xml; the file may be corrupted or is not a Word document"
                .to_string(),
        ));
    }

    Ok(archive)
}

/// Whether the path carries the .docx extension
pub(crate) fn has_docx_extension(file_path: &Path) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"))
}

/// Read a whole zip entry, `None` when it does not exist
pub(crate) fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<Vec<u8>> {
    let mut file = archive.by_name(name).ok()?;
    let mut buf = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut buf).ok()?;
    Some(buf)
}

/// Locate the main document part through the package relationships
pub(crate) fn main_document_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let data = read_part(archive, PACKAGE_RELATIONSHIPS)?;
    parse_relationships(&data)
        .into_iter()
        .find(|rel| rel.has_type("officeDocument"))
        .map(|rel| resolve_target("", &rel.target))
}

/// The main document part, falling back to the conventional location
pub(crate) fn document_part_or_default<R: Read + Seek>(archive: &mut ZipArchive<R>) -> String {
    main_document_part(archive).unwrap_or_else(|| DEFAULT_DOCUMENT_PART.to_string())
}
