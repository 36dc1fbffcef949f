//! In-memory zip package
//!
//! Parts are kept as raw bytes in archive order so that everything the
//! editor does not touch is written back unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::WorkbookError;

pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

static TYPES_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"</(?:[\w.-]+:)?Types\s*>").unwrap());

#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// Read every file entry of a zip archive into memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkbookError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push((name, data));
        }

        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(part, _)| part == name)
            .map(|(_, data)| data.as_slice())
    }

    /// A part decoded as UTF-8 XML
    pub fn xml_part(&self, name: &str) -> Result<&str, WorkbookError> {
        let data = self
            .part(name)
            .ok_or_else(|| WorkbookError::MissingPart(name.to_string()))?;
        std::str::from_utf8(data).map_err(|e| WorkbookError::xml(name, e))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Replace a part, or append it when new
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(part, _)| part == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn remove_part(&mut self, name: &str) -> bool {
        let before = self.parts.len();
        self.parts.retain(|(part, _)| part != name);
        self.parts.len() != before
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Register a content type override for `part`
    pub fn add_content_type_override(
        &mut self,
        part: &str,
        content_type: &str,
    ) -> Result<(), WorkbookError> {
        let xml = self.xml_part(CONTENT_TYPES_PART)?;
        let end = TYPES_END
            .find(xml)
            .ok_or_else(|| WorkbookError::xml(CONTENT_TYPES_PART, "no closing Types element"))?;
        let entry = format!(
            r#"<Override PartName="/{}" ContentType="{}"/>"#,
            quick_xml::escape::escape(part),
            quick_xml::escape::escape(content_type)
        );
        let updated = format!("{}{}{}", &xml[..end.start()], entry, &xml[end.start()..]);
        self.set_part(CONTENT_TYPES_PART, updated.into_bytes());
        Ok(())
    }

    /// Drop the content type override of `part`, if any
    pub fn remove_content_type_override(&mut self, part: &str) -> Result<(), WorkbookError> {
        let xml = self.xml_part(CONTENT_TYPES_PART)?;
        let pattern = Regex::new(&format!(
            r#"<(?:[\w.-]+:)?Override\b[^>]*\bPartName="/{}"[^>]*/>"#,
            regex::escape(part)
        ))
        .map_err(|e| WorkbookError::xml(CONTENT_TYPES_PART, e))?;
        let updated = pattern.replace_all(xml, "").into_owned();
        self.set_part(CONTENT_TYPES_PART, updated.into_bytes());
        Ok(())
    }

    /// Write the package as a deflated zip archive
    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkbookError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
