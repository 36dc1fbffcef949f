//! Shared strings table of a workbook
//!
//! Only read access is needed: new values are written as inline strings.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::WorkbookError;

#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    /// Parse `xl/sharedStrings.xml`
    ///
    /// Rich text runs are concatenated; phonetic hints (`rPh`) are skipped.
    pub fn parse(xml: &str) -> Result<Self, WorkbookError> {
        let mut reader = Reader::from_str(xml);
        let mut strings = Vec::new();
        let mut current: Option<String> = None;
        let mut in_text = false;
        let mut phonetic_depth = 0usize;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => current = Some(String::new()),
                    b"rPh" => phonetic_depth += 1,
                    b"t" => in_text = phonetic_depth == 0,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::Text(text)) if in_text => {
                    if let Some(current) = current.as_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| WorkbookError::xml("sharedStrings", e))?;
                        current.push_str(&text);
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => strings.extend(current.take()),
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(WorkbookError::xml("sharedStrings", e)),
                _ => {}
            }
        }

        Ok(Self { strings })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
