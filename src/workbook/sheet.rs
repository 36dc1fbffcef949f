//! Worksheet XML editing
//!
//! A worksheet is split into the XML before `<sheetData>`, the rows, and the
//! XML after it. Only the rows are modelled; head and tail are kept verbatim
//! so that column widths, merged cells, validations and page setup survive.

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use regex::Regex;
use std::collections::BTreeMap;

use super::cell::CellRef;
use super::shared_strings::SharedStrings;
use crate::error::WorkbookError;

/// Control characters that are not allowed in XML 1.0 text
static ILLEGAL_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").unwrap());

/// Worksheet children that point into the sheet's relationship part, which a
/// copy does not get
const RELATED_ELEMENTS: [&[u8]; 9] = [
    b"drawing",
    b"legacyDrawing",
    b"legacyDrawingHF",
    b"picture",
    b"oleObjects",
    b"controls",
    b"tableParts",
    b"hyperlinks",
    b"AlternateContent",
];

#[derive(Debug, Clone, Default)]
struct Cell {
    /// Attributes other than `r`, in document order
    attributes: Vec<(String, String)>,
    /// Raw inner XML
    inner: String,
}

impl Cell {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Default)]
struct Row {
    attributes: Vec<(String, String)>,
    cells: BTreeMap<u32, Cell>,
    modified: bool,
}

#[derive(Debug, Clone)]
pub struct Worksheet {
    head: String,
    rows: BTreeMap<u32, Row>,
    tail: String,
    /// Namespace prefix of the SpreadsheetML elements, e.g. `x:`
    prefix: String,
    modified: bool,
}

impl Worksheet {
    /// Parse a worksheet part
    pub fn parse(part: &str, xml: &str) -> Result<Self, WorkbookError> {
        let mut reader = Reader::from_str(xml);

        loop {
            let start = reader.buffer_position() as usize;
            match reader.read_event().map_err(|e| WorkbookError::xml(part, e))? {
                Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                    let head_end = reader.buffer_position() as usize;
                    let prefix = element_prefix(e.name());
                    let (rows, tail_start) = parse_rows(&mut reader, xml, part)?;
                    return Ok(Self {
                        head: xml[..head_end].to_string(),
                        rows,
                        tail: xml[tail_start..].to_string(),
                        prefix,
                        modified: false,
                    });
                }
                Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                    let end = reader.buffer_position() as usize;
                    let prefix = element_prefix(e.name());
                    return Ok(Self {
                        head: format!("{}<{prefix}sheetData>", &xml[..start]),
                        rows: BTreeMap::new(),
                        tail: format!("</{prefix}sheetData>{}", &xml[end..]),
                        prefix,
                        modified: false,
                    });
                }
                Event::Eof => return Err(WorkbookError::xml(part, "no sheetData element")),
                _ => {}
            }
        }
    }

    /// Serialize back to XML
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(self.head.len() + self.tail.len() + self.rows.len() * 64);
        xml.push_str(&self.head);
        for (&index, row) in &self.rows {
            write_row(&mut xml, &self.prefix, index, row);
        }
        xml.push_str(&self.tail);
        xml
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Displayed text of a cell, `None` when it holds no value
    pub fn cell_text(&self, cell: CellRef, shared_strings: &SharedStrings) -> Option<String> {
        let entry = self.rows.get(&cell.row)?.cells.get(&cell.column)?;
        cell_value(entry, shared_strings)
    }

    /// Style index of a cell; cells without one use the default format 0
    pub fn cell_style(&self, cell: CellRef) -> usize {
        self.rows
            .get(&cell.row)
            .and_then(|row| row.cells.get(&cell.column))
            .and_then(|entry| entry.attribute("s"))
            .and_then(|style| style.parse().ok())
            .unwrap_or(0)
    }

    /// Store `text` as an inline string, keeping the cell's style
    pub fn set_text(&mut self, cell: CellRef, text: &str) {
        let prefix = &self.prefix;
        let row = self.rows.entry(cell.row).or_default();
        row.modified = true;
        let entry = row.cells.entry(cell.column).or_default();

        let mut attributes = Vec::with_capacity(2);
        if let Some(style) = entry.attribute("s") {
            attributes.push(("s".to_string(), style.to_string()));
        }
        attributes.push(("t".to_string(), "inlineStr".to_string()));
        entry.attributes = attributes;

        let text = ILLEGAL_CHARACTERS.replace_all(text, "");
        entry.inner = format!(
            r#"<{prefix}is><{prefix}t xml:space="preserve">{}</{prefix}t></{prefix}is>"#,
            quick_xml::escape::escape(text.as_ref())
        );
        self.modified = true;
    }

    /// A copy suitable for a new sheet part: no relationship references and
    /// not the selected tab
    pub fn copy_for_new_part(&self, part: &str) -> Result<Self, WorkbookError> {
        let stripped = strip_related_elements(part, &self.to_xml())?;
        let mut copy = Self::parse(part, &stripped)?;
        copy.modified = true;
        Ok(copy)
    }
}

fn element_prefix(name: QName<'_>) -> String {
    name.prefix()
        .map(|prefix| format!("{}:", String::from_utf8_lossy(prefix.as_ref())))
        .unwrap_or_default()
}

fn attributes_of(part: &str, e: &BytesStart<'_>) -> Result<Vec<(String, String)>, WorkbookError> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| WorkbookError::xml(part, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| WorkbookError::xml(part, err))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

/// Split off the `r` attribute
fn take_reference(attributes: &mut Vec<(String, String)>) -> Option<String> {
    let index = attributes.iter().position(|(key, _)| key == "r")?;
    Some(attributes.remove(index).1)
}

/// Read rows up to `</sheetData>`; returns them with the end tag's offset
fn parse_rows(
    reader: &mut Reader<&[u8]>,
    xml: &str,
    part: &str,
) -> Result<(BTreeMap<u32, Row>, usize), WorkbookError> {
    let mut rows = BTreeMap::new();
    let mut last_row = 0u32;

    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event().map_err(|e| WorkbookError::xml(part, e))? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                let (index, mut row) = row_header(part, &e, last_row)?;
                parse_cells(reader, xml, part, index, &mut row)?;
                last_row = index;
                rows.insert(index, row);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let (index, row) = row_header(part, &e, last_row)?;
                last_row = index;
                rows.insert(index, row);
            }
            Event::Start(e) => {
                tracing::debug!(
                    "Dropping unexpected <{}> in sheetData of {part}",
                    String::from_utf8_lossy(e.name().as_ref())
                );
                reader
                    .read_to_end(e.name())
                    .map_err(|err| WorkbookError::xml(part, err))?;
            }
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => return Ok((rows, start)),
            Event::Eof => return Err(WorkbookError::xml(part, "unterminated sheetData")),
            _ => {}
        }
    }
}

fn row_header(part: &str, e: &BytesStart<'_>, last_row: u32) -> Result<(u32, Row), WorkbookError> {
    let mut attributes = attributes_of(part, e)?;
    let index = take_reference(&mut attributes)
        .and_then(|r| r.parse().ok())
        .unwrap_or(last_row + 1);
    Ok((
        index,
        Row {
            attributes,
            cells: BTreeMap::new(),
            modified: false,
        },
    ))
}

fn parse_cells(
    reader: &mut Reader<&[u8]>,
    xml: &str,
    part: &str,
    row_index: u32,
    row: &mut Row,
) -> Result<(), WorkbookError> {
    let mut last_column = 0u32;

    loop {
        match reader.read_event().map_err(|e| WorkbookError::xml(part, e))? {
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let mut attributes = attributes_of(part, &e)?;
                let column = cell_column(take_reference(&mut attributes), last_column, row_index);
                let span = reader
                    .read_to_end(e.name())
                    .map_err(|err| WorkbookError::xml(part, err))?;
                let inner = xml
                    .get(span.start as usize..span.end as usize)
                    .unwrap_or_default()
                    .to_string();
                row.cells.insert(column, Cell { attributes, inner });
                last_column = column;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let mut attributes = attributes_of(part, &e)?;
                let column = cell_column(take_reference(&mut attributes), last_column, row_index);
                row.cells.insert(
                    column,
                    Cell {
                        attributes,
                        inner: String::new(),
                    },
                );
                last_column = column;
            }
            Event::Start(e) => {
                reader
                    .read_to_end(e.name())
                    .map_err(|err| WorkbookError::xml(part, err))?;
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => return Ok(()),
            Event::Eof => return Err(WorkbookError::xml(part, "unterminated row")),
            _ => {}
        }
    }
}

fn cell_column(reference: Option<String>, last_column: u32, row_index: u32) -> u32 {
    match reference.and_then(|r| r.parse::<CellRef>().ok()) {
        Some(cell) => {
            if cell.row != row_index {
                tracing::debug!("Cell {cell} listed under row {row_index}");
            }
            cell.column
        }
        None => last_column + 1,
    }
}

fn write_attributes(xml: &mut String, attributes: &[(String, String)], skip: &[&str]) {
    for (key, value) in attributes {
        if skip.contains(&key.as_str()) {
            continue;
        }
        xml.push(' ');
        xml.push_str(key);
        xml.push_str("=\"");
        xml.push_str(&quick_xml::escape::escape(value.as_str()));
        xml.push('"');
    }
}

fn write_row(xml: &mut String, prefix: &str, index: u32, row: &Row) {
    xml.push_str(&format!("<{prefix}row r=\"{index}\""));
    // Cell spans are an optimisation hint that goes stale once cells are added
    let skip: &[&str] = if row.modified { &["spans"] } else { &[] };
    write_attributes(xml, &row.attributes, skip);

    if row.cells.is_empty() {
        xml.push_str("/>");
        return;
    }
    xml.push('>');

    for (&column, cell) in &row.cells {
        let reference = CellRef::new(index, column);
        xml.push_str(&format!("<{prefix}c r=\"{reference}\""));
        write_attributes(xml, &cell.attributes, &[]);
        if cell.inner.is_empty() {
            xml.push_str("/>");
        } else {
            xml.push('>');
            xml.push_str(&cell.inner);
            xml.push_str(&format!("</{prefix}c>"));
        }
    }

    xml.push_str(&format!("</{prefix}row>"));
}

/// Text of a cell: shared, inline or literal value
fn cell_value(cell: &Cell, shared_strings: &SharedStrings) -> Option<String> {
    if cell.inner.is_empty() {
        return None;
    }

    let cell_type = cell.attribute("t").unwrap_or("n");
    let mut reader = Reader::from_str(&cell.inner);
    reader.config_mut().check_end_names = false;

    let mut value: Option<String> = None;
    let mut inline = String::new();
    let mut has_inline = false;
    let mut in_value = false;
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"v" => in_value = true,
                b"is" => has_inline = true,
                b"rPh" => phonetic_depth += 1,
                b"t" => in_text = phonetic_depth == 0,
                _ => {}
            },
            Ok(Event::Text(text)) if in_value || in_text => {
                let text = text.unescape().ok()?;
                if in_value {
                    value.get_or_insert_with(String::new).push_str(&text);
                } else {
                    inline.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_text = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("Unreadable cell content: {e}");
                return None;
            }
            _ => {}
        }
    }

    match cell_type {
        "inlineStr" if has_inline => Some(inline),
        "s" => {
            let index: usize = value?.trim().parse().ok()?;
            shared_strings.get(index).map(str::to_string)
        }
        _ => value,
    }
}

fn is_related_element(e: &BytesStart<'_>) -> bool {
    RELATED_ELEMENTS.contains(&e.local_name().as_ref())
}

/// Copy of a start tag without relationship ids and tab selection
fn without_related_attributes(part: &str, e: &BytesStart<'_>) -> Result<BytesStart<'static>, WorkbookError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let is_sheet_view = e.local_name().as_ref() == b"sheetView";
    let mut cleaned = BytesStart::new(name);

    for attr in e.attributes() {
        let attr = attr.map_err(|err| WorkbookError::xml(part, err))?;
        let local = attr.key.local_name();
        let is_relationship_id = attr.key.prefix().is_some() && local.as_ref() == b"id";
        let is_tab_selection = is_sheet_view && local.as_ref() == b"tabSelected";
        if is_relationship_id || is_tab_selection {
            continue;
        }
        cleaned.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
    }

    Ok(cleaned)
}

/// Remove worksheet children that need the sheet's relationship part
fn strip_related_elements(part: &str, xml: &str) -> Result<String, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| WorkbookError::xml(part, e))?;
        let result = match event {
            Event::Eof => break,
            Event::Start(e) => {
                if depth == 1 && is_related_element(&e) {
                    reader
                        .read_to_end(e.name())
                        .map_err(|err| WorkbookError::xml(part, err))?;
                    continue;
                }
                depth += 1;
                writer.write_event(Event::Start(without_related_attributes(part, &e)?))
            }
            Event::Empty(e) => {
                if depth == 1 && is_related_element(&e) {
                    continue;
                }
                writer.write_event(Event::Empty(without_related_attributes(part, &e)?))
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                writer.write_event(Event::End(e))
            }
            other => writer.write_event(other),
        };
        result.map_err(|e| WorkbookError::xml(part, e))?;
    }

    String::from_utf8(writer.into_inner()).map_err(|e| WorkbookError::xml(part, e))
}
