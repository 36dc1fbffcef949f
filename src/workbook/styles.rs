//! Just enough of `xl/styles.xml` to tell which cell formats use a
//! theme-coloured pattern fill

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::WorkbookError;

#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    /// Per fill index: the pattern foreground references a theme colour
    theme_fills: Vec<bool>,
    /// Per cell format (`cellXfs`) index: its fill index
    cell_fills: Vec<usize>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Other,
    Fills,
    CellFormats,
}

impl Stylesheet {
    pub fn parse(xml: &str) -> Result<Self, WorkbookError> {
        let mut reader = Reader::from_str(xml);
        let mut stylesheet = Stylesheet::default();
        let mut section = Section::Other;
        let mut in_pattern = false;

        loop {
            let (e, empty) = match reader.read_event() {
                Ok(Event::Start(e)) => (e, false),
                Ok(Event::Empty(e)) => (e, true),
                Ok(Event::End(e)) => {
                    match e.local_name().as_ref() {
                        b"fills" | b"cellXfs" => section = Section::Other,
                        b"patternFill" => in_pattern = false,
                        _ => {}
                    }
                    continue;
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(WorkbookError::xml("styles", e)),
                _ => continue,
            };

            match (section, e.local_name().as_ref()) {
                (Section::Other, b"fills") if !empty => section = Section::Fills,
                (Section::Other, b"cellXfs") if !empty => section = Section::CellFormats,
                (Section::Fills, b"fill") => stylesheet.theme_fills.push(false),
                (Section::Fills, b"patternFill") => in_pattern = !empty,
                (Section::Fills, b"fgColor") if in_pattern => {
                    if attribute(&e, b"theme").is_some() {
                        if let Some(last) = stylesheet.theme_fills.last_mut() {
                            *last = true;
                        }
                    }
                }
                (Section::CellFormats, b"xf") => {
                    let fill_id = attribute(&e, b"fillId")
                        .and_then(|value| value.parse().ok())
                        .unwrap_or(0);
                    stylesheet.cell_fills.push(fill_id);
                }
                _ => {}
            }
        }

        Ok(stylesheet)
    }

    /// Whether cells with style index `style` have a theme-coloured fill
    pub fn is_theme_filled(&self, style: usize) -> bool {
        let fill = self.cell_fills.get(style).copied().unwrap_or(0);
        self.theme_fills.get(fill).copied().unwrap_or(false)
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}
