//! Numbering definitions for list paragraphs
//!
//! docx-rs keeps parts of the numbering model private, so the definitions are
//! read straight from `word/numbering.xml`. A paragraph's list level is found
//! by walking paragraph -> numbering instance -> abstract numbering -> level.

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Indentation of one nesting level in list prefixes
pub(crate) const INDENT_UNIT: &str = "    ";
const EMU_PER_TWIP: i64 = 635;
/// Indentation width that counts as one nesting level
const EMU_PER_LEVEL: i64 = 500_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Numbered,
}

impl ListKind {
    pub fn marker(self) -> &'static str {
        match self {
            ListKind::Bullet => "- ",
            ListKind::Numbered => "1. ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListInfo {
    pub kind: ListKind,
    pub level: u32,
}

impl ListInfo {
    /// Text prefix for the list item, e.g. `"        - "` at level 2
    pub fn prefix(&self) -> String {
        let mut prefix = INDENT_UNIT.repeat(self.level as usize);
        prefix.push_str(self.kind.marker());
        prefix
    }
}

/// The `w:ind` of a level's paragraph properties
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Indent {
    /// No `w:ind` at all
    #[default]
    Missing,
    /// `w:ind` without a readable left edge, e.g. hanging only
    NoLeft,
    /// Left indentation in twips
    Left(i64),
}

/// One `w:lvl` of an abstract numbering definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LevelDefinition {
    pub ilvl: u32,
    pub format: Option<String>,
    pub indent: Indent,
}

impl LevelDefinition {
    /// Nesting depth, preferring indentation over the level index
    pub fn depth(&self) -> u32 {
        match self.indent {
            Indent::Left(twips) => {
                let level = (twips * EMU_PER_TWIP).div_euclid(EMU_PER_LEVEL) + 1;
                level.max(0) as u32
            }
            Indent::NoLeft => 0,
            Indent::Missing => self.ilvl + 1,
        }
    }
}

/// Numbering instances and abstract definitions of a document
#[derive(Debug, Clone, Default)]
pub struct NumberingDefinitions {
    /// numId -> abstractNumId
    instances: HashMap<usize, usize>,
    /// abstractNumId -> levels in definition order
    abstracts: HashMap<usize, Vec<LevelDefinition>>,
}

static EMPTY_DEFINITIONS: Lazy<NumberingDefinitions> = Lazy::new(NumberingDefinitions::default);

impl NumberingDefinitions {
    /// Definitions for a document without a numbering part
    pub fn empty() -> &'static NumberingDefinitions {
        &EMPTY_DEFINITIONS
    }

    /// Parse `word/numbering.xml`. Malformed XML keeps what was read so far.
    pub fn parse(xml: &[u8]) -> Self {
        let mut definitions = NumberingDefinitions::default();
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();

        let mut current_abstract: Option<usize> = None;
        let mut current_level: Option<LevelDefinition> = None;
        let mut current_num: Option<usize> = None;
        let mut in_level_ppr = false;

        loop {
            let event = reader.read_event_into(&mut buf);
            match event {
                Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"abstractNum" => current_abstract = w_attr_usize(e, b"abstractNumId"),
                    b"num" => current_num = w_attr_usize(e, b"numId"),
                    b"lvl" if current_abstract.is_some() && current_num.is_none() => {
                        current_level = Some(LevelDefinition {
                            ilvl: w_attr_usize(e, b"ilvl").unwrap_or(0) as u32,
                            ..LevelDefinition::default()
                        });
                    }
                    b"pPr" if current_level.is_some() => in_level_ppr = true,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"abstractNumId" => {
                        if let (Some(num_id), Some(abstract_id)) =
                            (current_num, w_attr_usize(e, b"val"))
                        {
                            definitions.instances.entry(num_id).or_insert(abstract_id);
                        }
                    }
                    b"numFmt" => {
                        if let Some(level) = current_level.as_mut() {
                            level.format = w_attr(e, b"val");
                        }
                    }
                    b"ind" if in_level_ppr => {
                        if let Some(level) = current_level.as_mut() {
                            level.indent = match w_attr(e, b"left")
                                .or_else(|| w_attr(e, b"start"))
                                .and_then(|value| value.trim().parse::<i64>().ok())
                            {
                                Some(twips) => Indent::Left(twips),
                                None => Indent::NoLeft,
                            };
                        }
                    }
                    b"lvl" if current_abstract.is_some() && current_num.is_none() => {
                        if let Some(abstract_id) = current_abstract {
                            definitions
                                .abstracts
                                .entry(abstract_id)
                                .or_default()
                                .push(LevelDefinition {
                                    ilvl: w_attr_usize(e, b"ilvl").unwrap_or(0) as u32,
                                    ..LevelDefinition::default()
                                });
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"abstractNum" => current_abstract = None,
                    b"num" => current_num = None,
                    b"pPr" => in_level_ppr = false,
                    b"lvl" => {
                        if let (Some(abstract_id), Some(level)) =
                            (current_abstract, current_level.take())
                        {
                            definitions
                                .abstracts
                                .entry(abstract_id)
                                .or_default()
                                .push(level);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    tracing::warn!("Error reading numbering definitions: {e}");
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        definitions
    }

    /// Resolve the level definition for a numbering instance and level index
    pub(crate) fn level(&self, num_id: usize, ilvl: usize) -> Option<&LevelDefinition> {
        let abstract_id = self.instances.get(&num_id)?;
        self.abstracts
            .get(abstract_id)?
            .iter()
            .find(|level| level.ilvl as usize == ilvl)
    }

    /// List kind and depth for a paragraph, `None` when it is not a list item
    pub fn list_info(&self, para: &docx_rs::Paragraph) -> Option<ListInfo> {
        let num_pr = para.property.numbering_property.as_ref()?;
        let num_id = num_pr.id.as_ref()?.id;
        let ilvl = num_pr.level.as_ref()?.val;

        let level = self.level(num_id, ilvl)?;
        let kind = match level.format.as_deref()? {
            "bullet" => ListKind::Bullet,
            _ => ListKind::Numbered,
        };

        Some(ListInfo {
            kind,
            level: level.depth(),
        })
    }
}

fn w_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn w_attr_usize(e: &BytesStart, name: &[u8]) -> Option<usize> {
    w_attr(e, name).and_then(|value| value.trim().parse().ok())
}
