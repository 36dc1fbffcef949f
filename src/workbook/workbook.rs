//! Workbook editing on top of the raw package
//!
//! Opens an .xlsx file, exposes its worksheets by name, clones sheets into
//! new parts and writes the package back.

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::path::Path;

use super::cell::CellRef;
use super::package::Package;
use super::shared_strings::SharedStrings;
use super::sheet::Worksheet;
use super::styles::Stylesheet;
use crate::error::WorkbookError;
use crate::opc::{parse_relationships, part_directory, relationships_part, resolve_target, Relationship};

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKSHEET_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const WORKSHEET_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Longest sheet title Excel accepts
pub const MAX_TITLE_LENGTH: usize = 31;

static SHEETS_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</((?:[\w.-]+:)?)sheets\s*>").unwrap());
static RELATIONSHIPS_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</(?:[\w.-]+:)?Relationships\s*>").unwrap());
static TITLE_FORBIDDEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[\]:*?/\\]").unwrap());

#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    sheet_id: u32,
    part: String,
    /// `None` for chart sheets and dialog sheets
    worksheet: Option<Worksheet>,
}

#[derive(Debug)]
pub struct Workbook {
    package: Package,
    workbook_part: String,
    relationships: Vec<Relationship>,
    sheets: Vec<SheetEntry>,
    shared_strings: SharedStrings,
    styles: Stylesheet,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkbookError> {
        let package = Package::from_bytes(bytes)?;

        let workbook_part = package
            .part("_rels/.rels")
            .map(parse_relationships)
            .and_then(|rels| rels.into_iter().find(|rel| rel.has_type("officeDocument")))
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string());
        let workbook_dir = part_directory(&workbook_part).to_string();

        let relationships = package
            .part(&relationships_part(&workbook_part))
            .map(parse_relationships)
            .unwrap_or_default();
        let related_part = |kind: &str| {
            relationships
                .iter()
                .find(|rel| rel.has_type(kind) && !rel.external)
                .map(|rel| resolve_target(&workbook_dir, &rel.target))
        };

        let shared_strings = match related_part("sharedStrings") {
            Some(part) if package.contains(&part) => SharedStrings::parse(package.xml_part(&part)?)?,
            _ => SharedStrings::default(),
        };
        let styles = match related_part("styles") {
            Some(part) if package.contains(&part) => Stylesheet::parse(package.xml_part(&part)?)?,
            _ => {
                tracing::warn!("Workbook has no stylesheet, assuming default formats");
                Stylesheet::default()
            }
        };

        let mut sheets = Vec::new();
        for declared in declared_sheets(package.xml_part(&workbook_part)?, &workbook_part)? {
            let Some(rel) = relationships.iter().find(|rel| rel.id == declared.rel_id) else {
                tracing::warn!("Sheet \"{}\" has no relationship {}", declared.name, declared.rel_id);
                continue;
            };
            let part = resolve_target(&workbook_dir, &rel.target);
            let worksheet = if rel.has_type("worksheet") {
                Some(Worksheet::parse(&part, package.xml_part(&part)?)?)
            } else {
                tracing::debug!("Sheet \"{}\" is not a worksheet", declared.name);
                None
            };
            sheets.push(SheetEntry {
                name: declared.name,
                sheet_id: declared.sheet_id,
                part,
                worksheet,
            });
        }

        Ok(Self {
            package,
            workbook_part,
            relationships,
            sheets,
            shared_strings,
            styles,
        })
    }

    /// Sheet names in tab order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    pub fn worksheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .and_then(|sheet| sheet.worksheet.as_ref())
    }

    pub fn worksheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheets
            .iter_mut()
            .find(|sheet| sheet.name == name)
            .and_then(|sheet| sheet.worksheet.as_mut())
    }

    /// Text of a cell on a named sheet
    pub fn cell_text(&self, sheet: &str, cell: CellRef) -> Option<String> {
        self.worksheet(sheet)?.cell_text(cell, &self.shared_strings)
    }

    /// Whether a cell's fill uses a theme colour
    pub fn is_theme_filled(&self, sheet: &str, cell: CellRef) -> bool {
        self.worksheet(sheet)
            .map(|worksheet| self.styles.is_theme_filled(worksheet.cell_style(cell)))
            .unwrap_or(false)
    }

    /// Append a copy of `source` as a new last sheet titled `title`
    ///
    /// The title is made valid and unique first; the final title is returned.
    pub fn clone_sheet(&mut self, source: &str, title: &str) -> Result<String, WorkbookError> {
        let template = self
            .sheets
            .iter()
            .find(|sheet| sheet.name == source)
            .ok_or_else(|| WorkbookError::MissingTemplateSheet(source.to_string()))?;
        let Some(worksheet) = template.worksheet.as_ref() else {
            return Err(WorkbookError::MissingTemplateSheet(source.to_string()));
        };

        let part = self.free_sheet_part(part_directory(&template.part));
        let copy = worksheet.copy_for_new_part(&part)?;
        let name = unique_title(&sanitize_title(title), self.sheets.iter().map(|s| s.name.as_str()));
        let sheet_id = self.sheets.iter().map(|s| s.sheet_id).max().unwrap_or(0) + 1;
        let rel_id = self.free_relationship_id();

        self.add_workbook_relationship(&rel_id, &part)?;
        self.package
            .add_content_type_override(&part, WORKSHEET_CONTENT_TYPE)?;
        self.declare_sheet(&name, sheet_id, &rel_id)?;

        tracing::debug!("Cloned sheet \"{source}\" as \"{name}\" ({part})");
        self.sheets.push(SheetEntry {
            name: name.clone(),
            sheet_id,
            part,
            worksheet: Some(copy),
        });
        Ok(name)
    }

    pub fn save(&mut self, path: &Path) -> Result<(), WorkbookError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize the workbook
    ///
    /// The calculation chain is dropped so Excel rebuilds it for the new sheets.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, WorkbookError> {
        for sheet in &self.sheets {
            if let Some(worksheet) = sheet.worksheet.as_ref().filter(|ws| ws.is_modified()) {
                self.package.set_part(&sheet.part, worksheet.to_xml().into_bytes());
            }
        }
        self.drop_calculation_chain()?;
        self.package.to_bytes()
    }

    fn drop_calculation_chain(&mut self) -> Result<(), WorkbookError> {
        let workbook_dir = part_directory(&self.workbook_part).to_string();
        let chains: Vec<(String, String)> = self
            .relationships
            .iter()
            .filter(|rel| rel.has_type("calcChain"))
            .map(|rel| (rel.id.clone(), resolve_target(&workbook_dir, &rel.target)))
            .collect();

        for (rel_id, part) in chains {
            self.package.remove_part(&part);
            self.package.remove_content_type_override(&part)?;
            self.remove_workbook_relationship(&rel_id)?;
        }
        Ok(())
    }

    fn free_sheet_part(&self, directory: &str) -> String {
        let directory = if directory.is_empty() {
            "xl/worksheets"
        } else {
            directory
        };
        (1..)
            .map(|n| format!("{directory}/sheet{n}.xml"))
            .find(|candidate| !self.package.contains(candidate))
            .unwrap_or_default()
    }

    fn free_relationship_id(&self) -> String {
        let highest = self
            .relationships
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", highest + 1)
    }

    fn add_workbook_relationship(&mut self, rel_id: &str, part: &str) -> Result<(), WorkbookError> {
        let rels_part = relationships_part(&self.workbook_part);
        let workbook_dir = part_directory(&self.workbook_part);
        let target = match part.strip_prefix(workbook_dir).and_then(|rest| rest.strip_prefix('/')) {
            Some(relative) if !workbook_dir.is_empty() => relative.to_string(),
            _ => format!("/{part}"),
        };

        let xml = self.package.xml_part(&rels_part)?;
        let end = RELATIONSHIPS_END
            .find(xml)
            .ok_or_else(|| WorkbookError::xml(&rels_part, "no closing Relationships element"))?;
        let entry = format!(
            r#"<Relationship Id="{rel_id}" Type="{WORKSHEET_RELATIONSHIP}" Target="{}"/>"#,
            quick_xml::escape::escape(target.as_str())
        );
        let updated = format!("{}{}{}", &xml[..end.start()], entry, &xml[end.start()..]);
        self.package.set_part(&rels_part, updated.into_bytes());

        self.relationships.push(Relationship {
            id: rel_id.to_string(),
            rel_type: WORKSHEET_RELATIONSHIP.to_string(),
            target,
            external: false,
        });
        Ok(())
    }

    fn remove_workbook_relationship(&mut self, rel_id: &str) -> Result<(), WorkbookError> {
        let rels_part = relationships_part(&self.workbook_part);
        let xml = self.package.xml_part(&rels_part)?;
        let pattern = Regex::new(&format!(
            r#"<(?:[\w.-]+:)?Relationship\b[^>]*\bId="{}"[^>]*/>"#,
            regex::escape(rel_id)
        ))
        .map_err(|e| WorkbookError::xml(&rels_part, e))?;
        let updated = pattern.replace_all(xml, "").into_owned();
        self.package.set_part(&rels_part, updated.into_bytes());
        self.relationships.retain(|rel| rel.id != rel_id);
        Ok(())
    }

    fn declare_sheet(&mut self, name: &str, sheet_id: u32, rel_id: &str) -> Result<(), WorkbookError> {
        let xml = self.package.xml_part(&self.workbook_part)?;
        let captures = SHEETS_END
            .captures(xml)
            .ok_or_else(|| WorkbookError::xml(&self.workbook_part, "no closing sheets element"))?;
        let (Some(end), Some(prefix)) = (captures.get(0), captures.get(1)) else {
            return Err(WorkbookError::xml(&self.workbook_part, "no closing sheets element"));
        };

        let entry = format!(
            r#"<{prefix}sheet name="{}" sheetId="{sheet_id}" r:id="{rel_id}" xmlns:r="{RELATIONSHIPS_NAMESPACE}"/>"#,
            quick_xml::escape::escape(name),
            prefix = prefix.as_str()
        );
        let updated = format!("{}{}{}", &xml[..end.start()], entry, &xml[end.start()..]);
        self.package.set_part(&self.workbook_part, updated.into_bytes());
        Ok(())
    }
}

struct DeclaredSheet {
    name: String,
    sheet_id: u32,
    rel_id: String,
}

/// `<sheet>` entries of the workbook part, in tab order
fn declared_sheets(xml: &str, part: &str) -> Result<Vec<DeclaredSheet>, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();

    loop {
        match reader.read_event().map_err(|e| WorkbookError::xml(part, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut sheet_id = 0;
                let mut rel_id = None;
                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map_err(|err| WorkbookError::xml(part, err))?
                        .into_owned();
                    match (attr.key.prefix().is_some(), attr.key.local_name().as_ref()) {
                        (false, b"name") => name = Some(value),
                        (false, b"sheetId") => sheet_id = value.parse().unwrap_or(0),
                        (true, b"id") => rel_id = Some(value),
                        _ => {}
                    }
                }
                match (name, rel_id) {
                    (Some(name), Some(rel_id)) => sheets.push(DeclaredSheet {
                        name,
                        sheet_id,
                        rel_id,
                    }),
                    _ => tracing::warn!("Skipping incomplete sheet declaration in {part}"),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

/// Replace characters Excel forbids in sheet titles and cap the length
pub fn sanitize_title(title: &str) -> String {
    let cleaned = TITLE_FORBIDDEN.replace_all(title, "_");
    cleaned.chars().take(MAX_TITLE_LENGTH).collect()
}

/// Make `title` unique among `existing`, ignoring case
///
/// A taken title gets the next number after the highest numbered variant:
/// "TC1" becomes "TC11", then "TC12".
pub fn unique_title<'a>(title: &str, existing: impl Iterator<Item = &'a str>) -> String {
    let existing: Vec<String> = existing.map(str::to_lowercase).collect();
    let lowered = title.to_lowercase();
    if !existing.contains(&lowered) {
        return title.to_string();
    }

    let numbered = format!("^{}(\\d*)$", regex::escape(&lowered));
    let highest = Regex::new(&numbered)
        .map(|pattern| {
            existing
                .iter()
                .filter_map(|name| pattern.captures(name))
                .filter_map(|captures| captures.get(1)?.as_str().parse::<u64>().ok())
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);

    let suffix = (highest + 1).to_string();
    let keep = MAX_TITLE_LENGTH.saturating_sub(suffix.len());
    let base: String = title.chars().take(keep).collect();
    format!("{base}{suffix}")
}
