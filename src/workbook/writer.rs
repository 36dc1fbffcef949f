//! Record to sheet mapping
//!
//! Every record gets its own copy of the matching template sheet. Template
//! rows name a field in column B; the value goes to column C of that row,
//! or of the next row when the C cell is a coloured section header.

use super::cell::CellRef;
use super::workbook::Workbook;
use crate::document::{Extraction, Graphic, Record, RecordKind};
use crate::error::WorkbookError;

const FIRST_ROW: u32 = 2;
const LAST_ROW: u32 = 999;

const MARKER_COLUMN: u32 = 1;
const LABEL_COLUMN: u32 = 2;
const VALUE_COLUMN: u32 = 3;

const DIAGRAM_REFERENCE: &str = "diagram reference";
const DIAGRAMS_MARKER: &str = "Diagrams";
/// Values written per graphic below the "Diagrams" marker
const DIAGRAM_ROWS: [Option<&str>; 4] = [None, None, Some("image"), None];

/// What was written for one record
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSummary {
    pub kind: RecordKind,
    pub title: String,
    pub fields_written: usize,
    pub graphics: usize,
}

/// Write the test case, then every test and experiment specification
pub fn write_extraction(
    workbook: &mut Workbook,
    extraction: &Extraction,
) -> Result<Vec<SheetSummary>, WorkbookError> {
    extraction
        .records()
        .map(|(kind, record)| write_record(workbook, record, kind))
        .collect()
}

/// Clone the template sheet for `kind` and fill it from `record`
pub fn write_record(
    workbook: &mut Workbook,
    record: &Record,
    kind: RecordKind,
) -> Result<SheetSummary, WorkbookError> {
    let title = record
        .id()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(kind.fallback_title());
    let sheet = workbook.clone_sheet(kind.template_sheet(), title)?;

    let mut graphics: Vec<Graphic> = Vec::new();
    let mut fields_written = 0;

    for row in FIRST_ROW..=LAST_ROW {
        let Some(label) = workbook.cell_text(&sheet, CellRef::new(row, LABEL_COLUMN)) else {
            continue;
        };
        let Some(field) = record.get(&label) else {
            continue;
        };

        let mut target = CellRef::new(row, VALUE_COLUMN);
        if workbook.is_theme_filled(&sheet, target) {
            target.row += 1;
        }
        set_text(workbook, &sheet, target, &field.description)?;
        fields_written += 1;

        if field.has_graphics() {
            graphics.extend(field.graphics.iter().cloned());
            let reference_label = workbook.cell_text(&sheet, CellRef::new(row + 2, LABEL_COLUMN));
            if reference_label.is_some_and(|text| text.to_lowercase() == DIAGRAM_REFERENCE) {
                let names = field
                    .graphics
                    .iter()
                    .map(|graphic| graphic.name.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                set_text(workbook, &sheet, CellRef::new(row + 2, VALUE_COLUMN), &names)?;
            }
        }
    }

    write_diagrams(workbook, &sheet, &graphics)?;
    tracing::debug!("Wrote {fields_written} fields of {kind:?} to sheet \"{sheet}\"");

    Ok(SheetSummary {
        kind,
        title: sheet,
        fields_written,
        graphics: graphics.len(),
    })
}

/// List graphics column by column below the last "Diagrams" marker
pub fn write_diagrams(
    workbook: &mut Workbook,
    sheet: &str,
    graphics: &[Graphic],
) -> Result<(), WorkbookError> {
    if graphics.is_empty() {
        return Ok(());
    }

    let marker = (1..=LAST_ROW).rev().find(|&row| {
        workbook
            .cell_text(sheet, CellRef::new(row, MARKER_COLUMN))
            .is_some_and(|text| text == DIAGRAMS_MARKER)
    });
    let Some(marker) = marker else {
        tracing::debug!("Sheet \"{sheet}\" has no {DIAGRAMS_MARKER} marker, skipping graphics list");
        return Ok(());
    };

    for (index, graphic) in graphics.iter().enumerate() {
        let column = VALUE_COLUMN + index as u32;
        for (offset, value) in DIAGRAM_ROWS.iter().enumerate() {
            let cell = CellRef::new(marker + 1 + offset as u32, column);
            set_text(workbook, sheet, cell, value.unwrap_or(graphic.name.as_str()))?;
        }
    }
    Ok(())
}

fn set_text(workbook: &mut Workbook, sheet: &str, cell: CellRef, text: &str) -> Result<(), WorkbookError> {
    let worksheet = workbook
        .worksheet_mut(sheet)
        .ok_or_else(|| WorkbookError::MissingTemplateSheet(sheet.to_string()))?;
    worksheet.set_text(cell, text);
    Ok(())
}
