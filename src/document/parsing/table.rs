//! Table classification and cell text extraction
//!
//! Record tables are recognized by the label in a fixed cell. Rows are read
//! per grid column, so a horizontally merged cell is repeated once for every
//! column it spans. Cell values keep list formatting and flatten nested
//! tables into lines.

use once_cell::sync::Lazy;
use regex::Regex;

use super::super::models::RecordKind;
use super::formatting::{extract_paragraph_text, list_formatted_text};
use super::numbering::NumberingDefinitions;

/// A table is of `kind` when cell (`row`, `column`) holds `label`
struct TableRule {
    kind: RecordKind,
    row: usize,
    column: usize,
    label: &'static str,
}

static TABLE_RULES: [TableRule; 3] = [
    TableRule {
        kind: RecordKind::TestCase,
        row: 0,
        column: 0,
        label: "name of the test case",
    },
    TableRule {
        kind: RecordKind::TestSpecification,
        row: 1,
        column: 0,
        label: "title of test",
    },
    TableRule {
        kind: RecordKind::ExperimentSpecification,
        row: 1,
        column: 0,
        label: "title of experiment",
    },
];

/// Classify a table by the label in its fingerprint cell
pub(crate) fn classify_table(table: &docx_rs::Table) -> Option<RecordKind> {
    TABLE_RULES
        .iter()
        .find(|rule| {
            cell_at(table, rule.row, rule.column)
                .map(|cell| cell_plain_text(cell).trim().to_lowercase() == rule.label)
                .unwrap_or(false)
        })
        .map(|rule| rule.kind)
}

static GRID_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"GridSpan\s*(?:\{\s*\w+:\s*|\()(\d+)").unwrap());

/// Number of grid columns a cell covers
///
/// The span is private in docx-rs; it is read through debug formatting the
/// same way run formatting is.
pub(crate) fn grid_span(cell: &docx_rs::TableCell) -> usize {
    let property = format!("{:?}", cell.property);
    GRID_SPAN
        .captures(&property)
        .and_then(|captures| captures.get(1))
        .and_then(|span| span.as_str().parse::<usize>().ok())
        .filter(|&span| span > 0)
        .unwrap_or(1)
}

/// Cells of one row by grid column, merged cells repeated
fn row_cells(row: &docx_rs::TableRow) -> Vec<&docx_rs::TableCell> {
    let mut cells = Vec::with_capacity(row.cells.len());
    for row_child in &row.cells {
        let docx_rs::TableRowChild::TableCell(cell) = row_child;
        for _ in 0..grid_span(cell) {
            cells.push(cell);
        }
    }
    cells
}

/// Cells of every row, in grid order
pub(crate) fn table_rows(table: &docx_rs::Table) -> Vec<Vec<&docx_rs::TableCell>> {
    table
        .rows
        .iter()
        .map(|table_child| {
            let docx_rs::TableChild::TableRow(row) = table_child;
            row_cells(row)
        })
        .collect()
}

pub(crate) fn cell_at(table: &docx_rs::Table, row: usize, column: usize) -> Option<&docx_rs::TableCell> {
    let docx_rs::TableChild::TableRow(table_row) = table.rows.get(row)?;
    row_cells(table_row).get(column).copied()
}

/// Tables nested directly inside a cell
pub(crate) fn nested_tables(cell: &docx_rs::TableCell) -> impl Iterator<Item = &docx_rs::Table> {
    cell.children.iter().filter_map(|content| match content {
        docx_rs::TableCellContent::Table(table) => Some(table.as_ref()),
        _ => None,
    })
}

fn cell_paragraphs(cell: &docx_rs::TableCell) -> impl Iterator<Item = &docx_rs::Paragraph> {
    cell.children.iter().filter_map(|content| match content {
        docx_rs::TableCellContent::Paragraph(para) => Some(para.as_ref()),
        _ => None,
    })
}

/// Plain text of the cell's own paragraphs, newline separated
pub(crate) fn cell_plain_text(cell: &docx_rs::TableCell) -> String {
    cell_paragraphs(cell)
        .map(extract_paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Field label from a label cell: first line, text before any colon, trimmed
pub(crate) fn field_key(cell: &docx_rs::TableCell) -> String {
    key_from_label(&cell_plain_text(cell))
}

pub(crate) fn key_from_label(label: &str) -> String {
    let first_line = label.split('\n').next().unwrap_or("");
    let before_colon = first_line.split(':').next().unwrap_or("");
    before_colon.trim().to_string()
}

/// Value of a cell: list-formatted paragraphs, then the text of nested tables
pub(crate) fn cell_value_text(cell: &docx_rs::TableCell, numberings: &NumberingDefinitions) -> String {
    let text = cell_paragraphs(cell)
        .map(|para| list_formatted_text(para, numberings))
        .collect::<Vec<_>>()
        .join("\n");

    let table_texts = nested_tables(cell)
        .map(|table| table_text(table, numberings))
        .collect::<Vec<_>>()
        .join("\n");

    [text, table_texts]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every cell of a table flattened into lines, row by row
pub(crate) fn table_text(table: &docx_rs::Table, numberings: &NumberingDefinitions) -> String {
    table_rows(table)
        .into_iter()
        .flatten()
        .map(|cell| cell_value_text(cell, numberings))
        .collect::<Vec<_>>()
        .join("\n")
}
