//! Record extraction
//!
//! Turns a document view into records:
//! 1. Pre-scans headlines to create test and experiment specification stubs
//! 2. Reads the test case header paragraphs (ID, author, version, project,
//!    date and the qualification strategy)
//! 3. Walks all tables in document order, filling the test case record and
//!    handing specification tables to stubs by position

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{Extraction, FieldValue, Record, RecordKind, ID_FIELD};
use super::parsing::formatting::list_formatted_text;
use super::parsing::heading::{headline_id, Headline, ParagraphSummary};
use super::parsing::table::{cell_value_text, classify_table, field_key, table_rows};
use super::view::DocumentView;

static AUTHOR_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Author:?\s+(.*)\s+Version:?\s+(.*)").unwrap());
static PROJECT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Project:?\s+(.*)\s+Date:?\s+(.*)").unwrap());

/// Header lines that carry two fields at once
static HEADER_TEMPLATES: [(&Lazy<Regex>, [&str; 2]); 2] = [
    (&AUTHOR_VERSION, ["Author", "Version"]),
    (&PROJECT_DATE, ["Project", "Date"]),
];

/// Row shape of each record table: cell count, label column, value column
fn row_layout(kind: RecordKind) -> (usize, usize, usize) {
    match kind {
        RecordKind::TestCase => (3, 1, 2),
        RecordKind::TestSpecification | RecordKind::ExperimentSpecification => (2, 0, 1),
    }
}

/// Extract the test case and all specifications from a document
pub fn extract(view: &DocumentView) -> Extraction {
    let mut test_specifications = find_test_specifications(view);
    let mut experiment_specifications = find_experiment_specifications(view);
    let header = read_test_case_header(view);

    let mut test_case = Record::new();
    let mut used_test_specs = 0;
    let mut used_experiment_specs = 0;

    for table in view.tables() {
        let Some(kind) = classify_table(table) else {
            continue;
        };
        tracing::debug!("Found {kind:?} table");

        match kind {
            RecordKind::TestCase => {
                let mut record = header.clone();
                fill_from_table(view, table, kind, &mut record);
                test_case = record;
            }
            RecordKind::TestSpecification => {
                fill_next_stub(
                    view,
                    table,
                    kind,
                    &mut test_specifications,
                    &mut used_test_specs,
                );
            }
            RecordKind::ExperimentSpecification => {
                fill_next_stub(
                    view,
                    table,
                    kind,
                    &mut experiment_specifications,
                    &mut used_experiment_specs,
                );
            }
        }
    }

    Extraction {
        test_case,
        test_specifications,
        experiment_specifications,
    }
}

/// Stubs are matched to tables by encounter order, not by ID
fn fill_next_stub(
    view: &DocumentView,
    table: &docx_rs::Table,
    kind: RecordKind,
    stubs: &mut Vec<Record>,
    used: &mut usize,
) {
    if let Some(stub) = stubs.get_mut(*used) {
        fill_from_table(view, table, kind, stub);
    } else {
        tracing::debug!("More {kind:?} tables than headlines, adding a record without ID");
        let mut record = Record::new();
        fill_from_table(view, table, kind, &mut record);
        stubs.push(record);
    }
    *used += 1;
}

/// Copy every well-shaped row of a record table into `record`
fn fill_from_table(
    view: &DocumentView,
    table: &docx_rs::Table,
    kind: RecordKind,
    record: &mut Record,
) {
    let (cell_count, label_column, value_column) = row_layout(kind);

    for (index, row) in table_rows(table).into_iter().enumerate() {
        if row.len() != cell_count {
            tracing::debug!(
                "Skipping row {index} of {kind:?} table: {} cells, expected {cell_count}",
                row.len()
            );
            continue;
        }

        let key = field_key(row[label_column]);
        let value_cell = row[value_column];
        let value = FieldValue::new(cell_value_text(value_cell, view.numberings()))
            .with_graphics(view.cell_graphics(value_cell));
        record.insert(key, value);
    }
}

/// Free-text capture of the paragraphs following a headline
struct SectionCapture {
    label: &'static str,
}

impl SectionCapture {
    fn start(headline: Headline, record: &mut Record) -> Option<Self> {
        let label = headline.field_label()?;
        record.insert(label, FieldValue::default());
        Some(Self { label })
    }

    fn append(&self, view: &DocumentView, para: &docx_rs::Paragraph, record: &mut Record) {
        let text = list_formatted_text(para, view.numberings());
        let graphics = view.paragraph_graphics(para);
        let Some(field) = record.get_mut(self.label) else {
            return;
        };
        field.push_line(&text);
        field.graphics.extend(graphics);
    }
}

/// One stub per test specification headline, with its mapping section
///
/// Stops at the first experiment specification headline.
pub(crate) fn find_test_specifications(view: &DocumentView) -> Vec<Record> {
    let mut stubs: Vec<Record> = Vec::new();
    let mut capture: Option<SectionCapture> = None;

    for para in view.paragraphs() {
        let summary = ParagraphSummary::of(para);
        match summary.headline() {
            Some(Headline::TestSpecification) => {
                let id = headline_id(Headline::TestSpecification, &summary.text).unwrap_or_default();
                stubs.push(Record::with_id(id));
                capture = None;
            }
            Some(Headline::ExperimentSpecification) => break,
            Some(Headline::MappingToResearchInfrastructure) => match stubs.last_mut() {
                Some(stub) => {
                    capture = SectionCapture::start(Headline::MappingToResearchInfrastructure, stub)
                }
                None => {
                    tracing::warn!("Mapping section before any test specification, ignoring it");
                    capture = None;
                }
            },
            _ => {
                if let (Some(section), Some(stub)) = (&capture, stubs.last_mut()) {
                    section.append(view, para, stub);
                }
            }
        }
    }

    stubs
}

/// One stub per experiment specification headline
pub(crate) fn find_experiment_specifications(view: &DocumentView) -> Vec<Record> {
    view.paragraphs()
        .map(ParagraphSummary::of)
        .filter(|summary| summary.is_headline(Headline::ExperimentSpecification))
        .map(|summary| {
            Record::with_id(
                headline_id(Headline::ExperimentSpecification, &summary.text).unwrap_or_default(),
            )
        })
        .collect()
}

/// Header fields of the test case, read from the paragraphs before the
/// first test specification headline
pub(crate) fn read_test_case_header(view: &DocumentView) -> Record {
    let mut record = Record::new();
    let mut capture: Option<SectionCapture> = None;

    for para in view.paragraphs() {
        let summary = ParagraphSummary::of(para);
        let headline = summary.headline();

        if headline == Some(Headline::TestCase) {
            if let Some(id) = headline_id(Headline::TestCase, &summary.text) {
                record.insert(ID_FIELD, FieldValue::new(id));
            }
        }

        for (pattern, labels) in HEADER_TEMPLATES.iter() {
            if let Some(captures) = pattern.captures(&summary.text) {
                for (group, label) in labels.iter().enumerate() {
                    let value = captures
                        .get(group + 1)
                        .map(|m| m.as_str().trim())
                        .unwrap_or_default();
                    record.insert(*label, FieldValue::new(value));
                }
            }
        }

        match headline {
            Some(Headline::TestSpecification) => break,
            Some(Headline::QualificationStrategy) => {
                capture = SectionCapture::start(Headline::QualificationStrategy, &mut record);
            }
            _ => {
                if let Some(section) = &capture {
                    section.append(view, para, &mut record);
                }
            }
        }
    }

    record
}
