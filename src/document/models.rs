//! Core data structures for extracted records
//!
//! This module defines the public types produced by the extractor and consumed
//! by the workbook writer: records, their field values and embedded graphics.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Field label holding a record's identifier
pub const ID_FIELD: &str = "ID";

/// The three kinds of record found in a test description document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecordKind {
    TestCase,
    TestSpecification,
    ExperimentSpecification,
}

impl RecordKind {
    /// Name of the template sheet cloned for records of this kind
    pub fn template_sheet(self) -> &'static str {
        match self {
            RecordKind::TestCase => "Test Case",
            RecordKind::TestSpecification => "Test Specification",
            RecordKind::ExperimentSpecification => "Experiment Specification",
        }
    }

    /// Sheet title used when a record carries no ID
    pub fn fallback_title(self) -> &'static str {
        match self {
            RecordKind::TestCase => "TC1",
            RecordKind::TestSpecification => "TS1",
            RecordKind::ExperimentSpecification => "ES1",
        }
    }
}

/// An image embedded in the source document
///
/// The bytes are shared, so several fields can reference the same picture
/// without copying it.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    pub name: String,
    pub data: Arc<[u8]>,
}

impl Graphic {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl Serialize for Graphic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Graphic", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("size", &self.data.len())?;
        state.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldValue {
    pub description: String,
    pub graphics: Vec<Graphic>,
}

impl FieldValue {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            graphics: Vec::new(),
        }
    }

    pub fn with_graphics(mut self, graphics: Vec<Graphic>) -> Self {
        self.graphics = graphics;
        self
    }

    /// Append one paragraph of free text, newline separated
    pub fn push_line(&mut self, line: &str) {
        if self.description.is_empty() {
            self.description.push_str(line);
        } else {
            self.description.push('\n');
            self.description.push_str(line);
        }
    }

    pub fn has_graphics(&self) -> bool {
        !self.graphics.is_empty()
    }
}

/// A label-keyed set of fields extracted for one test case or specification
///
/// Labels keep the order in which they were first inserted; inserting an
/// existing label replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stub record that only carries an ID
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.insert(ID_FIELD, FieldValue::new(id));
        record
    }

    pub fn insert(&mut self, label: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        let label = label.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((label, value));
                None
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut FieldValue> {
        self.fields
            .iter_mut()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn id(&self) -> Option<&str> {
        self.get(ID_FIELD).map(|value| value.description.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .map(|(label, value)| (label.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (label, value) in &self.fields {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Everything extracted from one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    pub test_case: Record,
    pub test_specifications: Vec<Record>,
    pub experiment_specifications: Vec<Record>,
}

impl Extraction {
    /// All records in output order: test case first, then specifications
    pub fn records(&self) -> impl Iterator<Item = (RecordKind, &Record)> {
        std::iter::once((RecordKind::TestCase, &self.test_case))
            .chain(
                self.test_specifications
                    .iter()
                    .map(|record| (RecordKind::TestSpecification, record)),
            )
            .chain(
                self.experiment_specifications
                    .iter()
                    .map(|record| (RecordKind::ExperimentSpecification, record)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut record = Record::new();
        record.insert("Author", FieldValue::new("Jane"));
        record.insert("Date", FieldValue::new("2020"));
        let previous = record.insert("Author", FieldValue::new("John"));

        assert_eq!(previous, Some(FieldValue::new("Jane")));
        assert_eq!(record.len(), 2);
        let labels: Vec<&str> = record.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["Author", "Date"]);
        assert_eq!(record.get("Author").unwrap().description, "John");
    }

    #[test]
    fn test_push_line_joins_with_newlines() {
        let mut value = FieldValue::default();
        value.push_line("first");
        value.push_line("");
        value.push_line("third");
        assert_eq!(value.description, "first\n\nthird");
    }

    #[test]
    fn test_records_order() {
        let extraction = Extraction {
            test_case: Record::with_id("TC"),
            test_specifications: vec![Record::with_id("TS-1"), Record::with_id("TS-2")],
            experiment_specifications: vec![Record::with_id("ES-1")],
        };
        let kinds: Vec<(RecordKind, Option<&str>)> = extraction
            .records()
            .map(|(kind, record)| (kind, record.id()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (RecordKind::TestCase, Some("TC")),
                (RecordKind::TestSpecification, Some("TS-1")),
                (RecordKind::TestSpecification, Some("TS-2")),
                (RecordKind::ExperimentSpecification, Some("ES-1")),
            ]
        );
    }

    #[test]
    fn test_graphic_serializes_size_only() {
        let graphic = Graphic::new("image1.png", vec![1u8, 2, 3]);
        let json = serde_json::to_string(&graphic).unwrap();
        assert_eq!(json, r#"{"name":"image1.png","size":3}"#);
    }
}
