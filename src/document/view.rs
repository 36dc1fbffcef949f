//! Read-only view over a parsed .docx file
//!
//! Combines the docx-rs body tree with the package data docx-rs leaves out:
//! numbering definitions and the images behind relationship ids.

use std::path::Path;

use super::io::{document_part_or_default, open_docx_archive, read_part};
use super::media::{document_relationships, MediaStore};
use super::models::Graphic;
use super::parsing::numbering::NumberingDefinitions;
use crate::error::DocumentError;
use crate::opc::{part_directory, resolve_target};

pub struct DocumentView {
    docx: docx_rs::Docx,
    numberings: NumberingDefinitions,
    media: MediaStore,
}

/// Relationship ids of embedded pictures, in the order they are collected
#[derive(Debug, Default)]
struct ImageReferences {
    /// DrawingML `a:blip r:embed`
    drawings: Vec<String>,
    /// Legacy VML `v:imagedata r:id`
    legacy: Vec<String>,
}

impl ImageReferences {
    fn collect_paragraph(&mut self, para: &docx_rs::Paragraph) {
        self.collect_children(&para.children);
    }

    fn collect_children(&mut self, children: &[docx_rs::ParagraphChild]) {
        for child in children {
            match child {
                docx_rs::ParagraphChild::Run(run) => self.collect_run(run),
                docx_rs::ParagraphChild::Hyperlink(hyperlink) => {
                    self.collect_children(&hyperlink.children)
                }
                docx_rs::ParagraphChild::Insert(insert) => {
                    for child in &insert.children {
                        if let docx_rs::InsertChild::Run(run) = child {
                            self.collect_run(run);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_run(&mut self, run: &docx_rs::Run) {
        for child in &run.children {
            match child {
                docx_rs::RunChild::Drawing(drawing) => {
                    if let Some(docx_rs::DrawingData::Pic(pic)) = &drawing.data {
                        self.drawings.push(pic.id.clone());
                    }
                }
                docx_rs::RunChild::Shape(shape) => {
                    if let Some(image_data) = &shape.image_data {
                        self.legacy.push(image_data.id.clone());
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_cell(&mut self, cell: &docx_rs::TableCell) {
        for content in &cell.children {
            match content {
                docx_rs::TableCellContent::Paragraph(para) => self.collect_paragraph(para),
                docx_rs::TableCellContent::Table(table) => self.collect_table(table),
                _ => {}
            }
        }
    }

    fn collect_table(&mut self, table: &docx_rs::Table) {
        for row in &table.rows {
            let docx_rs::TableChild::TableRow(row) = row;
            for cell in &row.cells {
                let docx_rs::TableRowChild::TableCell(cell) = cell;
                self.collect_cell(cell);
            }
        }
    }

    fn ids(&self) -> impl Iterator<Item = &str> {
        self.drawings
            .iter()
            .chain(self.legacy.iter())
            .map(String::as_str)
    }
}

impl DocumentView {
    /// Read and parse a .docx file
    pub fn open(file_path: &Path) -> Result<Self, DocumentError> {
        if !super::io::has_docx_extension(file_path) {
            tracing::debug!(
                "{} has no .docx extension, trying to read it anyway",
                file_path.display()
            );
        }
        let bytes = std::fs::read(file_path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut archive = open_docx_archive(bytes)?;
        let docx = docx_rs::read_docx(bytes)?;

        let document_part = document_part_or_default(&mut archive);
        let relationships = document_relationships(&mut archive, &document_part);

        let numberings = relationships
            .iter()
            .find(|rel| rel.has_type("numbering") && !rel.external)
            .map(|rel| resolve_target(part_directory(&document_part), &rel.target))
            .and_then(|path| read_part(&mut archive, &path))
            .map(|xml| NumberingDefinitions::parse(&xml))
            .unwrap_or_default();

        let media = MediaStore::read(&mut archive, &document_part, &relationships);

        Ok(Self {
            docx,
            numberings,
            media,
        })
    }

    /// Top-level body paragraphs in document order
    pub fn paragraphs(&self) -> impl Iterator<Item = &docx_rs::Paragraph> {
        self.docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                docx_rs::DocumentChild::Paragraph(para) => {
                    let para: &docx_rs::Paragraph = para;
                    Some(para)
                }
                _ => None,
            })
    }

    /// All tables in document order, including tables nested in cells
    pub fn tables(&self) -> Vec<&docx_rs::Table> {
        let mut tables = Vec::new();
        for child in &self.docx.document.children {
            if let docx_rs::DocumentChild::Table(table) = child {
                push_table_tree(table, &mut tables);
            }
        }
        tables
    }

    pub fn numberings(&self) -> &NumberingDefinitions {
        &self.numberings
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Images embedded in a paragraph
    pub fn paragraph_graphics(&self, para: &docx_rs::Paragraph) -> Vec<Graphic> {
        let mut refs = ImageReferences::default();
        refs.collect_paragraph(para);
        self.resolve(&refs)
    }

    /// Images embedded anywhere inside a cell, nested tables included
    pub fn cell_graphics(&self, cell: &docx_rs::TableCell) -> Vec<Graphic> {
        let mut refs = ImageReferences::default();
        refs.collect_cell(cell);
        self.resolve(&refs)
    }

    fn resolve(&self, refs: &ImageReferences) -> Vec<Graphic> {
        refs.ids()
            .filter_map(|id| {
                let graphic = self.media.resolve(id);
                if graphic.is_none() {
                    tracing::debug!("Unresolved image relationship {id}");
                }
                graphic.cloned()
            })
            .collect()
    }
}

fn push_table_tree<'a>(table: &'a docx_rs::Table, tables: &mut Vec<&'a docx_rs::Table>) {
    tables.push(table);
    for row in &table.rows {
        let docx_rs::TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                if let docx_rs::TableCellContent::Table(nested) = content {
                    push_table_tree(nested, tables);
                }
            }
        }
    }
}
