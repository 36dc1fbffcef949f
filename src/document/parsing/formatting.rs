//! Text extraction and formatting utilities
//!
//! This module handles extraction of text and formatting information
//! from docx-rs paragraph and run elements.

use super::numbering::NumberingDefinitions;

/// Extract plain text from a paragraph, handling various child elements
pub(crate) fn extract_paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    push_children_text(&para.children, &mut text);
    text
}

fn push_children_text(children: &[docx_rs::ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            docx_rs::ParagraphChild::Run(run) => {
                text.push_str(&extract_run_text(run));
            }
            docx_rs::ParagraphChild::Hyperlink(hyperlink) => {
                push_children_text(&hyperlink.children, text);
            }
            docx_rs::ParagraphChild::Insert(insert) => {
                for child in &insert.children {
                    if let docx_rs::InsertChild::Run(run) = child {
                        text.push_str(&extract_run_text(run));
                    }
                }
            }
            docx_rs::ParagraphChild::Delete(_) => {
                // Skip deletions (track changes)
            }
            _ => {}
        }
    }
}

/// Extract text from a run using docx-rs features
pub(crate) fn extract_run_text(run: &docx_rs::Run) -> String {
    let mut text = String::new();

    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(text_elem) => {
                text.push_str(&text_elem.text);
            }
            docx_rs::RunChild::Tab(_) => {
                text.push('\t');
            }
            docx_rs::RunChild::Break(_) => {
                // Break types are private, so every break becomes a line break
                text.push('\n');
            }
            _ => {}
        }
    }

    text
}

/// Paragraph text with its list prefix, e.g. `"    - item"`
pub(crate) fn list_formatted_text(
    para: &docx_rs::Paragraph,
    numberings: &NumberingDefinitions,
) -> String {
    let text = extract_paragraph_text(para);
    match numberings.list_info(para) {
        Some(info) => info.prefix() + &text,
        None => text,
    }
}

/// Whether a run carries direct bold formatting
pub(crate) fn is_run_bold(run: &docx_rs::Run) -> bool {
    match &run.run_property.bold {
        // The bold value is private; read it through debug formatting
        // the same way colours are read
        Some(bold) => !format!("{bold:?}").contains("false"),
        None => false,
    }
}

/// Bold flags of the paragraph's direct runs, in order
pub(crate) fn run_boldness(para: &docx_rs::Paragraph) -> Vec<bool> {
    para.children
        .iter()
        .filter_map(|child| match child {
            docx_rs::ParagraphChild::Run(run) => Some(is_run_bold(run)),
            _ => None,
        })
        .collect()
}
