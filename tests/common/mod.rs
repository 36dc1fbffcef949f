//! Shared fixtures: Word documents built with docx-rs and a small HTD
//! Excel template assembled by hand
#![allow(dead_code)]

use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Placeholder text replaced by an inline picture in `with_image`
pub const IMAGE_PLACEHOLDER: &str = "@@IMAGE@@";

/// Smallest valid PNG: one transparent pixel
pub const PNG_1X1: [u8; 67] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

pub fn bold(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).bold())
}

pub fn plain(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

pub fn cell(text: &str) -> TableCell {
    TableCell::new().add_paragraph(plain(text))
}

pub fn table(rows: &[&[&str]]) -> Table {
    Table::new(
        rows.iter()
            .map(|row| TableRow::new(row.iter().map(|text| cell(text)).collect()))
            .collect(),
    )
}

pub fn docx_bytes(docx: Docx) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();
    cursor.into_inner()
}

fn read_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|index| {
            let mut file = archive.by_index(index).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

fn write_entries(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(name.as_str(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn inline_picture(relationship_id: &str) -> String {
    format!(
        r#"<w:drawing xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="9525" cy="9525"/><wp:effectExtent l="0" t="0" r="0" b="0"/><wp:docPr id="1" name="Picture 1"/><wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:nvPicPr><pic:cNvPr id="0" name="diagram.png"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{relationship_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="9525" cy="9525"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#
    )
}

fn legacy_picture(relationship_id: &str) -> String {
    format!(
        r##"<w:pict><v:shape xmlns:v="urn:schemas-microsoft-com:vml" id="_x0000_i1025" type="#_x0000_t75" style="width:1pt;height:1pt"><v:imagedata xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:id="{relationship_id}"/></v:shape></w:pict>"##
    )
}

/// Embed `png` as `word/media/<name>` and show it as a DrawingML picture
/// where the document contains `IMAGE_PLACEHOLDER`
pub fn with_image(docx: &[u8], name: &str, png: &[u8]) -> Vec<u8> {
    embed_picture(docx, name, png, inline_picture)
}

/// Like `with_image`, but as a VML `w:pict` picture
pub fn with_legacy_image(docx: &[u8], name: &str, png: &[u8]) -> Vec<u8> {
    embed_picture(docx, name, png, legacy_picture)
}

fn embed_picture(docx: &[u8], name: &str, png: &[u8], markup: fn(&str) -> String) -> Vec<u8> {
    let relationship_id = "rIdFixtureImage1";
    let placeholder = regex::Regex::new(&format!(r"<w:t[^>]*>{IMAGE_PLACEHOLDER}</w:t>")).unwrap();

    let mut entries = read_entries(docx);
    for (entry, data) in entries.iter_mut() {
        if entry == "word/document.xml" {
            let xml = String::from_utf8(data.clone()).unwrap();
            assert!(placeholder.is_match(&xml), "fixture needs an image placeholder");
            *data = placeholder
                .replace(&xml, markup(relationship_id).as_str())
                .into_owned()
                .into_bytes();
        } else if entry == "word/_rels/document.xml.rels" {
            let xml = String::from_utf8(data.clone()).unwrap();
            let relationship = format!(
                r#"<Relationship Id="{relationship_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{name}"/></Relationships>"#
            );
            *data = xml.replace("</Relationships>", &relationship).into_bytes();
        } else if entry == "[Content_Types].xml" {
            let xml = String::from_utf8(data.clone()).unwrap();
            if !xml.contains(r#"Extension="png""#) {
                *data = xml
                    .replace(
                        "</Types>",
                        r#"<Default Extension="png" ContentType="image/png"/></Types>"#,
                    )
                    .into_bytes();
            }
        }
    }
    entries.push((format!("word/media/{name}"), png.to_vec()));
    write_entries(&entries)
}

/// Template row: (row, column A, column B, style of column C)
type TemplateRow<'a> = (u32, Option<&'a str>, Option<&'a str>, Option<u32>);

/// Style index of the theme-filled section header cells
pub const THEME_STYLE: u32 = 1;

fn sheet_xml(rows: &[TemplateRow<'_>], shared: &mut Vec<String>) -> String {
    let mut data = String::new();
    let mut shared_cell = |reference: String, text: &str| {
        let index = shared.iter().position(|s| s == text).unwrap_or_else(|| {
            shared.push(text.to_string());
            shared.len() - 1
        });
        format!(r#"<c r="{reference}" t="s"><v>{index}</v></c>"#)
    };
    for (row, a, b, c_style) in rows {
        data.push_str(&format!(r#"<row r="{row}" spans="1:3">"#));
        if let Some(a) = a {
            data.push_str(&shared_cell(format!("A{row}"), a));
        }
        if let Some(b) = b {
            data.push_str(&shared_cell(format!("B{row}"), b));
        }
        if let Some(style) = c_style {
            data.push_str(&format!(r#"<c r="C{row}" s="{style}"/>"#));
        }
        data.push_str("</row>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><dimension ref="A1:C20"/><sheetViews><sheetView tabSelected="1" workbookViewId="0"/></sheetViews><cols><col min="2" max="2" width="36" customWidth="1"/><col min="3" max="3" width="80" customWidth="1"/></cols><sheetData>{data}</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#
    )
}

/// The HTD template: "Test Case", "Test Specification" and
/// "Experiment Specification" sheets with labels in column B
pub fn template_bytes() -> Vec<u8> {
    let mut shared = Vec::new();
    let sheets = [
        (
            "Test Case",
            sheet_xml(
                &[
                    (1, Some("Test Case"), None, None),
                    (2, None, Some("ID"), Some(0)),
                    (3, None, Some("Author"), Some(0)),
                    (4, None, Some("Version"), Some(0)),
                    (5, None, Some("Narrative"), Some(THEME_STYLE)),
                    (6, None, None, Some(0)),
                    (7, None, Some("Diagram reference"), Some(0)),
                    (8, None, Some("Qualification Strategy"), Some(0)),
                    (9, None, Some("Purpose of Investigation"), Some(0)),
                    (12, Some("Diagrams"), None, None),
                ],
                &mut shared,
            ),
        ),
        (
            "Test Specification",
            sheet_xml(
                &[
                    (2, None, Some("ID"), Some(0)),
                    (3, None, Some("Title of Test"), Some(0)),
                    (4, None, Some("Test Criteria"), Some(0)),
                    (6, None, Some("diagram reference"), Some(0)),
                    (7, None, Some("Mapping to Research Infrastructure"), Some(0)),
                    (9, Some("Diagrams"), None, None),
                ],
                &mut shared,
            ),
        ),
        (
            "Experiment Specification",
            sheet_xml(
                &[
                    (2, None, Some("ID"), Some(0)),
                    (3, None, Some("Title of Experiment"), Some(0)),
                    (4, None, Some("Research Infrastructure"), Some(0)),
                ],
                &mut shared,
            ),
        ),
    ];

    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
    );
    let mut declarations = String::new();
    let mut relationships = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (index, (name, _)) in sheets.iter().enumerate() {
        let n = index + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        declarations.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    content_types.push_str("</Types>");
    relationships.push_str(
        r#"<Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#,
    );

    let strings: String = shared
        .iter()
        .map(|text| format!("<si><t>{text}</t></si>"))
        .collect();

    let mut entries: Vec<(String, Vec<u8>)> = vec![
        ("[Content_Types].xml".into(), content_types.into_bytes()),
        (
            "_rels/.rels".into(),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                .to_vec(),
        ),
        (
            "xl/workbook.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><bookViews><workbookView activeTab="0"/></bookViews><sheets>{declarations}</sheets></workbook>"#
            )
            .into_bytes(),
        ),
        ("xl/_rels/workbook.xml.rels".into(), relationships.into_bytes()),
        (
            "xl/styles.xml".into(),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fills count="3"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor theme="8" tint="0.7999"/><bgColor indexed="64"/></patternFill></fill></fills><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/></cellXfs></styleSheet>"#
                .to_vec(),
        ),
        (
            "xl/sharedStrings.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{strings}</sst>"#,
                shared.len()
            )
            .into_bytes(),
        ),
    ];
    for (index, (_, xml)) in sheets.iter().enumerate() {
        entries.push((
            format!("xl/worksheets/sheet{}.xml", index + 1),
            xml.clone().into_bytes(),
        ));
    }
    write_entries(&entries)
}

pub fn write_template(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("HTD_TEMPLATE_V1.2.xlsx");
    std::fs::write(&path, template_bytes()).unwrap();
    path
}
