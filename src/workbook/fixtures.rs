//! Small in-memory templates for unit tests

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Row content: (row, column A, column B, style of column C)
pub(crate) type TemplateRow<'a> = (u32, Option<&'a str>, Option<&'a str>, Option<u32>);

fn inline(reference: &str, text: &str) -> String {
    format!(r#"<c r="{reference}" t="inlineStr"><is><t>{text}</t></is></c>"#)
}

pub(crate) fn sheet_xml(rows: &[TemplateRow<'_>]) -> String {
    let mut data = String::new();
    for (row, a, b, c_style) in rows {
        data.push_str(&format!(r#"<row r="{row}">"#));
        if let Some(a) = a {
            data.push_str(&inline(&format!("A{row}"), a));
        }
        if let Some(b) = b {
            data.push_str(&inline(&format!("B{row}"), b));
        }
        if let Some(style) = c_style {
            data.push_str(&format!(r#"<c r="C{row}" s="{style}"/>"#));
        }
        data.push_str("</row>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetViews><sheetView workbookViewId="0"/></sheetViews><sheetData>{data}</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#
    )
}

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fills count="3"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor theme="4" tint="0.5999"/><bgColor indexed="64"/></patternFill></fill></fills><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/></cellXfs></styleSheet>"#;

/// Style index of a theme-filled cell in the fixture stylesheet
pub(crate) const THEME_STYLE: u32 = 1;

/// Build an .xlsx package with the given sheets
pub(crate) fn workbook_bytes(sheets: &[(&str, String)]) -> Vec<u8> {
    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>"#,
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
    let styles_id = sheets.len() + 1;
    let calc_id = sheets.len() + 2;
    relationships.push_str(&format!(
        r#"<Relationship Id="rId{styles_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId{calc_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/></Relationships>"#
    ));
    content_types.push_str("</Types>");

    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{declarations}</sheets></workbook>"#
    );

    let mut parts: Vec<(String, String)> = vec![
        ("[Content_Types].xml".into(), content_types),
        (
            "_rels/.rels".into(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                .into(),
        ),
        ("xl/workbook.xml".into(), workbook),
        ("xl/_rels/workbook.xml.rels".into(), relationships),
        ("xl/styles.xml".into(), STYLES.into()),
        (
            "xl/calcChain.xml".into(),
            r#"<calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"/>"#.into(),
        ),
    ];
    for (index, (_, xml)) in sheets.iter().enumerate() {
        parts.push((format!("xl/worksheets/sheet{}.xml", index + 1), xml.clone()));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in parts {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// The three record templates, laid out like the real template
pub(crate) fn template_bytes() -> Vec<u8> {
    let test_case = sheet_xml(&[
        (1, Some("Test Case"), None, None),
        (2, None, Some("ID"), Some(0)),
        (3, None, Some("Author"), Some(0)),
        (4, None, Some("Version"), Some(0)),
        (5, None, Some("Narrative"), Some(THEME_STYLE)),
        (6, None, None, Some(0)),
        (7, None, Some("Diagram reference"), Some(0)),
        (8, None, Some("Purpose of Investigation"), Some(0)),
        (10, Some("Diagrams"), None, None),
    ]);
    let test_specification = sheet_xml(&[
        (2, None, Some("ID"), Some(0)),
        (3, None, Some("Title of Test"), Some(0)),
        (4, None, Some("Test Criteria"), Some(0)),
        (6, None, Some("diagram REFERENCE"), Some(0)),
        (8, Some("Diagrams"), None, None),
    ]);
    let experiment_specification = sheet_xml(&[
        (2, None, Some("ID"), Some(0)),
        (3, None, Some("Title of Experiment"), Some(0)),
        (4, None, Some("Setup"), Some(0)),
    ]);

    workbook_bytes(&[
        ("Test Case", test_case),
        ("Test Specification", test_specification),
        ("Experiment Specification", experiment_specification),
    ])
}
