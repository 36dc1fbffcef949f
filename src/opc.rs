//! Open Packaging Conventions helpers shared by .docx and .xlsx handling
//!
//! Both formats are zip packages whose parts point at each other through
//! `.rels` relationship parts.

use quick_xml::events::Event;
use quick_xml::Reader;

/// One `<Relationship>` entry of a `.rels` part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Relationship types differ between transitional and strict OOXML,
    /// so only the final path segment is compared.
    pub fn has_type(&self, suffix: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(suffix)
    }
}

/// Path of the `.rels` part belonging to `part`
pub(crate) fn relationships_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Parse a `.rels` part. Malformed XML yields the entries read so far.
pub(crate) fn parse_relationships(xml: &[u8]) -> Vec<Relationship> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut rel_type = String::new();
                let mut target = None;
                let mut external = false;
                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default();
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(value),
                        b"Type" => rel_type = value,
                        b"Target" => target = Some(value),
                        b"TargetMode" => external = value.eq_ignore_ascii_case("External"),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    relationships.push(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("Error reading relationships: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    relationships
}

/// Resolve a relationship target against the directory of its source part
///
/// `source_dir` is e.g. `word` for `word/document.xml`; absolute targets
/// start at the package root.
pub(crate) fn resolve_target(source_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        source_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Directory part of a package path (`word/document.xml` -> `word`)
pub(crate) fn part_directory(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word", "media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("word", "/word/media/image2.emf"), "word/media/image2.emf");
        assert_eq!(resolve_target("word/sub", "../media/x.jpeg"), "word/media/x.jpeg");
        assert_eq!(resolve_target("xl", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn test_relationships_part() {
        assert_eq!(
            relationships_part("word/document.xml"),
            "word/_rels/document.xml.rels"
        );
        assert_eq!(relationships_part("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
    }

    #[test]
    fn test_part_directory() {
        assert_eq!(part_directory("word/document.xml"), "word");
        assert_eq!(part_directory("xl/worksheets/sheet2.xml"), "xl/worksheets");
        assert_eq!(part_directory("[Content_Types].xml"), "");
    }

    #[test]
    fn test_parse_relationships() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/a?b=1&amp;c=2" TargetMode="External"/>
</Relationships>"#;
        let rels = parse_relationships(xml);
        assert_eq!(rels.len(), 3);
        assert!(rels[1].has_type("image"));
        assert_eq!(rels[1].target, "media/image1.png");
        assert!(!rels[1].external);
        assert!(rels[2].external);
        assert_eq!(rels[2].target, "https://example.com/a?b=1&c=2");
    }

    #[test]
    fn test_has_type_ignores_namespace_flavour() {
        let rel = Relationship {
            id: "rId1".into(),
            rel_type: "http://purl.oclc.org/ooxml/officeDocument/relationships/image".into(),
            target: "media/a.png".into(),
            external: false,
        };
        assert!(rel.has_type("image"));
        assert!(!rel.has_type("worksheet"));
    }
}
