//! Embedded media resolved through the document's relationship table

use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

use super::io::read_part;
use super::models::Graphic;
use crate::opc::{
    parse_relationships, part_directory, relationships_part, resolve_target, Relationship,
};

/// Image parts related to the main document, keyed by relationship id
#[derive(Debug, Clone, Default)]
pub struct MediaStore {
    images: Vec<Graphic>,
    by_id: HashMap<String, usize>,
}

impl MediaStore {
    /// Load every image the main document part has a relationship to
    pub(crate) fn read<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        document_part: &str,
        relationships: &[Relationship],
    ) -> Self {
        let mut store = MediaStore::default();
        let source_dir = part_directory(document_part);
        // Several relationship ids may point at the same part
        let mut by_path: HashMap<String, usize> = HashMap::new();

        for rel in relationships.iter().filter(|rel| rel.has_type("image")) {
            if rel.external {
                tracing::debug!("Skipping linked image {} ({})", rel.id, rel.target);
                continue;
            }

            let path = resolve_target(source_dir, &rel.target);
            if let Some(&index) = by_path.get(&path) {
                store.by_id.insert(rel.id.clone(), index);
                continue;
            }

            let Some(data) = read_part(archive, &path) else {
                tracing::warn!("Image part {path} referenced by {} is missing", rel.id);
                continue;
            };

            let name = path.rsplit('/').next().unwrap_or(&path).to_string();
            let index = store.images.len();
            store.images.push(Graphic::new(name, data));
            store.by_id.insert(rel.id.clone(), index);
            by_path.insert(path, index);
        }

        store
    }

    /// Look up the image behind a relationship id
    pub fn resolve(&self, relationship_id: &str) -> Option<&Graphic> {
        self.by_id
            .get(relationship_id)
            .and_then(|&index| self.images.get(index))
    }

    /// All distinct image parts in relationship order
    pub fn images(&self) -> &[Graphic] {
        &self.images
    }
}

/// Relationships of the main document part, empty when the part is absent
pub(crate) fn document_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    document_part: &str,
) -> Vec<Relationship> {
    read_part(archive, &relationships_part(document_part))
        .map(|data| parse_relationships(&data))
        .unwrap_or_default()
}
