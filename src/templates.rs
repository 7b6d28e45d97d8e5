//! Catalog of captioning templates the renderer knows about.

use crate::errors::CatalogError;
use crate::models::MemeTemplate;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<MemeTemplate>,
    by_id: HashMap<String, usize>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<MemeTemplate>) -> Self {
        let by_id = templates
            .iter()
            .enumerate()
            .map(|(pos, t)| (t.id.clone(), pos))
            .collect();
        Self { templates, by_id }
    }

    /// Reads a JSON array of templates from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let templates: Vec<MemeTemplate> =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        tracing::info!(path = %path.display(), templates = templates.len(), "Loaded template catalog");
        Ok(Self::new(templates))
    }

    pub fn get(&self, id: &str) -> Option<&MemeTemplate> {
        self.by_id.get(id).map(|&pos| &self.templates[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn templates(&self) -> &[MemeTemplate] {
        &self.templates
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
