//! Where quiz templates come from.
//!
//! A [`TemplateStore`] lists and loads templates; a [`TemplateCatalog`] is
//! the loaded, immutable set the registry instantiates sessions from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use livequiz_protocol::SessionTemplate;

use crate::TemplateError;

/// A source of quiz templates.
pub trait TemplateStore {
    /// Names of every template this store can load.
    fn list_templates(&self) -> Vec<String>;

    /// Loads one template by name.
    fn load_template(&self, name: &str) -> Result<SessionTemplate, TemplateError>;
}

/// Templates stored as `<name>.json` files in one directory.
///
/// The file stem is the template's name. Any `name` in the JSON is
/// replaced by it, so the key a host creates with is the name every
/// snapshot reports.
#[derive(Debug, Clone)]
pub struct DirTemplateStore {
    dir: PathBuf,
}

impl DirTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl TemplateStore for DirTemplateStore {
    fn list_templates(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "cannot read template directory");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    fn load_template(&self, name: &str) -> Result<SessionTemplate, TemplateError> {
        let path = self.path_for(name);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound(name.to_string()));
            }
            Err(source) => return Err(TemplateError::Io { path, source }),
        };

        let mut template: SessionTemplate =
            serde_json::from_str(&raw).map_err(|source| TemplateError::Parse {
                path: path.clone(),
                source,
            })?;
        if template.name != name {
            if !template.name.is_empty() {
                tracing::debug!(template = %name, declared = %template.name, "template name replaced by file stem");
            }
            template.name = name.to_string();
        }
        Ok(template)
    }
}

/// The loaded set of templates, keyed by name.
///
/// Immutable once built. Replacing the catalog in the registry never
/// touches sessions already running.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, Arc<SessionTemplate>>,
}

impl TemplateCatalog {
    /// Loads every template `store` lists. Templates that fail to load are
    /// logged and left out.
    pub fn load(store: &impl TemplateStore) -> Self {
        let mut templates = BTreeMap::new();
        for name in store.list_templates() {
            match store.load_template(&name) {
                Ok(template) => {
                    tracing::debug!(
                        template = %name,
                        questions = template.question_count(),
                        "template loaded"
                    );
                    templates.insert(name, Arc::new(template));
                }
                Err(e) => {
                    tracing::warn!(template = %name, error = %e, "template skipped");
                }
            }
        }
        tracing::info!(templates = templates.len(), "template catalog loaded");
        Self { templates }
    }

    /// Builds a catalog from in-memory templates, keyed by their `name`.
    pub fn from_templates(templates: impl IntoIterator<Item = SessionTemplate>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|t| (t.name.clone(), Arc::new(t)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<SessionTemplate>> {
        self.templates.get(name).cloned()
    }

    /// Template names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
