//! Loader for layered printer definitions.
//!
//! A printer definition names its parent with `inherits`; the chain ends at
//! a base document holding the full attribute tree:
//!
//! ```text
//! definitions/
//!   fdmprinter.def.json        base: every attribute
//!   creality_base.def.json     inherits fdmprinter, overrides
//!   creality_ender3.def.json   inherits creality_base, overrides
//! ```

use crate::definition::AttributeDefinition;
use crate::document::{SchemaDocument, strip_suffix};
use crate::table::AttributeTable;
use crate::{Error, Result};
use serde_json::Value as Json;
use slicer_fs::DocumentStore;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Where definition documents come from.
pub trait DefinitionSource {
    /// Read the raw JSON of the definition called `name`.
    fn read(&self, name: &str) -> Result<Json>;
}

/// Definitions stored as `<dir>/<name>.def.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    store: DocumentStore,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            store: DocumentStore::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.def.json"))
    }
}

impl DefinitionSource for DirectorySource {
    fn read(&self, name: &str) -> Result<Json> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(Error::DefinitionNotFound {
                name: name.to_string(),
                path,
            });
        }
        Ok(self.store.load(&path)?)
    }
}

/// Definitions held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, Json>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, document: Json) -> Self {
        self.documents.insert(name.into(), document);
        self
    }
}

impl DefinitionSource for MemorySource {
    fn read(&self, name: &str) -> Result<Json> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| Error::DefinitionNotFound {
                name: name.to_string(),
                path: PathBuf::from(format!("{name}.def.json")),
            })
    }
}

/// Builds an [`AttributeTable`] from an inheritance chain.
pub struct SchemaLoader<S> {
    source: S,
}

impl<S: DefinitionSource> SchemaLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Follow `inherits` from `printer` to the base. Returned base first.
    pub fn resolve_chain(&self, printer: &str) -> Result<Vec<SchemaDocument>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(strip_suffix(printer).to_string());

        while let Some(name) = next {
            if !seen.insert(name.clone()) {
                let mut names: Vec<String> = chain.iter().map(|d: &SchemaDocument| d.name.clone()).collect();
                names.push(name);
                return Err(Error::InheritanceCycle { chain: names });
            }
            let json = self.source.read(&name)?;
            let document = SchemaDocument::from_json(&name, &json)?;
            tracing::debug!(definition = %name, parent = ?document.inherits, "Read definition");
            next = document.inherits.clone();
            chain.push(document);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Load the full attribute table for `printer`.
    pub fn load(&self, printer: &str) -> Result<AttributeTable> {
        let chain = self.resolve_chain(printer)?;
        let mut layers = chain.iter();
        let Some(base) = layers.next() else {
            return Ok(AttributeTable::default());
        };

        let mut attributes: BTreeMap<String, AttributeDefinition> = base
            .attributes()
            .into_iter()
            .map(|attr| (attr.key.clone(), attr))
            .collect();

        for layer in layers {
            let mut ignored = 0usize;
            for (key, change) in &layer.overrides {
                match attributes.get_mut(key) {
                    Some(attr) => change.apply(attr),
                    None => ignored += 1,
                }
            }
            tracing::debug!(
                definition = %layer.name,
                overrides = layer.overrides.len(),
                ignored,
                "Applied overrides"
            );
        }

        // Indexes are built once, after the whole chain is applied
        let table = AttributeTable::new(attributes.into_values());
        tracing::info!(
            printer = %strip_suffix(printer),
            layers = chain.len(),
            attributes = table.len(),
            "Loaded printer schema"
        );
        Ok(table)
    }
}
