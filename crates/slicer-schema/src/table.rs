//! The flat attribute table produced by one schema load.

use crate::definition::AttributeDefinition;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Lowercase a key and turn spaces into underscores.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase().replace(' ', "_")
}

/// All attributes of a printer, keyed by attribute key.
///
/// The label and normalized-key indexes are derived data: every mutation
/// goes through [`AttributeTable::rebuild_indexes`], never a partial patch.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    attributes: BTreeMap<String, AttributeDefinition>,
    by_label: HashMap<String, String>,
    by_normalized_key: HashMap<String, String>,
}

impl AttributeTable {
    pub fn new(attributes: impl IntoIterator<Item = AttributeDefinition>) -> Self {
        let mut table = Self {
            attributes: attributes.into_iter().map(|a| (a.key.clone(), a)).collect(),
            ..Self::default()
        };
        table.rebuild_indexes();
        table
    }

    pub fn get(&self, key: &str) -> Option<&AttributeDefinition> {
        self.attributes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.attributes.values()
    }

    pub fn keys(&self) -> BTreeSet<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }

    /// Key for a display label, case-insensitively.
    pub fn key_for_label(&self, label: &str) -> Option<&str> {
        self.by_label.get(&label.to_lowercase()).map(String::as_str)
    }

    /// Key for a loosely typed key (`Layer Height` finds `layer_height`).
    pub fn key_for_normalized(&self, query: &str) -> Option<&str> {
        self.by_normalized_key
            .get(&normalize_key(query))
            .map(String::as_str)
    }

    /// Lowercased labels known to the label index.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_label.iter().map(|(l, k)| (l.as_str(), k.as_str()))
    }

    /// Apply `edit` to every attribute, then rebuild the indexes.
    pub fn modify<F>(&mut self, mut edit: F)
    where
        F: FnMut(&mut AttributeDefinition),
    {
        self.attributes.values_mut().for_each(&mut edit);
        self.rebuild_indexes();
    }

    /// Apply `edit` to one attribute if present. Returns whether it existed.
    pub fn modify_one<F>(&mut self, key: &str, edit: F) -> bool
    where
        F: FnOnce(&mut AttributeDefinition),
    {
        let Some(attr) = self.attributes.get_mut(key) else {
            return false;
        };
        edit(attr);
        self.rebuild_indexes();
        true
    }

    /// Recompute both indexes from scratch.
    pub fn rebuild_indexes(&mut self) {
        self.by_label.clear();
        self.by_normalized_key.clear();
        for (key, attr) in &self.attributes {
            // Later keys win on duplicate labels, matching key order
            self.by_label.insert(attr.label.to_lowercase(), key.clone());
            self.by_normalized_key.insert(normalize_key(key), key.clone());
        }
    }
}
