//! Operator-supplied bound overrides, applied after schema load.

use crate::definition::BoundField;
use crate::table::AttributeTable;
use std::collections::BTreeMap;

/// Bound values to force onto attributes, e.g. `retraction_amount.maximum_value = 4`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundsOverrides {
    entries: BTreeMap<(String, String), f64>,
}

impl BoundsOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key.field = value`. Later inserts for the same pair win.
    pub fn insert(&mut self, key: impl Into<String>, field: impl Into<String>, value: f64) {
        self.entries.insert((key.into(), field.into()), value);
    }

    /// Record a dotted entry. Entries without a dot are ignored.
    pub fn insert_dotted(&mut self, entry: &str, value: f64) -> bool {
        match entry.rsplit_once('.') {
            Some((key, field)) if !key.is_empty() => {
                self.insert(key, field, value);
                true
            }
            _ => {
                tracing::warn!(entry, "Ignoring bound override without a field name");
                false
            }
        }
    }

    pub fn extend(&mut self, other: &BoundsOverrides) {
        for ((key, field), value) in &other.entries {
            self.insert(key.clone(), field.clone(), *value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str, field: &str) -> Option<f64> {
        self.entries.get(&(key.to_string(), field.to_string())).copied()
    }

    /// Apply onto `table`; returns how many overrides took effect.
    ///
    /// Unknown keys and unknown bound field names are skipped with a warning.
    pub fn apply(&self, table: &mut AttributeTable) -> usize {
        let mut by_key: BTreeMap<&str, Vec<(BoundField, f64)>> = BTreeMap::new();
        for ((key, field), value) in &self.entries {
            let Some(bound) = BoundField::from_field_name(field) else {
                tracing::warn!(key = %key, field = %field, "Ignoring override for unknown bound field");
                continue;
            };
            if !table.contains(key) {
                tracing::warn!(key = %key, "Ignoring bound override for unknown setting");
                continue;
            }
            by_key.entry(key.as_str()).or_default().push((bound, *value));
        }

        let applied = by_key.values().map(Vec::len).sum();
        if applied > 0 {
            table.modify(|attr| {
                if let Some(bounds) = by_key.get(attr.key.as_str()) {
                    for (field, value) in bounds {
                        attr.set_bound(*field, Some(*value));
                    }
                }
            });
        }
        tracing::debug!(applied, requested = self.entries.len(), "Applied bound overrides");
        applied
    }
}
