//! The resolution pipeline.
//!
//! A [`SettingsEngine`] owns one loaded [`AttributeTable`] together with its
//! dependency graph, evaluation order and parsed formulas. It is immutable
//! after construction; every [`SettingsEngine::resolve`] call builds its own
//! working namespace, so one engine can serve concurrent requests.
//!
//! Resolution merges, lowest priority first: definition defaults, operator
//! config defaults, validated user overrides. Computed settings are then
//! evaluated in dependency order, G-code placeholders expanded, and values
//! equal to their definition default pruned from the emitted table.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use slicer_expr::Value;
use slicer_schema::{
    AttributeTable, BoundsOverrides, DefinitionSource, DirectorySource, SchemaLoader, SettingMatch,
    ValidationOutcome, coerce_str, resolve_setting, validate,
};

use crate::command::SCALE_KEYS;
use crate::config::SlicerConfig;
use crate::eval::{CompiledFormulas, EvaluationResult, evaluate_in_order};
use crate::graph::DependencyGraph;
use crate::template::{
    TEMPLATE_KEYS, expand_tokens, find_unknown_tokens, is_template_key, token_value,
};
use crate::Result;

/// Inputs of one resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveRequest {
    /// Operator defaults, below user overrides
    pub config_defaults: BTreeMap<String, String>,
    /// Per-request user values, highest priority
    pub overrides: BTreeMap<String, String>,
    /// Keys emitted even when equal to the definition default.
    ///
    /// Forcing only protects a key that already has a value from a config
    /// default, an override or a formula. A forced key with none of those
    /// is not emitted.
    pub forced_keys: BTreeSet<String>,
}

impl ResolveRequest {
    /// Request carrying the operator defaults and forced keys of `config`.
    pub fn from_config(config: &SlicerConfig, overrides: BTreeMap<String, String>) -> Self {
        Self {
            config_defaults: config.config_defaults(),
            overrides,
            forced_keys: config.forced_keys(),
        }
    }
}

/// Output of one resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// Flat `key -> value` table for the slicing engine
    pub emitted: BTreeMap<String, String>,
    /// Computed values and per-key formula errors
    pub evaluation: EvaluationResult,
    /// Overrides that failed validation, with the reason
    pub rejected: BTreeMap<String, String>,
    /// Accepted overrides outside a soft bound
    pub warnings: BTreeMap<String, String>,
    /// Template placeholders that could not be expanded
    pub unknown_tokens: BTreeMap<String, Vec<String>>,
}

impl Resolution {
    /// Formula errors by key.
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.evaluation.errors
    }

    /// Whether the emitted table is safe to hand to the slicing engine.
    pub fn is_ready(&self) -> bool {
        self.unknown_tokens.is_empty()
    }
}

/// Loaded definitions plus everything derived from them.
#[derive(Debug, Clone)]
pub struct SettingsEngine {
    table: AttributeTable,
    graph: DependencyGraph,
    order: Vec<String>,
    formulas: CompiledFormulas,
}

impl SettingsEngine {
    /// Analyze `table` once: dependency graph, order and parsed formulas.
    pub fn new(table: AttributeTable) -> Self {
        let graph = DependencyGraph::build(&table);
        let order = graph.topological_order();
        let formulas = CompiledFormulas::compile(&table);

        let cyclic = graph.cyclic_keys();
        if !cyclic.is_empty() {
            tracing::warn!(keys = ?cyclic, "Dependency cycle among computed settings");
        }
        let unparsable = formulas.parse_failures().count();
        if unparsable > 0 {
            tracing::warn!(count = unparsable, "Some setting formulas do not parse");
        }

        Self {
            table,
            graph,
            order,
            formulas,
        }
    }

    /// Load the definition chain for `printer` and apply operator bounds.
    pub fn load<S: DefinitionSource>(
        loader: &SchemaLoader<S>,
        printer: &str,
        bounds: &BoundsOverrides,
    ) -> Result<Self> {
        let mut table = loader.load(printer)?;
        bounds.apply(&mut table);
        Ok(Self::new(table))
    }

    /// Load the definitions named by an operator configuration.
    pub fn from_config(config: &SlicerConfig) -> Result<Self> {
        let loader = SchemaLoader::new(DirectorySource::new(config.paths.definition_dir.clone()));
        Self::load(&loader, &config.paths.printer_definition, &config.bounds())
    }

    pub fn table(&self) -> &AttributeTable {
        &self.table
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Evaluation order of the computed settings.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Validate `raw` for `key`; `None` when the key is unknown.
    pub fn validate(&self, key: &str, raw: &str) -> Option<ValidationOutcome> {
        self.table.get(key).map(|attr| validate(attr, raw))
    }

    /// Resolve a loosely typed setting name.
    pub fn find(&self, query: &str) -> SettingMatch<'_> {
        resolve_setting(&self.table, query)
    }

    /// Token namespace for placeholder expansion: definition defaults with
    /// `settings` on top.
    pub fn token_namespace(&self, settings: &BTreeMap<String, String>) -> BTreeMap<String, Value> {
        let mut namespace: BTreeMap<String, Value> = self
            .table
            .iter()
            .filter(|attr| attr.default_value != Value::None)
            .map(|attr| (attr.key.clone(), token_value(&attr.default_string())))
            .collect();
        for (key, value) in settings {
            namespace.insert(key.clone(), token_value(value));
        }
        namespace
    }

    /// Unresolvable placeholders left in an emitted table.
    ///
    /// Callers run this before invoking the slicing engine, which cannot
    /// parse an unexpanded placeholder.
    pub fn preflight(&self, emitted: &BTreeMap<String, String>) -> BTreeMap<String, Vec<String>> {
        find_unknown_tokens(emitted, &self.token_namespace(emitted))
    }

    /// Run the full pipeline for one request.
    pub fn resolve(&self, request: &ResolveRequest) -> Resolution {
        let mut resolution = Resolution::default();

        // Definition defaults
        let mut namespace: BTreeMap<String, Value> = self
            .table
            .iter()
            .map(|attr| (attr.key.clone(), attr.default_value.clone()))
            .collect();

        // Pinned values: operator defaults, then validated user overrides
        let mut pinned: BTreeMap<String, String> = BTreeMap::new();
        for (key, raw) in &request.config_defaults {
            match self.table.get(key) {
                Some(attr) => {
                    let value = coerce_str(raw, attr.value_type);
                    pinned.insert(key.clone(), value.to_string());
                    namespace.insert(key.clone(), value);
                }
                None => {
                    pinned.insert(key.clone(), raw.clone());
                }
            }
        }

        let mut overridden = BTreeSet::new();
        for (key, raw) in &request.overrides {
            let Some(attr) = self.table.get(key) else {
                tracing::debug!(key = %key, "Passing through override for unknown setting");
                pinned.insert(key.clone(), raw.clone());
                overridden.insert(key.clone());
                continue;
            };
            let outcome = validate(attr, raw);
            if !outcome.accepted {
                let reason = outcome.error.unwrap_or_default();
                tracing::debug!(key = %key, reason = %reason, "Rejected override");
                resolution.rejected.insert(key.clone(), reason);
                continue;
            }
            if let Some(warning) = outcome.warning {
                resolution.warnings.insert(key.clone(), warning);
            }
            namespace.insert(key.clone(), coerce_str(&outcome.normalized_value, attr.value_type));
            pinned.insert(key.clone(), outcome.normalized_value);
            overridden.insert(key.clone());
        }

        let pinned_keys: BTreeSet<String> = pinned.keys().cloned().collect();
        resolution.evaluation = evaluate_in_order(
            &self.table,
            &self.formulas,
            &self.order,
            &pinned_keys,
            &mut namespace,
        );

        // Computed values, then pinned values on top
        let mut emitted: BTreeMap<String, String> = resolution
            .evaluation
            .values
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();
        emitted.extend(pinned);

        // G-code must be present so its placeholders get expanded
        for key in TEMPLATE_KEYS {
            if emitted.contains_key(key) {
                continue;
            }
            if let Some(attr) = self.table.get(key).filter(|a| a.default_value != Value::None) {
                emitted.insert(key.to_string(), attr.default_string());
            }
        }

        let tokens = self.token_namespace(&emitted);
        for key in TEMPLATE_KEYS {
            if let Some(text) = emitted.get_mut(key) {
                *text = expand_tokens(text, &tokens);
            }
        }
        resolution.unknown_tokens = find_unknown_tokens(&emitted, &tokens);

        emitted.retain(|key, value| {
            if is_template_key(key) || overridden.contains(key) || request.forced_keys.contains(key) {
                return true;
            }
            match self.table.get(key) {
                Some(attr) => attr.default_string() != *value,
                None => true,
            }
        });

        // Consumed by mesh scaling before slicing
        for key in SCALE_KEYS {
            emitted.remove(key);
        }

        tracing::debug!(
            emitted = emitted.len(),
            computed = resolution.evaluation.values.len(),
            errors = resolution.evaluation.errors.len(),
            rejected = resolution.rejected.len(),
            "Resolved settings"
        );
        resolution.emitted = emitted;
        resolution
    }
}
