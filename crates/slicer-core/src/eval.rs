//! Batch evaluation of value formulas in dependency order.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use slicer_expr::{Expr, Value, eval_expr, parse};
use slicer_schema::{AttributeTable, coerce_value};

/// Outcome of one evaluation pass over the computed settings.
///
/// Every computed setting that was not pinned lands in exactly one of the
/// two maps. Settings without a formula appear in neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Computed values, already coerced to each setting's declared type.
    #[serde(serialize_with = "serialize_values")]
    pub values: BTreeMap<String, Value>,
    /// Error message per setting whose formula failed.
    pub errors: BTreeMap<String, String>,
}

fn serialize_values<S>(values: &BTreeMap<String, Value>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(values.len()))?;
    for (key, value) in values {
        map.serialize_entry(key, &value.to_json())?;
    }
    map.end()
}

/// Parsed formulas for every computed setting in a table.
///
/// A formula that fails to parse keeps its error message so every run
/// reports it against the setting.
#[derive(Debug, Clone, Default)]
pub struct CompiledFormulas {
    formulas: BTreeMap<String, Result<Expr, String>>,
}

impl CompiledFormulas {
    /// Parse every formula in `table` once.
    pub fn compile(table: &AttributeTable) -> Self {
        let formulas = table
            .iter()
            .filter_map(|attr| {
                let source = attr.value_expression.as_deref()?;
                let parsed = parse(source).map_err(|e| {
                    tracing::debug!(key = %attr.key, error = %e, "Formula does not parse");
                    e.to_string()
                });
                Some((attr.key.clone(), parsed))
            })
            .collect();
        Self { formulas }
    }

    /// Number of formulas, parsed or not.
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    /// Whether the table had no formulas.
    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Formulas whose source failed to parse, with the parse message.
    pub fn parse_failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.formulas.iter().filter_map(|(key, parsed)| match parsed {
            Ok(_) => None,
            Err(message) => Some((key.as_str(), message.as_str())),
        })
    }

    fn get(&self, key: &str) -> Option<&Result<Expr, String>> {
        self.formulas.get(key)
    }
}

/// Evaluate the formulas of `order` against `namespace`, skipping `pinned`.
///
/// Each success is coerced to the setting's type and written back so later
/// keys see it. Failures are recorded and leave the namespace untouched;
/// they never stop the rest of the batch.
pub fn evaluate_in_order(
    table: &AttributeTable,
    formulas: &CompiledFormulas,
    order: &[String],
    pinned: &BTreeSet<String>,
    namespace: &mut BTreeMap<String, Value>,
) -> EvaluationResult {
    let mut result = EvaluationResult::default();
    let mut computed = Vec::new();

    for key in order {
        if pinned.contains(key) {
            continue;
        }
        let (Some(attr), Some(parsed)) = (table.get(key), formulas.get(key)) else {
            continue;
        };
        let outcome = match parsed {
            Ok(expr) => eval_expr(expr, &*namespace).map_err(|e| e.to_string()),
            Err(message) => Err(message.clone()),
        };
        match outcome {
            Ok(value) => {
                let value = coerce_value(value, attr.value_type);
                tracing::trace!(key = %key, value = %value, "Evaluated formula");
                namespace.insert(key.clone(), value);
                computed.push(key);
            }
            Err(message) => {
                tracing::debug!(key = %key, error = %message, "Formula evaluation failed");
                result.errors.insert(key.clone(), message);
            }
        }
    }

    for key in computed {
        if let Some(value) = namespace.get(key) {
            result.values.insert(key.clone(), value.clone());
        }
    }
    result
}
