//! Parsing of one definition document into a typed tree.
//!
//! A base document carries the whole attribute tree under `settings`:
//!
//! ```json
//! {
//!   "name": "FFF printer",
//!   "settings": {
//!     "resolution": {
//!       "label": "Quality",
//!       "type": "category",
//!       "children": {
//!         "layer_height": { "label": "Layer Height", "type": "float", "default_value": 0.1 }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Child documents name their parent with `inherits` and adjust existing
//! attributes through an `overrides` map.

use crate::coerce::coerce_value;
use crate::definition::{AttributeDefinition, BoundField, ValueType};
use crate::{Error, Result};
use serde_json::{Map, Value as Json};
use slicer_expr::Value;

/// One node of the nested attribute tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Organizational grouping; its label becomes the children's category
    Category { label: String, children: Vec<SchemaNode> },
    Attribute {
        definition: Box<AttributeDefinition>,
        children: Vec<SchemaNode>,
    },
    /// A node with no runtime representation; children may still be attributes
    Opaque { key: String, children: Vec<SchemaNode> },
}

impl SchemaNode {
    fn children(&self) -> &[SchemaNode] {
        match self {
            SchemaNode::Category { children, .. }
            | SchemaNode::Attribute { children, .. }
            | SchemaNode::Opaque { children, .. } => children,
        }
    }

    /// Flatten a forest of nodes into attributes, parents before children.
    pub fn flatten(nodes: &[SchemaNode]) -> Vec<AttributeDefinition> {
        let mut out = Vec::new();
        for node in nodes {
            node.flatten_into(&mut out);
        }
        out
    }

    fn flatten_into(&self, out: &mut Vec<AttributeDefinition>) {
        if let SchemaNode::Attribute { definition, .. } = self {
            out.push(definition.as_ref().clone());
        }
        for child in self.children() {
            child.flatten_into(out);
        }
    }
}

/// Per-key changes a child document makes to an inherited attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeOverride {
    pub default_value: Option<Value>,
    /// Each present bound field; `None` when the bound is a formula
    pub bounds: Vec<(BoundField, Option<f64>)>,
    pub value_expression: Option<String>,
}

impl AttributeOverride {
    fn parse(entry: &Map<String, Json>) -> Self {
        Self {
            default_value: entry.get("default_value").map(Value::from_json),
            bounds: BoundField::ALL
                .into_iter()
                .filter_map(|field| entry.get(field.field_name()).map(|raw| (field, parse_bound(raw))))
                .collect(),
            value_expression: entry.get("value").and_then(expression_text),
        }
    }

    /// Apply onto an existing attribute. Only defaults, bounds and the formula change.
    pub fn apply(&self, attr: &mut AttributeDefinition) {
        if let Some(default) = &self.default_value {
            attr.default_value = coerce_value(default.clone(), attr.value_type);
        }
        for (field, bound) in &self.bounds {
            attr.set_bound(*field, *bound);
        }
        if let Some(expr) = &self.value_expression {
            attr.value_expression = Some(expr.clone());
        }
    }
}

/// A parsed definition document.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    pub name: String,
    pub inherits: Option<String>,
    pub settings: Vec<SchemaNode>,
    pub overrides: Vec<(String, AttributeOverride)>,
}

impl SchemaDocument {
    /// Parse a document's JSON. Malformed attribute entries are skipped.
    pub fn from_json(name: &str, json: &Json) -> Result<Self> {
        let root = json.as_object().ok_or_else(|| Error::InvalidDefinition {
            name: name.to_string(),
            message: "document root is not an object".to_string(),
        })?;

        let inherits = match root.get("inherits") {
            None | Some(Json::Null) => None,
            Some(Json::String(parent)) => Some(strip_suffix(parent).to_string()),
            Some(other) => {
                return Err(Error::InvalidDefinition {
                    name: name.to_string(),
                    message: format!("'inherits' must be a string, found {other}"),
                });
            }
        };

        let settings = match root.get("settings") {
            Some(Json::Object(tree)) => parse_nodes(tree, ""),
            _ => Vec::new(),
        };

        let overrides = match root.get("overrides") {
            Some(Json::Object(entries)) => entries
                .iter()
                .filter_map(|(key, entry)| match entry.as_object() {
                    Some(entry) => Some((key.clone(), AttributeOverride::parse(entry))),
                    None => {
                        tracing::warn!(document = name, key = %key, "Skipping malformed override");
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            name: name.to_string(),
            inherits,
            settings,
            overrides,
        })
    }

    /// All attributes defined by this document's tree.
    pub fn attributes(&self) -> Vec<AttributeDefinition> {
        SchemaNode::flatten(&self.settings)
    }
}

/// Drop a trailing `.def.json` from a definition identifier.
pub(crate) fn strip_suffix(name: &str) -> &str {
    name.strip_suffix(".def.json").unwrap_or(name)
}

fn parse_nodes(tree: &Map<String, Json>, category: &str) -> Vec<SchemaNode> {
    tree.iter()
        .filter_map(|(key, node)| match node.as_object() {
            Some(node) => Some(parse_node(key, node, category)),
            None => {
                tracing::warn!(key = %key, "Skipping non-object schema entry");
                None
            }
        })
        .collect()
}

fn parse_node(key: &str, node: &Map<String, Json>, category: &str) -> SchemaNode {
    let node_type = node.get("type").and_then(Json::as_str).unwrap_or_default();

    if node_type == "category" {
        let label = node.get("label").and_then(Json::as_str).unwrap_or(key).to_string();
        let children = child_nodes(node, &label);
        return SchemaNode::Category { label, children };
    }

    let children = child_nodes(node, category);
    let Some(value_type) = ValueType::from_schema(node_type) else {
        return SchemaNode::Opaque {
            key: key.to_string(),
            children,
        };
    };

    match parse_attribute(key, value_type, node, category) {
        Ok(definition) => SchemaNode::Attribute {
            definition: Box::new(definition),
            children,
        },
        Err(reason) => {
            tracing::warn!(key = %key, reason = %reason, "Skipping malformed attribute");
            SchemaNode::Opaque {
                key: key.to_string(),
                children,
            }
        }
    }
}

fn child_nodes(node: &Map<String, Json>, category: &str) -> Vec<SchemaNode> {
    match node.get("children") {
        Some(Json::Object(children)) => parse_nodes(children, category),
        _ => Vec::new(),
    }
}

fn parse_attribute(
    key: &str,
    value_type: ValueType,
    node: &Map<String, Json>,
    category: &str,
) -> std::result::Result<AttributeDefinition, String> {
    let text = |field: &str| -> std::result::Result<Option<String>, String> {
        match node.get(field) {
            None | Some(Json::Null) => Ok(None),
            Some(Json::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(format!("'{field}' must be a string, found {other}")),
        }
    };

    let options = match node.get("options") {
        None | Some(Json::Null) => Vec::new(),
        Some(Json::Object(map)) => map
            .iter()
            .map(|(k, label)| {
                let label = label.as_str().map(str::to_string).unwrap_or_else(|| label.to_string());
                (k.clone(), label)
            })
            .collect(),
        Some(other) => return Err(format!("'options' must be an object, found {other}")),
    };

    let mut attr = AttributeDefinition::new(
        key,
        value_type,
        node.get("default_value").map(Value::from_json).unwrap_or(Value::None),
    );
    attr.label = text("label")?.unwrap_or_else(|| key.to_string());
    attr.description = text("description")?.unwrap_or_default();
    attr.unit = text("unit")?.filter(|u| !u.is_empty());
    for field in BoundField::ALL {
        attr.set_bound(field, node.get(field.field_name()).and_then(parse_bound));
    }
    attr.options = options;
    attr.category = category.to_string();
    attr.value_expression = node.get("value").and_then(expression_text);
    Ok(attr)
}

/// A bound is kept only when it is a constant number.
pub(crate) fn parse_bound(raw: &Json) -> Option<f64> {
    match raw {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// Formula text of a `value` field. Constants become literal formulas.
fn expression_text(raw: &Json) -> Option<String> {
    match raw {
        Json::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(true) => Some("True".to_string()),
        Json::Bool(false) => Some("False".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn base() -> Json {
        json!({
            "name": "base",
            "settings": {
                "machine_settings": {
                    "label": "Machine",
                    "type": "category",
                    "children": {
                        "machine_width": {
                            "label": "Machine Width",
                            "type": "float",
                            "default_value": 220,
                            "unit": "mm",
                            "minimum_value": "0.001"
                        },
                        "machine_disallowed_areas": {
                            "type": "polygons",
                            "default_value": [],
                            "children": {
                                "nested_setting": { "type": "int", "default_value": 3 }
                            }
                        }
                    }
                },
                "resolution": {
                    "label": "Quality",
                    "type": "category",
                    "children": {
                        "layer_height": {
                            "label": "Layer Height",
                            "type": "float",
                            "default_value": 0.1,
                            "maximum_value": "machine_nozzle_size * 0.8",
                            "children": {
                                "layer_height_0": {
                                    "label": "Initial Layer Height",
                                    "type": "float",
                                    "default_value": 0.3,
                                    "value": "layer_height * 1.5"
                                }
                            }
                        },
                        "broken": { "type": "enum", "options": ["a", "b"] }
                    }
                }
            }
        })
    }

    #[test]
    fn flattens_nested_tree_with_categories() {
        let doc = SchemaDocument::from_json("base", &base()).unwrap();
        let attrs = doc.attributes();
        let keys: Vec<&str> = attrs.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["machine_width", "nested_setting", "layer_height", "layer_height_0"]);

        let nested = &attrs[1];
        assert_eq!(nested.category, "Machine");
        assert_eq!(nested.label, "nested_setting");

        let initial = &attrs[3];
        assert_eq!(initial.category, "Quality");
        assert_eq!(initial.value_expression.as_deref(), Some("layer_height * 1.5"));
    }

    #[test]
    fn bounds_keep_constants_and_drop_formulas() {
        let doc = SchemaDocument::from_json("base", &base()).unwrap();
        let attrs = doc.attributes();
        assert_eq!(attrs[0].minimum_value, Some(0.001));
        assert_eq!(attrs[0].default_value, Value::Float(220.0));
        assert_eq!(attrs[2].maximum_value, None);
    }

    #[test]
    fn overrides_parse_defaults_bounds_and_value() {
        let doc = SchemaDocument::from_json(
            "child",
            &json!({
                "inherits": "base.def.json",
                "overrides": {
                    "machine_width": { "default_value": 235, "maximum_value": 300, "minimum_value": "x * 2" },
                    "layer_height_0": { "value": "layer_height" },
                    "bogus": 5
                }
            }),
        )
        .unwrap();

        assert_eq!(doc.inherits.as_deref(), Some("base"));
        assert_eq!(doc.overrides.len(), 2);

        let (key, width) = &doc.overrides[0];
        assert_eq!(key, "machine_width");
        assert_eq!(width.default_value, Some(Value::Int(235)));
        assert_eq!(
            width.bounds,
            vec![(BoundField::Minimum, None), (BoundField::Maximum, Some(300.0))]
        );
    }

    #[test]
    fn override_apply_coerces_default() {
        let mut attr = AttributeDefinition::new("machine_width", ValueType::Float, Value::Float(220.0));
        AttributeOverride {
            default_value: Some(Value::Int(235)),
            bounds: vec![(BoundField::Maximum, Some(300.0))],
            value_expression: None,
        }
        .apply(&mut attr);
        assert_eq!(attr.default_value, Value::Float(235.0));
        assert_eq!(attr.maximum_value, Some(300.0));
    }

    #[test]
    fn non_object_root_is_invalid() {
        let err = SchemaDocument::from_json("bad", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));
    }
}
