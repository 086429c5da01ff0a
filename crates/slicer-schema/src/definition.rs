//! One attribute of a printer definition.

use serde::{Deserialize, Serialize};
use slicer_expr::Value;
use std::fmt;

/// Declared type of an attribute.
///
/// Definition documents use more types than these (`polygon`, `extruder`,
/// `[int]`, ...); those have no runtime representation and are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Float,
    Int,
    Bool,
    Enum,
    Str,
}

impl ValueType {
    /// Map a document `type` field to a value type.
    pub fn from_schema(name: &str) -> Option<ValueType> {
        match name {
            "float" => Some(ValueType::Float),
            "int" => Some(ValueType::Int),
            "bool" => Some(ValueType::Bool),
            "enum" => Some(ValueType::Enum),
            "str" => Some(ValueType::Str),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Enum => "enum",
            ValueType::Str => "str",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Float | ValueType::Int)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four numeric bound fields an attribute may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoundField {
    Minimum,
    Maximum,
    MinimumWarning,
    MaximumWarning,
}

impl BoundField {
    pub const ALL: [BoundField; 4] = [
        BoundField::Minimum,
        BoundField::Maximum,
        BoundField::MinimumWarning,
        BoundField::MaximumWarning,
    ];

    /// Field name as written in definition documents and config files.
    pub fn field_name(self) -> &'static str {
        match self {
            BoundField::Minimum => "minimum_value",
            BoundField::Maximum => "maximum_value",
            BoundField::MinimumWarning => "minimum_value_warning",
            BoundField::MaximumWarning => "maximum_value_warning",
        }
    }

    pub fn from_field_name(name: &str) -> Option<BoundField> {
        BoundField::ALL.into_iter().find(|b| b.field_name() == name)
    }
}

/// A single typed setting.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefinition {
    pub key: String,
    pub label: String,
    pub description: String,
    pub value_type: ValueType,
    /// Default coerced to `value_type`; `Value::None` when the document has none
    pub default_value: Value,
    pub unit: Option<String>,
    pub minimum_value: Option<f64>,
    pub maximum_value: Option<f64>,
    pub minimum_value_warning: Option<f64>,
    pub maximum_value_warning: Option<f64>,
    /// Enum option key to display label, in document order
    pub options: Vec<(String, String)>,
    pub category: String,
    /// Formula computing the effective value, if any
    pub value_expression: Option<String>,
}

impl AttributeDefinition {
    /// A bare attribute with no bounds, options or formula.
    pub fn new(key: impl Into<String>, value_type: ValueType, default_value: Value) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            description: String::new(),
            value_type,
            default_value: crate::coerce::coerce_value(default_value, value_type),
            unit: None,
            minimum_value: None,
            maximum_value: None,
            minimum_value_warning: None,
            maximum_value_warning: None,
            options: Vec::new(),
            category: String::new(),
            value_expression: None,
        }
    }

    pub fn bound(&self, field: BoundField) -> Option<f64> {
        match field {
            BoundField::Minimum => self.minimum_value,
            BoundField::Maximum => self.maximum_value,
            BoundField::MinimumWarning => self.minimum_value_warning,
            BoundField::MaximumWarning => self.maximum_value_warning,
        }
    }

    pub fn set_bound(&mut self, field: BoundField, value: Option<f64>) {
        let slot = match field {
            BoundField::Minimum => &mut self.minimum_value,
            BoundField::Maximum => &mut self.maximum_value,
            BoundField::MinimumWarning => &mut self.minimum_value_warning,
            BoundField::MaximumWarning => &mut self.maximum_value_warning,
        };
        *slot = value;
    }

    /// Canonical text of the default, compared against resolved values when pruning.
    pub fn default_string(&self) -> String {
        self.default_value.to_string()
    }

    /// Display label for an enum option key.
    pub fn option_label(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, label)| label.as_str())
    }

    pub fn has_expression(&self) -> bool {
        self.value_expression.is_some()
    }

    // Builder-style setters used by fixtures and tests

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_bounds(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum_value = minimum;
        self.maximum_value = maximum;
        self
    }

    pub fn with_warning_bounds(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum_value_warning = minimum;
        self.maximum_value_warning = maximum;
        self
    }

    pub fn with_options<K, L>(mut self, options: impl IntoIterator<Item = (K, L)>) -> Self
    where
        K: Into<String>,
        L: Into<String>,
    {
        self.options = options.into_iter().map(|(k, l)| (k.into(), l.into())).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.value_expression = Some(expression.into());
        self
    }
}
