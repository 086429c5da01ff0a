//! Schema loading from definition files on disk.

use pretty_assertions::assert_eq;
use serde_json::json;
use slicer_expr::Value;
use slicer_schema::{DirectorySource, Error, SchemaLoader, ValueType, resolve_setting, validate_key};
use slicer_test_utils::{DefinitionDir, FIXTURE_PRINTER};

fn load_fixture() -> slicer_schema::AttributeTable {
    let defs = DefinitionDir::with_fixture_chain();
    SchemaLoader::new(DirectorySource::new(defs.path()))
        .load(FIXTURE_PRINTER)
        .unwrap()
}

#[test]
fn test_fixture_chain_loads_base_first() {
    let defs = DefinitionDir::with_fixture_chain();
    let loader = SchemaLoader::new(DirectorySource::new(defs.path()));
    let names: Vec<String> = loader
        .resolve_chain(FIXTURE_PRINTER)
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["fdmprinter", "creality_base", "creality_ender3"]);
}

#[test]
fn test_most_specific_override_wins() {
    let table = load_fixture();
    let width = table.get("machine_width").unwrap();
    assert_eq!(width.default_value, Value::Float(235.0));
    assert_eq!(width.unit.as_deref(), Some("mm"));
    assert_eq!(width.category, "Machine");

    assert_eq!(table.get("machine_height").unwrap().default_value, Value::Float(250.0));
    assert_eq!(table.get("retraction_amount").unwrap().default_value, Value::Float(5.0));
}

#[test]
fn test_formula_bounds_are_absent() {
    let table = load_fixture();
    let layer = table.get("layer_height").unwrap();
    assert_eq!(layer.minimum_value, Some(0.001));
    assert_eq!(layer.minimum_value_warning, Some(0.04));
    assert_eq!(layer.maximum_value_warning, None);

    // A child layer replaced a constant with a formula
    assert_eq!(table.get("speed_print").unwrap().maximum_value_warning, None);
    assert_eq!(table.get("material_bed_temperature").unwrap().maximum_value, Some(110.0));
}

#[test]
fn test_child_layer_injects_value_expression() {
    let table = load_fixture();
    assert_eq!(
        table.get("speed_wall").unwrap().value_expression.as_deref(),
        Some("speed_print * 0.5")
    );
}

#[test]
fn test_unrepresentable_nodes_and_unknown_overrides_are_skipped() {
    let table = load_fixture();
    assert!(!table.contains("machine_disallowed_areas"));
    assert!(!table.contains("machine_nonexistent_setting"));
    assert!(!table.contains("machine_settings"));
}

#[test]
fn test_nested_children_are_flattened() {
    let table = load_fixture();
    let walls = table.get("wall_line_count").unwrap();
    assert_eq!(walls.value_type, ValueType::Int);
    assert_eq!(walls.category, "Walls");
    assert!(walls.value_expression.is_some());
}

#[test]
fn test_enum_options_keep_document_order() {
    let table = load_fixture();
    let keys: Vec<&str> = table
        .get("infill_pattern")
        .unwrap()
        .options
        .iter()
        .map(|(k, _)| k.as_str())
        .collect();
    assert_eq!(keys, vec!["grid", "lines", "triangles", "zigzag"]);
}

#[test]
fn test_missing_document_is_fatal() {
    let defs = DefinitionDir::new();
    defs.write_child("printer", "absent_base", json!({}));
    let err = SchemaLoader::new(DirectorySource::new(defs.path()))
        .load("printer")
        .unwrap_err();
    assert!(matches!(err, Error::DefinitionNotFound { name, .. } if name == "absent_base"));
}

#[test]
fn test_unparsable_document_is_fatal() {
    let defs = DefinitionDir::new();
    defs.write_raw("broken", "{ \"settings\": ");
    let err = SchemaLoader::new(DirectorySource::new(defs.path()))
        .load("broken")
        .unwrap_err();
    assert!(matches!(err, Error::Fs(_)));
}

#[test]
fn test_malformed_attribute_is_skipped_not_fatal() {
    let defs = DefinitionDir::new();
    defs.write_base(
        "base",
        json!({
            "good": DefinitionDir::setting("int", json!(3)),
            "bad": { "type": "float", "label": 12 },
            "worse": "not an object"
        }),
    );
    let table = SchemaLoader::new(DirectorySource::new(defs.path()))
        .load("base")
        .unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.contains("good"));
}

#[test]
fn test_loaded_table_supports_lookup_and_validation() {
    let table = load_fixture();
    assert_eq!(resolve_setting(&table, "Infill Density").key, Some("infill_sparse_density"));

    let outcome = validate_key(&table, "material_bed_temperature", "120").unwrap();
    assert!(!outcome.accepted);
    assert_eq!(
        outcome.error.as_deref(),
        Some("Value 120.0 °C is above maximum (110.0 °C)")
    );
    assert!(validate_key(&table, "not_a_key", "1").is_none());
}
