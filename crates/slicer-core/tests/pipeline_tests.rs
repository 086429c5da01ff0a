//! Resolution pipeline against the checked-in definition chain.

use std::collections::{BTreeMap, BTreeSet};

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use slicer_core::{ResolveRequest, SettingsEngine, SlicerConfig};
use slicer_expr::Value;
use slicer_schema::{BoundsOverrides, DirectorySource, SchemaLoader};
use slicer_test_utils::{DefinitionDir, FIXTURE_PRINTER, TestWorkspace};

fn fixture_engine() -> SettingsEngine {
    let defs = DefinitionDir::with_fixture_chain();
    let loader = SchemaLoader::new(DirectorySource::new(defs.path()));
    SettingsEngine::load(&loader, FIXTURE_PRINTER, &BoundsOverrides::new()).unwrap()
}

fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn with_overrides(pairs: &[(&str, &str)]) -> ResolveRequest {
    ResolveRequest {
        overrides: overrides(pairs),
        ..ResolveRequest::default()
    }
}

#[test]
fn test_empty_request_emits_only_changed_values() {
    let resolution = fixture_engine().resolve(&ResolveRequest::default());

    let mut expected = BTreeMap::new();
    expected.insert("bottom_layers", "4");
    expected.insert("infill_line_distance", "4.0");
    expected.insert("material_print_temperature_layer_0", "210.0");
    expected.insert("top_layers", "4");
    expected.insert(
        "machine_start_gcode",
        "M140 S60\nM104 S210\nG28 ;Home\nG1 Z15.0 F6000 ;Move the platform down 15mm",
    );
    expected.insert("machine_end_gcode", "M104 S0\nM140 S0\nG1 X0 Y235\nM84");

    let emitted: BTreeMap<&str, &str> = resolution
        .emitted
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(emitted, expected);
    assert!(resolution.errors().is_empty(), "{:?}", resolution.errors());
    assert!(resolution.is_ready());
}

#[test]
fn test_settings_without_formula_never_appear_in_evaluation() {
    let resolution = fixture_engine().resolve(&ResolveRequest::default());
    for key in ["layer_height", "machine_width", "infill_sparse_density"] {
        assert!(!resolution.evaluation.values.contains_key(key), "{key} has no formula");
        assert!(!resolution.evaluation.errors.contains_key(key), "{key} has no formula");
    }
    // Every computed setting lands in exactly one of the two maps
    let engine = fixture_engine();
    for key in engine.graph().nodes() {
        let in_values = resolution.evaluation.values.contains_key(key);
        let in_errors = resolution.evaluation.errors.contains_key(key);
        assert!(in_values ^ in_errors, "{key} must be in exactly one map");
    }
}

#[test]
fn test_layer_height_override_propagates() {
    let resolution = fixture_engine().resolve(&with_overrides(&[("layer_height", "0.1")]));
    assert_eq!(resolution.emitted["layer_height"], "0.1");
    assert_eq!(resolution.evaluation.values.get("top_layers"), Some(&Value::Int(8)));
    // Back at its definition default of 8, so pruned
    assert!(!resolution.emitted.contains_key("top_layers"));
    assert_eq!(resolution.emitted["bottom_layers"], "8");
}

#[test]
fn test_pinned_formula_setting_feeds_dependents() {
    let resolution = fixture_engine().resolve(&with_overrides(&[("top_layers", "7")]));
    assert!(!resolution.evaluation.values.contains_key("top_layers"));
    assert_eq!(resolution.evaluation.values.get("bottom_layers"), Some(&Value::Int(7)));
    assert_eq!(resolution.emitted["top_layers"], "7");
    assert_eq!(resolution.emitted["bottom_layers"], "7");
}

#[test]
fn test_dense_infill_switches_pattern() {
    let resolution = fixture_engine().resolve(&with_overrides(&[("infill_sparse_density", "50")]));
    assert_eq!(resolution.emitted["infill_pattern"], "lines");
    assert_eq!(resolution.emitted["infill_line_distance"], "0.8");
}

#[test]
fn test_speed_print_drives_child_layer_formula() {
    let resolution = fixture_engine().resolve(&with_overrides(&[("speed_print", "80")]));
    assert_eq!(resolution.emitted["speed_wall"], "40.0");
    assert_eq!(resolution.emitted["speed_infill"], "80.0");
}

#[rstest]
#[case("material_bed_temperature", "120", "above maximum (110.0 °C)")]
#[case("layer_height", "0.0005", "below minimum")]
#[case("adhesion_type", "glue", "Invalid option 'glue'")]
#[case("cool_fan_enabled", "maybe", "Expected true/false")]
fn test_invalid_overrides_are_rejected(#[case] key: &str, #[case] raw: &str, #[case] message: &str) {
    let resolution = fixture_engine().resolve(&with_overrides(&[(key, raw)]));
    assert!(!resolution.emitted.contains_key(key));
    assert!(
        resolution.rejected[key].contains(message),
        "expected {message:?} in {:?}",
        resolution.rejected[key]
    );
}

#[test]
fn test_enum_override_is_normalized() {
    let resolution = fixture_engine().resolve(&with_overrides(&[("adhesion_type", "BRIM")]));
    assert_eq!(resolution.emitted["adhesion_type"], "brim");
}

#[test]
fn test_override_equal_to_default_is_still_emitted() {
    let resolution = fixture_engine().resolve(&with_overrides(&[("layer_height", "0.2")]));
    assert_eq!(resolution.emitted["layer_height"], "0.2");
}

#[test]
fn test_forced_config_default_is_emitted() {
    let engine = fixture_engine();
    let request = ResolveRequest {
        config_defaults: overrides(&[("roofing_layer_count", "0"), ("flooring_layer_count", "0")]),
        forced_keys: BTreeSet::from(["roofing_layer_count".to_string()]),
        ..ResolveRequest::default()
    };
    let resolution = engine.resolve(&request);
    assert_eq!(resolution.emitted["roofing_layer_count"], "0");
    assert!(!resolution.emitted.contains_key("flooring_layer_count"));
}

#[test]
fn test_forced_key_without_a_value_is_not_emitted() {
    let request = ResolveRequest {
        forced_keys: BTreeSet::from(["roofing_layer_count".to_string()]),
        ..ResolveRequest::default()
    };
    let resolution = fixture_engine().resolve(&request);
    assert!(!resolution.emitted.contains_key("roofing_layer_count"));
}

#[test]
fn test_config_default_is_below_user_override() {
    let engine = fixture_engine();
    let mut request = with_overrides(&[("material_print_temperature", "230")]);
    request.config_defaults = overrides(&[("material_print_temperature", "220")]);
    let resolution = engine.resolve(&request);
    assert_eq!(resolution.emitted["material_print_temperature"], "230");
    assert_eq!(resolution.emitted["material_print_temperature_layer_0"], "230.0");
}

#[test]
fn test_gcode_override_with_unknown_token_is_reported() {
    let engine = fixture_engine();
    let resolution = engine.resolve(&with_overrides(&[(
        "machine_start_gcode",
        "M140 S{material_bed_temperature}\nM117 {mystery}",
    )]));
    assert_eq!(resolution.emitted["machine_start_gcode"], "M140 S60\nM117 {mystery}");
    assert_eq!(resolution.unknown_tokens["machine_start_gcode"], vec!["mystery"]);
    assert!(!resolution.is_ready());
}

#[rstest]
#[case::flat_operator_chain(format!("M117 {{{}}}", vec!["1"; 20_000].join("+")))]
#[case::huge_repetition("M117 {'a' * 1000000000000000}".to_string())]
#[case::huge_list("M117 {len([0] * 9000000000000000000)}".to_string())]
fn test_gcode_override_with_runaway_expression_is_reported(#[case] gcode: String) {
    let engine = fixture_engine();
    let resolution = engine.resolve(&with_overrides(&[("machine_start_gcode", gcode.as_str())]));
    assert_eq!(resolution.emitted["machine_start_gcode"], gcode);
    assert_eq!(resolution.unknown_tokens["machine_start_gcode"].len(), 1);
    assert!(!resolution.is_ready());
}

#[test]
fn test_self_expanding_gcode_is_capped_and_reported() {
    let engine = fixture_engine();
    let growing = "{x}".repeat(10);
    let resolution = engine.resolve(&with_overrides(&[
        ("x", growing.as_str()),
        ("machine_start_gcode", "M117 {x}"),
    ]));
    assert!(resolution.emitted["machine_start_gcode"].len() <= slicer_core::template::MAX_TEMPLATE_LEN);
    assert_eq!(resolution.unknown_tokens["machine_start_gcode"], vec!["x"]);
    assert!(!resolution.is_ready());
}

#[test]
fn test_gcode_expressions_use_resolved_values() {
    let engine = fixture_engine();
    let resolution = engine.resolve(&with_overrides(&[
        ("machine_end_gcode", "G1 Y{machine_depth - 20} Z{layer_height * 10}"),
        ("layer_height", "0.25"),
    ]));
    assert_eq!(resolution.emitted["machine_end_gcode"], "G1 Y215 Z2.5");
}

#[test]
fn test_resolution_is_idempotent() {
    let engine = fixture_engine();
    let request = ResolveRequest {
        config_defaults: overrides(&[("infill_sparse_density", "15"), ("support_structure", "tree")]),
        overrides: overrides(&[("layer_height", "0.12"), ("speed_print", "45")]),
        forced_keys: BTreeSet::from(["roofing_layer_count".to_string()]),
    };
    let first = engine.resolve(&request);
    let second = engine.resolve(&request);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.emitted).unwrap(),
        serde_json::to_string(&second.emitted).unwrap()
    );
}

#[test]
fn test_bounds_overrides_apply_before_resolution() {
    let defs = DefinitionDir::with_fixture_chain();
    let loader = SchemaLoader::new(DirectorySource::new(defs.path()));
    let mut bounds = BoundsOverrides::new();
    bounds.insert_dotted("retraction_amount.maximum_value", 4.0);
    let engine = SettingsEngine::load(&loader, FIXTURE_PRINTER, &bounds).unwrap();

    let rejected = engine.validate("retraction_amount", "5").unwrap();
    assert!(!rejected.accepted);
    assert!(rejected.error.unwrap().contains("maximum"));
    assert!(engine.validate("retraction_amount", "4").unwrap().accepted);
}

#[test]
fn test_engine_from_config_file() {
    let ws = TestWorkspace::new();
    let path = ws.write_config(
        "[defaults.layer_height]\ndefault_value = \"0.16\"\n\n[bounds_overrides]\n\"speed_print.maximum_value\" = 100\n",
    );
    let config = SlicerConfig::load(&path).unwrap();
    let engine = SettingsEngine::from_config(&config).unwrap();

    assert_eq!(engine.table().get("speed_print").unwrap().maximum_value, Some(100.0));
    assert_eq!(engine.table().get("retraction_amount").unwrap().maximum_value, Some(4.0));

    let resolution = engine.resolve(&ResolveRequest::from_config(&config, BTreeMap::new()));
    assert_eq!(resolution.emitted["layer_height"], "0.16");
    assert_eq!(resolution.emitted["roofing_layer_count"], "0");
    assert_eq!(resolution.emitted["flooring_layer_count"], "0");
    assert_eq!(resolution.emitted["retraction_amount"], "4.0");
    assert_eq!(resolution.emitted["support_structure"], "tree");
    // Unknown to the definitions, passed through
    assert_eq!(resolution.emitted["cool_fan_speed_min"], "100");
    // Equal to the definition default
    assert!(!resolution.emitted.contains_key("adhesion_type"));
}

#[test]
fn test_cycle_in_definitions_does_not_block_resolution() {
    let defs = DefinitionDir::new();
    defs.write_base(
        "cyclic",
        json!({
            "x": DefinitionDir::computed("int", json!(1), "y + 1"),
            "y": DefinitionDir::computed("int", json!(1), "x + 1"),
            "z": DefinitionDir::computed("int", json!(0), "5"),
        }),
    );
    let loader = SchemaLoader::new(DirectorySource::new(defs.path()));
    let engine = SettingsEngine::load(&loader, "cyclic", &BoundsOverrides::new()).unwrap();

    assert_eq!(engine.graph().cyclic_keys(), vec!["x", "y"]);
    assert_eq!(engine.order(), &["z", "x", "y"]);

    let resolution = engine.resolve(&ResolveRequest::default());
    // x reads the default of y, then y reads the fresh x
    assert_eq!(resolution.emitted["x"], "2");
    assert_eq!(resolution.emitted["y"], "3");
    assert_eq!(resolution.emitted["z"], "5");
}
