//! Scenario tests for the settings engine
//!
//! Each module follows one operational scenario through the public API of
//! the workspace crates, using the checked-in fixture definitions.

use std::collections::BTreeMap;

use slicer_core::{ResolveRequest, SettingsEngine};
use slicer_schema::{BoundsOverrides, DirectorySource, SchemaLoader};
use slicer_test_utils::{DefinitionDir, FIXTURE_PRINTER};

fn engine_for(defs: &DefinitionDir, printer: &str) -> slicer_core::Result<SettingsEngine> {
    let loader = SchemaLoader::new(DirectorySource::new(defs.path()));
    SettingsEngine::load(&loader, printer, &BoundsOverrides::new())
}

fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// S1: Definition chain loading
// =============================================================================

mod s1_chain {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_child_layer_wins_over_parents() {
        let defs = DefinitionDir::with_fixture_chain();
        let engine = engine_for(&defs, FIXTURE_PRINTER).unwrap();
        let table = engine.table();

        // fdmprinter 0.1 -> creality_base 0.2
        assert_eq!(table.get("layer_height").unwrap().default_string(), "0.2");
        // creality_ender3 tightens the bed limit
        assert_eq!(table.get("material_bed_temperature").unwrap().maximum_value, Some(110.0));
        // Overrides for keys no parent declares are dropped
        assert!(!table.contains("machine_nonexistent_setting"));
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        let defs = DefinitionDir::new();
        defs.write_child("orphan", "nowhere", json!({}));
        assert!(engine_for(&defs, "orphan").is_err());
    }

    #[test]
    fn test_unparsable_layer_is_an_error() {
        let defs = DefinitionDir::with_fixture_chain();
        defs.write_raw("broken", "{ not json");
        assert!(engine_for(&defs, "broken").is_err());
    }
}

// =============================================================================
// S2: Atomic schema reload
// =============================================================================

mod s2_reload {
    use super::*;
    use serde_json::json;
    use slicer_core::SchemaHandle;

    #[test]
    fn test_reload_swaps_definitions_for_new_requests() {
        let defs = DefinitionDir::with_fixture_chain();
        let handle = SchemaHandle::new(engine_for(&defs, FIXTURE_PRINTER).unwrap());
        let before = handle.current().unwrap();

        defs.write_child(
            "ender3_coarse",
            FIXTURE_PRINTER,
            json!({ "layer_height": { "default_value": 0.28 } }),
        );
        handle.reload(|| engine_for(&defs, "ender3_coarse")).unwrap();
        let after = handle.current().unwrap();

        let request = ResolveRequest::default();
        assert_eq!(before.resolve(&request).emitted["top_layers"], "4");
        // ceil(0.8 / 0.28)
        assert_eq!(after.resolve(&request).emitted["top_layers"], "3");
    }

    #[test]
    fn test_failed_reload_keeps_serving() {
        let defs = DefinitionDir::with_fixture_chain();
        let handle = SchemaHandle::new(engine_for(&defs, FIXTURE_PRINTER).unwrap());

        assert!(handle.reload(|| engine_for(&defs, "no_such_printer")).is_err());

        let engine = handle.current().unwrap();
        assert!(engine.table().contains("layer_height"));
        assert!(engine.resolve(&ResolveRequest::default()).is_ready());
    }
}

// =============================================================================
// S3: G-code templates
// =============================================================================

mod s3_templates {
    use super::*;

    #[test]
    fn test_temperatures_follow_overrides() {
        let defs = DefinitionDir::with_fixture_chain();
        let engine = engine_for(&defs, FIXTURE_PRINTER).unwrap();
        let resolution = engine.resolve(&ResolveRequest {
            overrides: overrides(&[("material_print_temperature", "235"), ("material_bed_temperature", "80")]),
            ..ResolveRequest::default()
        });
        assert!(resolution.emitted["machine_start_gcode"].starts_with("M140 S80\nM104 S235\n"));
    }

    #[test]
    fn test_preflight_flags_hand_edited_tables() {
        let defs = DefinitionDir::with_fixture_chain();
        let engine = engine_for(&defs, FIXTURE_PRINTER).unwrap();
        let emitted = overrides(&[
            ("machine_start_gcode", "M104 S{material_print_temperature}"),
            ("machine_end_gcode", "M117 {job_name}"),
        ]);
        let unknown = engine.preflight(&emitted);
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown["machine_end_gcode"], vec!["job_name"]);
    }
}

// =============================================================================
// S4: Operator bounds
// =============================================================================

mod s4_bounds {
    use super::*;

    #[test]
    fn test_bounds_override_rejects_user_value() {
        let defs = DefinitionDir::with_fixture_chain();
        let loader = SchemaLoader::new(DirectorySource::new(defs.path()));
        let mut bounds = BoundsOverrides::new();
        bounds.insert("material_bed_temperature", "maximum_value", 70.0);
        let engine = SettingsEngine::load(&loader, FIXTURE_PRINTER, &bounds).unwrap();

        let resolution = engine.resolve(&ResolveRequest {
            overrides: overrides(&[("material_bed_temperature", "75")]),
            ..ResolveRequest::default()
        });
        assert!(resolution.rejected["material_bed_temperature"].contains("above maximum (70.0 °C)"));
        assert!(resolution.emitted["machine_start_gcode"].starts_with("M140 S60\n"));
    }

    #[test]
    fn test_soft_bound_is_a_warning_only() {
        let defs = DefinitionDir::with_fixture_chain();
        let engine = engine_for(&defs, FIXTURE_PRINTER).unwrap();
        let resolution = engine.resolve(&ResolveRequest {
            overrides: overrides(&[("material_print_temperature", "270")]),
            ..ResolveRequest::default()
        });
        assert_eq!(resolution.emitted["material_print_temperature"], "270");
        assert!(resolution.warnings["material_print_temperature"].contains("recommended maximum"));
    }
}
