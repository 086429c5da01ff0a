//! End-to-end test for the vertical slice
//!
//! Operator config -> definition chain -> user overrides -> presets ->
//! resolution -> slicing-engine command line.

use std::collections::BTreeMap;
use std::path::Path;

use pretty_assertions::assert_eq;
use slicer_core::{
    EngineCommand, PresetManager, ResolveRequest, SettingsEngine, SlicerConfig, UserSettingsStore,
    resolve_scale,
};
use slicer_test_utils::TestWorkspace;

fn load(ws: &TestWorkspace, extra: &str) -> (SlicerConfig, SettingsEngine) {
    let config = SlicerConfig::load(&ws.write_config(extra)).unwrap();
    let engine = SettingsEngine::from_config(&config).unwrap();
    (config, engine)
}

#[test]
fn test_user_session_to_engine_command() {
    let ws = TestWorkspace::new();
    let (config, engine) = load(&ws, "[defaults.speed_print]\ndefault_value = \"45\"\n");

    // A user picks a preset, then tweaks one value
    let presets = PresetManager::load(config.paths.presets.as_deref()).unwrap();
    let applied = presets.apply("fine", engine.table()).unwrap();
    assert!(applied.rejected.is_empty(), "{:?}", applied.rejected);

    let mut store = UserSettingsStore::load(&config.paths.user_settings).unwrap();
    store.extend(42, applied.accepted);
    store.set(42, "infill_sparse_density", "35");
    store.set(42, "scale", "200");
    store.save().unwrap();

    // Later request, fresh store
    let overrides = UserSettingsStore::load(&config.paths.user_settings)
        .unwrap()
        .overrides(42);
    assert!(presets.matching_presets(&overrides).is_empty(), "density no longer matches 'fine'");

    let request = ResolveRequest::from_config(&config, overrides);
    let resolution = engine.resolve(&request);
    assert!(resolution.is_ready());
    assert!(resolution.errors().is_empty(), "{:?}", resolution.errors());

    assert_eq!(resolution.emitted["layer_height"], "0.12");
    assert_eq!(resolution.emitted["infill_sparse_density"], "35");
    // User value beats the operator default
    assert_eq!(resolution.emitted["speed_print"], "40");
    assert_eq!(resolution.emitted["speed_wall"], "20.0");
    assert_eq!(resolution.emitted["top_layers"], "5");
    assert!(!resolution.emitted.contains_key("scale"));

    let scale = resolve_scale(&request.config_defaults, &request.overrides);
    assert_eq!((scale.x, scale.y, scale.z), (200.0, 200.0, 200.0));

    let command = EngineCommand::build(
        &config.paths.engine_path,
        &config.paths.definition_dir,
        &config.paths.printer_definition,
        Path::new("part.stl"),
        Path::new("part.gcode"),
        &resolution.emitted,
    );
    let argv = command.argv();
    assert_eq!(argv[0], "/usr/bin/CuraEngine");
    assert_eq!(argv[1], "slice");
    assert_eq!(argv[argv.len() - 4..], ["-l", "part.stl", "-o", "part.gcode"]);
    let settings: Vec<&str> = argv
        .windows(2)
        .filter(|pair| pair[0] == "-s")
        .map(|pair| pair[1].as_str())
        .collect();
    assert_eq!(settings.len(), resolution.emitted.len());
    assert!(settings.contains(&"layer_height=0.12"));
    assert!(settings.iter().any(|s| s.starts_with("machine_start_gcode=M140 S60\nM104 S220")));
}

#[test]
fn test_operator_defaults_without_builtins() {
    let ws = TestWorkspace::new();
    let config = SlicerConfig::load(&ws.write_bare_config(
        "[defaults.material_print_temperature]\ndefault_value = 215\n",
    ))
    .unwrap();
    let engine = SettingsEngine::from_config(&config).unwrap();

    let resolution = engine.resolve(&ResolveRequest::from_config(&config, BTreeMap::new()));
    assert_eq!(resolution.emitted["material_print_temperature"], "215.0");
    assert_eq!(resolution.emitted["material_print_temperature_layer_0"], "215.0");
    assert!(resolution.emitted["machine_start_gcode"].contains("M104 S215"));
    assert!(!resolution.emitted.contains_key("roofing_layer_count"));
}

#[test]
fn test_resolution_output_is_stable_json() {
    let ws = TestWorkspace::new();
    let (config, engine) = load(&ws, "");
    let overrides = BTreeMap::from([("layer_height".to_string(), "0.16".to_string())]);
    let request = ResolveRequest::from_config(&config, overrides);

    let first = serde_json::to_string(&engine.resolve(&request)).unwrap();
    let second = serde_json::to_string(&engine.resolve(&request)).unwrap();
    assert_eq!(first, second);

    let json: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(json["emitted"]["layer_height"], "0.16");
    assert_eq!(json["evaluation"]["values"]["top_layers"], 5);
}
