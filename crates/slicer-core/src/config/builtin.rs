//! Checked-in printer defaults.
//!
//! The configuration file keeps machine-specific paths; these are the
//! printer-level defaults every deployment starts from.

use std::collections::BTreeMap;

use super::SettingDefaults;

fn value(default_value: &str) -> SettingDefaults {
    SettingDefaults {
        default_value: Some(default_value.to_string()),
        ..SettingDefaults::default()
    }
}

fn forced(default_value: &str) -> SettingDefaults {
    SettingDefaults {
        forced: Some(true),
        ..value(default_value)
    }
}

/// Built-in per-setting defaults, the lowest configuration layer.
pub fn builtin_defaults() -> BTreeMap<String, SettingDefaults> {
    let mut defaults = BTreeMap::new();
    let mut set = |key: &str, entry: SettingDefaults| {
        defaults.insert(key.to_string(), entry);
    };

    set("layer_height", value("0.2"));
    set("infill_sparse_density", value("15"));
    set("material_print_temperature", value("220"));
    set("material_bed_temperature", value("60"));
    set("support_structure", value("tree"));
    set("support_type", value("buildplate"));
    set("adhesion_type", value("skirt"));
    set("skirt_line_count", value("2"));
    set("skirt_height", value("1"));
    set("center_object", value("true"));
    // All-metal heat break: short retractions only
    set(
        "retraction_amount",
        SettingDefaults {
            maximum_value: Some(4.0),
            ..value("4")
        },
    );
    set("cool_fan_speed", value("100"));
    set("cool_fan_speed_min", value("100"));
    set("cool_fan_speed_max", value("100"));
    set("cool_fan_speed_0", value("100"));
    set("roofing_layer_count", forced("0"));
    set("flooring_layer_count", forced("0"));

    defaults
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roofing_and_flooring_are_forced() {
        let defaults = builtin_defaults();
        for key in ["roofing_layer_count", "flooring_layer_count"] {
            assert_eq!(defaults[key].forced, Some(true), "{key} should be forced");
            assert_eq!(defaults[key].default_value.as_deref(), Some("0"));
        }
    }

    #[test]
    fn retraction_is_capped() {
        let defaults = builtin_defaults();
        assert_eq!(defaults["retraction_amount"].maximum_value, Some(4.0));
        assert_eq!(defaults["retraction_amount"].default_value.as_deref(), Some("4"));
    }
}
