//! Formulas as they appear in printer definitions.

use pretty_assertions::assert_eq;
use rstest::rstest;
use slicer_expr::{Error, EvalError, Value, evaluate, extract_references};
use std::collections::BTreeMap;

fn printer_scope() -> BTreeMap<String, Value> {
    [
        ("layer_height", Value::Float(0.2)),
        ("layer_height_0", Value::Float(0.3)),
        ("line_width", Value::Float(0.4)),
        ("wall_thickness", Value::Float(1.2)),
        ("top_bottom_thickness", Value::Float(0.8)),
        ("infill_sparse_density", Value::Int(20)),
        ("infill_pattern", Value::Str("grid".into())),
        ("support_enable", Value::Bool(true)),
        ("support_extruder_nr", Value::Int(0)),
        ("machine_nozzle_size", Value::Float(0.4)),
        ("adhesion_type", Value::Str("skirt".into())),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[rstest]
#[case("machine_nozzle_size", Value::Float(0.4))]
#[case("max(1, round((wall_thickness - line_width) / line_width) + 1)", Value::Int(3))]
#[case("math.ceil(round(top_bottom_thickness / resolveOrValue('layer_height'), 4))", Value::Int(4))]
#[case("0 if infill_sparse_density == 0 else (line_width * 100) / infill_sparse_density * 2", Value::Float(4.0))]
#[case("'lines' if infill_pattern == 'zigzag' else infill_pattern", Value::Str("grid".into()))]
#[case("extruderValue(support_extruder_nr, 'line_width') * 2", Value::Float(0.8))]
#[case("any(extruderValues('support_enable'))", Value::Bool(true))]
#[case("adhesion_type != 'none' and support_enable", Value::Bool(true))]
#[case("layer_height_0 if adhesion_type in ['skirt', 'brim'] else layer_height", Value::Float(0.3))]
#[case("min(extruderValues('line_width'))", Value::Float(0.4))]
fn evaluates_definition_formulas(#[case] source: &str, #[case] expected: Value) {
    assert_eq!(evaluate(source, &printer_scope()).unwrap(), expected);
}

#[test]
fn sandbox_rejects_everything_outside_the_whitelist() {
    let scope = printer_scope();
    assert!(matches!(
        evaluate("__import__('os')", &scope),
        Err(Error::Eval(EvalError::UndefinedName(_)))
    ));
    assert!(matches!(
        evaluate("infill_pattern.upper()", &scope),
        Err(Error::Parse(_))
    ));
    assert!(matches!(
        evaluate("math.os", &scope),
        Err(Error::Eval(EvalError::UnknownMathAttribute(_)))
    ));
    assert!(matches!(evaluate("lambda: 1", &scope), Err(Error::Parse(_))));
}

#[test]
fn references_match_what_evaluation_reads() {
    let source = "math.ceil(round(top_bottom_thickness / resolveOrValue('layer_height'), 4))";
    let refs: Vec<String> = extract_references(source).into_iter().collect();
    assert_eq!(refs, vec!["layer_height", "top_bottom_thickness"]);
}

#[test]
fn errors_render_readable_messages() {
    let scope = printer_scope();
    let err = evaluate("unknown_setting * 2", &scope).unwrap_err();
    assert_eq!(err.to_string(), "name 'unknown_setting' is not defined");

    let err = evaluate("1 / 0", &scope).unwrap_err();
    assert_eq!(err.to_string(), "division by zero");
}

#[rstest]
#[case::flat_sum(vec!["1"; 20_000].join(" + "))]
#[case::flat_comparison(vec!["layer_height"; 5_000].join(" < "))]
#[case::chained_subscripts(format!("[[0]]{}", "[0]".repeat(10_000)))]
#[case::chained_calls(format!("max{}", "(1)".repeat(10_000)))]
fn oversized_formulas_fail_to_parse(#[case] source: String) {
    let err = evaluate(&source, &printer_scope()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{err}");
    assert!(err.to_string().contains("too long"), "{err}");
}

#[rstest]
#[case("'a' * 1000000000000000")]
#[case("[layer_height] * 1000000000000000")]
#[case("[[0] * 1024] * 1024 * 1024")]
#[case("infill_pattern * 300000")]
fn runaway_repetition_is_an_overflow(#[case] source: &str) {
    assert!(matches!(
        evaluate(source, &printer_scope()),
        Err(Error::Eval(EvalError::Overflow(_)))
    ));
}

#[test]
fn modest_repetition_is_unaffected() {
    assert_eq!(
        evaluate("infill_pattern * 2 + '!'", &printer_scope()).unwrap(),
        Value::Str("gridgrid!".into())
    );
    assert_eq!(
        evaluate("len([layer_height] * 4)", &printer_scope()).unwrap(),
        Value::Int(4)
    );
}
