//! Find command implementation

use colored::Colorize;
use slicer_expr::Value;
use slicer_schema::AttributeDefinition;

use crate::context::SlicerContext;
use crate::error::{CliError, Result};

/// Run the find command
pub fn run_find(ctx: &SlicerContext, query: &str) -> Result<()> {
    let found = ctx.engine.find(query);

    if let Some(attr) = found.key.and_then(|_| found.candidates.first()) {
        print_details(attr);
        return Ok(());
    }

    if found.candidates.is_empty() {
        return Err(CliError::user(format!("No setting matches '{query}'")));
    }

    println!("{} '{}':", "Several settings match".bold(), query);
    for attr in &found.candidates {
        println!("  {:<40} {}", attr.key.green(), attr.label.dimmed());
    }
    Ok(())
}

fn print_details(attr: &AttributeDefinition) {
    println!("{} ({})", attr.label.bold(), attr.key.green());
    if !attr.description.is_empty() {
        println!("  {}", attr.description.dimmed());
    }
    println!("{}:     {}", "Type".dimmed(), attr.value_type);

    let unit = attr.unit.as_deref().map(|u| format!(" {u}")).unwrap_or_default();
    if attr.default_value != Value::None {
        println!("{}:  {}{}", "Default".dimmed(), attr.default_string(), unit);
    }
    if attr.minimum_value.is_some() || attr.maximum_value.is_some() {
        println!(
            "{}:    {} .. {}",
            "Range".dimmed(),
            bound_text(attr.minimum_value),
            bound_text(attr.maximum_value)
        );
    }
    if !attr.options.is_empty() {
        let keys: Vec<&str> = attr.options.iter().map(|(k, _)| k.as_str()).collect();
        println!("{}:  {}", "Options".dimmed(), keys.join(", "));
    }
    if let Some(expression) = &attr.value_expression {
        println!("{}:  {}", "Formula".dimmed(), expression.cyan());
    }
}

fn bound_text(bound: Option<f64>) -> String {
    bound.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string())
}
