use std::collections::HashMap;

use regex::Regex;
use tera::{Context, Tera};

use crate::error::Error;

/// Placeholder marker: `{{ name }}`, whitespace-tolerant.
const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

/// Collect placeholder names referenced by a template, in order of first
/// appearance.
pub(crate) fn scan(template: &str) -> Vec<String> {
    // The pattern is a literal, compilation cannot fail
    let re = Regex::new(PLACEHOLDER_PATTERN).unwrap();

    let mut names = Vec::new();
    for cap in re.captures_iter(template) {
        let name = &cap[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    names
}

/// Render a body template against the merged substitution namespace.
///
/// Every scanned placeholder is validated by the builder before this is
/// called, so the engine only sees resolvable input. Autoescape is off:
/// the substituted values are HTML fragments already.
pub(crate) fn render(template: &str, values: &HashMap<String, String>) -> Result<String, Error> {
    let mut context = Context::new();
    for (name, value) in values {
        context.insert(name.as_str(), value);
    }

    let rendered = Tera::one_off(template, &context, false)?;
    Ok(rendered)
}
