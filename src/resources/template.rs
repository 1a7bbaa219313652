// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Placeholder substitution for prompt messages.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// Static regex for `{{variable}}` placeholders (compiled once).
static VAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").unwrap());

/// Renders a template against a set of variables.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, variables: &Map<String, Value>) -> String;
}

/// Replaces `{{name}}` with the variable's value.
///
/// String values are inserted as-is, other values as JSON. Undefined
/// placeholders are left in place and logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, variables: &Map<String, Value>) -> String {
        let mut undefined_vars = Vec::new();

        let rendered = VAR_REGEX.replace_all(template, |cap: &Captures<'_>| {
            let var_name = &cap[1];
            match variables.get(var_name) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => {
                    undefined_vars.push(var_name.to_string());
                    cap[0].to_string()
                }
            }
        });

        if !undefined_vars.is_empty() {
            tracing::warn!("Undefined variables in template: {:?}", undefined_vars);
        }

        rendered.into_owned()
    }
}
