//! `{{name}}` placeholder interpolation over diagnosis metadata.

use droidtriage_core::{Metadata, Result, TriageError};
use regex::{Captures, Regex};
use serde_json::Value;

/// Fills `{{name}}` placeholders from a metadata map.
#[derive(Debug, Clone)]
pub struct Interpolator {
    placeholder: Regex,
}

impl Interpolator {
    pub fn new() -> Result<Self> {
        let placeholder = Regex::new(r"\{\{\s*(\w+)\s*\}\}").map_err(|source| {
            TriageError::InvalidPattern {
                rule: "template.placeholder",
                source,
            }
        })?;
        Ok(Self { placeholder })
    }

    /// Render `template`; `None` if any placeholder has no usable value.
    pub fn render(&self, template: &str, metadata: &Metadata) -> Option<String> {
        let mut complete = true;
        let rendered = self
            .placeholder
            .replace_all(template, |caps: &Captures<'_>| {
                match metadata.get(&caps[1]).and_then(display_value) {
                    Some(value) => value,
                    None => {
                        complete = false;
                        String::new()
                    }
                }
            })
            .into_owned();
        complete.then_some(rendered)
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}
