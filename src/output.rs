//! Printing command results
//!
//! JSON mode prints the value as returned. Text mode prints one `key: value`
//! block per record, with control characters stripped so remote data cannot
//! rewrite the terminal.

use anyhow::Result;
use serde_json::Value;

use crate::config::OutputFormat;

/// Renders a command result, or `None` when there is nothing to print
pub fn render(value: &Value, format: OutputFormat) -> Result<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Text => render_text(value),
    };
    Ok(Some(rendered))
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Array(records) => records
            .iter()
            .map(render_text)
            .collect::<Vec<_>>()
            .join("\n\n"),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, field)| format!("{}: {}", sanitize(key), scalar(field)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize(s),
        Value::Null => String::new(),
        other => sanitize(&other.to_string()),
    }
}

/// Trims and drops control characters
fn sanitize(value: &str) -> String {
    value.trim().chars().filter(|c| !c.is_control()).collect()
}
