//! Formatting helpers for MCP tool output
//!
//! Tool responses carry the envelope either as pretty JSON or as a compact
//! text rendering. Text is the default: it reads well in tool transcripts and
//! stays much smaller than the JSON form for tree results.

use serde_json::Value;

use crate::shape::ToolEnvelope;

/// Render an envelope in the requested format ("json" or text).
pub fn format_envelope(envelope: &ToolEnvelope, format: Option<&str>) -> String {
    match format {
        Some("json") => envelope.to_json_pretty(),
        _ => format_envelope_text(envelope),
    }
}

fn format_envelope_text(envelope: &ToolEnvelope) -> String {
    let mut output = String::new();

    if let Some(message) = &envelope.message {
        output.push_str(message);
        output.push('\n');
    }
    output.push_str(&format!("total_found: {}\n", envelope.total_found));
    output.push_str(&format!("returned: {}\n", envelope.returned));
    if envelope.truncated {
        output.push_str("truncated: true\n");
    }
    if let Some(id) = &envelope.overflow_id {
        output.push_str(&format!("overflow_id: {}\n", id));
    }
    for notice in &envelope.notices {
        output.push_str(&format!("note: {}\n", notice));
    }

    if let Some(Value::Array(items)) = &envelope.items {
        if !items.is_empty() {
            output.push_str(&format!("\nitems[{}]:\n", items.len()));
            for item in items {
                output.push_str("  ");
                output.push_str(&format_item(item));
                output.push('\n');
            }
        }
    }

    if let Some(tree) = &envelope.tree {
        output.push('\n');
        format_tree_node(tree, "", 0, &mut output);
    }

    output
}

/// One-line rendering for the known item shapes; anything else falls back to
/// compact JSON.
fn format_item(item: &Value) -> String {
    // Reference site: { document, span }
    if let (Some(document), Some(span)) = (item.get("document"), item.get("span")) {
        if let Some(document) = document.as_str() {
            return format!("{}:{}", document, format_span(span));
        }
    }

    // Text edit: { file, span, replacement }
    if let (Some(file), Some(span), Some(replacement)) =
        (item.get("file"), item.get("span"), item.get("replacement"))
    {
        if let (Some(file), Some(replacement)) = (file.as_str(), replacement.as_str()) {
            return format!("{}:{} -> {}", file, format_span(span), replacement);
        }
    }

    // Diagnostic: { file, span, severity, message }
    if let (Some(file), Some(severity), Some(message)) =
        (item.get("file"), item.get("severity"), item.get("message"))
    {
        if let (Some(file), Some(severity), Some(message)) =
            (file.as_str(), severity.as_str(), message.as_str())
        {
            let span = item.get("span").map(format_span).unwrap_or_default();
            let code = item
                .get("code")
                .and_then(|c| c.as_str())
                .map(|c| format!(" [{}]", c))
                .unwrap_or_default();
            return format!("{} {}:{}{} {}", severity, file, span, code, message);
        }
    }

    serde_json::to_string(item).unwrap_or_else(|_| "{}".to_string())
}

fn format_span(span: &Value) -> String {
    let line = span
        .pointer("/start/line")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let column = span
        .pointer("/start/column")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    format!("{}:{}", line, column)
}

/// Indented tree rendering: `<-` marks incoming children (callers/overrides),
/// `->` outgoing ones (callees/base chain).
fn format_tree_node(node: &Value, marker: &str, indent: usize, output: &mut String) {
    let pad = "  ".repeat(indent);
    output.push_str(&pad);
    if !marker.is_empty() {
        output.push_str(marker);
        output.push(' ');
    }
    output.push_str(&symbol_label(node));

    let mut flags = Vec::new();
    if node.get("is_truncated").and_then(Value::as_bool).unwrap_or(false) {
        flags.push("truncated");
    }
    if node.get("is_external").and_then(Value::as_bool).unwrap_or(false) {
        flags.push("external");
    }
    if node
        .get("is_relation_derived")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        flags.push("relation-derived");
    }
    if let Some(relation) = node.get("relation").and_then(Value::as_str) {
        if relation != "call" {
            flags.push(relation);
        }
    }
    if !flags.is_empty() {
        output.push_str(&format!(" ({})", flags.join(", ")));
    }
    output.push('\n');

    if let Some(Value::Array(children)) = node.get("incoming") {
        for child in children {
            format_tree_node(child, "<-", indent + 1, output);
        }
    }
    if let Some(Value::Array(children)) = node.get("outgoing") {
        for child in children {
            format_tree_node(child, "->", indent + 1, output);
        }
    }
}

fn symbol_label(node: &Value) -> String {
    let symbol = match node.get("symbol") {
        Some(s) => s,
        None => return "?".to_string(),
    };
    let name = symbol.get("name").and_then(Value::as_str).unwrap_or("?");
    let container = symbol.get("container").and_then(Value::as_str).unwrap_or("");
    let kind = symbol.get("kind").and_then(Value::as_str).unwrap_or("");

    let display = if container.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", container, name)
    };

    let location = symbol
        .get("location")
        .and_then(|l| {
            let file = l.get("file")?.as_str()?;
            let line = l.get("line")?.as_u64()?;
            Some(format!(" @ {}:{}", file, line))
        })
        .unwrap_or_default();

    format!("{} [{}]{}", display, kind, location)
}
