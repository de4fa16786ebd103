//! Identifier helpers
//!
//! Derived entities (clarifications, plans, approvals, discussion entries)
//! are content-addressed: `{kind}-{first 12 hex chars of SHA-256}` over a
//! stable JSON rendering of their content. Agent tasks are unique per
//! creation and use UUID v7.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Render a JSON value with lexicographically sorted object keys.
///
/// Arrays keep their input order; `null` stays `null`. Two values that are
/// equal up to object key order produce byte-identical output, which is what
/// makes content-addressed ids stable across serializers.
pub fn stable_json(value: &Value) -> String {
    let mut out = String::new();
    write_stable(value, &mut out);
    out
}

fn write_stable(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_escaped(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_stable(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(key, out);
                out.push(':');
                // Key came from the map, so the lookup cannot miss
                write_stable(map.get(*key).unwrap_or(&Value::Null), out);
            }
            out.push('}');
        }
    }
}

fn write_escaped(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// First 12 hex characters of SHA-256 over the stable rendering.
pub fn short_hash(value: &Value) -> String {
    let digest = Sha256::digest(stable_json(value).as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect::<String>()[..12].to_string()
}

/// Content-addressed id for a derived entity.
pub fn derived_id(kind: &str, value: &Value) -> String {
    format!("{}-{}", kind, short_hash(value))
}

/// Unique-per-creation id for an agent task.
pub fn task_id() -> String {
    format!("task-{}", uuid::Uuid::now_v7())
}
