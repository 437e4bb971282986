//! Key/value rendering with an aligned key column.

use super::escape::encode_escaped;
use serde_json::{Map, Value};

const NESTED_INDENT: usize = 2;

/// Render `key<pad>\tvalue` lines, keys padded to the longest key of this map.
///
/// Nested objects and arrays continue on the following lines, indented two
/// more spaces. Array elements are keyed by their index.
pub fn render_dict(map: &Map<String, Value>) -> String {
    let mut out = String::new();
    let entries: Vec<(&str, &Value)> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
    write_dict(&mut out, &entries, 0);
    out
}

fn write_dict(out: &mut String, entries: &[(&str, &Value)], indent: usize) {
    let key_width = entries
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);
    let left = " ".repeat(indent);
    for (key, value) in entries {
        out.push_str(&format!("{}{:<width$}\t", left, key, width = key_width));
        match value {
            Value::Object(nested) => {
                out.push('\n');
                let nested: Vec<(&str, &Value)> =
                    nested.iter().map(|(k, v)| (k.as_str(), v)).collect();
                write_dict(out, &nested, indent + NESTED_INDENT);
            }
            Value::Array(items) => {
                out.push('\n');
                let keys: Vec<String> = (0..items.len()).map(|i| i.to_string()).collect();
                let nested: Vec<(&str, &Value)> =
                    keys.iter().map(String::as_str).zip(items.iter()).collect();
                write_dict(out, &nested, indent + NESTED_INDENT);
            }
            Value::Null => out.push_str("null\n"),
            scalar => {
                out.push_str(&scalar_text(scalar));
                out.push('\n');
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    let encoded = encode_escaped(&value.to_string());
    let trimmed = encoded
        .strip_suffix("\r\n")
        .or_else(|| encoded.strip_suffix('\n'))
        .unwrap_or(&encoded);
    trimmed.replace('\n', "\n\t")
}
