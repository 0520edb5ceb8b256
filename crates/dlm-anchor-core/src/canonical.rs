//! Canonical JSON form of manifest documents.
//!
//! The canonical form is what manifest identifiers are computed over, so it
//! must be byte-identical to what other publishers produce:
//! - Object keys sorted by UTF-16 code units, with integer-like keys
//!   (`"0"`, `"17"`) emitted first in numeric order
//! - `signatures` and `versionId` removed at every nesting level
//! - Array order preserved
//! - Compact output, no insignificant whitespace
//! - Numbers in shortest round-trip form; integral floats print without a
//!   fraction, exponents appear only below 1e-6 or from 1e21 upward

use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// Keys excluded from the canonical form.
pub const VOLATILE_KEYS: [&str; 2] = ["signatures", "versionId"];

/// Produce the canonical JSON string for `manifest`.
pub fn canonicalize_manifest(manifest: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, manifest);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(n)),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    let mut keys: Vec<&String> = map
        .keys()
        .filter(|k| !VOLATILE_KEYS.contains(&k.as_str()))
        .collect();
    keys.sort_by(|a, b| compare_keys(a, b));

    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, &map[key]);
    }
    out.push('}');
}

/// Property order of a JSON object built from sorted keys.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (array_index(a), array_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.encode_utf16().cmp(b.encode_utf16()),
    }
}

/// A key that is the canonical decimal form of an integer below 2^32 - 1.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<u32>().ok().filter(|n| *n != u32::MAX)
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Largest integer a double represents exactly.
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        if i.unsigned_abs() <= MAX_SAFE_INTEGER {
            return i.to_string();
        }
    }
    match n.as_f64() {
        Some(f) => format_float(f),
        None => "null".to_string(),
    }
}

fn format_float(f: f64) -> String {
    if !f.is_finite() {
        return "null".to_string();
    }
    if f == 0.0 {
        // Covers negative zero.
        return "0".to_string();
    }
    let abs = f.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{f}");
    }
    let exp = format!("{f:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_recursively() {
        let v = json!({"b": 1, "a": {"d": [3, {"z": 0, "y": 1}], "c": true}});
        assert_eq!(
            canonicalize_manifest(&v),
            r#"{"a":{"c":true,"d":[3,{"y":1,"z":0}]},"b":1}"#
        );
    }

    #[test]
    fn test_volatile_keys_dropped_at_every_level() {
        let v = json!({
            "versionId": "x",
            "signatures": {"producer": {}},
            "nested": {"versionId": "y", "keep": 1, "signatures": []}
        });
        assert_eq!(canonicalize_manifest(&v), r#"{"nested":{"keep":1}}"#);
    }

    #[test]
    fn test_key_order_independent() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":{"p":2,"q":3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":{"q":3,"p":2},"x":1}"#).unwrap();
        assert_eq!(canonicalize_manifest(&a), canonicalize_manifest(&b));
    }

    #[test]
    fn test_integer_keys_come_first_numerically() {
        let v = json!({"b": 0, "10": 0, "9": 0, "a": 0, "01": 0});
        assert_eq!(
            canonicalize_manifest(&v),
            r#"{"9":0,"10":0,"01":0,"a":0,"b":0}"#
        );
    }

    #[test]
    fn test_utf16_ordering() {
        // U+FF21 sorts after U+1F600 by code point but before it in UTF-16.
        let v = json!({"\u{1F600}": 1, "\u{FF21}": 2});
        assert_eq!(canonicalize_manifest(&v), "{\"\u{1F600}\":1,\"\u{FF21}\":2}");
    }

    #[test]
    fn test_string_escaping() {
        let v = json!({"s": "q\"b\\n\n\u{1}é"});
        assert_eq!(canonicalize_manifest(&v), r#"{"s":"q\"b\\n\n\u0001é"}"#);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(-0.0), "0");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(1e21), "1e+21");
        assert_eq!(format_float(1.5e-7), "1.5e-7");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
        let v: Value = serde_json::from_str(r#"{"n":2.0,"m":-7,"big":18446744073709551615}"#).unwrap();
        assert_eq!(
            canonicalize_manifest(&v),
            r#"{"big":18446744073709552000,"m":-7,"n":2}"#
        );
    }
}
