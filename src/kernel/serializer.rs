//! Deterministic structural encoding of a [`Value`] tree.
//!
//! Output is compact JSON-shaped text: no whitespace, no trailing newline and
//! map keys in insertion order. Only backslash, double quote, newline,
//! carriage return and tab are escaped inside strings.

use std::fmt::Write;

use super::value::Value;

pub fn to_text(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        // Non-finite floats have no literal form; they encode as null.
        Value::Float(f) if !f.is_finite() => out.push_str("null"),
        Value::Float(f) => {
            let _ = write!(out, "{}", f);
        }
        Value::Str(s) => write_quoted(out, s),
        Value::Map(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_quoted(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.reserve(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
}
