// src/graph/flatten.rs
// =============================================================================
// Flattens nested JSON into a flat attribute map.
//
// Graph files only store scalar attributes, so a node like
//
//   {"id": "7", "profile": {"name": "Ann", "tags": ["a", "b"]}}
//
// becomes
//
//   id = "7", profile.name = "Ann", profile.tags.0 = "a", profile.tags.1 = "b"
//
// Rules:
// - nested object keys are joined with "."
// - array elements use their zero-based index as the key segment
// - empty objects and arrays contribute nothing
// - strings, numbers, booleans and null are kept as-is
//
// Keys are not escaped, so a literal key containing "." can land on the same
// path as a nested one: {"a.b": 1, "a": {"b": 2}} both produce "a.b". Only
// one value survives, the one visited last. Keys are visited in sorted
// order, so here that is the literal "a.b" (it sorts after "a").
// =============================================================================

use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const SEPARATOR: char = '.';

// Flat, key-ordered attribute store. Values are always JSON scalars.
pub type Attributes = BTreeMap<String, Value>;

// Flattens every field of `map`
pub fn flatten(map: &Map<String, Value>) -> Attributes {
    let mut out = Attributes::new();
    for (key, value) in map {
        flatten_into(&mut out, key.clone(), value);
    }
    out
}

fn flatten_into(out: &mut Attributes, path: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(out, join(&path, key), child);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(out, join(&path, &index.to_string()), child);
            }
        }
        scalar => {
            out.insert(path, scalar.clone());
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    let mut path = String::with_capacity(prefix.len() + 1 + key.len());
    path.push_str(prefix);
    path.push(SEPARATOR);
    path.push_str(key);
    path
}

// Renders a scalar attribute as plain text (strings without quotes,
// null as empty). Used by the exporters.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a BTreeMap and not a HashMap?
//    - BTreeMap iterates in key order, HashMap in random order
//    - Sorted keys mean the CSV columns and GEXF attributes come out the same
//      on every run
//
// 2. What is `scalar => { ... }` in the match?
//    - A catch-all arm that also binds the value to a name
//    - Objects and arrays were handled above, so anything left is a scalar
// -----------------------------------------------------------------------------
