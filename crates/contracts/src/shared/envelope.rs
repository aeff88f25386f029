//! Collection payload shapes.
//!
//! List endpoints answer with a bare array, with an object wrapping the array
//! under one of a few keys, with a nested `{ "cart": { "items": [...] } }`,
//! or (notifications) with a single record. `ListPayload::detect` decides the
//! shape once; callers then normalize the extracted rows into their own
//! canonical type.

use serde_json::Value;

/// Shape of a collection payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ListPayload {
    /// `[ ... ]`
    Bare(Vec<Value>),
    /// `{ "<key>": [ ... ] }`
    Keyed { key: &'static str, rows: Vec<Value> },
    /// `{ "<outer>": { "<inner>": [ ... ] } }`
    Nested {
        outer: &'static str,
        inner: &'static str,
        rows: Vec<Value>,
    },
    /// A single record object.
    Single(Value),
    /// Anything else: null, scalars, objects without a known key.
    Unrecognized,
}

/// Which wrappers a given endpoint may use.
#[derive(Debug, Clone, Copy)]
pub struct ShapeRules {
    pub keys: &'static [&'static str],
    pub nested: &'static [(&'static str, &'static str)],
    /// Accept a bare object as a one-element list.
    pub single_object: bool,
}

impl ShapeRules {
    pub const fn keyed(keys: &'static [&'static str]) -> Self {
        Self {
            keys,
            nested: &[],
            single_object: false,
        }
    }
}

impl ListPayload {
    pub fn detect(value: &Value, rules: &ShapeRules) -> Self {
        match value {
            Value::Array(rows) => ListPayload::Bare(rows.clone()),
            Value::Object(map) => {
                for &key in rules.keys {
                    if let Some(Value::Array(rows)) = map.get(key) {
                        return ListPayload::Keyed {
                            key,
                            rows: rows.clone(),
                        };
                    }
                }
                for &(outer, inner) in rules.nested {
                    if let Some(Value::Array(rows)) = map.get(outer).and_then(|o| o.get(inner)) {
                        return ListPayload::Nested {
                            outer,
                            inner,
                            rows: rows.clone(),
                        };
                    }
                }
                if rules.single_object && map.contains_key("id") {
                    ListPayload::Single(value.clone())
                } else {
                    ListPayload::Unrecognized
                }
            }
            _ => ListPayload::Unrecognized,
        }
    }

    /// Rows carried by the payload, in server order.
    pub fn into_rows(self) -> Vec<Value> {
        match self {
            ListPayload::Bare(rows)
            | ListPayload::Keyed { rows, .. }
            | ListPayload::Nested { rows, .. } => rows,
            ListPayload::Single(row) => vec![row],
            ListPayload::Unrecognized => Vec::new(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ListPayload::Unrecognized)
    }
}

/// Link to the next page, for paginated list responses.
pub fn next_page(value: &Value) -> Option<String> {
    value
        .get("next")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
