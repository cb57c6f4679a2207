//! Reading mapped values off an object graph.
//!
//! Domain objects reach the projector as `serde_json::Value` graphs. An
//! evaluator turns a source path from the mapping metadata into the value at
//! that path, failing with `Error::PathNotFound` when the object's shape does
//! not contain it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{Error, Result};

pub trait FieldEvaluator: Send + Sync {
    fn evaluate<'a>(&self, object: &'a Value, path: &str) -> Result<&'a Value>;
}

/// Property paths: `title`, `author.name`, `tags[0]`, `[key]`, `images[0].url`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyPathEvaluator;

impl FieldEvaluator for PropertyPathEvaluator {
    fn evaluate<'a>(&self, object: &'a Value, path: &str) -> Result<&'a Value> {
        let mut current = object;
        for segment in parse_property_path(path)? {
            current = step(current, segment).ok_or_else(|| {
                Error::path_not_found(path, format!("no \"{segment}\" in {}", describe(current)))
            })?;
        }
        Ok(current)
    }
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Clone, Copy, PartialEq)]
enum PathState {
    Start,
    AfterSegment,
    AfterDot,
}

fn parse_property_path(path: &str) -> Result<Vec<&str>> {
    let invalid = |reason: &str| Error::path_not_found(path, reason);
    let mut segments = Vec::new();
    let mut state = PathState::Start;
    let mut rest = path;
    while let Some(c) = rest.chars().next() {
        match (state, c) {
            (PathState::AfterSegment, '.') => {
                rest = &rest[1..];
                state = PathState::AfterDot;
            }
            (PathState::Start | PathState::AfterSegment, '[') => {
                let end = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let key = &rest[1..end];
                if key.is_empty() {
                    return Err(invalid("empty '[]' segment"));
                }
                segments.push(key);
                rest = &rest[end + 1..];
                state = PathState::AfterSegment;
            }
            (PathState::Start | PathState::AfterDot, _) => {
                let end = rest.find(|c: char| c == '.' || c == '[').unwrap_or(rest.len());
                if end == 0 {
                    return Err(invalid("expected a property name"));
                }
                segments.push(&rest[..end]);
                rest = &rest[end..];
                state = PathState::AfterSegment;
            }
            (PathState::AfterSegment, other) => {
                return Err(invalid(&format!("unexpected '{other}' after a segment")));
            }
        }
    }
    match state {
        PathState::Start => Err(invalid("empty path")),
        PathState::AfterDot => Err(invalid("path ends with '.'")),
        PathState::AfterSegment => Ok(segments),
    }
}

/// RFC 6901 pointers: `/title`, `/authors/0/name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPointerEvaluator;

impl FieldEvaluator for JsonPointerEvaluator {
    fn evaluate<'a>(&self, object: &'a Value, path: &str) -> Result<&'a Value> {
        if !path.is_empty() && !path.starts_with('/') {
            return Err(Error::path_not_found(path, "JSON pointers start with '/'"));
        }
        object
            .pointer(path)
            .ok_or_else(|| Error::path_not_found(path, "no value at pointer"))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    #[default]
    PropertyPath,
    JsonPointer,
}

impl EvaluatorKind {
    pub fn build(&self) -> Arc<dyn FieldEvaluator> {
        match self {
            Self::PropertyPath => Arc::new(PropertyPathEvaluator),
            Self::JsonPointer => Arc::new(JsonPointerEvaluator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product() -> Value {
        json!({
            "title": "Kettle",
            "tags": ["kitchen", "steel"],
            "author": { "name": "Ada" },
            "images": [{ "url": "/a.png" }],
            "attrs": { "color": "red" }
        })
    }

    #[test]
    fn property_path_segments() {
        assert_eq!(parse_property_path("a").unwrap(), vec!["a"]);
        assert_eq!(parse_property_path("a.b.c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(parse_property_path("tags[0]").unwrap(), vec!["tags", "0"]);
        assert_eq!(parse_property_path("[title]").unwrap(), vec!["title"]);
        assert_eq!(parse_property_path("images[0].url").unwrap(), vec!["images", "0", "url"]);
    }

    #[test]
    fn property_path_rejects_bad_syntax() {
        for bad in ["", ".a", "a.", "a..b", "a[", "a[]", "[a]b", "a.[0]"] {
            assert!(
                matches!(parse_property_path(bad), Err(Error::PathNotFound { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn property_path_reads_nested_values() {
        let obj = product();
        let ev = PropertyPathEvaluator;
        assert_eq!(ev.evaluate(&obj, "title").unwrap(), &json!("Kettle"));
        assert_eq!(ev.evaluate(&obj, "author.name").unwrap(), &json!("Ada"));
        assert_eq!(ev.evaluate(&obj, "tags[1]").unwrap(), &json!("steel"));
        assert_eq!(ev.evaluate(&obj, "images[0].url").unwrap(), &json!("/a.png"));
        assert_eq!(ev.evaluate(&obj, "[attrs][color]").unwrap(), &json!("red"));
        assert_eq!(ev.evaluate(&obj, "tags").unwrap(), &json!(["kitchen", "steel"]));
    }

    #[test]
    fn property_path_missing_value_is_path_not_found() {
        let obj = product();
        let ev = PropertyPathEvaluator;
        let err = ev.evaluate(&obj, "author.email").unwrap_err();
        match err {
            Error::PathNotFound { path, .. } => assert_eq!(path, "author.email"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(ev.evaluate(&obj, "tags[9]").is_err());
        assert!(ev.evaluate(&obj, "title.length").is_err());
    }

    #[test]
    fn json_pointer_reads_values() {
        let obj = product();
        let ev = JsonPointerEvaluator;
        assert_eq!(ev.evaluate(&obj, "/author/name").unwrap(), &json!("Ada"));
        assert_eq!(ev.evaluate(&obj, "/tags/0").unwrap(), &json!("kitchen"));
        assert_eq!(ev.evaluate(&obj, "").unwrap(), &obj);
        assert!(ev.evaluate(&obj, "title").is_err());
        assert!(ev.evaluate(&obj, "/missing").is_err());
    }
}
