//! Object to document projection.
//!
//! `Projector::project` walks a class's field mapping table against an
//! object graph and returns a fully populated `Document`, or an error and no
//! document at all.
//!
//! Field naming: a leaf named `name` under prefix `p` yields `p + name`, or
//! `p + name + key` per element when the evaluated value is an array (index
//! keys) or an object (member keys). A complex entry recurses into each child
//! with prefix `p + name + key`. Given distinct sibling names at every level,
//! two leaves reached through different paths never share a field name.

use serde_json::Value;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::evaluator::FieldEvaluator;
use crate::metadata::{FieldMappingTable, IndexMetadata, MappingKind};
use crate::types::{Document, Field, FieldType, FieldValue};

#[derive(Clone)]
pub struct Projector {
    evaluator: Arc<dyn FieldEvaluator>,
}

impl Projector {
    pub fn new(evaluator: Arc<dyn FieldEvaluator>) -> Self {
        Self { evaluator }
    }

    pub fn project(&self, metadata: &IndexMetadata, object: &Value) -> Result<Document> {
        metadata.validate()?;

        let id_path = metadata.id_field.as_deref().unwrap_or_default();
        let id = self.evaluator.evaluate(object, id_path)?;
        let mut document = Document::new(scalar_text("id", id)?, metadata.class_name.clone());

        document.url = self.promoted("url", metadata.url_field.as_deref(), object)?;
        document.title = self.promoted("title", metadata.title_field.as_deref(), object)?;
        document.description = self.promoted("description", metadata.description_field.as_deref(), object)?;
        document.locale = self.promoted("locale", metadata.locale_field.as_deref(), object)?;
        if let Some(path) = metadata.image_url_field.as_deref() {
            let image_url = self.evaluator.evaluate(object, path)?;
            document.image_url = Some(scalar_text("image_url", image_url)?);
        }
        document.category = metadata.category_name.clone();

        document.fields = self.populate(object, &metadata.field_mapping, "")?;
        Ok(document)
    }

    /// A well-known attribute; empty values leave it unset.
    fn promoted(&self, attribute: &str, path: Option<&str>, object: &Value) -> Result<Option<String>> {
        let Some(path) = path else { return Ok(None) };
        let value = self.evaluator.evaluate(object, path)?;
        if is_empty(value) {
            return Ok(None);
        }
        scalar_text(attribute, value).map(Some)
    }

    /// Fields for one mapping level. Each call returns its own fields; the
    /// caller concatenates them.
    ///
    /// Names are plain concatenations, so sibling names ending in digits can
    /// collide: `a` with twelve elements and `a1` with two both yield `a11`.
    pub fn populate(&self, object: &Value, table: &FieldMappingTable, prefix: &str) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        for (name, mapping) in table.iter() {
            let (source, kind) = mapping.resolve(name)?;
            let value = self.evaluator.evaluate(object, source)?;
            match kind {
                MappingKind::Complex(nested) => {
                    for (key, child) in children(name, value)? {
                        let child_prefix = format!("{prefix}{name}{key}");
                        fields.extend(self.populate(child, nested, &child_prefix)?);
                    }
                }
                MappingKind::Leaf(field_type) => {
                    fields.extend(leaf_fields(&format!("{prefix}{name}"), value, field_type)?);
                }
            }
        }
        Ok(fields)
    }
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector").field("evaluator", &"<dyn FieldEvaluator>").finish()
    }
}

fn leaf_fields(name: &str, value: &Value, field_type: FieldType) -> Result<Vec<Field>> {
    let scalar = |field_name: String, item: &Value| -> Result<Field> {
        let value = FieldValue::from_json(item)
            .ok_or_else(|| Error::unsupported_value(&field_name, "nested collections cannot be flattened"))?;
        Ok(Field { name: field_name, value, field_type })
    };
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| scalar(format!("{name}{i}"), item))
            .collect(),
        Value::Object(members) => members
            .iter()
            .map(|(key, item)| scalar(format!("{name}{key}"), item))
            .collect(),
        _ => Ok(vec![scalar(name.to_string(), value)?]),
    }
}

fn children<'a>(name: &str, value: &'a Value) -> Result<Vec<(String, &'a Value)>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.iter().enumerate().map(|(i, child)| (i.to_string(), child)).collect()),
        Value::Object(members) => Ok(members.iter().map(|(key, child)| (key.clone(), child)).collect()),
        _ => Err(Error::unsupported_value(name, "\"complex\" fields need a collection of objects")),
    }
}

/// Null, false, zero, empty strings and empty collections.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(members) => members.is_empty(),
    }
}

fn scalar_text(attribute: &str, value: &Value) -> Result<String> {
    FieldValue::from_json(value)
        .map(|v| v.to_string())
        .ok_or_else(|| Error::unsupported_value(attribute, "expected a scalar value"))
}
