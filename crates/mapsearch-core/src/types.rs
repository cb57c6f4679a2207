//! Domain types passed between the manager, the projector and adapters.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use crate::localization::LocalizationStrategy;
use crate::traits::Searchable;

pub type DocumentId = String;

/// Declared type of an emitted field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Integer,
    Float,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar field value. Composite values never reach a `Field`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Convert a scalar JSON value. Arrays and objects yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    /// Null renders as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One named, typed value within a `Document`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>, field_type: FieldType) -> Self {
        Self { name: name.into(), value: value.into(), field_type }
    }
}

/// The normalized record handed to adapters.
///
/// - `id`: unique within an index and class
/// - `class`: origin class tag, used to dispatch on hits
/// - `title`/`url`/`description`/`image_url`: promoted well-known fields
/// - `fields`: every other mapped value, names unique after projection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub class: String,
    pub locale: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub fields: Vec<Field>,
}

impl Document {
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        Self { id: id.into(), class: class.into(), ..Self::default() }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Insert or replace by name so names stay unique.
    pub fn set_field(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// A backend search result. Order is defined by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryHit {
    pub id: DocumentId,
    pub score: f32,
    pub document: Document,
}

impl QueryHit {
    pub fn new(document: Document, score: f32) -> Self {
        Self { id: document.id.clone(), score, document }
    }
}

/// Immutable search request passed to adapters.
///
/// An empty index set means "every index", which the manager rejects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchQuery {
    query_string: String,
    index_names: BTreeSet<String>,
    locale: Option<String>,
    limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(query_string: impl Into<String>) -> Self {
        Self { query_string: query_string.into(), ..Self::default() }
    }

    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_names.insert(index_name.into());
        self
    }

    pub fn with_indexes<I, S>(mut self, index_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_names.extend(index_names.into_iter().map(Into::into));
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn index_names(&self) -> &BTreeSet<String> {
        &self.index_names
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn has_index_scope(&self) -> bool {
        !self.index_names.is_empty()
    }

    /// Copy of this query whose index names are the physical names for its locale.
    pub fn localized(&self, strategy: &dyn LocalizationStrategy) -> Self {
        let index_names = self
            .index_names
            .iter()
            .map(|name| strategy.localize_index_name(name, self.locale()))
            .collect();
        Self { index_names, ..self.clone() }
    }
}

/// A class-tagged object without a static Rust type, e.g. a row read from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub class: String,
    pub data: serde_json::Value,
}

impl Record {
    pub fn new(class: impl Into<String>, data: serde_json::Value) -> Self {
        Self { class: class.into(), data }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl Searchable for Record {
    fn class_name(&self) -> &str {
        &self.class
    }
}
