//! Declarative per-class mapping metadata and the driver that resolves it.
//!
//! Metadata is immutable once registered and shared as `Arc<IndexMetadata>`.
//! Field mapping tables keep declaration order; sibling names are unique by
//! construction.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::FieldType;

/// Declared type of a mapping entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Complex,
}

impl MappingType {
    /// The leaf field type, `None` for `complex`.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Self::String => Some(FieldType::String),
            Self::Text => Some(FieldType::Text),
            Self::Integer => Some(FieldType::Integer),
            Self::Float => Some(FieldType::Float),
            Self::Boolean => Some(FieldType::Boolean),
            Self::Complex => None,
        }
    }
}

impl From<FieldType> for MappingType {
    fn from(t: FieldType) -> Self {
        match t {
            FieldType::String => Self::String,
            FieldType::Text => Self::Text,
            FieldType::Integer => Self::Integer,
            FieldType::Float => Self::Float,
            FieldType::Boolean => Self::Boolean,
        }
    }
}

/// One entry of a field mapping table.
///
/// Every part is optional so that incomplete mappings survive loading and
/// are rejected when validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldMapping {
    #[serde(rename = "field", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mapping_type: Option<MappingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<FieldMappingTable>,
}

/// A validated view of a `FieldMapping`.
#[derive(Debug, Clone, Copy)]
pub enum MappingKind<'a> {
    Leaf(FieldType),
    Complex(&'a FieldMappingTable),
}

impl FieldMapping {
    pub fn leaf(source: impl Into<String>, field_type: FieldType) -> Self {
        Self { source: Some(source.into()), mapping_type: Some(field_type.into()), mapping: None }
    }

    pub fn complex(source: impl Into<String>, mapping: FieldMappingTable) -> Self {
        Self { source: Some(source.into()), mapping_type: Some(MappingType::Complex), mapping: Some(mapping) }
    }

    /// Source path and kind, or `MalformedMapping` naming `name`.
    pub fn resolve(&self, name: &str) -> Result<(&str, MappingKind<'_>)> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| Error::malformed(name, "mapping has no source field"))?;
        let mapping_type = self
            .mapping_type
            .ok_or_else(|| Error::malformed(name, "mapping has no type"))?;
        let kind = match mapping_type.field_type() {
            Some(field_type) => MappingKind::Leaf(field_type),
            None => MappingKind::Complex(self.mapping.as_ref().ok_or_else(|| {
                Error::malformed(name, "\"complex\" mappings require a nested mapping table")
            })?),
        };
        Ok((source, kind))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FieldMappingTable(IndexMap<String, FieldMapping>);

impl FieldMappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.insert(name, mapping);
        self
    }

    /// Replaces any existing entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, mapping: FieldMapping) {
        self.0.insert(name.into(), mapping);
    }

    pub fn get(&self, name: &str) -> Option<&FieldMapping> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldMapping)> {
        self.0.iter().map(|(name, mapping)| (name.as_str(), mapping))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check every entry, nested tables included.
    pub fn validate(&self) -> Result<()> {
        for (name, mapping) in self.iter() {
            if let (_, MappingKind::Complex(nested)) = mapping.resolve(name)? {
                nested.validate()?;
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, FieldMapping)> for FieldMappingTable {
    fn from_iter<I: IntoIterator<Item = (S, FieldMapping)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, mapping)| (name.into(), mapping)).collect())
    }
}

/// Mapping metadata for one class.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndexMetadata {
    /// Filled from the table key when loaded from configuration.
    #[serde(default)]
    pub class_name: String,
    pub index_name: String,
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default)]
    pub title_field: Option<String>,
    #[serde(default)]
    pub url_field: Option<String>,
    #[serde(default)]
    pub description_field: Option<String>,
    #[serde(default)]
    pub image_url_field: Option<String>,
    #[serde(default)]
    pub locale_field: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(rename = "fields", default)]
    pub field_mapping: FieldMappingTable,
}

impl IndexMetadata {
    pub fn new(class_name: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self { class_name: class_name.into(), index_name: index_name.into(), ..Self::default() }
    }

    pub fn with_id_field(mut self, path: impl Into<String>) -> Self {
        self.id_field = Some(path.into());
        self
    }

    pub fn with_title_field(mut self, path: impl Into<String>) -> Self {
        self.title_field = Some(path.into());
        self
    }

    pub fn with_url_field(mut self, path: impl Into<String>) -> Self {
        self.url_field = Some(path.into());
        self
    }

    pub fn with_description_field(mut self, path: impl Into<String>) -> Self {
        self.description_field = Some(path.into());
        self
    }

    pub fn with_image_url_field(mut self, path: impl Into<String>) -> Self {
        self.image_url_field = Some(path.into());
        self
    }

    pub fn with_locale_field(mut self, path: impl Into<String>) -> Self {
        self.locale_field = Some(path.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_name = Some(category.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.field_mapping.insert(name, mapping);
        self
    }

    pub fn with_field_mapping(mut self, table: FieldMappingTable) -> Self {
        self.field_mapping = table;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_field.as_deref().map_or(true, str::is_empty) {
            return Err(Error::malformed(&self.class_name, "no id field declared"));
        }
        self.field_mapping.validate()
    }
}

/// Resolves the metadata of a class by name.
pub trait MetadataDriver: Send + Sync {
    /// Fails with `Error::MetadataNotFound` when the class is not mapped.
    fn resolve(&self, class_name: &str) -> Result<Arc<IndexMetadata>>;

    /// Every known metadata, in a stable order.
    fn all(&self) -> Vec<Arc<IndexMetadata>>;
}

/// In-process metadata store keyed by class name.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entries: HashMap<String, Arc<IndexMetadata>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metadata: IndexMetadata) -> Self {
        self.register(metadata);
        self
    }

    /// Replaces any metadata already registered for the class.
    pub fn register(&mut self, metadata: IndexMetadata) {
        self.entries.insert(metadata.class_name.clone(), Arc::new(metadata));
    }

    /// Load `[mappings.<ClassName>]` tables, validating each one.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mappings: IndexMap<String, IndexMetadata> = config.get_or_default("mappings")?;
        let mut registry = Self::new();
        for (class_name, mut metadata) in mappings {
            metadata.class_name = class_name;
            metadata.validate()?;
            tracing::debug!(class = %metadata.class_name, index = %metadata.index_name, "registered mapping");
            registry.register(metadata);
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataDriver for MetadataRegistry {
    fn resolve(&self, class_name: &str) -> Result<Arc<IndexMetadata>> {
        self.entries
            .get(class_name)
            .cloned()
            .ok_or_else(|| Error::MetadataNotFound(class_name.to_string()))
    }

    fn all(&self) -> Vec<Arc<IndexMetadata>> {
        let mut all: Vec<_> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        all
    }
}
