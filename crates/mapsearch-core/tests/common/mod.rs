#![allow(dead_code)]

use std::sync::Arc;

use mapsearch_core::{
    Adapter, FieldMapping, FieldMappingTable, FieldType, IndexMetadata, MemoryAdapter, MetadataRegistry,
    PropertyPathEvaluator, Searchable, SearchManager,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub locale: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub authors: Vec<Author>,
}

impl Searchable for Product {
    fn class_name(&self) -> &str {
        "Product"
    }
}

pub fn product(id: u32, title: &str) -> Product {
    Product {
        id,
        title: title.to_string(),
        description: format!("{title} description"),
        slug: format!("/p/{id}"),
        locale: None,
        image: Some(format!("/img/{id}.png")),
        tags: vec!["kitchen".to_string(), "steel".to_string()],
        authors: vec![Author { name: "X".to_string() }, Author { name: "Y".to_string() }],
    }
}

pub fn product_metadata() -> IndexMetadata {
    IndexMetadata::new("Product", "product")
        .with_id_field("id")
        .with_title_field("title")
        .with_description_field("description")
        .with_url_field("slug")
        .with_locale_field("locale")
        .with_image_url_field("image")
        .with_category("Shop")
        .with_field("tags", FieldMapping::leaf("tags", FieldType::String))
        .with_field(
            "author",
            FieldMapping::complex(
                "authors",
                FieldMappingTable::new().with("name", FieldMapping::leaf("name", FieldType::Text)),
            ),
        )
}

pub fn registry() -> MetadataRegistry {
    MetadataRegistry::new().with(product_metadata())
}

/// A manager over a shared memory adapter the test can inspect.
pub fn memory_manager() -> (SearchManager, Arc<MemoryAdapter>) {
    let adapter = Arc::new(MemoryAdapter::new());
    let boxed: Box<dyn Adapter> = Box::new(adapter.clone());
    let manager = SearchManager::new(boxed, Arc::new(registry()), Arc::new(PropertyPathEvaluator));
    (manager, adapter)
}
