use std::path::Path;

use mapsearch_core::config::{expand_path, resolve_with_base, AdapterKind, SearchSettings};
use mapsearch_core::localization::StrategyKind;
use mapsearch_core::{
    Config, Error, EvaluatorKind, FieldType, LocalizationConfig, MetadataDriver, MetadataRegistry,
};

const CONFIG: &str = r#"
[localization]
strategy = "index"
locales = ["fr", "de"]

[search]
adapter = "memory"
default_limit = 25

[mappings.Product]
index_name = "product"
id_field = "id"
title_field = "title"
image_url_field = "image"
category_name = "Shop"

[mappings.Product.fields.tags]
field = "tags"
type = "string"

[mappings.Product.fields.author]
field = "authors"
type = "complex"
mapping = { name = { field = "name", type = "text" } }

[mappings.Page]
index_name = "pages"
id_field = "[slug]"
"#;

#[test]
fn sections_deserialize() {
    let config = Config::from_toml_str(CONFIG);
    let search = config.search().unwrap();
    assert_eq!(search.adapter, AdapterKind::Memory);
    assert_eq!(search.default_limit, 25);
    assert_eq!(search.evaluator, EvaluatorKind::PropertyPath);

    let localization: LocalizationConfig = config.get("localization").unwrap();
    assert_eq!(localization.strategy, StrategyKind::Index);
    assert_eq!(localization.locales, ["fr", "de"]);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let config = Config::from_toml_str("");
    assert_eq!(config.search().unwrap(), SearchSettings::default());
    assert!(MetadataRegistry::from_config(&config).unwrap().is_empty());
    assert!(matches!(config.get::<LocalizationConfig>("localization"), Err(Error::InvalidConfig(_))));
}

#[test]
fn registry_loads_mappings() {
    let registry = MetadataRegistry::from_config(&Config::from_toml_str(CONFIG)).unwrap();
    assert_eq!(registry.len(), 2);

    let product = registry.resolve("Product").unwrap();
    assert_eq!(product.class_name, "Product");
    assert_eq!(product.index_name, "product");
    assert_eq!(product.category_name.as_deref(), Some("Shop"));
    assert_eq!(product.field_mapping.len(), 2);
    let (source, kind) = product.field_mapping.get("author").unwrap().resolve("author").unwrap();
    assert_eq!(source, "authors");
    match kind {
        mapsearch_core::metadata::MappingKind::Complex(nested) => {
            let name = nested.get("name").unwrap();
            assert_eq!(name.mapping_type.and_then(|t| t.field_type()), Some(FieldType::Text));
        }
        other => panic!("expected a complex mapping, got {other:?}"),
    }

    let classes: Vec<_> = registry.all().iter().map(|m| m.class_name.clone()).collect();
    assert_eq!(classes, ["Page", "Product"]);
    assert!(matches!(registry.resolve("Ghost"), Err(Error::MetadataNotFound(_))));
}

#[test]
fn invalid_mapping_is_rejected_at_load() {
    let config = Config::from_toml_str(
        r#"
        [mappings.Broken]
        index_name = "broken"
        id_field = "id"

        [mappings.Broken.fields.children]
        field = "children"
        type = "complex"
        "#,
    );
    assert!(matches!(MetadataRegistry::from_config(&config), Err(Error::MalformedMapping { .. })));
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = Path::new("/srv/mapsearch");
    assert_eq!(resolve_with_base(base, "data/index"), Path::new("/srv/mapsearch/data/index"));
    assert_eq!(resolve_with_base(base, "/var/index"), Path::new("/var/index"));
    assert_eq!(expand_path("plain/path"), Path::new("plain/path"));
}
