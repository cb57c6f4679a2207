mod common;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use mapsearch_core::{
    Error, FieldMapping, FieldMappingTable, FieldType, FieldValue, IndexMetadata, JsonPointerEvaluator,
    MappingType, Projector, PropertyPathEvaluator,
};
use proptest::prelude::*;
use serde_json::{json, Value};

use common::{product, product_metadata};

fn projector() -> Projector {
    Projector::new(Arc::new(PropertyPathEvaluator))
}

fn to_value(p: &common::Product) -> Value {
    serde_json::to_value(p).unwrap()
}

#[test]
fn projects_promoted_attributes_and_category() {
    let doc = projector().project(&product_metadata(), &to_value(&product(7, "Kettle"))).unwrap();
    assert_eq!(doc.id, "7");
    assert_eq!(doc.class, "Product");
    assert_eq!(doc.title.as_deref(), Some("Kettle"));
    assert_eq!(doc.description.as_deref(), Some("Kettle description"));
    assert_eq!(doc.url.as_deref(), Some("/p/7"));
    assert_eq!(doc.image_url.as_deref(), Some("/img/7.png"));
    assert_eq!(doc.category.as_deref(), Some("Shop"));
    assert_eq!(doc.locale, None);
}

#[test]
fn multi_valued_leaf_is_index_keyed() {
    let doc = projector().project(&product_metadata(), &to_value(&product(1, "Kettle"))).unwrap();
    assert_eq!(doc.field("tags0").unwrap().value, FieldValue::from("kitchen"));
    assert_eq!(doc.field("tags1").unwrap().value, FieldValue::from("steel"));
    assert!(doc.field("tags").is_none());
    assert!(doc.field("tags2").is_none());
}

#[test]
fn complex_mapping_recurses_with_prefix() {
    let doc = projector().project(&product_metadata(), &to_value(&product(1, "Kettle"))).unwrap();
    let names: Vec<_> = doc.field_names().collect();
    assert_eq!(names, ["tags0", "tags1", "author0name", "author1name"]);
    assert_eq!(doc.field("author0name").unwrap().value, FieldValue::from("X"));
    assert_eq!(doc.field("author1name").unwrap().value, FieldValue::from("Y"));
    assert_eq!(doc.field("author1name").unwrap().field_type, FieldType::Text);
}

#[test]
fn empty_values_leave_promoted_attributes_unset() {
    let mut p = product(1, "");
    p.description = String::new();
    p.slug = String::new();
    p.image = None;
    let doc = projector().project(&product_metadata(), &to_value(&p)).unwrap();
    assert_eq!(doc.title, None);
    assert_eq!(doc.description, None);
    assert_eq!(doc.url, None);
    assert_eq!(doc.locale, None);
    // image url is set even when empty
    assert_eq!(doc.image_url.as_deref(), Some(""));
}

#[test]
fn falsy_scalars_count_as_empty() {
    let metadata = IndexMetadata::new("Row", "rows").with_id_field("id").with_title_field("title");
    for title in [json!(0), json!(false), json!([]), json!({})] {
        let doc = projector().project(&metadata, &json!({ "id": "r", "title": title })).unwrap();
        assert_eq!(doc.title, None);
    }
    let doc = projector().project(&metadata, &json!({ "id": "r", "title": 12 })).unwrap();
    assert_eq!(doc.title.as_deref(), Some("12"));
}

#[test]
fn locale_is_promoted() {
    let mut p = product(1, "Bouilloire");
    p.locale = Some("fr".to_string());
    let doc = projector().project(&product_metadata(), &to_value(&p)).unwrap();
    assert_eq!(doc.locale.as_deref(), Some("fr"));
}

#[test]
fn complex_without_nested_table_fails_closed() {
    let broken = FieldMapping { source: Some("authors".into()), mapping_type: Some(MappingType::Complex), mapping: None };
    let metadata = product_metadata().with_field("broken", broken);
    let err = projector().project(&metadata, &to_value(&product(1, "Kettle"))).unwrap_err();
    match err {
        Error::MalformedMapping { field, .. } => assert_eq!(field, "broken"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nested_malformed_entry_fails_before_any_evaluation() {
    let missing_type = FieldMapping { source: Some("name".into()), mapping_type: None, mapping: None };
    let metadata = IndexMetadata::new("Row", "rows")
        .with_id_field("id")
        .with_field("children", FieldMapping::complex("children", FieldMappingTable::new().with("name", missing_type)));
    // `children` is absent from the object, so only up-front validation can catch this
    let err = projector().project(&metadata, &json!({ "id": 1 })).unwrap_err();
    assert!(matches!(err, Error::MalformedMapping { .. }), "{err}");
}

#[test]
fn entry_without_source_is_malformed() {
    let metadata = IndexMetadata::new("Row", "rows")
        .with_id_field("id")
        .with_field("name", FieldMapping { source: None, mapping_type: Some(MappingType::String), mapping: None });
    assert!(matches!(
        projector().project(&metadata, &json!({ "id": 1, "name": "a" })),
        Err(Error::MalformedMapping { .. })
    ));
}

#[test]
fn missing_id_field_is_malformed() {
    let metadata = IndexMetadata::new("Row", "rows");
    assert!(matches!(projector().project(&metadata, &json!({ "id": 1 })), Err(Error::MalformedMapping { .. })));
}

#[test]
fn unreadable_path_surfaces_path_not_found() {
    let metadata = product_metadata().with_field("sku", FieldMapping::leaf("sku", FieldType::String));
    let err = projector().project(&metadata, &to_value(&product(1, "Kettle"))).unwrap_err();
    assert!(matches!(err, Error::PathNotFound { ref path, .. } if path == "sku"), "{err}");
}

#[test]
fn nested_collection_in_leaf_is_unsupported() {
    let metadata = IndexMetadata::new("Row", "rows")
        .with_id_field("id")
        .with_field("grid", FieldMapping::leaf("grid", FieldType::Integer));
    let err = projector().project(&metadata, &json!({ "id": 1, "grid": [[1, 2], [3]] })).unwrap_err();
    assert!(matches!(err, Error::UnsupportedValue { ref field, .. } if field == "grid0"), "{err}");
}

#[test]
fn object_valued_leaf_is_key_keyed() {
    let metadata = IndexMetadata::new("Row", "rows")
        .with_id_field("id")
        .with_field("size", FieldMapping::leaf("size", FieldType::Integer));
    let doc = projector().project(&metadata, &json!({ "id": 1, "size": { "w": 3, "h": 4 } })).unwrap();
    assert_eq!(doc.field("sizew").unwrap().value, FieldValue::Int(3));
    assert_eq!(doc.field("sizeh").unwrap().value, FieldValue::Int(4));
}

#[test]
fn null_complex_source_yields_no_children() {
    let metadata = product_metadata();
    let mut value = to_value(&product(1, "Kettle"));
    value["authors"] = Value::Null;
    let doc = projector().project(&metadata, &value).unwrap();
    assert!(doc.field_names().all(|n| !n.starts_with("author")));
}

#[test]
fn scalar_complex_source_is_unsupported() {
    let mut value = to_value(&product(1, "Kettle"));
    value["authors"] = json!("nobody");
    assert!(matches!(
        projector().project(&product_metadata(), &value),
        Err(Error::UnsupportedValue { .. })
    ));
}

#[test]
fn json_pointer_evaluator_drives_projection() {
    let metadata = IndexMetadata::new("Row", "rows")
        .with_id_field("/meta/id")
        .with_title_field("/title")
        .with_field("first", FieldMapping::leaf("/tags/0", FieldType::String));
    let doc = Projector::new(Arc::new(JsonPointerEvaluator))
        .project(&metadata, &json!({ "meta": { "id": "abc" }, "title": "T", "tags": ["x", "y"] }))
        .unwrap();
    assert_eq!(doc.id, "abc");
    assert_eq!(doc.title.as_deref(), Some("T"));
    assert_eq!(doc.field("first").unwrap().value, FieldValue::from("x"));
}

#[test]
fn each_level_is_populated_independently() {
    let inner = FieldMappingTable::new().with("name", FieldMapping::leaf("name", FieldType::String));
    let fields = projector().populate(&json!({ "name": "Z" }), &inner, "author3").unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "author3name");
}

#[derive(Debug, Clone)]
enum Shape {
    Scalar,
    Many(usize),
    Nested(usize, BTreeMap<String, Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![Just(Shape::Scalar), (0usize..13).prop_map(Shape::Many)];
    leaf.prop_recursive(3, 24, 4, |inner| {
        (0usize..4, prop::collection::btree_map("[a-z]{1,4}", inner, 1..4))
            .prop_map(|(n, children)| Shape::Nested(n, children))
    })
}

/// Mapping table, matching object and the number of leaves it yields.
fn build(shapes: &BTreeMap<String, Shape>) -> (FieldMappingTable, serde_json::Map<String, Value>, usize) {
    let mut table = FieldMappingTable::new();
    let mut object = serde_json::Map::new();
    let mut leaves = 0;
    for (name, shape) in shapes {
        match shape {
            Shape::Scalar => {
                table.insert(name.clone(), FieldMapping::leaf(name.clone(), FieldType::String));
                object.insert(name.clone(), json!("v"));
                leaves += 1;
            }
            Shape::Many(n) => {
                table.insert(name.clone(), FieldMapping::leaf(name.clone(), FieldType::String));
                object.insert(name.clone(), Value::Array(vec![json!("v"); *n]));
                leaves += n;
            }
            Shape::Nested(n, children) => {
                let (nested, child, child_leaves) = build(children);
                table.insert(name.clone(), FieldMapping::complex(name.clone(), nested));
                object.insert(name.clone(), Value::Array(vec![Value::Object(child); *n]));
                leaves += n * child_leaves;
            }
        }
    }
    (table, object, leaves)
}

proptest! {
    #[test]
    fn field_names_are_unique(shapes in prop::collection::btree_map("[a-z]{1,4}", shape(), 1..5)) {
        let (table, mut object, leaves) = build(&shapes);
        object.insert("ID".to_string(), json!(1));
        let metadata = IndexMetadata::new("Gen", "gen").with_id_field("ID").with_field_mapping(table);

        let doc = projector().project(&metadata, &Value::Object(object)).unwrap();
        let unique: HashSet<_> = doc.field_names().collect();
        prop_assert_eq!(doc.fields.len(), leaves);
        prop_assert_eq!(unique.len(), leaves);
    }
}
