//! In-process adapter keeping documents in memory.
//!
//! Writes are visible immediately; `flush` is a no-op apart from logging.
//! Matching is a case-insensitive substring test of the query against the
//! promoted text attributes and every field value. The score is the number of
//! matching values.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::localization::{LocalizationStrategy, NoopStrategy};
use crate::traits::Adapter;
use crate::types::{Document, QueryHit, SearchQuery};

type Store = IndexMap<String, IndexMap<String, Document>>;

pub struct MemoryAdapter {
    indexes: RwLock<Store>,
    localization: Arc<dyn LocalizationStrategy>,
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self { indexes: RwLock::new(IndexMap::new()), localization: Arc::new(NoopStrategy) }
    }

    pub fn with_localization(mut self, localization: Arc<dyn LocalizationStrategy>) -> Self {
        self.localization = localization;
        self
    }

    pub fn get(&self, index_name: &str, id: &str) -> Option<Document> {
        self.indexes.read().get(index_name).and_then(|docs| docs.get(id)).cloned()
    }

    pub fn len(&self, index_name: &str) -> usize {
        self.indexes.read().get(index_name).map_or(0, IndexMap::len)
    }

    pub fn is_empty(&self, index_name: &str) -> bool {
        self.len(index_name) == 0
    }
}

impl Adapter for MemoryAdapter {
    fn name(&self) -> &str {
        "memory"
    }

    fn index(&self, document: &Document, index_name: &str) -> Result<()> {
        self.indexes
            .write()
            .entry(index_name.to_string())
            .or_default()
            .insert(document.id.clone(), document.clone());
        Ok(())
    }

    fn deindex(&self, document: &Document, index_name: &str) -> Result<()> {
        if let Some(docs) = self.indexes.write().get_mut(index_name) {
            docs.shift_remove(&document.id);
        }
        Ok(())
    }

    fn purge(&self, index_name: &str) -> Result<()> {
        let mut indexes = self.indexes.write();
        for (name, docs) in indexes.iter_mut() {
            if self.localization.is_variant_of(index_name, name) {
                tracing::debug!(index = %name, removed = docs.len(), "purged memory index");
                docs.clear();
            }
        }
        Ok(())
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<QueryHit>> {
        let needle = query.query_string().to_lowercase();
        let indexes = self.indexes.read();
        let mut hits: Vec<QueryHit> = query
            .index_names()
            .iter()
            .filter_map(|name| indexes.get(name))
            .flat_map(IndexMap::values)
            .filter_map(|doc| {
                let score = match_count(doc, &needle);
                (score > 0).then(|| QueryHit::new(doc.clone(), score as f32))
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(limit) = query.limit() {
            hits.truncate(limit);
        }
        Ok(hits)
    }

    fn status(&self) -> Result<BTreeMap<String, String>> {
        let indexes = self.indexes.read();
        let mut status = BTreeMap::new();
        status.insert("indexes".to_string(), indexes.len().to_string());
        for (name, docs) in indexes.iter() {
            status.insert(format!("idx:{name}.num_docs"), docs.len().to_string());
        }
        Ok(status)
    }

    fn list_indexes(&self) -> Result<Vec<String>> {
        Ok(self.indexes.read().keys().cloned().collect())
    }

    fn flush(&self, index_names: &[String]) -> Result<()> {
        tracing::trace!(indexes = ?index_names, "memory flush");
        Ok(())
    }
}

fn match_count(doc: &Document, needle: &str) -> usize {
    if needle.is_empty() {
        return 1;
    }
    let promoted = [&doc.title, &doc.description, &doc.url]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .filter(|text| text.to_lowercase().contains(needle))
        .count();
    let fields = doc
        .fields
        .iter()
        .filter(|f| f.value.to_string().to_lowercase().contains(needle))
        .count();
    promoted + fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldType};

    fn doc(id: &str, title: &str) -> Document {
        let mut d = Document::new(id, "Product");
        d.title = Some(title.to_string());
        d
    }

    #[test]
    fn upsert_and_remove() {
        let adapter = MemoryAdapter::new();
        adapter.index(&doc("1", "Kettle"), "products").unwrap();
        adapter.index(&doc("1", "Steel kettle"), "products").unwrap();
        assert_eq!(adapter.len("products"), 1);
        assert_eq!(adapter.get("products", "1").unwrap().title.as_deref(), Some("Steel kettle"));

        adapter.deindex(&doc("1", ""), "products").unwrap();
        adapter.deindex(&doc("404", ""), "products").unwrap();
        adapter.deindex(&doc("1", ""), "missing").unwrap();
        assert!(adapter.is_empty("products"));
    }

    #[test]
    fn search_ranks_by_matching_values() {
        let adapter = MemoryAdapter::new();
        let mut strong = doc("1", "Red kettle");
        strong.fields.push(Field::new("color", "red", FieldType::String));
        adapter.index(&doc("2", "Red mug"), "products").unwrap();
        adapter.index(&strong, "products").unwrap();
        adapter.index(&doc("3", "Blue mug"), "products").unwrap();

        let hits = adapter.search(&SearchQuery::new("RED").with_index("products")).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(hits[0].score, 2.0);

        let limited = adapter.search(&SearchQuery::new("mug").with_index("products").with_limit(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }
}
