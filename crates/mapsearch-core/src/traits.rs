use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{Document, QueryHit, SearchQuery};

/// A domain object that can be mapped to a search document.
///
/// The object is serialized into a JSON object graph that field evaluators
/// read from; `class_name` selects its mapping metadata.
pub trait Searchable: Serialize {
    fn class_name(&self) -> &str;
}

/// Contract every search backend implements.
///
/// Index names passed to `index`, `deindex` and `search` are already
/// localized. `purge` and `flush` take logical names and cover every
/// physical variant. Backend failures surface as `Error::Adapter`.
pub trait Adapter: Send + Sync {
    /// Identity reported under the `Adapter` status key.
    fn name(&self) -> &str;

    /// Upsert by `document.id`.
    fn index(&self, document: &Document, index_name: &str) -> Result<()>;

    /// Remove by id. Removing an absent document is not an error.
    fn deindex(&self, document: &Document, index_name: &str) -> Result<()>;

    /// Destroy and recreate every physical variant of `index_name`.
    fn purge(&self, index_name: &str) -> Result<()>;

    fn search(&self, query: &SearchQuery) -> Result<Vec<QueryHit>>;

    fn status(&self) -> Result<BTreeMap<String, String>>;

    fn list_indexes(&self) -> Result<Vec<String>>;

    fn flush(&self, index_names: &[String]) -> Result<()>;
}

impl<A: Adapter + ?Sized> Adapter for Arc<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn index(&self, document: &Document, index_name: &str) -> Result<()> {
        (**self).index(document, index_name)
    }

    fn deindex(&self, document: &Document, index_name: &str) -> Result<()> {
        (**self).deindex(document, index_name)
    }

    fn purge(&self, index_name: &str) -> Result<()> {
        (**self).purge(index_name)
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<QueryHit>> {
        (**self).search(query)
    }

    fn status(&self) -> Result<BTreeMap<String, String>> {
        (**self).status()
    }

    fn list_indexes(&self) -> Result<Vec<String>> {
        (**self).list_indexes()
    }

    fn flush(&self, index_names: &[String]) -> Result<()> {
        (**self).flush(index_names)
    }
}
