//! The search manager: metadata lookup, projection, hooks and adapter calls.
//!
//! The manager keeps no state between calls beyond its collaborators.
//! Every operation is one blocking call; errors propagate unchanged.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::evaluator::FieldEvaluator;
use crate::hooks::{HitEvent, HookDispatcher, PreIndexEvent, SearchEvent};
use crate::localization::{LocalizationStrategy, NoopStrategy};
use crate::metadata::{IndexMetadata, MetadataDriver};
use crate::projector::Projector;
use crate::traits::{Adapter, Searchable};
use crate::types::{Document, QueryHit, SearchQuery};

pub const ADAPTER_STATUS_KEY: &str = "Adapter";

pub struct SearchManager {
    adapter: Box<dyn Adapter>,
    metadata: Arc<dyn MetadataDriver>,
    projector: Projector,
    localization: Arc<dyn LocalizationStrategy>,
    hooks: HookDispatcher,
    default_limit: Option<usize>,
}

impl SearchManager {
    pub fn new(
        adapter: Box<dyn Adapter>,
        metadata: Arc<dyn MetadataDriver>,
        evaluator: Arc<dyn FieldEvaluator>,
    ) -> Self {
        Self {
            adapter,
            metadata,
            projector: Projector::new(evaluator),
            localization: Arc::new(NoopStrategy),
            hooks: HookDispatcher::new(),
            default_limit: None,
        }
    }

    pub fn with_localization(mut self, localization: Arc<dyn LocalizationStrategy>) -> Self {
        self.localization = localization;
        self
    }

    pub fn with_hooks(mut self, hooks: HookDispatcher) -> Self {
        self.hooks = hooks;
        self
    }

    /// Limit applied to queries that do not set one.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = Some(limit);
        self
    }

    pub fn hooks_mut(&mut self) -> &mut HookDispatcher {
        &mut self.hooks
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    pub fn localization(&self) -> &dyn LocalizationStrategy {
        self.localization.as_ref()
    }

    /// Project without writing anything.
    pub fn project<T: Searchable>(&self, object: &T) -> Result<Document> {
        let metadata = self.metadata.resolve(object.class_name())?;
        let subject = serde_json::to_value(object)?;
        self.projector.project(&metadata, &subject)
    }

    pub fn index<T: Searchable>(&self, object: &T) -> Result<()> {
        let metadata = self.metadata.resolve(object.class_name())?;
        let subject = serde_json::to_value(object)?;
        let mut document = self.projector.project(&metadata, &subject)?;
        let index_name = self
            .localization
            .localize_index_name(&metadata.index_name, document.locale.as_deref());

        self.hooks.dispatch_pre_index(&mut PreIndexEvent {
            subject: &subject,
            document: &mut document,
            metadata: &metadata,
        })?;

        tracing::debug!(class = %metadata.class_name, id = %document.id, index = %index_name, "index");
        self.adapter.index(&document, &index_name)
    }

    pub fn deindex<T: Searchable>(&self, object: &T) -> Result<()> {
        let metadata = self.metadata.resolve(object.class_name())?;
        let subject = serde_json::to_value(object)?;
        let document = self.projector.project(&metadata, &subject)?;
        let index_name = self
            .localization
            .localize_index_name(&metadata.index_name, document.locale.as_deref());

        tracing::debug!(class = %metadata.class_name, id = %document.id, index = %index_name, "deindex");
        self.adapter.deindex(&document, &index_name)
    }

    /// Run `query` against its index scope; hits keep the adapter's order.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<QueryHit>> {
        if !query.has_index_scope() {
            return Err(Error::UnsupportedOperation(
                "searching all indexes is not supported; name at least one index".to_string(),
            ));
        }

        self.hooks.dispatch_pre_search(&SearchEvent { query })?;

        let mut physical = query.localized(self.localization.as_ref());
        if physical.limit().is_none() {
            if let Some(limit) = self.default_limit {
                physical = physical.with_limit(limit);
            }
        }
        tracing::debug!(query = %physical.query_string(), indexes = ?physical.index_names(), "search");
        let mut hits = self.adapter.search(&physical)?;

        let mut resolved: HashMap<String, Option<Arc<IndexMetadata>>> = HashMap::new();
        for hit in &mut hits {
            let class = hit.document.class.clone();
            let metadata = match resolved.get(&class) {
                Some(cached) => cached.clone(),
                None => {
                    let lookup = match self.metadata.resolve(&class) {
                        Ok(metadata) => Some(metadata),
                        Err(Error::MetadataNotFound(_)) => None,
                        Err(e) => return Err(e),
                    };
                    resolved.insert(class.clone(), lookup.clone());
                    lookup
                }
            };
            match metadata {
                Some(metadata) => self.hooks.dispatch_post_hit(&mut HitEvent { hit, metadata: &metadata })?,
                None => tracing::debug!(class = %class, id = %hit.id, "no mapping for hit class, skipping post-hit"),
            }
        }
        Ok(hits)
    }

    pub fn create_search(&self, query_string: impl Into<String>) -> SearchQueryBuilder<'_> {
        SearchQueryBuilder { manager: self, query: SearchQuery::new(query_string) }
    }

    /// `Adapter` first, then the adapter's own entries. Keys already present win.
    pub fn status(&self) -> Result<BTreeMap<String, String>> {
        let mut status = BTreeMap::new();
        status.insert(ADAPTER_STATUS_KEY.to_string(), self.adapter.name().to_string());
        for (key, value) in self.adapter.status()? {
            status.entry(key).or_insert(value);
        }
        Ok(status)
    }

    /// Distinct category names declared across all mappings.
    pub fn category_names(&self) -> Vec<String> {
        self.metadata
            .all()
            .iter()
            .filter_map(|m| m.category_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Purge every physical variant of a logical index.
    pub fn purge(&self, index_name: &str) -> Result<()> {
        tracing::debug!(index = %index_name, "purge");
        self.adapter.purge(index_name)
    }

    pub fn list_indexes(&self) -> Result<Vec<String>> {
        self.adapter.list_indexes()
    }

    /// Flush every logical index declared by the registered mappings.
    pub fn flush(&self) -> Result<()> {
        let names: Vec<String> = self
            .metadata
            .all()
            .iter()
            .map(|m| m.index_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        tracing::debug!(indexes = ?names, "flush");
        self.adapter.flush(&names)
    }
}

impl std::fmt::Debug for SearchManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchManager")
            .field("adapter", &self.adapter.name())
            .field("hooks", &self.hooks)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}

/// Fluent query construction bound to a manager.
#[must_use]
pub struct SearchQueryBuilder<'m> {
    manager: &'m SearchManager,
    query: SearchQuery,
}

impl<'m> SearchQueryBuilder<'m> {
    pub fn index(mut self, index_name: impl Into<String>) -> Self {
        self.query = self.query.with_index(index_name);
        self
    }

    pub fn indexes<I, S>(mut self, index_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query = self.query.with_indexes(index_names);
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.query = self.query.with_locale(locale);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query = self.query.with_limit(limit);
        self
    }

    pub fn execute(self) -> Result<Vec<QueryHit>> {
        self.manager.search(&self.query)
    }
}
