//! Extension points fired by the `SearchManager`.
//!
//! Listeners are plain closures registered on a `HookDispatcher`, which the
//! manager owns. They run synchronously in registration order and the first
//! failure aborts the rest of the call.

use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};
use crate::metadata::IndexMetadata;
use crate::types::{Document, QueryHit, SearchQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    PreIndex,
    PreSearch,
    PostHit,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreIndex => "pre-index",
            Self::PreSearch => "pre-search",
            Self::PostHit => "post-hit",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fired after projection, before the adapter write. Listeners may change
/// `document`; later listeners and the adapter see the changes.
pub struct PreIndexEvent<'a> {
    /// The object graph the document was projected from.
    pub subject: &'a Value,
    pub document: &'a mut Document,
    pub metadata: &'a IndexMetadata,
}

/// Fired before a query reaches the adapter. Read-only.
pub struct SearchEvent<'a> {
    pub query: &'a SearchQuery,
}

/// Fired once per hit whose class still has metadata.
pub struct HitEvent<'a> {
    pub hit: &'a mut QueryHit,
    pub metadata: &'a IndexMetadata,
}

type PreIndexListener = Box<dyn Fn(&mut PreIndexEvent<'_>) -> anyhow::Result<()> + Send + Sync>;
type SearchListener = Box<dyn Fn(&SearchEvent<'_>) -> anyhow::Result<()> + Send + Sync>;
type HitListener = Box<dyn Fn(&mut HitEvent<'_>) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
pub struct HookDispatcher {
    pre_index: Vec<PreIndexListener>,
    pre_search: Vec<SearchListener>,
    post_hit: Vec<HitListener>,
}

impl HookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pre_index<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&mut PreIndexEvent<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.pre_index.push(Box::new(listener));
        self
    }

    pub fn on_pre_search<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&SearchEvent<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.pre_search.push(Box::new(listener));
        self
    }

    pub fn on_post_hit<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&mut HitEvent<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.post_hit.push(Box::new(listener));
        self
    }

    pub(crate) fn dispatch_pre_index(&self, event: &mut PreIndexEvent<'_>) -> Result<()> {
        for listener in &self.pre_index {
            listener(&mut *event).map_err(|source| Error::Listener { hook: HookKind::PreIndex, source })?;
        }
        Ok(())
    }

    pub(crate) fn dispatch_pre_search(&self, event: &SearchEvent<'_>) -> Result<()> {
        for listener in &self.pre_search {
            listener(event).map_err(|source| Error::Listener { hook: HookKind::PreSearch, source })?;
        }
        Ok(())
    }

    pub(crate) fn dispatch_post_hit(&self, event: &mut HitEvent<'_>) -> Result<()> {
        for listener in &self.post_hit {
            listener(&mut *event).map_err(|source| Error::Listener { hook: HookKind::PostHit, source })?;
        }
        Ok(())
    }
}

impl fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("pre_index", &self.pre_index.len())
            .field("pre_search", &self.pre_search.len())
            .field("post_hit", &self.post_hit.len())
            .finish()
    }
}
