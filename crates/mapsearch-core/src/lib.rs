//! Backend-agnostic search indexing.
//!
//! Domain objects are projected into flat `Document`s through declarative
//! per-class mapping metadata, then handed to a pluggable `Adapter`. The
//! `SearchManager` ties metadata, projection, localization and hooks together.

#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod evaluator;
pub mod hooks;
pub mod localization;
pub mod manager;
pub mod memory;
pub mod metadata;
pub mod projector;
pub mod traits;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use evaluator::{EvaluatorKind, FieldEvaluator, JsonPointerEvaluator, PropertyPathEvaluator};
pub use hooks::{HitEvent, HookDispatcher, HookKind, PreIndexEvent, SearchEvent};
pub use localization::{
    is_derived_name, IndexStrategy, LocalizationConfig, LocalizationStrategy, NoopStrategy,
};
pub use manager::{SearchManager, SearchQueryBuilder};
pub use memory::MemoryAdapter;
pub use metadata::{FieldMapping, FieldMappingTable, IndexMetadata, MappingType, MetadataDriver, MetadataRegistry};
pub use projector::Projector;
pub use traits::{Adapter, Searchable};
pub use types::{Document, Field, FieldType, FieldValue, QueryHit, Record, SearchQuery};
