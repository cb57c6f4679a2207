//! mapsearch-text
//!
//! Tantivy-backed `Adapter`. Every physical index name gets its own Tantivy
//! index directory under a common root.
pub mod adapter;
pub mod tantivy_utils;

pub use adapter::{TantivyAdapter, TantivyConfig};
