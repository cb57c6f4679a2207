//! Strategies deriving physical index names from a logical name and a locale.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub trait LocalizationStrategy: Send + Sync {
    /// Must return `index_name` unchanged when `locale` is `None`.
    fn localize_index_name(&self, index_name: &str, locale: Option<&str>) -> String;

    /// Whether `physical` is one of the names derived from `logical`.
    fn is_variant_of(&self, logical: &str, physical: &str) -> bool;
}

/// `physical` is `logical` itself or starts with `logical_`, whatever the
/// configured locales.
pub fn is_derived_name(logical: &str, physical: &str) -> bool {
    physical
        .strip_prefix(logical)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('_'))
}

/// No localization: one physical index per logical name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStrategy;

impl LocalizationStrategy for NoopStrategy {
    fn localize_index_name(&self, index_name: &str, _locale: Option<&str>) -> String {
        index_name.to_string()
    }

    fn is_variant_of(&self, logical: &str, physical: &str) -> bool {
        logical == physical
    }
}

/// One physical index per locale, named `<index>_<locale>`.
///
/// With a locale list, only `<index>` and `<index>_<listed locale>` are
/// variants. Without one, any `<index>_` prefix matches.
#[derive(Debug, Clone, Default)]
pub struct IndexStrategy {
    locales: Vec<String>,
}

impl IndexStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locales<I, S>(locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { locales: locales.into_iter().map(Into::into).collect() }
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }
}

impl LocalizationStrategy for IndexStrategy {
    fn localize_index_name(&self, index_name: &str, locale: Option<&str>) -> String {
        match locale {
            None => index_name.to_string(),
            Some(locale) => format!("{index_name}_{locale}"),
        }
    }

    fn is_variant_of(&self, logical: &str, physical: &str) -> bool {
        if !is_derived_name(logical, physical) {
            return false;
        }
        match physical[logical.len()..].strip_prefix('_') {
            None => true,
            Some(_) if self.locales.is_empty() => true,
            Some(suffix) => self.locales.iter().any(|locale| locale == suffix),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Noop,
    Index,
}

/// `[localization]` configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalizationConfig {
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default)]
    pub locales: Vec<String>,
}

impl LocalizationConfig {
    pub fn build(&self) -> Arc<dyn LocalizationStrategy> {
        match self.strategy {
            StrategyKind::Noop => Arc::new(NoopStrategy),
            StrategyKind::Index => Arc::new(IndexStrategy::with_locales(self.locales.clone())),
        }
    }
}
