//! Shared wiring for the `mapsearch` binaries.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use mapsearch_core::config::{AdapterKind, Config};
use mapsearch_core::{Adapter, LocalizationConfig, MemoryAdapter, MetadataRegistry, SearchManager};
use mapsearch_text::{TantivyAdapter, TantivyConfig};
use serde_json::Value;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Build a manager from configuration. Relative paths resolve against `base`.
pub fn build_manager(config: &Config, base: &Path) -> anyhow::Result<SearchManager> {
    let search = config.search()?;
    let localization = config.get_or_default::<LocalizationConfig>("localization")?.build();
    let registry = MetadataRegistry::from_config(config)?;
    tracing::info!(mappings = registry.len(), adapter = ?search.adapter, "building search manager");

    let adapter: Box<dyn Adapter> = match search.adapter {
        AdapterKind::Memory => {
            Box::new(MemoryAdapter::new().with_localization(localization.clone()))
        }
        AdapterKind::Tantivy => {
            let settings = TantivyConfig::from_config(config, base)?;
            Box::new(TantivyAdapter::with_config(settings)?.with_localization(localization.clone()))
        }
    };

    let manager = SearchManager::new(adapter, Arc::new(registry), search.evaluator.build())
        .with_localization(localization)
        .with_default_limit(search.default_limit);
    Ok(manager)
}

/// Objects from a JSON array, a single JSON object, or JSON Lines.
pub fn read_records(path: &Path) -> anyhow::Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .with_context(|| format!("parsing {} as a JSON array", path.display()));
    }
    if let Ok(single) = serde_json::from_str::<Value>(trimmed) {
        return Ok(vec![single]);
    }
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid JSON", path.display(), n + 1))
        })
        .collect()
}

/// Two-column `Field | Value` table.
pub fn render_table(rows: &BTreeMap<String, String>) -> String {
    const HEADERS: [&str; 2] = ["Field", "Value"];
    let key_width = rows
        .keys()
        .map(|k| k.chars().count())
        .chain([HEADERS[0].len()])
        .max()
        .unwrap_or_default();
    let value_width = rows
        .values()
        .map(|v| v.chars().count())
        .chain([HEADERS[1].len()])
        .max()
        .unwrap_or_default();
    let rule = format!("+-{}-+-{}-+\n", "-".repeat(key_width), "-".repeat(value_width));

    let mut out = rule.clone();
    out.push_str(&format!("| {:<key_width$} | {:<value_width$} |\n", HEADERS[0], HEADERS[1]));
    out.push_str(&rule);
    for (key, value) in rows {
        out.push_str(&format!("| {key:<key_width$} | {value:<value_width$} |\n"));
    }
    out.push_str(&rule);
    out
}
