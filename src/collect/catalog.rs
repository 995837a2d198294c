// src/collect/catalog.rs
//! Source catalog: the built-in descriptor table, optional external rows
//! (e.g. from the config store) and TOML/JSON file loading.
//!
//! Merging skips `(channel, collector, identifier)` duplicates so the same
//! source is never collected twice in one run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::warn;

use super::types::SourceDescriptor;
use crate::config::ConfigResolver;

const ENV_PATH: &str = "TREND_SOURCES_PATH";
const STORE_KEY: &str = "TREND_SOURCES";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceRow {
    pub channel: String,
    pub collector: String,
    pub identifier: String,
}

impl SourceRow {
    pub fn new(
        channel: impl Into<String>,
        collector: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            collector: collector.into(),
            identifier: identifier.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    rows: Vec<SourceRow>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with the crate, used when no file or store rows
    /// override it.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (collector, identifier) in [
            ("firecrawl", "https://www.anthropic.com/news"),
            ("firecrawl", "https://news.ycombinator.com/"),
            (
                "firecrawl",
                "https://www.reuters.com/technology/artificial-intelligence/",
            ),
            ("twitter", "https://x.com/OpenAIDevs"),
            ("twitter", "https://x.com/AIatMeta"),
            ("twitter", "https://x.com/karpathy"),
        ] {
            catalog.merge_row(SourceRow::new("ai", collector, identifier));
        }
        catalog
    }

    /// Insert unless an equal `(channel, collector, identifier)` row
    /// already exists. Returns whether the row was added.
    pub fn merge_row(&mut self, row: SourceRow) -> bool {
        if self.rows.contains(&row) {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Merge external rows, returning how many were actually added.
    pub fn merge_rows(&mut self, rows: impl IntoIterator<Item = SourceRow>) -> usize {
        rows.into_iter().filter(|r| self.merge_row(r.clone())).count()
    }

    /// Descriptors for one channel, grouped by collector kind in first-seen
    /// order; insertion order is preserved within each group.
    pub fn descriptors(&self, channel: &str) -> Vec<SourceDescriptor> {
        let mut kinds: Vec<&str> = Vec::new();
        for row in self.rows.iter().filter(|r| r.channel == channel) {
            if !kinds.contains(&row.collector.as_str()) {
                kinds.push(&row.collector);
            }
        }

        let mut out = Vec::new();
        for kind in kinds {
            out.extend(
                self.rows
                    .iter()
                    .filter(|r| r.channel == channel && r.collector == kind)
                    .map(|r| SourceDescriptor::new(r.collector.clone(), r.identifier.clone())),
            );
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load a catalog from an explicit path. Supports TOML or JSON formats.
pub fn load_catalog_from(path: &Path) -> Result<SourceCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading source catalog from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let rows = parse_catalog(&content, ext.as_str())?;
    let mut catalog = SourceCatalog::new();
    catalog.merge_rows(rows);
    Ok(catalog)
}

/// Load a catalog using env var + fallbacks:
/// 1) $TREND_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) the built-in table
pub fn load_catalog_default() -> Result<SourceCatalog> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_catalog_from(&pb);
        } else {
            return Err(anyhow!("TREND_SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_catalog_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_catalog_from(&json_p);
    }
    Ok(SourceCatalog::builtin())
}

/// External rows from the config store, keyed `TREND_SOURCES` as a JSON
/// array. A failing or malformed lookup degrades to no rows.
pub async fn load_external_rows(config: &ConfigResolver) -> Vec<SourceRow> {
    match config.resolve_opt(STORE_KEY).await {
        Some(value) => match serde_json::from_value::<Vec<SourceRow>>(value) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "malformed {STORE_KEY} rows in config store, ignoring");
                Vec::new()
            }
        },
        None => Vec::new(),
    }
}

fn parse_catalog(s: &str, hint_ext: &str) -> Result<Vec<SourceRow>> {
    let try_toml = hint_ext == "toml" || s.contains("sources");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported source catalog format"))
}

fn parse_toml(s: &str) -> Result<Vec<SourceRow>> {
    #[derive(Deserialize)]
    struct TomlCatalog {
        sources: Vec<SourceRow>,
    }
    let v: TomlCatalog = toml::from_str(s)?;
    Ok(v.sources)
}

fn parse_json(s: &str) -> Result<Vec<SourceRow>> {
    let v: Vec<SourceRow> = serde_json::from_str(s)?;
    Ok(v)
}
