// src/config/sources.rs
//! Concrete config sources: process environment, an in-memory key/value
//! table (the pluggable config store adapter) and a TOML file.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::ConfigSource;

/// Raw values are written the way env vars are: JSON when the text parses
/// as JSON, plain string otherwise.
fn parse_raw(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub struct EnvSource {
    priority: i32,
}

impl EnvSource {
    pub fn new() -> Self {
        Self { priority: 100 }
    }

    pub fn with_priority(priority: i32) -> Self {
        Self { priority }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigSource for EnvSource {
    fn priority(&self) -> i32 {
        self.priority
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        match std::env::var(key) {
            Ok(raw) => Ok(Some(parse_raw(&raw))),
            Err(_) => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "env"
    }
}

/// String-keyed table behind a lock: the config-store adapter, and the
/// test double of choice.
pub struct MemorySource {
    priority: i32,
    values: RwLock<HashMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::with_priority(10)
    }

    pub fn with_priority(priority: i32) -> Self {
        Self {
            priority,
            values: RwLock::new(HashMap::new()),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .expect("poisoned config table")
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.values
            .write()
            .expect("poisoned config table")
            .remove(key);
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigSource for MemorySource {
    fn priority(&self) -> i32 {
        self.priority
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.read().expect("poisoned config table");
        Ok(values.get(key).map(|raw| parse_raw(raw)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// TOML table of values, re-read on every lookup so runtime edits are
/// observed by the next resolve.
pub struct FileSource {
    priority: i32,
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            priority: 50,
            path: path.into(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn priority(&self) -> i32 {
        self.priority
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading config from {}", self.path.display()))?;
        let table: toml::Table = toml::from_str(&raw).context("parsing config toml")?;
        table
            .get(key)
            .map(|v| serde_json::to_value(v.clone()).context("converting toml value"))
            .transpose()
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
