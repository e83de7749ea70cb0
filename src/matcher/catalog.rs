use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::error::CatalogError;
use crate::models::catalog::CatalogEntry;

use super::normalize::normalize_name;

pub type CatalogFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send + 'a>>;

/// External game-metadata source queried by name.
///
/// Transport, authentication and caching belong to the implementation.
pub trait CatalogClient: Send + Sync {
    /// Returns ranked candidates for `name`.
    fn search_by_name<'a>(&'a self, name: &'a str) -> CatalogFuture<'a>;
}

/// Catalog held in memory, typically loaded from a JSON array of entries.
///
/// A search returns every entry that shares at least one word with the query
/// in any of its names.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: Vec<CatalogEntry>,
}

impl InMemoryCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        let entries: Vec<CatalogEntry> = serde_json::from_slice(&bytes)?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn search(&self, name: &str) -> Vec<CatalogEntry> {
        let query_words = words(name);
        if query_words.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .all_names()
                    .any(|n| words(n).iter().any(|w| query_words.contains(w)))
            })
            .cloned()
            .collect()
    }
}

fn words(name: &str) -> Vec<String> {
    normalize_name(name)
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

impl CatalogClient for InMemoryCatalog {
    fn search_by_name<'a>(&'a self, name: &'a str) -> CatalogFuture<'a> {
        Box::pin(async move { Ok(self.search(name)) })
    }
}
