use std::collections::HashSet;
use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{CatalogError, MatchError};
use crate::models::catalog::CatalogEntry;
use crate::models::file_info::FileInfo;
use crate::models::match_result::MatchResult;

use super::catalog::CatalogClient;
use super::normalize::{normalize_name, query_variants};
use super::options::{GameMatchOptions, MatcherConfig, ResolvedMatchOptions};
use super::scorer::MatchScorer;

/// Resolves scanned candidates against a game catalog.
///
/// Catalog failures never fail a call: the affected file simply gets no
/// matches. Only invalid options are reported as errors.
pub struct GameMatcher {
    catalog: Arc<dyn CatalogClient>,
    scorer: MatchScorer,
    config: MatcherConfig,
}

impl GameMatcher {
    pub fn new(catalog: Arc<dyn CatalogClient>) -> Self {
        let config = MatcherConfig::default();
        Self {
            catalog,
            scorer: MatchScorer::new(),
            config,
        }
    }

    pub fn with_config(catalog: Arc<dyn CatalogClient>, config: MatcherConfig) -> Result<Self, MatchError> {
        config.policy.validate()?;
        if config.max_results == 0 {
            return Err(MatchError::InvalidOptions(
                "max_results must be at least 1".into(),
            ));
        }
        Ok(Self {
            catalog,
            scorer: MatchScorer::new(),
            config,
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub async fn find_matches(
        &self,
        game_file: &FileInfo,
        options: &GameMatchOptions,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let resolved = options.resolve(&self.config)?;
        Ok(self.matches_for(game_file, &resolved).await)
    }

    pub async fn get_best_match(
        &self,
        game_file: &FileInfo,
        options: &GameMatchOptions,
    ) -> Result<Option<MatchResult>, MatchError> {
        let matches = self.find_matches(game_file, options).await?;
        Ok(matches.into_iter().next())
    }

    /// Matches files one after another; output order follows `game_files`.
    pub async fn find_matches_for_files(
        &self,
        game_files: &[FileInfo],
        options: &GameMatchOptions,
    ) -> Result<Vec<Vec<MatchResult>>, MatchError> {
        let resolved = options.resolve(&self.config)?;
        let mut results = Vec::with_capacity(game_files.len());
        for file in game_files {
            results.push(self.matches_for(file, &resolved).await);
        }
        Ok(results)
    }

    pub async fn get_best_matches(
        &self,
        game_files: &[FileInfo],
        options: &GameMatchOptions,
    ) -> Result<Vec<Option<MatchResult>>, MatchError> {
        let all = self.find_matches_for_files(game_files, options).await?;
        Ok(all.into_iter().map(|m| m.into_iter().next()).collect())
    }

    /// Matches `batch_size` files concurrently at a time; output order follows
    /// `game_files` whatever order the catalog answers in.
    pub async fn find_matches_for_files_batch(
        &self,
        game_files: &[FileInfo],
        options: &GameMatchOptions,
        batch_size: usize,
    ) -> Result<Vec<Vec<MatchResult>>, MatchError> {
        let cancel = CancellationToken::new();
        self.find_matches_for_files_batch_until(game_files, options, batch_size, &cancel)
            .await
    }

    /// Like [`Self::find_matches_for_files_batch`], checking `cancel` before
    /// each chunk. Files of skipped chunks get empty results.
    pub async fn find_matches_for_files_batch_until(
        &self,
        game_files: &[FileInfo],
        options: &GameMatchOptions,
        batch_size: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<MatchResult>>, MatchError> {
        if batch_size == 0 {
            return Err(MatchError::InvalidOptions(
                "batch_size must be at least 1".into(),
            ));
        }
        let resolved = options.resolve(&self.config)?;
        let resolved = &resolved;

        let mut results = vec![Vec::new(); game_files.len()];
        for (chunk_index, chunk) in game_files.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                debug!(chunk_index, "batch matching cancelled");
                break;
            }
            if chunk_index > 0 && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let offset = chunk_index * batch_size;
            let mut in_flight: FuturesUnordered<_> = chunk
                .iter()
                .enumerate()
                .map(|(i, file)| async move { (offset + i, self.matches_for(file, resolved).await) })
                .collect();

            while let Some((index, matches)) = in_flight.next().await {
                results[index] = matches;
            }
        }
        Ok(results)
    }

    pub fn is_auto_add_candidate(&self, confidence: f64) -> bool {
        self.config.policy.is_auto_add_candidate(confidence)
    }

    pub fn requires_user_selection(&self, confidence: f64) -> bool {
        self.config.policy.requires_user_selection(confidence)
    }

    async fn matches_for(&self, game_file: &FileInfo, options: &ResolvedMatchOptions) -> Vec<MatchResult> {
        let raw_name = game_file.display_name();
        let queries = if options.include_alternative_names {
            query_variants(raw_name)
        } else {
            let normalized = normalize_name(raw_name);
            if normalized.is_empty() {
                Vec::new()
            } else {
                vec![normalized]
            }
        };
        if queries.is_empty() {
            debug!(name = raw_name, "nothing left to match after normalization");
            return Vec::new();
        }

        let entries = match self.lookup(&queries).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(name = raw_name, error = %e, "catalog lookup failed");
                return Vec::new();
            }
        };

        let mut matches: Vec<MatchResult> = entries
            .into_iter()
            .filter_map(|entry| {
                let confidence = queries
                    .iter()
                    .map(|q| self.scorer.score(q, &entry))
                    .fold(0.0, f64::max);
                (confidence >= options.policy.min_confidence).then(|| MatchResult {
                    is_auto_add_candidate: options.policy.is_auto_add_candidate(confidence),
                    requires_user_selection: options.policy.requires_user_selection(confidence),
                    candidate: entry,
                    confidence,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| rating(&b.candidate).total_cmp(&rating(&a.candidate)))
                .then_with(|| a.candidate.id.cmp(&b.candidate.id))
        });
        matches.truncate(options.max_results);
        matches
    }

    /// Queries the catalog for every variant and merges the answers by id.
    async fn lookup(&self, queries: &[String]) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for query in queries {
            let found = tokio::time::timeout(
                self.config.catalog_timeout,
                self.catalog.search_by_name(query),
            )
            .await
            .map_err(|_| CatalogError::Timeout(self.config.catalog_timeout))??;
            entries.extend(found.into_iter().filter(|e| seen.insert(e.id)));
        }
        Ok(entries)
    }
}

fn rating(entry: &CatalogEntry) -> f64 {
    entry.rating.unwrap_or(f64::NEG_INFINITY)
}
