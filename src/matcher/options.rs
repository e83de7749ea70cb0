use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_AUTO_ADD_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Per-call matching options; unset fields fall back to the matcher's config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMatchOptions {
    pub min_confidence: Option<f64>,
    pub max_results: Option<usize>,
    pub include_alternative_names: bool,
}

/// Confidence bands: below `min_confidence` a match is discarded, from
/// `auto_add_threshold` up it is applied without confirmation, and in between
/// a user has to choose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPolicy {
    pub min_confidence: f64,
    pub auto_add_threshold: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            auto_add_threshold: DEFAULT_AUTO_ADD_THRESHOLD,
        }
    }
}

impl MatchPolicy {
    pub fn validate(&self) -> Result<(), MatchError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.min_confidence) || !in_unit(self.auto_add_threshold) {
            return Err(MatchError::InvalidOptions(
                "confidence thresholds must lie in [0, 1]".into(),
            ));
        }
        if self.min_confidence > self.auto_add_threshold {
            return Err(MatchError::InvalidOptions(format!(
                "min_confidence ({}) exceeds auto_add_threshold ({})",
                self.min_confidence, self.auto_add_threshold
            )));
        }
        Ok(())
    }

    pub fn is_auto_add_candidate(&self, confidence: f64) -> bool {
        confidence >= self.auto_add_threshold
    }

    pub fn requires_user_selection(&self, confidence: f64) -> bool {
        confidence >= self.min_confidence && confidence < self.auto_add_threshold
    }
}

#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub policy: MatchPolicy,
    pub max_results: usize,
    /// Upper bound for a single catalog query.
    pub catalog_timeout: Duration,
    /// Pause between batch chunks, for rate-limited catalogs.
    pub batch_delay: Duration,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            max_results: DEFAULT_MAX_RESULTS,
            catalog_timeout: Duration::from_secs(10),
            batch_delay: Duration::ZERO,
        }
    }
}

/// Options after defaulting and validation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedMatchOptions {
    pub policy: MatchPolicy,
    pub max_results: usize,
    pub include_alternative_names: bool,
}

impl GameMatchOptions {
    pub(crate) fn resolve(&self, config: &MatcherConfig) -> Result<ResolvedMatchOptions, MatchError> {
        let policy = MatchPolicy {
            min_confidence: self.min_confidence.unwrap_or(config.policy.min_confidence),
            // A per-call minimum above the auto-add threshold lifts the threshold with it.
            auto_add_threshold: config
                .policy
                .auto_add_threshold
                .max(self.min_confidence.unwrap_or(0.0)),
        };
        policy.validate()?;

        let max_results = self.max_results.unwrap_or(config.max_results);
        if max_results == 0 {
            return Err(MatchError::InvalidOptions(
                "max_results must be at least 1".into(),
            ));
        }

        Ok(ResolvedMatchOptions {
            policy,
            max_results,
            include_alternative_names: self.include_alternative_names,
        })
    }
}
