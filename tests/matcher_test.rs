use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use gamescout::config::settings::ScanOptions;
use gamescout::core::events::create_event_channel;
use gamescout::core::session::GameLocator;
use gamescout::error::{CatalogError, MatchError};
use gamescout::matcher::catalog::CatalogFuture;
use gamescout::matcher::{
    CatalogClient, GameMatchOptions, GameMatcher, InMemoryCatalog, MatchPolicy, MatcherConfig,
};
use gamescout::models::catalog::CatalogEntry;
use gamescout::models::file_info::FileInfo;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Catalog answering fixed queries, optionally slow or failing per query.
#[derive(Default)]
struct MockCatalog {
    answers: HashMap<String, Vec<CatalogEntry>>,
    delays: HashMap<String, Duration>,
    failing: Vec<String>,
}

impl MockCatalog {
    fn answer(mut self, query: &str, entries: Vec<CatalogEntry>) -> Self {
        self.answers.insert(query.to_string(), entries);
        self
    }

    fn delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    fn fail(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }
}

impl CatalogClient for MockCatalog {
    fn search_by_name<'a>(&'a self, name: &'a str) -> CatalogFuture<'a> {
        Box::pin(async move {
            if let Some(delay) = self.delays.get(name) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.iter().any(|f| f == name) {
                return Err(CatalogError::Unavailable(format!("{name} unavailable")));
            }
            Ok(self.answers.get(name).cloned().unwrap_or_default())
        })
    }
}

fn game(name: &str) -> FileInfo {
    FileInfo::from_directory(PathBuf::from("/games").join(name), name, None)
}

fn matcher(catalog: MockCatalog) -> GameMatcher {
    GameMatcher::new(Arc::new(catalog))
}

fn best_ids(results: &[Vec<gamescout::models::match_result::MatchResult>]) -> Vec<Option<u64>> {
    results
        .iter()
        .map(|m| m.first().map(|r| r.candidate.id))
        .collect()
}

// ---------------------------------------------------------------------------
// 1. test_exact_match_is_auto_add
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_exact_match_is_auto_add() {
    let catalog = MockCatalog::default().answer("Game One", vec![CatalogEntry::new(1, "Game One")]);
    let matcher = matcher(catalog);

    let best = matcher
        .get_best_match(&game("Game One (2019)"), &GameMatchOptions::default())
        .await
        .unwrap()
        .expect("match");
    assert_eq!(best.candidate.id, 1);
    assert!((best.confidence - 1.0).abs() < 1e-9);
    assert!(best.is_auto_add_candidate);
    assert!(!best.requires_user_selection);
}

// ---------------------------------------------------------------------------
// 2. test_partial_match_requires_selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_partial_match_requires_selection() {
    let catalog = MockCatalog::default().answer(
        "Hollow Knight",
        vec![
            CatalogEntry::new(2, "Hollow Knight II"),
            CatalogEntry::new(3, "Knightfall"),
        ],
    );
    let matcher = matcher(catalog);

    let matches = matcher
        .find_matches(&game("Hollow Knight"), &GameMatchOptions::default())
        .await
        .unwrap();
    assert_eq!(matches.len(), 1, "unrelated entry falls below the minimum");
    let m = &matches[0];
    assert_eq!(m.candidate.id, 2);
    assert!(m.confidence >= 0.6 && m.confidence < 0.85, "{}", m.confidence);
    assert!(m.requires_user_selection);
    assert!(!m.is_auto_add_candidate);

    assert!(!matcher.is_auto_add_candidate(m.confidence));
    assert!(matcher.requires_user_selection(m.confidence));
}

// ---------------------------------------------------------------------------
// 3. test_ordering_and_truncation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ordering_and_truncation() {
    let catalog = MockCatalog::default().answer(
        "Doom",
        vec![
            CatalogEntry::new(5, "Doom"),
            CatalogEntry::new(4, "Doom").with_rating(70.0),
            CatalogEntry::new(9, "Doom").with_rating(90.0),
            CatalogEntry::new(1, "Doom"),
            CatalogEntry::new(7, "Doom II"),
        ],
    );
    let matcher = matcher(catalog);

    let matches = matcher
        .find_matches(&game("Doom"), &GameMatchOptions::default())
        .await
        .unwrap();
    let ids: Vec<u64> = matches.iter().map(|m| m.candidate.id).collect();
    // rating breaks ties, then ascending id; "Doom II" stays below the minimum
    assert_eq!(ids, vec![9, 4, 1, 5]);

    let options = GameMatchOptions {
        max_results: Some(2),
        ..GameMatchOptions::default()
    };
    let matches = matcher.find_matches(&game("Doom"), &options).await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].candidate.id, 9);
}

// ---------------------------------------------------------------------------
// 4. test_min_confidence_override
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_min_confidence_override() {
    let catalog = MockCatalog::default().answer(
        "Hollow Knight",
        vec![CatalogEntry::new(2, "Hollow Knight II")],
    );
    let matcher = matcher(catalog);

    let strict = GameMatchOptions {
        min_confidence: Some(0.9),
        ..GameMatchOptions::default()
    };
    assert!(matcher
        .find_matches(&game("Hollow Knight"), &strict)
        .await
        .unwrap()
        .is_empty());

    let invalid = GameMatchOptions {
        min_confidence: Some(1.2),
        ..GameMatchOptions::default()
    };
    assert!(matches!(
        matcher.find_matches(&game("Hollow Knight"), &invalid).await,
        Err(MatchError::InvalidOptions(_))
    ));
}

// ---------------------------------------------------------------------------
// 5. test_alternative_names
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_alternative_names() {
    let catalog = MockCatalog::default()
        .answer(
            "Skyrim",
            vec![CatalogEntry::new(10, "The Elder Scrolls V: Skyrim").with_alternative_names(["Skyrim"])],
        )
        .answer("The Witcher 3", vec![CatalogEntry::new(20, "The Witcher 3")]);
    let matcher = matcher(catalog);

    // Catalog aliases are always scored.
    let best = matcher
        .get_best_match(&game("Skyrim"), &GameMatchOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(best.candidate.id, 10);
    assert!(best.is_auto_add_candidate);

    // Query variants only when asked for.
    let file = game("The Witcher 3: Wild Hunt");
    assert!(matcher
        .get_best_match(&file, &GameMatchOptions::default())
        .await
        .unwrap()
        .is_none());

    let with_variants = GameMatchOptions {
        include_alternative_names: true,
        ..GameMatchOptions::default()
    };
    let best = matcher.get_best_match(&file, &with_variants).await.unwrap().unwrap();
    assert_eq!(best.candidate.id, 20);
}

// ---------------------------------------------------------------------------
// 6. test_catalog_failure_is_isolated
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_catalog_failure_is_isolated() {
    let catalog = MockCatalog::default()
        .answer("Alpha", vec![CatalogEntry::new(1, "Alpha")])
        .fail("Broken");
    let matcher = matcher(catalog);

    let files = vec![game("Alpha"), game("Broken"), game("Unknown")];
    let results = matcher
        .find_matches_for_files(&files, &GameMatchOptions::default())
        .await
        .unwrap();
    assert_eq!(best_ids(&results), vec![Some(1), None, None]);

    let best = matcher
        .get_best_matches(&files, &GameMatchOptions::default())
        .await
        .unwrap();
    assert_eq!(best.len(), 3);
    assert!(best[0].is_some());
    assert!(best[1].is_none());
}

// ---------------------------------------------------------------------------
// 7. test_batch_preserves_order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_batch_preserves_order() {
    let catalog = MockCatalog::default()
        .answer("Alpha", vec![CatalogEntry::new(1, "Alpha")])
        .answer("Beta", vec![CatalogEntry::new(2, "Beta")])
        .answer("Gamma", vec![CatalogEntry::new(3, "Gamma")])
        .answer("Delta", vec![CatalogEntry::new(4, "Delta")])
        .delay("Alpha", Duration::from_millis(80))
        .delay("Beta", Duration::from_millis(40))
        .delay("Delta", Duration::from_millis(20));
    let matcher = matcher(catalog);

    let files = vec![game("Alpha"), game("Beta"), game("Gamma"), game("Delta")];
    let results = matcher
        .find_matches_for_files_batch(&files, &GameMatchOptions::default(), 3)
        .await
        .unwrap();
    assert_eq!(best_ids(&results), vec![Some(1), Some(2), Some(3), Some(4)]);

    let err = matcher
        .find_matches_for_files_batch(&files, &GameMatchOptions::default(), 0)
        .await;
    assert!(matches!(err, Err(MatchError::InvalidOptions(_))));
}

#[tokio::test]
async fn test_batch_cancellation() {
    let catalog = MockCatalog::default().answer("Alpha", vec![CatalogEntry::new(1, "Alpha")]);
    let matcher = matcher(catalog);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let files = vec![game("Alpha"), game("Alpha")];
    let results = matcher
        .find_matches_for_files_batch_until(&files, &GameMatchOptions::default(), 1, &cancel)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(Vec::is_empty));
}

// ---------------------------------------------------------------------------
// 8. test_catalog_timeout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_catalog_timeout() {
    let catalog = MockCatalog::default()
        .answer("Slow", vec![CatalogEntry::new(1, "Slow")])
        .delay("Slow", Duration::from_millis(500))
        .answer("Fast", vec![CatalogEntry::new(2, "Fast")]);
    let config = MatcherConfig {
        catalog_timeout: Duration::from_millis(20),
        ..MatcherConfig::default()
    };
    let matcher = GameMatcher::with_config(Arc::new(catalog), config).unwrap();

    let results = matcher
        .find_matches_for_files_batch(&[game("Slow"), game("Fast")], &GameMatchOptions::default(), 2)
        .await
        .unwrap();
    assert_eq!(best_ids(&results), vec![None, Some(2)]);
}

#[test]
fn test_invalid_config() {
    let config = MatcherConfig {
        policy: MatchPolicy {
            min_confidence: 0.9,
            auto_add_threshold: 0.5,
        },
        ..MatcherConfig::default()
    };
    assert!(GameMatcher::with_config(Arc::new(MockCatalog::default()), config).is_err());
}

// ---------------------------------------------------------------------------
// 9. test_scan_then_match – locator and matcher end to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_scan_then_match() {
    let dir = std::env::temp_dir().join("gamescout_test_scan_then_match");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("Game One (2019)")).unwrap();
    std::fs::create_dir_all(dir.join("Game_Two GOTY Edition")).unwrap();
    std::fs::write(dir.join("Game One (2019)/GameOne.exe"), "MZ").unwrap();
    std::fs::write(dir.join("Game_Two GOTY Edition/launcher.sh"), "#!/bin/sh\n").unwrap();

    let (event_tx, _rx) = create_event_channel();
    let locator = GameLocator::new(ScanOptions::default(), event_tx).unwrap();
    let result = locator.scan(vec![dir.clone()], None).await.unwrap();
    assert_eq!(result.games.len(), 2);

    let catalog = InMemoryCatalog::new(vec![
        CatalogEntry::new(1, "Game One"),
        CatalogEntry::new(2, "Game Two: Game of the Year Edition"),
        CatalogEntry::new(3, "Unrelated Title"),
    ]);
    let matcher = GameMatcher::new(Arc::new(catalog));
    let best = matcher
        .get_best_matches(&result.games, &GameMatchOptions::default())
        .await
        .unwrap();

    let ids: Vec<Option<u64>> = best.iter().map(|m| m.as_ref().map(|m| m.candidate.id)).collect();
    assert_eq!(ids, vec![Some(1), Some(2)]);
    assert!(best.iter().flatten().all(|m| m.is_auto_add_candidate));

    let _ = std::fs::remove_dir_all(&dir);
}
