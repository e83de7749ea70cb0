use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use gamescout::config::settings::{ScanOptions, ScanOptionsPatch};
use gamescout::core::events::{create_event_channel, ScanEventKind};
use gamescout::core::session::GameLocator;
use gamescout::matcher::{GameMatchOptions, GameMatcher, InMemoryCatalog, MatcherConfig};
use gamescout::matcher::options::DEFAULT_BATCH_SIZE;
use gamescout::matcher::normalize::normalize_name;

#[derive(Parser, Debug)]
#[command(name = "gamescout", version, about = "Locate installed games and match them against a catalog")]
struct Cli {
    /// Directories to scan (default: well-known game locations)
    paths: Vec<PathBuf>,

    /// JSON file with scan option overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum directory depth below each root
    #[arg(short = 'd', long)]
    max_depth: Option<usize>,

    /// Number of concurrent directory workers
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Abort the scan after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Ignore files smaller than this many bytes
    #[arg(long)]
    min_size: Option<u64>,

    /// Ignore files larger than this many bytes
    #[arg(long)]
    max_size: Option<u64>,

    /// Additional folder name to skip (repeatable)
    #[arg(long = "skip")]
    skip: Vec<String>,

    /// Follow symbolic links
    #[arg(long)]
    follow_symlinks: bool,

    /// Log every processed file
    #[arg(long)]
    file_events: bool,

    /// JSON catalog used to match found games
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Minimum confidence for a match to be reported
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Maximum matches reported per game
    #[arg(long)]
    max_results: Option<usize>,

    /// Also query name variants (subtitle, sequel numbering, leading "The")
    #[arg(long)]
    alt_names: bool,

    /// Games matched concurrently
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Export the result as JSON
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// Export the result as a Markdown report
    #[arg(long)]
    export_markdown: Option<PathBuf>,
}

impl Cli {
    fn scan_options(&self) -> anyhow::Result<ScanOptions> {
        let mut options = ScanOptions::default();
        if let Some(ref config) = self.config {
            let patch: ScanOptionsPatch = serde_json::from_slice(&std::fs::read(config)?)?;
            options.apply(patch);
        }

        let mut patch = ScanOptionsPatch {
            max_depth: self.max_depth,
            concurrency: self.concurrency,
            timeout_ms: self.timeout_ms,
            min_file_size: self.min_size,
            max_file_size: self.max_size,
            ..ScanOptionsPatch::default()
        };
        if !self.skip.is_empty() {
            let mut skip = options.extra_skip_folders.clone();
            skip.extend(self.skip.iter().cloned());
            patch.extra_skip_folders = Some(skip);
        }
        if self.follow_symlinks {
            patch.follow_symlinks = Some(true);
        }
        if self.file_events {
            patch.emit_file_events = Some(true);
        }
        Ok(options.merged(patch)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, results to stdout
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = cli.scan_options()?;

    let (event_tx, mut event_rx) = create_event_channel();
    let locator = Arc::new(GameLocator::new(options, event_tx)?);

    let events = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match &event.kind {
                ScanEventKind::PathStarted { path } => info!(path = %path.display(), "scanning"),
                ScanEventKind::GameFound { file_info } => {
                    info!(path = %file_info.path.display(), "found {}", file_info.name)
                }
                ScanEventKind::StatsUpdate { stats } => debug!(
                    dirs = stats.processed_dirs,
                    files = stats.processed_files,
                    games = stats.games_found,
                    "progress"
                ),
                ScanEventKind::FileProcessed { file_info } => {
                    debug!(path = %file_info.path.display(), "file")
                }
                ScanEventKind::ScanCompleted { .. } => break,
                other => debug!(event = other.name(), "scan event"),
            }
        }
    });

    // Ctrl+C stops the scan and, later, the matching batches
    let interrupted = CancellationToken::new();
    {
        let locator = Arc::clone(&locator);
        let interrupted = interrupted.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupted.cancel();
                locator.stop();
            }
        });
    }

    let result = locator.scan(cli.paths.clone(), None).await?;
    let _ = events.await;

    println!(
        "{:?}: {} games in {} dirs / {} files ({} skipped, {} errors) in {:.2}s",
        result.state,
        result.stats.games_found,
        result.stats.processed_dirs,
        result.stats.processed_files,
        result.stats.skipped_paths,
        result.stats.errors,
        result.duration.as_secs_f64()
    );

    let matches = match cli.catalog {
        Some(ref catalog_path) => {
            let catalog = InMemoryCatalog::from_json_file(catalog_path)?;
            info!(entries = catalog.len(), "catalog loaded");
            let matcher = GameMatcher::with_config(Arc::new(catalog), MatcherConfig::default())?;
            let match_options = GameMatchOptions {
                min_confidence: cli.min_confidence,
                max_results: cli.max_results,
                include_alternative_names: cli.alt_names,
            };
            Some(
                matcher
                    .find_matches_for_files_batch_until(
                        &result.games,
                        &match_options,
                        cli.batch_size,
                        &interrupted,
                    )
                    .await?,
            )
        }
        None => None,
    };

    for (index, game) in result.games.iter().enumerate() {
        let best = matches
            .as_ref()
            .and_then(|all| all.get(index))
            .and_then(|m| m.first());
        match best {
            Some(m) => {
                let decision = if m.is_auto_add_candidate {
                    "auto-add"
                } else {
                    "select"
                };
                println!(
                    "{}\t{}\t-> {} ({:.2}, {})",
                    normalize_name(game.display_name()),
                    game.path.display(),
                    m.candidate.name,
                    m.confidence,
                    decision
                );
            }
            None => println!("{}\t{}", normalize_name(game.display_name()), game.path.display()),
        }
    }

    if let Some(ref export_path) = cli.export_json {
        gamescout::export::json::export_json(&result, matches.as_deref(), export_path)?;
        println!("Exported to: {}", export_path.display());
    }
    if let Some(ref export_path) = cli.export_markdown {
        gamescout::export::markdown::export_markdown(&result, matches.as_deref(), export_path)?;
        println!("Exported to: {}", export_path.display());
    }

    Ok(())
}
