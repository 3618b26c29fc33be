//! Entry point for the periodic campsite availability check.
//! One invocation runs one pass over all configured campgrounds, then exits;
//! scheduling is the responsibility of whatever invokes this binary.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use campground_check::{CheckExecutor, RecApiClient, SearchWindow, load_campgrounds};
use metrics_publisher::{CloudWatchMetrics, LogMetrics, MetricsSink};
use notification_services::{EmailDispatcher, SesEmailTransport};
use snapshot_store::{FsSnapshotStore, S3SnapshotStore, SnapshotStore};

const DEFAULT_SEARCH_WINDOW_DAYS: u32 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("Starting campsite availability check...");

    match run().await {
        Ok(()) => {
            log::info!("Campsite availability check completed");
            Ok(())
        }
        Err(e) => {
            // Residual failures become a structured report instead of an
            // unhandled crash.
            log::error!("Availability check failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config_path = PathBuf::from(
        env::var("CAMPGROUNDS_CONFIG").unwrap_or_else(|_| "campgrounds.json".to_string()),
    );
    let campgrounds =
        load_campgrounds(&config_path).context("failed to load campground configuration")?;
    log::info!(
        "Loaded {} campground(s) from {}",
        campgrounds.len(),
        config_path.display()
    );

    let window_days = match env::var("SEARCH_WINDOW_DAYS") {
        Ok(value) => value
            .parse::<u32>()
            .with_context(|| format!("invalid SEARCH_WINDOW_DAYS: {value}"))?,
        Err(_) => DEFAULT_SEARCH_WINDOW_DAYS,
    };
    let window = SearchWindow::next_days(window_days);

    let transport = SesEmailTransport::from_env()
        .await
        .context("failed to initialize mail transport")?;
    log::info!("Mail transport initialized (from: {})", transport.from_address());
    let dispatcher = EmailDispatcher::from_env(Arc::new(transport));

    // A cache bucket selects the deployed S3 store; otherwise fall back to
    // a local cache directory for development runs.
    let store: Arc<dyn SnapshotStore> = match env::var("RESULTS_BUCKET") {
        Ok(bucket) => {
            log::info!("Using S3 snapshot store (bucket: {})", bucket);
            Arc::new(S3SnapshotStore::from_default_config(bucket).await)
        }
        Err(_) => {
            let cache_dir = env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("campsite-check-cache"));
            log::info!("Using filesystem snapshot store at {}", cache_dir.display());
            Arc::new(FsSnapshotStore::new(cache_dir))
        }
    };

    let metrics: Arc<dyn MetricsSink> = if env::var("METRICS_DISABLED").is_ok() {
        log::info!("CloudWatch metrics disabled, logging metrics only");
        Arc::new(LogMetrics)
    } else {
        Arc::new(CloudWatchMetrics::from_default_config().await)
    };

    let searcher = Arc::new(RecApiClient::new(env::var("RIDB_API_KEY").ok())?);

    let executor = CheckExecutor::new(searcher, store, dispatcher, metrics);
    let summary = executor.run_once(&campgrounds, &window).await;

    log::info!(
        "Run summary: {} notified, {} skipped of {} processed",
        summary.notified_count(),
        summary.skipped_count(),
        summary.outcomes.len()
    );

    Ok(())
}
