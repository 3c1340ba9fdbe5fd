//! The camwatch daemon: loads persisted cameras and users, then runs the
//! refresh scheduler until killed.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use camwatch_core::algorithm::AlgorithmRegistry;
use camwatch_events::EventBus;
use camwatch_fetch::HttpFetcher;
use camwatch_manager::{Manager, RefreshScheduler};
use camwatch_store::record::CameraRecord;
use camwatch_store::{CameraStore, FileStore, KeyValueStore, MemoryStore, UserStore};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "camwatch=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let (camera_kv, user_kv): (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) =
        match &config.data_dir {
            Some(dir) => {
                tracing::info!(data_dir = %dir.display(), "Using file-backed stores");
                (
                    Arc::new(FileStore::open(dir.join("cameras")).await?),
                    Arc::new(FileStore::open(dir.join("users")).await?),
                )
            }
            None => {
                tracing::info!("No data dir configured, state will not survive a restart");
                (Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
            }
        };

    let manager = Arc::new(Manager::new(
        AlgorithmRegistry::new(),
        CameraStore::new(camera_kv),
        UserStore::new(user_kv),
        Arc::new(EventBus::default()),
    ));
    manager.load().await?;

    if let Some(seed) = &config.seed_file {
        seed_cameras(&manager, seed).await?;
    }

    tracing::info!(
        cameras = manager.camera_count().await,
        users = manager.user_count().await,
        tick_secs = config.tick.as_secs(),
        "camwatch started"
    );

    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout)?);
    let scheduler = RefreshScheduler::new(manager, fetcher)
        .with_max_concurrent(config.max_concurrent_refreshes);
    scheduler.run(config.tick).await
}

/// Load camera records from a JSON file into an empty store. A non-empty
/// store wins over the seed so edits made at runtime are not clobbered.
async fn seed_cameras(manager: &Manager, path: &std::path::Path) -> anyhow::Result<()> {
    if manager.camera_count().await > 0 {
        tracing::debug!(seed = %path.display(), "Store already populated, ignoring seed file");
        return Ok(());
    }
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let records: Vec<CameraRecord> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing seed file {}", path.display()))?;
    let count = records.len();
    for record in records {
        manager.add_camera(record.into_config()).await?;
    }
    tracing::info!(seed = %path.display(), cameras = count, "Seeded cameras");
    Ok(())
}
