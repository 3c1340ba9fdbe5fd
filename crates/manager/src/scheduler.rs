//! The refresh loop: finds due cameras and refreshes them concurrently.
//!
//! Each pass fetches outside the camera locks, with a bounded number of
//! in-flight refreshes, so one slow or dead endpoint never delays the rest
//! of the fleet. A failed refresh leaves the camera untouched and due, so
//! it is retried on the next tick.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use camwatch_core::camera::IngestOutcome;
use camwatch_events::ActivityEvent;
use camwatch_fetch::FrameFetcher;

use crate::error::ManagerError;
use crate::manager::{DueCamera, Manager};

/// Default bound on concurrently in-flight camera refreshes.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Outcome counts for one scheduler pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshStats {
    pub due: usize,
    pub refreshed: usize,
    pub failed: usize,
}

pub struct RefreshScheduler {
    manager: Arc<Manager>,
    fetcher: Arc<dyn FrameFetcher>,
    max_concurrent: usize,
}

impl RefreshScheduler {
    pub fn new(manager: Arc<Manager>, fetcher: Arc<dyn FrameFetcher>) -> Self {
        Self {
            manager,
            fetcher,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Refresh every camera that is due at `now`.
    pub async fn refresh_due(&self, now: DateTime<Utc>) -> RefreshStats {
        let due = self.manager.due_cameras(now).await;
        let total = due.len();
        let refreshed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        stream::iter(due)
            .for_each_concurrent(self.max_concurrent, |camera| {
                let refreshed = &refreshed;
                let failed = &failed;
                async move {
                    let camera_id = camera.id.to_string();
                    match self.refresh_one(camera, now).await {
                        Ok(()) => {
                            refreshed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(
                                camera_id = %camera_id,
                                error = %e,
                                "Camera refresh failed, will retry when next due"
                            );
                        }
                    }
                }
            })
            .await;

        let stats = RefreshStats {
            due: total,
            refreshed: refreshed.into_inner(),
            failed: failed.into_inner(),
        };
        if stats.due > 0 {
            tracing::debug!(
                due = stats.due,
                refreshed = stats.refreshed,
                failed = stats.failed,
                "Refresh pass complete"
            );
        }
        stats
    }

    /// Fetch, process, and record one camera. The camera's lock is only
    /// taken after the fetch has completed.
    async fn refresh_one(&self, camera: DueCamera, now: DateTime<Utc>) -> Result<(), ManagerError> {
        let bytes = self.fetcher.fetch(&camera.source_url).await?;
        let algorithm = self.manager.registry().resolve(&camera.algorithm_id);

        let mut entry = camera.entry.lock().await;
        let outcome = entry.camera.update_from_bytes(&bytes, &algorithm, now)?;
        let activity = entry.camera.last_activity();
        entry.activity.push(activity);
        drop(entry);

        self.manager.bus().publish(ActivityEvent {
            camera_id: camera.id.to_string(),
            activity,
            frame_changed: outcome != IngestOutcome::Identical,
            timestamp: now,
        });
        Ok(())
    }

    /// Run refresh passes forever, one every `tick`.
    pub async fn run(&self, tick: Duration) -> ! {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.refresh_due(Utc::now()).await;
        }
    }
}
