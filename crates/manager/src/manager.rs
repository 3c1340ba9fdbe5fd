//! The manager: single owner of the camera and user collections.
//!
//! Cameras live behind one `tokio::sync::Mutex` each so a slow refresh of
//! one camera never blocks readers or refreshes of another. The outer maps
//! are `RwLock`ed and only held long enough to clone `Arc`s out; persistence
//! is write-through, so the stores never disagree with the in-memory state
//! for longer than the call that mutated it.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use camwatch_core::activity::ActivityLog;
use camwatch_core::algorithm::{AlgorithmInfo, AlgorithmRegistry};
use camwatch_core::camera::{Camera, CameraConfig, CameraSnapshot};
use camwatch_core::user::User;
use camwatch_events::EventBus;
use camwatch_store::{CameraStore, UserStore};

use crate::error::ManagerError;

// ---------------------------------------------------------------------------
// Views handed to callers
// ---------------------------------------------------------------------------

/// Points and trailing averages from one camera's [`ActivityLog`].
#[derive(Debug, Clone)]
pub struct ActivityHistory {
    pub points: Vec<usize>,
    pub averages: Vec<f64>,
    pub max_value: usize,
}

/// A camera a user could subscribe to, with its distance from the user's
/// query point when one was given.
#[derive(Debug, Clone)]
pub struct SubscriptionCandidate {
    pub id: String,
    pub name: String,
    /// `None` when no query point was given. Unlocated cameras carry the
    /// 10000 km sentinel so they sort after every located one.
    pub distance_km: Option<f64>,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// One camera's mutable state: the entity itself plus its activity history.
/// Locked as a unit so history always matches the camera's last update.
#[derive(Debug)]
pub(crate) struct CameraEntry {
    pub(crate) camera: Camera,
    pub(crate) activity: ActivityLog,
}

impl CameraEntry {
    fn new(config: CameraConfig) -> Self {
        Self {
            camera: Camera::new(config),
            activity: ActivityLog::default(),
        }
    }
}

/// A camera the scheduler should refresh, captured outside any lock so the
/// fetch can run without holding one.
pub(crate) struct DueCamera {
    pub(crate) id: u64,
    pub(crate) source_url: String,
    pub(crate) algorithm_id: String,
    pub(crate) entry: Arc<Mutex<CameraEntry>>,
}

pub struct Manager {
    registry: AlgorithmRegistry,
    camera_store: CameraStore,
    user_store: UserStore,
    bus: Arc<EventBus>,
    cameras: RwLock<BTreeMap<u64, Arc<Mutex<CameraEntry>>>>,
    users: RwLock<HashMap<String, User>>,
    next_camera_id: AtomicU64,
}

impl Manager {
    pub fn new(
        registry: AlgorithmRegistry,
        camera_store: CameraStore,
        user_store: UserStore,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            registry,
            camera_store,
            user_store,
            bus,
            cameras: RwLock::new(BTreeMap::new()),
            users: RwLock::new(HashMap::new()),
            next_camera_id: AtomicU64::new(0),
        }
    }

    /// Populate cameras and users from the stores. Call once at startup.
    pub async fn load(&self) -> Result<(), ManagerError> {
        let mut cameras = self.cameras.write().await;
        let mut next_id = 0;
        for (id, config) in self.camera_store.load_all().await? {
            next_id = next_id.max(id + 1);
            cameras.insert(id, Arc::new(Mutex::new(CameraEntry::new(config))));
        }
        self.next_camera_id.store(next_id, Ordering::SeqCst);
        drop(cameras);

        let mut users = self.users.write().await;
        for user in self.user_store.load_all().await? {
            users.insert(user.id().to_string(), user);
        }
        Ok(())
    }

    pub async fn camera_count(&self) -> usize {
        self.cameras.read().await.len()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub fn algorithms(&self) -> Vec<AlgorithmInfo> {
        self.registry.list()
    }

    pub(crate) fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    pub(crate) fn bus(&self) -> &EventBus {
        &self.bus
    }

    // -- cameras ------------------------------------------------------------

    /// Register a new camera and return its id.
    ///
    /// The record is persisted before the camera becomes visible; the first
    /// frame arrives with the next scheduler pass, not here.
    pub async fn add_camera(&self, config: CameraConfig) -> Result<String, ManagerError> {
        let id = self.next_camera_id.fetch_add(1, Ordering::SeqCst);
        let key = id.to_string();
        self.camera_store.save(&key, &config).await?;
        tracing::info!(camera_id = %key, name = %config.name, "Camera added");
        self.cameras
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(CameraEntry::new(config))));
        Ok(key)
    }

    pub async fn camera_ids(&self) -> Vec<String> {
        self.cameras
            .read()
            .await
            .keys()
            .map(|id| id.to_string())
            .collect()
    }

    pub async fn snapshot(&self, camera_id: &str) -> Result<CameraSnapshot, ManagerError> {
        let entry = self.camera_entry(camera_id).await?;
        let entry = entry.lock().await;
        Ok(entry.camera.snapshot())
    }

    pub async fn activity_history(&self, camera_id: &str) -> Result<ActivityHistory, ManagerError> {
        let entry = self.camera_entry(camera_id).await?;
        let entry = entry.lock().await;
        Ok(ActivityHistory {
            points: entry.activity.points(),
            averages: entry.activity.averages(),
            max_value: entry.activity.max_value(),
        })
    }

    async fn camera_entry(&self, camera_id: &str) -> Result<Arc<Mutex<CameraEntry>>, ManagerError> {
        let id: u64 = camera_id
            .parse()
            .map_err(|_| ManagerError::UnknownCamera(camera_id.to_string()))?;
        self.cameras
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ManagerError::UnknownCamera(camera_id.to_string()))
    }

    /// Cameras due for a refresh at `now`, with the fields the scheduler
    /// needs captured so the fetch runs lock-free.
    pub(crate) async fn due_cameras(&self, now: DateTime<Utc>) -> Vec<DueCamera> {
        let cameras = self.cameras.read().await;
        let mut due = Vec::new();
        for (&id, entry) in cameras.iter() {
            let locked = entry.lock().await;
            if locked.camera.is_due(now) {
                let config = locked.camera.config();
                due.push(DueCamera {
                    id,
                    source_url: config.source_url.clone(),
                    algorithm_id: config.algorithm_id.clone(),
                    entry: entry.clone(),
                });
            }
        }
        due
    }

    // -- users --------------------------------------------------------------

    /// Ensure a user exists. Returns `true` when the user was created.
    pub async fn add_user(&self, user_id: &str) -> Result<bool, ManagerError> {
        let mut users = self.users.write().await;
        if users.contains_key(user_id) {
            return Ok(false);
        }
        let user = User::new(user_id);
        self.user_store.save(&user).await?;
        tracing::info!(user_id = %user_id, "User added");
        users.insert(user_id.to_string(), user);
        Ok(true)
    }

    /// Subscribe a user to a camera. Re-subscribing is a no-op success;
    /// the camera must exist.
    pub async fn subscribe(&self, user_id: &str, camera_id: &str) -> Result<(), ManagerError> {
        // Existence check first so a bad camera id never touches the user.
        self.camera_entry(camera_id).await?;
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ManagerError::UnknownUser(user_id.to_string()))?;
        if user.subscribe(camera_id) {
            self.user_store.save(user).await?;
        }
        Ok(())
    }

    /// Unsubscribe a user from a camera. Removing an id that was never
    /// subscribed is a no-op success, even for ids that no longer exist.
    pub async fn unsubscribe(&self, user_id: &str, camera_id: &str) -> Result<(), ManagerError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ManagerError::UnknownUser(user_id.to_string()))?;
        if user.unsubscribe(camera_id) {
            self.user_store.save(user).await?;
        }
        Ok(())
    }

    pub async fn subscriptions(&self, user_id: &str) -> Result<Vec<String>, ManagerError> {
        let users = self.users.read().await;
        let user = users
            .get(user_id)
            .ok_or_else(|| ManagerError::UnknownUser(user_id.to_string()))?;
        Ok(user.cameras().to_vec())
    }

    /// Snapshots of every camera the user follows, in subscription order.
    /// Ids pointing at since-removed cameras are skipped.
    pub async fn snapshots_for(
        &self,
        user_id: &str,
    ) -> Result<Vec<(String, CameraSnapshot)>, ManagerError> {
        let subscribed = self.subscriptions(user_id).await?;
        let mut snapshots = Vec::with_capacity(subscribed.len());
        for camera_id in subscribed {
            match self.snapshot(&camera_id).await {
                Ok(snapshot) => snapshots.push((camera_id, snapshot)),
                Err(ManagerError::UnknownCamera(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(snapshots)
    }

    /// Cameras the user is not yet subscribed to.
    ///
    /// With a query point, sorted ascending by distance with numeric-id
    /// tie-break; unlocated cameras carry the sentinel distance and land at
    /// the end. Without one, plain numeric id order.
    pub async fn subscription_candidates(
        &self,
        user_id: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Vec<SubscriptionCandidate>, ManagerError> {
        let subscribed = self.subscriptions(user_id).await?;
        let query = latitude.zip(longitude);

        let cameras = self.cameras.read().await;
        let mut candidates = Vec::new();
        for (&id, entry) in cameras.iter() {
            let key = id.to_string();
            if subscribed.iter().any(|c| *c == key) {
                continue;
            }
            let locked = entry.lock().await;
            candidates.push((
                id,
                SubscriptionCandidate {
                    id: key,
                    name: locked.camera.config().name.clone(),
                    distance_km: query.map(|(lat, lon)| locked.camera.distance_km(lat, lon)),
                },
            ));
        }
        drop(cameras);

        if query.is_some() {
            candidates.sort_by(|(a_id, a), (b_id, b)| {
                let da = a.distance_km.unwrap_or(f64::MAX);
                let db = b.distance_km.unwrap_or(f64::MAX);
                da.total_cmp(&db).then(a_id.cmp(b_id))
            });
        }
        Ok(candidates.into_iter().map(|(_, c)| c).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
