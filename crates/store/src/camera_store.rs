//! Typed camera persistence over the key/value seam.
//!
//! Camera keys are the decimal string form of a monotonically increasing
//! integer; `load_all` therefore returns numeric order, not the store's
//! lexicographic order.

use std::sync::Arc;

use camwatch_core::camera::CameraConfig;

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::record::CameraRecord;

#[derive(Clone)]
pub struct CameraStore {
    kv: Arc<dyn KeyValueStore>,
}

impl CameraStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Persist one camera's configuration, overwriting any existing record.
    pub async fn save(&self, id: &str, config: &CameraConfig) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&CameraRecord::from_config(config))?;
        self.kv.put(id, &bytes).await
    }

    pub async fn load(&self, id: &str) -> Result<Option<CameraConfig>, StoreError> {
        let Some(bytes) = self.kv.get(id).await? else {
            return Ok(None);
        };
        let record: CameraRecord = serde_json::from_slice(&bytes)?;
        Ok(Some(record.into_config()))
    }

    /// Load every camera, sorted by numeric id.
    ///
    /// Stray non-numeric keys and unreadable records are logged and skipped
    /// rather than failing the whole load.
    pub async fn load_all(&self) -> Result<Vec<(u64, CameraConfig)>, StoreError> {
        let mut cameras = Vec::new();
        for key in self.kv.keys().await? {
            let Ok(id) = key.parse::<u64>() else {
                tracing::warn!(key = %key, "Skipping non-numeric camera key");
                continue;
            };
            match self.load(&key).await {
                Ok(Some(config)) => cameras.push((id, config)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping unreadable camera record");
                }
            }
        }
        cameras.sort_by_key(|(id, _)| *id);
        Ok(cameras)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
