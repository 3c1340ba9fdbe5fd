//! Typed user persistence: one JSON array of camera ids per user key.

use std::sync::Arc;

use camwatch_core::user::User;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

#[derive(Clone)]
pub struct UserStore {
    kv: Arc<dyn KeyValueStore>,
}

impl UserStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Persist a user's subscription list under their login name.
    pub async fn save(&self, user: &User) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(user.cameras())?;
        self.kv.put(user.id(), &bytes).await
    }

    pub async fn load(&self, id: &str) -> Result<Option<User>, StoreError> {
        let Some(bytes) = self.kv.get(id).await? else {
            return Ok(None);
        };
        let cameras: Vec<String> = serde_json::from_slice(&bytes)?;
        Ok(Some(User::with_cameras(id, cameras)))
    }

    /// Load every user, sorted by login name.
    pub async fn load_all(&self) -> Result<Vec<User>, StoreError> {
        let mut users = Vec::new();
        for key in self.kv.keys().await? {
            match self.load(&key).await {
                Ok(Some(user)) => users.push(user),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping unreadable user record");
                }
            }
        }
        Ok(users)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let store = UserStore::new(Arc::new(MemoryStore::new()));
        let mut user = User::new("edvard");
        user.subscribe("0");
        user.subscribe("3");
        store.save(&user).await.unwrap();
        let loaded = store.load("edvard").await.unwrap().unwrap();
        assert_eq!(loaded.cameras(), ["0", "3"]);
        assert_eq!(store.load("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn record_is_a_plain_json_array() {
        let kv = Arc::new(MemoryStore::new());
        let store = UserStore::new(kv.clone());
        let mut user = User::new("edvard");
        user.subscribe("1");
        store.save(&user).await.unwrap();
        let raw = kv.get("edvard").await.unwrap().unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&raw).unwrap(),
                   serde_json::json!(["1"]));
    }

    #[tokio::test]
    async fn load_all_is_sorted_by_name() {
        let store = UserStore::new(Arc::new(MemoryStore::new()));
        for name in ["zoe", "anna"] {
            store.save(&User::new(name)).await.unwrap();
        }
        let names: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id().to_string())
            .collect();
        assert_eq!(names, ["anna", "zoe"]);
    }
}
