//! A user's ordered, duplicate-free camera subscription list.

/// A user identified by login name, holding the camera ids they follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: String,
    cameras: Vec<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cameras: Vec::new(),
        }
    }

    /// Reconstruct from a persisted subscription list, dropping duplicates
    /// while preserving first-seen order.
    pub fn with_cameras(id: impl Into<String>, cameras: Vec<String>) -> Self {
        let mut user = Self::new(id);
        for camera in cameras {
            user.subscribe(&camera);
        }
        user
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cameras(&self) -> &[String] {
        &self.cameras
    }

    pub fn is_subscribed(&self, camera_id: &str) -> bool {
        self.cameras.iter().any(|c| c == camera_id)
    }

    /// Subscribe to a camera. Returns `true` if the list changed;
    /// subscribing twice is a no-op.
    pub fn subscribe(&mut self, camera_id: &str) -> bool {
        if self.is_subscribed(camera_id) {
            return false;
        }
        self.cameras.push(camera_id.to_string());
        true
    }

    /// Unsubscribe from a camera. Returns `true` if the list changed;
    /// removing an id that was never subscribed is a no-op.
    pub fn unsubscribe(&mut self, camera_id: &str) -> bool {
        let before = self.cameras.len();
        self.cameras.retain(|c| c != camera_id);
        self.cameras.len() != before
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_is_idempotent() {
        let mut user = User::new("edvard");
        assert!(user.subscribe("0"));
        assert!(!user.subscribe("0"));
        assert_eq!(user.cameras(), ["0"]);
    }

    #[test]
    fn unsubscribe_unknown_id_is_a_noop() {
        let mut user = User::new("edvard");
        user.subscribe("0");
        assert!(!user.unsubscribe("7"));
        assert_eq!(user.cameras(), ["0"]);
    }

    #[test]
    fn subscription_order_is_preserved() {
        let mut user = User::new("edvard");
        user.subscribe("2");
        user.subscribe("0");
        user.subscribe("1");
        assert_eq!(user.cameras(), ["2", "0", "1"]);
    }

    #[test]
    fn persisted_duplicates_are_dropped() {
        let user = User::with_cameras("edvard", vec!["1".into(), "1".into(), "2".into()]);
        assert_eq!(user.cameras(), ["1", "2"]);
    }
}
