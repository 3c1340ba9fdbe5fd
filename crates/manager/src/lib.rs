//! Orchestration: the [`Manager`] owning all cameras and users, and the
//! [`RefreshScheduler`] that keeps the cameras fresh.

pub mod error;
pub mod manager;
pub mod scheduler;

pub use error::ManagerError;
pub use manager::{ActivityHistory, Manager, SubscriptionCandidate};
pub use scheduler::{RefreshScheduler, RefreshStats, DEFAULT_MAX_CONCURRENT};
