//! Persistence for camwatch: an opaque ordered string-keyed key/value
//! service plus the typed camera/user adapters over it.
//!
//! The JSON record formats are wire-compatible with the previous
//! implementation's on-disk records, including its `subset: false` and
//! stringly-typed coordinate quirks.

pub mod camera_store;
pub mod error;
pub mod kv;
pub mod record;
pub mod user_store;

pub use camera_store::CameraStore;
pub use error::StoreError;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use user_store::UserStore;
