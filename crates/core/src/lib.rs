//! Pure domain logic for camwatch: frame operations, detection algorithms,
//! the camera entity with its frame-diff state machine, geo distance, and
//! per-camera activity history.
//!
//! This crate has no internal dependencies and performs no I/O beyond
//! in-memory image encoding, so every other crate can depend on it.

pub mod activity;
pub mod algorithm;
pub mod camera;
pub mod error;
pub mod frame;
pub mod geo;
pub mod user;

pub use error::CoreError;
