//! The camera entity: configuration, cached frames, and the update pipeline.
//!
//! A camera owns its two most recent cropped frames plus the last processed
//! output. [`Camera::ingest`] implements the replace-vs-retain decision that
//! drives change detection; [`Camera::apply`] runs the algorithm over the
//! cached pair and re-encodes the output.

use chrono::{DateTime, Utc};
use image::RgbImage;
use std::time::Duration;

use crate::algorithm::{self, Algorithm};
use crate::error::CoreError;
use crate::frame::{self, CropRegion};
use crate::geo::{self, Coordinates, UNKNOWN_DISTANCE_KM};

/// Default minimum time between re-fetches.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// CameraConfig
// ---------------------------------------------------------------------------

/// Persistent camera configuration. Immutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub name: String,
    pub source_url: String,
    /// Sub-area of the fetched frame used for processing; `None` = full frame.
    pub crop: Option<CropRegion>,
    /// `None` means unknown location.
    pub coordinates: Option<Coordinates>,
    pub refresh_interval: Duration,
    /// Key into the algorithm registry; unknown ids resolve to "none".
    pub algorithm_id: String,
}

impl CameraConfig {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            crop: None,
            coordinates: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            algorithm_id: algorithm::ALGORITHM_NONE.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Which branch [`Camera::ingest`] took for a newly fetched frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Same shape, at least one pixel changed: previous <- last <- new.
    Swapped,
    /// First frame ever seen by this camera.
    First,
    /// Shape changed: unrelated scene, cached frame replaced outright.
    SceneReset,
    /// Pixel-identical to the cached frame: cache untouched.
    Identical,
}

#[derive(Debug)]
pub struct Camera {
    config: CameraConfig,
    last_frame: Option<RgbImage>,
    previous_frame: Option<RgbImage>,
    last_output_png: Option<Vec<u8>>,
    last_activity: usize,
    last_updated_at: Option<DateTime<Utc>>,
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            last_frame: None,
            previous_frame: None,
            last_output_png: None,
            last_activity: 0,
            last_updated_at: None,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn last_activity(&self) -> usize {
        self.last_activity
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated_at
    }

    pub fn has_previous_frame(&self) -> bool {
        self.previous_frame.is_some()
    }

    /// Fold a newly fetched (already cropped) frame into the cache.
    ///
    /// The previous frame is only promoted when the new frame has the same
    /// shape as the cached one AND differs in at least one pixel. Identical
    /// frames leave the cache untouched; a shape change replaces the cached
    /// frame but keeps the previous one as-is.
    pub fn ingest(&mut self, new_frame: RgbImage) -> IngestOutcome {
        match &self.last_frame {
            Some(last) if last.dimensions() == new_frame.dimensions() => {
                if last.as_raw() == new_frame.as_raw() {
                    IngestOutcome::Identical
                } else {
                    self.previous_frame = self.last_frame.take();
                    self.last_frame = Some(new_frame);
                    IngestOutcome::Swapped
                }
            }
            Some(_) => {
                self.last_frame = Some(new_frame);
                IngestOutcome::SceneReset
            }
            None => {
                self.last_frame = Some(new_frame);
                IngestOutcome::First
            }
        }
    }

    /// Run the algorithm over the cached frame pair and store the outputs.
    ///
    /// Always reprocesses, even when the last ingest was `Identical`; the
    /// swap decision and the processing decision are independent.
    pub fn apply(&mut self, algorithm: &Algorithm, now: DateTime<Utc>) -> Result<(), CoreError> {
        let Some(current) = &self.last_frame else {
            return Err(CoreError::Validation(
                "cannot process a camera with no ingested frame".to_string(),
            ));
        };
        let outcome = algorithm.process(current, self.previous_frame.as_ref());
        self.last_output_png = Some(frame::encode_png(&algorithm::render_markers(&outcome))?);
        self.last_activity = outcome.keypoints.len();
        self.last_updated_at = Some(now);
        Ok(())
    }

    /// Full update pipeline: decode, crop, ingest, process, encode.
    pub fn update_from_bytes(
        &mut self,
        bytes: &[u8],
        algorithm: &Algorithm,
        now: DateTime<Utc>,
    ) -> Result<IngestOutcome, CoreError> {
        let decoded = frame::decode_frame(bytes)?;
        let cropped = match self.config.crop {
            Some(region) => frame::crop_frame(&decoded, region),
            None => decoded,
        };
        let outcome = self.ingest(cropped);
        self.apply(algorithm, now)?;
        tracing::trace!(
            camera = %self.config.name,
            outcome = ?outcome,
            activity = self.last_activity,
            "Camera updated"
        );
        Ok(outcome)
    }

    /// Whether the camera is due for a refresh at `now`.
    ///
    /// A camera that has never successfully updated is always due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_updated_at {
            None => true,
            Some(at) => match (now - at).to_std() {
                Ok(elapsed) => elapsed > self.config.refresh_interval,
                // `now` before the last update (clock skew): not due.
                Err(_) => false,
            },
        }
    }

    /// Distance in kilometres from this camera to a query point.
    ///
    /// Returns [`UNKNOWN_DISTANCE_KM`] when this camera has no coordinates.
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        match self.config.coordinates {
            Some(own) => geo::haversine_km(own, Coordinates::new(latitude, longitude)),
            None => UNKNOWN_DISTANCE_KM,
        }
    }

    /// Consistent copy of the externally visible state for readers.
    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            name: self.config.name.clone(),
            source_url: self.config.source_url.clone(),
            algorithm_id: self.config.algorithm_id.clone(),
            activity: self.last_activity,
            output_png: self.last_output_png.clone(),
            last_updated_at: self.last_updated_at,
        }
    }
}

/// Point-in-time view of a camera handed to readers, so they never observe
/// a partially updated camera.
#[derive(Debug, Clone)]
pub struct CameraSnapshot {
    pub name: String,
    pub source_url: String,
    pub algorithm_id: String,
    pub activity: usize,
    /// Encoded processed frame; `None` until the first successful update.
    pub output_png: Option<Vec<u8>>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn flat(w: u32, h: u32, v: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([v, v, v]))
    }

    fn camera() -> Camera {
        Camera::new(CameraConfig::new("test", "http://example.invalid/cam.jpg"))
    }

    // -- ingest state machine -------------------------------------------------

    #[test]
    fn first_frame_does_not_set_previous() {
        let mut cam = camera();
        assert_eq!(cam.ingest(flat(4, 4, 10)), IngestOutcome::First);
        assert!(!cam.has_previous_frame());
    }

    #[test]
    fn changed_frame_promotes_previous() {
        let mut cam = camera();
        cam.ingest(flat(4, 4, 10));
        assert_eq!(cam.ingest(flat(4, 4, 20)), IngestOutcome::Swapped);
        assert!(cam.has_previous_frame());
    }

    #[test]
    fn identical_frame_leaves_cache_untouched() {
        let mut cam = camera();
        cam.ingest(flat(4, 4, 10));
        assert_eq!(cam.ingest(flat(4, 4, 10)), IngestOutcome::Identical);
        assert!(!cam.has_previous_frame());
    }

    #[test]
    fn repeated_identical_frames_never_promote_previous() {
        let mut cam = camera();
        for _ in 0..3 {
            cam.ingest(flat(4, 4, 10));
        }
        assert!(!cam.has_previous_frame());
    }

    #[test]
    fn shape_change_resets_without_touching_previous() {
        let mut cam = camera();
        cam.ingest(flat(4, 4, 10));
        cam.ingest(flat(4, 4, 20));
        assert!(cam.has_previous_frame());
        assert_eq!(cam.ingest(flat(8, 8, 30)), IngestOutcome::SceneReset);
        // Previous survives the reset (and is shape-filtered at process time).
        assert!(cam.has_previous_frame());
    }

    // -- update pipeline ------------------------------------------------------

    #[test]
    fn update_from_bytes_runs_the_full_pipeline() {
        let mut cam = camera();
        let bytes = frame::encode_png(&flat(6, 6, 42)).unwrap();
        let outcome = cam
            .update_from_bytes(&bytes, &Algorithm::None, Utc::now())
            .unwrap();
        assert_eq!(outcome, IngestOutcome::First);
        let snap = cam.snapshot();
        assert!(snap.output_png.is_some());
        assert_eq!(snap.activity, 0);
        assert!(snap.last_updated_at.is_some());
    }

    #[test]
    fn identical_source_still_reprocesses() {
        let mut cam = camera();
        let bytes = frame::encode_png(&flat(6, 6, 42)).unwrap();
        cam.update_from_bytes(&bytes, &Algorithm::None, Utc::now())
            .unwrap();
        let first_stamp = cam.last_updated_at();
        let outcome = cam
            .update_from_bytes(&bytes, &Algorithm::None, Utc::now())
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Identical);
        assert!(!cam.has_previous_frame());
        // Reprocessing happened: the update timestamp moved.
        assert!(cam.last_updated_at() >= first_stamp);
        assert!(cam.snapshot().output_png.is_some());
    }

    #[test]
    fn crop_is_applied_before_ingest() {
        let mut config = CameraConfig::new("cropped", "http://example.invalid/cam.jpg");
        config.crop = Some(CropRegion::new(2, 6, 1, 5));
        let mut cam = Camera::new(config);
        let bytes = frame::encode_png(&flat(10, 10, 7)).unwrap();
        cam.update_from_bytes(&bytes, &Algorithm::None, Utc::now())
            .unwrap();
        let png = cam.snapshot().output_png.unwrap();
        let out = frame::decode_frame(&png).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn apply_without_frame_is_an_error() {
        let mut cam = camera();
        assert!(cam.apply(&Algorithm::None, Utc::now()).is_err());
    }

    // -- staleness ------------------------------------------------------------

    #[test]
    fn never_updated_camera_is_due() {
        assert!(camera().is_due(Utc::now()));
    }

    #[test]
    fn freshly_updated_camera_is_not_due() {
        let mut cam = camera();
        let bytes = frame::encode_png(&flat(4, 4, 1)).unwrap();
        let now = Utc::now();
        cam.update_from_bytes(&bytes, &Algorithm::None, now).unwrap();
        assert!(!cam.is_due(now + chrono::Duration::seconds(5)));
        assert!(cam.is_due(now + chrono::Duration::seconds(31)));
    }

    // -- distance -------------------------------------------------------------

    #[test]
    fn unlocated_camera_reports_sentinel_distance() {
        let cam = camera();
        assert_eq!(cam.distance_km(69.65, 18.95), UNKNOWN_DISTANCE_KM);
        assert_eq!(cam.distance_km(0.0, 0.0), UNKNOWN_DISTANCE_KM);
    }

    #[test]
    fn located_camera_reports_haversine_distance() {
        let mut config = CameraConfig::new("located", "http://example.invalid/cam.jpg");
        config.coordinates = Some(Coordinates::new(69.65, 18.95));
        let cam = Camera::new(config);
        assert_eq!(cam.distance_km(69.65, 18.95), 0.0);
        assert!(cam.distance_km(59.91, 10.75) > 1000.0);
    }
}
