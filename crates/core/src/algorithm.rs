//! Detection algorithm variants and the registry that resolves string ids.
//!
//! The set of algorithms is a closed enum rather than a runtime lookup of
//! arbitrary types: every camera resolves to exactly [`Algorithm::None`] or
//! [`Algorithm::Traffic`], and unknown ids silently fall back to `None` so a
//! stale persisted id can never break a camera.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::corners::corners_fast9;
use imageproc::drawing::draw_hollow_circle_mut;
use serde::Serialize;

use crate::frame::{self, DIFF_THRESHOLD};

/// Default detector sensitivity for the traffic algorithm.
pub const DEFAULT_SENSITIVITY: u8 = 30;

/// Registry id of the passthrough algorithm, also the fallback.
pub const ALGORITHM_NONE: &str = "none";

/// Registry id of the traffic-detection algorithm.
pub const ALGORITHM_TRAFFIC: &str = "traffic";

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// A processing strategy applied to a camera's current/previous frame pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Passthrough: grayscale the current frame, detect nothing.
    None,
    /// Diff consecutive frames and count corner keypoints in the changes.
    Traffic { sensitivity: u8 },
}

/// A detected image feature on the processed output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

/// Result of one algorithm invocation. Owned by the camera that ran it.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub image: GrayImage,
    pub keypoints: Vec<Keypoint>,
}

impl Algorithm {
    /// Registry id of this variant.
    pub fn id(&self) -> &'static str {
        match self {
            Algorithm::None => ALGORITHM_NONE,
            Algorithm::Traffic { .. } => ALGORITHM_TRAFFIC,
        }
    }

    /// Process a current frame against the optional previous frame.
    ///
    /// For `Traffic`: contrast-normalize both frames, take the absolute
    /// per-pixel difference, zero everything below [`DIFF_THRESHOLD`], and
    /// run FAST corner detection on what remains. A scene with no motion
    /// therefore scores zero even under constant lighting. A previous frame
    /// whose shape differs from the current one (scene reset) is treated as
    /// absent.
    pub fn process(&self, current: &RgbImage, previous: Option<&RgbImage>) -> Outcome {
        match self {
            Algorithm::None => Outcome {
                image: frame::grayscale(current),
                keypoints: Vec::new(),
            },
            Algorithm::Traffic { sensitivity } => {
                let cur = frame::equalize(&frame::grayscale(current));
                let previous = previous.filter(|p| p.dimensions() == current.dimensions());
                let Some(previous) = previous else {
                    return Outcome {
                        image: cur,
                        keypoints: Vec::new(),
                    };
                };
                let prev = frame::equalize(&frame::grayscale(previous));
                let diff = frame::threshold_to_zero(&frame::absdiff(&cur, &prev), DIFF_THRESHOLD);
                let keypoints = corners_fast9(&diff, *sensitivity)
                    .into_iter()
                    .map(|c| Keypoint {
                        x: c.x,
                        y: c.y,
                        score: c.score,
                    })
                    .collect();
                Outcome {
                    image: diff,
                    keypoints,
                }
            }
        }
    }
}

/// Render the processed frame with keypoints overlaid as hollow circles.
///
/// This is the presentation form consumers see: the processed image plus a
/// marker per detected feature.
pub fn render_markers(outcome: &Outcome) -> RgbImage {
    let mut canvas = DynamicImage::ImageLuma8(outcome.image.clone()).to_rgb8();
    for kp in &outcome.keypoints {
        draw_hollow_circle_mut(&mut canvas, (kp.x as i32, kp.y as i32), 3, Rgb([255, 0, 0]));
    }
    canvas
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Presentation metadata for one algorithm.
#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Immutable mapping from string ids to algorithm variants.
///
/// Constructed once and handed to the manager; deliberately not a
/// process-wide singleton.
#[derive(Debug, Clone, Copy)]
pub struct AlgorithmRegistry {
    traffic_sensitivity: u8,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self {
            traffic_sensitivity: DEFAULT_SENSITIVITY,
        }
    }

    /// Override the traffic detector sensitivity for every resolution.
    pub fn with_traffic_sensitivity(sensitivity: u8) -> Self {
        Self {
            traffic_sensitivity: sensitivity,
        }
    }

    /// Resolve an id to an algorithm. Unknown or empty ids fall back to
    /// [`Algorithm::None`]; this never fails.
    pub fn resolve(&self, id: &str) -> Algorithm {
        match id {
            ALGORITHM_TRAFFIC => Algorithm::Traffic {
                sensitivity: self.traffic_sensitivity,
            },
            _ => Algorithm::None,
        }
    }

    /// All known algorithms in stable presentation order.
    pub fn list(&self) -> Vec<AlgorithmInfo> {
        vec![
            AlgorithmInfo {
                id: ALGORITHM_NONE,
                name: "None",
                description: "Passthrough algorithm that only grayscales the frame",
            },
            AlgorithmInfo {
                id: ALGORITHM_TRAFFIC,
                name: "Traffic algorithm",
                description: "Detects traffic level from keypoints in frame-to-frame changes",
            },
        ]
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn flat_rgb(w: u32, h: u32, v: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([v, v, v]))
    }

    // -- registry -------------------------------------------------------------

    #[test]
    fn unknown_id_resolves_to_none_variant() {
        let registry = AlgorithmRegistry::new();
        assert_eq!(
            registry.resolve("nonexistent-id"),
            registry.resolve(ALGORITHM_NONE)
        );
        assert_eq!(registry.resolve(""), Algorithm::None);
    }

    #[test]
    fn traffic_resolves_with_configured_sensitivity() {
        let registry = AlgorithmRegistry::with_traffic_sensitivity(55);
        assert_eq!(
            registry.resolve(ALGORITHM_TRAFFIC),
            Algorithm::Traffic { sensitivity: 55 }
        );
    }

    #[test]
    fn list_is_stable_and_complete() {
        let ids: Vec<_> = AlgorithmRegistry::new()
            .list()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![ALGORITHM_NONE, ALGORITHM_TRAFFIC]);
    }

    // -- none variant ---------------------------------------------------------

    #[test]
    fn none_variant_grayscales_and_detects_nothing() {
        let outcome = Algorithm::None.process(&flat_rgb(4, 4, 120), None);
        assert_eq!(outcome.image.dimensions(), (4, 4));
        assert!(outcome.keypoints.is_empty());
    }

    // -- traffic variant ------------------------------------------------------

    #[test]
    fn traffic_without_previous_returns_equalized_current() {
        let alg = Algorithm::Traffic { sensitivity: 30 };
        let outcome = alg.process(&flat_rgb(4, 4, 90), None);
        assert_eq!(outcome.image.dimensions(), (4, 4));
        assert!(outcome.keypoints.is_empty());
    }

    #[test]
    fn traffic_with_mismatched_previous_skips_the_diff() {
        let alg = Algorithm::Traffic { sensitivity: 30 };
        let outcome = alg.process(&flat_rgb(4, 4, 90), Some(&flat_rgb(8, 8, 90)));
        assert!(outcome.keypoints.is_empty());
    }

    #[test]
    fn traffic_on_identical_frames_scores_zero() {
        let alg = Algorithm::Traffic { sensitivity: 30 };
        let frame = flat_rgb(16, 16, 90);
        let outcome = alg.process(&frame, Some(&frame.clone()));
        assert!(outcome.keypoints.is_empty());
        // Identical frames leave nothing after the diff threshold.
        assert!(outcome.image.as_raw().iter().all(|&p| p == 0));
    }

    #[test]
    fn traffic_is_deterministic_for_fixed_input() {
        let alg = Algorithm::Traffic { sensitivity: 30 };
        let mut cur = flat_rgb(16, 16, 40);
        for x in 4..10 {
            for y in 4..10 {
                cur.put_pixel(x, y, Rgb([220, 220, 220]));
            }
        }
        let prev = flat_rgb(16, 16, 40);
        let a = alg.process(&cur, Some(&prev));
        let b = alg.process(&cur, Some(&prev));
        assert_eq!(a.keypoints, b.keypoints);
        assert_eq!(a.image.as_raw(), b.image.as_raw());
    }

    // -- markers --------------------------------------------------------------

    #[test]
    fn render_markers_matches_output_dimensions() {
        let outcome = Outcome {
            image: GrayImage::from_pixel(10, 10, Luma([0])),
            keypoints: vec![Keypoint {
                x: 5,
                y: 5,
                score: 1.0,
            }],
        };
        let rendered = render_markers(&outcome);
        assert_eq!(rendered.dimensions(), (10, 10));
        // The marker circle leaves at least one red pixel.
        assert!(rendered.pixels().any(|p| p.0 == [255, 0, 0]));
    }
}
