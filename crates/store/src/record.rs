//! Wire format for persisted records.
//!
//! Camera records keep the legacy JSON shape
//! `{name, subset, url, interval, algorithm, lat, lon}` byte-compatible:
//! `subset` is `false` when unset (not `null`), and `lat`/`lon` may arrive
//! as numbers, numeric strings, or garbage — anything unparseable simply
//! means "unknown location".

use std::time::Duration;

use serde::{Deserialize, Serialize};

use camwatch_core::camera::{CameraConfig, DEFAULT_REFRESH_INTERVAL};
use camwatch_core::frame::CropRegion;
use camwatch_core::geo::Coordinates;

/// Persisted camera configuration. Image and output state never round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub name: String,
    /// `[[x0, x1], [y0, y1]]`, or the legacy `false` sentinel for "unset".
    #[serde(
        serialize_with = "subset::serialize",
        deserialize_with = "subset::deserialize",
        default
    )]
    pub subset: Option<[[u32; 2]; 2]>,
    pub url: String,
    /// Refresh interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: f64,
    pub algorithm: String,
    #[serde(deserialize_with = "lenient_f64::deserialize", default)]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient_f64::deserialize", default)]
    pub lon: Option<f64>,
}

fn default_interval() -> f64 {
    DEFAULT_REFRESH_INTERVAL.as_secs_f64()
}

impl CameraRecord {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            name: config.name.clone(),
            subset: config.crop.map(|c| [[c.x0, c.x1], [c.y0, c.y1]]),
            url: config.source_url.clone(),
            interval: config.refresh_interval.as_secs_f64(),
            algorithm: config.algorithm_id.clone(),
            lat: config.coordinates.map(|c| c.latitude),
            lon: config.coordinates.map(|c| c.longitude),
        }
    }

    pub fn into_config(self) -> CameraConfig {
        let interval = if self.interval.is_finite() && self.interval > 0.0 {
            Duration::from_secs_f64(self.interval)
        } else {
            DEFAULT_REFRESH_INTERVAL
        };
        CameraConfig {
            name: self.name,
            source_url: self.url,
            crop: self
                .subset
                .map(|[[x0, x1], [y0, y1]]| CropRegion::new(x0, x1, y0, y1)),
            // Both halves must parse for a location to be known.
            coordinates: self
                .lat
                .zip(self.lon)
                .map(|(lat, lon)| Coordinates::new(lat, lon)),
            refresh_interval: interval,
            algorithm_id: self.algorithm,
        }
    }
}

// ---------------------------------------------------------------------------
// Field codecs
// ---------------------------------------------------------------------------

mod subset {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// The legacy writer stored `false` for "no subset"; keep emitting it so
    /// old and new records stay mutually readable.
    pub fn serialize<S: Serializer>(
        value: &Option<[[u32; 2]; 2]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ranges) => ranges.serialize(serializer),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<[[u32; 2]; 2]>, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Null | serde_json::Value::Bool(_) => Ok(None),
            other => serde_json::from_value(other).map(Some).map_err(D::Error::custom),
        }
    }
}

mod lenient_f64 {
    use serde::{Deserialize, Deserializer};

    /// Accept a number, a numeric string, or anything else (-> unknown).
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let parsed = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(parsed.filter(|f| f.is_finite()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
