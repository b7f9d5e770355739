use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::WasteCategory;

/// Axis-aligned bounding box in pixel coordinates, corners as (x1, y1, x2, y2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Apply independent horizontal/vertical scale factors.
    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }

    /// Clamp all corners into `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let w = width as f32;
        let h = height as f32;
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }
}

/// A raw detection as returned by a model backend, in inference-resolution
/// pixel coordinates.
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// A classified detection in the coordinates of the frame it was computed
/// against. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "type")]
    pub category: WasteCategory,

    /// Label the model actually produced, before category mapping.
    pub original_label: String,

    /// Confidence score in [0, 1].
    pub confidence: f32,

    pub bbox: BoundingBox,

    pub timestamp: DateTime<Utc>,
}
