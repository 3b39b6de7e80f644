//! Builder for creating Detection objects from various input formats.

use crate::engine::detector::Detection;
use crate::primitive::{BoundingBox, MalformedPolygon};

/// Builder for creating `Detection` objects from the box formats different
/// backends emit.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    bbox: BoundingBox,
    score: f32,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box from corner format (x1, y1, x2, y2).
    pub fn corners(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = BoundingBox::new(x1, y1, x2, y2);
        self
    }

    /// Set bounding box from XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = BoundingBox::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0);
        self
    }

    /// Set bounding box from TLWH format (top, left, width, height).
    pub fn tlwh(mut self, t: f32, l: f32, w: f32, h: f32) -> Self {
        self.bbox = BoundingBox::new(l, t, l + w, t + h);
        self
    }

    /// Set bounding box from an 8-coordinate polygon string.
    pub fn polygon(mut self, encoded: &str) -> Result<Self, MalformedPolygon> {
        self.bbox = BoundingBox::from_polygon_str(encoded)?;
        Ok(self)
    }

    /// Set the confidence score.
    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        Detection::from_bbox(self.bbox, self.score)
    }
}
