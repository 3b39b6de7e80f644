use thiserror::Error;

/// Axis-aligned bounding box given by two corner points.
///
/// Exchanged externally as an 8-coordinate polygon string in the corner
/// order (x1,y1), (x1,y2), (x2,y2), (x2,y1) — clockwise from the top-left
/// with y increasing downward. Internally only the two corners are kept;
/// the other four polygon values are redundant for an axis-aligned box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    /// Top-left x coordinate
    pub x1: f32,
    /// Top-left y coordinate
    pub y1: f32,
    /// Bottom-right x coordinate
    pub x2: f32,
    /// Bottom-right y coordinate
    pub y2: f32,
}

/// Raised when a packed bounding-box field does not decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bounding box '{0}' does not split into 8 comma-separated numeric values")]
pub struct MalformedPolygon(pub String);

impl BoundingBox {
    /// The placeholder box emitted for rows with no qualifying detection.
    pub const ZERO: Self = Self {
        x1: 0.0,
        y1: 0.0,
        x2: 0.0,
        y2: 0.0,
    };

    /// Create a new box from its top-left and bottom-right corners.
    #[inline]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }

    /// Decode an 8-coordinate polygon string into an axis-aligned box.
    ///
    /// The corner values live at tuple positions 0,1 (x1,y1) and 4,5
    /// (x2,y2); positions 2,3,6,7 are redundant and discarded.
    pub fn from_polygon_str(s: &str) -> Result<Self, MalformedPolygon> {
        let tokens: Vec<&str> = s.split(',').collect();
        if tokens.len() != 8 {
            return Err(MalformedPolygon(s.to_string()));
        }

        let mut values = [0f32; 8];
        for (value, token) in values.iter_mut().zip(&tokens) {
            *value = token
                .trim()
                .parse()
                .map_err(|_| MalformedPolygon(s.to_string()))?;
        }

        Ok(Self::new(values[0], values[1], values[4], values[5]))
    }

    /// Encode as the 8-coordinate polygon string consumed downstream.
    pub fn to_polygon_string(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            self.x1, self.y1, self.x1, self.y2, self.x2, self.y2, self.x2, self.y1
        )
    }
}
