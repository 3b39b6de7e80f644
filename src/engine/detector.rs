//! Trait and value types for detector engine backends.

use std::path::Path;

use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::primitive::{BoundingBox, DetectorConfig, TrainingContext};

/// A single detection on one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box corners (x1, y1, x2, y2)
    pub bbox: BoundingBox,
    /// Detection confidence score in [0, 1]
    pub score: f32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            score,
        }
    }

    pub fn from_bbox(bbox: BoundingBox, score: f32) -> Self {
        Self { bbox, score }
    }
}

/// Raised when engine output does not have the agreed shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorOutputError {
    /// Box rows must carry exactly 4 values (x1, y1, x2, y2).
    #[error("detector returned {rows}x{cols} box array, expected Nx4")]
    BoxArity { rows: usize, cols: usize },
    /// Boxes, scores and labels must agree on the detection count.
    #[error(
        "detector output disagrees on detection count: {boxes} boxes, {scores} scores, {labels} labels"
    )]
    LengthMismatch {
        boxes: usize,
        scores: usize,
        labels: usize,
    },
}

/// Raw per-image engine output: an N×4 box array with parallel score and
/// label arrays, sorted by descending score.
#[derive(Debug, Clone)]
pub struct RawDetections {
    pub boxes: Array2<f32>,
    pub scores: Array1<f32>,
    pub labels: Array1<u32>,
}

impl RawDetections {
    /// Output for an image with no detections at all.
    pub fn empty() -> Self {
        Self {
            boxes: Array2::zeros((0, 4)),
            scores: Array1::zeros(0),
            labels: Array1::zeros(0),
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate shape and convert to [`Detection`] values, preserving the
    /// engine's ordering.
    pub fn into_detections(self) -> Result<Vec<Detection>, DetectorOutputError> {
        let n = self.boxes.nrows();
        if n > 0 && self.boxes.ncols() != 4 {
            return Err(DetectorOutputError::BoxArity {
                rows: n,
                cols: self.boxes.ncols(),
            });
        }
        if self.scores.len() != n || self.labels.len() != n {
            return Err(DetectorOutputError::LengthMismatch {
                boxes: n,
                scores: self.scores.len(),
                labels: self.labels.len(),
            });
        }

        Ok((0..n)
            .map(|i| {
                Detection::new(
                    self.boxes[[i, 0]],
                    self.boxes[[i, 1]],
                    self.boxes[[i, 2]],
                    self.boxes[[i, 3]],
                    self.scores[i],
                )
            })
            .collect())
    }
}

impl From<Vec<Detection>> for RawDetections {
    /// Pack detections into the array form, labels all 0 (single class).
    fn from(detections: Vec<Detection>) -> Self {
        let n = detections.len();
        Self {
            boxes: Array2::from_shape_fn((n, 4), |(i, j)| {
                let b = &detections[i].bbox;
                match j {
                    0 => b.x1,
                    1 => b.y1,
                    2 => b.x2,
                    _ => b.y2,
                }
            }),
            scores: Array1::from_shape_fn(n, |i| detections[i].score),
            labels: Array1::zeros(n),
        }
    }
}

/// Trait for detector engine backends.
///
/// The engine owns everything neural: architecture, losses, anchor
/// generation, NMS, and image decoding/resizing. The primitive hands it a
/// prepared annotation set to train on and one image path at a time to
/// predict on.
///
/// # Example
///
/// ```ignore
/// use retinanet_primitive::{DetectorEngine, RawDetections};
///
/// struct MyEngine {
///     // Your model here
/// }
///
/// impl DetectorEngine for MyEngine {
///     type Error = std::io::Error;
///
///     fn train(
///         &mut self,
///         context: &TrainingContext,
///         config: &DetectorConfig,
///         weights: Option<&Path>,
///     ) -> Result<(), Self::Error> {
///         // Run the training loop
///         Ok(())
///     }
///
///     fn predict(&mut self, image: &Path) -> Result<RawDetections, Self::Error> {
///         // Run inference, sorted by descending score
///         Ok(RawDetections::empty())
///     }
/// }
/// ```
pub trait DetectorEngine {
    /// Error type for engine failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Train the detector on a prepared annotation set.
    ///
    /// `weights` is the resolved pretrained-weights file when the config
    /// requested one, `None` for training from scratch.
    fn train(
        &mut self,
        context: &TrainingContext,
        config: &DetectorConfig,
        weights: Option<&Path>,
    ) -> Result<(), Self::Error>;

    /// Run inference on a single image.
    ///
    /// Returned detections must be sorted by descending score; the caller
    /// stops reading at the first sub-threshold score.
    fn predict(&mut self, image: &Path) -> Result<RawDetections, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_round_trip_preserves_order() {
        let detections = vec![
            Detection::new(1.0, 2.0, 3.0, 4.0, 0.9),
            Detection::new(5.0, 6.0, 7.0, 8.0, 0.7),
        ];

        let raw = RawDetections::from(detections.clone());
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.into_detections().unwrap(), detections);
    }

    #[test]
    fn test_empty_output() {
        let raw = RawDetections::empty();
        assert!(raw.is_empty());
        assert!(raw.into_detections().unwrap().is_empty());
    }

    #[test]
    fn test_box_arity_rejected() {
        let raw = RawDetections {
            boxes: array![[1.0, 2.0, 3.0]],
            scores: array![0.9],
            labels: Array1::zeros(1),
        };

        assert_eq!(
            raw.into_detections().unwrap_err(),
            DetectorOutputError::BoxArity { rows: 1, cols: 3 }
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let raw = RawDetections {
            boxes: array![[1.0, 2.0, 3.0, 4.0]],
            scores: array![0.9, 0.8],
            labels: Array1::zeros(1),
        };

        assert_eq!(
            raw.into_detections().unwrap_err(),
            DetectorOutputError::LengthMismatch {
                boxes: 1,
                scores: 2,
                labels: 1
            }
        );
    }
}
