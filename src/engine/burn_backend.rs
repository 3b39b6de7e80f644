//! Burn backend adapter for the detector engine seam.
//!
//! This module wires a RetinaNet model built with the Burn framework into
//! the [`DetectorEngine`] contract. The adapter owns only the glue:
//! backbone-specific pixel normalization, tensor layout, and putting the
//! model's output into descending-score order. The forward pass, losses
//! and the training loop belong to the [`BurnRetinaNet`] implementation;
//! image decoding belongs to the [`FrameDecoder`].
//!
//! # Example
//!
//! ```ignore
//! use retinanet_primitive::{Backbone, BurnEngine, BurnRetinaNet};
//! use burn::backend::NdArray;
//!
//! struct MyRetinaNet { /* ... */ }
//!
//! impl BurnRetinaNet<NdArray> for MyRetinaNet {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<RawDetection> {
//!         // Regression, classification, NMS
//!     }
//!     // ...
//! }
//!
//! let engine = BurnEngine::new(model, decoder, device, Backbone::ResNet50);
//! ```

use std::path::Path;

use burn::prelude::*;
use burn::tensor::Tensor;
use thiserror::Error;
use tracing::info;

use crate::engine::detector::{Detection, DetectorEngine, RawDetections};
use crate::primitive::{Backbone, DetectorConfig, TrainingContext};

/// Error type for Burn engine failures.
#[derive(Debug, Error)]
pub enum BurnEngineError {
    /// The frame decoder could not produce pixels for an image.
    #[error("cannot decode '{path}': {reason}")]
    Decode { path: String, reason: String },

    /// Decoded frame does not match the model's expected input size.
    #[error("frame is {got_width}x{got_height} but the model expects {want_width}x{want_height}")]
    FrameSize {
        got_width: u32,
        got_height: u32,
        want_width: u32,
        want_height: u32,
    },

    /// Pixel buffer length disagrees with the frame dimensions.
    #[error("pixel buffer holds {len} bytes, expected {width}x{height}x3")]
    BufferLength { len: usize, width: u32, height: u32 },

    /// The registered pretrained-weights file does not exist on disk.
    #[error("pretrained weights not found at '{0}'")]
    WeightsUnavailable(String),

    /// The model's training loop failed.
    #[error("training failed: {0}")]
    Training(String),
}

/// A decoded image: interleaved BGR bytes, row-major.
///
/// Decoding and resizing stay outside this crate; the hosting application
/// supplies frames already at the model's input size.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes an image file into a [`DecodedFrame`].
pub trait FrameDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedFrame, BurnEngineError>;
}

/// One raw model detection, after regression and NMS inside the model.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Bounding box corners: [x1, y1, x2, y2]
    pub bbox: [f32; 4],
    /// Confidence score
    pub score: f32,
    /// Class id
    pub label: u32,
}

/// Trait for Burn-based RetinaNet models.
///
/// Implement this for your model to plug it into [`BurnEngine`]. The
/// engine never looks inside: architecture, anchor generation, losses and
/// the optimization loop are all the model's concern.
pub trait BurnRetinaNet<B: Backend>: Send + Sync {
    /// Run the forward pass on a `[1, 3, height, width]` tensor and return
    /// post-NMS detections in any order.
    fn forward(&self, input: Tensor<B, 4>) -> Vec<RawDetection>;

    /// Expected input size as (height, width).
    fn input_size(&self) -> (u32, u32) {
        (512, 512)
    }

    /// Run the training loop over the annotation set.
    fn fit(
        &mut self,
        context: &TrainingContext,
        config: &DetectorConfig,
        weights: Option<&Path>,
    ) -> Result<(), BurnEngineError>;
}

/// Burn-based detector engine implementing [`DetectorEngine`].
pub struct BurnEngine<B: Backend, M: BurnRetinaNet<B>, D: FrameDecoder> {
    model: M,
    decoder: D,
    device: B::Device,
    backbone: Backbone,
}

impl<B: Backend, M: BurnRetinaNet<B>, D: FrameDecoder> BurnEngine<B, M, D> {
    /// Create a new engine around a model, a frame decoder and a device.
    pub fn new(model: M, decoder: D, device: B::Device, backbone: Backbone) -> Self {
        Self {
            model,
            decoder,
            device,
            backbone,
        }
    }

    /// Get a reference to the underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Get a mutable reference to the underlying model.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Normalize an interleaved BGR frame into a planar `[1, 3, H, W]`
    /// tensor with the backbone's channel means subtracted.
    fn preprocess(&self, frame: &DecodedFrame) -> Result<Tensor<B, 4>, BurnEngineError> {
        let (want_height, want_width) = self.model.input_size();
        if frame.width != want_width || frame.height != want_height {
            return Err(BurnEngineError::FrameSize {
                got_width: frame.width,
                got_height: frame.height,
                want_width,
                want_height,
            });
        }

        let width = frame.width as usize;
        let height = frame.height as usize;
        if frame.pixels.len() != width * height * 3 {
            return Err(BurnEngineError::BufferLength {
                len: frame.pixels.len(),
                width: frame.width,
                height: frame.height,
            });
        }

        let means = self.backbone.channel_means();
        let plane = width * height;
        let mut data = vec![0f32; 3 * plane];
        for (pixel, chunk) in frame.pixels.chunks_exact(3).enumerate() {
            for (channel, &value) in chunk.iter().enumerate() {
                data[channel * plane + pixel] = value as f32 - means[channel];
            }
        }

        Ok(
            Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([
                1,
                3,
                height,
                width,
            ]),
        )
    }

    /// Convert raw model outputs into the engine's descending-score order.
    fn postprocess(raw: Vec<RawDetection>) -> Vec<Detection> {
        let mut detections: Vec<Detection> = raw
            .into_iter()
            .map(|r| Detection::new(r.bbox[0], r.bbox[1], r.bbox[2], r.bbox[3], r.score))
            .collect();
        detections.sort_by(|a, b| b.score.total_cmp(&a.score));
        detections
    }
}

impl<B: Backend, M: BurnRetinaNet<B>, D: FrameDecoder> DetectorEngine for BurnEngine<B, M, D> {
    type Error = BurnEngineError;

    fn train(
        &mut self,
        context: &TrainingContext,
        config: &DetectorConfig,
        weights: Option<&Path>,
    ) -> Result<(), Self::Error> {
        if let Some(path) = weights {
            if !path.exists() {
                return Err(BurnEngineError::WeightsUnavailable(
                    path.display().to_string(),
                ));
            }
        }

        info!(
            backbone = %self.backbone,
            images = context.annotations.len(),
            "delegating training to model"
        );
        self.model.fit(context, config, weights)
    }

    fn predict(&mut self, image: &Path) -> Result<RawDetections, Self::Error> {
        let frame = self.decoder.decode(image)?;
        let input = self.preprocess(&frame)?;
        let raw = self.model.forward(input);
        Ok(RawDetections::from(Self::postprocess(raw)))
    }
}
