//! Engine module for connecting detector backends to the primitive.
//!
//! This module provides the trait and value types for plugging an external
//! RetinaNet-style inference backend (Burn, ONNX Runtime, etc.) into the
//! fit/produce primitive.

mod builder;
mod detector;

pub use builder::DetectionBuilder;
pub use detector::{Detection, DetectorEngine, DetectorOutputError, RawDetections};

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{
    BurnEngine, BurnEngineError, BurnRetinaNet, DecodedFrame, FrameDecoder, RawDetection,
};
