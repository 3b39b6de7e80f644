//! RetinaNet object-detection primitive with a tabular interface.
//!
//! This crate wraps an external RetinaNet-style detector behind the
//! fit/produce contract of automated ML pipeline frameworks: training data
//! arrives as a table of image filenames and ground-truth bounding boxes,
//! and every produce call returns exactly one (or more) prediction row per
//! input row, with placeholder rows patched in for images the detector
//! returned nothing for.
//!
//! The network itself — architecture, losses, anchors, NMS — lives behind
//! the [`DetectorEngine`] trait; this crate owns the bookkeeping around it:
//!
//! 1. **Annotation building** — packed 8-coordinate polygon strings become
//!    per-image annotation lists ([`primitive::build_annotations`]).
//! 2. **Index mapping** — image basenames map back to the row identifiers
//!    that referenced them, duplicates included ([`primitive::IndexMapping`]).
//! 3. **Reconciliation** — detector output, the index mapping and a
//!    placeholder generator merge into a full-coverage prediction table
//!    ([`primitive::reconcile`]).
//!
//! An optional Burn-based engine adapter is available behind the
//! `burn-backend` feature.

pub mod engine;
pub mod primitive;

pub use engine::{Detection, DetectionBuilder, DetectorEngine, DetectorOutputError, RawDetections};
pub use primitive::{
    AnnotationSet, Backbone, BoundingBox, ClassRegistry, DetectorConfig, Error, FileColumn,
    IndexMapping, ObjectDetection, PredictionRow, PredictionTable, RowId, ScoringRow,
    ScoringTable, TrainingContext, TrainingRow, TrainingTable, WeightsStore,
};

#[cfg(feature = "burn-backend")]
pub use engine::{
    BurnEngine, BurnEngineError, BurnRetinaNet, DecodedFrame, FrameDecoder, RawDetection,
};
