//! Core primitive logic: annotation building, index mapping, detection
//! reconciliation and output formatting.
//!
//! Everything in this module is synchronous, in-memory bookkeeping around
//! the external detector; the one invariant it defends end to end is that
//! every input row id appears in the output table.

mod annotation;
mod bbox;
mod classes;
mod config;
mod error;
mod index_map;
mod object_detection;
mod output;
mod reconcile;
mod table;

pub use annotation::{AnnotationSet, LabeledBox, TrainingContext, build_annotations};
pub use bbox::{BoundingBox, MalformedPolygon};
pub use classes::ClassRegistry;
pub use config::{Backbone, DetectorConfig, UnknownBackbone, WeightsStore};
pub use error::Error;
pub use index_map::IndexMapping;
pub use object_detection::ObjectDetection;
pub use output::{ColumnSpec, PredictionRow, PredictionTable, SemanticRole, StructuralType};
pub use reconcile::{ReconciledRow, SCORE_THRESHOLD, reconcile};
pub use table::{FileColumn, RowId, ScoringRow, ScoringTable, TrainingRow, TrainingTable};
