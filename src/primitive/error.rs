use std::time::Duration;

use thiserror::Error;

use crate::engine::DetectorOutputError;
use crate::primitive::bbox::MalformedPolygon;
use crate::primitive::config::Backbone;
use crate::primitive::table::RowId;

/// Failures raised by the primitive.
///
/// Row-level input problems carry the offending row id so nothing vanishes
/// silently; engine failures are boxed and wrapped, never swallowed. The
/// one place a gap is intentionally masked is reconciliation, which fills
/// placeholder rows instead of erroring (downstream evaluation requires
/// full row coverage).
#[derive(Debug, Error)]
pub enum Error {
    /// A bounding-box field did not decode into 8 numeric tokens.
    #[error("row {row}: {source}")]
    MalformedBoundingBox {
        row: RowId,
        #[source]
        source: MalformedPolygon,
    },

    /// The detector engine returned output of unexpected shape or arity.
    #[error(transparent)]
    DetectorOutput(#[from] DetectorOutputError),

    /// Pretrained weights were requested but none are registered for the
    /// selected backbone.
    #[error("no pretrained weights registered for backbone {backbone}")]
    MissingWeights { backbone: Backbone },

    /// A row's filename count disagrees with the table's file columns.
    #[error("row {row}: expected {expected} filename value(s), found {found}")]
    TableShape {
        row: RowId,
        expected: usize,
        found: usize,
    },

    /// A hyperparameter failed validation.
    #[error("invalid hyperparameter: {0}")]
    InvalidConfig(String),

    /// `fit` was called before `set_training_data`.
    #[error("fit called before set_training_data")]
    NoTrainingData,

    /// `produce` was called before a successful `fit`.
    #[error("produce called before fit")]
    NotTrained,

    /// The wall-clock deadline ran out between image batches.
    #[error("deadline of {budget:?} exceeded after {elapsed:?}")]
    DeadlineExceeded { budget: Duration, elapsed: Duration },

    /// The detector engine failed.
    #[error("detector engine failure: {0}")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an engine failure.
    pub fn engine<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Engine(Box::new(error))
    }
}
