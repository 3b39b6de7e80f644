//! The fit/produce primitive combining annotation building, the detector
//! engine, index mapping and reconciliation.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::engine::DetectorEngine;
use crate::primitive::annotation::{TrainingContext, build_annotations};
use crate::primitive::config::{DetectorConfig, WeightsStore};
use crate::primitive::error::Error;
use crate::primitive::index_map::IndexMapping;
use crate::primitive::output::PredictionTable;
use crate::primitive::reconcile::reconcile;
use crate::primitive::table::{RowId, ScoringTable, TrainingTable};

/// Object-detection primitive wrapping a [`DetectorEngine`].
///
/// Follows the pipeline-framework lifecycle: `set_training_data` converts
/// the input table into an immutable [`TrainingContext`], `fit` trains the
/// engine on it, and `produce` runs inference and reconciles the output so
/// every input row id appears in the result.
///
/// A single instance owns its engine and context exclusively; fit and
/// produce are sequential calls, not designed for concurrent use.
pub struct ObjectDetection<E: DetectorEngine> {
    engine: E,
    config: DetectorConfig,
    weights: WeightsStore,
    context: Option<TrainingContext>,
    trained: bool,
}

impl<E: DetectorEngine> ObjectDetection<E> {
    /// Create a new primitive with the given engine and hyperparameters.
    pub fn new(engine: E, config: DetectorConfig) -> Self {
        Self {
            engine,
            config,
            weights: WeightsStore::new(),
            context: None,
            trained: false,
        }
    }

    /// Create a new primitive with default hyperparameters.
    pub fn with_default_config(engine: E) -> Self {
        Self::new(engine, DetectorConfig::default())
    }

    /// Register the pretrained-weights files supplied by the runtime.
    pub fn with_weights(mut self, weights: WeightsStore) -> Self {
        self.weights = weights;
        self
    }

    /// Get a reference to the hyperparameters.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Get a reference to the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Get a mutable reference to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The training context built by the last `set_training_data` call.
    pub fn context(&self) -> Option<&TrainingContext> {
        self.context.as_ref()
    }

    /// Convert the training table into the annotation structure the engine
    /// consumes. Replaces any previous training data and invalidates the
    /// trained state.
    pub fn set_training_data(&mut self, table: &TrainingTable) -> Result<(), Error> {
        self.context = Some(build_annotations(table)?);
        self.trained = false;
        Ok(())
    }

    /// Train the engine on the prepared annotation set.
    ///
    /// Resolves pretrained weights when the config asks for them. The
    /// engine call is one opaque blocking operation, so the deadline is
    /// checked once up front; produce enforces it between images.
    pub fn fit(&mut self, deadline: Option<Duration>) -> Result<(), Error> {
        self.config.validate()?;
        let context = self.context.as_ref().ok_or(Error::NoTrainingData)?;
        let clock = Deadline::start(deadline);
        clock.check()?;

        let weights = if self.config.pretrained_weights {
            Some(self.weights.resolve(self.config.backbone)?)
        } else {
            None
        };

        info!(
            backbone = %self.config.backbone,
            epochs = self.config.n_epochs,
            images = context.annotations.len(),
            "training detector"
        );
        let started = Instant::now();
        self.engine
            .train(context, &self.config, weights)
            .map_err(Error::engine)?;
        info!(elapsed = ?started.elapsed(), "training complete");

        self.trained = true;
        Ok(())
    }

    /// Run inference over the scoring table and reconcile the output.
    ///
    /// Every row id of the input appears in the result: qualifying
    /// detections fan out over the rows their basename resolves to, and
    /// uncovered rows get placeholder predictions. Images are processed
    /// one blocking engine call at a time, with a cooperative deadline
    /// check between them.
    pub fn produce(
        &mut self,
        table: &ScoringTable,
        deadline: Option<Duration>,
    ) -> Result<PredictionTable, Error> {
        if !self.trained {
            return Err(Error::NotTrained);
        }
        let clock = Deadline::start(deadline);

        // Resolve every row's paths, then deduplicate for inference while
        // the full list feeds the index mapping.
        let mut entries: Vec<(RowId, PathBuf)> = Vec::new();
        for row in &table.rows {
            for path in table.resolve_row(row)? {
                entries.push((row.row_id, path));
            }
        }

        let mut seen = HashSet::new();
        let unique: Vec<PathBuf> = entries
            .iter()
            .filter(|(_, path)| seen.insert(path.clone()))
            .map(|(_, path)| path.clone())
            .collect();
        let index = IndexMapping::build(entries.iter().map(|(id, path)| (*id, path.as_path())));

        info!(images = unique.len(), rows = table.rows.len(), "running detector");
        let started = Instant::now();
        let mut per_image = Vec::with_capacity(unique.len());
        for path in unique {
            clock.check()?;
            let raw = self.engine.predict(&path).map_err(Error::engine)?;
            let detections = raw.into_detections()?;
            debug!(image = %path.display(), detections = detections.len(), "image scored");
            per_image.push((path, detections));
        }
        info!(elapsed = ?started.elapsed(), "inference complete");

        let expected: Vec<RowId> = table.row_ids().collect();
        let rows = reconcile(&per_image, &index, &expected);
        Ok(PredictionTable::from_reconciled(rows))
    }
}

/// Wall-clock budget for one fit/produce call.
struct Deadline {
    budget: Option<Duration>,
    started: Instant,
}

impl Deadline {
    fn start(budget: Option<Duration>) -> Self {
        Self {
            budget,
            started: Instant::now(),
        }
    }

    fn check(&self) -> Result<(), Error> {
        if let Some(budget) = self.budget {
            let elapsed = self.started.elapsed();
            if elapsed >= budget {
                return Err(Error::DeadlineExceeded { budget, elapsed });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_unlimited_never_trips() {
        let clock = Deadline::start(None);
        assert!(clock.check().is_ok());
    }

    #[test]
    fn test_deadline_trips_once_budget_is_spent() {
        let clock = Deadline::start(Some(Duration::ZERO));
        assert!(matches!(
            clock.check(),
            Err(Error::DeadlineExceeded { .. })
        ));
    }
}
