//! Detector hyperparameters, backbone selection and weight resolution.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::primitive::error::Error;

/// Feature-extraction backbone underlying the detector.
///
/// A closed set: each variant knows its pretrained-weights location and
/// the pixel normalization its weights were trained with, so nothing
/// downstream dispatches on architecture names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Backbone {
    #[default]
    ResNet50,
    ResNet101,
    ResNet152,
}

impl Backbone {
    pub const ALL: [Backbone; 3] = [Backbone::ResNet50, Backbone::ResNet101, Backbone::ResNet152];

    pub fn name(&self) -> &'static str {
        match self {
            Backbone::ResNet50 => "resnet50",
            Backbone::ResNet101 => "resnet101",
            Backbone::ResNet152 => "resnet152",
        }
    }

    /// Download location of this backbone's pretrained weights.
    pub fn default_weights_uri(&self) -> &'static str {
        match self {
            Backbone::ResNet50 => "http://public.datadrivendiscovery.org/ResNet-50-model.keras.h5",
            Backbone::ResNet101 => {
                "http://public.datadrivendiscovery.org/ResNet-101-model.keras.h5"
            }
            Backbone::ResNet152 => {
                "http://public.datadrivendiscovery.org/ResNet-152-model.keras.h5"
            }
        }
    }

    /// Per-channel means subtracted during preprocessing, BGR order.
    /// The residual-network family shares the ImageNet caffe convention.
    pub fn channel_means(&self) -> [f32; 3] {
        [103.939, 116.779, 123.68]
    }
}

impl fmt::Display for Backbone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a backbone name does not match any supported variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown backbone '{0}'; expected resnet50, resnet101 or resnet152")]
pub struct UnknownBackbone(pub String);

impl FromStr for Backbone {
    type Err = UnknownBackbone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resnet50" => Ok(Backbone::ResNet50),
            "resnet101" => Ok(Backbone::ResNet101),
            "resnet152" => Ok(Backbone::ResNet152),
            other => Err(UnknownBackbone(other.to_string())),
        }
    }
}

/// Hyperparameters for the detector engine.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub backbone: Backbone,
    pub batch_size: usize,
    pub n_epochs: usize,
    /// Freeze training of backbone layers.
    pub freeze_backbone: bool,
    /// Load the model with pretrained weights for the selected backbone.
    pub pretrained_weights: bool,
    pub learning_rate: f32,
    pub steps_per_epoch: usize,
    /// Accepted and forwarded to the engine; rendering annotated images
    /// after evaluation is not implemented.
    pub emit_visualizations: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backbone: Backbone::ResNet50,
            batch_size: 1,
            n_epochs: 20,
            freeze_backbone: true,
            pretrained_weights: true,
            learning_rate: 1e-5,
            steps_per_epoch: 50,
            emit_visualizations: false,
        }
    }
}

impl DetectorConfig {
    /// Reject hyperparameters the engine cannot train with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".into()));
        }
        if self.n_epochs == 0 {
            return Err(Error::InvalidConfig("n_epochs must be positive".into()));
        }
        if self.steps_per_epoch == 0 {
            return Err(Error::InvalidConfig(
                "steps_per_epoch must be positive".into(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be a positive finite value, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Local weight files keyed by backbone, supplied by the hosting runtime.
#[derive(Debug, Clone, Default)]
pub struct WeightsStore {
    volumes: HashMap<Backbone, PathBuf>,
}

impl WeightsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, backbone: Backbone, path: impl Into<PathBuf>) {
        self.volumes.insert(backbone, path.into());
    }

    pub fn get(&self, backbone: Backbone) -> Option<&Path> {
        self.volumes.get(&backbone).map(PathBuf::as_path)
    }

    /// Resolve the weights file for a backbone, erroring when pretrained
    /// weights were requested but never registered.
    pub fn resolve(&self, backbone: Backbone) -> Result<&Path, Error> {
        self.get(backbone).ok_or(Error::MissingWeights { backbone })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.backbone, Backbone::ResNet50);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.n_epochs, 20);
        assert!(config.freeze_backbone);
        assert!(config.pretrained_weights);
        assert_eq!(config.steps_per_epoch, 50);
        assert!(!config.emit_visualizations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let mut config = DetectorConfig::default();
        config.batch_size = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = DetectorConfig::default();
        config.learning_rate = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = DetectorConfig::default();
        config.learning_rate = f32::NAN;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_backbone_round_trip() {
        for backbone in Backbone::ALL {
            assert_eq!(backbone.name().parse::<Backbone>().unwrap(), backbone);
        }
        assert!("vgg16".parse::<Backbone>().is_err());
    }

    #[test]
    fn test_backbone_carries_weights_uri() {
        assert!(
            Backbone::ResNet50
                .default_weights_uri()
                .contains("ResNet-50")
        );
        assert!(
            Backbone::ResNet101
                .default_weights_uri()
                .contains("ResNet-101")
        );
        assert!(
            Backbone::ResNet152
                .default_weights_uri()
                .contains("ResNet-152")
        );
    }

    #[test]
    fn test_weights_resolution() {
        let mut store = WeightsStore::new();
        store.insert(Backbone::ResNet50, "/volumes/resnet50.bin");

        assert!(store.resolve(Backbone::ResNet50).is_ok());
        assert!(matches!(
            store.resolve(Backbone::ResNet101),
            Err(Error::MissingWeights {
                backbone: Backbone::ResNet101
            })
        ));
    }
}
