use std::fmt;
use std::sync::Arc;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::softmax;

/// Default softmax temperature applied to prototype similarities
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

/// A fitted model that turns a feature vector into class probabilities.
///
/// Implementations must be read-only during inference so a single model can
/// serve concurrent callers without locking.
pub trait ProbabilityModel: Send + Sync + fmt::Debug {
    /// Learned class labels, in the same order as the probabilities returned
    /// by [`predict_proba`](Self::predict_proba)
    fn classes(&self) -> &[String];

    /// Number of input features the model was fitted on, when known
    fn feature_dimension(&self) -> Option<usize> {
        None
    }

    /// Per-class probabilities for one feature vector
    fn predict_proba(&self, features: &Array1<f64>) -> Result<Array1<f64>, ClassifierError>;
}

/// Nearest-prototype classifier over TF-IDF vectors.
///
/// Each class is represented by the normalized mean of its training vectors.
/// Similarities to the prototypes are turned into probabilities with a softmax
/// at a fixed temperature, so the probability order always matches the
/// similarity order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrototypeModel {
    classes: Vec<String>,
    prototypes: Vec<Array1<f64>>,
    temperature: f64,
}

impl PrototypeModel {
    pub fn new(
        classes: Vec<String>,
        prototypes: Vec<Array1<f64>>,
        temperature: f64,
    ) -> Result<Self, ClassifierError> {
        let model = Self {
            classes,
            prototypes,
            temperature,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Raw similarity of the input to each class prototype
    pub fn scores(&self, features: &Array1<f64>) -> Result<Array1<f64>, ClassifierError> {
        let dimension = self.prototypes.first().map(|p| p.len()).unwrap_or(0);
        if features.len() != dimension {
            return Err(ClassifierError::PredictionError(format!(
                "Feature vector has {} dimensions, model expects {}",
                features.len(),
                dimension
            )));
        }
        Ok(self.prototypes.iter().map(|p| p.dot(features)).collect())
    }

    /// Checks that a deserialized model is internally consistent
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.classes.len() != self.prototypes.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Model has {} classes but {} prototypes",
                self.classes.len(),
                self.prototypes.len()
            )));
        }
        if let Some(first) = self.prototypes.first() {
            if self.prototypes.iter().any(|p| p.len() != first.len()) {
                return Err(ClassifierError::ValidationError(
                    "Prototypes have mismatched dimensions".into(),
                ));
            }
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(ClassifierError::ValidationError(format!(
                "Temperature must be positive, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

impl ProbabilityModel for PrototypeModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn feature_dimension(&self) -> Option<usize> {
        self.prototypes.first().map(|p| p.len())
    }

    fn predict_proba(&self, features: &Array1<f64>) -> Result<Array1<f64>, ClassifierError> {
        if self.classes.is_empty() {
            return Err(ClassifierError::PredictionError("Model has no learned classes".into()));
        }
        let scores = self.scores(features)?;
        Ok(softmax(&scores, self.temperature))
    }
}

/// The classifier half of the artifacts: either a fitted model or nothing.
#[derive(Debug, Clone, Default)]
pub enum ClassifierSlot {
    #[default]
    Untrained,
    Fitted(Arc<dyn ProbabilityModel>),
}

impl ClassifierSlot {
    pub fn fitted<M: ProbabilityModel + 'static>(model: M) -> Self {
        Self::Fitted(Arc::new(model))
    }

    /// Returns the model only when it has learned at least one class
    pub fn usable(&self) -> Option<&dyn ProbabilityModel> {
        match self {
            Self::Fitted(model) if !model.classes().is_empty() => Some(model.as_ref()),
            _ => None,
        }
    }

    pub fn classes(&self) -> &[String] {
        match self {
            Self::Fitted(model) => model.classes(),
            Self::Untrained => &[],
        }
    }
}
