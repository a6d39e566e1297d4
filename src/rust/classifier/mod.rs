use serde::Serialize;

mod error;
mod model;
pub mod builder;
mod utils;
pub mod vectorizer;

pub use error::ClassifierError;
pub use model::{ClassifierSlot, ProbabilityModel, PrototypeModel, DEFAULT_TEMPERATURE};
pub use builder::{ClassifierBuilder, ClassDefinition};
pub use vectorizer::{TfidfVectorizer, VectorizerConfig};

/// Information about the current state of a loaded classifier
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    /// Whether predictions go through the classifier or the keyword fallback
    pub mode: crate::Mode,
    /// Number of classes the classifier is trained on
    pub num_classes: usize,
    /// Labels of the classes, in model order
    pub class_labels: Vec<String>,
    /// Number of terms in the fitted vocabulary
    pub vocabulary_size: usize,
    /// Number of features the model expects, when it reports one
    pub feature_dimension: Option<usize>,
}
