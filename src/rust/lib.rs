//! Insight prediction for medical report text and free-text symptoms.
//!
//! A [`Predictor`] runs in one of two modes, fixed by the artifacts it was
//! built on:
//!
//! - **Trained**: a fitted TF-IDF vectorizer and a probability model are
//!   available. Predictions are the three most probable classes, formatted as
//!   `"label: NN.NN%"`.
//! - **Untrained**: no fitted vectorizer. Predictions come from the
//!   [`FallbackMatcher`], a fixed keyword→advisory table.
//!
//! Prediction never fails and never returns an empty list.
//!
//! # Basic Usage
//!
//! ```rust
//! use medscan::{Artifacts, ArtifactStore, Predictor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::tempdir()?;
//! let store = ArtifactStore::new(dir.path())?;
//! let predictor = Predictor::new(Artifacts::load_or_default(&store));
//!
//! let insights = predictor.predict("Fasting glucose 131 mg/dL", &["glucose", "fasting"]);
//! assert!(!insights.is_empty() && insights.len() <= 3);
//! # Ok(())
//! # }
//! ```
//!
//! # Training
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use medscan::{Artifacts, ClassifierBuilder, ClassDefinition, ClassifierSlot, Mode, Predictor};
//!
//! let (vectorizer, model) = ClassifierBuilder::new()
//!     .add_class(ClassDefinition::new("Diabetes risk")
//!         .with_examples(vec!["high fasting glucose", "insulin resistance"]))?
//!     .add_class(ClassDefinition::new("Anemia")
//!         .with_examples(vec!["low hemoglobin", "iron deficiency"]))?
//!     .build()?;
//!
//! let predictor = Predictor::new(Artifacts::new(vectorizer, ClassifierSlot::fitted(model)));
//! assert_eq!(predictor.mode(), Mode::Trained);
//! assert!(predictor.predict_from_symptoms("my glucose is high")[0].starts_with("Diabetes risk: "));
//! # Ok(())
//! # }
//! ```

pub mod artifact_store;
pub mod classifier;
pub mod fallback;
pub mod interpret;
pub mod predictor;
pub mod training;

pub use artifact_store::{ArtifactError, ArtifactManifest, ArtifactStore};
pub use classifier::{
    ClassDefinition, ClassifierBuilder, ClassifierError, ClassifierInfo, ClassifierSlot,
    ProbabilityModel, PrototypeModel, TfidfVectorizer, VectorizerConfig,
};
pub use fallback::{FallbackMatcher, DEFAULT_ADVISORY};
pub use interpret::{interpret, Interpretation};
pub use predictor::{Artifacts, Mode, Predictor, ReportAnalysis, SymptomCheck};
pub use training::{EvaluationReport, TrainingConfig, TrainingError, TrainingOutcome, TrainingRecord};

pub fn init_logger() {
    env_logger::init();
}
