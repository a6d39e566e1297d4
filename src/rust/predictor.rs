use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::artifact_store::ArtifactStore;
use crate::classifier::{
    ClassifierError, ClassifierInfo, ClassifierSlot, ProbabilityModel, TfidfVectorizer,
};
use crate::fallback::FallbackMatcher;
use crate::interpret::interpret;

/// Number of ranked insights returned from the classifier path
pub const TOP_K: usize = 3;

/// Returned by [`Predictor::check_symptoms`] for blank input.
pub const EMPTY_SYMPTOMS_MESSAGE: &str = "Please provide symptoms.";

/// How the predictor answers requests, fixed when its artifacts are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The vectorizer has a vocabulary; classification is attempted
    Trained,
    /// No usable vectorizer; every request goes to the keyword fallback
    Untrained,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trained => write!(f, "trained"),
            Self::Untrained => write!(f, "untrained"),
        }
    }
}

/// The immutable (vectorizer, classifier, fallback) bundle a predictor runs on.
#[derive(Debug, Clone)]
pub struct Artifacts {
    vectorizer: TfidfVectorizer,
    classifier: ClassifierSlot,
    fallback: FallbackMatcher,
    mode: Mode,
}

impl Artifacts {
    pub fn new(vectorizer: TfidfVectorizer, classifier: ClassifierSlot) -> Self {
        let mode = if vectorizer.is_ready() {
            Mode::Trained
        } else {
            Mode::Untrained
        };
        Self {
            vectorizer,
            classifier,
            fallback: FallbackMatcher::new(),
            mode,
        }
    }

    /// Empty placeholders: an unfitted vectorizer and no model
    pub fn untrained() -> Self {
        Self::new(TfidfVectorizer::default(), ClassifierSlot::Untrained)
    }

    /// Loads the persisted pair from `store`, or falls back to placeholders.
    ///
    /// Missing files are the normal first-run state and are logged at info
    /// level; unreadable or tampered files are logged as warnings.
    pub fn load_or_default(store: &ArtifactStore) -> Self {
        match store.load() {
            Ok(Some((vectorizer, model))) => {
                info!(
                    "Loaded artifacts from {:?} ({} classes, {} terms)",
                    store.artifacts_dir(),
                    model.classes().len(),
                    vectorizer.vocabulary_size()
                );
                Self::new(vectorizer, ClassifierSlot::fitted(model))
            }
            Ok(None) => {
                info!(
                    "No artifacts found in {:?}, using keyword fallback",
                    store.artifacts_dir()
                );
                Self::untrained()
            }
            Err(e) => {
                warn!("Ignoring unusable artifacts in {:?}: {}", store.artifacts_dir(), e);
                Self::untrained()
            }
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &ClassifierSlot {
        &self.classifier
    }
}

impl Default for Artifacts {
    fn default() -> Self {
        Self::untrained()
    }
}

/// Result of analysing an uploaded report's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAnalysis {
    pub summary: String,
    pub key_terms: Vec<String>,
    pub insights: Vec<String>,
}

/// Result of a free-text symptom check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomCheck {
    pub possible_conditions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Turns report text and symptom descriptions into ranked insights.
///
/// A predictor never fails: with a fitted vectorizer and classifier it returns
/// up to three `"label: NN.NN%"` entries ordered by probability, and otherwise
/// it returns keyword advisories from the [`FallbackMatcher`].
///
/// ```
/// use medscan::Predictor;
///
/// let predictor = Predictor::untrained();
/// let insights = predictor.predict_from_symptoms("elevated glucose and insulin levels");
/// assert_eq!(insights, vec![
///     "Potential elevated blood sugar levels".to_string(),
///     "Consider diabetes screening".to_string(),
/// ]);
/// ```
///
/// The predictor holds no per-call state, so one instance can be shared
/// across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Predictor {
    artifacts: Artifacts,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Predictor>();
    }
};

impl Predictor {
    pub fn new(artifacts: Artifacts) -> Self {
        Self { artifacts }
    }

    /// A predictor that always answers from the keyword fallback
    pub fn untrained() -> Self {
        Self::new(Artifacts::untrained())
    }

    /// Loads artifacts from `store` once and builds a predictor on them
    pub fn from_store(store: &ArtifactStore) -> Self {
        Self::new(Artifacts::load_or_default(store))
    }

    pub fn mode(&self) -> Mode {
        self.artifacts.mode()
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Returns information about the loaded classifier
    pub fn info(&self) -> ClassifierInfo {
        let model = self.artifacts.classifier.usable();
        let class_labels = self.artifacts.classifier.classes().to_vec();
        ClassifierInfo {
            mode: self.mode(),
            num_classes: class_labels.len(),
            class_labels,
            vocabulary_size: self.artifacts.vectorizer.vocabulary_size(),
            feature_dimension: model.and_then(|m| m.feature_dimension()),
        }
    }

    /// Predicts insights for report text enriched with its extracted key terms.
    ///
    /// The text and the space-joined terms are combined with a single space
    /// before classification.
    pub fn predict<S: AsRef<str>>(&self, text: &str, key_terms: &[S]) -> Vec<String> {
        let terms: Vec<&str> = key_terms.iter().map(|term| term.as_ref()).collect();
        let combined = format!("{} {}", text, terms.join(" "));
        self.infer(&combined)
    }

    /// Predicts insights for a free-text symptom description
    pub fn predict_from_symptoms(&self, symptoms: &str) -> Vec<String> {
        self.infer(symptoms)
    }

    /// Summarizes a report, extracts its key terms and predicts insights from both
    pub fn analyze_report(&self, text: &str) -> ReportAnalysis {
        let interpretation = interpret(text);
        let insights = self.predict(text, &interpretation.key_terms);
        ReportAnalysis {
            summary: interpretation.summary,
            key_terms: interpretation.key_terms,
            insights,
        }
    }

    /// Checks symptoms, asking for input instead of predicting on blank text
    pub fn check_symptoms(&self, symptoms: &str) -> SymptomCheck {
        if symptoms.trim().is_empty() {
            return SymptomCheck {
                possible_conditions: Vec::new(),
                message: Some(EMPTY_SYMPTOMS_MESSAGE.to_string()),
            };
        }
        SymptomCheck {
            possible_conditions: self.predict_from_symptoms(symptoms),
            message: None,
        }
    }

    fn infer(&self, combined: &str) -> Vec<String> {
        if self.artifacts.mode() == Mode::Untrained {
            debug!("Vectorizer not fitted, using keyword fallback");
            return self.artifacts.fallback.advise(combined);
        }

        match self.classify(combined) {
            Ok(insights) => insights,
            Err(e) => {
                warn!("Classifier unavailable, using keyword fallback: {}", e);
                self.artifacts.fallback.advise(combined)
            }
        }
    }

    fn classify(&self, combined: &str) -> Result<Vec<String>, ClassifierError> {
        let model = self
            .artifacts
            .classifier
            .usable()
            .ok_or_else(|| ClassifierError::PredictionError("No fitted classifier".into()))?;

        let features = self.artifacts.vectorizer.transform(combined);
        let probabilities = model.predict_proba(&features)?;

        let classes = model.classes();
        if probabilities.len() != classes.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model returned {} probabilities for {} classes",
                probabilities.len(),
                classes.len()
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::PredictionError(
                "Model returned non-finite probabilities".into(),
            ));
        }

        Ok(rank_top_k(classes, &probabilities.to_vec(), TOP_K))
    }
}

/// Formats the `k` most probable classes as `"label: NN.NN%"`.
///
/// Equal probabilities keep their original class order.
fn rank_top_k(classes: &[String], probabilities: &[f64], k: usize) -> Vec<String> {
    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));
    order
        .into_iter()
        .take(k)
        .map(|i| format!("{}: {:.2}%", classes[i], probabilities[i] * 100.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::DEFAULT_ADVISORY;

    #[test]
    fn test_rank_top_k_orders_descending() {
        let classes = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(
            rank_top_k(&classes, &[0.1, 0.6, 0.3], 3),
            vec!["B: 60.00%", "C: 30.00%", "A: 10.00%"]
        );
    }

    #[test]
    fn test_rank_top_k_ties_keep_class_order() {
        let classes: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            rank_top_k(&classes, &[0.25, 0.25, 0.25, 0.25], 3),
            vec!["A: 25.00%", "B: 25.00%", "C: 25.00%"]
        );
    }

    #[test]
    fn test_untrained_mode() {
        let predictor = Predictor::untrained();
        assert_eq!(predictor.mode(), Mode::Untrained);
        assert_eq!(predictor.predict_from_symptoms("xyz nonsense"), vec![DEFAULT_ADVISORY]);
        assert_eq!(predictor.predict::<&str>("", &[]), vec![DEFAULT_ADVISORY]);
    }

    #[test]
    fn test_check_symptoms_blank() {
        let check = Predictor::untrained().check_symptoms("   \n");
        assert!(check.possible_conditions.is_empty());
        assert_eq!(check.message.as_deref(), Some(EMPTY_SYMPTOMS_MESSAGE));
    }

    #[test]
    fn test_info_untrained() {
        let info = Predictor::untrained().info();
        assert_eq!(info.mode, Mode::Untrained);
        assert_eq!(info.num_classes, 0);
        assert_eq!(info.vocabulary_size, 0);
    }
}
