//! Offline training: labelled CSV in, persisted artifacts out.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::artifact_store::{ArtifactError, ArtifactStore};
use crate::classifier::{
    ClassifierBuilder, ClassifierError, ProbabilityModel, PrototypeModel, TfidfVectorizer,
    VectorizerConfig, DEFAULT_TEMPERATURE,
};

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("No training records found in {0}")]
    NoRecords(String),
    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),
}

/// One labelled row of training data (`text,label` columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub text: String,
    pub label: String,
}

impl TrainingRecord {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Share of records held out for evaluation
    pub test_fraction: f64,
    /// Seed for the shuffle before splitting
    pub seed: u64,
    pub vectorizer: VectorizerConfig,
    pub temperature: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            vectorizer: VectorizerConfig::default(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl TrainingConfig {
    fn validate(&self) -> Result<(), TrainingError> {
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(TrainingError::InvalidConfig(format!(
                "test_fraction must be in [0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }
}

/// Per-class scores on the held-out split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Precision, recall and f1 per class plus overall accuracy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub total: usize,
}

impl EvaluationReport {
    /// Scores the most probable class for each record against its label
    pub fn evaluate(
        vectorizer: &TfidfVectorizer,
        model: &dyn ProbabilityModel,
        records: &[TrainingRecord],
    ) -> Self {
        let predictions: Vec<Option<&str>> = records
            .iter()
            .map(|record| predict_label(vectorizer, model, &record.text))
            .collect();
        Self::from_predictions(records, &predictions)
    }

    fn from_predictions(records: &[TrainingRecord], predictions: &[Option<&str>]) -> Self {
        let mut labels: BTreeSet<&str> = records.iter().map(|r| r.label.as_str()).collect();
        labels.extend(predictions.iter().flatten().copied());

        let mut counts: BTreeMap<&str, (usize, usize, usize)> = BTreeMap::new(); // (tp, fp, fn)
        let mut correct = 0;
        for (record, predicted) in records.iter().zip(predictions) {
            let actual = record.label.as_str();
            match predicted {
                Some(p) if *p == actual => {
                    correct += 1;
                    counts.entry(actual).or_default().0 += 1;
                }
                Some(p) => {
                    counts.entry(*p).or_default().1 += 1;
                    counts.entry(actual).or_default().2 += 1;
                }
                None => counts.entry(actual).or_default().2 += 1,
            }
        }

        let classes = labels
            .into_iter()
            .map(|label| {
                let (tp, fp, fn_) = counts.get(label).copied().unwrap_or_default();
                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.to_string(),
                    precision,
                    recall,
                    f1,
                    support: tp + fn_,
                }
            })
            .collect();

        Self {
            classes,
            accuracy: ratio(correct, records.len()),
            total: records.len(),
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return writeln!(f, "No held-out records to evaluate");
        }
        let width = self
            .classes
            .iter()
            .map(|c| c.label.chars().count())
            .max()
            .unwrap_or(0)
            .max("accuracy".len());

        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9.2}  {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )
    }
}

/// Everything produced by one training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub vectorizer: TfidfVectorizer,
    pub model: PrototypeModel,
    pub report: EvaluationReport,
}

/// Reads `text,label` rows from a CSV file with a header line
pub fn load_records(path: &Path) -> Result<Vec<TrainingRecord>, TrainingError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let mut record: TrainingRecord = row?;
        record.label = record.label.trim().to_string();
        if record.text.trim().is_empty() || record.label.is_empty() {
            warn!("Skipping row with empty text or label in {:?}", path);
            continue;
        }
        records.push(record);
    }
    if records.is_empty() {
        return Err(TrainingError::NoRecords(path.display().to_string()));
    }
    info!("Loaded {} training records from {:?}", records.len(), path);
    Ok(records)
}

/// Shuffles with the configured seed and holds out the last
/// `ceil(n * test_fraction)` records, always keeping one for training.
pub fn split(
    records: &[TrainingRecord],
    config: &TrainingConfig,
) -> (Vec<TrainingRecord>, Vec<TrainingRecord>) {
    let mut shuffled = records.to_vec();
    let mut rng = StdRng::seed_from_u64(config.seed);
    shuffled.shuffle(&mut rng);

    let n = shuffled.len();
    let test_len = ((n as f64 * config.test_fraction).ceil() as usize).min(n.saturating_sub(1));
    let test = shuffled.split_off(n - test_len);
    (shuffled, test)
}

/// Fits vectorizer and model on the training split and evaluates on the rest
pub fn train(records: &[TrainingRecord], config: &TrainingConfig) -> Result<TrainingOutcome, TrainingError> {
    config.validate()?;
    if records.is_empty() {
        return Err(TrainingError::NoRecords("input".into()));
    }

    let (train_set, test_set) = split(records, config);
    info!("Training on {} records, evaluating on {}", train_set.len(), test_set.len());

    let mut builder = ClassifierBuilder::new()
        .with_vectorizer_config(config.vectorizer.clone())
        .with_temperature(config.temperature);
    for record in &train_set {
        builder.add_example(record.label.as_str(), record.text.as_str())?;
    }
    let (vectorizer, model) = builder.build()?;

    let report = EvaluationReport::evaluate(&vectorizer, &model, &test_set);
    info!("Evaluation report:\n{}", report);

    Ok(TrainingOutcome {
        vectorizer,
        model,
        report,
    })
}

/// Loads a CSV, trains, and saves the resulting artifacts into `store`
pub fn train_from_csv(
    csv_path: &Path,
    store: &ArtifactStore,
    config: &TrainingConfig,
) -> Result<TrainingOutcome, TrainingError> {
    let records = load_records(csv_path)?;
    let outcome = train(&records, config)?;
    store.save(&outcome.vectorizer, &outcome.model)?;
    Ok(outcome)
}

fn predict_label<'m>(
    vectorizer: &TfidfVectorizer,
    model: &'m dyn ProbabilityModel,
    text: &str,
) -> Option<&'m str> {
    let probabilities = model.predict_proba(&vectorizer.transform(text)).ok()?;
    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in probabilities.iter().enumerate() {
        if best.map_or(true, |(_, top)| p > top) {
            best = Some((i, p));
        }
    }
    best.and_then(|(i, _)| model.classes().get(i)).map(String::as_str)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
