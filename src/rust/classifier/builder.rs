use std::collections::BTreeMap;

use log::{info, warn};
use ndarray::Array1;

use super::error::ClassifierError;
use super::model::{PrototypeModel, DEFAULT_TEMPERATURE};
use super::utils::{average_vectors, normalize_vector};
use super::vectorizer::{TfidfVectorizer, VectorizerConfig};

const MAX_CLASSES: usize = 100;

/// Represents a class definition with a required label and its example texts
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    /// The insight label reported for this class, e.g. "Diabetes risk"
    pub label: String,
    /// Example texts that belong to this class. The class prototype is the
    /// normalized mean of their TF-IDF vectors.
    pub examples: Option<Vec<String>>,
}

impl ClassDefinition {
    /// Creates a new class definition with no examples yet
    ///
    /// # Example
    /// ```
    /// use medscan::ClassDefinition;
    ///
    /// let class = ClassDefinition::new("Anemia");
    /// assert!(class.examples.is_none());
    /// ```
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            examples: None,
        }
    }

    /// Adds examples to the class definition
    ///
    /// # Example
    /// ```
    /// use medscan::ClassDefinition;
    ///
    /// let class = ClassDefinition::new("Anemia")
    ///     .with_examples(vec!["low hemoglobin", "iron deficiency"]);
    /// assert_eq!(class.examples.map(|e| e.len()), Some(2));
    /// ```
    pub fn with_examples(mut self, examples: Vec<impl Into<String>>) -> Self {
        self.examples = Some(examples.into_iter().map(Into::into).collect());
        self
    }
}

/// Fits a vectorizer and a [`PrototypeModel`] together from labelled text.
///
/// The two halves are only ever produced as a pair, so a vectorizer is never
/// persisted without the model that was fitted on its feature space.
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use medscan::{ClassifierBuilder, ClassDefinition};
///
/// let (vectorizer, model) = ClassifierBuilder::new()
///     .add_class(ClassDefinition::new("Diabetes risk")
///         .with_examples(vec!["high fasting glucose", "insulin resistance"]))?
///     .add_class(ClassDefinition::new("Anemia")
///         .with_examples(vec!["low hemoglobin", "iron deficiency"]))?
///     .build()?;
/// assert!(vectorizer.is_ready());
/// # let _ = model;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ClassifierBuilder {
    vectorizer_config: VectorizerConfig,
    temperature: Option<f64>,
    class_examples: BTreeMap<String, Vec<String>>,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tokenization and vocabulary limits used when fitting
    pub fn with_vectorizer_config(mut self, config: VectorizerConfig) -> Self {
        self.vectorizer_config = config;
        self
    }

    /// Sets the softmax temperature of the fitted model
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn validate_class_data(label: &str, examples: &[impl AsRef<str>]) -> Result<(), ClassifierError> {
        if label.trim().is_empty() {
            return Err(ClassifierError::ValidationError("Class label cannot be empty".into()));
        }
        if examples.is_empty() {
            return Err(ClassifierError::ValidationError(format!(
                "Class '{}' must have at least one example",
                label
            )));
        }
        if let Some(pos) = examples.iter().position(|e| e.as_ref().trim().is_empty()) {
            return Err(ClassifierError::ValidationError(format!(
                "Example {} of class '{}' cannot be empty",
                pos + 1,
                label
            )));
        }
        Ok(())
    }

    fn ensure_capacity(&self, label: &str) -> Result<(), ClassifierError> {
        if !self.class_examples.contains_key(label) && self.class_examples.len() >= MAX_CLASSES {
            return Err(ClassifierError::ValidationError(format!(
                "Maximum number of classes ({}) exceeded",
                MAX_CLASSES
            )));
        }
        Ok(())
    }

    /// Adds a whole class at once. Fails if the label was already added.
    pub fn add_class(mut self, class: ClassDefinition) -> Result<Self, ClassifierError> {
        let examples = class.examples.unwrap_or_default();
        Self::validate_class_data(&class.label, &examples)?;

        if self.class_examples.contains_key(&class.label) {
            return Err(ClassifierError::ValidationError(format!(
                "Class '{}' has already been added",
                class.label
            )));
        }
        self.ensure_capacity(&class.label)?;

        self.class_examples.insert(class.label, examples);
        Ok(self)
    }

    /// Appends a single labelled example, creating the class if needed
    pub fn add_example(
        &mut self,
        label: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), ClassifierError> {
        let label = label.into();
        let text = text.into();
        Self::validate_class_data(&label, &[text.as_str()])?;
        self.ensure_capacity(&label)?;

        self.class_examples.entry(label).or_default().push(text);
        Ok(())
    }

    pub fn num_classes(&self) -> usize {
        self.class_examples.len()
    }

    /// Fits the vectorizer on every example and builds one prototype per class
    pub fn build(self) -> Result<(TfidfVectorizer, PrototypeModel), ClassifierError> {
        if self.class_examples.len() < 2 {
            return Err(ClassifierError::BuildError(format!(
                "At least two classes are required, found {}",
                self.class_examples.len()
            )));
        }

        let corpus: Vec<&str> = self
            .class_examples
            .values()
            .flat_map(|examples| examples.iter().map(String::as_str))
            .collect();

        let mut vectorizer = TfidfVectorizer::new(self.vectorizer_config);
        vectorizer.fit(&corpus)?;
        let dimension = vectorizer.vocabulary_size();

        let mut classes = Vec::with_capacity(self.class_examples.len());
        let mut prototypes = Vec::with_capacity(self.class_examples.len());
        for (label, examples) in self.class_examples {
            info!("Processing class '{}' ({} examples)", label, examples.len());

            let vectors: Vec<Array1<f64>> = examples.iter().map(|text| vectorizer.transform(text)).collect();
            let prototype = normalize_vector(&average_vectors(&vectors, dimension));
            if prototype.iter().all(|&x| x == 0.0) {
                warn!("Class '{}' has no terms in the fitted vocabulary", label);
            }

            classes.push(label);
            prototypes.push(prototype);
        }

        let model = PrototypeModel::new(
            classes,
            prototypes,
            self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        )?;
        Ok((vectorizer, model))
    }
}
