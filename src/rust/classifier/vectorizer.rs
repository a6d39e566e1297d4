use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use log::{debug, info};
use ndarray::Array1;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::normalize_vector;

lazy_static! {
    // Word tokens of two or more characters.
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").expect("token pattern is valid");
}

/// Settings that control how text is split into features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Inclusive range of n-gram sizes, e.g. `(1, 2)` for unigrams and bigrams
    pub ngram_range: (usize, usize),
    /// Keep only the most frequent terms across the corpus
    pub max_features: Option<usize>,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 2),
            max_features: Some(5000),
        }
    }
}

/// A TF-IDF text vectorizer.
///
/// An unfitted vectorizer has an empty vocabulary and is not [ready](Self::is_ready);
/// the predictor never sends text through it in that state.
///
/// Fitting learns:
/// - a vocabulary mapping each retained n-gram to a column index (alphabetical order)
/// - a smoothed inverse document frequency per column: `ln((1 + n) / (1 + df)) + 1`
///
/// Transforming counts the known n-grams of a text, weights them by idf and
/// L2-normalizes the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Creates an unfitted vectorizer with the given configuration
    pub fn new(config: VectorizerConfig) -> Self {
        Self {
            config,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// True once the vectorizer has learned a non-empty vocabulary
    pub fn is_ready(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Returns the column index of a term, if it is part of the vocabulary
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Splits text into lowercase word tokens and the configured n-grams
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN_PATTERN.find_iter(&lowered).map(|m| m.as_str()).collect();
        let (min_n, max_n) = self.config.ngram_range;

        let mut terms = Vec::new();
        for n in min_n.max(1)..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    /// Learns the vocabulary and idf weights from a corpus
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<(), ClassifierError> {
        let (min_n, max_n) = self.config.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::ValidationError(format!(
                "Invalid n-gram range ({}, {})",
                min_n, max_n
            )));
        }
        if self.config.max_features == Some(0) {
            return Err(ClassifierError::ValidationError("max_features must be positive".into()));
        }
        if documents.is_empty() {
            return Err(ClassifierError::BuildError("Cannot fit vectorizer on an empty corpus".into()));
        }

        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_counts: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let terms = self.analyze(doc.as_ref());
            let mut seen: HashSet<&str> = HashSet::new();
            for term in &terms {
                *term_counts.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_counts.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        if term_counts.is_empty() {
            return Err(ClassifierError::BuildError(
                "Empty vocabulary: documents contain no usable tokens".into(),
            ));
        }

        let mut retained: Vec<(String, usize)> = term_counts.into_iter().collect();
        if let Some(limit) = self.config.max_features {
            if retained.len() > limit {
                retained.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                retained.truncate(limit);
            }
        }
        retained.sort_by(|a, b| a.0.cmp(&b.0));

        let n_docs = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(retained.len());
        let mut idf = Vec::with_capacity(retained.len());
        for (index, (term, _)) in retained.into_iter().enumerate() {
            let df = doc_counts.get(&term).copied().unwrap_or(0) as f64;
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        info!(
            "Fitted vectorizer on {} documents ({} terms)",
            documents.len(),
            vocabulary.len()
        );
        self.vocabulary = vocabulary;
        self.idf = idf;
        Ok(())
    }

    /// Maps text into the fitted feature space.
    ///
    /// Returns a zero-length vector when the vectorizer is not fitted, and the
    /// zero vector when the text shares no terms with the vocabulary.
    pub fn transform(&self, text: &str) -> Array1<f64> {
        let mut features = Array1::zeros(self.vocabulary.len());
        let mut matched = 0usize;
        for term in self.analyze(text) {
            if let Some(slot) = self.vocabulary.get(&term).and_then(|&i| features.get_mut(i)) {
                *slot += 1.0;
                matched += 1;
            }
        }
        debug!("Transformed text into {} known terms", matched);

        for (value, weight) in features.iter_mut().zip(self.idf.iter()) {
            *value *= weight;
        }
        normalize_vector(&features)
    }

    /// Checks that a deserialized vectorizer is internally consistent
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Vocabulary has {} terms but {} idf weights",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }
        if let Some((term, index)) = self.vocabulary.iter().find(|(_, index)| **index >= self.idf.len()) {
            return Err(ClassifierError::ValidationError(format!(
                "Term '{}' maps to out-of-range column {}",
                term, index
            )));
        }
        Ok(())
    }
}
