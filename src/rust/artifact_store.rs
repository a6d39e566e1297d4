use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{ClassifierError, ProbabilityModel, PrototypeModel, TfidfVectorizer};

/// Environment variable overriding the artifact directory
pub const ARTIFACTS_ENV: &str = "MEDSCAN_ARTIFACTS";

const VECTORIZER_FILE: &str = "vectorizer.json";
const MODEL_FILE: &str = "model.json";
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact file missing: {0}")]
    Missing(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Invalid artifact: {0}")]
    Invalid(#[from] ClassifierError),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Written next to the artifacts so a later load can detect partial or
/// modified files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub created_at: DateTime<Utc>,
    pub vectorizer_hash: String,
    pub model_hash: String,
    pub classes: Vec<String>,
    pub vocabulary_size: usize,
}

/// Locates, persists and loads the fitted (vectorizer, model) pair.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifacts_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a new ArtifactStore with the default artifacts directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Returns the default artifacts directory path
    pub fn get_default_artifacts_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ARTIFACTS_ENV) {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("medscan").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("medscan").join("artifacts");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("medscan").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> io::Result<Self> {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self { artifacts_dir })
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.artifacts_dir.join(VECTORIZER_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifacts_dir.join(MODEL_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.artifacts_dir.join(MANIFEST_FILE)
    }

    /// True when both artifact files are present
    pub fn is_available(&self) -> bool {
        let vectorizer_path = self.vectorizer_path();
        let model_path = self.model_path();
        log::debug!("Checking for artifacts:");
        log::debug!("  Vectorizer path: {:?} (exists: {})", vectorizer_path, vectorizer_path.exists());
        log::debug!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        vectorizer_path.exists() && model_path.exists()
    }

    /// Persists a fitted pair together with its manifest
    pub fn save(
        &self,
        vectorizer: &TfidfVectorizer,
        model: &PrototypeModel,
    ) -> Result<ArtifactManifest, ArtifactError> {
        if !vectorizer.is_ready() {
            return Err(ArtifactError::Invalid(ClassifierError::ValidationError(
                "Refusing to save an unfitted vectorizer".into(),
            )));
        }
        Self::check_pair(vectorizer, model)?;
        fs::create_dir_all(&self.artifacts_dir)?;

        let vectorizer_bytes = serde_json::to_vec(vectorizer)?;
        let model_bytes = serde_json::to_vec(model)?;

        let manifest = ArtifactManifest {
            created_at: Utc::now(),
            vectorizer_hash: sha256_hex(&vectorizer_bytes),
            model_hash: sha256_hex(&model_bytes),
            classes: model.classes().to_vec(),
            vocabulary_size: vectorizer.vocabulary_size(),
        };

        log::info!("Writing {} bytes to {:?}", vectorizer_bytes.len(), self.vectorizer_path());
        fs::write(self.vectorizer_path(), &vectorizer_bytes)?;
        log::info!("Writing {} bytes to {:?}", model_bytes.len(), self.model_path());
        fs::write(self.model_path(), &model_bytes)?;
        fs::write(self.manifest_path(), serde_json::to_vec_pretty(&manifest)?)?;

        log::info!("Artifacts saved to {:?}", self.artifacts_dir);
        Ok(manifest)
    }

    /// Reads the manifest, if one was written
    pub fn read_manifest(&self) -> Result<Option<ArtifactManifest>, ArtifactError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Checks the artifact files against the manifest hashes.
    ///
    /// Returns `Ok(false)` when files are missing or do not match.
    pub fn verify(&self) -> Result<bool, ArtifactError> {
        if !self.is_available() {
            log::info!("One or both artifact files do not exist");
            return Ok(false);
        }
        let Some(manifest) = self.read_manifest()? else {
            log::info!("No manifest found in {:?}", self.artifacts_dir);
            return Ok(false);
        };

        let vectorizer_ok = sha256_hex(&fs::read(self.vectorizer_path())?) == manifest.vectorizer_hash;
        let model_ok = sha256_hex(&fs::read(self.model_path())?) == manifest.model_hash;
        log::info!("Verification results:");
        log::info!("  Vectorizer hash verification: {}", vectorizer_ok);
        log::info!("  Model hash verification: {}", model_ok);
        Ok(vectorizer_ok && model_ok)
    }

    /// Loads the persisted pair.
    ///
    /// `Ok(None)` means no artifacts were saved yet. Files that exist but fail
    /// hash verification, parsing or consistency checks are errors.
    pub fn load(&self) -> Result<Option<(TfidfVectorizer, PrototypeModel)>, ArtifactError> {
        let vectorizer_path = self.vectorizer_path();
        let model_path = self.model_path();
        match (vectorizer_path.exists(), model_path.exists()) {
            (true, true) => {}
            (false, false) => return Ok(None),
            (true, false) => {
                log::warn!("Found {:?} without {:?}", vectorizer_path, model_path);
                return Ok(None);
            }
            (false, true) => {
                log::warn!("Found {:?} without {:?}", model_path, vectorizer_path);
                return Ok(None);
            }
        }

        let vectorizer_bytes = fs::read(&vectorizer_path)?;
        let model_bytes = fs::read(&model_path)?;

        match self.read_manifest()? {
            Some(manifest) => {
                check_hash("vectorizer", &manifest.vectorizer_hash, &vectorizer_bytes)?;
                check_hash("model", &manifest.model_hash, &model_bytes)?;
            }
            None => log::warn!("No manifest in {:?}, skipping hash verification", self.artifacts_dir),
        }

        let vectorizer: TfidfVectorizer = serde_json::from_slice(&vectorizer_bytes)?;
        let model: PrototypeModel = serde_json::from_slice(&model_bytes)?;
        vectorizer.validate()?;
        model.validate()?;
        Self::check_pair(&vectorizer, &model)?;

        Ok(Some((vectorizer, model)))
    }

    /// Deletes the artifact files and manifest if present
    pub fn remove(&self) -> Result<(), ArtifactError> {
        for path in [self.vectorizer_path(), self.model_path(), self.manifest_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn check_pair(vectorizer: &TfidfVectorizer, model: &PrototypeModel) -> Result<(), ClassifierError> {
        match model.feature_dimension() {
            Some(dimension) if dimension != vectorizer.vocabulary_size() => {
                Err(ClassifierError::ValidationError(format!(
                    "Model expects {} features but vectorizer produces {}",
                    dimension,
                    vectorizer.vocabulary_size()
                )))
            }
            _ => Ok(()),
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn check_hash(file_type: &str, expected: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
    let actual = sha256_hex(bytes);
    if actual != expected {
        log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, actual);
        return Err(ArtifactError::HashMismatch {
            file_type: file_type.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
