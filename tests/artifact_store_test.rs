use std::fs;

use medscan::{
    ArtifactError, ArtifactStore, Artifacts, ClassDefinition, ClassifierBuilder, ClassifierSlot,
    Mode, Predictor, PrototypeModel, TfidfVectorizer, DEFAULT_ADVISORY,
};
use tempfile::TempDir;

fn fitted_pair() -> (TfidfVectorizer, PrototypeModel) {
    ClassifierBuilder::new()
        .add_class(ClassDefinition::new("Diabetes risk").with_examples(vec![
            "fasting glucose elevated",
            "insulin resistance",
        ]))
        .unwrap()
        .add_class(ClassDefinition::new("Anemia").with_examples(vec![
            "low hemoglobin",
            "iron deficiency anemia",
        ]))
        .unwrap()
        .add_class(ClassDefinition::new("Hypertension").with_examples(vec![
            "high blood pressure",
            "elevated systolic pressure",
        ]))
        .unwrap()
        .build()
        .unwrap()
}

fn saved_store() -> Result<(TempDir, ArtifactStore), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = ArtifactStore::new(dir.path())?;
    let (vectorizer, model) = fitted_pair();
    store.save(&vectorizer, &model)?;
    Ok((dir, store))
}

#[test]
fn test_empty_directory_is_untrained() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = ArtifactStore::new(dir.path())?;

    assert!(!store.is_available());
    assert!(!store.verify()?);
    assert!(store.load()?.is_none());

    let predictor = Predictor::from_store(&store);
    assert_eq!(predictor.mode(), Mode::Untrained);
    assert_eq!(predictor.predict_from_symptoms("nothing to see"), vec![DEFAULT_ADVISORY]);
    Ok(())
}

#[test]
fn test_save_and_reload_predicts_identically() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, store) = saved_store()?;
    let (vectorizer, model) = fitted_pair();
    let in_memory = Predictor::new(Artifacts::new(vectorizer, ClassifierSlot::fitted(model)));

    assert!(store.is_available());
    assert!(store.verify()?);
    let reloaded = Predictor::from_store(&store);
    assert_eq!(reloaded.mode(), Mode::Trained);

    for text in ["fasting glucose 131", "hemoglobin low", "blood pressure 150/95", "xyz"] {
        assert_eq!(reloaded.predict_from_symptoms(text), in_memory.predict_from_symptoms(text));
    }
    Ok(())
}

#[test]
fn test_manifest_describes_saved_pair() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, store) = saved_store()?;
    let manifest = store.read_manifest()?.expect("manifest written on save");
    assert_eq!(manifest.classes, vec!["Anemia", "Diabetes risk", "Hypertension"]);
    assert_eq!(manifest.vectorizer_hash.len(), 64);
    assert_eq!(manifest.model_hash.len(), 64);

    let info = Predictor::from_store(&store).info();
    assert_eq!(info.vocabulary_size, manifest.vocabulary_size);
    assert_eq!(info.class_labels, manifest.classes);
    Ok(())
}

#[test]
fn test_tampered_model_degrades_to_fallback() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, store) = saved_store()?;
    let original = fs::read_to_string(store.model_path())?;
    fs::write(store.model_path(), original.replace("Anemia", "Anaemia"))?;

    assert!(!store.verify()?);
    assert!(matches!(store.load(), Err(ArtifactError::HashMismatch { .. })));

    let predictor = Predictor::from_store(&store);
    assert_eq!(predictor.mode(), Mode::Untrained);
    assert_eq!(
        predictor.predict_from_symptoms("anemia"),
        vec!["Possible anemia indicators present"]
    );
    Ok(())
}

#[test]
fn test_corrupt_files_without_manifest_degrade_to_fallback() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, store) = saved_store()?;
    fs::remove_file(store.manifest_path())?;
    fs::write(store.vectorizer_path(), b"not json")?;

    assert!(matches!(store.load(), Err(ArtifactError::SerdeError(_))));
    assert_eq!(Predictor::from_store(&store).mode(), Mode::Untrained);
    Ok(())
}

#[test]
fn test_missing_manifest_still_loads() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, store) = saved_store()?;
    fs::remove_file(store.manifest_path())?;

    assert!(!store.verify()?);
    assert!(store.load()?.is_some());
    assert_eq!(Predictor::from_store(&store).mode(), Mode::Trained);
    Ok(())
}

#[test]
fn test_partial_artifacts_are_ignored() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, store) = saved_store()?;
    fs::remove_file(store.model_path())?;

    assert!(!store.is_available());
    assert!(store.load()?.is_none());
    assert_eq!(Predictor::from_store(&store).mode(), Mode::Untrained);
    Ok(())
}
