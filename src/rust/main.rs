use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use medscan::training::{train_from_csv, TrainingConfig};
use medscan::{ArtifactStore, Predictor};
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding vectorizer.json, model.json and manifest.json
    #[arg(short, long, global = true)]
    artifacts: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit the vectorizer and classifier from a `text,label` CSV file
    Train {
        csv: PathBuf,
        /// Share of rows held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,
        /// Seed for the train/test shuffle
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Predict insights for report text plus optional key terms
    Predict {
        text: String,
        #[arg(short, long = "term")]
        terms: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Check a free-text symptom description
    Symptoms {
        text: String,
        #[arg(long)]
        json: bool,
    },
    /// Summarize a plain-text report file and predict insights for it
    Analyze {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show the state of the loaded artifacts
    Info,
}

fn open_store(dir: Option<PathBuf>) -> Result<ArtifactStore> {
    let store = match dir {
        Some(dir) => ArtifactStore::new(&dir),
        None => ArtifactStore::new_default(),
    };
    store.context("Failed to open artifact directory")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("  - {}", line);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let store = open_store(args.artifacts)?;

    match args.command {
        Command::Train {
            csv,
            test_fraction,
            seed,
        } => {
            let start_time = Instant::now();
            let config = TrainingConfig {
                test_fraction,
                seed,
                ..TrainingConfig::default()
            };
            let outcome = train_from_csv(&csv, &store, &config)
                .with_context(|| format!("Training from {:?} failed", csv))?;
            info!("=== Training complete (took {:.2?}) ===", start_time.elapsed());
            println!("Evaluation report:\n{}", outcome.report);
            println!("Artifacts written to {:?}", store.artifacts_dir());
        }
        Command::Predict { text, terms, json } => {
            let predictor = Predictor::from_store(&store);
            let insights = predictor.predict(&text, &terms);
            if json {
                print_json(&insights)?;
            } else {
                println!("Insights ({} mode):", predictor.mode());
                print_lines(&insights);
            }
        }
        Command::Symptoms { text, json } => {
            let predictor = Predictor::from_store(&store);
            let check = predictor.check_symptoms(&text);
            if json {
                print_json(&check)?;
            } else if let Some(message) = &check.message {
                println!("{}", message);
            } else {
                println!("Possible conditions ({} mode):", predictor.mode());
                print_lines(&check.possible_conditions);
            }
        }
        Command::Analyze { file, json } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read report {:?}", file))?;
            let predictor = Predictor::from_store(&store);
            let analysis = predictor.analyze_report(&text);
            if json {
                print_json(&analysis)?;
            } else {
                println!("Summary: {}", analysis.summary);
                println!("Key terms: {}", analysis.key_terms.join(", "));
                println!("Insights ({} mode):", predictor.mode());
                print_lines(&analysis.insights);
            }
        }
        Command::Info => {
            let verified = store.verify().unwrap_or(false);
            let predictor = Predictor::from_store(&store);
            let info = predictor.info();
            println!("Artifacts directory: {:?}", store.artifacts_dir());
            println!("Manifest verified: {}", verified);
            println!("Mode: {}", info.mode);
            println!("Vocabulary size: {}", info.vocabulary_size);
            println!("Classes ({}): {}", info.num_classes, info.class_labels.join(", "));
        }
    }

    Ok(())
}
