use criterion::{black_box, criterion_group, criterion_main, Criterion};
use medscan::{interpret, Artifacts, ClassDefinition, ClassifierBuilder, ClassifierSlot, Predictor};

const REPORT: &str = "Complete blood count and metabolic panel. Hemoglobin 10.2 g/dL, below \
     reference range. Fasting glucose 131 mg/dL with HbA1c 6.9 percent. Total cholesterol \
     240 mg/dL, LDL 165 mg/dL. Blood pressure recorded at 150/95. Patient reports ongoing \
     fatigue and reduced exercise tolerance over the past three months.";

fn setup_trained_predictor() -> Predictor {
    let (vectorizer, model) = ClassifierBuilder::new()
        .add_class(ClassDefinition::new("Diabetes risk").with_examples(vec![
            "fasting glucose elevated",
            "insulin resistance with high glucose",
            "hba1c above target",
        ]))
        .unwrap()
        .add_class(ClassDefinition::new("Anemia").with_examples(vec![
            "low hemoglobin",
            "iron deficiency anemia",
            "low ferritin and fatigue",
        ]))
        .unwrap()
        .add_class(ClassDefinition::new("Hyperlipidemia").with_examples(vec![
            "ldl cholesterol high",
            "triglycerides elevated",
        ]))
        .unwrap()
        .build()
        .unwrap();
    Predictor::new(Artifacts::new(vectorizer, ClassifierSlot::fitted(model)))
}

fn bench_interpretation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Interpretation");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("report", |b| b.iter(|| interpret(black_box(REPORT))));

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let predictors = vec![
        ("trained", setup_trained_predictor()),
        ("untrained", Predictor::untrained()),
    ];

    for (name, predictor) in &predictors {
        group.bench_function(format!("symptoms_{}", name), |b| {
            b.iter(|| predictor.predict_from_symptoms(black_box("high glucose and constant fatigue")))
        });
        group.bench_function(format!("analyze_{}", name), |b| {
            b.iter(|| predictor.analyze_report(black_box(REPORT)))
        });
    }

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Scaling");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    // Prediction cost against number of classes
    let class_counts = [2, 5, 10, 20, 50];
    for &count in &class_counts {
        let mut builder = ClassifierBuilder::new();
        for i in 0..count {
            builder = builder
                .add_class(ClassDefinition::new(format!("class_{}", i)).with_examples(vec![
                    format!("marker{} elevated", i),
                    format!("marker{} reduced range", i),
                    format!("finding{} noted", i),
                ]))
                .unwrap();
        }

        let (vectorizer, model) = builder.build().unwrap();
        let predictor = Predictor::new(Artifacts::new(vectorizer, ClassifierSlot::fitted(model)));

        group.bench_function(format!("classes_{}", count), |b| {
            b.iter(|| predictor.predict_from_symptoms(black_box("marker3 elevated finding7")))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_interpretation, bench_prediction, bench_scaling);
criterion_main!(benches);
