use std::path::{Path, PathBuf};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prognosis::{Engine, PredictRequest};

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn setup_benchmark_engine() -> Engine {
    Engine::builder()
        .with_data_dir(fixture_dir())
        .build()
        .unwrap()
}

fn bench_startup(c: &mut Criterion) {
    let mut group = c.benchmark_group("Startup");
    group.sample_size(20);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("build_engine", |b| b.iter(|| setup_benchmark_engine()));

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let engine = setup_benchmark_engine();
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let token_request = PredictRequest {
        symptoms: vec!["itching".to_string(), "skin_rash".to_string()],
        free_text: None,
        days: 3,
        age: 30,
    };
    group.bench_function("tokens_only", |b| {
        b.iter(|| engine.predict(black_box(&token_request)).unwrap())
    });

    let fuzzy_request = PredictRequest {
        symptoms: vec!["cugh".to_string(), "fever".to_string()],
        free_text: None,
        days: 5,
        age: 30,
    };
    group.bench_function("fuzzy_tokens", |b| {
        b.iter(|| engine.predict(black_box(&fuzzy_request)).unwrap())
    });

    let text_request = PredictRequest {
        symptoms: vec![],
        free_text: Some(
            "persistent mild fever with a headache and some fatigue since last week".to_string(),
        ),
        days: 7,
        age: 64,
    };
    group.bench_function("free_text", |b| {
        b.iter(|| engine.predict(black_box(&text_request)).unwrap())
    });

    group.finish();
}

fn bench_suggest(c: &mut Criterion) {
    let engine = setup_benchmark_engine();
    let mut group = c.benchmark_group("Suggest");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for partial in ["i", "fev", "stomach"] {
        group.bench_function(format!("partial_{}", partial), |b| {
            b.iter(|| engine.suggest(black_box(partial)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_startup, bench_prediction, bench_suggest);
criterion_main!(benches);
