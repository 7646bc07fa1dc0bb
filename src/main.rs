use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::info;
use prognosis::{default_data_dir, Engine, PredictRequest};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding training.csv and the reference tables
    /// (defaults to $PROGNOSIS_DATA, then ./data)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Symptom as reported, repeatable (typos and partial names are fine)
    #[arg(short, long = "symptom")]
    symptoms: Vec<String>,

    /// Free-text complaint to mine for additional symptoms
    #[arg(short, long)]
    text: Option<String>,

    /// How many days the symptoms have persisted
    #[arg(long, default_value_t = 1)]
    days: u32,

    /// Patient age in years
    #[arg(long, default_value_t = 30)]
    age: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);
    info!("=== Starting Prognosis Demo ===");
    info!("Loading data from {:?}", data_dir);

    let start_time = Instant::now();
    let engine = Engine::builder()
        .with_data_dir(&data_dir)
        .build()
        .with_context(|| format!("failed to build engine from {:?}", data_dir))?;
    info!("=== Engine Built Successfully (took {:.2?}) ===", start_time.elapsed());

    let requests = if args.symptoms.is_empty() && args.text.is_none() {
        info!("No symptoms given - running the demo battery");
        demo_requests()
    } else {
        vec![PredictRequest {
            symptoms: args.symptoms,
            free_text: args.text,
            days: args.days,
            age: args.age,
        }]
    };

    let predict_start = Instant::now();
    for (i, request) in requests.iter().enumerate() {
        info!("Request {}/{}: {:?}", i + 1, requests.len(), request.symptoms);
        process_request(&engine, request);
    }
    info!("=== Demo Complete ===");
    info!("Total time: {:.2?}", start_time.elapsed());
    info!("Prediction time: {:.2?}", predict_start.elapsed());

    Ok(())
}

fn process_request(engine: &Engine, request: &PredictRequest) {
    match engine.predict(request) {
        Ok(response) => {
            println!("\nResults:");
            println!("  Understood symptoms: {}", response.symptoms.join(", "));
            println!("  Condition: {} ({})", response.condition, response.doctor);
            println!("  Note: {}", response.risk_note);
            if response.diseases.is_empty() {
                println!("  No condition cleared the confidence floor.");
            }
            for prediction in &response.diseases {
                println!(
                    "    {}: {:.2}% - {}",
                    prediction.disease, prediction.confidence, prediction.description
                );
                for step in &prediction.precautions {
                    println!("      - {}", step);
                }
            }
        }
        Err(e) => {
            eprintln!("\nCould not predict: {}", e);
            if let Some(first) = request.symptoms.first() {
                let suggestions = engine.suggest(first);
                if !suggestions.is_empty() {
                    eprintln!("Did you mean one of: {}?", suggestions.join(", "));
                }
            }
        }
    }
}

fn demo_requests() -> Vec<PredictRequest> {
    vec![
        PredictRequest {
            symptoms: vec!["itching".into(), "skin rash".into()],
            free_text: None,
            days: 3,
            age: 30,
        },
        PredictRequest {
            symptoms: vec!["mild fever".into(), "headache".into()],
            free_text: None,
            days: 6,
            age: 72,
        },
        // Typos resolve through substring matching
        PredictRequest {
            symptoms: vec!["cugh".into()],
            free_text: Some("shivering and fatigue since last week".into()),
            days: 7,
            age: 45,
        },
    ]
}
