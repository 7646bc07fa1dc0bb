//! A thread-safe symptom-to-diagnosis inference library: dataset-driven
//! model training at startup, fuzzy symptom matching, severity-weighted
//! triage scoring, and rule-aware probabilistic disease ranking.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use prognosis::{Engine, PredictRequest};
//!
//! let engine = Engine::builder()
//!     .with_data_dir("data")
//!     .build()?;
//!
//! let response = engine.predict(&PredictRequest {
//!     symptoms: vec!["itching".to_string(), "skin rash".to_string()],
//!     free_text: Some("also a mild fever since yesterday".to_string()),
//!     days: 3,
//!     age: 34,
//! })?;
//!
//! println!("Condition: {}", response.condition);
//! for prediction in &response.diseases {
//!     println!("{}: {:.2}%", prediction.disease, prediction.confidence);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The engine is built once and is immutable afterwards; share it across
//! threads with `Arc`:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use prognosis::{Engine, PredictRequest};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let engine = Arc::new(Engine::builder().with_data_dir("data").build()?);
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let engine = Arc::clone(&engine);
//!     handles.push(thread::spawn(move || {
//!         let request = PredictRequest {
//!             symptoms: vec!["cough".to_string()],
//!             days: 2,
//!             ..Default::default()
//!         };
//!         engine.predict(&request).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod classifier;
pub mod dataset;
pub mod engine;
pub mod knowledge;
pub mod matcher;
pub mod triage;

pub use aggregate::{default_overrides, OverrideRule, Prediction, ResultAggregator, CONFIDENCE_FLOOR};
pub use classifier::{
    ClassifierBuilder, ClassifierError, ClassifierInfo, DiseaseClassifier, DiseaseModel,
    ForestParams, TOP_CANDIDATES,
};
pub use dataset::{DatasetError, LabelEncoder, TrainingSet, Vocabulary};
pub use engine::{
    default_data_dir, Engine, EngineBuilder, EngineError, PredictError, PredictRequest,
    PredictResponse, SUGGESTION_LIMIT,
};
pub use knowledge::{KnowledgeBase, KnowledgeError, DESCRIPTION_FALLBACK};
pub use matcher::{SymptomExtractor, SymptomMatcher, VocabularyScanExtractor};
pub use triage::{TriageEvaluator, TriageLabel, CONSULT_THRESHOLD};

pub fn init_logger() {
    env_logger::init();
}
