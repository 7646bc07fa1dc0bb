use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::aggregate::{default_overrides, OverrideRule, Prediction, ResultAggregator};
use crate::classifier::{ClassifierBuilder, ClassifierError, DiseaseModel};
use crate::dataset::{DatasetError, TrainingSet, Vocabulary};
use crate::knowledge::{KnowledgeBase, KnowledgeError};
use crate::matcher::{SymptomExtractor, SymptomMatcher, VocabularyScanExtractor};
use crate::triage::TriageLabel;

/// Autocomplete responses are capped at this many entries.
pub const SUGGESTION_LIMIT: usize = 5;

/// Age at which the advisory risk note switches to elevated-risk wording.
pub const ELEVATED_RISK_AGE: u32 = 60;

const ELEVATED_RISK_NOTE: &str = "Risk is higher for elderly patients.";
const NORMAL_RISK_NOTE: &str = "Normal age-related risk.";
const CONSULT_DOCTOR: &str = "General Physician";
const HOME_CARE: &str = "Home Care";

/// Fatal startup failures. The engine never starts serving on a partially
/// loaded knowledge base or an unfit classifier.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("Build error: {0}")]
    Build(String),
}

/// Per-request failures, returned as values across the engine boundary.
///
/// `NoUsableSymptoms` is distinct from a valid prediction whose ranked list
/// came back empty: the former means nothing in the input resolved to a
/// known symptom, the latter means no candidate cleared the confidence
/// floor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    #[error("illness duration must be at least 1 day, got {0}")]
    InvalidDuration(u32),
    #[error("no usable symptoms could be resolved from the input")]
    NoUsableSymptoms,
}

/// One inference request: loosely-specified symptom tokens, optional free
/// text to mine for more symptoms, illness duration in days, patient age.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub free_text: Option<String>,
    pub days: u32,
    #[serde(default)]
    pub age: u32,
}

/// The aggregated inference result. `risk_note` is advisory text derived
/// from age alone and plays no part in the scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub condition: TriageLabel,
    pub risk_note: String,
    pub doctor: String,
    pub symptoms: Vec<String>,
    pub diseases: Vec<Prediction>,
}

/// The process-wide inference context: classifier, vocabulary, and
/// knowledge tables, built once at startup and shared read-only afterwards.
///
/// # Thread Safety
///
/// The engine is `Send + Sync`; all state is immutable after [`build`] and
/// every request allocates its own scratch, so any number of threads may
/// call [`predict`] and [`suggest`] concurrently without locking.
///
/// [`build`]: EngineBuilder::build
/// [`predict`]: Engine::predict
/// [`suggest`]: Engine::suggest
pub struct Engine {
    matcher: SymptomMatcher,
    aggregator: ResultAggregator,
    extractor: Arc<dyn SymptomExtractor>,
    vocabulary: Arc<Vocabulary>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Engine>();
    }
};

impl Engine {
    /// Creates a new EngineBuilder for fluent construction
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Runs the full inference pipeline: resolve symptoms, triage, rank,
    /// enrich.
    ///
    /// # Errors
    /// * [`PredictError::InvalidDuration`] when `days < 1`, rejected before
    ///   any scoring happens
    /// * [`PredictError::NoUsableSymptoms`] when neither the tokens nor the
    ///   free text resolve to a single known symptom; the classifier is
    ///   never consulted in that case
    pub fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, PredictError> {
        if request.days < 1 {
            return Err(PredictError::InvalidDuration(request.days));
        }

        let extracted = request
            .free_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(|text| self.extractor.extract(text))
            .unwrap_or_default();
        let symptoms = self.matcher.resolve(&request.symptoms, &extracted);
        debug!("Resolved symptoms: {:?}", symptoms);
        if symptoms.is_empty() {
            return Err(PredictError::NoUsableSymptoms);
        }

        let (condition, diseases) = self.aggregator.aggregate(&symptoms, request.days);

        let risk_note = if request.age >= ELEVATED_RISK_AGE {
            ELEVATED_RISK_NOTE
        } else {
            NORMAL_RISK_NOTE
        };
        let doctor = match condition {
            TriageLabel::Consult => CONSULT_DOCTOR,
            TriageLabel::Mild => HOME_CARE,
        };

        Ok(PredictResponse {
            condition,
            risk_note: risk_note.to_string(),
            doctor: doctor.to_string(),
            symptoms,
            diseases,
        })
    }

    /// Autocomplete helper: up to [`SUGGESTION_LIMIT`] vocabulary entries
    /// containing the partial token.
    pub fn suggest(&self, partial: &str) -> Vec<String> {
        let mut matches = self.matcher.matches(partial);
        matches.truncate(SUGGESTION_LIMIT);
        matches
    }

    /// The symptom vocabulary the engine was built on.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

/// Returns the data directory the engine loads from by default: the
/// `PROGNOSIS_DATA` environment variable when set, `./data` otherwise.
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = env::var("PROGNOSIS_DATA") {
        return PathBuf::from(path);
    }
    PathBuf::from("data")
}

/// A builder for constructing an [`Engine`] with a fluent interface.
/// All file reads and model fitting happen inside [`build`]; any failure is
/// fatal and nothing partial is returned.
///
/// [`build`]: EngineBuilder::build
#[derive(Default)]
pub struct EngineBuilder {
    training_path: Option<PathBuf>,
    severity_path: Option<PathBuf>,
    description_path: Option<PathBuf>,
    precaution_path: Option<PathBuf>,
    overrides: Option<Vec<OverrideRule>>,
    extractor: Option<Arc<dyn SymptomExtractor>>,
    model: Option<Arc<dyn DiseaseModel>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points every data source at its conventional file name under one
    /// directory: `training.csv`, `symptom_severity.csv`,
    /// `symptom_description.csv`, `symptom_precaution.csv`.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.training_path = Some(dir.join("training.csv"));
        self.severity_path = Some(dir.join("symptom_severity.csv"));
        self.description_path = Some(dir.join("symptom_description.csv"));
        self.precaution_path = Some(dir.join("symptom_precaution.csv"));
        self
    }

    /// Sets the labeled training dataset path individually.
    pub fn with_training_data(mut self, path: impl Into<PathBuf>) -> Self {
        self.training_path = Some(path.into());
        self
    }

    /// Sets the three reference table paths individually.
    pub fn with_knowledge_tables(
        mut self,
        severity: impl Into<PathBuf>,
        descriptions: impl Into<PathBuf>,
        precautions: impl Into<PathBuf>,
    ) -> Self {
        self.severity_path = Some(severity.into());
        self.description_path = Some(descriptions.into());
        self.precaution_path = Some(precautions.into());
        self
    }

    /// Replaces the shipped override rule table.
    pub fn with_overrides(mut self, overrides: Vec<OverrideRule>) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Plugs in an external free-text symptom extractor. Defaults to the
    /// conservative [`VocabularyScanExtractor`].
    pub fn with_extractor(mut self, extractor: Arc<dyn SymptomExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Replaces the trained classifier with an arbitrary [`DiseaseModel`].
    /// The training data is still read for its vocabulary, but no forest is
    /// fit. Intended for tests and for callers that bring a pre-built model.
    pub fn with_model(mut self, model: Arc<dyn DiseaseModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Loads every data source, fits the classifier, and assembles the
    /// engine. There is no degraded mode: any load or fit failure aborts
    /// construction.
    pub fn build(self) -> Result<Engine, EngineError> {
        let training_path = self
            .training_path
            .ok_or_else(|| EngineError::Build("Training data path must be set".to_string()))?;
        let severity_path = self
            .severity_path
            .ok_or_else(|| EngineError::Build("Severity table path must be set".to_string()))?;
        let description_path = self
            .description_path
            .ok_or_else(|| EngineError::Build("Description table path must be set".to_string()))?;
        let precaution_path = self
            .precaution_path
            .ok_or_else(|| EngineError::Build("Precaution table path must be set".to_string()))?;

        let knowledge = Arc::new(KnowledgeBase::load(
            &severity_path,
            &description_path,
            &precaution_path,
        )?);

        let (model, vocabulary): (Arc<dyn DiseaseModel>, Arc<Vocabulary>) = match self.model {
            Some(model) => {
                let set = TrainingSet::load(&training_path)?;
                (model, Arc::new(set.vocabulary))
            }
            None => {
                let classifier = ClassifierBuilder::new()
                    .with_training_data(training_path)
                    .build()?;
                let vocabulary = classifier.vocabulary();
                (Arc::new(classifier), vocabulary)
            }
        };
        info!(
            "Engine ready: {} symptoms in vocabulary",
            vocabulary.len()
        );

        let extractor = self
            .extractor
            .unwrap_or_else(|| Arc::new(VocabularyScanExtractor::new(Arc::clone(&vocabulary))));
        let aggregator = ResultAggregator::new(
            model,
            knowledge,
            self.overrides.unwrap_or_else(default_overrides),
        );

        Ok(Engine {
            matcher: SymptomMatcher::new(Arc::clone(&vocabulary)),
            aggregator,
            extractor,
            vocabulary,
        })
    }
}
