use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::classifier::DiseaseModel;
use crate::knowledge::KnowledgeBase;
use crate::triage::{TriageEvaluator, TriageLabel};

/// Candidates at or below this probability are dropped from the final
/// ranking.
pub const CONFIDENCE_FLOOR: f64 = 0.05;

/// One ranked, knowledge-base-enriched candidate condition. Confidence is a
/// percentage rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub disease: String,
    pub confidence: f64,
    pub description: String,
    pub precautions: Vec<String>,
}

/// A fixed rule that injects a named result ahead of statistical
/// predictions. Fires when every required symptom is present, regardless of
/// what else was reported.
#[derive(Debug, Clone)]
pub struct OverrideRule {
    required: Vec<String>,
    disease: String,
    confidence: f64,
}

impl OverrideRule {
    pub fn new(
        required: impl IntoIterator<Item = impl Into<String>>,
        disease: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            disease: disease.into(),
            confidence,
        }
    }

    fn applies(&self, symptoms: &[String]) -> bool {
        self.required
            .iter()
            .all(|required| symptoms.iter().any(|s| s == required))
    }
}

/// The rule table the crate ships with: explicit domain rules win over
/// statistical inference.
pub fn default_overrides() -> Vec<OverrideRule> {
    vec![OverrideRule::new(
        ["mild_fever", "headache"],
        "Viral Fever",
        0.8,
    )]
}

/// Combines the triage evaluation, the override table, and the classifier
/// ranking into the final enriched result list.
pub struct ResultAggregator {
    model: Arc<dyn DiseaseModel>,
    knowledge: Arc<KnowledgeBase>,
    triage: TriageEvaluator,
    overrides: Vec<OverrideRule>,
}

impl ResultAggregator {
    pub fn new(
        model: Arc<dyn DiseaseModel>,
        knowledge: Arc<KnowledgeBase>,
        overrides: Vec<OverrideRule>,
    ) -> Self {
        let triage = TriageEvaluator::new(Arc::clone(&knowledge));
        Self {
            model,
            knowledge,
            triage,
            overrides,
        }
    }

    /// Produces the triage label and the ranked prediction list for a
    /// resolved, non-empty symptom set. Override hits rank ahead of every
    /// classifier candidate; entries at or below [`CONFIDENCE_FLOOR`] are
    /// dropped; survivors are enriched from the knowledge base.
    ///
    /// Inputs are validated at the engine boundary: symptoms non-empty,
    /// `days >= 1`.
    pub fn aggregate(&self, symptoms: &[String], days: u32) -> (TriageLabel, Vec<Prediction>) {
        let label = self.triage.evaluate(symptoms, days);

        let mut candidates: Vec<(String, f64)> = self
            .overrides
            .iter()
            .filter(|rule| rule.applies(symptoms))
            .map(|rule| (rule.disease.clone(), rule.confidence))
            .collect();
        if !candidates.is_empty() {
            debug!("Override rules fired: {:?}", candidates);
        }
        candidates.extend(self.model.rank(symptoms));

        let predictions = candidates
            .into_iter()
            .filter(|(_, confidence)| *confidence > CONFIDENCE_FLOOR)
            .map(|(disease, confidence)| Prediction {
                confidence: to_percent(confidence),
                description: self.knowledge.description_of(&disease).to_string(),
                precautions: self.knowledge.precautions_of(&disease).to_vec(),
                disease,
            })
            .collect();

        (label, predictions)
    }
}

fn to_percent(confidence: f64) -> f64 {
    (confidence * 100.0 * 100.0).round() / 100.0
}
