use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::knowledge::KnowledgeBase;

/// Triage score above which a case warrants professional consultation.
pub const CONSULT_THRESHOLD: f64 = 13.0;

/// Coarse urgency classification of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageLabel {
    /// Seek professional consultation.
    Consult,
    /// Manageable at home.
    Mild,
}

impl fmt::Display for TriageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consult => write!(f, "consult"),
            Self::Mild => write!(f, "mild"),
        }
    }
}

/// Converts a symptom set plus a self-reported illness duration into a
/// severity score and a binary triage label. Pure and side-effect-free;
/// `days` is validated (>= 1) at the engine boundary before scoring.
pub struct TriageEvaluator {
    knowledge: Arc<KnowledgeBase>,
}

impl TriageEvaluator {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    /// Severity-weighted, duration-scaled triage score:
    /// `severity_sum * days / (|symptoms| + 1)`.
    ///
    /// Symptoms without a severity entry weigh 0. The `+ 1` in the
    /// denominator keeps small symptom sets from dominating and makes the
    /// expression total for the empty set.
    pub fn score(&self, symptoms: &[String], days: u32) -> f64 {
        let severity_sum: u32 = symptoms
            .iter()
            .map(|symptom| self.knowledge.severity_of(symptom))
            .sum();
        f64::from(severity_sum) * f64::from(days) / (symptoms.len() + 1) as f64
    }

    /// Scores the case and applies the [`CONSULT_THRESHOLD`] cutoff.
    pub fn evaluate(&self, symptoms: &[String], days: u32) -> TriageLabel {
        if self.score(symptoms, days) > CONSULT_THRESHOLD {
            TriageLabel::Consult
        } else {
            TriageLabel::Mild
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn evaluator() -> TriageEvaluator {
        let severity = "\
itching,1
skin_rash,3
mild_fever,5
headache,3
high_fever,7
";
        TriageEvaluator::new(Arc::new(
            KnowledgeBase::from_readers(Cursor::new(severity), Cursor::new(""), Cursor::new(""))
                .unwrap(),
        ))
    }

    fn symptoms(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_scenario_arithmetic() {
        // severity(itching)=1, severity(skin_rash)=3, days=3:
        // (1 + 3) * 3 / (2 + 1) = 4.0, under the threshold.
        let eval = evaluator();
        let set = symptoms(&["itching", "skin_rash"]);
        assert_eq!(eval.score(&set, 3), 4.0);
        assert_eq!(eval.evaluate(&set, 3), TriageLabel::Mild);
    }

    #[test]
    fn test_threshold_is_strictly_greater_than() {
        let eval = evaluator();
        // (5 + 3) * 6 / 3 = 16 > 13 -> consult.
        let set = symptoms(&["mild_fever", "headache"]);
        assert_eq!(eval.evaluate(&set, 6), TriageLabel::Consult);
        // (5 + 3) * 3 / 3 = 8 -> mild.
        assert_eq!(eval.evaluate(&set, 3), TriageLabel::Mild);
        // A score of exactly 13 stays mild:
        // (7 + 5 + 1) * 4 / (3 + 1) = 13.
        let boundary = symptoms(&["high_fever", "mild_fever", "itching"]);
        assert_eq!(eval.score(&boundary, 4), 13.0);
        assert_eq!(eval.evaluate(&boundary, 4), TriageLabel::Mild);
    }

    #[test]
    fn test_score_monotonic_in_days() {
        let eval = evaluator();
        let set = symptoms(&["mild_fever", "headache"]);
        let mut previous = 0.0;
        for days in 1..10 {
            let score = eval.score(&set, days);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_score_shrinks_as_zero_weight_symptoms_pad_the_set() {
        // Severity sum held constant while |symptoms| grows: the denominator
        // dominates and the score must not increase.
        let eval = evaluator();
        let small = symptoms(&["high_fever"]);
        let padded = symptoms(&["high_fever", "unlisted_a", "unlisted_b"]);
        assert!(eval.score(&padded, 4) <= eval.score(&small, 4));
    }

    #[test]
    fn test_unknown_symptoms_weigh_zero() {
        let eval = evaluator();
        assert_eq!(eval.score(&symptoms(&["unlisted"]), 5), 0.0);
        assert_eq!(eval.evaluate(&symptoms(&["unlisted"]), 5), TriageLabel::Mild);
    }
}
