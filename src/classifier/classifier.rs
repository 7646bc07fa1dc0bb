use std::cmp::Ordering;
use std::sync::Arc;

use crate::dataset::{LabelEncoder, Vocabulary};

use super::forest::RandomForest;

/// How many candidate diseases a ranking returns.
pub const TOP_CANDIDATES: usize = 3;

/// The inference seam between the aggregation pipeline and the statistical
/// model. Implemented by [`DiseaseClassifier`]; tests substitute mocks to
/// observe exactly when the model is consulted.
pub trait DiseaseModel: Send + Sync {
    /// Ranks candidate diseases for a resolved symptom set. Returns up to
    /// [`TOP_CANDIDATES`] `(disease name, probability)` pairs, most probable
    /// first. Callers guarantee the symptom set is non-empty.
    fn rank(&self, symptoms: &[String]) -> Vec<(String, f64)>;
}

/// A disease classifier backed by a random forest fit once at startup.
///
/// # Thread Safety
///
/// This type is `Send + Sync` because all of its fields are immutable after
/// construction; any number of threads may call [`DiseaseModel::rank`]
/// concurrently. Each call allocates its own symptom-presence vector.
#[derive(Debug)]
pub struct DiseaseClassifier {
    forest: RandomForest,
    encoder: Arc<LabelEncoder>,
    vocabulary: Arc<Vocabulary>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<DiseaseClassifier>();
    }
};

impl DiseaseClassifier {
    pub(crate) fn new(
        forest: RandomForest,
        encoder: Arc<LabelEncoder>,
        vocabulary: Arc<Vocabulary>,
    ) -> Self {
        Self {
            forest,
            encoder,
            vocabulary,
        }
    }

    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            num_classes: self.encoder.num_classes(),
            class_labels: self.encoder.class_names().to_vec(),
            vocabulary_size: self.vocabulary.len(),
        }
    }

    /// The symptom vocabulary the classifier was fit on.
    pub fn vocabulary(&self) -> Arc<Vocabulary> {
        Arc::clone(&self.vocabulary)
    }

    /// The frozen label encoder.
    pub fn encoder(&self) -> Arc<LabelEncoder> {
        Arc::clone(&self.encoder)
    }

    /// Builds a fresh symptom-presence vector in vocabulary slot order.
    /// Symptoms outside the vocabulary cannot be scored and are ignored.
    fn encode(&self, symptoms: &[String]) -> Vec<u8> {
        let mut vector = vec![0u8; self.vocabulary.len()];
        for symptom in symptoms {
            if let Some(slot) = self.vocabulary.index_of(symptom) {
                vector[slot] = 1;
            }
        }
        vector
    }
}

impl DiseaseModel for DiseaseClassifier {
    fn rank(&self, symptoms: &[String]) -> Vec<(String, f64)> {
        let features = self.encode(symptoms);
        let probs = self.forest.predict_proba(&features);

        let mut ranked: Vec<(String, f64)> = probs
            .into_iter()
            .enumerate()
            .filter_map(|(code, p)| {
                self.encoder
                    .decode(code)
                    .map(|name| (name.to_string(), p))
            })
            .collect();
        // Probability descending; equal probabilities break ties on disease
        // name so repeated calls rank identically.
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(TOP_CANDIDATES);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::builder::ClassifierBuilder;
    use crate::dataset::TrainingSet;
    use std::io::Cursor;

    fn fixture_csv() -> String {
        let mut out = String::from("itching,skin_rash,cough,headache,prognosis\n");
        for _ in 0..6 {
            out.push_str("1,1,0,0,Fungal infection\n");
            out.push_str("1,0,0,0,Fungal infection\n");
            out.push_str("0,0,1,1,Common Cold\n");
            out.push_str("0,0,1,0,Common Cold\n");
            out.push_str("0,1,0,1,Drug Reaction\n");
            out.push_str("0,1,1,1,Drug Reaction\n");
        }
        out
    }

    fn fixture_classifier() -> DiseaseClassifier {
        let set = TrainingSet::from_reader(Cursor::new(fixture_csv()), "inline").unwrap();
        ClassifierBuilder::new().build_from(set).unwrap()
    }

    #[test]
    fn test_rank_returns_at_most_three() {
        let classifier = fixture_classifier();
        let ranked = classifier.rank(&["itching".to_string()]);
        assert!(ranked.len() <= TOP_CANDIDATES);
        assert!(!ranked.is_empty());
    }

    #[test]
    fn test_rank_is_sorted_descending() {
        let classifier = fixture_classifier();
        let ranked = classifier.rank(&["cough".to_string(), "headache".to_string()]);
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_rank_is_deterministic() {
        let a = fixture_classifier();
        let b = fixture_classifier();
        let symptoms = vec!["skin_rash".to_string(), "headache".to_string()];
        assert_eq!(a.rank(&symptoms), b.rank(&symptoms));
    }

    #[test]
    fn test_unknown_symptoms_are_ignored_in_encoding() {
        let classifier = fixture_classifier();
        let with_noise = classifier.rank(&[
            "itching".to_string(),
            "no_such_symptom".to_string(),
        ]);
        let without = classifier.rank(&["itching".to_string()]);
        assert_eq!(with_noise, without);
    }

    #[test]
    fn test_info_reports_frozen_shapes() {
        let classifier = fixture_classifier();
        let info = classifier.info();
        assert_eq!(info.num_classes, 3);
        assert_eq!(info.vocabulary_size, 4);
        assert!(info.class_labels.contains(&"Common Cold".to_string()));
    }
}
