pub mod builder;
mod classifier;
mod error;
mod forest;

pub use builder::ClassifierBuilder;
pub use classifier::{DiseaseClassifier, DiseaseModel, TOP_CANDIDATES};
pub use error::ClassifierError;
pub use forest::ForestParams;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Number of diseases the classifier is trained on
    pub num_classes: usize,
    /// Names of the diseases, in label-code order
    pub class_labels: Vec<String>,
    /// Size of the symptom vocabulary
    pub vocabulary_size: usize,
}
