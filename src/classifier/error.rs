use std::fmt;

use crate::dataset::DatasetError;

/// Represents the different types of errors that can occur while building or
/// using the disease classifier.
#[derive(Debug)]
pub enum ClassifierError {
    /// Error occurred while loading or preparing the training data
    DataError(String),
    /// Error occurred during the build phase
    BuildError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataError(msg) => write!(f, "Data error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<DatasetError> for ClassifierError {
    fn from(err: DatasetError) -> Self {
        ClassifierError::DataError(err.to_string())
    }
}
