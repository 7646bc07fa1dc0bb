use std::path::PathBuf;
use std::sync::Arc;

use log::info;

use crate::dataset::TrainingSet;

use super::classifier::DiseaseClassifier;
use super::error::ClassifierError;
use super::forest::{ForestParams, RandomForest};

/// A builder for constructing a DiseaseClassifier with a fluent interface.
///
/// Loading, preparation, and fitting all happen inside [`build`]; any schema
/// or fitting problem surfaces as a [`ClassifierError`] and nothing partial
/// is ever returned.
///
/// [`build`]: ClassifierBuilder::build
#[derive(Debug, Default)]
pub struct ClassifierBuilder {
    training_path: Option<PathBuf>,
    params: ForestParams,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self {
            training_path: None,
            params: ForestParams::default(),
        }
    }

    /// Sets the labeled symptom dataset the forest is fit on.
    pub fn with_training_data(mut self, path: impl Into<PathBuf>) -> Self {
        self.training_path = Some(path.into());
        self
    }

    /// Overrides the number of trees in the ensemble.
    ///
    /// # Example
    /// ```
    /// use prognosis::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new().with_trees(50).unwrap();
    /// ```
    pub fn with_trees(mut self, trees: usize) -> Result<Self, ClassifierError> {
        if trees == 0 {
            return Err(ClassifierError::BuildError(
                "Ensemble needs at least one tree".to_string(),
            ));
        }
        self.params.trees = trees;
        Ok(self)
    }

    /// Overrides the depth cap of every tree.
    pub fn with_max_depth(mut self, max_depth: usize) -> Result<Self, ClassifierError> {
        if max_depth == 0 {
            return Err(ClassifierError::BuildError(
                "Tree depth cap must be at least 1".to_string(),
            ));
        }
        self.params.max_depth = max_depth;
        Ok(self)
    }

    /// Overrides the fitting seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    /// Loads the training data and fits the forest.
    pub fn build(self) -> Result<DiseaseClassifier, ClassifierError> {
        let path = self.training_path.clone().ok_or_else(|| {
            ClassifierError::BuildError("Training data path must be set".to_string())
        })?;
        let set = TrainingSet::load(&path)?;
        self.build_from(set)
    }

    /// Fits the forest on an already prepared training set.
    pub fn build_from(self, set: TrainingSet) -> Result<DiseaseClassifier, ClassifierError> {
        let n_classes = set.encoder.num_classes();
        info!(
            "Fitting forest: {} trees, depth cap {}, {} train rows, {} classes",
            self.params.trees,
            self.params.max_depth,
            set.x_train.nrows(),
            n_classes
        );
        let forest = RandomForest::fit(&set.x_train, &set.y_train, n_classes, &self.params);

        if set.x_test.nrows() > 0 {
            let correct = set
                .x_test
                .outer_iter()
                .zip(set.y_test.iter())
                .filter(|(row, &label)| forest.predict(&row.to_vec()) == label)
                .count();
            info!(
                "Hold-out accuracy: {}/{} ({:.1}%)",
                correct,
                set.x_test.nrows(),
                correct as f64 * 100.0 / set.x_test.nrows() as f64
            );
        }

        Ok(DiseaseClassifier::new(
            forest,
            Arc::new(set.encoder),
            Arc::new(set.vocabulary),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_training_data_fails() {
        let result = ClassifierBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_missing_file_is_a_data_error() {
        let result = ClassifierBuilder::new()
            .with_training_data("/nonexistent/training.csv")
            .build();
        assert!(matches!(result, Err(ClassifierError::DataError(_))));
    }

    #[test]
    fn test_zero_trees_rejected() {
        assert!(ClassifierBuilder::new().with_trees(0).is_err());
        assert!(ClassifierBuilder::new().with_max_depth(0).is_err());
    }
}
