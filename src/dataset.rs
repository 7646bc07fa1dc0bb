use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Per-cell flip probability of the robustness noise XORed into the feature
/// matrix during preparation. Deliberate augmentation against slightly
/// inaccurate symptom reports, not an ingestion artifact.
pub const NOISE_FLIP_PROBABILITY: f64 = 0.08;

/// Seed for the noise RNG. Fixed so runs are bit-for-bit reproducible.
pub const NOISE_SEED: u64 = 42;

/// Seed for the train/test partition shuffle.
pub const SPLIT_SEED: u64 = 0;

/// Fraction of each class held out for validation.
pub const TEST_FRACTION: f64 = 0.25;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("training data is empty")]
    Empty,
    #[error("training data needs at least one symptom column and a label column")]
    MissingLabelColumn,
    #[error("non-binary feature value '{value}' in data row {row}, column '{column}'")]
    NonBinaryFeature {
        row: usize,
        column: String,
        value: String,
    },
    #[error("label column holds the single class '{0}'; a stratified split needs at least two")]
    SingleClass(String),
    #[error("class '{0}' has fewer than 2 rows after deduplication; cannot stratify")]
    UnderrepresentedClass(String),
}

/// The closed symptom vocabulary, one entry per feature column of the
/// training data, in column order. Column order doubles as the slot order of
/// every symptom-presence vector fed to the classifier.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from entries in slot order.
    pub fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, index }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries in slot order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Slot index of a symptom, if it belongs to the vocabulary.
    pub fn index_of(&self, symptom: &str) -> Option<usize> {
        self.index.get(symptom).copied()
    }

    pub fn contains(&self, symptom: &str) -> bool {
        self.index.contains_key(symptom)
    }
}

/// Disease name <-> dense integer code mapping, frozen at fit time.
///
/// Codes are assigned over the lexicographically sorted unique label names,
/// so the mapping is independent of row order in the training file.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    names: Vec<String>,
    codes: HashMap<String, usize>,
}

impl LabelEncoder {
    fn fit(labels: &[String]) -> Self {
        let mut names: Vec<String> = labels
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        names.sort();
        let codes = names
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code))
            .collect();
        Self { names, codes }
    }

    pub fn encode(&self, name: &str) -> Option<usize> {
        self.codes.get(name).copied()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn num_classes(&self) -> usize {
        self.names.len()
    }

    /// Class names in code order.
    pub fn class_names(&self) -> &[String] {
        &self.names
    }
}

/// The fully prepared training set: deduplicated, noise-augmented, encoded,
/// and stratified into train/test partitions.
#[derive(Debug)]
pub struct TrainingSet {
    pub x_train: Array2<u8>,
    pub y_train: Array1<usize>,
    pub x_test: Array2<u8>,
    pub y_test: Array1<usize>,
    pub encoder: LabelEncoder,
    pub vocabulary: Vocabulary,
}

impl TrainingSet {
    /// Loads and prepares the labeled symptom dataset.
    ///
    /// The file must carry a header row; every column but the last is a
    /// binary symptom feature named by the vocabulary, the last column is
    /// the disease label. Preparation steps, in order:
    ///
    /// 1. Drop duplicate rows by exact feature match (first occurrence wins).
    /// 2. XOR Bernoulli([`NOISE_FLIP_PROBABILITY`]) noise into every feature
    ///    cell, row-major, seeded with [`NOISE_SEED`].
    /// 3. Encode labels to dense integer codes.
    /// 4. Stratified split, [`TEST_FRACTION`] of each class held out, seeded
    ///    with [`SPLIT_SEED`].
    ///
    /// Any schema problem is a fatal error; there is no degraded mode.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: origin.clone(),
            source,
        })?;
        Self::from_reader(file, &origin)
    }

    pub(crate) fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self, DatasetError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv
            .headers()
            .map_err(|source| DatasetError::Csv {
                path: origin.to_string(),
                source,
            })?
            .clone();
        if headers.len() < 2 {
            return Err(DatasetError::MissingLabelColumn);
        }
        let width = headers.len() - 1;
        let vocabulary = Vocabulary::new(
            headers
                .iter()
                .take(width)
                .map(|name| name.trim().to_string())
                .collect(),
        );

        let mut rows: Vec<(Vec<u8>, String)> = Vec::new();
        for (row_number, record) in csv.into_records().enumerate() {
            let record = record.map_err(|source| DatasetError::Csv {
                path: origin.to_string(),
                source,
            })?;
            let mut features = Vec::with_capacity(width);
            for (column, cell) in record.iter().take(width).enumerate() {
                let value = match cell.trim() {
                    "0" => 0,
                    "1" => 1,
                    other => {
                        return Err(DatasetError::NonBinaryFeature {
                            row: row_number + 1,
                            column: vocabulary.names()[column].clone(),
                            value: other.to_string(),
                        })
                    }
                };
                features.push(value);
            }
            let label = record
                .get(width)
                .map(|l| l.trim().to_string())
                .unwrap_or_default();
            if label.is_empty() {
                return Err(DatasetError::MissingLabelColumn);
            }
            rows.push((features, label));
        }
        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }

        let before = rows.len();
        dedup_rows(&mut rows);
        info!(
            "Training data: {} rows ({} duplicates dropped), {} symptom features",
            rows.len(),
            before - rows.len(),
            width
        );

        apply_noise(&mut rows);

        let labels: Vec<String> = rows.iter().map(|(_, label)| label.clone()).collect();
        let encoder = LabelEncoder::fit(&labels);
        if encoder.num_classes() < 2 {
            return Err(DatasetError::SingleClass(
                encoder.class_names().first().cloned().unwrap_or_default(),
            ));
        }
        let codes: Vec<usize> = labels
            .iter()
            .map(|label| encoder.encode(label).expect("label was just fitted"))
            .collect();

        let (train_idx, test_idx) = stratified_split(&codes, &encoder)?;
        info!(
            "Stratified split: {} train rows, {} test rows, {} classes",
            train_idx.len(),
            test_idx.len(),
            encoder.num_classes()
        );

        Ok(Self {
            x_train: gather_features(&rows, &train_idx, width),
            y_train: gather_labels(&codes, &train_idx),
            x_test: gather_features(&rows, &test_idx, width),
            y_test: gather_labels(&codes, &test_idx),
            encoder,
            vocabulary,
        })
    }
}

/// Collapse rows with identical feature values, keeping the first occurrence.
fn dedup_rows(rows: &mut Vec<(Vec<u8>, String)>) {
    let mut seen: HashSet<Vec<u8>> = HashSet::with_capacity(rows.len());
    rows.retain(|(features, _)| seen.insert(features.clone()));
}

fn apply_noise(rows: &mut [(Vec<u8>, String)]) {
    let mut rng = StdRng::seed_from_u64(NOISE_SEED);
    for (features, _) in rows.iter_mut() {
        for cell in features.iter_mut() {
            *cell ^= rng.gen_bool(NOISE_FLIP_PROBABILITY) as u8;
        }
    }
}

/// Per-class shuffle-and-take split. Every class contributes a proportional
/// share to the test partition, with at least one row kept on each side.
fn stratified_split(
    codes: &[usize],
    encoder: &LabelEncoder,
) -> Result<(Vec<usize>, Vec<usize>), DatasetError> {
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); encoder.num_classes()];
    for (row, &code) in codes.iter().enumerate() {
        by_class[code].push(row);
    }

    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    let mut train_idx = Vec::with_capacity(codes.len());
    let mut test_idx = Vec::new();
    for (code, mut members) in by_class.into_iter().enumerate() {
        if members.len() < 2 {
            return Err(DatasetError::UnderrepresentedClass(
                encoder.decode(code).unwrap_or_default().to_string(),
            ));
        }
        members.shuffle(&mut rng);
        let test_count = ((members.len() as f64 * TEST_FRACTION).round() as usize)
            .max(1)
            .min(members.len() - 1);
        test_idx.extend_from_slice(&members[..test_count]);
        train_idx.extend_from_slice(&members[test_count..]);
    }
    Ok((train_idx, test_idx))
}

fn gather_features(rows: &[(Vec<u8>, String)], indices: &[usize], width: usize) -> Array2<u8> {
    Array2::from_shape_fn((indices.len(), width), |(i, j)| rows[indices[i]].0[j])
}

fn gather_labels(codes: &[usize], indices: &[usize]) -> Array1<usize> {
    Array1::from_iter(indices.iter().map(|&i| codes[i]))
}
