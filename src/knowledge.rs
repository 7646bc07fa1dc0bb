use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{info, warn};

/// Placeholder returned when a disease has no description row.
pub const DESCRIPTION_FALLBACK: &str = "Not available";

/// A precaution row carries the disease name plus up to four precautions.
const PRECAUTION_MIN_COLUMNS: usize = 5;
const PRECAUTION_LIMIT: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
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
    #[error("non-numeric severity weight '{value}' for symptom '{symptom}'")]
    InvalidSeverity { symptom: String, value: String },
}

/// Immutable reference tables loaded once at startup: per-symptom severity
/// weights, per-disease descriptions, and per-disease precaution lists.
///
/// Lookups never fail: a missing symptom weighs 0, a missing description
/// resolves to [`DESCRIPTION_FALLBACK`], and missing precautions resolve to
/// an empty slice.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    severity: HashMap<String, u32>,
    descriptions: HashMap<String, String>,
    precautions: HashMap<String, Vec<String>>,
}

impl KnowledgeBase {
    /// Loads the three reference tables from headerless CSV files.
    ///
    /// Rows below the minimum column count for their table are skipped with
    /// a warning. A severity weight that does not parse as an integer is a
    /// fatal error, since severity feeds the triage arithmetic.
    pub fn load(
        severity_path: &Path,
        description_path: &Path,
        precaution_path: &Path,
    ) -> Result<Self, KnowledgeError> {
        let severity = read_severity(open(severity_path)?, &severity_path.display().to_string())?;
        let descriptions =
            read_descriptions(open(description_path)?, &description_path.display().to_string())?;
        let precautions =
            read_precautions(open(precaution_path)?, &precaution_path.display().to_string())?;

        info!(
            "Knowledge base loaded: {} severity weights, {} descriptions, {} precaution lists",
            severity.len(),
            descriptions.len(),
            precautions.len()
        );

        Ok(Self {
            severity,
            descriptions,
            precautions,
        })
    }

    /// Loads the three reference tables from arbitrary readers, for callers
    /// that embed their reference data instead of shipping CSV files.
    pub fn from_readers<R1: Read, R2: Read, R3: Read>(
        severity: R1,
        descriptions: R2,
        precautions: R3,
    ) -> Result<Self, KnowledgeError> {
        Ok(Self {
            severity: read_severity(severity, "<reader>")?,
            descriptions: read_descriptions(descriptions, "<reader>")?,
            precautions: read_precautions(precautions, "<reader>")?,
        })
    }

    /// Severity weight for a symptom; unknown symptoms weigh 0.
    pub fn severity_of(&self, symptom: &str) -> u32 {
        self.severity.get(symptom).copied().unwrap_or(0)
    }

    /// Description for a disease, or [`DESCRIPTION_FALLBACK`].
    pub fn description_of(&self, disease: &str) -> &str {
        self.descriptions
            .get(disease)
            .map(String::as_str)
            .unwrap_or(DESCRIPTION_FALLBACK)
    }

    /// Precautions for a disease, empty when none are on record.
    pub fn precautions_of(&self, disease: &str) -> &[String] {
        self.precautions
            .get(disease)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn open(path: &Path) -> Result<File, KnowledgeError> {
    File::open(path).map_err(|source| KnowledgeError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn read_severity<R: Read>(reader: R, origin: &str) -> Result<HashMap<String, u32>, KnowledgeError> {
    let mut table = HashMap::new();
    for record in csv_reader(reader).into_records() {
        let record = record.map_err(|source| KnowledgeError::Csv {
            path: origin.to_string(),
            source,
        })?;
        if record.len() < 2 {
            warn!("Skipping short severity row in {}: {:?}", origin, record);
            continue;
        }
        let symptom = record[0].to_string();
        let weight = record[1]
            .trim()
            .parse::<u32>()
            .map_err(|_| KnowledgeError::InvalidSeverity {
                symptom: symptom.clone(),
                value: record[1].to_string(),
            })?;
        table.insert(symptom, weight);
    }
    Ok(table)
}

fn read_descriptions<R: Read>(
    reader: R,
    origin: &str,
) -> Result<HashMap<String, String>, KnowledgeError> {
    let mut table = HashMap::new();
    for record in csv_reader(reader).into_records() {
        let record = record.map_err(|source| KnowledgeError::Csv {
            path: origin.to_string(),
            source,
        })?;
        if record.len() < 2 {
            warn!("Skipping short description row in {}: {:?}", origin, record);
            continue;
        }
        table.insert(record[0].to_string(), record[1].to_string());
    }
    Ok(table)
}

fn read_precautions<R: Read>(
    reader: R,
    origin: &str,
) -> Result<HashMap<String, Vec<String>>, KnowledgeError> {
    let mut table = HashMap::new();
    for record in csv_reader(reader).into_records() {
        let record = record.map_err(|source| KnowledgeError::Csv {
            path: origin.to_string(),
            source,
        })?;
        if record.len() < PRECAUTION_MIN_COLUMNS {
            warn!("Skipping short precaution row in {}: {:?}", origin, record);
            continue;
        }
        let steps: Vec<String> = record
            .iter()
            .skip(1)
            .take(PRECAUTION_LIMIT)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        table.insert(record[0].to_string(), steps);
    }
    Ok(table)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn kb_from(severity: &str, descriptions: &str, precautions: &str) -> KnowledgeBase {
        KnowledgeBase {
            severity: read_severity(Cursor::new(severity), "inline").unwrap(),
            descriptions: read_descriptions(Cursor::new(descriptions), "inline").unwrap(),
            precautions: read_precautions(Cursor::new(precautions), "inline").unwrap(),
        }
    }

    #[test]
    fn test_severity_lookup_defaults_to_zero() {
        let kb = kb_from("itching,1\nskin_rash,3\n", "", "");
        assert_eq!(kb.severity_of("itching"), 1);
        assert_eq!(kb.severity_of("skin_rash"), 3);
        assert_eq!(kb.severity_of("unlisted_symptom"), 0);
    }

    #[test]
    fn test_short_rows_are_skipped_not_fatal() {
        let severity = read_severity(Cursor::new("itching,1\nbroken\ncough,4\n"), "inline").unwrap();
        assert_eq!(severity.len(), 2);
        assert_eq!(severity["cough"], 4);
    }

    #[test]
    fn test_non_numeric_severity_is_fatal() {
        let result = read_severity(Cursor::new("itching,mild\n"), "inline");
        assert!(matches!(
            result,
            Err(KnowledgeError::InvalidSeverity { ref symptom, .. }) if symptom == "itching"
        ));
    }

    #[test]
    fn test_description_fallback() {
        let kb = kb_from("", "Allergy,An immune response.\n", "");
        assert_eq!(kb.description_of("Allergy"), "An immune response.");
        assert_eq!(kb.description_of("Unknown Disease"), DESCRIPTION_FALLBACK);
    }

    #[test]
    fn test_precautions_capped_at_four() {
        let kb = kb_from(
            "",
            "",
            "Allergy,apply calamine,cover area with bandage,use ice,take antihistamine,extra column\n",
        );
        let steps = kb.precautions_of("Allergy");
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0], "apply calamine");
        assert!(kb.precautions_of("Unknown Disease").is_empty());
    }

    #[test]
    fn test_short_precaution_rows_are_skipped() {
        let kb = kb_from("", "", "Allergy,only,two,steps\n");
        assert!(kb.precautions_of("Allergy").is_empty());
    }
}
