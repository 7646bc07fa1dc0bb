use std::sync::Arc;

use log::debug;

use crate::dataset::Vocabulary;

/// External free-text symptom extraction capability. The extraction
/// algorithm itself is out of scope for this crate; implementations return
/// symptom identifiers that should name vocabulary entries (anything else is
/// dropped during resolution).
pub trait SymptomExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Default extractor: scans the normalized text for literal vocabulary
/// phrases. Deliberately conservative; callers with a real NLP pipeline
/// plug in their own [`SymptomExtractor`].
pub struct VocabularyScanExtractor {
    vocabulary: Arc<Vocabulary>,
}

impl VocabularyScanExtractor {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }
}

impl SymptomExtractor for VocabularyScanExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let haystack = normalize(text);
        self.vocabulary
            .names()
            .iter()
            .filter(|symptom| haystack.contains(symptom.as_str()))
            .cloned()
            .collect()
    }
}

/// Resolves loosely-specified symptom tokens against the canonical
/// vocabulary and merges in externally-extracted symptoms.
pub struct SymptomMatcher {
    vocabulary: Arc<Vocabulary>,
}

impl SymptomMatcher {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    /// Every vocabulary entry containing the normalized token as a
    /// substring, in vocabulary order. An unknown token yields an empty
    /// vec, never an error.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use prognosis::{SymptomMatcher, Vocabulary};
    ///
    /// let vocabulary = Arc::new(Vocabulary::new(vec![
    ///     "cough".to_string(),
    ///     "mild_fever".to_string(),
    /// ]));
    /// let matcher = SymptomMatcher::new(vocabulary);
    /// assert_eq!(matcher.matches("cugh"), vec!["cough"]);
    /// ```
    pub fn matches(&self, token: &str) -> Vec<String> {
        let needle = normalize(token);
        if needle.is_empty() {
            return Vec::new();
        }
        self.vocabulary
            .names()
            .iter()
            .filter(|symptom| symptom.contains(&needle))
            .cloned()
            .collect()
    }

    /// Combined resolution pipeline. Each caller token that exactly matches
    /// a vocabulary entry is kept as-is; anything else expands into all of
    /// its substring matches (possibly none). Externally-extracted symptoms
    /// are appended afterward, skipping duplicates and anything outside the
    /// vocabulary. The result is a duplicate-free symptom set in
    /// first-mention order; it may be empty, which callers must treat as
    /// "no usable input" before ever consulting the classifier.
    pub fn resolve(&self, tokens: &[String], extracted: &[String]) -> Vec<String> {
        let mut resolved: Vec<String> = Vec::new();
        for raw in tokens {
            let token = normalize(raw);
            if token.is_empty() {
                continue;
            }
            if self.vocabulary.contains(&token) {
                push_unique(&mut resolved, token);
            } else {
                for hit in self.matches(&token) {
                    push_unique(&mut resolved, hit);
                }
            }
        }
        for raw in extracted {
            let symptom = normalize(raw);
            if self.vocabulary.contains(&symptom) {
                push_unique(&mut resolved, symptom);
            } else if !symptom.is_empty() {
                debug!("Dropping extracted symptom outside vocabulary: {}", symptom);
            }
        }
        resolved
    }
}

/// Canonical form every token is reduced to before matching: lowercase,
/// surrounding whitespace stripped, inner spaces become underscores.
fn normalize(token: &str) -> String {
    token.trim().to_lowercase().replace(' ', "_")
}

fn push_unique(resolved: &mut Vec<String>, symptom: String) {
    if !resolved.contains(&symptom) {
        resolved.push(symptom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> SymptomMatcher {
        SymptomMatcher::new(Arc::new(Vocabulary::new(vec![
            "itching".to_string(),
            "skin_rash".to_string(),
            "cough".to_string(),
            "mild_fever".to_string(),
            "high_fever".to_string(),
            "headache".to_string(),
        ])))
    }

    #[test]
    fn test_substring_match_catches_typos() {
        assert_eq!(matcher().matches("cugh"), vec!["cough"]);
    }

    #[test]
    fn test_matches_preserve_vocabulary_order() {
        assert_eq!(matcher().matches("fever"), vec!["mild_fever", "high_fever"]);
    }

    #[test]
    fn test_normalization_lowercases_and_underscores() {
        assert_eq!(matcher().matches("Mild Fever"), vec!["mild_fever"]);
        assert_eq!(matcher().matches("  skin rash "), vec!["skin_rash"]);
    }

    #[test]
    fn test_unknown_token_yields_empty_not_error() {
        assert!(matcher().matches("vertigo").is_empty());
    }

    #[test]
    fn test_resolve_keeps_exact_tokens_as_is() {
        let resolved = matcher().resolve(&["cough".to_string()], &[]);
        assert_eq!(resolved, vec!["cough"]);
    }

    #[test]
    fn test_resolve_expands_partial_tokens() {
        let resolved = matcher().resolve(&["fever".to_string()], &[]);
        assert_eq!(resolved, vec!["mild_fever", "high_fever"]);
    }

    #[test]
    fn test_resolve_appends_extracted_without_duplicates() {
        let resolved = matcher().resolve(
            &["cough".to_string()],
            &["cough".to_string(), "headache".to_string()],
        );
        assert_eq!(resolved, vec!["cough", "headache"]);
    }

    #[test]
    fn test_resolve_drops_extracted_outside_vocabulary() {
        let resolved = matcher().resolve(&[], &["made_up_symptom".to_string()]);
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_resolve_empty_input_is_empty() {
        assert!(matcher().resolve(&[], &[]).is_empty());
    }

    #[test]
    fn test_vocabulary_scan_extractor_finds_phrases() {
        let vocabulary = Arc::new(Vocabulary::new(vec![
            "mild_fever".to_string(),
            "headache".to_string(),
            "cough".to_string(),
        ]));
        let extractor = VocabularyScanExtractor::new(vocabulary);
        let found = extractor.extract("I have a mild fever and a bad headache");
        assert_eq!(found, vec!["mild_fever", "headache"]);
    }
}
