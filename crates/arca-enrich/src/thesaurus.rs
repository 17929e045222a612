//! Controlled vocabulary index
//!
//! Builds a read-only mapping from normalized labels to concept URIs out of
//! a SKOS-style concept list (preferred and alternate labels, language
//! tagged), filtered to one working language. Lookup is exact first; the
//! fuzzy path scores every key with a token-order-insensitive ratio.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use arca_core::{normalize_phrase, ArcaError, Result};

/// A language-tagged label on a concept
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub value: String,
    #[serde(default)]
    pub lang: Option<String>,
}

/// One controlled-vocabulary concept
#[derive(Debug, Clone, Deserialize)]
pub struct Concept {
    pub uri: String,
    #[serde(default)]
    pub pref_labels: Vec<Label>,
    #[serde(default)]
    pub alt_labels: Vec<Label>,
}

/// Read-only index from normalized label to concept URI.
///
/// A `BTreeMap` keeps key iteration in lexicographic order, which makes the
/// fuzzy tie-break (smallest key among equal maximal scores) fall out of a
/// strictly-greater comparison during the scan.
#[derive(Debug, Clone, Default)]
pub struct ThesaurusIndex {
    entries: BTreeMap<String, String>,
}

impl ThesaurusIndex {
    /// Build the index from concepts, keeping only labels in the working
    /// language (untagged labels count as the working language). Preferred
    /// labels win over alternates when the same label appears twice.
    pub fn from_concepts(concepts: &[Concept], language: &str) -> Self {
        let mut entries = BTreeMap::new();

        let in_language =
            |label: &Label| label.lang.as_deref().map(|l| l == language).unwrap_or(true);

        for concept in concepts {
            for label in concept.pref_labels.iter().filter(|l| in_language(l)) {
                let key = normalize_phrase(&label.value);
                if !key.is_empty() {
                    entries.entry(key).or_insert_with(|| concept.uri.clone());
                }
            }
        }
        for concept in concepts {
            for label in concept.alt_labels.iter().filter(|l| in_language(l)) {
                let key = normalize_phrase(&label.value);
                if !key.is_empty() {
                    entries.entry(key).or_insert_with(|| concept.uri.clone());
                }
            }
        }

        Self { entries }
    }

    /// Load concepts from a JSON file and build the index
    pub fn load(path: &Path, language: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArcaError::ThesaurusError(format!("cannot read {}: {e}", path.display()))
        })?;
        let concepts: Vec<Concept> = serde_json::from_str(&content).map_err(|e| {
            ArcaError::ThesaurusError(format!("cannot parse {}: {e}", path.display()))
        })?;
        Ok(Self::from_concepts(&concepts, language))
    }

    /// Number of indexed labels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no labels
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup by normalized label
    pub fn lookup_exact(&self, normalized: &str) -> Option<&str> {
        self.entries.get(normalized).map(String::as_str)
    }

    /// Fuzzy lookup: scores every key against the query, returns the best
    /// `(key, uri, score)` iff the score reaches `threshold`. Equal maximal
    /// scores resolve to the lexicographically smallest key.
    pub fn fuzzy_lookup(&self, normalized: &str, threshold: f64) -> Option<(&str, &str, f64)> {
        let mut best: Option<(&str, &str, f64)> = None;

        for (key, uri) in &self.entries {
            let score = token_sort_ratio(normalized, key);
            if best.map(|(_, _, s)| score > s).unwrap_or(true) {
                best = Some((key, uri, score));
            }
        }

        best.filter(|(_, _, score)| *score >= threshold)
    }
}

/// Token-order-insensitive similarity on a 0-100 scale: whitespace tokens
/// sorted and rejoined, then normalized Levenshtein similarity.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&sort_tokens(a), &sort_tokens(b)) * 100.0
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn label(value: &str, lang: &str) -> Label {
        Label {
            value: value.to_string(),
            lang: Some(lang.to_string()),
        }
    }

    fn sample_index() -> ThesaurusIndex {
        let concepts = vec![
            Concept {
                uri: "http://vocab.example.org/c/cusco".to_string(),
                pref_labels: vec![label("Cusco", "es")],
                alt_labels: vec![label("Qosqo", "es"), label("Cuzco", "en")],
            },
            Concept {
                uri: "http://vocab.example.org/c/lima".to_string(),
                pref_labels: vec![label("Lima", "es")],
                alt_labels: vec![],
            },
        ];
        ThesaurusIndex::from_concepts(&concepts, "es")
    }

    #[test]
    fn test_language_filter_drops_foreign_labels() {
        let index = sample_index();
        assert_eq!(index.len(), 3);
        assert!(index.lookup_exact("cuzco").is_none());
        assert_eq!(
            index.lookup_exact("qosqo"),
            Some("http://vocab.example.org/c/cusco")
        );
    }

    #[test]
    fn test_exact_lookup_uses_normalized_keys() {
        let index = sample_index();
        assert_eq!(
            index.lookup_exact("cusco"),
            Some("http://vocab.example.org/c/cusco")
        );
        assert!(index.lookup_exact("Cusco").is_none());
    }

    #[test]
    fn test_pref_label_wins_on_collision() {
        let concepts = vec![
            Concept {
                uri: "http://vocab.example.org/c/1".to_string(),
                pref_labels: vec![],
                alt_labels: vec![label("Arequipa", "es")],
            },
            Concept {
                uri: "http://vocab.example.org/c/2".to_string(),
                pref_labels: vec![label("Arequipa", "es")],
                alt_labels: vec![],
            },
        ];
        let index = ThesaurusIndex::from_concepts(&concepts, "es");
        assert_eq!(
            index.lookup_exact("arequipa"),
            Some("http://vocab.example.org/c/2")
        );
    }

    #[test]
    fn test_token_sort_ratio_ignores_word_order() {
        assert_eq!(
            token_sort_ratio("nicolás de piérola", "piérola de nicolás"),
            100.0
        );
        assert!(token_sort_ratio("cusco", "cuzco") < 90.0);
        assert!(token_sort_ratio("cusco", "cuzco") > 70.0);
    }

    #[test]
    fn test_fuzzy_lookup_respects_threshold() {
        let index = sample_index();

        assert!(index.fuzzy_lookup("cuzco", 90.0).is_none());

        let (key, uri, score) = index.fuzzy_lookup("cuzco", 75.0).unwrap();
        assert_eq!(key, "cusco");
        assert_eq!(uri, "http://vocab.example.org/c/cusco");
        assert!(score >= 75.0);
    }

    #[test]
    fn test_fuzzy_tie_breaks_to_smallest_key() {
        let concepts = vec![
            Concept {
                uri: "http://vocab.example.org/c/b".to_string(),
                pref_labels: vec![label("valle alto", "es")],
                alt_labels: vec![],
            },
            Concept {
                uri: "http://vocab.example.org/c/a".to_string(),
                pref_labels: vec![label("alto valle", "es")],
                alt_labels: vec![],
            },
        ];
        let index = ThesaurusIndex::from_concepts(&concepts, "es");

        // Both keys token-sort to "alto valle" and score identically
        let (key, uri, score) = index.fuzzy_lookup("valle alto", 90.0).unwrap();
        assert_eq!(score, 100.0);
        assert_eq!(key, "alto valle");
        assert_eq!(uri, "http://vocab.example.org/c/a");
    }

    #[test]
    fn test_empty_index_finds_nothing() {
        let index = ThesaurusIndex::default();
        assert!(index.is_empty());
        assert!(index.lookup_exact("cusco").is_none());
        assert!(index.fuzzy_lookup("cusco", 0.0).is_none());
    }
}
