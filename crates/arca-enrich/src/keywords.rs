//! Keyword sanitization
//!
//! The external extractor returns relevance-ranked candidate phrases. This
//! stage filters out fragments that are not entity mentions (stray numbers,
//! archival signature fragments, generic document words) and canonicalizes
//! the survivors. Order is never changed.

use once_cell::sync::Lazy;
use regex::Regex;

use arca_core::PipelineConfig;

/// Archival signature fragments like `A12-expediente` or `345-carta`:
/// optional single letter, two or more digits, dash or en-dash, then a word.
static SIGNATURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[[:alpha:]]?\d{2,}[-–]\w").unwrap());

/// Strip wrapping quotes, brackets, and punctuation, collapse internal
/// spacing, and title-case the phrase unless it is already all-uppercase.
pub fn clean_phrase(raw: &str) -> String {
    let stripped = raw.trim_matches(|c: char| !c.is_alphanumeric());
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed == collapsed.to_uppercase() {
        return collapsed;
    }

    collapsed
        .split(' ')
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Validate and canonicalize one candidate phrase
pub fn validate_phrase(raw: &str, config: &PipelineConfig) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Bare numbers only survive as plausible years
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = trimmed.parse().ok()?;
        if year < config.min_year || year > config.max_year {
            return None;
        }
        return Some(trimmed.to_string());
    }

    if SIGNATURE_RE.is_match(trimmed) {
        return None;
    }

    let cleaned = clean_phrase(trimmed);
    if cleaned.chars().count() < 3 {
        return None;
    }

    let lowered = cleaned.to_lowercase();
    if config.stop_terms.iter().any(|t| t == &lowered) {
        return None;
    }

    Some(cleaned)
}

/// Filter raw extractor output down to the first surviving phrases,
/// preserving the extractor's relevance order.
pub fn sanitize(raw_phrases: &[String], config: &PipelineConfig) -> Vec<String> {
    raw_phrases
        .iter()
        .filter_map(|p| validate_phrase(p, config))
        .take(config.max_keywords)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
