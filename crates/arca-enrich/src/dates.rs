//! Historical date-range normalization
//!
//! Catalog dates arrive as free text: `1836-Mar.-14/1852-Ago.-20`, a bare
//! `1531`, or prose like `mediados del siglo XVIII`. Deterministic rules run
//! first; the external date-inference call is a last resort and its output is
//! validated before use. Every path degrades to `None`; a date that cannot
//! be normalized never fails the record.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use arca_core::InferenceProvider;

/// Spanish month abbreviations as they appear in the catalogs
const MONTH_ABBREVIATIONS: [(&str, &str); 12] = [
    ("ene.", "01"),
    ("feb.", "02"),
    ("mar.", "03"),
    ("abr.", "04"),
    ("may.", "05"),
    ("jun.", "06"),
    ("jul.", "07"),
    ("ago.", "08"),
    ("sep.", "09"),
    ("oct.", "10"),
    ("nov.", "11"),
    ("dic.", "12"),
];

static BARE_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());
static YEAR_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").unwrap());
static DATE_GROUPS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap());

/// Convert one Spanish-abbreviated date expression to canonical ISO form.
///
/// A bare 4-digit year normalizes to January 1st of that year. Anything that
/// does not reduce to `YYYY-M-D` digit groups after substitution fails with
/// `None`. Canonical ISO input maps to itself.
pub fn convert_spanish_date(text: &str) -> Option<String> {
    let mut s = text.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }

    if BARE_YEAR_RE.is_match(&s) {
        return Some(format!("{s}-01-01"));
    }

    for (abbreviation, month) in MONTH_ABBREVIATIONS {
        s = s.replace(abbreviation, month);
    }
    s.retain(|c| c != '.' && c != ' ');

    let captures = DATE_GROUPS_RE.captures(&s)?;
    Some(format!(
        "{}-{:0>2}-{:0>2}",
        &captures[1], &captures[2], &captures[3]
    ))
}

/// Validate an inference response expected to hold exactly two
/// comma-separated ISO 8601 dates, returning them re-canonicalized.
pub fn parse_inferred_pair(response: &str) -> Option<(String, String)> {
    let mut parts = response.trim().split(',');
    let start = parse_iso(parts.next()?)?;
    let end = parse_iso(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((start, end))
}

fn parse_iso(text: &str) -> Option<String> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Normalize a free-form date expression into an ISO start/end pair.
///
/// Rules in priority order, first applicable wins:
/// 1. empty input → nothing;
/// 2. an explicit `/` range separator → both sides converted independently,
///    one side failing does not abort the other;
/// 3. a 4-digit year somewhere in the text → the whole expression is a
///    single point-in-time start date;
/// 4. otherwise the external inference call, whose output only counts if it
///    is exactly two ISO dates.
pub async fn normalize_date_range(
    text: &str,
    provider: &dyn InferenceProvider,
) -> (Option<String>, Option<String>) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return (None, None);
    }

    if trimmed.contains('/') {
        let mut parts = trimmed.splitn(2, '/');
        let start = parts.next().and_then(convert_spanish_date);
        let end = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .and_then(convert_spanish_date);
        return (start, end);
    }

    if YEAR_TOKEN_RE.is_match(trimmed) {
        return (convert_spanish_date(trimmed), None);
    }

    match provider.infer_date_range(trimmed).await {
        Ok(response) => match parse_inferred_pair(&response) {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        },
        Err(e) => {
            warn!(expression = trimmed, error = %e, "date inference failed");
            (None, None)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeProvider;

    #[test]
    fn test_bare_year_becomes_january_first() {
        assert_eq!(convert_spanish_date("1531"), Some("1531-01-01".to_string()));
        assert_eq!(convert_spanish_date(" 1877 "), Some("1877-01-01".to_string()));
    }

    #[test]
    fn test_month_abbreviation_conversion() {
        assert_eq!(
            convert_spanish_date("1836-Mar.-14"),
            Some("1836-03-14".to_string())
        );
        assert_eq!(
            convert_spanish_date("1852-ago.-20"),
            Some("1852-08-20".to_string())
        );
        assert_eq!(
            convert_spanish_date("1700-Dic.-3"),
            Some("1700-12-03".to_string())
        );
    }

    #[test]
    fn test_conversion_is_idempotent_on_canonical_output() {
        for input in ["1836-Mar.-14", "1531", "1700-Dic.-3"] {
            let first = convert_spanish_date(input).unwrap();
            assert_eq!(convert_spanish_date(&first), Some(first.clone()));
        }
    }

    #[test]
    fn test_garbage_fails_conversion() {
        assert_eq!(convert_spanish_date(""), None);
        assert_eq!(convert_spanish_date("sin fecha"), None);
        assert_eq!(convert_spanish_date("s/f"), None);
        assert_eq!(convert_spanish_date("1836-Brumario-14"), None);
    }

    #[tokio::test]
    async fn test_range_splits_into_two_independent_parts() {
        let provider = FakeProvider::default();
        let (start, end) =
            normalize_date_range("1836-Mar.-14/1852-Ago.-20", &provider).await;
        assert_eq!(start.as_deref(), Some("1836-03-14"));
        assert_eq!(end.as_deref(), Some("1852-08-20"));
    }

    #[tokio::test]
    async fn test_failed_side_does_not_abort_the_other() {
        let provider = FakeProvider::default();

        let (start, end) = normalize_date_range("1836-Mar.-14/ilegible", &provider).await;
        assert_eq!(start.as_deref(), Some("1836-03-14"));
        assert_eq!(end, None);

        let (start, end) = normalize_date_range("roto/1852-Ago.-20", &provider).await;
        assert_eq!(start, None);
        assert_eq!(end.as_deref(), Some("1852-08-20"));
    }

    #[tokio::test]
    async fn test_single_sided_range() {
        let provider = FakeProvider::default();
        let (start, end) = normalize_date_range("1836-Mar.-14/", &provider).await;
        assert_eq!(start.as_deref(), Some("1836-03-14"));
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_year_token_means_point_in_time() {
        let provider = FakeProvider::default();
        let (start, end) = normalize_date_range("1531", &provider).await;
        assert_eq!(start.as_deref(), Some("1531-01-01"));
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_empty_input_short_circuits() {
        let provider = FakeProvider::default();
        assert_eq!(normalize_date_range("   ", &provider).await, (None, None));
    }

    #[tokio::test]
    async fn test_inference_fallback_accepts_exact_pair() {
        let provider =
            FakeProvider::default().with_date_response("1700-01-01,1799-12-31");
        let (start, end) = normalize_date_range("siglo XVIII", &provider).await;
        assert_eq!(start.as_deref(), Some("1700-01-01"));
        assert_eq!(end.as_deref(), Some("1799-12-31"));
    }

    #[tokio::test]
    async fn test_inference_fallback_rejects_malformed_output() {
        for bad in ["fecha inválida", "1700-01-01", "1700-01-01,1799-12-31,1800-01-01", "ayer,hoy"] {
            let provider = FakeProvider::default().with_date_response(bad);
            assert_eq!(
                normalize_date_range("mediados del siglo", &provider).await,
                (None, None)
            );
        }
    }

    #[tokio::test]
    async fn test_inference_failure_degrades_to_none() {
        let provider = FakeProvider::default().failing();
        assert_eq!(
            normalize_date_range("sin fecha conocida", &provider).await,
            (None, None)
        );
    }
}
