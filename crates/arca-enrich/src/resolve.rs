//! Entity classification and resolution
//!
//! Each sanitized mention is classified into one of the closed category
//! tokens and then resolved to a canonical URI. Places and events go through
//! the controlled vocabulary (exact, then fuzzy); persons and institutions
//! get a deterministic internal URI; everything else stays unresolved.
//!
//! Resolution is a pure function of (normalized phrase, category), so any
//! two mentions of the same phrase end up on the same identifier.

use tracing::warn;

use arca_core::{normalize_phrase, slugify, Category, InferenceProvider, PipelineConfig};

use crate::thesaurus::ThesaurusIndex;

/// Classify a mention, collapsing every failure mode to `Otro`: provider
/// errors, empty output, and tokens outside the closed set.
pub async fn classify_category(provider: &dyn InferenceProvider, phrase: &str) -> Category {
    match provider.classify(phrase).await {
        Ok(token) => Category::parse_lenient(&token).unwrap_or(Category::Otro),
        Err(e) => {
            warn!(phrase, error = %e, "classification failed, using otro");
            Category::Otro
        }
    }
}

/// Resolve a mention to a canonical URI, or `None` when nothing applies.
pub fn resolve(
    phrase: &str,
    category: Category,
    index: &ThesaurusIndex,
    config: &PipelineConfig,
) -> Option<String> {
    let normalized = normalize_phrase(phrase);
    if normalized.is_empty() {
        return None;
    }

    if category.uses_thesaurus() {
        if let Some(uri) = index.lookup_exact(&normalized) {
            return Some(uri.to_string());
        }
        return index
            .fuzzy_lookup(&normalized, config.fuzzy_threshold)
            .map(|(_, uri, _)| uri.to_string());
    }

    if category.uses_internal_uri() {
        let slug = slugify(&normalized);
        if slug.is_empty() {
            return None;
        }
        return Some(format!("{}{}", config.entity_namespace(), slug));
    }

    None
}

// ============================================================================
// Tests
// ============================================================================
