//! ARCA Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the ARCA
//! pipeline:
//! - Catalog records and their enriched form
//! - Entity categories and canonical identifier helpers
//! - Common error types
//! - The inference-provider trait behind which all language-model calls live
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, LlmConfig, LlmProvider, PipelineConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for ARCA operations
#[derive(Error, Debug)]
pub enum ArcaError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Thesaurus error: {0}")]
    ThesaurusError(String),

    #[error("Graph error: {0}")]
    GraphError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ArcaError>;

// ============================================================================
// Entity Categories
// ============================================================================

/// Category assigned to a keyword mention.
///
/// The set is closed: any classification outcome outside it collapses to
/// `Otro`. The Spanish tokens are the wire format used both in prompts and
/// in the enriched CSV columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Persona,
    Lugar,
    Institucion,
    Evento,
    Otro,
}

impl Category {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persona => "persona",
            Self::Lugar => "lugar",
            Self::Institucion => "institucion",
            Self::Evento => "evento",
            Self::Otro => "otro",
        }
    }

    /// Capitalized form used as the entity type in the output graph
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Persona => "Persona",
            Self::Lugar => "Lugar",
            Self::Institucion => "Institucion",
            Self::Evento => "Evento",
            Self::Otro => "Otro",
        }
    }

    /// Parse a category token leniently: trims, lowercases, and folds the
    /// accented spellings a model is likely to produce. Returns `None` for
    /// anything outside the closed set.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        let folded: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' => 'a',
                'é' => 'e',
                'í' => 'i',
                'ó' => 'o',
                'ú' => 'u',
                _ => c,
            })
            .collect();

        match folded.as_str() {
            "persona" => Some(Self::Persona),
            "lugar" => Some(Self::Lugar),
            "institucion" => Some(Self::Institucion),
            "evento" => Some(Self::Evento),
            "otro" => Some(Self::Otro),
            _ => None,
        }
    }

    /// Whether this category resolves against the controlled vocabulary
    pub fn uses_thesaurus(&self) -> bool {
        matches!(self, Self::Lugar | Self::Evento)
    }

    /// Whether this category gets a deterministic internal URI
    pub fn uses_internal_uri(&self) -> bool {
        matches!(self, Self::Persona | Self::Institucion)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Catalog Records
// ============================================================================

/// One archival catalog entry after header normalization.
///
/// Fields are optional because multi-source combination keeps only the
/// columns common to every source file. Immutable once its dates have been
/// normalized; lives for one pipeline pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Archival call number
    pub signatura: Option<String>,

    /// Free-text chronological date expression
    pub fecha_cronica: Option<String>,

    /// Free-text topical date / place expression
    pub fecha_topica: Option<String>,

    /// Document description
    pub descripcion: Option<String>,

    /// Cataloguer observations
    pub observaciones: Option<String>,

    /// Folio count or range
    pub folios: Option<String>,

    /// Source file this row came from
    pub fuente: Option<String>,

    /// Normalized start date (ISO 8601), if any
    pub fecha_inicio: Option<String>,

    /// Normalized end date (ISO 8601), if any
    pub fecha_fin: Option<String>,
}

impl CatalogRecord {
    /// Combined free text the keyword extractor runs over
    pub fn source_text(&self) -> String {
        let mut text = String::new();
        for part in [&self.descripcion, &self.observaciones].into_iter().flatten() {
            if !part.trim().is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(part.trim());
            }
        }
        text
    }
}

/// A catalog record plus the parallel enrichment lists carried between the
/// enrichment stage and the graph stage.
///
/// The three lists are index-aligned: `uris[i]` is the resolution outcome of
/// `keywords[i]` under `tipos[i]`, `None` when nothing resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: CatalogRecord,

    pub keywords: Vec<String>,
    pub tipos: Vec<Category>,
    pub uris: Vec<Option<String>>,
}

impl EnrichedRecord {
    /// Create from a bare record with empty enrichment lists
    pub fn new(record: CatalogRecord) -> Self {
        Self {
            record,
            keywords: Vec::new(),
            tipos: Vec::new(),
            uris: Vec::new(),
        }
    }

    /// Whether at least one keyword survived sanitization
    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }

    /// Whether at least one mention resolved to a URI
    pub fn has_uris(&self) -> bool {
        self.uris.iter().any(|u| u.is_some())
    }
}

// ============================================================================
// String canonicalization
// ============================================================================

/// Normalize a phrase for lookup and memoization: trim, lowercase, collapse
/// internal whitespace.
pub fn normalize_phrase(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a URI-safe slug: every run of non-alphanumeric characters becomes a
/// single underscore, with leading/trailing underscores trimmed. Input is
/// lowercased; alphabetic characters outside ASCII (accented Spanish letters)
/// are kept as-is.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_sep = false;

    for c in s.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }

    slug
}

// ============================================================================
// Traits
// ============================================================================

/// A scored keyword phrase as returned by the extraction collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPhrase {
    pub phrase: String,
    pub score: f32,
}

/// Narrow capability interface for all external text-inference calls.
///
/// The pipeline's deterministic logic only ever sees this trait; concrete
/// HTTP clients live in `arca-llm`, and tests substitute fakes. Every method
/// is a single round-trip with no retry semantics; callers degrade to their
/// documented fallback value on `Err`.
#[async_trait::async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Interpret a free-form historical date expression. Expected to return
    /// exactly two comma-separated ISO 8601 dates.
    async fn infer_date_range(&self, text: &str) -> Result<String>;

    /// Extract up to `max_phrases` keyword candidates from `text`, ranked by
    /// relevance (highest first).
    async fn extract_keywords(&self, text: &str, max_phrases: usize) -> Result<Vec<ScoredPhrase>>;

    /// Classify a mention into one of the category tokens.
    async fn classify(&self, phrase: &str) -> Result<String>;
}

// ============================================================================
// Tests
// ============================================================================
