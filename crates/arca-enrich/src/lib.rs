//! ARCA Enrich - The enrichment pipeline
//!
//! Wires the per-record stages together: date normalization over the
//! chronological date field, keyword extraction over the combined free text,
//! sanitization, classification, and URI resolution. All external calls go
//! through the `InferenceProvider` trait; every failure degrades to the
//! documented fallback and the batch always completes.

use serde::Serialize;
use tracing::warn;

use arca_core::{CatalogRecord, EnrichedRecord, InferenceProvider, PipelineConfig};

pub mod dates;
pub mod keywords;
pub mod resolve;
pub mod thesaurus;

pub use thesaurus::ThesaurusIndex;

// ============================================================================
// Enricher
// ============================================================================

/// Pipeline front door: owns the provider, the read-only thesaurus index,
/// and the configuration; every transformation below it is pure.
pub struct Enricher<P> {
    provider: P,
    index: ThesaurusIndex,
    config: PipelineConfig,
}

impl<P: InferenceProvider> Enricher<P> {
    pub fn new(provider: P, index: ThesaurusIndex, config: PipelineConfig) -> Self {
        Self {
            provider,
            index,
            config,
        }
    }

    /// Fill `fecha_inicio`/`fecha_fin` from each record's chronological date
    /// expression. Returns how many records got a start date.
    pub async fn normalize_dates(&self, records: &mut [CatalogRecord]) -> usize {
        let mut normalized = 0;
        for record in records.iter_mut() {
            let Some(expression) = record.fecha_cronica.clone() else {
                continue;
            };
            let (start, end) = dates::normalize_date_range(&expression, &self.provider).await;
            if start.is_some() {
                normalized += 1;
            }
            record.fecha_inicio = start;
            record.fecha_fin = end;
        }
        normalized
    }

    /// Enrich one record with keywords, categories, and URIs
    pub async fn enrich_record(&self, record: CatalogRecord) -> EnrichedRecord {
        self.enrich_into(record).await.0
    }

    /// Enrich a whole batch, returning the records plus a run summary
    pub async fn enrich_all(
        &self,
        records: Vec<CatalogRecord>,
    ) -> (Vec<EnrichedRecord>, EnrichmentSummary) {
        let mut summary = EnrichmentSummary {
            records: records.len(),
            ..Default::default()
        };

        let mut enriched = Vec::with_capacity(records.len());
        for record in records {
            let (result, extraction_failed) = self.enrich_into(record).await;
            if extraction_failed {
                summary.extraction_failures += 1;
            }
            if result.has_keywords() {
                summary.with_keywords += 1;
            }
            if result.has_uris() {
                summary.with_uris += 1;
            }
            enriched.push(result);
        }

        (enriched, summary)
    }

    async fn enrich_into(&self, record: CatalogRecord) -> (EnrichedRecord, bool) {
        let text = record.source_text();
        let mut enriched = EnrichedRecord::new(record);

        if text.is_empty() {
            return (enriched, false);
        }

        let (raw_phrases, extraction_failed) = match self
            .provider
            .extract_keywords(&text, self.config.max_keywords)
            .await
        {
            Ok(scored) => (
                scored.into_iter().map(|s| s.phrase).collect::<Vec<_>>(),
                false,
            ),
            Err(e) => {
                warn!(error = %e, "keyword extraction failed, record keeps no keywords");
                (Vec::new(), true)
            }
        };

        for keyword in keywords::sanitize(&raw_phrases, &self.config) {
            let category = resolve::classify_category(&self.provider, &keyword).await;
            let uri = resolve::resolve(&keyword, category, &self.index, &self.config);
            enriched.keywords.push(keyword);
            enriched.tipos.push(category);
            enriched.uris.push(uri);
        }

        (enriched, extraction_failed)
    }
}

/// Counters reported at the end of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    /// Records processed
    pub records: usize,
    /// Records that kept at least one keyword
    pub with_keywords: usize,
    /// Records where at least one mention resolved to a URI
    pub with_uris: usize,
    /// Records whose extraction call failed outright
    pub extraction_failures: usize,
}

// ============================================================================
// Test fake
// ============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::HashMap;

    use arca_core::{normalize_phrase, ArcaError, InferenceProvider, Result, ScoredPhrase};

    /// Canned inference provider for pipeline tests
    #[derive(Default)]
    pub struct FakeProvider {
        date_response: Option<String>,
        keywords: Vec<ScoredPhrase>,
        classifications: HashMap<String, String>,
        default_classification: Option<String>,
        fail: bool,
    }

    impl FakeProvider {
        pub fn with_date_response(mut self, response: &str) -> Self {
            self.date_response = Some(response.to_string());
            self
        }

        pub fn with_keywords(mut self, phrases: &[&str]) -> Self {
            self.keywords = phrases
                .iter()
                .enumerate()
                .map(|(i, p)| ScoredPhrase {
                    phrase: p.to_string(),
                    score: 1.0 - i as f32 * 0.1,
                })
                .collect();
            self
        }

        pub fn with_classification(mut self, token: &str) -> Self {
            self.default_classification = Some(token.to_string());
            self
        }

        pub fn with_classification_for(mut self, phrase: &str, token: &str) -> Self {
            self.classifications
                .insert(normalize_phrase(phrase), token.to_string());
            self
        }

        pub fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn check(&self) -> Result<()> {
            if self.fail {
                Err(ArcaError::LlmError("fake provider failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait::async_trait]
    impl InferenceProvider for FakeProvider {
        async fn infer_date_range(&self, _text: &str) -> Result<String> {
            self.check()?;
            Ok(self
                .date_response
                .clone()
                .unwrap_or_else(|| "fecha inválida".to_string()))
        }

        async fn extract_keywords(
            &self,
            _text: &str,
            max_phrases: usize,
        ) -> Result<Vec<ScoredPhrase>> {
            self.check()?;
            let mut phrases = self.keywords.clone();
            phrases.truncate(max_phrases);
            Ok(phrases)
        }

        async fn classify(&self, phrase: &str) -> Result<String> {
            self.check()?;
            Ok(self
                .classifications
                .get(&normalize_phrase(phrase))
                .or(self.default_classification.as_ref())
                .cloned()
                .unwrap_or_else(|| "otro".to_string()))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
