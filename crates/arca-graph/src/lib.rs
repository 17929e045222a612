//! ARCA Graph - Document-entity graph assembly
//!
//! Folds enriched catalog records into a linked-data graph: one node per
//! document, one node per distinct entity, and a keyword relation between
//! them. Entity nodes are deduplicated by their canonical URI: two mentions
//! that slug to the same identifier merge into one node shared by every
//! document that cites them.

use std::collections::BTreeMap;

use arca_core::{slugify, EnrichedRecord, PipelineConfig};

pub mod turtle;

// ============================================================================
// Graph model
// ============================================================================

/// A document node in the output graph
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNode {
    /// Stable per-run identifier (`doc_001`, `doc_002`, ...)
    pub id: String,

    /// Full node URI in the catalog namespace
    pub uri: String,

    /// Archival call number literal
    pub signatura: String,

    /// Entity URIs this document cites, deduplicated, citation order
    pub entities: Vec<String>,
}

/// An entity node in the output graph
#[derive(Debug, Clone, PartialEq)]
pub struct EntityNode {
    /// Full node URI in the entity namespace
    pub uri: String,

    /// Type name in the vocabulary namespace (`Lugar`, `Persona`, ...)
    pub kind: String,

    /// Preferred label
    pub label: String,

    /// Canonical identifier from resolution, when one exists
    pub same_as: Option<String>,
}

/// The assembled document↔entity graph
#[derive(Debug, Clone, Default)]
pub struct DocumentEntityGraph {
    /// Namespace root for catalog nodes
    pub catalog_ns: String,

    /// Namespace root for entity nodes
    pub entity_ns: String,

    /// Namespace root for vocabulary terms
    pub vocab_ns: String,

    /// Language tag for entity labels
    pub label_language: String,

    /// Document nodes in input order
    pub documents: Vec<DocumentNode>,

    /// Entity nodes keyed by URI, lexicographic order for stable output
    pub entities: BTreeMap<String, EntityNode>,
}

impl DocumentEntityGraph {
    /// Total number of triples the graph serializes to
    pub fn triple_count(&self) -> usize {
        let document_triples: usize = self
            .documents
            .iter()
            .map(|d| 2 + d.entities.len())
            .sum();
        let entity_triples: usize = self
            .entities
            .values()
            .map(|e| 2 + usize::from(e.same_as.is_some()))
            .sum();
        document_triples + entity_triples
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// URI schemes accepted for `owl:sameAs` targets
fn has_recognized_scheme(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// Assemble the graph from enriched records.
///
/// Document identifiers are a pure function of row position: 1-based,
/// zero-padded to 3 digits. Mentions with an empty label or an empty slug
/// contribute nothing.
pub fn assemble(records: &[EnrichedRecord], config: &PipelineConfig) -> DocumentEntityGraph {
    let mut graph = DocumentEntityGraph {
        catalog_ns: config.catalog_namespace(),
        entity_ns: config.entity_namespace(),
        vocab_ns: config.vocab_namespace(),
        label_language: config.label_language.clone(),
        ..Default::default()
    };

    for (idx, enriched) in records.iter().enumerate() {
        let doc_id = format!("doc_{:03}", idx + 1);
        let mut document = DocumentNode {
            uri: format!("{}{}", graph.catalog_ns, doc_id),
            id: doc_id,
            signatura: enriched
                .record
                .signatura
                .clone()
                .unwrap_or_else(|| format!("SIN_SIGNATURA_{idx}")),
            entities: Vec::new(),
        };

        for (i, label) in enriched.keywords.iter().enumerate() {
            if label.trim().is_empty() {
                continue;
            }
            let slug = slugify(label);
            if slug.is_empty() {
                tracing::debug!(label, "mention has no sluggable characters, skipping");
                continue;
            }

            let entity_uri = format!("{}{}", graph.entity_ns, slug);
            let kind = enriched
                .tipos
                .get(i)
                .map(|c| c.type_label().to_string())
                .unwrap_or_else(|| "Entidad".to_string());
            let same_as = enriched
                .uris
                .get(i)
                .and_then(|u| u.clone())
                .filter(|u| has_recognized_scheme(u))
                .filter(|u| u != &entity_uri);

            let node = graph
                .entities
                .entry(entity_uri.clone())
                .or_insert_with(|| EntityNode {
                    uri: entity_uri.clone(),
                    kind,
                    label: label.clone(),
                    same_as: None,
                });
            if node.same_as.is_none() {
                node.same_as = same_as;
            }

            if !document.entities.contains(&entity_uri) {
                document.entities.push(entity_uri);
            }
        }

        graph.documents.push(document);
    }

    graph
}

// ============================================================================
// Tests
// ============================================================================
