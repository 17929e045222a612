//! Turtle serialization of the document-entity graph
//!
//! Writes the same triple shapes the catalog graph has always used:
//! `arca:doc_NNN rdf:type voc:Documento`, a `voc:signatura` literal, typed
//! entity nodes with a language-tagged `skos:prefLabel`, an `owl:sameAs`
//! link when resolution produced a canonical identifier, and one
//! `voc:tienePalabraClave` edge per citation.

use std::path::Path;

use arca_core::{ArcaError, Result};

use crate::{DocumentEntityGraph, DocumentNode, EntityNode};

const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
const SKOS_NS: &str = "http://www.w3.org/2004/02/skos/core#";
const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";

/// Escape a string for use inside a double-quoted Turtle literal
fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

fn write_document(out: &mut String, doc: &DocumentNode) {
    out.push_str(&format!("arca:{} rdf:type voc:Documento ;\n", doc.id));
    out.push_str(&format!(
        "    voc:signatura \"{}\"",
        escape_literal(&doc.signatura)
    ));

    if doc.entities.is_empty() {
        out.push_str(" .\n\n");
        return;
    }

    out.push_str(" ;\n    voc:tienePalabraClave ");
    let refs: Vec<String> = doc
        .entities
        .iter()
        .map(|uri| format!("<{uri}>"))
        .collect();
    out.push_str(&refs.join(", "));
    out.push_str(" .\n\n");
}

fn write_entity(out: &mut String, entity: &EntityNode, graph: &DocumentEntityGraph) {
    out.push_str(&format!("<{}> rdf:type voc:{} ;\n", entity.uri, entity.kind));
    out.push_str(&format!(
        "    skos:prefLabel \"{}\"@{}",
        escape_literal(&entity.label),
        graph.label_language
    ));

    if let Some(same_as) = &entity.same_as {
        out.push_str(&format!(" ;\n    owl:sameAs <{same_as}>"));
    }
    out.push_str(" .\n\n");
}

/// Serialize the graph to Turtle text
pub fn to_turtle(graph: &DocumentEntityGraph) -> String {
    let mut out = String::new();

    out.push_str(&format!("@prefix rdf: <{RDF_NS}> .\n"));
    out.push_str(&format!("@prefix rdfs: <{RDFS_NS}> .\n"));
    out.push_str(&format!("@prefix skos: <{SKOS_NS}> .\n"));
    out.push_str(&format!("@prefix owl: <{OWL_NS}> .\n"));
    out.push_str(&format!("@prefix arca: <{}> .\n", graph.catalog_ns));
    out.push_str(&format!("@prefix ent: <{}> .\n", graph.entity_ns));
    out.push_str(&format!("@prefix voc: <{}> .\n", graph.vocab_ns));
    out.push('\n');

    for doc in &graph.documents {
        write_document(&mut out, doc);
    }
    for entity in graph.entities.values() {
        write_entity(&mut out, entity, graph);
    }

    out
}

/// Serialize the graph and write it to a file
pub fn write_turtle(graph: &DocumentEntityGraph, path: &Path) -> Result<()> {
    std::fs::write(path, to_turtle(graph))
        .map_err(|e| ArcaError::GraphError(format!("cannot write {}: {e}", path.display())))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;
    use arca_core::{CatalogRecord, Category, EnrichedRecord, PipelineConfig};

    fn sample_graph() -> DocumentEntityGraph {
        let records = vec![EnrichedRecord {
            record: CatalogRecord {
                signatura: Some("A-1 \"bis\"".to_string()),
                ..Default::default()
            },
            keywords: vec!["Lima".to_string(), "Nicolás de Piérola".to_string()],
            tipos: vec![Category::Lugar, Category::Persona],
            uris: vec![Some("http://vocab.example.org/c/lima".to_string()), None],
        }];
        assemble(&records, &PipelineConfig::default())
    }

    #[test]
    fn test_prefixes_are_bound() {
        let ttl = to_turtle(&sample_graph());
        for prefix in ["@prefix rdf:", "@prefix skos:", "@prefix owl:", "@prefix arca:", "@prefix ent:", "@prefix voc:"] {
            assert!(ttl.contains(prefix), "missing {prefix}");
        }
    }

    #[test]
    fn test_document_and_entity_shapes() {
        let ttl = to_turtle(&sample_graph());

        assert!(ttl.contains("arca:doc_001 rdf:type voc:Documento"));
        assert!(ttl.contains("voc:tienePalabraClave"));
        assert!(ttl.contains("rdf:type voc:Lugar"));
        assert!(ttl.contains("rdf:type voc:Persona"));
        assert!(ttl.contains("skos:prefLabel \"Lima\"@es"));
        assert!(ttl.contains("owl:sameAs <http://vocab.example.org/c/lima>"));
    }

    #[test]
    fn test_literals_are_escaped() {
        let ttl = to_turtle(&sample_graph());
        assert!(ttl.contains("voc:signatura \"A-1 \\\"bis\\\"\""));
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape_literal("a\\b"), "a\\\\b");
        assert_eq!(escape_literal("a\nb"), "a\\nb");
    }

    #[test]
    fn test_document_without_entities_closes_cleanly() {
        let records = vec![EnrichedRecord::new(CatalogRecord::default())];
        let graph = assemble(&records, &PipelineConfig::default());
        let ttl = to_turtle(&graph);
        assert!(ttl.contains("voc:signatura \"SIN_SIGNATURA_0\" .\n"));
        assert!(!ttl.contains("voc:tienePalabraClave"));
    }
}
