//! Prompt construction and response parsing for the inference capabilities
//!
//! Turns the raw text-generation backend into the narrow
//! [`InferenceProvider`] interface the pipeline consumes. Prompts constrain
//! the output shapes; parsing is lenient about the prose models wrap around
//! structured answers.

use async_trait::async_trait;
use serde::Deserialize;

use arca_core::{ArcaError, InferenceProvider, Result, ScoredPhrase};

use crate::client::TextGenerator;

/// Inference provider backed by a chat endpoint
pub struct InferenceClient {
    generator: Box<dyn TextGenerator>,
}

impl InferenceClient {
    /// Wrap a text generator
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn date_prompt(text: &str) -> String {
        format!(
            "Interpreta esta expresión de fecha histórica y conviértela en un rango.\n\
             Responde EXACTAMENTE dos fechas ISO 8601 (AAAA-MM-DD) separadas por una coma,\n\
             sin ningún otro texto. Si la expresión no contiene fecha alguna, responde 'fecha inválida'.\n\
             Expresión: {text}\n\
             Respuesta:"
        )
    }

    fn keywords_prompt(text: &str, max_phrases: usize) -> String {
        format!(
            "Extrae hasta {max_phrases} frases clave (entidades: personas, lugares, \
             instituciones, eventos) del siguiente texto de catálogo archivístico.\n\
             Responde SOLO un arreglo JSON de objetos {{\"phrase\": ..., \"score\": ...}} \
             ordenado por relevancia descendente.\n\
             Texto: {text}\n\
             JSON:"
        )
    }

    fn classify_prompt(phrase: &str) -> String {
        format!(
            "Clasifica la siguiente frase en UNA de estas categorías: \
             persona, lugar, institucion, evento, otro.\n\
             Responde únicamente con la categoría.\n\
             Frase: {phrase}\n\
             Categoría:"
        )
    }
}

#[async_trait]
impl InferenceProvider for InferenceClient {
    async fn infer_date_range(&self, text: &str) -> Result<String> {
        let response = self.generator.generate(&Self::date_prompt(text)).await?;
        Ok(response.trim().to_string())
    }

    async fn extract_keywords(&self, text: &str, max_phrases: usize) -> Result<Vec<ScoredPhrase>> {
        let response = self
            .generator
            .generate(&Self::keywords_prompt(text, max_phrases))
            .await?;

        let mut phrases = parse_scored_phrases(&response)?;
        phrases.truncate(max_phrases);
        Ok(phrases)
    }

    async fn classify(&self, phrase: &str) -> Result<String> {
        let response = self.generator.generate(&Self::classify_prompt(phrase)).await?;

        // First word only; models sometimes append an explanation
        let token = response
            .trim()
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();

        if token.is_empty() {
            return Err(ArcaError::LlmError("empty classification response".to_string()));
        }
        Ok(token)
    }
}

/// Wire shape for extracted keywords
#[derive(Debug, Deserialize)]
struct WirePhrase {
    phrase: String,
    #[serde(default)]
    score: f32,
}

/// Parse a JSON array of scored phrases out of a model response, tolerating
/// prose before and after the array.
pub fn parse_scored_phrases(response: &str) -> Result<Vec<ScoredPhrase>> {
    let start = response.find('[');
    let end = response.rfind(']');

    let json = match (start, end) {
        (Some(s), Some(e)) if e > s => &response[s..=e],
        _ => {
            return Err(ArcaError::LlmError(
                "no JSON array in keyword response".to_string(),
            ))
        }
    };

    let wire: Vec<WirePhrase> = serde_json::from_str(json)
        .map_err(|e| ArcaError::LlmError(format!("malformed keyword JSON: {e}")))?;

    Ok(wire
        .into_iter()
        .filter(|w| !w.phrase.trim().is_empty())
        .map(|w| ScoredPhrase {
            phrase: w.phrase,
            score: w.score,
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
