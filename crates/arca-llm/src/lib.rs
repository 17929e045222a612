//! ARCA LLM - Inference provider implementations
//!
//! Everything the pipeline asks a language model for goes through the
//! `InferenceProvider` trait defined in `arca-core`. This crate supplies:
//! - HTTP chat clients for OpenAI-compatible and Ollama endpoints
//! - The prompt construction and lenient response parsing for the three
//!   capabilities (date inference, keyword extraction, classification)
//! - A per-run memo that pins each normalized phrase to one category

pub mod client;
pub mod memo;
pub mod provider;

pub use client::{create_text_generator, OllamaClient, OpenAiClient, TextGenerator};
pub use memo::MemoizedProvider;
pub use provider::InferenceClient;

use arca_core::{LlmConfig, Result};

/// Build the full provider stack from configuration: a chat client wrapped
/// in the prompting layer wrapped in the classification memo.
pub fn create_provider(config: &LlmConfig) -> Result<MemoizedProvider<InferenceClient>> {
    let generator = create_text_generator(config)?;
    Ok(MemoizedProvider::new(InferenceClient::new(generator)))
}
