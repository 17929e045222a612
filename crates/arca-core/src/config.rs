//! ARCA Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for local runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Enrichment pipeline knobs
    pub pipeline: PipelineConfig,

    /// Controlled vocabulary source
    pub thesaurus: ThesaurusConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // LLM
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider.parse()?;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.llm.openai_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.llm.openai_base_url = Some(url);
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            config.llm.ollama_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.llm.model = model;
        }

        // Pipeline
        if let Ok(base) = std::env::var("ARCA_BASE_URI") {
            config.pipeline.base_uri = base;
        }
        if let Ok(threshold) = std::env::var("ARCA_FUZZY_THRESHOLD") {
            config.pipeline.fuzzy_threshold =
                threshold.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "ARCA_FUZZY_THRESHOLD".to_string(),
                    value: threshold,
                })?;
        }

        // Thesaurus
        if let Ok(path) = std::env::var("ARCA_THESAURUS_PATH") {
            config.thesaurus.path = Some(PathBuf::from(path));
        }
        if let Ok(lang) = std::env::var("ARCA_THESAURUS_LANG") {
            config.thesaurus.language = lang;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        if env_config.llm.provider != LlmConfig::default().provider {
            self.llm.provider = env_config.llm.provider;
        }
        if env_config.llm.model != LlmConfig::default().model {
            self.llm.model = env_config.llm.model;
        }

        // Always use env for sensitive values
        if env_config.llm.openai_api_key.is_some() {
            self.llm.openai_api_key = env_config.llm.openai_api_key;
        }

        Ok(self)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider to use
    pub provider: LlmProvider,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL (for compatible APIs)
    pub openai_base_url: Option<String>,

    /// Ollama server URL
    pub ollama_url: String,

    /// Model name to use
    pub model: String,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            openai_api_key: None,
            openai_base_url: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 256,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Ollama,
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Enrichment pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum keywords kept per record
    pub max_keywords: usize,

    /// Lower bound for a bare-number phrase interpreted as a year
    pub min_year: i32,

    /// Upper bound for a bare-number phrase interpreted as a year
    pub max_year: i32,

    /// Minimum fuzzy-match score (0-100) to accept a thesaurus candidate
    pub fuzzy_threshold: f64,

    /// Phrases rejected outright when they are the whole keyword
    pub stop_terms: Vec<String>,

    /// Namespace root for catalog, entity, and vocabulary URIs
    pub base_uri: String,

    /// Language tag attached to entity labels in the output graph
    pub label_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_keywords: 3,
            min_year: 1400,
            max_year: 2100,
            fuzzy_threshold: 90.0,
            stop_terms: [
                "documento",
                "carta",
                "expediente",
                "escritura",
                "testimonio",
                "papel",
                "folio",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            base_uri: "http://arca.example.org/".to_string(),
            label_language: "es".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Namespace for document nodes
    pub fn catalog_namespace(&self) -> String {
        format!("{}catalogo/", self.base_uri)
    }

    /// Namespace for entity nodes
    pub fn entity_namespace(&self) -> String {
        format!("{}entidad/", self.base_uri)
    }

    /// Namespace for vocabulary terms (types and predicates)
    pub fn vocab_namespace(&self) -> String {
        format!("{}vocab/", self.base_uri)
    }
}

/// Controlled vocabulary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThesaurusConfig {
    /// Path to the concept file (JSON)
    pub path: Option<PathBuf>,

    /// Working language for label selection
    pub language: String,
}

impl Default for ThesaurusConfig {
    fn default() -> Self {
        Self {
            path: None,
            language: "es".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.max_keywords, 3);
        assert_eq!(config.pipeline.fuzzy_threshold, 90.0);
        assert_eq!(config.thesaurus.language, "es");
        assert_eq!(config.pipeline.stop_terms.len(), 7);
    }

    #[test]
    fn test_llm_provider_parse() {
        assert_eq!(
            "openai".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAI
        );
        assert_eq!(
            "ollama".parse::<LlmProvider>().unwrap(),
            LlmProvider::Ollama
        );
        assert!("invalid".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_namespaces() {
        let config = PipelineConfig::default();
        assert!(config.catalog_namespace().ends_with("catalogo/"));
        assert!(config.entity_namespace().ends_with("entidad/"));
        assert!(config.vocab_namespace().ends_with("vocab/"));
    }
}
