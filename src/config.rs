//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.vitalswarm.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Health export import settings.
    #[serde(default)]
    pub import: ImportConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Waiting-list triage settings.
    #[serde(default)]
    pub triage: TriageConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { verbose: false }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Chat model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds (per call, not per batch).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of attempts per call on transient failure.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            embedding_model: default_embedding_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> usize {
    3
}

/// Health export import settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Path to the health export CSV.
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

fn default_csv_path() -> String {
    "apple_health_export.csv".to_string()
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port for the analysis endpoint.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    4000
}

/// Waiting-list triage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Output file for batch assessment results.
    #[serde(default = "default_triage_output")]
    pub output: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            output: default_triage_output(),
        }
    }
}

fn default_triage_output() -> String {
    "priority_assessment_results.json".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".vitalswarm.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Model settings - always override since they have defaults in CLI
        self.model.name = args.model.clone();
        self.model.ollama_url = args.ollama_url.clone();
        self.model.temperature = args.temperature;

        // Optional settings - only override if explicitly provided
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            self.model.retries = retries;
        }
        if let Some(ref embedding_model) = args.embedding_model {
            self.model.embedding_model = embedding_model.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// The gateway settings implied by this configuration.
    pub fn gateway_config(&self) -> crate::gateway::GatewayConfig {
        crate::gateway::GatewayConfig {
            ollama_url: self.model.ollama_url.clone(),
            chat_model: self.model.name.clone(),
            embedding_model: self.model.embedding_model.clone(),
            temperature: self.model.temperature,
            timeout_seconds: self.model.timeout_seconds,
            retries: self.model.retries,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.timeout_seconds, 30);
        assert_eq!(config.model.retries, 3);
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.triage.output, "priority_assessment_results.json");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[model]
name = "mistral:7b"
temperature = 0.2
timeout_seconds = 60

[import]
csv_path = "export/health.csv"

[server]
port = 8080
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.model.name, "mistral:7b");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.model.timeout_seconds, 60);
        assert_eq!(config.import.csv_path, "export/health.csv");
        assert_eq!(config.server.port, 8080);
        // Untouched sections keep their defaults.
        assert_eq!(config.model.retries, 3);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[import]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[triage]"));
    }

    #[test]
    fn test_gateway_config_mirrors_model_section() {
        let mut config = Config::default();
        config.model.timeout_seconds = 90;
        config.model.name = "qwen2.5:14b".to_string();

        let gateway = config.gateway_config();
        assert_eq!(gateway.timeout_seconds, 90);
        assert_eq!(gateway.chat_model, "qwen2.5:14b");
        assert_eq!(gateway.retries, 3);
    }
}
