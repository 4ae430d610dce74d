//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// VitalSwarm - multi-agent LLM analyzer for personal health exports
/// and clinical waiting lists
///
/// Runs a roster of specialist AI agents concurrently over your data
/// (one model call per specialty) and merges their findings into a
/// single report or priority recommendation. Uses a local Ollama
/// instance; nothing leaves your machine.
///
/// Examples:
///   vitalswarm analyze --input apple_health_export.csv
///   vitalswarm analyze --format json --output report.json
///   vitalswarm serve --port 4000
///   vitalswarm triage --waiting-list waiting_list.json
///   vitalswarm --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Ollama chat model to use for the specialist agents
    ///
    /// Can also be set via VITALSWARM_MODEL env var or .vitalswarm.toml config.
    #[arg(
        short,
        long,
        default_value = "llama3.2:latest",
        env = "VITALSWARM_MODEL",
        global = true
    )]
    pub model: String,

    /// Ollama embedding model for document ingestion
    #[arg(long, value_name = "MODEL", global = true)]
    pub embedding_model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(
        long,
        default_value = "http://localhost:11434",
        env = "OLLAMA_URL",
        global = true
    )]
    pub ollama_url: String,

    /// Path to configuration file
    ///
    /// If not specified, looks for .vitalswarm.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Temperature for LLM responses (0.0 - 1.0)
    ///
    /// Lower values produce more consistent/deterministic output
    #[arg(long, default_value = "0.1", global = true)]
    pub temperature: f32,

    /// Request timeout in seconds (per model call)
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Attempts per model call on transient failure
    #[arg(long, value_name = "COUNT", global = true)]
    pub retries: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .vitalswarm.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze a health export with the specialist agent roster
    Analyze {
        /// Health export CSV to analyze (defaults to the configured path)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Serve the analysis endpoint over HTTP
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },

    /// Re-prioritize a clinical waiting list in batch
    Triage {
        /// Waiting-list JSON file
        #[arg(short, long, value_name = "FILE")]
        waiting_list: PathBuf,

        /// Optional per-patient health trends JSON file
        #[arg(long, value_name = "FILE")]
        trends: Option<PathBuf>,

        /// Output file for the assessment results
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Output format for the analysis report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A subcommand is required (analyze, serve, or triage)".to_string());
        }

        // Validate Ollama URL format
        if !self.ollama_url.starts_with("http://") && !self.ollama_url.starts_with("https://") {
            return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
        }

        // Validate temperature range
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err("Temperature must be between 0.0 and 1.0".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Validate retries if provided
        if let Some(retries) = self.retries {
            if retries == 0 {
                return Err("Retries must be at least 1".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(Command::Triage { ref waiting_list, .. }) = self.command {
            if !waiting_list.exists() {
                return Err(format!(
                    "Waiting-list file does not exist: {}",
                    waiting_list.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
