//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.landcrew.toml` files.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".landcrew.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Web research settings.
    #[serde(default)]
    pub research: ResearchConfig,

    /// Deterministic analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Property dataset CSV.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Directory reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of concurrent web searches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            output_dir: default_output_dir(),
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("DATA/master.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs/reports")
}

fn default_concurrency() -> usize {
    3
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Ollama model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries on failure.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Delay between retries in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,

    /// Pull the model through Ollama when it is not installed.
    #[serde(default = "default_true")]
    pub pull_missing: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_delay_seconds: default_retry_delay(),
            pull_missing: true,
        }
    }
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_timeout() -> u64 {
    600 // 8B models on CPU can take minutes per section
}

fn default_retries() -> usize {
    3
}

fn default_retry_delay() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

/// Web research settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Run web searches before the research task.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Query templates used per category.
    #[serde(default = "default_max_queries")]
    pub max_queries_per_category: usize,

    /// Hits kept per query.
    #[serde(default = "default_max_results")]
    pub max_results_per_query: usize,

    /// Search request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_queries_per_category: default_max_queries(),
            max_results_per_query: default_max_results(),
            timeout_seconds: default_search_timeout(),
        }
    }
}

fn default_max_queries() -> usize {
    3
}

fn default_max_results() -> usize {
    3
}

fn default_search_timeout() -> u64 {
    15
}

/// Deterministic analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Lot density used for the lot projection.
    #[serde(default = "default_lots_per_acre")]
    pub lots_per_acre: f64,

    /// Flat development cost per lot in USD.
    #[serde(default = "default_cost_per_lot")]
    pub development_cost_per_lot: f64,

    /// Maximum characters of each earlier output passed as task context.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lots_per_acre: default_lots_per_acre(),
            development_cost_per_lot: default_cost_per_lot(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

fn default_lots_per_acre() -> f64 {
    3.5
}

fn default_cost_per_lot() -> f64 {
    55_000.0
}

fn default_max_context_chars() -> usize {
    6000
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Include the research sources appendix.
    #[serde(default = "default_true")]
    pub include_sources: bool,

    /// Maximum sources listed in the appendix.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_sources: true,
            max_sources: default_max_sources(),
        }
    }
}

fn default_max_sources() -> usize {
    10
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
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. Only
    /// values the user actually supplied (flag or environment) override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.general.data_file = data.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }

        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if args.no_web {
            self.research.enabled = false;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
