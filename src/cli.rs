//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{ArgGroup, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Landcrew - LLM agent crew for property development analysis
///
/// Looks up a property in a CSV dataset and runs it past a data analyst,
/// a web researcher, a market analyst and a report writer backed by a
/// local Ollama model. The result is a Markdown or JSON investment report.
///
/// Examples:
///   landcrew --list
///   landcrew --list --state TX --min-acres 20
///   landcrew --search "Austin"
///   landcrew --stock 12345
///   landcrew --stock 12345 --model llama3.1:8b --format json
///   landcrew --stock 12345 --mock --no-web
///   landcrew --compare 12345,67890
///   landcrew --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["list", "search", "stock", "compare", "init_config"]),
))]
pub struct Args {
    /// List available properties
    #[arg(long)]
    pub list: bool,

    /// Search properties by address, city, state, zip or county
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Analyze the property with the given stock number
    #[arg(long, value_name = "NUM")]
    pub stock: Option<String>,

    /// Compare two or more properties (comma-separated stock numbers)
    #[arg(long, value_name = "NUMS", value_delimiter = ',')]
    pub compare: Option<Vec<String>>,

    /// Generate a default .landcrew.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Property dataset CSV file
    ///
    /// Default: from config or DATA/master.csv
    #[arg(long, value_name = "CSV", env = "LANDCREW_DATA")]
    pub data: Option<PathBuf>,

    /// Ollama model to use for the agents
    #[arg(short, long, env = "LANDCREW_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long, env = "CREW_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Request timeout in seconds for each agent call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory reports are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Number of properties shown by --list
    #[arg(long, default_value = "20", value_name = "COUNT")]
    pub limit: usize,

    /// Only list properties in this state
    #[arg(long, value_name = "STATE")]
    pub state: Option<String>,

    /// Only list properties in these cities (comma-separated)
    #[arg(long, value_name = "CITIES", value_delimiter = ',')]
    pub city: Option<Vec<String>>,

    /// Only list properties in these counties (comma-separated)
    #[arg(long, value_name = "COUNTIES", value_delimiter = ',')]
    pub county: Option<Vec<String>>,

    /// Minimum land area in acres for --list
    #[arg(long, value_name = "ACRES")]
    pub min_acres: Option<f64>,

    /// Maximum land area in acres for --list
    #[arg(long, value_name = "ACRES")]
    pub max_acres: Option<f64>,

    /// Minimum asking price for --list
    #[arg(long, value_name = "USD")]
    pub min_price: Option<f64>,

    /// Maximum asking price for --list
    #[arg(long, value_name = "USD")]
    pub max_price: Option<f64>,

    /// Use the offline mock model instead of Ollama
    #[arg(long)]
    pub mock: bool,

    /// Skip web research
    #[arg(long)]
    pub no_web: bool,

    /// Print the agent prompts without calling the model
    #[arg(long)]
    pub dry_run: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .landcrew.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
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

        if let Some(ref stock) = self.stock {
            if stock.trim().is_empty() {
                return Err("Stock number must not be empty".to_string());
            }
        }

        if let Some(ref ids) = self.compare {
            let non_empty = ids.iter().filter(|id| !id.trim().is_empty()).count();
            if non_empty < 2 {
                return Err("--compare needs at least two stock numbers".to_string());
            }
        }

        // Validate Ollama URL format (not needed for mock or dry runs)
        if let Some(ref url) = self.ollama_url {
            if !self.mock
                && !self.dry_run
                && !url.starts_with("http://")
                && !url.starts_with("https://")
            {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate temperature range
        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.limit == 0 {
            return Err("Limit must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Listing filter built from the --list options.
    pub fn property_filter(&self) -> crate::data::PropertyFilter {
        crate::data::PropertyFilter {
            min_acres: self.min_acres,
            max_acres: self.max_acres,
            min_price: self.min_price,
            max_price: self.max_price,
            state: self.state.clone(),
            cities: trimmed(self.city.as_deref()),
            counties: trimmed(self.county.as_deref()),
        }
    }

    /// Stock numbers given to --compare, trimmed and without blanks.
    pub fn compare_ids(&self) -> Vec<String> {
        trimmed(self.compare.as_deref())
    }
}

/// Comma-split values, trimmed and without blanks.
fn trimmed(values: Option<&[String]>) -> Vec<String> {
    values
        .unwrap_or_default()
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
