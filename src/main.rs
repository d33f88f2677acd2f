//! Landcrew - LLM agent crew for land development analysis
//!
//! A CLI tool that looks up a property in a CSV dataset and runs it past a
//! crew of LLM agents on a local Ollama server to produce an investment
//! report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing data, unknown stock number, Ollama unreachable, etc.)
//!   2 - Report written, but one or more agent tasks failed

mod analysis;
mod cli;
mod config;
mod crew;
mod data;
mod llm;
mod models;
mod report;
mod research;

use analysis::LotAssumptions;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, CONFIG_FILE};
use crew::{Crew, PropertyContext};
use data::PropertyDataset;
use llm::{LanguageModel, MockModel, OllamaClient, OllamaConfig};
use models::PropertyRecord;
use research::{DuckDuckGoSearch, ResearchStrategy};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Environment overrides (OLLAMA_URL, LANDCREW_MODEL, ...) may live in .env
    dotenv::dotenv().ok();

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match prepare_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose))?;

    info!("Landcrew v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Data file: {}", config.general.data_file.display());

    std::process::exit(exit_code(run(&args, &config).await));
}

/// Map the run outcome to the process exit code.
fn exit_code(result: Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            1
        }
    }
}

/// Handle --init-config: generate a default .landcrew.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the dataset, model, research and lot assumptions.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Config file (or defaults) with the CLI applied on top.
fn prepare_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    Ok(config)
}

/// Dispatch on the selected mode. Returns the exit code.
async fn run(args: &Args, config: &Config) -> Result<i32> {
    let dataset = PropertyDataset::load(&config.general.data_file).with_context(|| {
        format!(
            "Failed to load property data from {}",
            config.general.data_file.display()
        )
    })?;

    if args.list {
        return handle_list(args, &dataset);
    }

    if let Some(ref query) = args.search {
        return handle_search(query, &dataset);
    }

    if args.compare.is_some() {
        return handle_compare(args, config, &dataset).await;
    }

    match args.stock {
        Some(ref stock) => handle_analysis(stock, args, config, &dataset).await,
        None => bail!("No mode selected"),
    }
}

/// Handle --list: print properties matching the listing filters.
fn handle_list(args: &Args, dataset: &PropertyDataset) -> Result<i32> {
    let filter = args.property_filter();
    let properties: Vec<_> = if filter.is_empty() {
        dataset.properties().iter().collect()
    } else {
        dataset.filter(&filter)
    };

    println!(
        "\n🏘️  Dataset: {} ({} properties, {} columns)\n",
        dataset.path().display(),
        dataset.len(),
        dataset.headers().len()
    );

    if dataset.is_empty() {
        println!("   The dataset has no properties.");
        return Ok(0);
    }

    if properties.is_empty() {
        println!("   No properties match the given filters.");
        return Ok(0);
    }

    for record in properties.iter().take(args.limit) {
        println!("   {}", record.listing_line());
    }

    println!(
        "\n   Showing {} of {} matching properties",
        properties.len().min(args.limit),
        properties.len()
    );
    Ok(0)
}

/// Handle --search: print properties whose location matches the query.
fn handle_search(query: &str, dataset: &PropertyDataset) -> Result<i32> {
    let results = dataset.search(query);

    if results.is_empty() {
        println!("\n🔍 No properties found matching '{}'", query);
        return Ok(0);
    }

    println!(
        "\n🔍 Found {} properties matching '{}':\n",
        results.len(),
        query
    );
    for record in results {
        println!("   {}", record.listing_line());
    }
    Ok(0)
}

/// Handle --stock: run the full crew and write the report.
async fn handle_analysis(
    stock: &str,
    args: &Args,
    config: &Config,
    dataset: &PropertyDataset,
) -> Result<i32> {
    let record = dataset
        .get(stock)
        .with_context(|| format!("Property with stock number '{}' not found", stock.trim()))?
        .clone();

    println!("\n🏗️  Analyzing Stock# {}", record.stock_number());
    println!("   {}", record.location());

    let assumptions = LotAssumptions::from(&config.analysis);

    // Handle --dry-run: build and print prompts, no network calls
    if args.dry_run {
        let property = PropertyContext::new(record, &assumptions, None);
        let model = MockModel::new(&config.model.name);
        let crew = Crew::new(&model, config.analysis.max_context_chars);
        return handle_dry_run(&crew, &property);
    }

    let model = build_model(args, config).await?;
    analyze(record, model.as_ref(), args, config).await
}

/// Research, run the crew with `model` and write the report.
async fn analyze(
    record: PropertyRecord,
    model: &dyn LanguageModel,
    args: &Args,
    config: &Config,
) -> Result<i32> {
    let assumptions = LotAssumptions::from(&config.analysis);

    let research = if config.research.enabled {
        println!("\n🌐 Researching the local market...");
        let search = DuckDuckGoSearch::new(config.research.timeout_seconds)?;
        let strategy =
            ResearchStrategy::new(&search, &config.research, config.general.concurrency);
        let digest = strategy.execute(&record).await;
        println!(
            "   {} findings across {} categories",
            digest.finding_count(),
            digest.categories.len()
        );
        Some(digest)
    } else {
        info!("Web research disabled");
        None
    };

    let sources = match (&research, config.report.include_sources) {
        (Some(digest), true) => digest.top_sources(config.report.max_sources),
        _ => Vec::new(),
    };

    let property = PropertyContext::new(record, &assumptions, research);

    println!("\n🤖 Running agent crew with model {}...\n", model.name());
    let crew = Crew::new(model, config.analysis.max_context_chars).with_progress(!args.quiet);
    let crew_run = crew.run(&property).await;

    println!("\n📝 Generating report...");
    let analysis_date = Utc::now();
    let report = report::build_report(&property, crew_run, model.name(), sources, analysis_date);
    let content = report::render(&report, config.report.format)?;
    let file_name =
        report::report_file_name(analysis_date, &report.metadata.address, config.report.format);
    let path = report::save_report(&config.general.output_dir, &file_name, &content)?;

    println!("\n📊 Analysis Summary:");
    println!("   Tasks completed: {}", report.metadata.tasks_completed);
    if report.metadata.tasks_failed > 0 {
        println!("   Tasks failed: {}", report.metadata.tasks_failed);
    }
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    println!("\n✅ Analysis complete! Report saved to: {}", path.display());

    if report.has_failures() {
        warn!("{} of {} agent tasks failed", report.metadata.tasks_failed, report.sections.len());
        eprintln!(
            "\n⚠️  {} agent task(s) failed. Failing (exit code 2).",
            report.metadata.tasks_failed
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --compare: one comparison task over several properties.
async fn handle_compare(args: &Args, config: &Config, dataset: &PropertyDataset) -> Result<i32> {
    let ids = args.compare_ids();
    let mut records = Vec::with_capacity(ids.len());
    for id in &ids {
        let record = dataset
            .get(id)
            .with_context(|| format!("Property with stock number '{}' not found", id))?;
        records.push(record);
    }

    println!("\n⚖️  Comparing {} properties:", records.len());
    for (i, record) in records.iter().enumerate() {
        println!("   {}. {}", i + 1, record.listing_line());
    }

    let assumptions = LotAssumptions::from(&config.analysis);

    if args.dry_run {
        println!("\n🔍 Dry run: prompt that would be sent (no LLM call)\n");
        println!("{}", crew::pipeline::comparison_prompt(&records, &assumptions));
        println!("\n✅ Dry run complete. No LLM calls were made.");
        return Ok(0);
    }

    let model = build_model(args, config).await?;
    let crew = Crew::new(model.as_ref(), config.analysis.max_context_chars)
        .with_progress(!args.quiet);

    println!();
    let comparison = crew.compare(&records, &assumptions).await?;

    let content =
        report::generate_comparison_report(&records, &comparison, model.name(), Utc::now());
    let path = report::save_report(
        &config.general.output_dir,
        report::COMPARISON_FILE,
        &content,
    )?;

    println!("\n✅ Comparison complete! Report saved to: {}", path.display());
    Ok(0)
}

/// Handle --dry-run: print every prompt the crew would send.
fn handle_dry_run(crew: &Crew<'_>, property: &PropertyContext) -> Result<i32> {
    println!("\n🔍 Dry run: prompts that would be sent (no LLM or web calls)\n");

    for preview in crew.preview(property) {
        println!("==================== {} ====================", preview.kind.title());
        println!("[system]\n{}\n", preview.system);
        println!("[user]\n{}\n", preview.prompt);
    }

    println!("✅ Dry run complete. No LLM calls were made.");
    Ok(0)
}

/// Create the language model: the mock, or a checked Ollama client.
async fn build_model(args: &Args, config: &Config) -> Result<Box<dyn LanguageModel>> {
    if args.mock {
        println!("\n🤖 Using offline mock model");
        return Ok(Box::new(MockModel::new(&config.model.name)));
    }

    println!("\n🤖 Connecting to Ollama...");
    println!("   Model: {}", config.model.name);
    println!("   Ollama: {}", config.model.ollama_url);
    println!("   Timeout: {}s", config.model.timeout_seconds);

    let client = OllamaClient::new(OllamaConfig::from(&config.model))?;
    client
        .health_check()
        .await
        .context("Ollama health check failed")?;
    client
        .ensure_model(config.model.pull_missing)
        .await
        .with_context(|| format!("Model '{}' is not usable", client.config().model_name))?;

    Ok(Box::new(client))
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems go to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use llm::{LlmError, LlmResult};
    use std::path::PathBuf;

    /// Fails the task whose heading contains `fail_on`.
    struct FailingModel {
        fail_on: &'static str,
    }

    #[async_trait::async_trait]
    impl LanguageModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _system: &str, prompt: &str) -> LlmResult<String> {
            let heading = prompt.lines().next().unwrap_or_default();
            if heading.contains(self.fail_on) {
                return Err(LlmError::Connect("connection refused".to_string()));
            }
            Ok(format!("Output for {}", heading))
        }
    }

    /// Fixture dataset copied into `dir`, plus the report directory.
    fn workspace(dir: &Path) -> (PathBuf, PathBuf) {
        let data = dir.join("properties.csv");
        std::fs::write(&data, include_str!("../fixtures/properties.csv")).unwrap();
        (data, dir.join("reports"))
    }

    fn args_for(stock: &str, data: &Path, output: &Path) -> Args {
        Args::try_parse_from([
            "landcrew",
            "--stock",
            stock,
            "--mock",
            "--no-web",
            "--quiet",
            "--data",
            data.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
        ])
        .unwrap()
    }

    fn reports_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_mock_analysis_writes_report() {
        let temp = tempfile::tempdir().unwrap();
        let (data, output) = workspace(temp.path());
        let args = args_for("12345", &data, &output);
        let config = prepare_config(&args).unwrap();
        assert!(!config.research.enabled);

        assert_eq!(exit_code(run(&args, &config).await), 0);

        let reports = reports_in(&output);
        assert_eq!(reports.len(), 1);
        let name = reports[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("_123_test_st_analysis.md"));

        let content = std::fs::read_to_string(&reports[0]).unwrap();
        assert!(content.starts_with("# Property Development Analysis: 123 Test St"));
        assert!(!content.contains("This step failed"));
    }

    #[tokio::test]
    async fn test_unknown_stock_number_exits_one() {
        let temp = tempfile::tempdir().unwrap();
        let (data, output) = workspace(temp.path());
        let args = args_for("99999", &data, &output);
        let config = prepare_config(&args).unwrap();

        assert_eq!(exit_code(run(&args, &config).await), 1);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_data_file_exits_one() {
        let temp = tempfile::tempdir().unwrap();
        let output = temp.path().join("reports");
        let args = args_for("12345", &temp.path().join("missing.csv"), &output);
        let config = prepare_config(&args).unwrap();

        assert_eq!(exit_code(run(&args, &config).await), 1);
    }

    #[tokio::test]
    async fn test_failed_task_still_writes_report_and_exits_two() {
        let temp = tempfile::tempdir().unwrap();
        let (data, output) = workspace(temp.path());
        let args = args_for("12345", &data, &output);
        let config = prepare_config(&args).unwrap();

        let dataset = PropertyDataset::load(&data).unwrap();
        let record = dataset.get("12345").unwrap().clone();
        let model = FailingModel {
            fail_on: "Market Research",
        };

        let code = exit_code(analyze(record, &model, &args, &config).await);
        assert_eq!(code, 2);

        let reports = reports_in(&output);
        assert_eq!(reports.len(), 1);
        let content = std::fs::read_to_string(&reports[0]).unwrap();
        assert!(content.contains("This step failed"));
        assert!(content.contains("Market Research not available."));
    }
}
