//! Report assembly and output.

pub mod generator;

use crate::cli::OutputFormat;
use crate::crew::{CrewRun, PropertyContext};
use crate::models::{AnalysisReport, ReportMetadata, ResearchSource};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

pub use generator::{generate_comparison_report, generate_json_report, generate_markdown_report};

/// File name for comparison reports.
pub const COMPARISON_FILE: &str = "property_comparison.md";

/// Merge the crew outputs and the deterministic facts into a report.
pub fn build_report(
    property: &PropertyContext,
    run: CrewRun,
    model_used: &str,
    research_sources: Vec<ResearchSource>,
    analysis_date: DateTime<Utc>,
) -> AnalysisReport {
    let metadata = ReportMetadata {
        stock_number: property.record.stock_number(),
        address: property.record.address(),
        location: property.record.location(),
        analysis_date,
        model_used: model_used.to_string(),
        tasks_completed: run.completed(),
        tasks_failed: run.failed(),
        duration_seconds: run.duration_seconds,
    };

    AnalysisReport {
        metadata,
        snapshot: property.snapshot.clone(),
        economics: property.economics.clone(),
        sections: run.outputs,
        research_sources,
    }
}

/// Render the report in the requested format.
pub fn render(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(generate_markdown_report(report)),
        OutputFormat::Json => generate_json_report(report),
    }
}

/// `<YYYYmmdd_HHMMSS>_<address slug>_analysis.<ext>`
pub fn report_file_name(timestamp: DateTime<Utc>, address: &str, format: OutputFormat) -> String {
    format!(
        "{}_{}_analysis.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        slugify(address),
        format.extension()
    )
}

/// Lowercase, whitespace to `_`, keep only alphanumerics, `_` and `-`.
pub fn slugify(text: &str) -> String {
    let slug: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_alphanumeric() || c == '_' || c == '-' {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}

/// Write `content` to `dir/name`, creating `dir` if needed.
pub fn save_report(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(name);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    info!("Report saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LotAssumptions;
    use crate::data::PropertyDataset;
    use crate::models::{TaskOutput, TaskStatus};
    use chrono::TimeZone;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("123 Main St."), "123_main_st");
        assert_eq!(slugify("  4/5 Oak-Ridge Rd #2 "), "45_oak-ridge_rd_2");
        assert_eq!(slugify("!!!"), "unknown");
        assert_eq!(slugify(""), "unknown");
    }

    #[test]
    fn test_report_file_name() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            report_file_name(timestamp, "123 Main St", OutputFormat::Markdown),
            "20240309_140507_123_main_st_analysis.md"
        );
        assert_eq!(
            report_file_name(timestamp, "", OutputFormat::Json),
            "20240309_140507_unknown_analysis.json"
        );
    }

    #[test]
    fn test_save_report_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("outputs").join("reports");

        let path = save_report(&dir, "report.md", "# Report").unwrap();

        assert_eq!(path, dir.join("report.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report");
    }

    #[test]
    fn test_build_report() {
        let dataset =
            PropertyDataset::from_csv_str(include_str!("../../fixtures/properties.csv")).unwrap();
        let record = dataset.get("67890").unwrap().clone();
        let property = PropertyContext::new(record, &LotAssumptions::default(), None);

        let run = CrewRun {
            outputs: vec![
                TaskOutput {
                    task: "data_analysis".to_string(),
                    title: "Property Data Analysis".to_string(),
                    agent: "Property Data Analyst".to_string(),
                    content: "ok".to_string(),
                    status: TaskStatus::Completed,
                    duration_seconds: 1.0,
                },
                TaskOutput {
                    task: "market_research".to_string(),
                    title: "Market Research".to_string(),
                    agent: "Web Researcher".to_string(),
                    content: "Market Research not available.".to_string(),
                    status: TaskStatus::Failed("boom".to_string()),
                    duration_seconds: 2.0,
                },
            ],
            duration_seconds: 3.0,
        };

        let report = build_report(&property, run, "llama3", Vec::new(), Utc::now());

        assert_eq!(report.metadata.stock_number, "67890");
        assert_eq!(report.metadata.address, "456 Sample Ave");
        assert_eq!(report.metadata.tasks_completed, 1);
        assert_eq!(report.metadata.tasks_failed, 1);
        assert!(report.has_failures());
        assert!(report.economics.is_some());
        assert_eq!(report.section("data_analysis").unwrap().content, "ok");

        let json = render(&report, OutputFormat::Json).unwrap();
        assert!(json.contains("\"model_used\": \"llama3\""));
        let markdown = render(&report, OutputFormat::Markdown).unwrap();
        assert!(markdown.starts_with("# Property Development Analysis: 456 Sample Ave"));
    }
}
