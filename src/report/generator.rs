//! Markdown and JSON report generation.
//!
//! This module renders the merged crew outputs and the deterministic
//! property facts into a single investment report.

use crate::analysis::economics::format_usd;
use crate::models::{
    AnalysisReport, LotEconomics, PropertyRecord, ReportMetadata, ResearchSource, TaskOutput,
    TaskStatus,
};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Sections written from the report writer's outputs, in report order.
const SUMMARY_SECTIONS: [(&str, &str); 3] = [
    ("executive_summary", "executive-summary"),
    ("investment_summary", "investment-summary"),
    ("full_report", "full-analysis-report"),
];

/// Specialist outputs shown under "Agent Findings".
const FINDING_SECTIONS: [&str; 3] = ["data_analysis", "market_research", "financial_analysis"];

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalysisReport) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!(
        "# Property Development Analysis: {}\n\n",
        report.metadata.address
    ));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_snapshot_section(&report.snapshot));

    if let Some(ref economics) = report.economics {
        output.push_str(&generate_economics_section(economics));
    }

    for (task, _) in SUMMARY_SECTIONS {
        if let Some(section) = report.section(task) {
            output.push_str(&generate_task_section("##", section));
        }
    }

    output.push_str(&generate_findings_section(report));
    output.push_str(&generate_sources_section(&report.research_sources));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Stock Number:** {}\n", metadata.stock_number));
    section.push_str(&format!("- **Location:** {}\n", metadata.location));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!(
        "- **Tasks Completed:** {}\n",
        metadata.tasks_completed
    ));
    if metadata.tasks_failed > 0 {
        section.push_str(&format!("- **Tasks Failed:** {}\n", metadata.tasks_failed));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &AnalysisReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Property Snapshot](#property-snapshot)\n");

    if report.economics.is_some() {
        toc.push_str("- [Lot Economics](#lot-economics)\n");
    }

    for (task, anchor) in SUMMARY_SECTIONS {
        if let Some(section) = report.section(task) {
            toc.push_str(&format!("- [{}](#{})\n", section.title, anchor));
        }
    }

    toc.push_str("- [Agent Findings](#agent-findings)\n");

    if !report.research_sources.is_empty() {
        toc.push_str("- [Research Sources](#research-sources)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the property snapshot table.
fn generate_snapshot_section(snapshot: &[(String, String)]) -> String {
    let mut section = String::new();

    section.push_str("## Property Snapshot\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|:---|\n");
    for (label, value) in snapshot {
        section.push_str(&format!("| {} | {} |\n", label, value));
    }
    section.push('\n');

    section
}

/// Generate the lot economics table.
fn generate_economics_section(economics: &LotEconomics) -> String {
    let mut section = String::new();

    section.push_str("## Lot Economics\n\n");
    section.push_str("| Item | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!("| Land Area | {} acres |\n", economics.acres));
    section.push_str(&format!("| Asking Price | {} |\n", format_usd(economics.price)));
    section.push_str(&format!(
        "| Lot Density | {} lots/acre |\n",
        economics.lots_per_acre
    ));
    section.push_str(&format!(
        "| Total Potential Lots | {:.1} |\n",
        economics.total_lots
    ));
    section.push_str(&format!(
        "| Development Cost per Lot | {} |\n",
        format_usd(economics.development_cost_per_lot)
    ));
    section.push_str(&format!(
        "| Total Development Cost | {} |\n",
        format_usd(economics.development_cost)
    ));
    section.push_str(&format!(
        "| **Total Investment** | **{}** |\n",
        format_usd(economics.total_investment)
    ));
    if let Some(per_lot) = economics.cost_per_lot_all_in {
        section.push_str(&format!("| All-in Cost per Lot | {} |\n", format_usd(per_lot)));
    }
    section.push('\n');

    section
}

/// Generate one agent output section under the given heading level.
fn generate_task_section(level: &str, output: &TaskOutput) -> String {
    let mut section = String::new();

    section.push_str(&format!("{} {}\n\n", level, output.title));
    section.push_str(&format!(
        "*Prepared by: {} ({:.1}s)*\n\n",
        output.agent, output.duration_seconds
    ));
    section.push_str(without_title_heading(output.content.trim(), &output.title));
    section.push_str("\n\n");

    if let TaskStatus::Failed(ref reason) = output.status {
        section.push_str(&format!("> ⚠️ **This step failed:** {}\n\n", reason));
    }

    section
}

/// Drop a leading Markdown heading that repeats `title`.
fn without_title_heading<'a>(content: &'a str, title: &str) -> &'a str {
    let (first, rest) = content.split_once('\n').unwrap_or((content, ""));
    if first.starts_with('#') && first.trim_start_matches('#').trim().eq_ignore_ascii_case(title) {
        rest.trim_start()
    } else {
        content
    }
}

/// Generate the specialist findings section.
fn generate_findings_section(report: &AnalysisReport) -> String {
    let mut section = String::new();

    section.push_str("## Agent Findings\n\n");

    let mut any = false;
    for task in FINDING_SECTIONS {
        if let Some(output) = report.section(task) {
            section.push_str(&generate_task_section("###", output));
            any = true;
        }
    }

    if !any {
        section.push_str("No specialist findings were produced.\n\n");
    }

    section
}

/// Generate the research sources appendix.
fn generate_sources_section(sources: &[ResearchSource]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Research Sources\n\n");
    section.push_str("| Source | Category | Relevance |\n");
    section.push_str("|:---|:---|:---:|\n");
    for source in sources {
        section.push_str(&format!(
            "| [{}]({}) | {} | {:.2} |\n",
            escape_table_cell(&source.title),
            source.url,
            source.category,
            source.relevance
        ));
    }
    section.push('\n');

    section
}

fn escape_table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(
        "*Report generated by landcrew. AI-generated analysis; verify figures before investing.*\n",
    );

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate the Markdown comparison report.
pub fn generate_comparison_report(
    records: &[&PropertyRecord],
    comparison: &TaskOutput,
    model_used: &str,
    analysis_date: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    output.push_str("# Property Comparison\n\n");
    output.push_str(&format!(
        "- **Analysis Date:** {}\n",
        analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("- **Model Used:** `{}`\n\n", model_used));

    output.push_str("## Properties\n\n");
    for (i, record) in records.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, record.listing_line()));
    }
    output.push('\n');

    output.push_str(&generate_task_section("##", comparison));
    output.push_str(&generate_footer());

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, STOCK_NUMBER};

    fn task(key: &str, title: &str, status: TaskStatus) -> TaskOutput {
        TaskOutput {
            task: key.to_string(),
            title: title.to_string(),
            agent: "Property Data Analyst".to_string(),
            content: format!("{} content", title),
            status,
            duration_seconds: 1.5,
        }
    }

    fn create_test_report() -> AnalysisReport {
        let metadata = ReportMetadata {
            stock_number: "12345".to_string(),
            address: "123 Test St".to_string(),
            location: "123 Test St, Austin, TX 78701".to_string(),
            analysis_date: Utc::now(),
            model_used: "test-model".to_string(),
            tasks_completed: 2,
            tasks_failed: 1,
            duration_seconds: 30.0,
        };

        AnalysisReport {
            metadata,
            snapshot: vec![
                ("For Sale Price".to_string(), "$2,500,000".to_string()),
                ("Zoning".to_string(), "R1".to_string()),
            ],
            economics: Some(LotEconomics {
                acres: 10.0,
                price: 500_000.0,
                lots_per_acre: 3.5,
                development_cost_per_lot: 55_000.0,
                total_lots: 35.0,
                development_cost: 1_925_000.0,
                total_investment: 2_425_000.0,
                cost_per_lot_all_in: Some(69_285.71),
            }),
            sections: vec![
                task("data_analysis", "Property Data Analysis", TaskStatus::Completed),
                task(
                    "market_research",
                    "Market Research",
                    TaskStatus::Failed("Request timed out after 600s".to_string()),
                ),
                task("executive_summary", "Executive Summary", TaskStatus::Completed),
            ],
            research_sources: vec![ResearchSource {
                category: "Housing Market".to_string(),
                title: "Rents | rising".to_string(),
                url: "https://example.com/rents".to_string(),
                source: "Example".to_string(),
                relevance: 0.85,
            }],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.starts_with("# Property Development Analysis: 123 Test St"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Property Snapshot"));
        assert!(markdown.contains("| Zoning | R1 |"));
        assert!(markdown.contains("## Lot Economics"));
        assert!(markdown.contains("| **Total Investment** | **$2,425,000** |"));
        assert!(markdown.contains("## Executive Summary"));
        assert!(markdown.contains("### Property Data Analysis"));
        assert!(markdown.contains("## Research Sources"));
        assert!(markdown.contains("[Rents \\| rising](https://example.com/rents)"));

        // Executive summary comes before the agent findings
        let summary_at = markdown.find("## Executive Summary").unwrap();
        let findings_at = markdown.find("## Agent Findings").unwrap();
        assert!(summary_at < findings_at);

        // Absent sections are not linked
        assert!(!markdown.contains("(#investment-summary)"));
        assert!(markdown.contains("(#executive-summary)"));
    }

    #[test]
    fn test_repeated_title_heading_is_dropped() {
        let mut report = create_test_report();
        report.sections[2].content =
            "## Executive Summary\nStrong opportunity.\n\n## Risks\nSewer.".to_string();

        let markdown = generate_markdown_report(&report);

        assert_eq!(markdown.matches("## Executive Summary").count(), 1);
        assert!(markdown.contains("## Executive Summary\n\n*Prepared by:"));
        assert!(markdown.contains("Strong opportunity.\n\n## Risks"));

        assert_eq!(without_title_heading("# Other\nBody", "Executive Summary"), "# Other\nBody");
        assert_eq!(without_title_heading("### executive summary", "Executive Summary"), "");
    }

    #[test]
    fn test_failed_section_shows_reason() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("### Market Research"));
        assert!(markdown.contains("> ⚠️ **This step failed:** Request timed out after 600s"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let report = create_test_report();
        let section = generate_metadata_section(&report.metadata);

        assert!(section.contains("12345"));
        assert!(section.contains("test-model"));
        assert!(section.contains("Tasks Failed:** 1"));

        let mut clean = report.metadata.clone();
        clean.tasks_failed = 0;
        assert!(!generate_metadata_section(&clean).contains("Tasks Failed"));
    }

    #[test]
    fn test_report_without_economics_or_sources() {
        let mut report = create_test_report();
        report.economics = None;
        report.research_sources.clear();

        let markdown = generate_markdown_report(&report);
        assert!(!markdown.contains("## Lot Economics"));
        assert!(!markdown.contains("## Research Sources"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"stock_number\""));
        assert!(json.contains("\"sections\""));
        assert!(json.contains("\"failed\""));
        assert!(json.contains("\"total_lots\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["tasks_failed"], 1);
    }

    #[test]
    fn test_generate_comparison_report() {
        let first = PropertyRecord::new(vec![(
            STOCK_NUMBER.to_string(),
            CellValue::Text("12345".to_string()),
        )]);
        let second = PropertyRecord::new(vec![(
            STOCK_NUMBER.to_string(),
            CellValue::Text("67890".to_string()),
        )]);
        let comparison = task("property_comparison", "Property Comparison", TaskStatus::Completed);

        let markdown =
            generate_comparison_report(&[&first, &second], &comparison, "llama3", Utc::now());

        assert!(markdown.starts_with("# Property Comparison"));
        assert!(markdown.contains("1. Stock# 12345"));
        assert!(markdown.contains("2. Stock# 67890"));
        assert!(markdown.contains("Property Comparison content"));
    }
}
