//! Crew tasks and how their prompts are assembled.

use super::agents::AgentRole;
use super::prompts;
use super::PropertyContext;
use crate::models::TaskOutput;
use std::fmt::Write as _;

/// The analysis steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    DataAnalysis,
    MarketResearch,
    FinancialAnalysis,
    FullReport,
    ExecutiveSummary,
    InvestmentSummary,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::DataAnalysis,
        TaskKind::MarketResearch,
        TaskKind::FinancialAnalysis,
        TaskKind::FullReport,
        TaskKind::ExecutiveSummary,
        TaskKind::InvestmentSummary,
    ];

    /// Stable identifier used in reports.
    pub fn key(&self) -> &'static str {
        match self {
            TaskKind::DataAnalysis => "data_analysis",
            TaskKind::MarketResearch => "market_research",
            TaskKind::FinancialAnalysis => "financial_analysis",
            TaskKind::FullReport => "full_report",
            TaskKind::ExecutiveSummary => "executive_summary",
            TaskKind::InvestmentSummary => "investment_summary",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TaskKind::DataAnalysis => "Property Data Analysis",
            TaskKind::MarketResearch => "Market Research",
            TaskKind::FinancialAnalysis => "Financial Analysis",
            TaskKind::FullReport => "Full Analysis Report",
            TaskKind::ExecutiveSummary => "Executive Summary",
            TaskKind::InvestmentSummary => "Investment Summary",
        }
    }

    pub fn role(&self) -> AgentRole {
        match self {
            TaskKind::DataAnalysis => AgentRole::DataAnalyst,
            TaskKind::MarketResearch => AgentRole::WebResearcher,
            TaskKind::FinancialAnalysis => AgentRole::MarketAnalyst,
            TaskKind::FullReport | TaskKind::ExecutiveSummary | TaskKind::InvestmentSummary => {
                AgentRole::ReportWriter
            }
        }
    }

    /// Earlier tasks whose output this task receives.
    pub fn context(&self) -> &'static [TaskKind] {
        match self {
            TaskKind::DataAnalysis => &[],
            TaskKind::MarketResearch => &[TaskKind::DataAnalysis],
            TaskKind::FinancialAnalysis => &[TaskKind::DataAnalysis, TaskKind::MarketResearch],
            TaskKind::FullReport => &[
                TaskKind::DataAnalysis,
                TaskKind::MarketResearch,
                TaskKind::FinancialAnalysis,
            ],
            TaskKind::ExecutiveSummary => &[
                TaskKind::DataAnalysis,
                TaskKind::MarketResearch,
                TaskKind::FinancialAnalysis,
                TaskKind::FullReport,
            ],
            TaskKind::InvestmentSummary => {
                &[TaskKind::FinancialAnalysis, TaskKind::ExecutiveSummary]
            }
        }
    }

    pub fn expected_output(&self) -> &'static str {
        match self {
            TaskKind::DataAnalysis => {
                "A Markdown analysis covering location, demographics, affordability, \
                 site characteristics and the top three strengths and concerns."
            }
            TaskKind::MarketResearch => {
                "A Markdown market research brief covering economic development, housing \
                 market, infrastructure, government policy and community factors, citing \
                 sources where available."
            }
            TaskKind::FinancialAnalysis => {
                "A Markdown financial analysis with lot economics, comparable pricing, \
                 absorption expectations, key risks and a go / no-go view."
            }
            TaskKind::FullReport => {
                "A complete Markdown investment report with sections for property overview, \
                 market analysis, development potential, financial analysis, risks and \
                 recommendations."
            }
            TaskKind::ExecutiveSummary => {
                "A one-page Markdown executive summary ending in a clear recommendation."
            }
            TaskKind::InvestmentSummary => {
                "A short Markdown investment summary with opportunity, strengths, risks and \
                 a verdict."
            }
        }
    }
}

/// A task ready to run: its kind and the filled-in description.
#[derive(Debug, Clone)]
pub struct CrewTask {
    pub kind: TaskKind,
    pub description: String,
}

impl CrewTask {
    pub fn build(kind: TaskKind, property: &PropertyContext) -> Self {
        let description = match kind {
            TaskKind::DataAnalysis => prompts::data_analysis(property),
            TaskKind::MarketResearch => prompts::market_research(property),
            TaskKind::FinancialAnalysis => prompts::financial_analysis(property),
            TaskKind::FullReport => prompts::full_report(property),
            TaskKind::ExecutiveSummary => prompts::executive_summary(property),
            TaskKind::InvestmentSummary => prompts::investment_summary(property),
        };
        Self { kind, description }
    }

    /// Full user prompt: heading, description, expected output and the
    /// outputs of the context tasks that have run so far.
    pub fn prompt(&self, completed: &[TaskOutput], max_context_chars: usize) -> String {
        let mut prompt = task_prompt(
            self.kind.title(),
            &self.description,
            self.kind.expected_output(),
        );

        for dependency in self.kind.context() {
            let Some(output) = completed.iter().find(|o| o.task == dependency.key()) else {
                continue;
            };
            let _ = write!(prompt, "\n\n## Context: {}\n", dependency.title());
            if output.status.is_completed() {
                prompt.push_str(&truncate_chars(&output.content, max_context_chars));
            } else {
                let _ = write!(
                    prompt,
                    "The {} step failed, so this input is unavailable. Work from the other context.",
                    dependency.title()
                );
            }
        }

        prompt
    }
}

/// `# Task:` heading, description and expected output.
pub fn task_prompt(title: &str, description: &str, expected_output: &str) -> String {
    format!(
        "# Task: {}\n\n{}\n\n## Expected Output\n{}",
        title,
        description.trim(),
        expected_output
    )
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}\n[... truncated]", &text[..byte_index]),
        None => text.to_string(),
    }
}
