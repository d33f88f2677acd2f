//! Web research for the Web Researcher agent.
//!
//! Searches run before the crew starts; the agent receives the rendered
//! digest instead of calling tools itself.

pub mod search;
pub mod strategy;

use crate::models::ResearchSource;
use std::fmt::Write as _;

pub use search::DuckDuckGoSearch;
pub use strategy::{Category, LocationContext, ResearchStrategy};

/// One scored search result.
#[derive(Debug, Clone)]
pub struct ResearchFinding {
    pub title: String,
    pub url: String,
    pub source: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub amounts: Vec<String>,
    pub relevance: f64,
}

/// Everything found for one category.
#[derive(Debug, Clone)]
pub struct CategoryResults {
    pub category: Category,
    pub queries: Vec<String>,
    pub findings: Vec<ResearchFinding>,
    pub insights: Vec<String>,
}

/// Cross-category signals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaAnalysis {
    /// Economic findings mentioning a project, development or investment.
    pub detected_projects: usize,
    /// First dollar amounts from economic findings.
    pub mentioned_investments: Vec<String>,
    pub housing_trends: Vec<String>,
}

impl MetaAnalysis {
    pub fn from_categories(categories: &[CategoryResults]) -> Self {
        let mut meta = MetaAnalysis::default();

        for results in categories {
            match results.category {
                Category::EconomicDevelopment => {
                    meta.detected_projects += results
                        .findings
                        .iter()
                        .filter(|f| {
                            let summary = f.summary.to_lowercase();
                            ["project", "development", "investment"]
                                .iter()
                                .any(|t| summary.contains(t))
                        })
                        .count();
                    meta.mentioned_investments.extend(
                        results
                            .findings
                            .iter()
                            .flat_map(|f| f.amounts.iter().cloned())
                            .take(3),
                    );
                }
                Category::HousingMarket => {
                    for finding in &results.findings {
                        let summary = finding.summary.to_lowercase();
                        let trends = [
                            ("affordable", "Focus on affordable housing solutions"),
                            ("shortage", "Housing shortage indicated"),
                            ("growth", "Housing market growth mentioned"),
                        ];
                        for (term, trend) in trends {
                            if summary.contains(term)
                                && !meta.housing_trends.iter().any(|t| t == trend)
                            {
                                meta.housing_trends.push(trend.to_string());
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        meta
    }
}

/// Structured research results for a property location.
#[derive(Debug, Clone, Default)]
pub struct ResearchDigest {
    pub location: LocationContext,
    pub categories: Vec<CategoryResults>,
    pub meta: MetaAnalysis,
}

impl ResearchDigest {
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.findings.is_empty())
    }

    pub fn finding_count(&self) -> usize {
        self.categories.iter().map(|c| c.findings.len()).sum()
    }

    /// Text handed to the Web Researcher.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return format!(
                "No web research results were found for {}. Rely on the property data and general market knowledge.\n",
                self.location.full_location()
            );
        }

        let mut out = String::new();
        if self.location.zip.is_empty() {
            let _ = writeln!(out, "Web research for {}\n", self.location.full_location());
        } else {
            let _ = writeln!(
                out,
                "Web research for {} (ZIP {})\n",
                self.location.full_location(),
                self.location.zip
            );
        }

        for results in &self.categories {
            let _ = writeln!(out, "### {}", results.category.label());
            if !results.queries.is_empty() {
                let _ = writeln!(out, "_Searched: {}_", results.queries.join("; "));
            }
            for insight in &results.insights {
                let _ = writeln!(out, "- Insight: {}", insight);
            }
            for finding in &results.findings {
                let _ = writeln!(
                    out,
                    "- {} ({}, relevance {:.2})",
                    finding.title, finding.source, finding.relevance
                );
                for point in &finding.key_points {
                    let _ = writeln!(out, "  - {}", point);
                }
                if !finding.amounts.is_empty() {
                    let _ = writeln!(out, "  - Amounts mentioned: {}", finding.amounts.join(", "));
                }
            }
            out.push('\n');
        }

        if self.meta.detected_projects > 0 || !self.meta.mentioned_investments.is_empty() {
            let _ = writeln!(
                out,
                "Economic signals: {} development projects mentioned{}",
                self.meta.detected_projects,
                if self.meta.mentioned_investments.is_empty() {
                    String::new()
                } else {
                    format!(
                        ", investments of {}",
                        self.meta.mentioned_investments.join(", ")
                    )
                }
            );
        }
        if !self.meta.housing_trends.is_empty() {
            let _ = writeln!(out, "Housing trends: {}", self.meta.housing_trends.join("; "));
        }

        out
    }

    /// Most relevant sources with a URL, highest relevance first.
    pub fn top_sources(&self, n: usize) -> Vec<ResearchSource> {
        let mut sources: Vec<ResearchSource> = self
            .categories
            .iter()
            .flat_map(|c| {
                c.findings
                    .iter()
                    .filter(|f| !f.url.is_empty())
                    .map(move |f| ResearchSource {
                        category: c.category.label().to_string(),
                        title: f.title.clone(),
                        url: f.url.clone(),
                        source: f.source.clone(),
                        relevance: f.relevance,
                    })
            })
            .collect();

        sources.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

        let mut seen = std::collections::HashSet::new();
        sources.retain(|s| seen.insert(s.url.clone()));
        sources.truncate(n);
        sources
    }
}
