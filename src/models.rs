//! Data models for the property analysis crew.
//!
//! This module contains the core data structures used throughout
//! the application for representing property records, agent outputs,
//! and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column holding the unique property identifier.
pub const STOCK_NUMBER: &str = "StockNumber";
pub const ADDRESS: &str = "Property Address";
pub const CITY: &str = "City";
pub const STATE: &str = "State";
pub const ZIP: &str = "Zip";
pub const COUNTY: &str = "County";
pub const COUNTY_NAME: &str = "County Name";
pub const LAND_AREA: &str = "Land Area (AC)";
pub const PRICE: &str = "For Sale Price";

/// A single scalar cell from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Parse a raw CSV cell. Whitespace is trimmed; numbers become `Number`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric view of the cell.
    ///
    /// Text cells are parsed after stripping currency symbols, thousands
    /// separators, percent signs and whitespace, so `"$1,250,000"` reads
    /// as `1250000.0`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
                    .collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            CellValue::Empty => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.0}", n),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Empty => write!(f, "N/A"),
        }
    }
}

/// One row of the property dataset, keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    fields: Vec<(String, CellValue)>,
}

impl PropertyRecord {
    pub fn new(fields: Vec<(String, CellValue)>) -> Self {
        Self { fields }
    }

    /// Look up a cell by exact column name.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, column: &str) -> Option<&mut CellValue> {
        self.fields
            .iter_mut()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Display string for a column, `N/A` when absent or empty.
    pub fn text(&self, column: &str) -> String {
        self.get(column)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::as_number)
    }

    /// All `(column, value)` pairs in file order.
    pub fn fields(&self) -> &[(String, CellValue)] {
        &self.fields
    }

    pub fn stock_number(&self) -> String {
        self.text(STOCK_NUMBER)
    }

    pub fn address(&self) -> String {
        self.text(ADDRESS)
    }

    /// `"<address>, <city>, <state> <zip>"`.
    pub fn location(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.text(ADDRESS),
            self.text(CITY),
            self.text(STATE),
            self.text(ZIP)
        )
    }

    /// Short one-line listing form used by `--list` and `--search`.
    pub fn listing_line(&self) -> String {
        format!(
            "Stock# {} - {}, {}, {}",
            self.stock_number(),
            self.address(),
            self.text(CITY),
            self.text(STATE)
        )
    }
}

/// Outcome of a single agent task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Failed(String),
}

impl TaskStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Output of one agent task, as merged into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Stable task identifier (e.g. `data_analysis`).
    pub task: String,
    /// Human-readable section title.
    pub title: String,
    /// Role title of the agent that produced it.
    pub agent: String,
    /// Generated content, or fallback text when the task failed.
    pub content: String,
    pub status: TaskStatus,
    pub duration_seconds: f64,
}

/// A research source cited in the report appendix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSource {
    pub category: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub relevance: f64,
}

/// Metadata about the analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub stock_number: String,
    pub address: String,
    pub location: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Name of the LLM model used.
    pub model_used: String,
    pub tasks_completed: usize,
    pub tasks_failed: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// Lot development projection shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotEconomics {
    pub acres: f64,
    pub price: f64,
    pub lots_per_acre: f64,
    pub development_cost_per_lot: f64,
    pub total_lots: f64,
    pub development_cost: f64,
    pub total_investment: f64,
    /// All-in cost per lot, absent when the projection has no lots.
    pub cost_per_lot_all_in: Option<f64>,
}

/// The complete property analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    /// Ordered `(label, value)` rows of key property metrics.
    pub snapshot: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub economics: Option<LotEconomics>,
    /// Agent outputs in execution order.
    pub sections: Vec<TaskOutput>,
    pub research_sources: Vec<ResearchSource>,
}

impl AnalysisReport {
    /// Find a section by task identifier.
    pub fn section(&self, task: &str) -> Option<&TaskOutput> {
        self.sections.iter().find(|s| s.task == task)
    }

    pub fn has_failures(&self) -> bool {
        self.metadata.tasks_failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PropertyRecord {
        PropertyRecord::new(vec![
            (STOCK_NUMBER.to_string(), CellValue::Text("12345".to_string())),
            (ADDRESS.to_string(), CellValue::Text("123 Test St".to_string())),
            (CITY.to_string(), CellValue::Text("Austin".to_string())),
            (STATE.to_string(), CellValue::Text("TX".to_string())),
            (ZIP.to_string(), CellValue::Number(78701.0)),
            (LAND_AREA.to_string(), CellValue::Number(1.5)),
            (PRICE.to_string(), CellValue::Text("$500,000".to_string())),
            ("Zoning".to_string(), CellValue::Empty),
        ])
    }

    #[test]
    fn test_cell_parse() {
        assert_eq!(CellValue::parse("  "), CellValue::Empty);
        assert_eq!(CellValue::parse(" 1.5 "), CellValue::Number(1.5));
        assert_eq!(
            CellValue::parse(" R1 "),
            CellValue::Text("R1".to_string())
        );
        // "NaN" and "inf" parse as f64 but are not useful numbers
        assert_eq!(CellValue::parse("NaN"), CellValue::Text("NaN".to_string()));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(78701.0).to_string(), "78701");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Empty.to_string(), "N/A");
    }

    #[test]
    fn test_cell_as_number_strips_currency() {
        assert_eq!(
            CellValue::Text("$1,250,000".to_string()).as_number(),
            Some(1_250_000.0)
        );
        assert_eq!(CellValue::Text("4.2%".to_string()).as_number(), Some(4.2));
        assert_eq!(CellValue::Text("call".to_string()).as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
    }

    #[test]
    fn test_record_accessors() {
        let record = record();
        assert_eq!(record.stock_number(), "12345");
        assert_eq!(record.text("Zoning"), "N/A");
        assert_eq!(record.text("Missing Column"), "N/A");
        assert_eq!(record.number(PRICE), Some(500_000.0));
        assert_eq!(record.location(), "123 Test St, Austin, TX 78701");
        assert_eq!(
            record.listing_line(),
            "Stock# 12345 - 123 Test St, Austin, TX"
        );
    }

    #[test]
    fn test_task_status_serialization() {
        let failed = TaskStatus::Failed("timeout".to_string());
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains("\"failed\""));
        assert!(json.contains("timeout"));
        assert!(TaskStatus::Completed.is_completed());
        assert!(!failed.is_completed());
    }
}
