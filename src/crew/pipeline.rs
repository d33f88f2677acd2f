//! Sequential crew execution.
//!
//! Tasks run one after another; each task sees the outputs of the tasks it
//! declares as context. A failed task leaves a fallback section behind and
//! the crew moves on.

use super::agents::AgentRole;
use super::prompts;
use super::tasks::{task_prompt, CrewTask, TaskKind};
use super::PropertyContext;
use crate::analysis::LotAssumptions;
use crate::llm::LanguageModel;
use crate::models::{PropertyRecord, TaskOutput, TaskStatus};
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const COMPARISON_KEY: &str = "property_comparison";
const COMPARISON_TITLE: &str = "Property Comparison";
const COMPARISON_EXPECTED: &str =
    "A Markdown comparison table with per-criterion scores, weighted totals and a ranked recommendation.";

/// Outputs of a full crew run.
#[derive(Debug, Clone)]
pub struct CrewRun {
    pub outputs: Vec<TaskOutput>,
    pub duration_seconds: f64,
}

impl CrewRun {
    pub fn completed(&self) -> usize {
        self.outputs.iter().filter(|o| o.status.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outputs.len() - self.completed()
    }
}

/// A prompt that would be sent, shown by `--dry-run`.
#[derive(Debug, Clone)]
pub struct TaskPreview {
    pub kind: TaskKind,
    pub system: String,
    pub prompt: String,
}

/// Runs crew tasks against a language model.
pub struct Crew<'a> {
    model: &'a dyn LanguageModel,
    max_context_chars: usize,
    show_progress: bool,
}

impl<'a> Crew<'a> {
    pub fn new(model: &'a dyn LanguageModel, max_context_chars: usize) -> Self {
        Self {
            model,
            max_context_chars,
            show_progress: false,
        }
    }

    /// Show a spinner per task on the terminal.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run every task in order.
    pub async fn run(&self, property: &PropertyContext) -> CrewRun {
        let start = Instant::now();
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(TaskKind::ALL.len());

        info!(
            "Starting crew for Stock# {} with model {}",
            property.record.stock_number(),
            self.model.name()
        );

        for kind in TaskKind::ALL {
            let task = CrewTask::build(kind, property);
            let prompt = task.prompt(&outputs, self.max_context_chars);
            let output = self.execute(kind.role(), kind.key(), kind.title(), &prompt).await;
            outputs.push(output);
        }

        let run = CrewRun {
            outputs,
            duration_seconds: start.elapsed().as_secs_f64(),
        };

        info!(
            "Crew finished in {:.1}s: {} completed, {} failed",
            run.duration_seconds,
            run.completed(),
            run.failed()
        );

        run
    }

    /// Compare two or more properties in a single Data Analyst task.
    pub async fn compare(
        &self,
        records: &[&PropertyRecord],
        assumptions: &LotAssumptions,
    ) -> Result<TaskOutput> {
        if records.len() < 2 {
            bail!(
                "At least two properties are needed for a comparison, got {}",
                records.len()
            );
        }

        let prompt = comparison_prompt(records, assumptions);
        let output = self
            .execute(AgentRole::DataAnalyst, COMPARISON_KEY, COMPARISON_TITLE, &prompt)
            .await;

        if let TaskStatus::Failed(reason) = &output.status {
            bail!("Property comparison failed: {}", reason);
        }

        Ok(output)
    }

    /// Prompts the crew would send, without calling the model.
    ///
    /// Context sections hold placeholders since no task has run.
    pub fn preview(&self, property: &PropertyContext) -> Vec<TaskPreview> {
        let placeholders: Vec<TaskOutput> = TaskKind::ALL
            .iter()
            .map(|kind| TaskOutput {
                task: kind.key().to_string(),
                title: kind.title().to_string(),
                agent: kind.role().title().to_string(),
                content: format!("<output of {}>", kind.title()),
                status: TaskStatus::Completed,
                duration_seconds: 0.0,
            })
            .collect();

        TaskKind::ALL
            .iter()
            .map(|&kind| TaskPreview {
                kind,
                system: kind.role().system_prompt(),
                prompt: CrewTask::build(kind, property).prompt(&placeholders, self.max_context_chars),
            })
            .collect()
    }

    async fn execute(&self, role: AgentRole, key: &str, title: &str, prompt: &str) -> TaskOutput {
        let spinner = self.spinner(format!("{}: {}", role.title(), title));
        let start = Instant::now();

        debug!("Running task {} ({} prompt chars)", key, prompt.len());
        let result = self.model.complete(&role.system_prompt(), prompt).await;
        let duration_seconds = start.elapsed().as_secs_f64();

        let (content, status) = match result {
            Ok(content) => {
                spinner.finish_with_message(format!("✅ {} ({:.1}s)", title, duration_seconds));
                (content, TaskStatus::Completed)
            }
            Err(e) => {
                spinner.finish_with_message(format!("❌ {} failed: {}", title, e));
                warn!("Task {} failed: {}", key, e);
                (format!("{} not available.", title), TaskStatus::Failed(e.to_string()))
            }
        };

        TaskOutput {
            task: key.to_string(),
            title: title.to_string(),
            agent: role.title().to_string(),
            content,
            status,
            duration_seconds,
        }
    }

    fn spinner(&self, message: String) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

/// Full prompt for the comparison task.
pub fn comparison_prompt(records: &[&PropertyRecord], assumptions: &LotAssumptions) -> String {
    task_prompt(
        COMPARISON_TITLE,
        &prompts::comparison(records, assumptions),
        COMPARISON_EXPECTED,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PropertyDataset;
    use crate::llm::{LlmError, LlmResult, MockModel};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails tasks whose heading contains `fail_on`; records every prompt.
    struct ScriptedModel {
        fail_on: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(fail_on: &'static str) -> Self {
            Self {
                fail_on,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _system: &str, prompt: &str) -> LlmResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let heading = prompt.lines().next().unwrap_or_default();
            if heading.contains(self.fail_on) {
                return Err(LlmError::Timeout(600));
            }
            Ok(format!("Output for {}", heading.trim_start_matches("# Task: ")))
        }
    }

    fn property() -> PropertyContext {
        let dataset =
            PropertyDataset::from_csv_str(include_str!("../../fixtures/properties.csv")).unwrap();
        let record = dataset.get("12345").unwrap().clone();
        PropertyContext::new(record, &LotAssumptions::default(), None)
    }

    #[tokio::test]
    async fn test_run_with_mock_model() {
        let model = MockModel::new("llama3");
        let crew = Crew::new(&model, 6000);

        let run = crew.run(&property()).await;

        assert_eq!(run.outputs.len(), 6);
        assert_eq!(run.completed(), 6);
        assert_eq!(run.failed(), 0);
        assert_eq!(model.calls(), 6);

        let keys: Vec<&str> = run.outputs.iter().map(|o| o.task.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "data_analysis",
                "market_research",
                "financial_analysis",
                "full_report",
                "executive_summary",
                "investment_summary"
            ]
        );
        assert!(run.outputs[4].content.starts_with("## Executive Summary"));
        assert_eq!(run.outputs[1].agent, "Web Researcher");

        let specialist: std::collections::HashSet<&str> =
            run.outputs[..4].iter().map(|o| o.content.as_str()).collect();
        assert_eq!(specialist.len(), 4);
        assert!(run.outputs[1].content.contains("Utilities and Infrastructure"));
        assert!(run.outputs[2].content.contains("Zoning Considerations"));
    }

    #[tokio::test]
    async fn test_failed_task_does_not_stop_crew() {
        let model = ScriptedModel::new("Market Research");
        let crew = Crew::new(&model, 6000);

        let run = crew.run(&property()).await;

        assert_eq!(run.outputs.len(), 6);
        assert_eq!(run.failed(), 1);

        let market = &run.outputs[1];
        assert_eq!(market.content, "Market Research not available.");
        assert!(matches!(market.status, TaskStatus::Failed(ref reason) if reason.contains("timed out")));

        let prompts = model.prompts.lock().unwrap();
        let financial_prompt = &prompts[2];
        assert!(financial_prompt.contains("## Context: Property Data Analysis\nOutput for Property Data Analysis"));
        assert!(financial_prompt.contains("The Market Research step failed"));
    }

    #[tokio::test]
    async fn test_context_passing() {
        let model = ScriptedModel::new("nothing fails");
        let crew = Crew::new(&model, 6000);

        crew.run(&property()).await;

        let prompts = model.prompts.lock().unwrap();
        let investment = &prompts[5];
        assert!(investment.contains("Output for Financial Analysis"));
        assert!(investment.contains("Output for Executive Summary"));
        assert!(!investment.contains("Output for Market Research"));
    }

    #[tokio::test]
    async fn test_compare_needs_two_records() {
        let dataset =
            PropertyDataset::from_csv_str(include_str!("../../fixtures/properties.csv")).unwrap();
        let model = MockModel::new("llama3");
        let crew = Crew::new(&model, 6000);

        let one = vec![dataset.get("12345").unwrap()];
        assert!(crew.compare(&one, &LotAssumptions::default()).await.is_err());
        assert_eq!(model.calls(), 0);

        let two = vec![dataset.get("12345").unwrap(), dataset.get("67890").unwrap()];
        let output = crew.compare(&two, &LotAssumptions::default()).await.unwrap();
        assert_eq!(output.task, "property_comparison");
        assert!(output.content.starts_with("## Property Comparison"));
    }

    #[tokio::test]
    async fn test_compare_propagates_failure() {
        let dataset =
            PropertyDataset::from_csv_str(include_str!("../../fixtures/properties.csv")).unwrap();
        let model = ScriptedModel::new("Comparison");
        let crew = Crew::new(&model, 6000);

        let two = vec![dataset.get("12345").unwrap(), dataset.get("24680").unwrap()];
        let err = crew.compare(&two, &LotAssumptions::default()).await.unwrap_err();
        assert!(err.to_string().contains("Property comparison failed"));
    }

    #[test]
    fn test_preview_does_not_call_model() {
        let model = MockModel::new("llama3");
        let crew = Crew::new(&model, 6000);

        let previews = crew.preview(&property());

        assert_eq!(previews.len(), 6);
        assert_eq!(model.calls(), 0);
        assert!(previews[0].system.starts_with("You are the Property Data Analyst."));
        assert!(previews[3]
            .prompt
            .contains("## Context: Financial Analysis\n<output of Financial Analysis>"));
    }
}
