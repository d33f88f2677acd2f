//! The agent crew: roles, tasks and the sequential pipeline.

pub mod agents;
pub mod pipeline;
pub mod prompts;
pub mod tasks;

use crate::analysis::{key_metrics, lot_economics, LotAssumptions};
use crate::models::{LotEconomics, PropertyRecord};
use crate::research::ResearchDigest;

pub use pipeline::{Crew, CrewRun};

/// Everything the task prompts are built from.
#[derive(Debug, Clone)]
pub struct PropertyContext {
    pub record: PropertyRecord,
    pub snapshot: Vec<(String, String)>,
    pub economics: Option<LotEconomics>,
    /// `None` when web research is disabled.
    pub research: Option<ResearchDigest>,
}

impl PropertyContext {
    pub fn new(
        record: PropertyRecord,
        assumptions: &LotAssumptions,
        research: Option<ResearchDigest>,
    ) -> Self {
        let snapshot = key_metrics(&record);
        let economics = lot_economics(&record, assumptions);
        Self {
            record,
            snapshot,
            economics,
            research,
        }
    }
}
