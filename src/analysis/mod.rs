//! Deterministic property analysis.
//!
//! Facts computed directly from the record, handed to the agents as
//! ground truth and printed in the report.

pub mod economics;
pub mod metrics;

pub use economics::{LotAssumptions, lot_economics};
pub use metrics::key_metrics;
