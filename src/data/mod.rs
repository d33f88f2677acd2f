//! Property dataset loading and querying.
//!
//! The dataset is a flat CSV file loaded wholesale into memory once per run.

pub mod columns;
pub mod loader;

pub use loader::{PropertyDataset, PropertyFilter};
