//! Runs the extract, classify and aggregate pipeline and keeps the latest
//! dataset.

pub mod runner;
pub mod store;

pub use runner::{Extracted, Pipeline, RunOutcome, RunSummary, Stage, DONE_STATUS};
pub use store::{ApplyOutcome, Dataset, DatasetStore, Epoch};
