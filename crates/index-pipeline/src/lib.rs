//! End-to-end Stability/Transformation index pipeline.
//!
//! Loads the source tables once, derives ratios, scores cohorts (relative)
//! or whole series (absolute), forecasts entities and exports one wide
//! output table.

pub mod cohort;
pub mod output;
pub mod pipeline;

pub use cohort::CohortFilter;
pub use output::{check_numeric_column, OutputRow, OutputTable, COLUMNS};
pub use pipeline::{IndexPipeline, SectionReport};
