//! Hierarchy roll-ups.
//!
//! Absolute quantities are summed exactly in [`rust_decimal::Decimal`]; every
//! aggregate ratio is recomputed from those sums, never averaged.

pub mod rollup;
pub mod summary;

pub use rollup::{section_rollup, verify_section_rollups, RollupMismatch, SectionTotal};
pub use summary::{aggregate, AggregateSummary};
