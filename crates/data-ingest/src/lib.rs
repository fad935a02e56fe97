//! Loading of the raw source tables.
//!
//! Required tables fail loudly with [`index_core::IndexError::MissingSourceFile`];
//! optional ones degrade to empty lookups. Per-row anomalies are logged and
//! absorbed.

pub mod bankruptcy;
pub mod clean;
pub mod commentary;
pub mod financial;
pub mod indicators;
pub mod research;
pub mod sources;

pub use bankruptcy::BankruptcyTable;
pub use clean::parse_amount;
pub use commentary::{Commentary, CommentaryCache};
pub use financial::{FinancialEntry, FinancialTable};
pub use indicators::{indicator_field, INDICATORS};
pub use research::ResearchLookup;
pub use sources::{assemble, load_sources, SourcePaths, SourceTables};
