//! Industry-classification codes: canonicalization, the section range table
//! and hierarchy navigation.

pub mod hierarchy;
pub mod normalize;
pub mod sections;

pub use hierarchy::{find_children, find_parent, section_of, DrillNode, HierarchyTree};
pub use normalize::normalize_code;
pub use sections::{division_range, section_for_division, SECTION_RANGES};
