//! Normalization, composite scores and status classification.

pub mod composite;
pub mod normalize;
pub mod scorer;
pub mod status;

pub use composite::{lending_score, stability_score, sub_scores, transformation_score, NormalizedInputs, SubScores};
pub use normalize::{absolute, min_max, min_max_series, CohortNormalizer, NormalizationOutcome};
pub use scorer::Scorer;
pub use status::{classify, classify_forecast};
