//! molreward-common — Shared types, errors, and configuration used across all molreward crates.

pub mod error;
pub mod entities;
pub mod scoring_config;
pub mod telemetry;

// Re-export commonly used types
pub use entities::{PotencyBlock, PotencyEstimate, PropertyRecord, SaMethod};
pub use error::{MolrewardError, Result};
pub use scoring_config::{
    BatchConfig, CandidateThresholds, FeatureConfig, ObjectiveConfig, PredictorFiles,
    ScoringConfig, SigmoidParams, WeightConfig,
};
