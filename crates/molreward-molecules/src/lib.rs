//! molreward-molecules — Property evaluation and validity gating.
//!
//! Turns SMILES strings into scored property records:
//! 1. Structural & validity screening (parse, valence, alerts)
//! 2. ADMET-style heuristics (CNS MPO, BBB, Lipinski, Veber)
//! 3. Synthetic accessibility with an approximate fallback
//! 4. Optional potency predictors (all three targets or none)
//! 5. Batch evaluation and reward scoring

pub mod admet;
pub mod evaluator;
pub mod filter;
pub mod pipeline;
pub mod predictor;
pub mod sa_score;
pub mod scoring;

pub use evaluator::{EvaluationError, PropertyEvaluator};
pub use filter::{assess_candidate, is_drug_like_candidate, is_valid_for_scoring, screen, CandidateReport, Rejection};
pub use pipeline::{MoleculesPipeline, ProgressSink};
pub use predictor::{LinearPredictor, MockPredictor, Predictor, PredictorSet};
pub use sa_score::{SaOutcome, SaScoreCalculator, SaScorer};
pub use scoring::{MoleculeScorer, ScoredMolecule};

pub type Result<T> = anyhow::Result<T>;
