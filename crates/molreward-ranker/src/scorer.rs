//! Composite reward computation.
//!
//! reward = Σ(w_i × s_i) / Σ w_i, where s_i is the sigmoid-normalised value
//! of objective i and w are the effective weights for the record. Records
//! without potency predictions use redistributed weights. Missing records,
//! degenerate weights and non-finite results all map to the reward floor.

use serde::{Deserialize, Serialize};
use tracing::debug;

use molreward_common::{ObjectiveConfig, PropertyRecord, ScoringConfig};

use crate::normalise::{sigmoid, Objective};
use crate::weights::RewardWeights;

/// Reward used when the reference configuration has nothing to score.
pub const DEFAULT_REWARD_FLOOR: f64 = 0.01;

/// Per-objective view of one reward computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Sigmoid values in `Objective::ALL` order
    pub objective_scores: [f64; 6],
    /// Weights actually applied (after redistribution)
    pub weights: RewardWeights,
    pub redistributed: bool,
    pub reward: f64,
}

impl RewardBreakdown {
    pub fn score(&self, objective: Objective) -> f64 {
        let idx = Objective::ALL
            .iter()
            .position(|o| *o == objective)
            .unwrap_or_default();
        self.objective_scores[idx]
    }
}

/// Immutable reward function built from configuration.
#[derive(Debug, Clone)]
pub struct RewardAggregator {
    weights: RewardWeights,
    objectives: ObjectiveConfig,
    floor: f64,
}

impl Default for RewardAggregator {
    fn default() -> Self {
        Self {
            weights: RewardWeights::default(),
            objectives: ObjectiveConfig::default(),
            floor: DEFAULT_REWARD_FLOOR,
        }
    }
}

impl RewardAggregator {
    pub fn new(weights: RewardWeights, objectives: ObjectiveConfig, floor: f64) -> Self {
        Self { weights, objectives, floor }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(
            RewardWeights::from(&config.weights),
            config.objectives.clone(),
            config.reward_floor,
        )
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    /// Weights applied to this record: the configured ones, or the
    /// redistributed ones when the record has no potency block.
    pub fn effective_weights(&self, record: &PropertyRecord) -> RewardWeights {
        if record.has_potency() {
            self.weights
        } else {
            self.weights.redistributed()
        }
    }

    /// Sigmoid value per objective. Absent potency and selectivity read as 0.0.
    pub fn objective_scores(&self, record: &PropertyRecord) -> [f64; 6] {
        let raw = [
            record.primary_pic50().unwrap_or(0.0),
            record.selectivity().unwrap_or(0.0),
            record.qed,
            record.cns_mpo,
            record.bbb_score,
            -record.sa_score,
        ];
        let mut scores = [0.0; 6];
        for (slot, (objective, value)) in scores.iter_mut().zip(Objective::ALL.iter().zip(raw)) {
            *slot = sigmoid(value, objective.params(&self.objectives));
        }
        scores
    }

    /// Scalar reward in [0, 1]. `None` (a rejected molecule) gives the floor.
    pub fn reward(&self, record: Option<&PropertyRecord>) -> f64 {
        match record {
            Some(record) => self.breakdown(record).reward,
            None => self.floor,
        }
    }

    pub fn breakdown(&self, record: &PropertyRecord) -> RewardBreakdown {
        let weights = self.effective_weights(record);
        let objective_scores = self.objective_scores(record);
        let reward = self.combine(&weights, &objective_scores, &record.smiles);
        RewardBreakdown {
            objective_scores,
            weights,
            redistributed: !record.has_potency(),
            reward,
        }
    }

    fn combine(&self, weights: &RewardWeights, scores: &[f64; 6], smiles: &str) -> f64 {
        let total = weights.total();
        if !(total > 0.0) || !total.is_finite() {
            debug!(smiles, "Effective weights sum to zero, returning reward floor");
            return self.floor;
        }

        let weighted: f64 = weights
            .as_array()
            .iter()
            .zip(scores)
            .map(|(w, s)| w * s)
            .sum();
        let score = weighted / total;

        if !score.is_finite() {
            debug!(smiles, "Non-finite reward, returning reward floor");
            return self.floor;
        }
        score.clamp(0.0, 1.0)
    }
}

/// Reward under the reference weights and sigmoid parameters.
pub fn reward(record: Option<&PropertyRecord>) -> f64 {
    RewardAggregator::default().reward(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use molreward_common::{PotencyBlock, PotencyEstimate, SaMethod};

    fn record(qed: f64, cns_mpo: f64, bbb: f64, sa: f64) -> PropertyRecord {
        PropertyRecord {
            smiles: "C".into(),
            qed,
            cns_mpo,
            sa_score: sa,
            sa_method: SaMethod::Approximate,
            ring_count: 0,
            mol_wt: 100.0,
            bbb_score: bbb,
            potency: None,
        }
    }

    fn with_potency(mut r: PropertyRecord, primary: f64, off: f64) -> PropertyRecord {
        r.potency = Some(PotencyBlock::new(
            PotencyEstimate { target: "KEAP1".into(), pic50: primary },
            PotencyEstimate { target: "EGFR".into(), pic50: off },
            PotencyEstimate { target: "IKKb".into(), pic50: off },
        ));
        r
    }

    #[test]
    fn test_none_gives_floor() {
        assert_eq!(reward(None), 0.01);
    }

    #[test]
    fn test_drug_likeness_isolated_uses_redistributed_weight() {
        let r = record(1e3, -1e3, -1e3, 1e3);
        assert!((reward(Some(&r)) - 0.425).abs() < 1e-9);
    }

    #[test]
    fn test_synthesis_isolated_uses_redistributed_weight() {
        let r = record(-1e3, -1e3, -1e3, -1e3);
        assert!((reward(Some(&r)) - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_bbb_midpoint() {
        let b = RewardAggregator::default().breakdown(&record(0.5, 0.5, 0.7, 3.0));
        assert!((b.score(Objective::Bbb) - 0.5).abs() < 1e-12);
        assert!(b.redistributed);
    }

    #[test]
    fn test_potency_block_uses_configured_weights() {
        let agg = RewardAggregator::default();
        let r = with_potency(record(0.7, 0.6, 1.0, 3.0), 8.0, 5.0);
        assert_eq!(agg.effective_weights(&r), RewardWeights::default());
        let b = agg.breakdown(&r);
        assert!(!b.redistributed);
        assert!((b.score(Objective::Selectivity) - sigmoid(3.0, ObjectiveConfig::default().selectivity)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weights_give_floor() {
        let zero = RewardWeights {
            potency: 0.0, selectivity: 0.0, drug_likeness: 0.0,
            cns: 0.0, bbb: 0.0, synthesis: 0.0,
        };
        let agg = RewardAggregator::new(zero, ObjectiveConfig::default(), 0.01);
        assert_eq!(agg.reward(Some(&record(0.9, 0.9, 1.0, 2.0))), 0.01);
    }

    #[test]
    fn test_nan_input_gives_floor() {
        let r = record(f64::NAN, 0.5, 1.0, 3.0);
        assert_eq!(reward(Some(&r)), 0.01);
    }
}
