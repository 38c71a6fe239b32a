//! Weight vector for reward aggregation.

use serde::{Deserialize, Serialize};

use molreward_common::WeightConfig;

/// The 6-component weight vector.
/// Weights are relative proportions; they are divided by their sum at
/// aggregation time, so they need not sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    /// Primary-target pIC50
    pub potency: f64,
    /// pIC50 margin over the strongest off-target
    pub selectivity: f64,
    /// QED
    pub drug_likeness: f64,
    /// CNS MPO
    pub cns: f64,
    /// Blood-brain-barrier heuristic
    pub bbb: f64,
    /// Ease of synthesis (negated SA score)
    pub synthesis: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            potency:       0.35,
            selectivity:   0.20,
            drug_likeness: 0.15,
            cns:           0.10,
            bbb:           0.10,
            synthesis:     0.10,
        }
    }
}

impl From<&WeightConfig> for RewardWeights {
    fn from(cfg: &WeightConfig) -> Self {
        Self {
            potency: cfg.potency,
            selectivity: cfg.selectivity,
            drug_likeness: cfg.drug_likeness,
            cns: cfg.cns,
            bbb: cfg.bbb,
            synthesis: cfg.synthesis,
        }
    }
}

impl RewardWeights {
    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Weights to use when no potency predictions exist: the potency and
    /// selectivity mass moves half to drug-likeness, half to synthesis.
    pub fn redistributed(&self) -> Self {
        let freed = self.potency + self.selectivity;
        Self {
            potency: 0.0,
            selectivity: 0.0,
            drug_likeness: self.drug_likeness + freed / 2.0,
            cns: self.cns,
            bbb: self.bbb,
            synthesis: self.synthesis + freed / 2.0,
        }
    }

    /// Order: potency, selectivity, drug_likeness, cns, bbb, synthesis.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.potency,
            self.selectivity,
            self.drug_likeness,
            self.cns,
            self.bbb,
            self.synthesis,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = RewardWeights::default();
        assert!((w.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_redistribution_matches_reference() {
        let w = RewardWeights::default().redistributed();
        // 0.55 of freed mass split evenly: 0.15 + 0.275 and 0.10 + 0.275.
        let expected = [0.0, 0.0, 0.425, 0.10, 0.10, 0.375];
        for (got, want) in w.as_array().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
        assert!((w.total() - 1.0).abs() < 1e-12);
    }
}
