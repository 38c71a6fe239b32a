//! Objective normalisation.
//! Each raw property is squashed onto (0, 1) by a logistic curve.

use serde::{Deserialize, Serialize};

use molreward_common::{ObjectiveConfig, SigmoidParams};

/// Logistic sigmoid 1 / (1 + exp(-k (x - x0))).
/// Saturates cleanly at 0 and 1 for large |k (x - x0)|.
pub fn sigmoid(x: f64, params: SigmoidParams) -> f64 {
    1.0 / (1.0 + (-params.k * (x - params.x0)).exp())
}

/// The six reward objectives, in weight-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Potency,
    Selectivity,
    DrugLikeness,
    Cns,
    Bbb,
    Synthesis,
}

impl Objective {
    pub const ALL: [Objective; 6] = [
        Objective::Potency,
        Objective::Selectivity,
        Objective::DrugLikeness,
        Objective::Cns,
        Objective::Bbb,
        Objective::Synthesis,
    ];

    pub fn params(self, cfg: &ObjectiveConfig) -> SigmoidParams {
        match self {
            Objective::Potency => cfg.potency,
            Objective::Selectivity => cfg.selectivity,
            Objective::DrugLikeness => cfg.drug_likeness,
            Objective::Cns => cfg.cns,
            Objective::Bbb => cfg.bbb,
            Objective::Synthesis => cfg.synthesis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_midpoint() {
        let p = SigmoidParams::new(10.0, 0.7);
        assert!((sigmoid(0.7, p) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_saturates_without_nan() {
        let p = SigmoidParams::new(1.0, -3.5);
        let low = sigmoid(-1e6, p);
        let high = sigmoid(1e6, p);
        assert_eq!(low, 0.0);
        assert_eq!(high, 1.0);
    }

    #[test]
    fn test_sigmoid_monotone() {
        let p = SigmoidParams::new(2.0, 7.5);
        assert!(sigmoid(8.0, p) > sigmoid(7.0, p));
    }

    #[test]
    fn test_objective_params_lookup() {
        let cfg = ObjectiveConfig::default();
        assert_eq!(Objective::Bbb.params(&cfg), SigmoidParams::new(10.0, 0.7));
        assert_eq!(Objective::ALL.len(), 6);
    }
}
