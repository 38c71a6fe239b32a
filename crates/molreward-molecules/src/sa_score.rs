//! Synthetic accessibility scoring.
//!
//! A dedicated scorer can be plugged in by the host. When none is
//! configured, or it fails for a molecule, the descriptor-based
//! approximation is used and the record says so via [`SaMethod`].

use tracing::debug;

use molreward_chem::{Descriptors, Molecule};
use molreward_common::SaMethod;

/// Upper bound of the SA scale (1 = trivial, 10 = very hard).
pub const SA_SCORE_MAX: f64 = 10.0;

/// A dedicated SA algorithm.
pub trait SaScorer: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, mol: &Molecule) -> anyhow::Result<f64>;
}

/// SA score together with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SaOutcome {
    pub score: f64,
    pub method: SaMethod,
}

#[derive(Default)]
pub struct SaScoreCalculator {
    dedicated: Option<Box<dyn SaScorer>>,
}

impl std::fmt::Debug for SaScoreCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaScoreCalculator")
            .field("dedicated", &self.dedicated.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl SaScoreCalculator {
    /// Approximation only.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scorer(scorer: Box<dyn SaScorer>) -> Self {
        Self { dedicated: Some(scorer) }
    }

    pub fn score(&self, mol: &Molecule, desc: &Descriptors) -> SaOutcome {
        if let Some(scorer) = &self.dedicated {
            match scorer.score(mol) {
                Ok(score) if score.is_finite() => {
                    return SaOutcome {
                        score,
                        method: SaMethod::Dedicated { name: scorer.name().to_string() },
                    };
                }
                Ok(score) => {
                    debug!(scorer = scorer.name(), score, "Non-finite SA score, using approximation");
                }
                Err(e) => {
                    debug!(scorer = scorer.name(), error = %e, "SA scorer failed, using approximation");
                }
            }
        }

        SaOutcome {
            score: approximate_sa_score(desc),
            method: SaMethod::Approximate,
        }
    }
}

/// min(2.5 + 0.1·(MW/100) + 0.2·rotatable bonds + 0.3·|logP − 2.5|, 10).
pub fn approximate_sa_score(desc: &Descriptors) -> f64 {
    let score = 2.5
        + 0.1 * (desc.mol_wt / 100.0)
        + 0.2 * desc.rotatable_bonds as f64
        + 0.3 * (desc.logp - 2.5).abs();
    score.min(SA_SCORE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use molreward_chem::parse_smiles;

    struct FixedScorer(f64);

    impl SaScorer for FixedScorer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn score(&self, _mol: &Molecule) -> anyhow::Result<f64> {
            Ok(self.0)
        }
    }

    struct BrokenScorer;

    impl SaScorer for BrokenScorer {
        fn name(&self) -> &str {
            "broken"
        }

        fn score(&self, _mol: &Molecule) -> anyhow::Result<f64> {
            anyhow::bail!("fragment table not loaded")
        }
    }

    fn ethanol() -> (Molecule, Descriptors) {
        let mol = parse_smiles("CCO").unwrap();
        let desc = Descriptors::compute(&mol);
        (mol, desc)
    }

    #[test]
    fn test_approximation_formula() {
        let (_, mut desc) = ethanol();
        desc.mol_wt = 300.0;
        desc.rotatable_bonds = 4;
        desc.logp = 4.5;
        // 2.5 + 0.3 + 0.8 + 0.6
        assert!((approximate_sa_score(&desc) - 4.2).abs() < 1e-12);
    }

    #[test]
    fn test_approximation_capped_at_ten() {
        let (_, mut desc) = ethanol();
        desc.rotatable_bonds = 60;
        assert_eq!(approximate_sa_score(&desc), SA_SCORE_MAX);
    }

    #[test]
    fn test_default_uses_approximation() {
        let (mol, desc) = ethanol();
        let outcome = SaScoreCalculator::new().score(&mol, &desc);
        assert_eq!(outcome.method, SaMethod::Approximate);
        assert!((outcome.score - approximate_sa_score(&desc)).abs() < 1e-12);
    }

    #[test]
    fn test_dedicated_scorer_is_preferred() {
        let (mol, desc) = ethanol();
        let calc = SaScoreCalculator::with_scorer(Box::new(FixedScorer(1.7)));
        let outcome = calc.score(&mol, &desc);
        assert_eq!(outcome.score, 1.7);
        assert_eq!(outcome.method, SaMethod::Dedicated { name: "fixed".into() });
    }

    #[test]
    fn test_failing_or_nan_scorer_falls_back() {
        let (mol, desc) = ethanol();
        for calc in [
            SaScoreCalculator::with_scorer(Box::new(BrokenScorer)),
            SaScoreCalculator::with_scorer(Box::new(FixedScorer(f64::NAN))),
        ] {
            assert_eq!(calc.score(&mol, &desc).method, SaMethod::Approximate);
        }
    }
}
