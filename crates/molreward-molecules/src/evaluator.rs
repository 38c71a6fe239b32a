//! Single-molecule property evaluation.
//!
//! `evaluate` never fails loudly: any rejection or predictor failure yields
//! `None`, which the reward aggregator maps to the reward floor. Use
//! `try_evaluate` to see the reason.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use molreward_chem::{AlertCatalog, Descriptors, Molecule, StructuralFilter};
use molreward_common::{FeatureConfig, PotencyBlock, PotencyEstimate, PropertyRecord, ScoringConfig};

use crate::admet::AdmetPredictor;
use crate::filter::{self, CandidateReport, Rejection};
use crate::predictor::{build_features, Predictor, PredictorSet};
use crate::sa_score::{SaScoreCalculator, SaScorer};

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("potency prediction for {target} failed: {source}")]
    Predictor {
        target: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Computes a [`PropertyRecord`] from a SMILES string.
/// Stateless between calls; safe to share across threads.
pub struct PropertyEvaluator {
    alerts: Arc<dyn StructuralFilter>,
    sa: SaScoreCalculator,
    admet: AdmetPredictor,
    features: FeatureConfig,
}

impl std::fmt::Debug for PropertyEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyEvaluator")
            .field("sa", &self.sa)
            .field("admet", &self.admet)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

impl Default for PropertyEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(AlertCatalog::pains()))
    }
}

impl PropertyEvaluator {
    /// Default thresholds and feature settings with the given alert filter.
    pub fn new(alerts: Arc<dyn StructuralFilter>) -> Self {
        Self {
            alerts,
            sa: SaScoreCalculator::new(),
            admet: AdmetPredictor::default(),
            features: FeatureConfig::default(),
        }
    }

    pub fn from_config(config: &ScoringConfig, alerts: Arc<dyn StructuralFilter>) -> Self {
        Self {
            alerts,
            sa: SaScoreCalculator::new(),
            admet: AdmetPredictor::new(config.candidate.clone()),
            features: config.features.clone(),
        }
    }

    /// Use a dedicated SA algorithm, falling back to the approximation
    /// whenever it fails.
    pub fn with_sa_scorer(mut self, scorer: Box<dyn SaScorer>) -> Self {
        self.sa = SaScoreCalculator::with_scorer(scorer);
        self
    }

    pub fn alerts(&self) -> &dyn StructuralFilter {
        self.alerts.as_ref()
    }

    pub fn sa(&self) -> &SaScoreCalculator {
        &self.sa
    }

    pub fn admet(&self) -> &AdmetPredictor {
        &self.admet
    }

    pub fn is_valid_for_scoring(&self, smiles: &str) -> bool {
        filter::is_valid_for_scoring(smiles, self.alerts())
    }

    pub fn assess_candidate(&self, smiles: &str) -> Result<CandidateReport, Rejection> {
        filter::assess_candidate(smiles, self)
    }

    pub fn is_drug_like_candidate(&self, smiles: &str) -> bool {
        filter::is_drug_like_candidate(smiles, self)
    }

    pub fn evaluate(&self, smiles: &str, predictors: &PredictorSet) -> Option<PropertyRecord> {
        match self.try_evaluate(smiles, predictors) {
            Ok(record) => Some(record),
            Err(EvaluationError::Rejected(reason)) => {
                debug!(smiles, %reason, "Molecule rejected");
                None
            }
            Err(e) => {
                warn!(smiles, error = %e, "Dropping molecule after predictor failure");
                None
            }
        }
    }

    pub fn try_evaluate(&self, smiles: &str, predictors: &PredictorSet) -> Result<PropertyRecord, EvaluationError> {
        let mol = filter::screen(smiles, self.alerts())?;
        let desc = Descriptors::compute(&mol);
        let admet = self.admet.predict(&desc);
        let sa = self.sa.score(&mol, &desc);

        let potency = match predictors {
            PredictorSet::None => None,
            PredictorSet::Full { primary, off_target_a, off_target_b } => {
                let features = build_features(&mol, &desc, &self.features);
                Some(PotencyBlock::new(
                    run_predictor(primary.as_ref(), &features)?,
                    run_predictor(off_target_a.as_ref(), &features)?,
                    run_predictor(off_target_b.as_ref(), &features)?,
                ))
            }
        };

        Ok(PropertyRecord {
            smiles: smiles.to_string(),
            qed: desc.qed,
            cns_mpo: admet.cns_mpo,
            sa_score: sa.score,
            sa_method: sa.method,
            ring_count: desc.ring_count,
            mol_wt: desc.mol_wt,
            bbb_score: admet.bbb_score,
            potency,
        })
    }

    /// Parse and screen without computing properties.
    pub fn screen(&self, smiles: &str) -> Result<Molecule, Rejection> {
        filter::screen(smiles, self.alerts())
    }
}

fn run_predictor(predictor: &dyn Predictor, features: &[f64]) -> Result<PotencyEstimate, EvaluationError> {
    let target = predictor.target().to_string();
    match predictor.predict(features) {
        Ok(pic50) if pic50.is_finite() => Ok(PotencyEstimate { target, pic50 }),
        Ok(pic50) => Err(EvaluationError::Predictor {
            source: format!("non-finite prediction {pic50}").into(),
            target,
        }),
        Err(e) => Err(EvaluationError::Predictor { target, source: e.into() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::MockPredictor;

    fn predictors(primary: f64, a: f64, b: f64) -> PredictorSet {
        PredictorSet::full(
            Arc::new(MockPredictor::new("KEAP1", primary)),
            Arc::new(MockPredictor::new("EGFR", a)),
            Arc::new(MockPredictor::new("IKKb", b)),
        )
    }

    #[test]
    fn test_ethanol_record() {
        let record = PropertyEvaluator::default()
            .evaluate("CCO", &PredictorSet::None)
            .unwrap();
        assert_eq!(record.smiles, "CCO");
        assert!((record.mol_wt - 46.069).abs() < 0.01);
        assert_eq!(record.ring_count, 0);
        assert_eq!(record.bbb_score, 1.0);
        assert!(record.potency.is_none());
        assert!((0.0..=1.0).contains(&record.qed));
        assert!((0.0..=1.0).contains(&record.cns_mpo));
    }

    #[test]
    fn test_potency_block_filled() {
        let record = PropertyEvaluator::default()
            .evaluate("CC(=O)Oc1ccccc1C(=O)O", &predictors(8.0, 5.5, 6.0))
            .unwrap();
        let block = record.potency.unwrap();
        assert_eq!(block.primary.target, "KEAP1");
        assert!((block.selectivity - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_prediction_is_failure() {
        let evaluator = PropertyEvaluator::default();
        let err = evaluator
            .try_evaluate("CCO", &predictors(f64::NAN, 5.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, EvaluationError::Predictor { ref target, .. } if target == "KEAP1"));
        assert!(evaluator.evaluate("CCO", &predictors(f64::INFINITY, 5.0, 5.0)).is_none());
    }

    #[test]
    fn test_rejection_reason_exposed() {
        let err = PropertyEvaluator::default()
            .try_evaluate("Oc1ccccc1O", &PredictorSet::None)
            .unwrap_err();
        assert!(matches!(err, EvaluationError::Rejected(Rejection::StructuralAlert { .. })));
    }
}
