//! Potency predictors.
//!
//! A predictor maps a feature vector (Morgan fingerprint bits followed by
//! the scalar descriptor tail) to a pIC50 estimate for one target. Scoring
//! uses either all three predictors or none of them.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use molreward_chem::{morgan_fingerprint, Descriptors, Molecule};
use molreward_common::{FeatureConfig, PredictorFiles};

/// Trait for pIC50 predictors.
/// Implementations must be thread-safe; batches are evaluated in parallel.
pub trait Predictor: Send + Sync {
    /// Target label used in record rows (e.g. "KEAP1").
    fn target(&self) -> &str;

    fn predict(&self, features: &[f64]) -> anyhow::Result<f64>;
}

// ---------------------------------------------------------------------------
// Predictor set
// ---------------------------------------------------------------------------

/// The predictors available for an evaluation.
#[derive(Clone, Default)]
pub enum PredictorSet {
    #[default]
    None,
    Full {
        primary: Arc<dyn Predictor>,
        off_target_a: Arc<dyn Predictor>,
        off_target_b: Arc<dyn Predictor>,
    },
}

impl std::fmt::Debug for PredictorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictorSet::None => f.write_str("PredictorSet::None"),
            PredictorSet::Full { primary, off_target_a, off_target_b } => f
                .debug_struct("PredictorSet::Full")
                .field("primary", &primary.target())
                .field("off_target_a", &off_target_a.target())
                .field("off_target_b", &off_target_b.target())
                .finish(),
        }
    }
}

impl PredictorSet {
    pub fn full(
        primary: Arc<dyn Predictor>,
        off_target_a: Arc<dyn Predictor>,
        off_target_b: Arc<dyn Predictor>,
    ) -> Self {
        PredictorSet::Full { primary, off_target_a, off_target_b }
    }

    /// A partial set is treated as no predictors at all.
    pub fn from_options(
        primary: Option<Arc<dyn Predictor>>,
        off_target_a: Option<Arc<dyn Predictor>>,
        off_target_b: Option<Arc<dyn Predictor>>,
    ) -> Self {
        match (primary, off_target_a, off_target_b) {
            (Some(p), Some(a), Some(b)) => Self::full(p, a, b),
            (None, None, None) => PredictorSet::None,
            _ => {
                warn!("Incomplete predictor set supplied, scoring without potency");
                PredictorSet::None
            }
        }
    }

    /// Load three linear predictors from their JSON files.
    pub fn from_files(files: &PredictorFiles) -> anyhow::Result<Self> {
        let primary = LinearPredictor::from_json_file(&files.primary)?;
        let off_target_a = LinearPredictor::from_json_file(&files.off_target_a)?;
        let off_target_b = LinearPredictor::from_json_file(&files.off_target_b)?;
        info!(
            primary = primary.target(),
            off_target_a = off_target_a.target(),
            off_target_b = off_target_b.target(),
            "Loaded potency predictors"
        );
        Ok(Self::full(Arc::new(primary), Arc::new(off_target_a), Arc::new(off_target_b)))
    }

    pub fn is_full(&self) -> bool {
        matches!(self, PredictorSet::Full { .. })
    }
}

// ---------------------------------------------------------------------------
// Linear predictor
// ---------------------------------------------------------------------------

/// pIC50 = intercept + Σ coefficient_i × feature_i
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearPredictor {
    pub target: String,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearPredictor {
    pub fn new(target: impl Into<String>, intercept: f64, coefficients: Vec<f64>) -> Self {
        Self { target: target.into(), intercept, coefficients }
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let model: Self = serde_json::from_str(json).context("invalid predictor JSON")?;
        if model.coefficients.is_empty() {
            bail!("predictor for {} has no coefficients", model.target);
        }
        Ok(model)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read predictor file {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("failed to load predictor from {}", path.display()))
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

impl Predictor for LinearPredictor {
    fn target(&self) -> &str {
        &self.target
    }

    fn predict(&self, features: &[f64]) -> anyhow::Result<f64> {
        if features.len() != self.coefficients.len() {
            bail!(
                "{}: expected {} features, got {}",
                self.target,
                self.coefficients.len(),
                features.len()
            );
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }
}

// ---------------------------------------------------------------------------
// Mock predictor
// ---------------------------------------------------------------------------

/// Mock predictor for testing.
/// Returns a fixed value, optionally overridden per feature-vector length,
/// or fails on every call.
pub struct MockPredictor {
    target: String,
    value: f64,
    by_len: HashMap<usize, f64>,
    fail: bool,
}

impl MockPredictor {
    pub fn new(target: impl Into<String>, value: f64) -> Self {
        Self {
            target: target.into(),
            value,
            by_len: HashMap::new(),
            fail: false,
        }
    }

    pub fn failing(target: impl Into<String>) -> Self {
        Self { fail: true, ..Self::new(target, 0.0) }
    }

    /// Return `value` when the feature vector has `len` entries.
    pub fn with(mut self, len: usize, value: f64) -> Self {
        self.by_len.insert(len, value);
        self
    }
}

impl Predictor for MockPredictor {
    fn target(&self) -> &str {
        &self.target
    }

    fn predict(&self, features: &[f64]) -> anyhow::Result<f64> {
        if self.fail {
            bail!("mock predictor for {} configured to fail", self.target);
        }
        Ok(self.by_len.get(&features.len()).copied().unwrap_or(self.value))
    }
}

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// Fingerprint bits (as 0.0/1.0) followed by the descriptor tail.
pub fn build_features(mol: &Molecule, desc: &Descriptors, cfg: &FeatureConfig) -> Vec<f64> {
    let fp = morgan_fingerprint(mol, cfg.fingerprint_radius, cfg.fingerprint_bits);
    let mut features = fp.to_f64_vec();
    features.extend_from_slice(&desc.feature_values());
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use molreward_chem::descriptors::FEATURE_COUNT;
    use molreward_chem::parse_smiles;

    #[test]
    fn test_feature_vector_layout() {
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let desc = Descriptors::compute(&mol);
        let cfg = FeatureConfig { fingerprint_radius: 2, fingerprint_bits: 256 };
        let features = build_features(&mol, &desc, &cfg);
        assert_eq!(features.len(), 256 + FEATURE_COUNT);
        assert!(features[..256].iter().all(|b| *b == 0.0 || *b == 1.0));
        assert_eq!(features[256], desc.logp);
        assert_eq!(features[256 + FEATURE_COUNT - 1], desc.heavy_atom_count as f64);
    }

    #[test]
    fn test_linear_predictor() {
        let model = LinearPredictor::new("KEAP1", 5.0, vec![0.5, -1.0, 2.0]);
        let value = model.predict(&[2.0, 1.0, 0.25]).unwrap();
        assert!((value - 5.5).abs() < 1e-12);
        assert!(model.predict(&[1.0]).is_err());
    }

    #[test]
    fn test_linear_predictor_from_json() {
        let json = r#"{"target": "EGFR", "intercept": 4.2, "coefficients": [0.1, 0.2]}"#;
        let model = LinearPredictor::from_json_str(json).unwrap();
        assert_eq!(model.target(), "EGFR");
        assert_eq!(model.n_features(), 2);

        let empty = r#"{"target": "EGFR", "intercept": 4.2, "coefficients": []}"#;
        assert!(LinearPredictor::from_json_str(empty).is_err());
    }

    #[test]
    fn test_partial_set_is_none() {
        let p: Arc<dyn Predictor> = Arc::new(MockPredictor::new("KEAP1", 7.0));
        let a: Arc<dyn Predictor> = Arc::new(MockPredictor::new("EGFR", 5.0));
        assert!(!PredictorSet::from_options(Some(p.clone()), Some(a.clone()), None).is_full());
        assert!(!PredictorSet::from_options(None, None, None).is_full());
        assert!(PredictorSet::from_options(Some(p), Some(a.clone()), Some(a)).is_full());
    }

    #[test]
    fn test_mock_predictor() {
        let mock = MockPredictor::new("KEAP1", 6.0).with(3, 8.0);
        assert_eq!(mock.predict(&[0.0; 3]).unwrap(), 8.0);
        assert_eq!(mock.predict(&[0.0; 4]).unwrap(), 6.0);
        assert!(MockPredictor::failing("EGFR").predict(&[]).is_err());
    }
}
