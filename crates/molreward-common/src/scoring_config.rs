//! Scoring configuration for the reward pipeline.
//!
//! Every field has a serde default, so an empty file (or no file at all)
//! yields the reference weights, sigmoid parameters and filter thresholds.
//! Built once at start-up and shared read-only afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MolrewardError, Result};

/// Complete scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Reward returned for rejected molecules and degenerate weights
    #[serde(default = "default_reward_floor")]
    pub reward_floor: f64,

    /// Relative objective weights
    #[serde(default)]
    pub weights: WeightConfig,

    /// Per-objective sigmoid parameters
    #[serde(default)]
    pub objectives: ObjectiveConfig,

    /// Thresholds for dataset curation
    #[serde(default)]
    pub candidate: CandidateThresholds,

    /// Predictor feature vector layout
    #[serde(default)]
    pub features: FeatureConfig,

    /// Batch execution options
    #[serde(default)]
    pub batch: BatchConfig,

    /// Optional linear predictor files (all three or none)
    #[serde(default)]
    pub predictors: Option<PredictorFiles>,
}

fn default_reward_floor() -> f64 { 0.01 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reward_floor: default_reward_floor(),
            weights: WeightConfig::default(),
            objectives: ObjectiveConfig::default(),
            candidate: CandidateThresholds::default(),
            features: FeatureConfig::default(),
            batch: BatchConfig::default(),
            predictors: None,
        }
    }
}

// ── Weights ───────────────────────────────────────────────────────────────────

/// Objective weights. Used as proportions; they need not sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Primary-target potency (pIC50)
    #[serde(default = "default_potency_weight")]
    pub potency: f64,

    /// Selectivity over the two off-targets
    #[serde(default = "default_selectivity_weight")]
    pub selectivity: f64,

    /// QED drug-likeness
    #[serde(default = "default_drug_likeness_weight")]
    pub drug_likeness: f64,

    /// CNS multi-parameter optimisation score
    #[serde(default = "default_cns_weight")]
    pub cns: f64,

    /// Blood-brain-barrier heuristic
    #[serde(default = "default_bbb_weight")]
    pub bbb: f64,

    /// Ease of synthesis (negated SA score)
    #[serde(default = "default_synthesis_weight")]
    pub synthesis: f64,
}

fn default_potency_weight() -> f64 { 0.35 }
fn default_selectivity_weight() -> f64 { 0.20 }
fn default_drug_likeness_weight() -> f64 { 0.15 }
fn default_cns_weight() -> f64 { 0.10 }
fn default_bbb_weight() -> f64 { 0.10 }
fn default_synthesis_weight() -> f64 { 0.10 }

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            potency: default_potency_weight(),
            selectivity: default_selectivity_weight(),
            drug_likeness: default_drug_likeness_weight(),
            cns: default_cns_weight(),
            bbb: default_bbb_weight(),
            synthesis: default_synthesis_weight(),
        }
    }
}

impl WeightConfig {
    /// All weights finite and non-negative.
    pub fn validate(&self) -> bool {
        [self.potency, self.selectivity, self.drug_likeness, self.cns, self.bbb, self.synthesis]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

// ── Sigmoid parameters ────────────────────────────────────────────────────────

/// Logistic squashing parameters: 1 / (1 + exp(-k (x - x0))).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidParams {
    pub k: f64,
    pub x0: f64,
}

impl SigmoidParams {
    pub const fn new(k: f64, x0: f64) -> Self {
        Self { k, x0 }
    }

    pub fn is_finite(&self) -> bool {
        self.k.is_finite() && self.x0.is_finite()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    #[serde(default = "default_potency_sigmoid")]
    pub potency: SigmoidParams,
    #[serde(default = "default_selectivity_sigmoid")]
    pub selectivity: SigmoidParams,
    #[serde(default = "default_drug_likeness_sigmoid")]
    pub drug_likeness: SigmoidParams,
    #[serde(default = "default_cns_sigmoid")]
    pub cns: SigmoidParams,
    #[serde(default = "default_bbb_sigmoid")]
    pub bbb: SigmoidParams,
    /// Applied to the negated SA score
    #[serde(default = "default_synthesis_sigmoid")]
    pub synthesis: SigmoidParams,
}

fn default_potency_sigmoid() -> SigmoidParams { SigmoidParams::new(2.0, 7.5) }
fn default_selectivity_sigmoid() -> SigmoidParams { SigmoidParams::new(1.5, 2.5) }
fn default_drug_likeness_sigmoid() -> SigmoidParams { SigmoidParams::new(10.0, 0.6) }
fn default_cns_sigmoid() -> SigmoidParams { SigmoidParams::new(15.0, 0.5) }
fn default_bbb_sigmoid() -> SigmoidParams { SigmoidParams::new(10.0, 0.7) }
fn default_synthesis_sigmoid() -> SigmoidParams { SigmoidParams::new(1.0, -3.5) }

impl ObjectiveConfig {
    /// Name and parameters of the first objective with a non-finite slope
    /// or midpoint.
    pub fn first_non_finite(&self) -> Option<(&'static str, SigmoidParams)> {
        [
            ("potency", self.potency),
            ("selectivity", self.selectivity),
            ("drug_likeness", self.drug_likeness),
            ("cns", self.cns),
            ("bbb", self.bbb),
            ("synthesis", self.synthesis),
        ]
        .into_iter()
        .find(|(_, p)| !p.is_finite())
    }
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            potency: default_potency_sigmoid(),
            selectivity: default_selectivity_sigmoid(),
            drug_likeness: default_drug_likeness_sigmoid(),
            cns: default_cns_sigmoid(),
            bbb: default_bbb_sigmoid(),
            synthesis: default_synthesis_sigmoid(),
        }
    }
}

// ── Candidate thresholds ──────────────────────────────────────────────────────

/// Thresholds for the strict drug-like candidate predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateThresholds {
    /// QED must be strictly greater
    #[serde(default = "default_min_qed")]
    pub min_qed: f64,

    /// CNS MPO must be strictly greater
    #[serde(default = "default_min_cns_mpo")]
    pub min_cns_mpo: f64,

    #[serde(default = "default_max_mol_wt")]
    pub max_mol_wt: f64,

    #[serde(default = "default_max_logp")]
    pub max_logp: f64,

    #[serde(default = "default_max_h_donors")]
    pub max_h_donors: u32,

    #[serde(default = "default_max_h_acceptors")]
    pub max_h_acceptors: u32,

    #[serde(default = "default_max_tpsa")]
    pub max_tpsa: f64,

    #[serde(default = "default_max_rotatable_bonds")]
    pub max_rotatable_bonds: u32,

    #[serde(default = "default_max_sa_score")]
    pub max_sa_score: f64,
}

fn default_min_qed() -> f64 { 0.6 }
fn default_min_cns_mpo() -> f64 { 0.5 }
fn default_max_mol_wt() -> f64 { 500.0 }
fn default_max_logp() -> f64 { 5.0 }
fn default_max_h_donors() -> u32 { 5 }
fn default_max_h_acceptors() -> u32 { 10 }
fn default_max_tpsa() -> f64 { 140.0 }
fn default_max_rotatable_bonds() -> u32 { 10 }
fn default_max_sa_score() -> f64 { 4.5 }

impl Default for CandidateThresholds {
    fn default() -> Self {
        Self {
            min_qed: default_min_qed(),
            min_cns_mpo: default_min_cns_mpo(),
            max_mol_wt: default_max_mol_wt(),
            max_logp: default_max_logp(),
            max_h_donors: default_max_h_donors(),
            max_h_acceptors: default_max_h_acceptors(),
            max_tpsa: default_max_tpsa(),
            max_rotatable_bonds: default_max_rotatable_bonds(),
            max_sa_score: default_max_sa_score(),
        }
    }
}

// ── Features ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Morgan fingerprint radius
    #[serde(default = "default_fp_radius")]
    pub fingerprint_radius: usize,

    /// Morgan fingerprint length in bits
    #[serde(default = "default_fp_bits")]
    pub fingerprint_bits: usize,
}

fn default_fp_radius() -> usize { 2 }
fn default_fp_bits() -> usize { 2048 }

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fingerprint_radius: default_fp_radius(),
            fingerprint_bits: default_fp_bits(),
        }
    }
}

// ── Batch ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Batches longer than this run on the rayon pool. 0 disables parallelism.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_parallel_threshold() -> usize { 64 }

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

// ── Predictors ────────────────────────────────────────────────────────────────

/// Paths to linear predictor JSON files, one per biological target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorFiles {
    pub primary: PathBuf,
    pub off_target_a: PathBuf,
    pub off_target_b: PathBuf,
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl ScoringConfig {
    /// Load from TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.checked()
    }

    /// Load from YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.checked()
    }

    /// Load from JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.checked()
    }

    /// Load configuration from molreward.toml.
    /// Checks MOLREWARD_CONFIG env var first, then the current directory.
    /// Falls back to defaults when neither exists.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("MOLREWARD_CONFIG").ok();
        let path = explicit.clone().unwrap_or_else(|| "molreward.toml".to_string());

        if !Path::new(&path).exists() {
            if explicit.is_some() {
                return Err(MolrewardError::Config(format!("config file not found: {path}")));
            }
            tracing::debug!("No molreward.toml found, using default scoring configuration");
            return Ok(Self::default());
        }

        Self::from_path(&path)
    }

    /// Dispatch on file extension (toml, yaml/yml, json).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            _ => Self::from_toml(path),
        }
    }

    /// Validate weights and numeric settings.
    pub fn validate(&self) -> Result<()> {
        if !self.weights.validate() {
            return Err(MolrewardError::Config(
                "reward weights must be finite and non-negative".into(),
            ));
        }
        if let Some((name, params)) = self.objectives.first_non_finite() {
            return Err(MolrewardError::Config(format!(
                "objectives.{name} must have finite k and x0, got k = {}, x0 = {}",
                params.k, params.x0
            )));
        }
        if !(self.reward_floor.is_finite() && (0.0..=1.0).contains(&self.reward_floor)) {
            return Err(MolrewardError::Config(format!(
                "reward_floor must lie in [0, 1], got {}",
                self.reward_floor
            )));
        }
        if self.features.fingerprint_bits == 0 {
            return Err(MolrewardError::Config("fingerprint_bits must be positive".into()));
        }
        Ok(())
    }

    fn checked(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.reward_floor, 0.01);
        assert_eq!(config.weights.potency, 0.35);
        assert_eq!(config.objectives.bbb, SigmoidParams::new(10.0, 0.7));
        assert_eq!(config.features.fingerprint_bits, 2048);
        assert!(config.predictors.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: ScoringConfig = toml::from_str("").unwrap();
        assert_eq!(config.weights.synthesis, 0.10);
        assert_eq!(config.candidate.max_sa_score, 4.5);
        assert_eq!(config.objectives.synthesis, SigmoidParams::new(1.0, -3.5));
    }

    #[test]
    fn test_partial_toml_overrides_single_field() {
        let config: ScoringConfig = toml::from_str(
            r#"
            [weights]
            potency = 0.5

            [objectives.cns]
            k = 12.0
            x0 = 0.4
            "#,
        )
        .unwrap();
        assert_eq!(config.weights.potency, 0.5);
        assert_eq!(config.weights.selectivity, 0.20);
        assert_eq!(config.objectives.cns, SigmoidParams::new(12.0, 0.4));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = ScoringConfig::default();
        config.weights.bbb = -0.1;
        assert!(matches!(config.validate(), Err(MolrewardError::Config(_))));
    }

    #[test]
    fn test_non_finite_sigmoid_rejected() {
        let mut config = ScoringConfig::default();
        config.objectives.cns.k = f64::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("objectives.cns"), "{err}");

        let mut config = ScoringConfig::default();
        config.objectives.potency.x0 = f64::INFINITY;
        assert!(matches!(config.validate(), Err(MolrewardError::Config(_))));
    }

    #[test]
    fn test_from_path_reads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "reward_floor = 0.02\n[batch]\nparallel_threshold = 0").unwrap();
        let config = ScoringConfig::from_path(file.path()).unwrap();
        assert_eq!(config.reward_floor, 0.02);
        assert_eq!(config.batch.parallel_threshold, 0);
    }

    #[test]
    fn test_from_path_reads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "weights:\n  cns: 0.3\n").unwrap();
        let config = ScoringConfig::from_path(file.path()).unwrap();
        assert_eq!(config.weights.cns, 0.3);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config: ScoringConfig =
            toml::from_str(include_str!("../../../molreward.example.toml")).unwrap();
        let defaults = ScoringConfig::default();
        assert_eq!(config.weights.potency, defaults.weights.potency);
        assert_eq!(config.objectives.synthesis, defaults.objectives.synthesis);
        assert_eq!(config.candidate.max_rotatable_bonds, defaults.candidate.max_rotatable_bonds);
        assert_eq!(config.batch.parallel_threshold, defaults.batch.parallel_threshold);
        assert!(config.predictors.is_none());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.weights.drug_likeness, parsed.weights.drug_likeness);
    }
}
