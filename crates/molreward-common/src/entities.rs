/// Core entity types shared by the evaluator and the reward aggregator.
/// A `PropertyRecord` is built once per molecule and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Synthetic accessibility provenance
// ---------------------------------------------------------------------------

/// Which scoring path produced a record's SA score.
/// Scores from different paths are not numerically comparable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaMethod {
    /// A dedicated SA algorithm supplied by the host.
    Dedicated { name: String },
    /// The descriptor-based fallback approximation.
    Approximate,
}

// ---------------------------------------------------------------------------
// Potency block
// ---------------------------------------------------------------------------

/// One pIC50 estimate for a named biological target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotencyEstimate {
    pub target: String,
    pub pic50: f64,
}

/// Predictor-derived fields. Present as a whole or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotencyBlock {
    pub primary: PotencyEstimate,
    pub off_target_a: PotencyEstimate,
    pub off_target_b: PotencyEstimate,
    /// primary - max(off_target_a, off_target_b)
    pub selectivity: f64,
}

impl PotencyBlock {
    pub fn new(primary: PotencyEstimate, off_target_a: PotencyEstimate, off_target_b: PotencyEstimate) -> Self {
        let selectivity = primary.pic50 - off_target_a.pic50.max(off_target_b.pic50);
        Self {
            primary,
            off_target_a,
            off_target_b,
            selectivity,
        }
    }
}

// ---------------------------------------------------------------------------
// Property record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub smiles: String,
    pub qed: f64,
    pub cns_mpo: f64,
    pub sa_score: f64,
    pub sa_method: SaMethod,
    pub ring_count: u32,
    pub mol_wt: f64,
    /// Heuristic in [0.7, 1.0] for the default penalties; not clamped.
    pub bbb_score: f64,
    pub potency: Option<PotencyBlock>,
}

impl PropertyRecord {
    pub fn has_potency(&self) -> bool {
        self.potency.is_some()
    }

    /// Primary-target pIC50, if predictors were used.
    pub fn primary_pic50(&self) -> Option<f64> {
        self.potency.as_ref().map(|p| p.primary.pic50)
    }

    pub fn selectivity(&self) -> Option<f64> {
        self.potency.as_ref().map(|p| p.selectivity)
    }

    /// Flatten into a table row keyed by column name.
    pub fn to_row(&self) -> BTreeMap<String, f64> {
        let mut row = BTreeMap::new();
        row.insert("QED".to_string(), self.qed);
        row.insert("CNS_MPO".to_string(), self.cns_mpo);
        row.insert("SA_Score".to_string(), self.sa_score);
        row.insert("RingCount".to_string(), self.ring_count as f64);
        row.insert("MolWt".to_string(), self.mol_wt);
        row.insert("BBB_Score".to_string(), self.bbb_score);

        if let Some(ref p) = self.potency {
            for est in [&p.primary, &p.off_target_a, &p.off_target_b] {
                row.insert(format!("pIC50_{}", est.target), est.pic50);
            }
            row.insert("Selectivity_Score".to_string(), p.selectivity);
        }
        row
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base_record() -> PropertyRecord {
        PropertyRecord {
            smiles: "CCO".to_string(),
            qed: 0.41,
            cns_mpo: 0.52,
            sa_score: 2.9,
            sa_method: SaMethod::Approximate,
            ring_count: 0,
            mol_wt: 46.069,
            bbb_score: 1.0,
            potency: None,
        }
    }

    #[test]
    fn test_selectivity_uses_max_off_target() {
        let block = PotencyBlock::new(
            PotencyEstimate { target: "KEAP1".into(), pic50: 8.0 },
            PotencyEstimate { target: "EGFR".into(), pic50: 5.5 },
            PotencyEstimate { target: "IKKb".into(), pic50: 6.25 },
        );
        assert!((block.selectivity - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_row_without_potency_has_only_required_keys() {
        let row = base_record().to_row();
        assert_eq!(row.len(), 6);
        assert!(!row.contains_key("Selectivity_Score"));
        assert_eq!(row["RingCount"], 0.0);
    }

    #[test]
    fn test_row_with_potency_has_all_optional_keys() {
        let mut record = base_record();
        record.potency = Some(PotencyBlock::new(
            PotencyEstimate { target: "KEAP1".into(), pic50: 7.0 },
            PotencyEstimate { target: "EGFR".into(), pic50: 5.0 },
            PotencyEstimate { target: "IKKb".into(), pic50: 4.0 },
        ));
        let row = record.to_row();
        assert_eq!(row.len(), 10);
        assert_eq!(row["pIC50_KEAP1"], 7.0);
        assert_eq!(row["pIC50_EGFR"], 5.0);
        assert_eq!(row["pIC50_IKKb"], 4.0);
        assert_eq!(row["Selectivity_Score"], 2.0);
    }

    #[test]
    fn test_sa_method_serializes_tagged() {
        let json = serde_json::to_string(&SaMethod::Approximate).unwrap();
        assert_eq!(json, r#"{"kind":"approximate"}"#);
        let dedicated = SaMethod::Dedicated { name: "ertl".into() };
        let json = serde_json::to_string(&dedicated).unwrap();
        assert_eq!(json, r#"{"kind":"dedicated","name":"ertl"}"#);
    }
}
