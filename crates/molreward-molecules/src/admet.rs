//! ADMET heuristics for parsed molecules.

use serde::{Deserialize, Serialize};

use molreward_chem::Descriptors;
use molreward_common::CandidateThresholds;

/// Rule-of-five check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LipinskiResult {
    pub violations: u32,
    pub passes: bool,
}

/// Oral bioavailability check on polarity and flexibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VeberResult {
    pub tpsa_ok: bool,
    pub rotatable_bonds_ok: bool,
    pub passes: bool,
}

/// ADMET properties for a molecule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmetProperties {
    pub cns_mpo: f64,
    pub bbb_score: f64,
    pub lipinski: LipinskiResult,
    pub veber: VeberResult,
}

/// Predictor for ADMET properties.
#[derive(Debug, Clone, Default)]
pub struct AdmetPredictor {
    thresholds: CandidateThresholds,
}

impl AdmetPredictor {
    pub fn new(thresholds: CandidateThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &CandidateThresholds {
        &self.thresholds
    }

    /// Predict ADMET properties from a molecule's descriptors.
    pub fn predict(&self, desc: &Descriptors) -> AdmetProperties {
        AdmetProperties {
            cns_mpo: cns_mpo(desc),
            bbb_score: bbb_score(desc),
            lipinski: self.lipinski(desc),
            veber: self.veber(desc),
        }
    }

    pub fn lipinski(&self, desc: &Descriptors) -> LipinskiResult {
        let t = &self.thresholds;
        let mut violations = 0;
        if desc.mol_wt > t.max_mol_wt { violations += 1; }
        if desc.logp > t.max_logp { violations += 1; }
        if desc.h_donors > t.max_h_donors { violations += 1; }
        if desc.h_acceptors > t.max_h_acceptors { violations += 1; }

        LipinskiResult {
            violations,
            passes: violations == 0,
        }
    }

    pub fn veber(&self, desc: &Descriptors) -> VeberResult {
        let tpsa_ok = desc.tpsa <= self.thresholds.max_tpsa;
        let rotatable_bonds_ok = desc.rotatable_bonds <= self.thresholds.max_rotatable_bonds;
        VeberResult {
            tpsa_ok,
            rotatable_bonds_ok,
            passes: tpsa_ok && rotatable_bonds_ok,
        }
    }
}

/// CNS multi-parameter optimisation score in [0, 1]: the mean of four
/// desirability terms for logP, TPSA, MW and H-bond donors.
pub fn cns_mpo(desc: &Descriptors) -> f64 {
    let hbd = desc.h_donors as f64;
    let terms = [
        (-(desc.logp - 2.5).powi(2) / 2.0).exp(),
        (-(desc.tpsa - 75.0).powi(2) / (2.0 * 30.0_f64.powi(2))).exp(),
        (-(desc.mol_wt - 400.0).powi(2) / (2.0 * 100.0_f64.powi(2))).exp(),
        if hbd > 2.5 { (-(hbd - 2.5)).exp() } else { 1.0 },
    ];
    terms.iter().sum::<f64>() / terms.len() as f64
}

/// Blood-brain-barrier heuristic: 1.0 minus 0.1 per failed criterion
/// (TPSA > 90, HBD > 5, logP > 5). Not clamped.
pub fn bbb_score(desc: &Descriptors) -> f64 {
    let mut score = 1.0;
    if desc.tpsa > 90.0 { score -= 0.1; }
    if desc.h_donors > 5 { score -= 0.1; }
    if desc.logp > 5.0 { score -= 0.1; }
    score
}
