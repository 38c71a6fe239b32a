//! Validity gating and drug-likeness screening.
//!
//! A SMILES string is fit for scoring when it parses, passes valence
//! sanitisation and matches none of the structural alerts. The
//! drug-likeness screen is stricter and is exposed separately as a
//! candidate filter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use molreward_chem::{parse_smiles, sanitize, Descriptors, Molecule, ParseError, StructuralFilter, ValenceError};

use crate::admet::{AdmetPredictor, LipinskiResult, VeberResult};
use crate::evaluator::PropertyEvaluator;

/// Why a SMILES string was turned away.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("unparseable SMILES: {0}")]
    Parse(#[from] ParseError),

    #[error("sanitisation failed: {0}")]
    Valence(#[from] ValenceError),

    #[error("structural alert '{alert}'")]
    StructuralAlert { alert: String },
}

/// Parse, sanitise and alert-check a SMILES string.
pub fn screen(smiles: &str, alerts: &dyn StructuralFilter) -> Result<Molecule, Rejection> {
    let mol = parse_and_sanitize(smiles)?;
    if let Some(alert) = alerts.first_match(&mol) {
        return Err(Rejection::StructuralAlert { alert: alert.to_string() });
    }
    Ok(mol)
}

pub fn is_valid_for_scoring(smiles: &str, alerts: &dyn StructuralFilter) -> bool {
    screen(smiles, alerts).is_ok()
}

fn parse_and_sanitize(smiles: &str) -> Result<Molecule, Rejection> {
    let mol = parse_smiles(smiles)?;
    sanitize(&mol)?;
    Ok(mol)
}

// ---------------------------------------------------------------------------
// Drug-likeness candidate screen
// ---------------------------------------------------------------------------

/// Every criterion of the candidate screen, evaluated independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub smiles: String,
    pub qed: f64,
    pub qed_ok: bool,
    pub cns_mpo: f64,
    pub cns_mpo_ok: bool,
    pub lipinski: LipinskiResult,
    pub veber: VeberResult,
    /// First matching alert, if any
    pub structural_alert: Option<String>,
    pub sa_score: f64,
    pub sa_ok: bool,
}

impl CandidateReport {
    pub fn passes(&self) -> bool {
        self.qed_ok
            && self.cns_mpo_ok
            && self.lipinski.passes
            && self.veber.passes
            && self.structural_alert.is_none()
            && self.sa_ok
    }

    /// Apply the thresholds to already computed properties. QED and CNS MPO
    /// must exceed their minimum; the SA score may equal its maximum.
    pub(crate) fn from_properties(
        smiles: &str,
        desc: &Descriptors,
        admet: &AdmetPredictor,
        sa_score: f64,
        structural_alert: Option<String>,
    ) -> Self {
        let t = admet.thresholds();
        let props = admet.predict(desc);
        Self {
            smiles: smiles.to_string(),
            qed: desc.qed,
            qed_ok: desc.qed > t.min_qed,
            cns_mpo: props.cns_mpo,
            cns_mpo_ok: props.cns_mpo > t.min_cns_mpo,
            lipinski: props.lipinski,
            veber: props.veber,
            structural_alert,
            sa_score,
            sa_ok: sa_score <= t.max_sa_score,
        }
    }
}

/// Evaluate the candidate screen. Only unparseable or unsanitisable
/// input is an error; alert hits are reported in the result.
pub fn assess_candidate(smiles: &str, evaluator: &PropertyEvaluator) -> Result<CandidateReport, Rejection> {
    let mol = parse_and_sanitize(smiles)?;
    let desc = Descriptors::compute(&mol);
    let alert = evaluator.alerts().first_match(&mol).map(str::to_string);
    let sa = evaluator.sa().score(&mol, &desc);
    Ok(CandidateReport::from_properties(smiles, &desc, evaluator.admet(), sa.score, alert))
}

/// True only if every candidate criterion holds. Unparseable input is false.
pub fn is_drug_like_candidate(smiles: &str, evaluator: &PropertyEvaluator) -> bool {
    assess_candidate(smiles, evaluator)
        .map(|report| report.passes())
        .unwrap_or(false)
}
