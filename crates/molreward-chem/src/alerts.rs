//! Structural alert catalogs.
//!
//! Alerts are SMARTS patterns (see [`crate::smarts`]). A catalog builds the
//! per-molecule match context once and runs every alert against it.

use tracing::warn;

use crate::molecule::Molecule;
use crate::smarts::{parse_smarts, MatchContext, SmartsError, SmartsPattern};

/// Anything that can flag a molecule as carrying an unwanted substructure.
pub trait StructuralFilter: Send + Sync {
    /// Name of the first alert that matches, if any.
    fn first_match(&self, mol: &Molecule) -> Option<&str>;

    fn has_match(&self, mol: &Molecule) -> bool {
        self.first_match(mol).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub name: String,
    pattern: SmartsPattern,
}

impl Alert {
    pub fn new(name: &str, smarts: &str) -> Result<Self, SmartsError> {
        Ok(Self {
            name: name.to_string(),
            pattern: parse_smarts(smarts)?,
        })
    }

    pub fn matches(&self, mol: &Molecule) -> bool {
        self.pattern.matches(mol)
    }

    fn matches_in(&self, ctx: &MatchContext<'_>) -> bool {
        self.pattern.matches_in(ctx)
    }
}

/// Representative pan-assay interference (PAINS) motifs.
const PAINS_PATTERNS: &[(&str, &str)] = &[
    ("catechol", "[OH]c1ccccc1[OH]"),
    ("hydroquinone", "[OH]c1ccc([OH])cc1"),
    ("quinone_para", "O=C1C=CC(=O)C=C1"),
    ("quinone_ortho", "O=C1C(=O)C=CC=C1"),
    ("ene_rhodanine", "S=C1SC(=C)C(=O)N1"),
    ("rhodanine", "S=C1SCC(=O)N1"),
    ("ene_five_het", "C=C1C(=O)NC(=O)S1"),
    ("azo_aryl", "cN=Nc"),
    ("hzone_phenol", "[OH]c1ccccc1C=NN"),
    ("hzone_aryl", "c[NH]N=C"),
    ("ene_cyano", "C=C(C#N)C#N"),
    ("mannich_phenol", "[OH]c1ccccc1CN(C)C"),
    ("amino_thiophene_ketone", "[NH2]c1sccc1C=O"),
    ("anthraquinone", "O=C1c2ccccc2C(=O)c2ccccc12"),
    ("dithiocarbamate", "NC(=S)S"),
    // Neutral nitrogen only: the nitro N is charged.
    ("nitroso", "C[N;+0]=O"),
    ("ene_one_ene", "C=CC(=O)C=C"),
    ("keto_keto_beta", "C(=O)C=C(O)"),
    ("thiourea_aryl", "c[NH]C(=S)N"),
];

/// An immutable, named set of alerts.
#[derive(Debug, Clone)]
pub struct AlertCatalog {
    name: String,
    alerts: Vec<Alert>,
}

impl AlertCatalog {
    /// Built-in PAINS-style catalog. Patterns that fail to parse are skipped.
    pub fn pains() -> Self {
        Self::lenient("pains", PAINS_PATTERNS)
    }

    /// Catalog that never matches.
    pub fn empty() -> Self {
        Self {
            name: "empty".to_string(),
            alerts: Vec::new(),
        }
    }

    /// Build a catalog from `(name, SMARTS)` pairs.
    pub fn from_patterns(name: &str, patterns: &[(&str, &str)]) -> Result<Self, SmartsError> {
        let alerts = patterns
            .iter()
            .map(|&(alert, pattern)| Alert::new(alert, pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            alerts,
        })
    }

    /// Like [`AlertCatalog::from_patterns`], but unparsable patterns are
    /// logged and left out.
    pub(crate) fn lenient(name: &str, patterns: &[(&str, &str)]) -> Self {
        let alerts = patterns
            .iter()
            .filter_map(|&(alert, pattern)| match Alert::new(alert, pattern) {
                Ok(alert) => Some(alert),
                Err(e) => {
                    warn!(catalog = name, alert, error = %e, "Skipping unparsable alert pattern");
                    None
                }
            })
            .collect();
        Self {
            name: name.to_string(),
            alerts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Number of distinct alerts present.
    pub fn count_matches(&self, mol: &Molecule) -> usize {
        if self.alerts.is_empty() {
            return 0;
        }
        self.count_matches_in(&MatchContext::new(mol))
    }

    pub(crate) fn count_matches_in(&self, ctx: &MatchContext<'_>) -> usize {
        self.alerts.iter().filter(|a| a.matches_in(ctx)).count()
    }
}

impl StructuralFilter for AlertCatalog {
    fn first_match(&self, mol: &Molecule) -> Option<&str> {
        if self.alerts.is_empty() {
            return None;
        }
        let ctx = MatchContext::new(mol);
        self.alerts
            .iter()
            .find(|a| a.matches_in(&ctx))
            .map(|a| a.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn mol(s: &str) -> Molecule {
        parse_smiles(s).unwrap()
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = AlertCatalog::pains();
        assert_eq!(catalog.len(), PAINS_PATTERNS.len());
        assert_eq!(catalog.name(), "pains");
    }

    #[test]
    fn test_catechol_flagged() {
        let catalog = AlertCatalog::pains();
        assert_eq!(catalog.first_match(&mol("Oc1ccccc1O")), Some("catechol"));
        assert!(catalog.has_match(&mol("CCc1ccc(O)c(O)c1")));
    }

    #[test]
    fn test_clean_molecules_pass() {
        let catalog = AlertCatalog::pains();
        for smi in [
            "CCO",
            "c1ccccc1",
            "CC(=O)Oc1ccccc1C(=O)O",
            "CN1C=NC2=C1C(=O)N(C(=O)N2C)C",
            "CC(C)Cc1ccc(cc1)C(C)C(=O)O",
            "Oc1ccccc1",
        ] {
            assert_eq!(catalog.first_match(&mol(smi)), None, "{smi} unexpectedly flagged");
        }
    }

    #[test]
    fn test_nitro_is_not_nitroso() {
        let catalog = AlertCatalog::pains();
        assert_eq!(catalog.first_match(&mol("CC[N+](=O)[O-]")), None);
        assert_eq!(catalog.first_match(&mol("CCCC[N+](=O)[O-]")), None);
        assert_eq!(catalog.first_match(&mol("CCN=O")), Some("nitroso"));
    }

    #[test]
    fn test_empty_catalog_never_matches() {
        let catalog = AlertCatalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.first_match(&mol("Oc1ccccc1O")).is_none());
    }

    #[test]
    fn test_from_patterns() {
        let catalog = AlertCatalog::from_patterns("custom", &[("ether", "COC")]).unwrap();
        assert!(catalog.has_match(&mol("CCOCC")));
        assert!(!catalog.has_match(&mol("CCCCC")));
        assert!(AlertCatalog::from_patterns("bad", &[("x", "C1CC")]).is_err());
    }

    #[test]
    fn test_alert_matches_single_molecule() {
        let alert = Alert::new("aldehyde", "[CH]=O").unwrap();
        assert!(alert.matches(&mol("CCC=O")));
        // Ketone carbon carries no hydrogen.
        assert!(!alert.matches(&mol("CC(=O)C")));
    }

    #[test]
    fn test_lenient_catalog_skips_bad_patterns() {
        let catalog = AlertCatalog::lenient("mixed", &[("ok", "C=O"), ("broken", "C1CC")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.count_matches(&mol("CC=O")), 1);
    }
}
