//! Valence sanitisation.
//!
//! A parsed molecule is chemically acceptable when every atom's bonded
//! valence (bond orders plus hydrogens) matches one of its allowed,
//! charge-adjusted valences, every aromatic atom sits in a ring, and the
//! aromatic system has a Kekulé structure.

use thiserror::Error;

use crate::molecule::{BondOrder, Molecule};
use crate::rings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValenceError {
    #[error("atom {index} ({symbol}) has valence {found}, allowed maximum is {allowed}")]
    Exceeded {
        index: usize,
        symbol: &'static str,
        found: u32,
        allowed: u32,
    },

    #[error("aromatic atom {index} ({symbol}) is not in a ring")]
    AromaticOutsideRing { index: usize, symbol: &'static str },

    #[error("cannot kekulize aromatic system at atom {index} ({symbol})")]
    Kekulize { index: usize, symbol: &'static str },
}

/// Upper bound on backtracking steps while assigning aromatic double bonds.
const KEKULIZE_STEP_LIMIT: usize = 100_000;

/// Check every atom's valence. Returns the first violation found.
pub fn sanitize(mol: &Molecule) -> Result<(), ValenceError> {
    let ring_atoms = rings::ring_atom_flags(mol);

    for (idx, atom) in mol.atoms().iter().enumerate() {
        let symbol = atom.element.symbol;

        if atom.aromatic && !ring_atoms[idx] {
            return Err(ValenceError::AromaticOutsideRing { index: idx, symbol });
        }

        let mut found = mol.bond_order_sum(idx).saturating_add(atom.hydrogens as u32);
        // An aromatic carbon contributes one more electron to its ring,
        // unless it already has an exocyclic double bond (c=O in caffeine).
        if atom.aromatic
            && (atom.element.is_carbon() || atom.element.atomic_number == 5)
            && !mol.has_bond_of_order(idx, BondOrder::Double)
        {
            found += 1;
        }
        let allowed = max_allowed_valence(atom.element.atomic_number, atom.element.max_valence(), atom.charge);

        if found > allowed {
            return Err(ValenceError::Exceeded {
                index: idx,
                symbol,
                found,
                allowed,
            });
        }
    }
    kekulize(mol)
}

/// Check that the aromatic bonds admit alternating single and double bonds.
///
/// Every aromatic atom with a free valence (pyridine-type N, ring carbons
/// without an exocyclic double bond) must receive exactly one double bond
/// from an aromatic neighbour that also needs one. `[nH]`, furan O, thiophene
/// S and `c=O` carbons contribute a lone pair or are already saturated.
fn kekulize(mol: &Molecule) -> Result<(), ValenceError> {
    let needs = pi_demand(mol);
    let Some(first) = needs.iter().position(|&n| n) else {
        return Ok(());
    };
    let failure = || ValenceError::Kekulize {
        index: first,
        symbol: mol.atom(first).element.symbol,
    };

    if needs.iter().filter(|&&n| n).count() % 2 == 1 {
        return Err(failure());
    }
    let mut mate = vec![None; mol.atom_count()];
    let mut budget = KEKULIZE_STEP_LIMIT;
    if assign_double_bonds(mol, &needs, &mut mate, &mut budget) {
        Ok(())
    } else {
        Err(failure())
    }
}

fn pi_demand(mol: &Molecule) -> Vec<bool> {
    (0..mol.atom_count()).map(|idx| needs_pi_bond(mol, idx)).collect()
}

/// An aromatic atom whose bonds and hydrogens leave one valence unit for
/// a ring double bond.
fn needs_pi_bond(mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    if !atom.aromatic {
        return false;
    }
    let used = mol.bond_order_sum(idx).saturating_add(atom.hydrogens as u32);
    let target = if atom.charge == 0 {
        atom.element.valences.iter().map(|&v| v as u32).find(|&v| v >= used)
    } else {
        Some(max_allowed_valence(atom.element.atomic_number, atom.element.max_valence(), atom.charge))
    };
    matches!(target, Some(t) if t > used)
}

/// Total valence of a sanitised atom: bond orders, hydrogens and the ring
/// double bond an aromatic atom receives in its Kekulé form.
pub fn total_valence(mol: &Molecule, idx: usize) -> u32 {
    let base = mol.bond_order_sum(idx).saturating_add(mol.atom(idx).hydrogens as u32);
    base + u32::from(needs_pi_bond(mol, idx))
}

/// Backtracking perfect matching over aromatic bonds, always extending the
/// unmatched atom with the fewest free partners.
fn assign_double_bonds(mol: &Molecule, needs: &[bool], mate: &mut [Option<usize>], budget: &mut usize) -> bool {
    let free_partners = |mate: &[Option<usize>], idx: usize| -> Vec<usize> {
        mol.neighbors(idx)
            .iter()
            .filter(|&&(n, bi)| needs[n] && mate[n].is_none() && mol.bond(bi).order == BondOrder::Aromatic)
            .map(|&(n, _)| n)
            .collect()
    };

    let mut best: Option<(usize, Vec<usize>)> = None;
    for idx in (0..needs.len()).filter(|&i| needs[i] && mate[i].is_none()) {
        let partners = free_partners(mate, idx);
        if partners.is_empty() {
            return false;
        }
        let forced = partners.len() == 1;
        if best.as_ref().map_or(true, |(_, p)| partners.len() < p.len()) {
            best = Some((idx, partners));
        }
        if forced {
            break;
        }
    }
    let Some((idx, partners)) = best else {
        return true;
    };

    for partner in partners {
        if *budget == 0 {
            return false;
        }
        *budget -= 1;
        mate[idx] = Some(partner);
        mate[partner] = Some(idx);
        if assign_double_bonds(mol, needs, mate, budget) {
            return true;
        }
        mate[idx] = None;
        mate[partner] = None;
    }
    false
}

/// Largest valence permitted for an element at a given formal charge.
///
/// Group 15-17 atoms gain a bond per positive charge (ammonium, oxonium) and
/// lose one per negative charge. Carbon, boron, silicon and the metals lose a
/// bond per unit of charge in either direction.
fn max_allowed_valence(atomic_number: u8, neutral_max: u8, charge: i8) -> u32 {
    let neutral_max = neutral_max as i32;
    let charge = charge as i32;
    let adjusted = match atomic_number {
        6 | 5 | 14 | 3 | 11 | 12 | 19 | 20 => neutral_max - charge.abs(),
        // N and P: the hypervalent state is only reachable when neutral.
        7 | 15 if charge != 0 => 3 + charge,
        _ => neutral_max + charge,
    };
    adjusted.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn check(smiles: &str) -> Result<(), ValenceError> {
        sanitize(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn test_common_molecules_pass() {
        for smi in [
            "CCO",
            "c1ccccc1",
            "CC(=O)Oc1ccccc1C(=O)O",
            "C[N+](C)(C)C",
            "[O-][N+](=O)c1ccccc1",
            "CS(=O)(=O)N",
            "c1cc[nH]c1",
            "Cn1cnc2c1c(=O)n(C)c(=O)n2C",
            "[Na+].[Cl-]",
        ] {
            assert!(check(smi).is_ok(), "{smi} should sanitise");
        }
    }

    #[test]
    fn test_pentavalent_carbon_rejected() {
        let err = check("C(C)(C)(C)(C)C").unwrap_err();
        assert!(matches!(err, ValenceError::Exceeded { symbol: "C", found: 5, .. }));
    }

    #[test]
    fn test_overbonded_oxygen_rejected() {
        assert!(check("CO(C)C").is_err());
        // Oxonium is fine.
        assert!(check("C[O+](C)C").is_ok());
    }

    #[test]
    fn test_charged_nitrogen_limits() {
        assert!(check("C[N+](C)(C)(C)C").is_err());
        assert!(check("C[N-]C").is_ok());
    }

    #[test]
    fn test_kekulizable_rings_pass() {
        for smi in [
            "c1ccccc1",
            "c1cc[nH]c1",
            "c1ccoc1",
            "c1ccsc1",
            "c1ccncc1",
            "c1ccc2ccccc2c1",
            "c1ccc2[nH]ccc2c1",
            "Cn1cnc2c1c(=O)n(C)c(=O)n2C",
            "c1cc[nH+]cc1",
            "[O-][n+]1ccccc1",
        ] {
            assert!(check(smi).is_ok(), "{smi} should kekulize");
        }
    }

    #[test]
    fn test_unkekulizable_rings_rejected() {
        for smi in ["c1cccc1", "c1ccnc1", "c1cccccc1", "c1ccc2cccc2c1"] {
            let err = check(smi).unwrap_err();
            assert!(matches!(err, ValenceError::Kekulize { .. }), "{smi}: {err}");
        }
    }

    #[test]
    fn test_total_valence() {
        let mol = parse_smiles("c1ccncc1").unwrap();
        assert!((0..mol.atom_count()).filter(|&i| i != 3).all(|i| total_valence(&mol, i) == 4));
        assert_eq!(total_valence(&mol, 3), 3);

        let pyrrole = parse_smiles("c1cc[nH]c1").unwrap();
        assert_eq!(total_valence(&pyrrole, 3), 3);
        let nitro = parse_smiles("C[N+](=O)[O-]").unwrap();
        assert_eq!(total_valence(&nitro, 1), 4);
        assert_eq!(total_valence(&nitro, 3), 1);
    }

    #[test]
    fn test_acyclic_aromatic_rejected() {
        let err = check("cc").unwrap_err();
        assert!(matches!(err, ValenceError::AromaticOutsideRing { .. }));
    }
}
