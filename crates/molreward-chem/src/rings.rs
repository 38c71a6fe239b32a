//! Ring perception.
//!
//! Ring membership is found by testing whether a bond's endpoints stay
//! connected once the bond is removed. The smallest set of smallest rings
//! is assembled from the shortest cycle through each ring bond, keeping
//! only cycles that are linearly independent over GF(2).

use std::collections::VecDeque;

use crate::molecule::{BondOrder, Molecule};

/// A ring as ordered atom and bond indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    pub atoms: Vec<usize>,
    pub bonds: Vec<usize>,
}

impl Ring {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Every bond in the ring is aromatic.
    pub fn is_aromatic(&self, mol: &Molecule) -> bool {
        self.bonds.iter().all(|&b| mol.bond(b).order == BondOrder::Aromatic)
    }
}

/// Cyclomatic number: bonds - atoms + connected components.
pub fn ring_count(mol: &Molecule) -> usize {
    (mol.bond_count() + mol.component_count()).saturating_sub(mol.atom_count())
}

/// Per-bond flag: true if the bond lies on at least one cycle.
pub fn ring_bond_flags(mol: &Molecule) -> Vec<bool> {
    (0..mol.bond_count())
        .map(|bi| {
            let bond = mol.bond(bi);
            shortest_path_avoiding(mol, bond.begin, bond.end, bi).is_some()
        })
        .collect()
}

/// Per-atom flag: true if the atom touches a ring bond.
pub fn ring_atom_flags(mol: &Molecule) -> Vec<bool> {
    let mut flags = vec![false; mol.atom_count()];
    for (bi, in_ring) in ring_bond_flags(mol).into_iter().enumerate() {
        if in_ring {
            let bond = mol.bond(bi);
            flags[bond.begin] = true;
            flags[bond.end] = true;
        }
    }
    flags
}

/// Smallest set of smallest rings.
pub fn sssr(mol: &Molecule) -> Vec<Ring> {
    let target = ring_count(mol);
    if target == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<Ring> = Vec::new();
    for bi in 0..mol.bond_count() {
        let bond = mol.bond(bi);
        if let Some((atoms, mut bonds)) = shortest_path_avoiding(mol, bond.begin, bond.end, bi) {
            bonds.push(bi);
            let ring = Ring { atoms, bonds };
            if !candidates.iter().any(|c| same_bond_set(c, &ring)) {
                candidates.push(ring);
            }
        }
    }
    candidates.sort_by_key(Ring::len);

    let words = mol.bond_count().div_ceil(64);
    let mut basis: Vec<(usize, Vec<u64>)> = Vec::new();
    let mut rings = Vec::new();

    for ring in candidates {
        let mut vector = vec![0u64; words];
        for &b in &ring.bonds {
            vector[b / 64] |= 1 << (b % 64);
        }
        for (pivot, row) in &basis {
            if vector[pivot / 64] & (1 << (pivot % 64)) != 0 {
                for (v, r) in vector.iter_mut().zip(row) {
                    *v ^= r;
                }
            }
        }
        if let Some(pivot) = lowest_set_bit(&vector) {
            basis.push((pivot, vector));
            rings.push(ring);
            if rings.len() == target {
                break;
            }
        }
    }
    rings
}

/// Number of SSSR rings whose bonds are all aromatic.
pub fn aromatic_ring_count(mol: &Molecule) -> usize {
    sssr(mol).iter().filter(|r| r.is_aromatic(mol)).count()
}

fn same_bond_set(a: &Ring, b: &Ring) -> bool {
    if a.bonds.len() != b.bonds.len() {
        return false;
    }
    let mut x = a.bonds.clone();
    let mut y = b.bonds.clone();
    x.sort_unstable();
    y.sort_unstable();
    x == y
}

fn lowest_set_bit(words: &[u64]) -> Option<usize> {
    words
        .iter()
        .enumerate()
        .find(|(_, &w)| w != 0)
        .map(|(i, w)| i * 64 + w.trailing_zeros() as usize)
}

/// BFS from `start` to `goal` without crossing `skip_bond`.
/// Returns the atom path (start..=goal) and the bonds along it.
fn shortest_path_avoiding(
    mol: &Molecule,
    start: usize,
    goal: usize,
    skip_bond: usize,
) -> Option<(Vec<usize>, Vec<usize>)> {
    let n = mol.atom_count();
    let mut parent: Vec<Option<(usize, usize)>> = vec![None; n];
    let mut seen = vec![false; n];
    seen[start] = true;
    let mut queue = VecDeque::from([start]);

    while let Some(curr) = queue.pop_front() {
        if curr == goal {
            break;
        }
        for &(next, bi) in mol.neighbors(curr) {
            if bi == skip_bond || seen[next] {
                continue;
            }
            seen[next] = true;
            parent[next] = Some((curr, bi));
            queue.push_back(next);
        }
    }

    if !seen[goal] {
        return None;
    }

    let mut atoms = vec![goal];
    let mut bonds = Vec::new();
    let mut curr = goal;
    while let Some((prev, bi)) = parent[curr] {
        atoms.push(prev);
        bonds.push(bi);
        curr = prev;
    }
    atoms.reverse();
    bonds.reverse();
    Some((atoms, bonds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn test_acyclic() {
        let mol = parse_smiles("CCCC").unwrap();
        assert_eq!(ring_count(&mol), 0);
        assert!(sssr(&mol).is_empty());
        assert!(ring_bond_flags(&mol).iter().all(|f| !f));
    }

    #[test]
    fn test_naphthalene() {
        let mol = parse_smiles("c1ccc2ccccc2c1").unwrap();
        assert_eq!(ring_count(&mol), 2);
        let rings = sssr(&mol);
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|r| r.len() == 6));
        assert_eq!(aromatic_ring_count(&mol), 2);
    }

    #[test]
    fn test_ring_membership_with_substituent() {
        // Toluene: the methyl is not a ring atom.
        let mol = parse_smiles("Cc1ccccc1").unwrap();
        let atoms = ring_atom_flags(&mol);
        assert!(!atoms[0]);
        assert!(atoms[1..].iter().all(|&f| f));
    }

    #[test]
    fn test_cyclohexane_not_aromatic() {
        let mol = parse_smiles("C1CCCCC1").unwrap();
        assert_eq!(sssr(&mol).len(), 1);
        assert_eq!(aromatic_ring_count(&mol), 0);
    }

    #[test]
    fn test_spiro_and_disconnected() {
        let mol = parse_smiles("C1CCC12CCC2.C1CC1").unwrap();
        assert_eq!(ring_count(&mol), 3);
        let sizes: Vec<usize> = sssr(&mol).iter().map(Ring::len).collect();
        assert_eq!(sizes, vec![3, 4, 4]);
    }
}
