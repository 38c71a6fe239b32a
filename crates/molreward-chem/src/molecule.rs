//! Hydrogen-suppressed molecular graph.

use std::collections::VecDeque;

use crate::element::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to an atom's explicit valence. Aromatic bonds count as
    /// one; the extra pi electron is handled per atom.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    /// Stable small integer used in hashing.
    pub fn code(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: &'static Element,
    pub aromatic: bool,
    pub charge: i8,
    /// Attached hydrogens: explicit for bracket atoms, implicit otherwise
    pub hydrogens: u8,
    /// Written in brackets, so the hydrogen count and charge are exact
    pub bracket: bool,
    pub isotope: Option<u16>,
}

impl Atom {
    pub fn new(element: &'static Element) -> Self {
        Self {
            element,
            aromatic: false,
            charge: 0,
            hydrogens: 0,
            bracket: false,
            isotope: None,
        }
    }

    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

impl Bond {
    /// The atom at the other end of this bond.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom { self.end } else { self.begin }
    }
}

/// A parsed molecule. Immutable once sanitised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// (neighbor atom, bond index) per atom
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Add a bond. Returns `None` for self-loops and duplicate bonds.
    pub fn add_bond(&mut self, begin: usize, end: usize, order: BondOrder) -> Option<usize> {
        if begin == end || begin >= self.atoms.len() || end >= self.atoms.len() {
            return None;
        }
        if self.bond_between(begin, end).is_some() {
            return None;
        }
        let idx = self.bonds.len();
        self.bonds.push(Bond { begin, end, order });
        self.adjacency[begin].push((end, idx));
        self.adjacency[end].push((begin, idx));
        Some(idx)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    pub(crate) fn atom_mut(&mut self, idx: usize) -> &mut Atom {
        &mut self.atoms[idx]
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond(&self, idx: usize) -> &Bond {
        &self.bonds[idx]
    }

    pub(crate) fn set_bond_order(&mut self, idx: usize, order: BondOrder) {
        self.bonds[idx].order = order;
    }

    pub fn neighbors(&self, idx: usize) -> &[(usize, usize)] {
        &self.adjacency[idx]
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.adjacency[idx].len()
    }

    /// Degree ignoring explicit hydrogen atoms.
    pub fn heavy_degree(&self, idx: usize) -> usize {
        self.adjacency[idx]
            .iter()
            .filter(|&&(n, _)| !self.atoms[n].element.is_hydrogen())
            .count()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency
            .get(a)?
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bi)| &self.bonds[bi])
    }

    /// Sum of bond valence contributions around an atom.
    pub fn bond_order_sum(&self, idx: usize) -> u32 {
        self.adjacency[idx]
            .iter()
            .map(|&(_, bi)| self.bonds[bi].order.valence() as u32)
            .sum()
    }

    /// Implicit/bracket hydrogens plus explicit hydrogen neighbours.
    pub fn total_hydrogens(&self, idx: usize) -> u32 {
        let explicit = self.adjacency[idx]
            .iter()
            .filter(|&&(n, _)| self.atoms[n].element.is_hydrogen())
            .count() as u32;
        self.atoms[idx].hydrogens as u32 + explicit
    }

    pub fn has_bond_of_order(&self, idx: usize, order: BondOrder) -> bool {
        self.adjacency[idx]
            .iter()
            .any(|&(_, bi)| self.bonds[bi].order == order)
    }

    /// Any double or triple bond.
    pub fn is_unsaturated(&self, idx: usize) -> bool {
        self.has_bond_of_order(idx, BondOrder::Double) || self.has_bond_of_order(idx, BondOrder::Triple)
    }

    /// Non-hydrogen atom count.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| !a.element.is_hydrogen()).count()
    }

    /// Number of connected components.
    pub fn component_count(&self) -> usize {
        let n = self.atoms.len();
        let mut visited = vec![false; n];
        let mut count = 0;
        for start in 0..n {
            if visited[start] {
                continue;
            }
            count += 1;
            let mut queue = VecDeque::from([start]);
            visited[start] = true;
            while let Some(curr) = queue.pop_front() {
                for &(next, _) in &self.adjacency[curr] {
                    if !visited[next] {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::by_symbol;

    fn carbon() -> Atom {
        Atom::new(by_symbol("C").unwrap())
    }

    #[test]
    fn test_duplicate_and_self_bonds_rejected() {
        let mut mol = Molecule::new();
        let a = mol.add_atom(carbon());
        let b = mol.add_atom(carbon());
        assert!(mol.add_bond(a, b, BondOrder::Single).is_some());
        assert!(mol.add_bond(b, a, BondOrder::Double).is_none());
        assert!(mol.add_bond(a, a, BondOrder::Single).is_none());
        assert_eq!(mol.bond_count(), 1);
    }

    #[test]
    fn test_component_count() {
        let mut mol = Molecule::new();
        let a = mol.add_atom(carbon());
        let b = mol.add_atom(carbon());
        mol.add_atom(carbon());
        mol.add_bond(a, b, BondOrder::Single);
        assert_eq!(mol.component_count(), 2);
        assert_eq!(Molecule::new().component_count(), 0);
    }

    #[test]
    fn test_bond_order_sum() {
        let mut mol = Molecule::new();
        let a = mol.add_atom(carbon());
        let b = mol.add_atom(carbon());
        let c = mol.add_atom(carbon());
        mol.add_bond(a, b, BondOrder::Double);
        mol.add_bond(b, c, BondOrder::Single);
        assert_eq!(mol.bond_order_sum(b), 3);
        assert!(mol.is_unsaturated(a));
        assert!(!mol.is_unsaturated(c));
    }

    #[test]
    fn test_bond_order_sum_past_u8() {
        let mut mol = Molecule::new();
        let hub = mol.add_atom(carbon());
        for _ in 0..300 {
            let leaf = mol.add_atom(carbon());
            mol.add_bond(hub, leaf, BondOrder::Single);
        }
        assert_eq!(mol.bond_order_sum(hub), 300);
    }
}
