//! SMILES parser.
//!
//! Supports the organic subset, bracket atoms (isotope, chirality, hydrogen
//! count, charge, atom class), branches, ring closures (`1`-`9`, `%nn`),
//! explicit bonds (`- = # : / \`) and dot-disconnected fragments.
//! Stereo markers are accepted and discarded.

use std::collections::HashMap;

use thiserror::Error;

use crate::element::{self, Element};
use crate::molecule::{Atom, BondOrder, Molecule};
use crate::rings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty SMILES")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unknown element '{symbol}' at position {pos}")]
    UnknownElement { symbol: String, pos: usize },

    #[error("unterminated bracket atom starting at position {pos}")]
    UnterminatedBracket { pos: usize },

    #[error("unbalanced parenthesis at position {pos}")]
    UnbalancedBranch { pos: usize },

    #[error("ring closure {label} is never closed")]
    UnclosedRing { label: u16 },

    #[error("invalid ring closure {label} at position {pos}")]
    InvalidRingClosure { label: u16, pos: usize },

    #[error("bond at position {pos} is not followed by an atom")]
    DanglingBond { pos: usize },

    #[error("conflicting bond orders on ring closure {label}")]
    RingBondConflict { label: u16 },
}

/// Parse a SMILES string into a molecule with implicit hydrogens assigned.
/// The result is not valence-checked; see [`crate::valence::sanitize`].
pub fn parse_smiles(smiles: &str) -> Result<Molecule, ParseError> {
    let trimmed = smiles.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut mol = Parser::new(trimmed).run()?;
    assign_implicit_hydrogens(&mut mol);
    demote_acyclic_aromatic_bonds(&mut mol);
    Ok(mol)
}

struct RingOpening {
    atom: usize,
    bond: Option<BondOrder>,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    mol: Molecule,
    prev: Option<usize>,
    branches: Vec<usize>,
    pending_bond: Option<(BondOrder, usize)>,
    rings: HashMap<u16, RingOpening>,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            mol: Molecule::new(),
            prev: None,
            branches: Vec::new(),
            pending_bond: None,
            rings: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn unexpected(&self, ch: char) -> ParseError {
        ParseError::UnexpectedChar { ch, pos: self.pos }
    }

    fn run(mut self) -> Result<Molecule, ParseError> {
        while let Some(ch) = self.peek() {
            match ch {
                '(' => {
                    let prev = match (self.prev, self.pending_bond) {
                        (Some(p), None) => p,
                        _ => return Err(self.unexpected(ch)),
                    };
                    self.branches.push(prev);
                    self.pos += 1;
                }
                ')' => {
                    if let Some((_, pos)) = self.pending_bond {
                        return Err(ParseError::DanglingBond { pos });
                    }
                    let restored = self
                        .branches
                        .pop()
                        .ok_or(ParseError::UnbalancedBranch { pos: self.pos })?;
                    self.prev = Some(restored);
                    self.pos += 1;
                }
                '-' | '=' | '#' | ':' | '/' | '\\' => {
                    if self.prev.is_none() || self.pending_bond.is_some() {
                        return Err(self.unexpected(ch));
                    }
                    let order = match ch {
                        '=' => BondOrder::Double,
                        '#' => BondOrder::Triple,
                        ':' => BondOrder::Aromatic,
                        _ => BondOrder::Single,
                    };
                    self.pending_bond = Some((order, self.pos));
                    self.pos += 1;
                }
                '.' => {
                    if let Some((_, pos)) = self.pending_bond {
                        return Err(ParseError::DanglingBond { pos });
                    }
                    if self.prev.is_none() {
                        return Err(self.unexpected(ch));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                '0'..='9' | '%' => self.ring_closure()?,
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.attach(atom)?;
                }
                c if c.is_ascii_alphabetic() => {
                    let atom = self.organic_atom()?;
                    self.attach(atom)?;
                }
                _ => return Err(self.unexpected(ch)),
            }
        }

        if let Some((_, pos)) = self.pending_bond {
            return Err(ParseError::DanglingBond { pos });
        }
        if !self.branches.is_empty() {
            return Err(ParseError::UnbalancedBranch { pos: self.chars.len() });
        }
        if let Some(&label) = self.rings.keys().min() {
            return Err(ParseError::UnclosedRing { label });
        }
        if self.mol.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(self.mol)
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.mol.atom(a).aromatic && self.mol.atom(b).aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn attach(&mut self, atom: Atom) -> Result<(), ParseError> {
        let idx = self.mol.add_atom(atom);
        match self.prev {
            Some(prev) => {
                let order = match self.pending_bond.take() {
                    Some((order, _)) => order,
                    None => self.default_order(prev, idx),
                };
                self.mol.add_bond(prev, idx, order);
            }
            None => {
                if let Some((_, pos)) = self.pending_bond {
                    return Err(ParseError::DanglingBond { pos });
                }
            }
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn ring_closure(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let label = if self.peek() == Some('%') {
            let d1 = self.peek_at(1).and_then(|c| c.to_digit(10));
            let d2 = self.peek_at(2).and_then(|c| c.to_digit(10));
            match (d1, d2) {
                (Some(a), Some(b)) => {
                    self.pos += 3;
                    (a * 10 + b) as u16
                }
                _ => return Err(self.unexpected('%')),
            }
        } else {
            let d = self.peek().and_then(|c| c.to_digit(10)).unwrap_or(0);
            self.pos += 1;
            d as u16
        };

        let current = self.prev.ok_or(ParseError::InvalidRingClosure { label, pos: start })?;
        let pending = self.pending_bond.take().map(|(order, _)| order);

        match self.rings.remove(&label) {
            Some(opening) => {
                let order = match (opening.bond, pending) {
                    (Some(a), Some(b)) if a != b => return Err(ParseError::RingBondConflict { label }),
                    (Some(a), _) => a,
                    (None, Some(b)) => b,
                    (None, None) => self.default_order(opening.atom, current),
                };
                if self.mol.add_bond(opening.atom, current, order).is_none() {
                    return Err(ParseError::InvalidRingClosure { label, pos: start });
                }
            }
            None => {
                self.rings.insert(label, RingOpening { atom: current, bond: pending });
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, ParseError> {
        let start = self.pos;
        let c = self.peek().ok_or(ParseError::Empty)?;
        let next = self.peek_at(1);

        let (symbol, aromatic, len) = match (c, next) {
            ('C', Some('l')) => ("Cl", false, 2),
            ('B', Some('r')) => ("Br", false, 2),
            ('B', _) => ("B", false, 1),
            ('C', _) => ("C", false, 1),
            ('N', _) => ("N", false, 1),
            ('O', _) => ("O", false, 1),
            ('P', _) => ("P", false, 1),
            ('S', _) => ("S", false, 1),
            ('F', _) => ("F", false, 1),
            ('I', _) => ("I", false, 1),
            ('b', _) => ("B", true, 1),
            ('c', _) => ("C", true, 1),
            ('n', _) => ("N", true, 1),
            ('o', _) => ("O", true, 1),
            ('p', _) => ("P", true, 1),
            ('s', _) => ("S", true, 1),
            _ => return Err(ParseError::UnexpectedChar { ch: c, pos: start }),
        };
        let element = lookup(symbol, start)?;
        self.pos += len;

        let mut atom = Atom::new(element);
        atom.aromatic = aromatic;
        Ok(atom)
    }

    fn bracket_atom(&mut self) -> Result<Atom, ParseError> {
        let open = self.pos;
        self.pos += 1; // '['

        let isotope = self.number();

        let sym_start = self.pos;
        let c = self.peek().ok_or(ParseError::UnterminatedBracket { pos: open })?;
        let (element, aromatic) = if c.is_ascii_lowercase() {
            let two: String = [Some(c), self.peek_at(1)].iter().flatten().collect();
            if matches!(two.as_str(), "se" | "as") {
                self.pos += 2;
                (lookup(&capitalize(&two), sym_start)?, true)
            } else if matches!(c, 'b' | 'c' | 'n' | 'o' | 'p' | 's') {
                self.pos += 1;
                (lookup(&c.to_ascii_uppercase().to_string(), sym_start)?, true)
            } else {
                return Err(ParseError::UnknownElement { symbol: c.to_string(), pos: sym_start });
            }
        } else if c.is_ascii_uppercase() {
            match self.peek_at(1).filter(|n| n.is_ascii_lowercase()) {
                Some(n) if element::by_symbol(&format!("{c}{n}")).is_some() => {
                    self.pos += 2;
                    (lookup(&format!("{c}{n}"), sym_start)?, false)
                }
                _ => {
                    self.pos += 1;
                    (lookup(&c.to_string(), sym_start)?, false)
                }
            }
        } else {
            return Err(ParseError::UnknownElement { symbol: c.to_string(), pos: sym_start });
        };

        self.skip_chirality();

        let mut hydrogens = 0u8;
        if self.peek() == Some('H') {
            self.pos += 1;
            hydrogens = self.number().map(|n| n.min(u8::MAX as u32) as u8).unwrap_or(1);
        }

        let charge = self.charge()?;

        if self.peek() == Some(':') {
            self.pos += 1;
            if self.number().is_none() {
                return Err(self.unexpected(':'));
            }
        }

        match self.peek() {
            Some(']') => self.pos += 1,
            Some(other) => return Err(self.unexpected(other)),
            None => return Err(ParseError::UnterminatedBracket { pos: open }),
        }

        Ok(Atom {
            element,
            aromatic,
            charge,
            hydrogens,
            bracket: true,
            isotope: isotope.map(|n| n.min(u16::MAX as u32) as u16),
        })
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            value = value.saturating_mul(10).saturating_add(d);
            self.pos += 1;
        }
        (self.pos > start).then_some(value)
    }

    fn skip_chirality(&mut self) {
        if self.peek() != Some('@') {
            return;
        }
        while self.peek() == Some('@') {
            self.pos += 1;
        }
        let tag: String = [self.peek(), self.peek_at(1)].iter().flatten().collect();
        if matches!(tag.as_str(), "TH" | "AL" | "SP" | "TB" | "OH") {
            self.pos += 2;
            self.number();
        }
    }

    fn charge(&mut self) -> Result<i8, ParseError> {
        let sign = match self.peek() {
            Some('+') => 1i32,
            Some('-') => -1i32,
            _ => return Ok(0),
        };
        let sign_char = if sign > 0 { '+' } else { '-' };
        self.pos += 1;

        let magnitude = match self.number() {
            Some(n) => n as i32,
            None => {
                let mut count = 1;
                while self.peek() == Some(sign_char) {
                    count += 1;
                    self.pos += 1;
                }
                count
            }
        };
        i8::try_from(sign * magnitude).map_err(|_| self.unexpected(sign_char))
    }
}

fn lookup(symbol: &str, pos: usize) -> Result<&'static Element, ParseError> {
    element::by_symbol(symbol).ok_or_else(|| ParseError::UnknownElement {
        symbol: symbol.to_string(),
        pos,
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Fill in implicit hydrogens for organic-subset atoms.
fn assign_implicit_hydrogens(mol: &mut Molecule) {
    for idx in 0..mol.atom_count() {
        let atom = mol.atom(idx);
        if atom.bracket {
            continue;
        }
        let bonded = mol.bond_order_sum(idx);
        let hydrogens = if atom.aromatic {
            // Only aromatic carbon carries implicit H; pyrrole-type N must be written [nH].
            if atom.element.is_carbon() {
                4u32.saturating_sub(bonded.saturating_add(1))
            } else {
                0
            }
        } else {
            atom.element
                .valences
                .iter()
                .map(|&v| v as u32)
                .find(|&v| v >= bonded)
                .map(|v| v - bonded)
                .unwrap_or(0)
        };
        let hydrogens = u8::try_from(hydrogens).unwrap_or(u8::MAX);
        mol.atom_mut(idx).hydrogens = hydrogens;
    }
}

/// Bonds between aromatic atoms default to aromatic; those outside any ring
/// (biaryl links) are single bonds.
fn demote_acyclic_aromatic_bonds(mol: &mut Molecule) {
    let in_ring = rings::ring_bond_flags(mol);
    for (bi, ring_bond) in in_ring.iter().enumerate() {
        if !ring_bond && mol.bond(bi).order == BondOrder::Aromatic {
            mol.set_bond_order(bi, BondOrder::Single);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethanol() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.atom(0).hydrogens, 3);
        assert_eq!(mol.atom(1).hydrogens, 2);
        assert_eq!(mol.atom(2).hydrogens, 1);
    }

    #[test]
    fn test_benzene_aromatic_hydrogens() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 6);
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
        assert!(mol.atoms().iter().all(|a| a.hydrogens == 1));
    }

    #[test]
    fn test_branches_and_double_bonds() {
        // Acetic acid
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_between(1, 2).unwrap().order, BondOrder::Double);
        assert_eq!(mol.atom(1).hydrogens, 0);
        assert_eq!(mol.atom(3).hydrogens, 1);
    }

    #[test]
    fn test_bracket_atoms() {
        let mol = parse_smiles("[NH4+]").unwrap();
        let n = mol.atom(0);
        assert!(n.bracket);
        assert_eq!(n.hydrogens, 4);
        assert_eq!(n.charge, 1);

        let mol = parse_smiles("[13CH3][O-]").unwrap();
        assert_eq!(mol.atom(0).isotope, Some(13));
        assert_eq!(mol.atom(1).charge, -1);

        let mol = parse_smiles("C[C@@H](N)C(=O)O").unwrap();
        assert_eq!(mol.atom(1).hydrogens, 1);
    }

    #[test]
    fn test_pyrrole_needs_explicit_nh() {
        let mol = parse_smiles("c1cc[nH]c1").unwrap();
        assert_eq!(mol.atom(3).hydrogens, 1);
        assert!(mol.atom(3).aromatic);
    }

    #[test]
    fn test_percent_ring_labels_and_dots() {
        let mol = parse_smiles("C%10CCCCC%10.[Na+]").unwrap();
        assert_eq!(mol.atom_count(), 7);
        assert_eq!(mol.component_count(), 2);
    }

    #[test]
    fn test_biaryl_link_is_single() {
        let mol = parse_smiles("c1ccccc1c1ccccc1").unwrap();
        let link = mol.bond_between(5, 6).unwrap();
        assert_eq!(link.order, BondOrder::Single);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_smiles(""), Err(ParseError::Empty));
        assert_eq!(parse_smiles("   "), Err(ParseError::Empty));
        assert!(matches!(
            parse_smiles("not_a_smiles"),
            Err(ParseError::UnexpectedChar { ch: 't', .. })
        ));
        assert!(matches!(parse_smiles("C1CC"), Err(ParseError::UnclosedRing { label: 1 })));
        assert!(matches!(parse_smiles("C(C"), Err(ParseError::UnbalancedBranch { .. })));
        assert!(matches!(parse_smiles("CC)"), Err(ParseError::UnbalancedBranch { .. })));
        assert!(matches!(parse_smiles("CC="), Err(ParseError::DanglingBond { .. })));
        assert!(matches!(parse_smiles("[Xx]"), Err(ParseError::UnknownElement { .. })));
        assert!(matches!(parse_smiles("[CH3"), Err(ParseError::UnterminatedBracket { .. })));
        assert!(matches!(parse_smiles("C11"), Err(ParseError::InvalidRingClosure { .. })));
        assert!(matches!(parse_smiles("C=1CC-1"), Err(ParseError::RingBondConflict { label: 1 })));
    }

    #[test]
    fn test_huge_degree_does_not_overflow() {
        let smiles = format!("C{}", "(C)".repeat(300));
        let mol = parse_smiles(&smiles).unwrap();
        assert_eq!(mol.bond_order_sum(0), 300);
        assert_eq!(mol.atom(0).hydrogens, 0);
    }
}
