//! Scalar molecular descriptors.
//!
//! The ten feature descriptors fed to potency predictors, plus QED.
//! Every function takes a parsed molecule and is deterministic.

use serde::{Deserialize, Serialize};

use crate::element::HYDROGEN_WEIGHT;
use crate::molecule::{BondOrder, Molecule};
use crate::smarts::{LazyPattern, MatchContext};
use crate::{qed, rings};

/// Number of entries returned by [`Descriptors::feature_values`].
pub const FEATURE_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptors {
    pub logp: f64,
    pub mol_wt: f64,
    pub tpsa: f64,
    pub h_acceptors: u32,
    pub h_donors: u32,
    pub rotatable_bonds: u32,
    pub fraction_csp3: f64,
    pub ring_count: u32,
    pub aromatic_ring_count: u32,
    pub heavy_atom_count: u32,
    pub qed: f64,
}

impl Descriptors {
    pub fn compute(mol: &Molecule) -> Self {
        let ctx = MatchContext::new(mol);
        let mut desc = Self {
            logp: logp(mol),
            mol_wt: mol_wt(mol),
            tpsa: tpsa(mol),
            h_acceptors: acceptors_in(&ctx),
            h_donors: donors_in(&ctx),
            rotatable_bonds: rotatable_bonds_in(&ctx),
            fraction_csp3: fraction_csp3(mol),
            ring_count: ring_count(mol),
            aromatic_ring_count: aromatic_ring_count(mol),
            heavy_atom_count: heavy_atom_count(mol),
            qed: 0.0,
        };
        desc.qed = qed::qed_in(&ctx, &desc);
        desc
    }

    /// Predictor feature tail, in fixed order: logP, MW, TPSA, HBA, HBD,
    /// rotatable bonds, Fsp3, ring count, aromatic ring count, heavy atoms.
    pub fn feature_values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.logp,
            self.mol_wt,
            self.tpsa,
            self.h_acceptors as f64,
            self.h_donors as f64,
            self.rotatable_bonds as f64,
            self.fraction_csp3,
            self.ring_count as f64,
            self.aromatic_ring_count as f64,
            self.heavy_atom_count as f64,
        ]
    }
}

// ---------------------------------------------------------------------------
// Mass and counts
// ---------------------------------------------------------------------------

/// Average molecular weight including implicit hydrogens.
pub fn mol_wt(mol: &Molecule) -> f64 {
    mol.atoms()
        .iter()
        .map(|a| a.element.atomic_weight + a.hydrogens as f64 * HYDROGEN_WEIGHT)
        .sum()
}

pub fn heavy_atom_count(mol: &Molecule) -> u32 {
    mol.heavy_atom_count() as u32
}

pub fn ring_count(mol: &Molecule) -> u32 {
    rings::ring_count(mol) as u32
}

pub fn aromatic_ring_count(mol: &Molecule) -> u32 {
    rings::aromatic_ring_count(mol) as u32
}

/// Fraction of carbons that are sp3 (no multiple or aromatic bonds).
pub fn fraction_csp3(mol: &Molecule) -> f64 {
    let carbons: Vec<usize> = (0..mol.atom_count())
        .filter(|&i| mol.atom(i).element.is_carbon())
        .collect();
    if carbons.is_empty() {
        return 0.0;
    }
    let sp3 = carbons
        .iter()
        .filter(|&&i| !mol.atom(i).aromatic && !mol.is_unsaturated(i))
        .count();
    sp3 as f64 / carbons.len() as f64
}

// ---------------------------------------------------------------------------
// Hydrogen bonding
// ---------------------------------------------------------------------------

static DONOR: LazyPattern = LazyPattern::new("[N&!H0&v3,N&!H0&+1&v4,O&H1&+0,S&H1&+0,n&H1&+0]");

static ACCEPTOR: LazyPattern = LazyPattern::new(concat!(
    "[$([O,S;H1;v2]-[!$(*=[O,N,P,S])]),",
    "$([O,S;H0;v2]),$([O,S;-]),",
    "$([N;v3;!$(N-*=!@[O,N,P,S])]),",
    "$([nH0,o,s;+0])]",
));

/// Lipinski donors: N-H, neutral O-H and S-H, pyrrole-type `[nH]`.
pub fn h_donors(mol: &Molecule) -> u32 {
    donors_in(&MatchContext::new(mol))
}

/// Lipinski acceptors: O and S that are not acid hydroxyls, trivalent N
/// outside amides and similar, and neutral aromatic `n`, `o` and `s`
/// without hydrogen.
pub fn h_acceptors(mol: &Molecule) -> u32 {
    acceptors_in(&MatchContext::new(mol))
}

fn donors_in(ctx: &MatchContext<'_>) -> u32 {
    DONOR.count_atoms(ctx) as u32
}

fn acceptors_in(ctx: &MatchContext<'_>) -> u32 {
    ACCEPTOR.count_atoms(ctx) as u32
}

// ---------------------------------------------------------------------------
// Flexibility
// ---------------------------------------------------------------------------

/// An atom that can end a rotatable bond: not terminal, not in a triple
/// bond, and not the centre of a CX3 or tert-butyl group. Extra terms narrow
/// it further.
macro_rules! rotor_end {
    ($($extra:literal),*) => {
        concat!(
            "[!$(*#*)&!D1&!$(C(F)(F)F)&!$(C(Cl)(Cl)Cl)&!$(C(Br)(Br)Br)&!$(C([CH3])([CH3])[CH3])",
            $($extra,)*
            "]"
        )
    };
}

static LOOSE_END: LazyPattern = LazyPattern::new(rotor_end!());

static STRICT_END: LazyPattern = LazyPattern::new(rotor_end!(
    "&!$([CD3](=[N,O,S])-!@[#7,O,S!D1])&!$([#7,O,S!D1]-!@[CD3]=[N,O,S])",
    "&!$([CD3](=[N+])-!@[#7!D1])&!$([#7!D1]-!@[CD3]=[N+])"
));

/// Strict rotatable bonds: acyclic single bonds between two non-terminal
/// atoms where at least one end is not part of an amide, ester, thioamide
/// or amidinium linkage.
pub fn rotatable_bonds(mol: &Molecule) -> u32 {
    rotatable_bonds_in(&MatchContext::new(mol))
}

fn rotatable_bonds_in(ctx: &MatchContext<'_>) -> u32 {
    let mol = ctx.molecule();
    let loose: Vec<bool> = (0..mol.atom_count()).map(|i| LOOSE_END.matches_at(ctx, i)).collect();
    let strict: Vec<bool> = (0..mol.atom_count()).map(|i| STRICT_END.matches_at(ctx, i)).collect();

    mol.bonds()
        .iter()
        .enumerate()
        .filter(|&(bi, bond)| {
            matches!(bond.order, BondOrder::Single | BondOrder::Aromatic) && !ctx.is_ring_bond(bi)
        })
        .filter(|(_, bond)| {
            let (a, b) = (bond.begin, bond.end);
            (strict[a] && loose[b]) || (strict[b] && loose[a])
        })
        .count() as u32
}

// ---------------------------------------------------------------------------
// Polar surface area
// ---------------------------------------------------------------------------

/// Topological polar surface area from Ertl N/O fragment contributions.
pub fn tpsa(mol: &Molecule) -> f64 {
    (0..mol.atom_count()).map(|i| tpsa_contribution(mol, i)).sum()
}

fn tpsa_contribution(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    let h = mol.total_hydrogens(idx);
    let degree = mol.heavy_degree(idx);
    let double = mol.has_bond_of_order(idx, BondOrder::Double);
    let triple = mol.has_bond_of_order(idx, BondOrder::Triple);

    match atom.element.atomic_number {
        7 => {
            if atom.charge > 0 {
                return match h {
                    0 => if double { 3.01 } else { 0.0 },
                    1 => 14.14,
                    2 => 16.61,
                    _ => 27.64,
                };
            }
            if atom.aromatic {
                return if h >= 1 { 15.79 } else if degree == 3 { 4.41 } else { 12.89 };
            }
            if triple {
                return 23.79;
            }
            match (degree, h, double) {
                (1, 2, _) => 26.02,
                (1, 1, true) => 23.85,
                (2, 1, false) => 12.03,
                (2, 0, true) => 12.36,
                (3, 0, false) => 3.24,
                (3, 0, true) => 11.68,
                _ if h >= 2 => 26.02,
                _ if h == 1 => 12.03,
                _ => 3.24,
            }
        }
        8 => {
            if atom.charge < 0 {
                return 23.06;
            }
            if atom.aromatic {
                return 13.14;
            }
            match (degree, h, double) {
                (1, 0, true) => 17.07,
                (_, 1, _) => 20.23,
                (_, h, _) if h >= 2 => 20.23,
                _ => 9.23,
            }
        }
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Lipophilicity
// ---------------------------------------------------------------------------

/// Wildman-Crippen logP (J. Chem. Inf. Comput. Sci. 1999, 39, 868).
///
/// Every heavy atom and every attached hydrogen gets one of the published
/// atom types; logP is the sum of the type contributions.
pub fn logp(mol: &Molecule) -> f64 {
    (0..mol.atom_count())
        .filter(|&i| !mol.atom(i).element.is_hydrogen())
        .map(|i| heavy_atom_logp(mol, i) + mol.total_hydrogens(i) as f64 * hydrogen_logp(mol, i))
        .sum()
}

/// Contribution for atoms no other type covers.
const UNTYPED_LOGP: f64 = 0.08129;

/// Heavy neighbours with the order of the connecting bond.
fn heavy_neighbors(mol: &Molecule, idx: usize) -> Vec<(usize, BondOrder)> {
    mol.neighbors(idx)
        .iter()
        .filter(|&&(n, _)| !mol.atom(n).element.is_hydrogen())
        .map(|&(n, bi)| (n, mol.bond(bi).order))
        .collect()
}

/// N, O, P, S or a halogen, written aliphatic.
fn is_polar_aliphatic(mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    !atom.aromatic && matches!(atom.atomic_number(), 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
}

fn is_aliphatic_carbon(mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    atom.element.is_carbon() && !atom.aromatic
}

fn heavy_atom_logp(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    match atom.atomic_number() {
        6 if atom.aromatic => aromatic_carbon_logp(mol, idx),
        6 => aliphatic_carbon_logp(mol, idx),
        7 => nitrogen_logp(mol, idx),
        8 => oxygen_logp(mol, idx),
        9 | 17 | 35 | 53 if atom.charge != 0 => -2.996,
        9 => 0.4202,
        17 => 0.6895,
        35 => 0.8456,
        53 => 0.8857,
        15 => 0.8612,
        16 if atom.aromatic => 0.6237,
        16 if atom.charge != 0 => -0.0024,
        16 => 0.6482,
        3 | 11 | 19 => -0.3808,
        12 | 20 => -0.0025,
        _ => 0.0,
    }
}

fn aliphatic_carbon_logp(mol: &Molecule, idx: usize) -> f64 {
    let nbrs = heavy_neighbors(mol, idx);
    let h = mol.total_hydrogens(idx);
    let aromatic = |n: usize| mol.atom(n).aromatic;

    let sp3 = nbrs.iter().all(|&(_, o)| o == BondOrder::Single) && nbrs.len() as u32 + h == 4;
    let carbons = nbrs.iter().filter(|&&(n, _)| is_aliphatic_carbon(mol, n)).count();
    let polar = nbrs.iter().filter(|&&(n, _)| is_polar_aliphatic(mol, n)).count();
    let all_aliphatic = nbrs.iter().all(|&(n, _)| !aromatic(n));
    let any_aromatic = !all_aliphatic;
    let double_to = |pred: &dyn Fn(usize) -> bool| {
        nbrs.iter().any(|&(n, o)| o == BondOrder::Double && pred(n))
    };

    if sp3 {
        match (h, carbons, polar) {
            (4, ..) | (3, 1, _) | (2, 2, _) => return 0.1441,
            (1, 3, _) | (0, 4, _) => return 0.0,
            (3, _, 1) => return -0.2035,
            (2, _, p) if p > 0 && all_aliphatic => return -0.2035,
            (0 | 1, _, p) if p > 0 && all_aliphatic => return -0.2051,
            _ => {}
        }
    }
    if double_to(&|n| !aromatic(n) && !mol.atom(n).element.is_carbon()) {
        return -0.2783;
    }
    if double_to(&|n| is_aliphatic_carbon(mol, n)) && all_aliphatic {
        return 0.1551;
    }
    if nbrs.len() as u32 + h == 2 && nbrs.iter().any(|&(n, o)| o == BondOrder::Triple && !aromatic(n)) {
        return 0.0017;
    }
    if sp3 && any_aromatic {
        return match h {
            3 if nbrs.iter().any(|&(n, _)| mol.atom(n).element.is_carbon()) => 0.08452,
            3 => -0.1444,
            2 => -0.0516,
            1 => 0.1193,
            _ => -0.0967,
        };
    }
    let conjugated_to_ring = double_to(&|n| is_aliphatic_carbon(mol, n)) && any_aromatic;
    if conjugated_to_ring || double_to(&|n| aromatic(n) && mol.atom(n).element.is_carbon()) {
        return 0.264;
    }
    // sp3 carbon bonded to B, Si, Se or a metal
    let unusual = |n: usize| !aromatic(n) && !is_polar_aliphatic(mol, n) && !mol.atom(n).element.is_carbon();
    if sp3 && nbrs.iter().any(|&(n, _)| unusual(n)) {
        return 0.2148;
    }
    UNTYPED_LOGP
}

fn aromatic_carbon_logp(mol: &Molecule, idx: usize) -> f64 {
    let nbrs = heavy_neighbors(mol, idx);
    let h = mol.total_hydrogens(idx);

    let exotic = |n: usize| {
        let a = mol.atom(n);
        !a.aromatic && !matches!(a.atomic_number(), 6 | 7 | 8 | 9 | 16 | 17 | 35 | 53)
    };
    if h == 0 && nbrs.iter().any(|&(n, o)| o == BondOrder::Single && exotic(n)) {
        return -0.5443;
    }
    for &(n, _) in &nbrs {
        match mol.atom(n).atomic_number() {
            9 => return 0.0,
            17 => return 0.245,
            35 => return 0.198,
            53 => return 0.0,
            _ => {}
        }
    }
    if h > 0 {
        return 0.1581;
    }

    let ring_bonds = nbrs.iter().filter(|&&(_, o)| o == BondOrder::Aromatic).count();
    if ring_bonds >= 3 {
        return 0.2955;
    }
    if ring_bonds != 2 {
        return UNTYPED_LOGP;
    }
    match nbrs.iter().find(|&&(_, o)| o != BondOrder::Aromatic) {
        Some(&(n, BondOrder::Single)) if mol.atom(n).aromatic => 0.2713,
        Some(&(n, BondOrder::Single)) => match mol.atom(n).atomic_number() {
            6 => 0.136,
            7 => 0.4619,
            8 => 0.5437,
            16 => 0.1893,
            _ => UNTYPED_LOGP,
        },
        Some(&(n, BondOrder::Double)) if !mol.atom(n).aromatic && matches!(mol.atom(n).atomic_number(), 6 | 7 | 8) => {
            -0.8186
        }
        _ => UNTYPED_LOGP,
    }
}

fn nitrogen_logp(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    let nbrs = heavy_neighbors(mol, idx);
    let h = mol.total_hydrogens(idx);
    let has = |order: BondOrder| nbrs.iter().any(|&(_, o)| o == order);
    let any_aromatic = nbrs.iter().any(|&(n, _)| mol.atom(n).aromatic);

    if atom.aromatic {
        return match atom.charge {
            0 => -0.3239,
            c if c > 0 => -1.119,
            _ => -0.4806,
        };
    }

    match atom.charge {
        0 => {
            if has(BondOrder::Triple) {
                0.01508
            } else if has(BondOrder::Double) {
                match (h, nbrs.len()) {
                    (1, _) => 0.08387,
                    (0, n) if n >= 2 => 0.1836,
                    _ => -0.4806,
                }
            } else {
                match (h, nbrs.len()) {
                    (2, 1) if any_aromatic => -1.027,
                    (2, 1) => -1.019,
                    (1, 2) if any_aromatic => -0.5188,
                    (1, 2) => -0.7096,
                    (0, 3) if any_aromatic => -0.4458,
                    (0, 3) => -0.3187,
                    _ => -0.4806,
                }
            }
        }
        c if c > 0 => {
            let doubles = nbrs.iter().filter(|&&(_, o)| o == BondOrder::Double).count();
            let azide_centre = nbrs
                .iter()
                .any(|&(n, o)| o == BondOrder::Double && mol.atom(n).atomic_number() == 7 && mol.atom(n).charge < 0);
            match h {
                1..=3 => -1.950,
                0 if azide_centre => 0.2887,
                0 if has(BondOrder::Triple) || nbrs.len() == 4 || (doubles >= 1 && nbrs.len() >= 2) => -0.3396,
                _ => -0.4806,
            }
        }
        _ => 0.2887,
    }
}

fn oxygen_logp(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    let nbrs = heavy_neighbors(mol, idx);
    let h = mol.total_hydrogens(idx);

    if atom.aromatic {
        return 0.1552;
    }
    if h == 1 || h == 2 {
        return -0.2893;
    }
    match nbrs.as_slice() {
        &[(a, BondOrder::Single), (b, BondOrder::Single)] if atom.charge == 0 => {
            if mol.atom(a).aromatic || mol.atom(b).aromatic {
                -0.4195
            } else {
                -0.0684
            }
        }
        &[(p, BondOrder::Double)] => match mol.atom(p).atomic_number() {
            7 | 8 => 0.0335,
            6 if mol.atom(p).aromatic => 0.1788,
            6 => carbonyl_oxygen_logp(mol, p, idx),
            _ => -0.1188,
        },
        &[(p, BondOrder::Single)] if atom.charge < 0 => match mol.atom(p).atomic_number() {
            7 => 0.0335,
            16 => -0.3339,
            _ => -1.189,
        },
        _ => -0.1188,
    }
}

/// Carbonyl oxygen: aliphatic ketones, aldehydes, esters and amides;
/// aryl-conjugated carbonyls; carbonic acid derivatives.
fn carbonyl_oxygen_logp(mol: &Molecule, carbon: usize, oxygen: usize) -> f64 {
    let h = mol.total_hydrogens(carbon);
    let others: Vec<(usize, BondOrder)> = heavy_neighbors(mol, carbon)
        .into_iter()
        .filter(|&(n, _)| n != oxygen)
        .collect();
    let aromatic = |n: usize| mol.atom(n).aromatic;
    let is_c = |n: usize| mol.atom(n).element.is_carbon();

    match (h, others.as_slice()) {
        (2, _) => -0.1526,
        // O=C=O and cumulated relatives
        (_, &[(n, BondOrder::Double)]) if mol.atom(n).atomic_number() == 8 => -0.1526,
        (1, &[(n, _)]) if is_aliphatic_carbon(mol, n) => -0.1526,
        (1, &[(n, _)]) if !aromatic(n) && matches!(mol.atom(n).atomic_number(), 7 | 8) => -0.1526,
        (1, &[(n, _)]) if aromatic(n) && is_c(n) => 0.1129,
        (0, &[(a, _), (b, _)]) => {
            if (is_aliphatic_carbon(mol, a) && !aromatic(b)) || (is_aliphatic_carbon(mol, b) && !aromatic(a)) {
                -0.1526
            } else if (aromatic(a) && is_c(a)) || (aromatic(b) && is_c(b)) || (is_c(a) && aromatic(b)) || (is_c(b) && aromatic(a)) {
                0.1129
            } else if !is_c(a) && !is_c(b) {
                0.4833
            } else {
                -0.1188
            }
        }
        _ => -0.1188,
    }
}

/// Contribution of each hydrogen on the given heavy atom.
fn hydrogen_logp(mol: &Molecule, idx: usize) -> f64 {
    match mol.atom(idx).atomic_number() {
        6 => 0.123,
        7 => 0.2142,
        8 => hydroxyl_hydrogen_logp(mol, idx),
        _ => -0.2677,
    }
}

/// Alcohol and phenol hydrogens are hydrophilic; acid and enol hydrogens
/// and those on O-N, O-O or O-S less so.
fn hydroxyl_hydrogen_logp(mol: &Molecule, oxygen: usize) -> f64 {
    let nbrs = heavy_neighbors(mol, oxygen);
    let alcohol = nbrs.is_empty()
        || nbrs.iter().any(|&(n, _)| {
            let a = mol.atom(n);
            let sp3 = !a.aromatic && mol.degree(n) as u32 + a.hydrogens as u32 == 4 && !mol.is_unsaturated(n);
            (a.element.is_carbon() && (a.aromatic || sp3)) || !matches!(a.atomic_number(), 6 | 7 | 8 | 16)
        });
    if alcohol {
        return -0.2677;
    }
    if nbrs.iter().any(|&(n, _)| mol.atom(n).atomic_number() == 7) {
        return 0.2142;
    }
    let acidic = nbrs.iter().any(|&(n, _)| match mol.atom(n).atomic_number() {
        8 | 16 => true,
        6 => heavy_neighbors(mol, n)
            .iter()
            .any(|&(m, o)| o == BondOrder::Double && matches!(mol.atom(m).atomic_number(), 6 | 7 | 8 | 16)),
        _ => false,
    });
    if acidic { 0.298 } else { 0.1125 }
}
