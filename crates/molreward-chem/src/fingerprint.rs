//! Morgan (ECFP-style) circular fingerprints folded into a fixed bit vector.

use crate::molecule::Molecule;
use crate::rings;

/// Fixed-length bit vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    n_bits: usize,
    words: Vec<u64>,
}

impl Fingerprint {
    pub fn new(n_bits: usize) -> Self {
        Self {
            n_bits,
            words: vec![0; n_bits.div_ceil(64)],
        }
    }

    pub fn len(&self) -> usize {
        self.n_bits
    }

    pub fn is_empty(&self) -> bool {
        self.n_bits == 0
    }

    pub fn set(&mut self, bit: usize) {
        if bit < self.n_bits {
            self.words[bit / 64] |= 1 << (bit % 64);
        }
    }

    pub fn get(&self, bit: usize) -> bool {
        bit < self.n_bits && self.words[bit / 64] & (1 << (bit % 64)) != 0
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Bits as 0.0 / 1.0, for use as model features.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.n_bits).map(|b| if self.get(b) { 1.0 } else { 0.0 }).collect()
    }
}

/// Morgan fingerprint of the given radius folded to `n_bits`.
///
/// Atom identifiers start from (atomic number, heavy degree, hydrogens,
/// charge, ring membership, aromaticity). Each iteration rehashes an atom's
/// identifier with its sorted (bond order, neighbour identifier) pairs.
pub fn morgan_fingerprint(mol: &Molecule, radius: usize, n_bits: usize) -> Fingerprint {
    let mut fp = Fingerprint::new(n_bits);
    if n_bits == 0 || mol.is_empty() {
        return fp;
    }

    let in_ring = rings::ring_atom_flags(mol);
    let mut ids: Vec<u64> = (0..mol.atom_count())
        .map(|i| {
            let atom = mol.atom(i);
            let mut h = Fnv64::new();
            h.write_u64(atom.atomic_number() as u64);
            h.write_u64(mol.heavy_degree(i) as u64);
            h.write_u64(mol.total_hydrogens(i) as u64);
            h.write_u64(atom.charge as i64 as u64);
            h.write_u64(in_ring[i] as u64);
            h.write_u64(atom.aromatic as u64);
            h.finish()
        })
        .collect();

    for &id in &ids {
        fp.set((id % n_bits as u64) as usize);
    }

    for iteration in 0..radius {
        let next: Vec<u64> = (0..mol.atom_count())
            .map(|i| {
                let mut env: Vec<(u8, u64)> = mol
                    .neighbors(i)
                    .iter()
                    .map(|&(n, bi)| (mol.bond(bi).order.code(), ids[n]))
                    .collect();
                env.sort_unstable();
                let mut h = Fnv64::new();
                h.write_u64(iteration as u64);
                h.write_u64(ids[i]);
                h.write_u64(env.len() as u64);
                for (order, id) in env {
                    h.write_u64(order as u64);
                    h.write_u64(id);
                }
                h.finish()
            })
            .collect();
        for &id in &next {
            fp.set((id % n_bits as u64) as usize);
        }
        ids = next;
    }
    fp
}

/// FNV-1a 64-bit over little-endian words. Bit positions must not depend on
/// the platform or toolchain, since model coefficients are tied to them.
struct Fnv64(u64);

impl Fnv64 {
    const OFFSET: u64 = 14695981039346656037;
    const PRIME: u64 = 1099511628211;

    fn new() -> Self {
        Self(Self::OFFSET)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= byte as u64;
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    fn finish(&self) -> u64 {
        self.0
    }
}
