//! SMARTS substructure queries.
//!
//! Covers the Daylight SMARTS used by the built-in alert catalogs and
//! descriptor definitions. Atom primitives: `*`, `a`, `A`, element symbols,
//! `#n`, `H`, `D`, `X`, `v`, `R`, `r`, formal charge, isotope and recursive
//! `$(...)` environments. Bond primitives: `-`, `=`, `#`, `:`, `~` and `@`.
//! Both combine with `!`, `&`, `,` and `;` at the usual precedence. Branches,
//! ring closures and `.`-separated components are supported; chirality and
//! bond direction are accepted and ignored.
//!
//! Hydrogen counts (`H`) are totals, so `[CH2]` matches a methylene written
//! with implicit or bracket hydrogens alike. Valence (`v`) counts the ring
//! double bond an aromatic atom carries in its Kekulé form.

use std::collections::{HashMap, VecDeque};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::warn;

use crate::element::by_symbol;
use crate::molecule::{BondOrder, Molecule};
use crate::{rings, valence};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmartsError {
    #[error("empty SMARTS pattern")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unknown element '{symbol}' at position {pos}")]
    UnknownElement { symbol: String, pos: usize },

    #[error("pattern ends inside an atom or bond expression")]
    UnexpectedEnd,

    #[error("unbalanced parenthesis at position {pos}")]
    UnbalancedParen { pos: usize },

    #[error("ring closure {label} is never closed")]
    UnclosedRing { label: u32 },

    #[error("bond at position {pos} is not between two atoms")]
    DanglingBond { pos: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtomPrimitive {
    Any,
    Aromatic,
    Aliphatic,
    AtomicNum(u8),
    /// An element written with its case, so `C` is aliphatic and `c` aromatic.
    Element { atomic_number: u8, aromatic: bool },
    TotalH(u32),
    Degree(u32),
    Connectivity(u32),
    Valence(u32),
    Charge(i8),
    InRing,
    /// Number of smallest-set rings containing the atom
    RingCount(u32),
    /// Member of a smallest-set ring of this size
    RingSize(u32),
    Isotope(u16),
    Recursive(Box<SmartsPattern>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtomExpr {
    Prim(AtomPrimitive),
    Not(Box<AtomExpr>),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BondExpr {
    /// No bond symbol written: single or aromatic.
    Implicit,
    Single,
    Double,
    Triple,
    Aromatic,
    Any,
    Ring,
    Not(Box<BondExpr>),
    And(Vec<BondExpr>),
    Or(Vec<BondExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmartsAtom {
    pub expr: AtomExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmartsBond {
    pub begin: usize,
    pub end: usize,
    pub expr: BondExpr,
}

/// A parsed SMARTS query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmartsPattern {
    atoms: Vec<SmartsAtom>,
    bonds: Vec<SmartsBond>,
    adjacency: Vec<Vec<(usize, usize)>>,
    /// Breadth-first visiting order, starting from atom 0
    order: Vec<usize>,
    /// Earlier neighbour each atom is grown from during matching
    parent: Vec<Option<usize>>,
}

/// Parse a SMARTS string.
pub fn parse_smarts(pattern: &str) -> Result<SmartsPattern, SmartsError> {
    Parser { src: pattern.as_bytes(), pos: 0 }.pattern()
}

/// True if `pattern` occurs anywhere in `mol`.
pub fn smarts_match(mol: &Molecule, pattern: &SmartsPattern) -> bool {
    pattern.matches(mol)
}

impl SmartsPattern {
    pub fn atoms(&self) -> &[SmartsAtom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[SmartsBond] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn matches(&self, mol: &Molecule) -> bool {
        self.matches_in(&MatchContext::new(mol))
    }

    pub fn matches_in(&self, ctx: &MatchContext<'_>) -> bool {
        Matcher::new(self, ctx, None).run()
    }

    /// True if some match maps the first pattern atom onto `atom`.
    pub fn matches_at(&self, ctx: &MatchContext<'_>, atom: usize) -> bool {
        Matcher::new(self, ctx, Some(atom)).run()
    }

    /// Molecule atoms onto which the first pattern atom can be mapped.
    /// For a single-atom pattern this is every matching atom.
    pub fn anchor_atoms(&self, ctx: &MatchContext<'_>) -> Vec<usize> {
        (0..ctx.mol.atom_count())
            .filter(|&t| self.matches_at(ctx, t))
            .collect()
    }

    fn add_atom(&mut self, expr: AtomExpr) -> usize {
        self.atoms.push(SmartsAtom { expr });
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    fn add_bond(&mut self, begin: usize, end: usize, expr: BondExpr) {
        let idx = self.bonds.len();
        self.bonds.push(SmartsBond { begin, end, expr });
        self.adjacency[begin].push((end, idx));
        self.adjacency[end].push((begin, idx));
    }

    fn plan(&mut self) {
        let n = self.atoms.len();
        let mut seen = vec![false; n];
        self.order = Vec::with_capacity(n);
        self.parent = vec![None; n];
        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut queue = VecDeque::from([start]);
            while let Some(curr) = queue.pop_front() {
                self.order.push(curr);
                for &(next, _) in &self.adjacency[curr] {
                    if !seen[next] {
                        seen[next] = true;
                        self.parent[next] = Some(curr);
                        queue.push_back(next);
                    }
                }
            }
        }
    }
}

/// A built-in pattern parsed on first use.
///
/// A constant that fails to parse is logged once and then never matches.
pub(crate) struct LazyPattern {
    smarts: &'static str,
    parsed: OnceLock<Option<SmartsPattern>>,
}

impl LazyPattern {
    pub(crate) const fn new(smarts: &'static str) -> Self {
        Self {
            smarts,
            parsed: OnceLock::new(),
        }
    }

    pub(crate) fn get(&self) -> Option<&SmartsPattern> {
        self.parsed
            .get_or_init(|| match parse_smarts(self.smarts) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(smarts = self.smarts, error = %e, "Built-in SMARTS pattern failed to parse");
                    None
                }
            })
            .as_ref()
    }

    pub(crate) fn matches_at(&self, ctx: &MatchContext<'_>, atom: usize) -> bool {
        self.get().is_some_and(|p| p.matches_at(ctx, atom))
    }

    /// Number of atoms matching a single-atom pattern.
    pub(crate) fn count_atoms(&self, ctx: &MatchContext<'_>) -> usize {
        self.get().map_or(0, |p| p.anchor_atoms(ctx).len())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

fn is_bond_start(c: u8) -> bool {
    matches!(c, b'-' | b'=' | b'#' | b':' | b'~' | b'@' | b'!' | b'/' | b'\\')
}

fn all_of<T>(mut terms: Vec<T>, join: fn(Vec<T>) -> T) -> T {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        join(terms)
    }
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, pos: usize) -> SmartsError {
        match self.src.get(pos) {
            Some(&c) => SmartsError::UnexpectedChar { ch: c as char, pos },
            None => SmartsError::UnexpectedEnd,
        }
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.src[start..self.pos]).ok()?.parse().ok()
    }

    fn pattern(mut self) -> Result<SmartsPattern, SmartsError> {
        let mut pattern = SmartsPattern::default();
        let mut prev: Option<usize> = None;
        let mut branches: Vec<usize> = Vec::new();
        let mut pending: Option<(BondExpr, usize)> = None;
        let mut open_rings: HashMap<u32, (usize, Option<BondExpr>)> = HashMap::new();

        while let Some(c) = self.peek() {
            let pos = self.pos;
            match c {
                b'(' => {
                    let atom = prev.ok_or(SmartsError::UnbalancedParen { pos })?;
                    if let Some((_, at)) = pending {
                        return Err(SmartsError::DanglingBond { pos: at });
                    }
                    branches.push(atom);
                    self.pos += 1;
                }
                b')' => {
                    if let Some((_, at)) = pending {
                        return Err(SmartsError::DanglingBond { pos: at });
                    }
                    prev = Some(branches.pop().ok_or(SmartsError::UnbalancedParen { pos })?);
                    self.pos += 1;
                }
                b'.' => {
                    if let Some((_, at)) = pending {
                        return Err(SmartsError::DanglingBond { pos: at });
                    }
                    prev = None;
                    self.pos += 1;
                }
                b'0'..=b'9' | b'%' => {
                    let atom = prev.ok_or_else(|| self.unexpected(pos))?;
                    let label = self.ring_label()?;
                    let bond = pending.take().map(|(expr, _)| expr);
                    match open_rings.remove(&label) {
                        Some((other, _)) if other == atom => return Err(self.unexpected(pos)),
                        Some((other, opening)) => {
                            let expr = bond.or(opening).unwrap_or(BondExpr::Implicit);
                            pattern.add_bond(other, atom, expr);
                        }
                        None => {
                            open_rings.insert(label, (atom, bond));
                        }
                    }
                }
                c if is_bond_start(c) => {
                    if prev.is_none() || pending.is_some() {
                        return Err(SmartsError::DanglingBond { pos });
                    }
                    pending = Some((self.bond_expr()?, pos));
                }
                _ => {
                    let expr = if c == b'[' { self.bracket_atom()? } else { self.bare_atom()? };
                    let idx = pattern.add_atom(expr);
                    match (prev, pending.take()) {
                        (Some(p), bond) => pattern.add_bond(p, idx, bond.map_or(BondExpr::Implicit, |(e, _)| e)),
                        (None, Some((_, at))) => return Err(SmartsError::DanglingBond { pos: at }),
                        (None, None) => {}
                    }
                    prev = Some(idx);
                }
            }
        }

        if let Some((_, at)) = pending {
            return Err(SmartsError::DanglingBond { pos: at });
        }
        if !branches.is_empty() {
            return Err(SmartsError::UnbalancedParen { pos: self.pos });
        }
        if let Some(&label) = open_rings.keys().min() {
            return Err(SmartsError::UnclosedRing { label });
        }
        if pattern.atoms.is_empty() {
            return Err(SmartsError::Empty);
        }
        pattern.plan();
        Ok(pattern)
    }

    fn ring_label(&mut self) -> Result<u32, SmartsError> {
        let pos = self.pos;
        if self.eat(b'%') {
            let digits = self.src.get(self.pos..self.pos + 2).ok_or(SmartsError::UnexpectedEnd)?;
            if !digits.iter().all(u8::is_ascii_digit) {
                return Err(self.unexpected(pos));
            }
            self.pos += 2;
            return Ok(((digits[0] - b'0') * 10 + (digits[1] - b'0')) as u32);
        }
        let digit = self.peek().ok_or(SmartsError::UnexpectedEnd)?;
        self.pos += 1;
        Ok((digit - b'0') as u32)
    }

    /// Atom outside brackets: `*`, `a`, `A` or an organic-subset element.
    fn bare_atom(&mut self) -> Result<AtomExpr, SmartsError> {
        let pos = self.pos;
        let c = self.peek().ok_or(SmartsError::UnexpectedEnd)?;
        self.pos += 1;
        let prim = match c {
            b'*' => AtomPrimitive::Any,
            b'a' => AtomPrimitive::Aromatic,
            b'A' => AtomPrimitive::Aliphatic,
            b'C' if self.eat(b'l') => AtomPrimitive::Element { atomic_number: 17, aromatic: false },
            b'B' if self.eat(b'r') => AtomPrimitive::Element { atomic_number: 35, aromatic: false },
            b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I' => self.element(&[c], false, pos)?,
            b'b' | b'c' | b'n' | b'o' | b'p' | b's' => self.element(&[c.to_ascii_uppercase()], true, pos)?,
            _ => return Err(self.unexpected(pos)),
        };
        Ok(AtomExpr::Prim(prim))
    }

    fn element(&self, symbol: &[u8], aromatic: bool, pos: usize) -> Result<AtomPrimitive, SmartsError> {
        let symbol = String::from_utf8_lossy(symbol).into_owned();
        match by_symbol(&symbol) {
            Some(e) => Ok(AtomPrimitive::Element { atomic_number: e.atomic_number, aromatic }),
            None => Err(SmartsError::UnknownElement { symbol, pos }),
        }
    }

    fn bracket_atom(&mut self) -> Result<AtomExpr, SmartsError> {
        self.pos += 1;
        let expr = self.atom_low()?;
        if !self.eat(b']') {
            return Err(self.unexpected(self.pos));
        }
        Ok(expr)
    }

    /// `;`: lowest-precedence conjunction.
    fn atom_low(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut terms = vec![self.atom_or()?];
        while self.eat(b';') {
            terms.push(self.atom_or()?);
        }
        Ok(all_of(terms, AtomExpr::And))
    }

    fn atom_or(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut terms = vec![self.atom_and()?];
        while self.eat(b',') {
            terms.push(self.atom_and()?);
        }
        Ok(all_of(terms, AtomExpr::Or))
    }

    /// `&` or juxtaposition: highest-precedence conjunction.
    fn atom_and(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut terms = vec![self.atom_unary()?];
        loop {
            if self.eat(b'&') {
                terms.push(self.atom_unary()?);
                continue;
            }
            match self.peek() {
                None | Some(b']' | b',' | b';') => break,
                Some(_) => terms.push(self.atom_unary()?),
            }
        }
        Ok(all_of(terms, AtomExpr::And))
    }

    fn atom_unary(&mut self) -> Result<AtomExpr, SmartsError> {
        if self.eat(b'!') {
            return Ok(AtomExpr::Not(Box::new(self.atom_unary()?)));
        }
        Ok(AtomExpr::Prim(self.atom_primitive()?))
    }

    fn atom_primitive(&mut self) -> Result<AtomPrimitive, SmartsError> {
        let pos = self.pos;
        let c = self.peek().ok_or(SmartsError::UnexpectedEnd)?;
        self.pos += 1;
        let prim = match c {
            b'*' => AtomPrimitive::Any,
            b'a' => AtomPrimitive::Aromatic,
            b'A' => AtomPrimitive::Aliphatic,
            b'#' => {
                let n = self.number().ok_or_else(|| self.unexpected(self.pos))?;
                AtomPrimitive::AtomicNum(u8::try_from(n).map_err(|_| self.unexpected(pos))?)
            }
            b'0'..=b'9' => {
                self.pos = pos;
                let n = self.number().ok_or_else(|| self.unexpected(pos))?;
                AtomPrimitive::Isotope(u16::try_from(n).map_err(|_| self.unexpected(pos))?)
            }
            b'H' => AtomPrimitive::TotalH(self.number().unwrap_or(1)),
            b'D' => AtomPrimitive::Degree(self.number().unwrap_or(1)),
            b'X' => AtomPrimitive::Connectivity(self.number().unwrap_or(1)),
            b'v' => AtomPrimitive::Valence(self.number().unwrap_or(1)),
            b'R' => self.number().map_or(AtomPrimitive::InRing, AtomPrimitive::RingCount),
            b'r' => self.number().map_or(AtomPrimitive::InRing, AtomPrimitive::RingSize),
            b'+' | b'-' => AtomPrimitive::Charge(self.charge(c)),
            b'@' => {
                while self.eat(b'@') {}
                AtomPrimitive::Any
            }
            b'$' => AtomPrimitive::Recursive(Box::new(self.recursive()?)),
            b's' if self.eat(b'e') => self.element(b"Se", true, pos)?,
            b'b' | b'c' | b'n' | b'o' | b'p' | b's' => self.element(&[c.to_ascii_uppercase()], true, pos)?,
            b'A'..=b'Z' => {
                let two = self.peek().filter(u8::is_ascii_lowercase).map(|l| [c, l]);
                match two.filter(|pair| by_symbol(&String::from_utf8_lossy(pair)).is_some()) {
                    Some(pair) => {
                        self.pos += 1;
                        self.element(&pair, false, pos)?
                    }
                    None => self.element(&[c], false, pos)?,
                }
            }
            _ => return Err(self.unexpected(pos)),
        };
        Ok(prim)
    }

    /// `+`, `++`, `+2`, `-` and so on; the sign has already been consumed.
    fn charge(&mut self, sign: u8) -> i8 {
        let magnitude = match self.number() {
            Some(n) => n.min(i8::MAX as u32) as i8,
            None => {
                let mut n = 1i8;
                while self.eat(sign) {
                    n = n.saturating_add(1);
                }
                n
            }
        };
        if sign == b'-' { -magnitude } else { magnitude }
    }

    /// `$(...)`: the environment is parsed as a pattern of its own.
    fn recursive(&mut self) -> Result<SmartsPattern, SmartsError> {
        let open = self.pos;
        if !self.eat(b'(') {
            return Err(self.unexpected(open));
        }
        let mut depth = 1usize;
        let start = self.pos;
        while depth > 0 {
            match self.peek() {
                None => return Err(SmartsError::UnbalancedParen { pos: open }),
                Some(b'(') => depth += 1,
                Some(b')') => depth -= 1,
                Some(_) => {}
            }
            self.pos += 1;
        }
        Parser { src: &self.src[start..self.pos - 1], pos: 0 }.pattern()
    }

    /// `;`: lowest-precedence conjunction of bond terms.
    fn bond_expr(&mut self) -> Result<BondExpr, SmartsError> {
        let mut terms = vec![self.bond_or()?];
        while self.eat(b';') {
            terms.push(self.bond_or()?);
        }
        Ok(all_of(terms, BondExpr::And))
    }

    fn bond_or(&mut self) -> Result<BondExpr, SmartsError> {
        let mut terms = vec![self.bond_and()?];
        while self.eat(b',') {
            terms.push(self.bond_and()?);
        }
        Ok(all_of(terms, BondExpr::Or))
    }

    fn bond_and(&mut self) -> Result<BondExpr, SmartsError> {
        let mut terms = vec![self.bond_unary()?];
        loop {
            if self.eat(b'&') {
                terms.push(self.bond_unary()?);
            } else if self.peek().is_some_and(is_bond_start) {
                terms.push(self.bond_unary()?);
            } else {
                break;
            }
        }
        Ok(all_of(terms, BondExpr::And))
    }

    fn bond_unary(&mut self) -> Result<BondExpr, SmartsError> {
        let pos = self.pos;
        let c = self.peek().ok_or(SmartsError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(match c {
            b'!' => BondExpr::Not(Box::new(self.bond_unary()?)),
            b'-' | b'/' | b'\\' => BondExpr::Single,
            b'=' => BondExpr::Double,
            b'#' => BondExpr::Triple,
            b':' => BondExpr::Aromatic,
            b'~' => BondExpr::Any,
            b'@' => BondExpr::Ring,
            _ => return Err(self.unexpected(pos)),
        })
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Per-molecule data shared by every pattern matched against it.
pub struct MatchContext<'m> {
    mol: &'m Molecule,
    ring_bond: Vec<bool>,
    /// Sizes of the smallest-set rings through each atom
    ring_sizes: Vec<Vec<usize>>,
    valence: Vec<u32>,
}

impl<'m> MatchContext<'m> {
    pub fn new(mol: &'m Molecule) -> Self {
        let mut ring_sizes = vec![Vec::new(); mol.atom_count()];
        for ring in rings::sssr(mol) {
            for &atom in &ring.atoms {
                ring_sizes[atom].push(ring.len());
            }
        }
        Self {
            mol,
            ring_bond: rings::ring_bond_flags(mol),
            ring_sizes,
            valence: (0..mol.atom_count()).map(|i| valence::total_valence(mol, i)).collect(),
        }
    }

    pub fn molecule(&self) -> &'m Molecule {
        self.mol
    }

    pub fn is_ring_bond(&self, bond: usize) -> bool {
        self.ring_bond[bond]
    }

    fn bond_index(&self, a: usize, b: usize) -> Option<usize> {
        self.mol
            .neighbors(a)
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bi)| bi)
    }
}

impl AtomExpr {
    fn matches(&self, ctx: &MatchContext<'_>, t: usize) -> bool {
        match self {
            AtomExpr::Prim(p) => p.matches(ctx, t),
            AtomExpr::Not(e) => !e.matches(ctx, t),
            AtomExpr::And(es) => es.iter().all(|e| e.matches(ctx, t)),
            AtomExpr::Or(es) => es.iter().any(|e| e.matches(ctx, t)),
        }
    }
}

impl AtomPrimitive {
    fn matches(&self, ctx: &MatchContext<'_>, t: usize) -> bool {
        let mol = ctx.mol;
        let atom = mol.atom(t);
        match self {
            AtomPrimitive::Any => true,
            AtomPrimitive::Aromatic => atom.aromatic,
            AtomPrimitive::Aliphatic => !atom.aromatic,
            AtomPrimitive::AtomicNum(n) => atom.atomic_number() == *n,
            AtomPrimitive::Element { atomic_number, aromatic } => {
                atom.atomic_number() == *atomic_number && atom.aromatic == *aromatic
            }
            AtomPrimitive::TotalH(n) => mol.total_hydrogens(t) == *n,
            AtomPrimitive::Degree(n) => mol.degree(t) as u32 == *n,
            AtomPrimitive::Connectivity(n) => mol.degree(t) as u32 + atom.hydrogens as u32 == *n,
            AtomPrimitive::Valence(n) => ctx.valence[t] == *n,
            AtomPrimitive::Charge(c) => atom.charge == *c,
            AtomPrimitive::InRing => !ctx.ring_sizes[t].is_empty(),
            AtomPrimitive::RingCount(n) => ctx.ring_sizes[t].len() as u32 == *n,
            AtomPrimitive::RingSize(n) => ctx.ring_sizes[t].iter().any(|&s| s as u32 == *n),
            AtomPrimitive::Isotope(i) => atom.isotope == Some(*i),
            AtomPrimitive::Recursive(p) => p.matches_at(ctx, t),
        }
    }
}

impl BondExpr {
    fn matches(&self, ctx: &MatchContext<'_>, bond: usize) -> bool {
        let order = ctx.mol.bond(bond).order;
        match self {
            BondExpr::Implicit => matches!(order, BondOrder::Single | BondOrder::Aromatic),
            BondExpr::Single => order == BondOrder::Single,
            BondExpr::Double => order == BondOrder::Double,
            BondExpr::Triple => order == BondOrder::Triple,
            BondExpr::Aromatic => order == BondOrder::Aromatic,
            BondExpr::Any => true,
            BondExpr::Ring => ctx.ring_bond[bond],
            BondExpr::Not(e) => !e.matches(ctx, bond),
            BondExpr::And(es) => es.iter().all(|e| e.matches(ctx, bond)),
            BondExpr::Or(es) => es.iter().any(|e| e.matches(ctx, bond)),
        }
    }
}

struct Matcher<'a, 'm> {
    pattern: &'a SmartsPattern,
    ctx: &'a MatchContext<'m>,
    root: Option<usize>,
    mapping: Vec<Option<usize>>,
    used: Vec<bool>,
}

impl<'a, 'm> Matcher<'a, 'm> {
    fn new(pattern: &'a SmartsPattern, ctx: &'a MatchContext<'m>, root: Option<usize>) -> Self {
        Self {
            pattern,
            ctx,
            root,
            mapping: vec![None; pattern.atoms.len()],
            used: vec![false; ctx.mol.atom_count()],
        }
    }

    fn run(&mut self) -> bool {
        if self.pattern.atoms.len() > self.ctx.mol.atom_count() {
            return false;
        }
        self.extend(0)
    }

    fn extend(&mut self, depth: usize) -> bool {
        let Some(&q) = self.pattern.order.get(depth) else {
            return true;
        };

        let grown_from = self.pattern.parent[q].and_then(|p| self.mapping[p]);
        let candidates: Vec<usize> = match (self.root, grown_from) {
            (Some(root), _) if depth == 0 => vec![root],
            (_, Some(anchor)) => self.ctx.mol.neighbors(anchor).iter().map(|&(n, _)| n).collect(),
            _ => (0..self.ctx.mol.atom_count()).collect(),
        };

        for t in candidates {
            if self.used[t] || !self.pattern.atoms[q].expr.matches(self.ctx, t) || !self.bonds_match(q, t) {
                continue;
            }
            self.mapping[q] = Some(t);
            self.used[t] = true;
            if self.extend(depth + 1) {
                return true;
            }
            self.mapping[q] = None;
            self.used[t] = false;
        }
        false
    }

    /// Every pattern bond to an already-mapped atom must exist and match.
    fn bonds_match(&self, q: usize, t: usize) -> bool {
        self.pattern.adjacency[q].iter().all(|&(qn, qb)| match self.mapping[qn] {
            Some(tn) => self
                .ctx
                .bond_index(t, tn)
                .is_some_and(|tb| self.pattern.bonds[qb].expr.matches(self.ctx, tb)),
            None => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn hit(smarts: &str, smiles: &str) -> bool {
        parse_smarts(smarts).unwrap().matches(&parse_smiles(smiles).unwrap())
    }

    fn anchors(smarts: &str, smiles: &str) -> usize {
        let mol = parse_smiles(smiles).unwrap();
        parse_smarts(smarts).unwrap().anchor_atoms(&MatchContext::new(&mol)).len()
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_smarts(""), Err(SmartsError::Empty));
        assert!(matches!(parse_smarts("C("), Err(SmartsError::UnbalancedParen { .. })));
        assert!(matches!(parse_smarts("C)"), Err(SmartsError::UnbalancedParen { .. })));
        assert_eq!(parse_smarts("C1CC"), Err(SmartsError::UnclosedRing { label: 1 }));
        assert!(matches!(parse_smarts("C="), Err(SmartsError::DanglingBond { .. })));
        assert!(matches!(parse_smarts("[Xq]"), Err(SmartsError::UnknownElement { .. })));
        assert!(parse_smarts("[C").is_err());
        assert!(parse_smarts("[$(C]").is_err());
    }

    #[test]
    fn test_parsed_structure() {
        let p = parse_smarts("[C,c]=O").unwrap();
        assert_eq!(p.atom_count(), 2);
        assert_eq!(p.bonds()[0].expr, BondExpr::Double);
        assert!(matches!(p.atoms()[0].expr, AtomExpr::Or(ref terms) if terms.len() == 2));
        assert_eq!(
            p.atoms()[1].expr,
            AtomExpr::Prim(AtomPrimitive::Element { atomic_number: 8, aromatic: false })
        );
    }

    #[test]
    fn test_aromaticity_and_bonds() {
        assert!(hit("C=O", "CC=O"));
        assert!(!hit("C=O", "CCO"));
        assert!(hit("c", "c1ccccc1"));
        assert!(!hit("C", "c1ccccc1"));
        assert!(hit("[#6]", "c1ccccc1"));
        assert!(hit("cc", "c1ccccc1"));
        assert!(!hit("c-c", "c1ccccc1"));
        assert!(hit("c:c", "c1ccccc1"));
        assert!(hit("C~O", "CC=O"));
    }

    #[test]
    fn test_hydrogen_and_charge() {
        assert!(hit("[CH]=O", "CCC=O"));
        assert!(!hit("[CH]=O", "CC(=O)C"));
        assert!(hit("[N+](=O)[O-]", "CC[N+](=O)[O-]"));
        assert!(!hit("C[N;+0]=O", "CC[N+](=O)[O-]"));
        assert!(hit("C[N;+0]=O", "CCN=O"));
        assert!(hit("[NH2]c", "Nc1ccccc1"));
    }

    #[test]
    fn test_degree_connectivity_valence() {
        assert_eq!(anchors("[CX4]", "CC(=O)O"), 1);
        assert_eq!(anchors("[D1]", "CC(C)C"), 3);
        assert!(hit("[NH0;X1;v3]", "CC#N"));
        assert!(hit("[nH0;X2]", "c1ccncc1"));
        assert!(!hit("[nH0;X2]", "c1cc[nH]c1"));
        assert!(hit("[N;v4;+]", "C[N+](C)(C)C"));
    }

    #[test]
    fn test_ring_primitives() {
        assert!(hit("C@C", "C1CCCCC1"));
        assert!(!hit("C@C", "CCCCCC"));
        assert!(hit("C=!@C", "CC=CC"));
        assert!(!hit("C=!@C", "C1=CCCC1"));
        assert!(hit("[r5]", "c1cc[nH]c1"));
        assert!(!hit("[r6]", "c1cc[nH]c1"));
        assert_eq!(anchors("[R2]", "c1ccc2ccccc2c1"), 2);
        assert_eq!(anchors("[R0]", "Cc1ccccc1"), 1);
        assert!(hit("[C!r]", "CC1CC1"));
    }

    #[test]
    fn test_recursive_environment() {
        // Carbon of a carboxylic acid, not a ketone.
        assert!(hit("[C;$(C(=O)[OH])]", "CC(=O)O"));
        assert!(!hit("[C;$(C(=O)[OH])]", "CC(=O)C"));
        assert_eq!(anchors("[$([OH]C=O)]", "OC(=O)CCO"), 1);
        assert!(hit("[$([CH2]),$([CH][CX4])]=C", "C=CC"));
    }

    #[test]
    fn test_operator_precedence() {
        // `S!D1` binds tighter than the commas around it.
        let p = parse_smarts("[#7,O,S!D1]").unwrap();
        assert!(p.matches(&parse_smiles("CO").unwrap()));
        assert!(!p.matches(&parse_smiles("CS").unwrap()));
        assert!(p.matches(&parse_smiles("CSC").unwrap()));
        assert_eq!(anchors("[C,H1]", "CO"), 2);
        assert!(!hit("[!#6;!#8]", "CCO"));
    }

    #[test]
    fn test_disconnected_components_use_distinct_atoms() {
        assert!(hit("F.F", "FC(F)C"));
        assert!(!hit("F.F", "CCF"));
        assert!(hit("F.F.F.F", "FC(F)(F)C(F)C"));
    }

    #[test]
    fn test_ring_closures_in_query() {
        assert!(hit("c1ccccc1O", "Oc1ccccc1"));
        assert!(hit("*1[O,S,N]*1", "CC1CO1"));
        assert!(!hit("*1[O,S,N]*1", "C1CCOC1"));
        assert!(hit("a21aa3a(aa1aaaa2)aaaa3", "c1ccc2cc3ccccc3cc2c1"));
        assert!(!hit("a21aa3a(aa1aaaa2)aaaa3", "c1ccc2ccccc2c1"));
    }

    #[test]
    fn test_lazy_pattern() {
        static HALOGEN: LazyPattern = LazyPattern::new("[F,Cl,Br,I]");
        static BROKEN: LazyPattern = LazyPattern::new("C(");
        let mol = parse_smiles("FC(Cl)CBr").unwrap();
        let ctx = MatchContext::new(&mol);
        assert_eq!(HALOGEN.count_atoms(&ctx), 3);
        assert!(HALOGEN.matches_at(&ctx, 0));
        assert!(!HALOGEN.matches_at(&ctx, 1));
        assert!(BROKEN.get().is_none());
        assert_eq!(BROKEN.count_atoms(&ctx), 0);
    }

    #[test]
    fn test_isotope() {
        assert!(hit("[13C]", "[13CH4]"));
        assert!(!hit("[13C]", "C"));
    }
}
