//! Quantitative Estimate of Drug-likeness (Bickerton et al., 2012).
//!
//! Eight descriptors are mapped through asymmetric double-sigmoid
//! desirability functions and combined as a weighted geometric mean.

use std::sync::OnceLock;

use crate::alerts::AlertCatalog;
use crate::descriptors::Descriptors;
use crate::molecule::Molecule;
use crate::smarts::{LazyPattern, MatchContext};

/// Asymmetric double sigmoid parameters (a, b, c, d, e, f, dmax).
#[derive(Debug, Clone, Copy)]
struct AdsParams {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    dmax: f64,
}

impl AdsParams {
    const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64, dmax: f64) -> Self {
        Self { a, b, c, d, e, f, dmax }
    }

    fn desirability(&self, x: f64) -> f64 {
        let rise = 1.0 + (-(x - self.c + self.d / 2.0) / self.e).exp();
        let fall = 1.0 + (-(x - self.c - self.d / 2.0) / self.f).exp();
        let value = self.a + self.b / rise * (1.0 - 1.0 / fall);
        value / self.dmax
    }
}

const MW: AdsParams = AdsParams::new(2.817065973, 392.5754953, 290.7489764, 2.419764353, 49.22325677, 65.37051707, 104.9805561);
const ALOGP: AdsParams = AdsParams::new(3.172690585, 137.8624751, 2.534937431, 4.581497897, 0.822739154, 0.576295591, 131.3186604);
const HBA: AdsParams = AdsParams::new(2.948620388, 160.4605972, 3.615294657, 4.435986202, 0.290141953, 1.300669958, 148.7763046);
const HBD: AdsParams = AdsParams::new(1.618662227, 1010.051101, 0.985094388, 0.000000001, 0.713820843, 0.920922555, 258.1632616);
const PSA: AdsParams = AdsParams::new(1.876861559, 125.2232657, 62.90773554, 87.83366614, 12.01999824, 28.51324732, 104.5686167);
const ROTB: AdsParams = AdsParams::new(0.010000000, 272.4121427, 2.558379970, 1.565547684, 1.271567166, 2.758063707, 105.4420403);
const AROM: AdsParams = AdsParams::new(3.217788970, 957.7374108, 2.274627939, 0.000000001, 1.317690384, 0.375760881, 312.3372610);
const ALERTS: AdsParams = AdsParams::new(0.010000000, 1199.094025, -0.09002883, 0.000000001, 0.185904477, 0.875193782, 417.7253140);

/// Mean weights from Bickerton et al. (2012), in the order
/// MW, ALOGP, HBA, HBD, PSA, ROTB, AROM, ALERTS.
const WEIGHTS: [f64; 8] = [0.66, 0.46, 0.05, 0.61, 0.06, 0.65, 0.48, 0.95];

/// Acceptor environments counted by the HBA term. An atom matching more
/// than one entry is counted once per entry.
static ACCEPTORS: [LazyPattern; 11] = [
    LazyPattern::new("[oH0;X2]"),
    LazyPattern::new("[OH1;X2;v2]"),
    LazyPattern::new("[OH0;X2;v2]"),
    LazyPattern::new("[OH0;X1;v2]"),
    LazyPattern::new("[O-;X1]"),
    LazyPattern::new("[SH0;X2;v2]"),
    LazyPattern::new("[SH0;X1;v2]"),
    LazyPattern::new("[S-;X1]"),
    LazyPattern::new("[nH0;X2]"),
    LazyPattern::new("[NH0;X1;v3]"),
    LazyPattern::new("[$([N;+0;X3;v3]);!$(N[C,S]=O)]"),
];

/// Aliphatic ring atoms bonded to anything non-aromatic. Removing them
/// leaves the aromatic ring systems.
static ALIPHATIC_RING_ATOM: LazyPattern = LazyPattern::new("[$([A;R][!a])]");

/// Unwanted groups counted by the ALERTS term (Brenk-style list from
/// Bickerton et al.). Each alert counts once however often it matches.
const QED_ALERT_PATTERNS: &[(&str, &str)] = &[
    ("three_membered_heterocycle", "*1[O,S,N]*1"),
    ("acyl_halide", "[S,C](=[O,S])[F,Br,Cl,I]"),
    ("alkyl_halide", "[CX4][Cl,Br,I]"),
    ("sulfonic_ester", "[#6]S(=O)(=O)O[#6]"),
    ("ynone", "[$([CH]),$(CC)]#CC(=O)[#6]"),
    ("propiolic_ester", "[$([CH]),$(CC)]#CC(=O)O[#6]"),
    ("n_oxide_hydroxyl", "n[OH]"),
    ("alkynyl_sulfone", "[$([CH]),$(CC)]#CS(=O)(=O)[#6]"),
    ("ene_dicarbonyl", "C=C(C=O)C=O"),
    ("halopyridine", "n1c([F,Cl,Br,I])cccc1"),
    ("aldehyde", "[CH1](=O)"),
    ("peroxide", "[#8][#8]"),
    ("imine_acyclic", "[C;!R]=[N;!R]"),
    ("azo_acyclic", "[N!R]=[N!R]"),
    ("diketo", "[#6](=O)[#6](=O)"),
    ("disulfide", "[#16][#16]"),
    ("hydrazine", "[#7][NH2]"),
    ("hydrazide", "C(=O)N[NH2]"),
    ("thiocarbonyl", "[#6]=S"),
    (
        "isolated_alkene",
        "[$([CH2]),$([CH][CX4]),$(C([CX4])[CX4])]=[$([CH2]),$([CH][CX4]),$(C([CX4])[CX4])]",
    ),
    ("quinone_para", "C1(=[O,N])C=CC(=[O,N])C=C1"),
    ("quinone_ortho", "C1(=[O,N])C(=[O,N])C=CC=C1"),
    ("polycyclic_aromatic_a", "a21aa3a(aa1aaaa2)aaaa3"),
    ("polycyclic_aromatic_b", "a31a(a2a(aa1)aaaa2)aaaa3"),
    ("polycyclic_aromatic_c", "a1aa2a3a(a1)A=AA=A3=AA=A2"),
    ("aniline", "c1cc([NH2])ccc1"),
    // Only elements the SMILES reader knows; the rest never parse.
    ("metal", "[Se,se,B,Si,Na,Ca,Mg,K,Li]"),
    ("iodine", "I"),
    ("sulfate", "OS(=O)(=O)[O-]"),
    ("nitro", "[N+](=O)[O-]"),
    ("hydroxamic_acid", "C(=O)N[OH]"),
    ("hydantoin_like", "C1NC(=O)NC(=O)1"),
    ("thiol", "[SH]"),
    ("thiolate", "[S-]"),
    ("trihalo_aryl_ortho", "c1ccc([Cl,Br,I,F])c([Cl,Br,I,F])c1[Cl,Br,I,F]"),
    ("trihalo_aryl_meta", "c1cc([Cl,Br,I,F])cc([Cl,Br,I,F])c1[Cl,Br,I,F]"),
    ("cycloheptane", "[CR1]1[CR1][CR1][CR1][CR1][CR1][CR1]1"),
    ("benzocycloheptane", "[CR1]1[CR1][CR1]cc[CR1][CR1]1"),
    ("fused_cyclooctane", "[CR2]1[CR2][CR2][CR2][CR2][CR2][CR2][CR2]1"),
    ("fused_benzocyclooctane", "[CR2]1[CR2][CR2]cc[CR2][CR2][CR2]1"),
    ("azepane_fused", "[CH2R2]1N[CH2R2][CH2R2][CH2R2][CH2R2][CH2R2]1"),
    ("azocane_fused", "[CH2R2]1N[CH2R2][CH2R2][CH2R2][CH2R2][CH2R2][CH2R2]1"),
    ("alkyne", "C#C"),
    ("crown_ether", "[OR2,NR2]@[CR2]@[CR2]@[OR2,NR2]@[CR2]@[CR2]@[OR2,NR2]"),
    ("n_oxide", "[$([N+R]),$([n+R]),$([N+]=C)][O-]"),
    ("oxime", "[#6]=N[OH]"),
    ("oxime_ester", "[#6]=NOC=O"),
    ("beta_dicarbonyl", "[#6](=O)[CX4,CR0X3,O][#6](=O)"),
    ("coumarin", "c1ccc2c(c1)ccc(=O)o2"),
    ("oxonium_sulfonium", "[O+,o+,S+,s+]"),
    ("isocyanate", "N=C=O"),
    ("n_halo", "[NX3,NX4][F,Cl,Br,I]"),
    ("phenyl_ester", "c1ccccc1OC(=O)[#6]"),
    ("diene_acyclic", "[CR0]=[CR0][CR0]=[CR0]"),
    ("carbocation_carbanion", "[C+,c+,C-,c-]"),
    ("azide", "N=[N+]=[N-]"),
    ("biotin_like", "C12C(NC(N1)=O)CSC2"),
    ("catechol_like", "c1c([OH])c([OH,NH2,NH])ccc1"),
    ("phosphorus", "P"),
    ("cyanate_cyanamide", "[N,O,S]C#N"),
    ("ketene", "C=C=O"),
    ("silyl_halide", "[Si][F,Cl,Br,I]"),
    ("sulfenic_ester", "[SX2]O"),
    ("triphenyl_methyl_silyl", "[SiR0,CR0](c1ccccc1)(c2ccccc2)(c3ccccc3)"),
    ("saponin_like", "O1CCCCC1OC2CCC3CCCCC3C2"),
    ("amidine_acyclic", "N=[CR0][N,n,O,S]"),
    (
        "bis_aminobiphenyl",
        "[cR2]1[cR2][cR2]([Nv3X3,Nv4X4])[cR2][cR2][cR2]1[cR2]2[cR2][cR2][cR2]([Nv3X3,Nv4X4])[cR2][cR2]2",
    ),
    ("acrylonitrile", "C=[C!r]C#N"),
    ("ortho_diamino_aryl", "[cR2]1[cR2]c([N+0X3R0,nX3R0])c([N+0X3R0,nX3R0])[cR2][cR2]1"),
    ("meta_diamino_aryl", "[cR2]1[cR2]c([N+0X3R0,nX3R0])[cR2]c([N+0X3R0,nX3R0])[cR2]1"),
    ("para_diamino_aryl", "[cR2]1[cR2]c([N+0X3R0,nX3R0])[cR2][cR2]c1([N+0X3R0,nX3R0])"),
    ("hydroquinone_like", "[OH]c1ccc([OH,NH2,NH])cc1"),
    ("aryl_carbonate", "c1ccccc1OC(=O)O"),
    ("sulfenamide", "[SX2H0][N]"),
    ("benzothiazole_thiol", "c12ccccc1(SC(S)=N2)"),
    ("benzothiazole_thione", "c12ccccc1(SC(=S)N2)"),
    ("acyl_tetrazole", "c1nnnn1C=O"),
    ("thiadiazole_amide", "s1c(S)nnc1NC=O"),
    ("dithiole_thione", "S1C=CSC1=S"),
    ("acyl_triazole_ester", "C(=O)Onnn"),
    ("triflate", "OS(=O)(=O)C(F)(F)F"),
    ("cyanohydrin", "N#CC[OH]"),
    ("acyl_cyanide", "N#CC(=O)"),
    ("sulfonyl_cyanide", "S(=O)(=O)C#N"),
    ("aminoacetonitrile", "N[CH2]C#N"),
    ("beta_lactam", "C1(=O)NCC1"),
    ("sulfonic_acid", "S(=O)(=O)[O-,OH]"),
    ("alpha_halo_amine", "NC[F,Cl,Br,I]"),
    ("enol", "C=[C!r]O"),
    ("nitroso", "[NX2+0]=[O+0]"),
    ("heteroatom_heteroatom_acyclic", "[OR0,NR0][OR0,NR0]"),
    ("triester", "C(=O)O[C,H1].C(=O)O[C,H1].C(=O)O[C,H1]"),
    ("cyanamide_like", "[CX2R0][NX3R0]"),
    ("stilbene", "c1ccccc1[C;!R]=[C;!R]c2ccccc2"),
    ("aminal_acetal", "[NX3R0,NX4R0,OR0,SX2R0][CX4][NX3R0,NX4R0,OR0,SX2R0]"),
    (
        "quaternary_nitrogen_a",
        "[s,S,c,C,n,N,o,O]~[n+,N+](~[s,S,c,C,n,N,o,O])(~[s,S,c,C,n,N,o,O])~[s,S,c,C,n,N,o,O]",
    ),
    ("quaternary_nitrogen_b", "[s,S,c,C,n,N,o,O]~[nX3+,NX3+](~[s,S,c,C,n,N])~[s,S,c,C,n,N]"),
    ("iminium_cumulated", "[*]=[N+]=[*]"),
    ("sulfinic_acid", "[SX3](=O)[O-,OH]"),
    ("diazo", "N#N"),
    ("polyfluoro", "F.F.F.F"),
    ("long_chain", "[R0;D2][R0;D2][R0;D2][R0;D2]"),
    ("imide", "[cR,CR]~C(=O)NC(=O)~[cR,CR]"),
    ("michael_acceptor", "C=!@CC=[O,S]"),
    ("ester", "[#6,#8,#16][#6](=O)O[#6]"),
    ("aryl_ketone", "c[C;R0](=[O,S])[#6]"),
    ("aryl_thioether", "c[SX2][C;!R]"),
    ("allene", "C=C=C"),
    ("halopyrimidine_2", "c1nc([F,Cl,Br,I,S])ncc1"),
    ("halopyrimidine_4", "c1ncnc([F,Cl,Br,I,S])c1"),
    ("halopurine", "c1nc(c2c(n1)nc(n2)[F,Cl,Br,I])"),
    ("fluorophenyl_sulfone", "[#6]S(=O)(=O)c1ccc(cc1)F"),
    ("isotope_n15", "[15N]"),
    ("isotope_c13", "[13C]"),
    ("isotope_o18", "[18O]"),
    ("isotope_s34", "[34S]"),
];

fn qed_alerts() -> &'static AlertCatalog {
    static CATALOG: OnceLock<AlertCatalog> = OnceLock::new();
    CATALOG.get_or_init(|| AlertCatalog::lenient("qed_alerts", QED_ALERT_PATTERNS))
}

/// Number of QED alerts present in a molecule.
pub fn alert_count(mol: &Molecule) -> usize {
    qed_alerts().count_matches(mol)
}

/// Acceptor count used by the HBA term. Broader than the Lipinski count in
/// [`Descriptors::h_acceptors`]: acid hydroxyls and ester oxygens count.
pub fn qed_acceptors(mol: &Molecule) -> u32 {
    acceptors_in(&MatchContext::new(mol))
}

fn acceptors_in(ctx: &MatchContext<'_>) -> u32 {
    ACCEPTORS.iter().map(|p| p.count_atoms(ctx)).sum::<usize>() as u32
}

/// Aromatic ring count used by the AROM term: the cycle rank of what is left
/// once aliphatic ring atoms with non-aromatic neighbours are removed.
fn aromatic_systems_in(ctx: &MatchContext<'_>) -> u32 {
    let mol = ctx.molecule();
    let keep: Vec<bool> = (0..mol.atom_count())
        .map(|i| !ALIPHATIC_RING_ATOM.matches_at(ctx, i))
        .collect();

    let mut parent: Vec<usize> = (0..mol.atom_count()).collect();
    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut edges = 0usize;
    let mut merges = 0usize;
    for bond in mol.bonds().iter().filter(|b| keep[b.begin] && keep[b.end]) {
        edges += 1;
        let (a, b) = (root(&mut parent, bond.begin), root(&mut parent, bond.end));
        if a != b {
            parent[a] = b;
            merges += 1;
        }
    }
    // Cycle rank E - V + C, with V - C equal to the number of merges.
    (edges - merges) as u32
}

/// QED computed from scratch.
pub fn qed(mol: &Molecule) -> f64 {
    Descriptors::compute(mol).qed
}

/// QED from an already populated descriptor set; its `qed` field is ignored.
pub(crate) fn qed_in(ctx: &MatchContext<'_>, desc: &Descriptors) -> f64 {
    let alerts = qed_alerts().count_matches_in(ctx);
    let values = [
        MW.desirability(desc.mol_wt),
        ALOGP.desirability(desc.logp),
        HBA.desirability(acceptors_in(ctx) as f64),
        HBD.desirability(desc.h_donors as f64),
        PSA.desirability(desc.tpsa),
        ROTB.desirability(desc.rotatable_bonds as f64),
        AROM.desirability(aromatic_systems_in(ctx) as f64),
        ALERTS.desirability(alerts as f64),
    ];
    weighted_geometric_mean(&values, &WEIGHTS)
}

fn weighted_geometric_mean(values: &[f64; 8], weights: &[f64; 8]) -> f64 {
    let total: f64 = weights.iter().sum();
    let log_sum: f64 = values
        .iter()
        .zip(weights)
        .map(|(&v, &w)| w * v.max(1e-12).ln())
        .sum();
    (log_sum / total).exp().clamp(0.0, 1.0)
}
