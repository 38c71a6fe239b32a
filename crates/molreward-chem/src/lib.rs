//! molreward-chem — the cheminformatics toolkit behind molreward.
//!
//! Provides the collaborator side of the scoring pipeline:
//! 1. SMILES parsing into a hydrogen-suppressed molecular graph
//! 2. Valence sanitisation
//! 3. Ring perception (SSSR)
//! 4. Scalar descriptors (logP, MW, TPSA, counts) and QED
//! 5. Morgan fingerprints
//! 6. SMARTS substructure queries and structural alert catalogs

pub mod element;
pub mod molecule;
pub mod smiles;
pub mod valence;
pub mod rings;
pub mod descriptors;
pub mod qed;
pub mod fingerprint;
pub mod alerts;
pub mod smarts;

pub use alerts::{AlertCatalog, StructuralFilter};
pub use descriptors::Descriptors;
pub use fingerprint::{morgan_fingerprint, Fingerprint};
pub use molecule::{Atom, Bond, BondOrder, Molecule};
pub use smarts::{parse_smarts, smarts_match, SmartsError, SmartsPattern};
pub use smiles::{parse_smiles, ParseError};
pub use valence::{sanitize, ValenceError};
