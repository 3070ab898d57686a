//! Pure-Rust SMILES parsing and Morgan hashing.
//!
//! Used when the crate is built without the `rdkit` feature. Bit positions
//! do not match RDKit's, and stereo is read from the written `@`/`@@` tags
//! rather than CIP labels, so the same stereoisomer written with a different
//! atom order can hash differently.

pub mod elements;
pub mod morgan;
pub mod smiles;

pub use smiles::{parse_smiles, Molecule, SmilesError};
