//! Molecule parsing and circular fingerprints.
//!
//! With the `rdkit` feature, SMILES go through RDKit and its Morgan
//! generator. Otherwise the [`native`] implementation is used.

use thiserror::Error;

pub mod native;
#[cfg(feature = "rdkit")]
pub mod rdkit;

pub use native::SmilesError;

/// Why a molecule could not be turned into a fingerprint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoleculeError {
    #[error(transparent)]
    Smiles(#[from] SmilesError),

    #[error("RDKit rejected the molecule: {0}")]
    Rdkit(String),
}
