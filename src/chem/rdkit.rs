//! Morgan fingerprints through RDKit.
//!
//! Parsing and sanitization use `rdkit-sys`; the bit vector comes from
//! `RDKit::MorganFingerprints::getFingerprintAsBitVect` via a small bridge
//! in `cpp/morgan.cc`.

use cxx::let_cxx_string;
use rdkit_sys::ro_mol_ffi::smiles_to_mol;

use super::MoleculeError;

#[cxx::bridge(namespace = "reactcond")]
mod ffi {
    unsafe extern "C++" {
        include!("reactcond/cpp/morgan.h");

        #[namespace = "RDKit"]
        type ROMol = rdkit_sys::ro_mol_ffi::ROMol;

        /// On-bit indices of the folded Morgan fingerprint.
        fn morgan_on_bits(
            mol: &SharedPtr<ROMol>,
            radius: u32,
            n_bits: u32,
            use_chirality: bool,
        ) -> Result<Vec<u32>>;
    }
}

/// Parse `smiles` with RDKit and return the set bits of its Morgan
/// fingerprint.
pub fn morgan_on_bits(
    smiles: &str,
    radius: u32,
    n_bits: usize,
    use_chirality: bool,
) -> Result<Vec<u32>, MoleculeError> {
    let_cxx_string!(smiles_cxx = smiles);
    let mol = smiles_to_mol(&smiles_cxx).map_err(|e| MoleculeError::Rdkit(e.what().to_string()))?;
    if mol.is_null() {
        return Err(MoleculeError::Rdkit("SMILES did not parse".to_string()));
    }
    ffi::morgan_on_bits(&mol, radius, n_bits as u32, use_chirality)
        .map_err(|e| MoleculeError::Rdkit(e.what().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_bits_within_width() {
        let bits = morgan_on_bits("CC(=O)Nc1ccc(O)cc1", 2, 512, true).unwrap();
        assert!(!bits.is_empty());
        assert!(bits.iter().all(|&b| b < 512));
    }

    #[test]
    fn test_cip_stereo_ignores_atom_order() {
        // L-alanine written from either end
        let a = morgan_on_bits("N[C@@H](C)C(=O)O", 2, 512, true).unwrap();
        let b = morgan_on_bits("C[C@H](N)C(=O)O", 2, 512, true).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_smiles_is_error() {
        assert!(morgan_on_bits("CC(", 2, 512, true).is_err());
        assert!(morgan_on_bits("[Xx]", 2, 512, true).is_err());
    }
}
