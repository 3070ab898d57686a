//! Molecule and reaction fingerprints.
//!
//! A [`Fingerprinter`] turns one SMILES string into a fixed-width
//! [`Fingerprint`]. Reactions produce three vectors (reactant, product and
//! their element-wise difference); reaction conditions produce one vector and
//! fall back to all zeros when the condition cannot be parsed.

use thiserror::Error;
use tracing::warn;

use crate::chem::MoleculeError;

/// Width of every fingerprint vector.
pub const FINGERPRINT_BITS: usize = 512;
/// Neighborhood radius of the circular hashing.
pub const FINGERPRINT_RADIUS: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not fingerprint {smiles:?}: {source}")]
pub struct ExtractionError {
    pub smiles: String,
    #[source]
    pub source: MoleculeError,
}

/// Fixed-width vector of small integers (bits, or bit differences).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<i8>);

impl Fingerprint {
    pub fn zeros(width: usize) -> Self {
        Fingerprint(vec![0; width])
    }

    pub fn from_values(values: Vec<i8>) -> Self {
        Fingerprint(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[i8] {
        &self.0
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|&&v| v != 0).count()
    }

    /// Element-wise `self - other`.
    pub fn difference(&self, other: &Fingerprint) -> Fingerprint {
        Fingerprint(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| a - b)
                .collect(),
        )
    }
}

/// Produces a fixed-width fingerprint for a molecule representation.
///
/// Implementations must be pure: the same input always yields the same
/// vector, regardless of call order or thread.
pub trait Fingerprinter: Sync {
    fn width(&self) -> usize;

    fn fingerprint(&self, smiles: &str) -> Result<Fingerprint, ExtractionError>;
}

/// Chirality-aware Morgan fingerprint, radius 2, 512 bits by default.
///
/// Backed by RDKit when built with the `rdkit` feature, by
/// [`crate::chem::native`] otherwise.
#[derive(Debug, Clone, Copy)]
pub struct MorganFingerprinter {
    pub radius: u32,
    pub n_bits: usize,
    pub use_chirality: bool,
}

impl Default for MorganFingerprinter {
    fn default() -> Self {
        MorganFingerprinter {
            radius: FINGERPRINT_RADIUS,
            n_bits: FINGERPRINT_BITS,
            use_chirality: true,
        }
    }
}

impl MorganFingerprinter {
    /// Name of the compiled-in implementation.
    pub fn backend(&self) -> &'static str {
        if cfg!(feature = "rdkit") {
            "rdkit"
        } else {
            "native"
        }
    }

    #[cfg(feature = "rdkit")]
    fn bits(&self, smiles: &str) -> Result<Vec<i8>, MoleculeError> {
        let on = crate::chem::rdkit::morgan_on_bits(
            smiles,
            self.radius,
            self.n_bits,
            self.use_chirality,
        )?;
        let mut bits = vec![0; self.n_bits];
        for bit in on {
            if let Some(slot) = bits.get_mut(bit as usize) {
                *slot = 1;
            }
        }
        Ok(bits)
    }

    #[cfg(not(feature = "rdkit"))]
    fn bits(&self, smiles: &str) -> Result<Vec<i8>, MoleculeError> {
        use crate::chem::native::{morgan, parse_smiles};

        let mol = parse_smiles(smiles)?;
        Ok(morgan::morgan_bits(
            &mol,
            self.radius,
            self.n_bits,
            self.use_chirality,
        ))
    }
}

impl Fingerprinter for MorganFingerprinter {
    fn width(&self) -> usize {
        self.n_bits
    }

    fn fingerprint(&self, smiles: &str) -> Result<Fingerprint, ExtractionError> {
        let bits = self.bits(smiles).map_err(|source| ExtractionError {
            smiles: smiles.to_string(),
            source,
        })?;
        Ok(Fingerprint(bits))
    }
}

/// Reactant, product and `product - reactant` fingerprints of one reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionFingerprint {
    pub reactant: Fingerprint,
    pub product: Fingerprint,
    pub difference: Fingerprint,
}

/// Fingerprint both sides of a reaction. Either side failing fails the whole
/// reaction; callers drop such records.
pub fn reaction_fingerprint<F: Fingerprinter + ?Sized>(
    fingerprinter: &F,
    reactants: &str,
    products: &str,
) -> Result<ReactionFingerprint, ExtractionError> {
    let reactant = fingerprinter.fingerprint(reactants)?;
    let product = fingerprinter.fingerprint(products)?;
    let difference = product.difference(&reactant);
    Ok(ReactionFingerprint {
        reactant,
        product,
        difference,
    })
}

/// Fingerprint a condition molecule (catalyst, solvent, reagent).
///
/// Missing or unparseable conditions become an all-zero vector of the
/// fingerprinter's width; the record is kept.
pub fn condition_fingerprint<F: Fingerprinter + ?Sized>(
    fingerprinter: &F,
    condition: Option<&str>,
) -> Fingerprint {
    let Some(smiles) = condition else {
        return Fingerprint::zeros(fingerprinter.width());
    };
    match fingerprinter.fingerprint(smiles) {
        Ok(fp) => fp,
        Err(e) => {
            warn!("{e}; using zero condition fingerprint");
            Fingerprint::zeros(fingerprinter.width())
        }
    }
}
