//! Circular substructure (Morgan / ECFP-style) hashing.
//!
//! Every atom starts from a connectivity invariant (element, degree, hydrogen
//! count, charge, isotope, ring membership). Each iteration folds in the
//! sorted `(bond, neighbor invariant)` pairs, so after `r` rounds an atom's
//! identifier describes its radius-`r` neighborhood. Identifiers from every
//! round are folded into a fixed number of bits.

use super::smiles::{BondOrder, Chirality, Molecule};

const GOLDEN_RATIO: u32 = 0x9e37_79b9;

fn hash_combine(seed: &mut u32, value: u32) {
    *seed ^= value
        .wrapping_add(GOLDEN_RATIO)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

fn bond_code(order: BondOrder) -> u32 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Quadruple => 4,
        BondOrder::Aromatic => 12,
    }
}

fn chirality_code(chirality: Chirality) -> u32 {
    match chirality {
        Chirality::None => 0,
        Chirality::CounterClockwise => 1,
        Chirality::Clockwise => 2,
    }
}

/// Initial per-atom identifiers.
pub fn atom_invariants(mol: &Molecule) -> Vec<u32> {
    mol.atoms()
        .iter()
        .enumerate()
        .map(|(index, atom)| {
            let hydrogens = mol.total_hydrogens(index) as u32;
            let mut seed = 0u32;
            hash_combine(&mut seed, atom.atomic_number as u32);
            hash_combine(&mut seed, mol.degree(index) as u32 + hydrogens);
            hash_combine(&mut seed, hydrogens);
            hash_combine(&mut seed, atom.charge as i32 as u32);
            hash_combine(&mut seed, atom.isotope as u32);
            hash_combine(&mut seed, mol.is_in_ring(index) as u32);
            seed
        })
        .collect()
}

/// Identifiers of all atom environments up to `radius`, round by round.
pub fn environment_ids(mol: &Molecule, radius: u32, use_chirality: bool) -> Vec<u32> {
    let mut current = atom_invariants(mol);
    let mut ids = current.clone();

    for layer in 1..=radius {
        let next: Vec<u32> = (0..mol.len())
            .map(|atom| {
                let mut neighborhood: Vec<(u32, u32)> = mol
                    .neighbors(atom)
                    .iter()
                    .map(|&(neighbor, bond)| {
                        (bond_code(mol.bonds()[bond].order), current[neighbor])
                    })
                    .collect();
                neighborhood.sort_unstable();

                let mut seed = layer;
                hash_combine(&mut seed, current[atom]);
                for (bond, invariant) in neighborhood {
                    hash_combine(&mut seed, bond);
                    hash_combine(&mut seed, invariant);
                }
                if use_chirality {
                    hash_combine(&mut seed, chirality_code(mol.atoms()[atom].chirality));
                }
                seed
            })
            .collect();

        ids.extend_from_slice(&next);
        current = next;
    }

    ids
}

/// Fold environment identifiers into an `n_bits` presence vector.
pub fn morgan_bits(mol: &Molecule, radius: u32, n_bits: usize, use_chirality: bool) -> Vec<i8> {
    let mut bits = vec![0i8; n_bits];
    if n_bits == 0 {
        return bits;
    }
    for id in environment_ids(mol, radius, use_chirality) {
        bits[id as usize % n_bits] = 1;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::native::smiles::parse_smiles;

    #[test]
    fn test_environment_count() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(environment_ids(&mol, 2, true).len(), 9);
    }

    #[test]
    fn test_symmetric_atoms_share_invariants() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        let ids = environment_ids(&mol, 2, false);
        assert!(ids[..6].iter().all(|&id| id == ids[0]));
        assert!(ids[6..12].iter().all(|&id| id == ids[6]));
        assert!(ids[12..].iter().all(|&id| id == ids[12]));
    }

    #[test]
    fn test_chirality_changes_outer_layers_only() {
        let r = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        let s = parse_smiles("N[C@H](C)C(=O)O").unwrap();
        let r_ids = environment_ids(&r, 2, true);
        let s_ids = environment_ids(&s, 2, true);
        assert_eq!(r_ids[..r.len()], s_ids[..s.len()]);
        assert_ne!(r_ids, s_ids);

        assert_eq!(environment_ids(&r, 2, false), environment_ids(&s, 2, false));
    }

    #[test]
    fn test_bits_are_binary() {
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let bits = morgan_bits(&mol, 2, 512, true);
        assert_eq!(bits.len(), 512);
        assert!(bits.iter().all(|&b| b == 0 || b == 1));
        assert!(bits.iter().any(|&b| b == 1));
    }
}
