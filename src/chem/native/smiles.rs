//! SMILES parsing into a molecular graph.
//!
//! Covers the subset of the grammar found in reaction datasets: organic-subset
//! and bracket atoms, branches, ring closures (including `%nn`), explicit bond
//! symbols, dot-separated components and atom-map classes. After parsing the
//! graph is sanitized the way cheminformatics toolkits do on load: ring
//! membership is perceived, implicit hydrogens are assigned, and over-valent
//! or non-ring aromatic atoms are rejected.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::elements;

const TOKEN_PATTERN: &str =
    r"(\[[^\]]*\]|Br|Cl|B|C|N|O|P|S|F|I|b|c|n|o|p|s|\*|\(|\)|\.|=|#|\$|-|:|/|\\|%[0-9]{2}|[0-9])";

const BRACKET_PATTERN: &str = r"^(\d+)?([A-Z][a-z]?|se|as|te|[bcnops]|\*)(@@|@(?:TH[12]|AL[12]|SP[123]|TB\d{1,2}|OH\d{1,2})?)?(H\d?)?([+-]\d+|\++|-+)?(?::(\d+))?$";

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("SMILES token pattern is valid"))
}

fn bracket_regex() -> &'static Regex {
    static BRACKET: OnceLock<Regex> = OnceLock::new();
    BRACKET.get_or_init(|| Regex::new(BRACKET_PATTERN).expect("bracket atom pattern is valid"))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("unexpected character {ch:?} at position {position}")]
    UnexpectedCharacter { position: usize, ch: char },

    #[error("invalid bracket atom {0:?}")]
    InvalidBracketAtom(String),

    #[error("unknown element {0:?}")]
    UnknownElement(String),

    #[error("unmatched ')' at position {0}")]
    UnmatchedParenthesis(usize),

    #[error("unclosed branch")]
    UnclosedBranch,

    #[error("unclosed ring bond {0}")]
    UnclosedRing(u16),

    #[error("bond symbol at position {0} is not between two atoms")]
    DanglingBond(usize),

    #[error("branch or ring bond at position {0} has no preceding atom")]
    MissingAtom(usize),

    #[error("duplicate bond between atoms {0} and {1}")]
    DuplicateBond(usize, usize),

    #[error("explicit valence {valence} for atom {atom} ({symbol}) exceeds the permitted maximum")]
    Valence {
        atom: usize,
        symbol: &'static str,
        valence: u8,
    },

    #[error("atom {0} is marked aromatic but is not in a ring")]
    NonRingAromatic(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Chirality {
    None,
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Valence contribution; aromatic bonds count as single here and the
    /// extra electron is accounted for per atom.
    fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub atomic_number: u8,
    pub aromatic: bool,
    pub isotope: u16,
    pub charge: i8,
    pub chirality: Chirality,
    /// Hydrogen count written inside brackets; `None` for organic-subset atoms.
    pub bracket_hydrogens: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

/// A sanitized molecular graph.
#[derive(Debug, Clone)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<(usize, usize)>>,
    ring_atoms: Vec<bool>,
    hydrogens: Vec<u8>,
}

impl Molecule {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// `(neighbor atom, bond index)` pairs for an atom.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn total_hydrogens(&self, atom: usize) -> u8 {
        self.hydrogens[atom]
    }

    pub fn is_in_ring(&self, atom: usize) -> bool {
        self.ring_atoms[atom]
    }
}

/// Parse a SMILES string. An empty string yields an empty molecule.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    let mut parser = Parser::default();
    let mut position = 0;

    for token in token_regex().find_iter(smiles) {
        if token.start() != position {
            return Err(unexpected(smiles, position));
        }
        parser.token(token.as_str(), token.start())?;
        position = token.end();
    }
    if position != smiles.len() {
        return Err(unexpected(smiles, position));
    }

    parser.finish()
}

fn unexpected(smiles: &str, position: usize) -> SmilesError {
    SmilesError::UnexpectedCharacter {
        position,
        ch: smiles[position..].chars().next().unwrap_or('\0'),
    }
}

#[derive(Default)]
struct Parser {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    previous: Option<usize>,
    branches: Vec<Option<usize>>,
    pending_bond: Option<(BondOrder, usize)>,
    open_rings: HashMap<u16, (usize, Option<BondOrder>)>,
}

impl Parser {
    fn token(&mut self, token: &str, position: usize) -> Result<(), SmilesError> {
        match token {
            "(" => {
                if self.previous.is_none() {
                    return Err(SmilesError::MissingAtom(position));
                }
                self.branches.push(self.previous);
            }
            ")" => {
                if self.pending_bond.is_some() {
                    return Err(SmilesError::DanglingBond(position));
                }
                self.previous = self
                    .branches
                    .pop()
                    .ok_or(SmilesError::UnmatchedParenthesis(position))?;
            }
            "." => {
                if self.pending_bond.is_some() {
                    return Err(SmilesError::DanglingBond(position));
                }
                self.previous = None;
            }
            "-" | "/" | "\\" => self.bond_symbol(BondOrder::Single, position)?,
            "=" => self.bond_symbol(BondOrder::Double, position)?,
            "#" => self.bond_symbol(BondOrder::Triple, position)?,
            "$" => self.bond_symbol(BondOrder::Quadruple, position)?,
            ":" => self.bond_symbol(BondOrder::Aromatic, position)?,
            _ if token.starts_with('%') => self.ring_bond(parse_ring_number(&token[1..]), position)?,
            _ if token.as_bytes()[0].is_ascii_digit() => {
                self.ring_bond(parse_ring_number(token), position)?
            }
            _ if token.starts_with('[') => {
                let atom = parse_bracket_atom(&token[1..token.len() - 1])?;
                self.add_atom(atom)?;
            }
            _ => {
                let atom = parse_organic_atom(token)?;
                self.add_atom(atom)?;
            }
        }
        Ok(())
    }

    fn bond_symbol(&mut self, order: BondOrder, position: usize) -> Result<(), SmilesError> {
        if self.previous.is_none() || self.pending_bond.is_some() {
            return Err(SmilesError::DanglingBond(position));
        }
        self.pending_bond = Some((order, position));
        Ok(())
    }

    fn add_atom(&mut self, atom: Atom) -> Result<(), SmilesError> {
        let index = self.atoms.len();
        self.atoms.push(atom);

        match self.previous {
            Some(previous) => {
                let order = match self.pending_bond.take() {
                    Some((order, _)) => order,
                    None => self.default_order(previous, index),
                };
                self.add_bond(previous, index, order)?;
            }
            None => {
                if let Some((_, position)) = self.pending_bond {
                    return Err(SmilesError::DanglingBond(position));
                }
            }
        }

        self.previous = Some(index);
        Ok(())
    }

    fn ring_bond(&mut self, number: u16, position: usize) -> Result<(), SmilesError> {
        let current = self.previous.ok_or(SmilesError::MissingAtom(position))?;
        let written = self.pending_bond.take().map(|(order, _)| order);

        match self.open_rings.remove(&number) {
            Some((opener, opened_with)) => {
                let order = written
                    .or(opened_with)
                    .unwrap_or_else(|| self.default_order(opener, current));
                self.add_bond(opener, current, order)
            }
            None => {
                self.open_rings.insert(number, (current, written));
                Ok(())
            }
        }
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn add_bond(&mut self, begin: usize, end: usize, order: BondOrder) -> Result<(), SmilesError> {
        let duplicate = begin == end
            || self.bonds.iter().any(|bond| {
                (bond.begin == begin && bond.end == end) || (bond.begin == end && bond.end == begin)
            });
        if duplicate {
            return Err(SmilesError::DuplicateBond(begin, end));
        }
        self.bonds.push(Bond { begin, end, order });
        Ok(())
    }

    fn finish(self) -> Result<Molecule, SmilesError> {
        if let Some((_, position)) = self.pending_bond {
            return Err(SmilesError::DanglingBond(position));
        }
        if !self.branches.is_empty() {
            return Err(SmilesError::UnclosedBranch);
        }
        if let Some(number) = self.open_rings.keys().min() {
            return Err(SmilesError::UnclosedRing(*number));
        }

        let mut adjacency = vec![Vec::new(); self.atoms.len()];
        for (index, bond) in self.bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, index));
            adjacency[bond.end].push((bond.begin, index));
        }

        let ring_bonds = find_ring_bonds(&adjacency, self.bonds.len());
        let ring_atoms: Vec<bool> = adjacency
            .iter()
            .map(|edges| edges.iter().any(|&(_, bond)| ring_bonds[bond]))
            .collect();

        let mut hydrogens = Vec::with_capacity(self.atoms.len());
        for (index, atom) in self.atoms.iter().enumerate() {
            if atom.aromatic && !ring_atoms[index] {
                return Err(SmilesError::NonRingAromatic(index));
            }
            let bond_valence: u8 = adjacency[index]
                .iter()
                .map(|&(_, bond)| self.bonds[bond].order.valence())
                .sum();
            hydrogens.push(implicit_hydrogens(index, atom, bond_valence)?);
        }

        Ok(Molecule {
            atoms: self.atoms,
            bonds: self.bonds,
            adjacency,
            ring_atoms,
            hydrogens,
        })
    }
}

fn parse_ring_number(digits: &str) -> u16 {
    digits
        .bytes()
        .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'))
}

fn parse_organic_atom(token: &str) -> Result<Atom, SmilesError> {
    let (atomic_number, aromatic) = match elements::aromatic_symbol(token) {
        Some(number) => (number, true),
        None if token == "*" => (0, false),
        None => (
            elements::atomic_number(token)
                .ok_or_else(|| SmilesError::UnknownElement(token.to_string()))?,
            false,
        ),
    };
    Ok(Atom {
        atomic_number,
        aromatic,
        isotope: 0,
        charge: 0,
        chirality: Chirality::None,
        bracket_hydrogens: None,
    })
}

fn parse_bracket_atom(body: &str) -> Result<Atom, SmilesError> {
    let caps = bracket_regex()
        .captures(body)
        .ok_or_else(|| SmilesError::InvalidBracketAtom(body.to_string()))?;

    let invalid = || SmilesError::InvalidBracketAtom(body.to_string());

    let isotope = match caps.get(1) {
        Some(m) => m.as_str().parse::<u16>().map_err(|_| invalid())?,
        None => 0,
    };

    let symbol = caps.get(2).map(|m| m.as_str()).ok_or_else(invalid)?;
    let (atomic_number, aromatic) = match elements::aromatic_symbol(symbol) {
        Some(number) => (number, true),
        None => (
            elements::atomic_number(symbol)
                .ok_or_else(|| SmilesError::UnknownElement(symbol.to_string()))?,
            false,
        ),
    };

    let chirality = match caps.get(3).map(|m| m.as_str()) {
        None => Chirality::None,
        Some("@@") | Some("@TH2") | Some("@AL2") => Chirality::Clockwise,
        Some(_) => Chirality::CounterClockwise,
    };

    let hydrogens = match caps.get(4).map(|m| m.as_str()) {
        None => 0,
        Some("H") => 1,
        Some(h) => h[1..].parse::<u8>().map_err(|_| invalid())?,
    };

    let charge = match caps.get(5).map(|m| m.as_str()) {
        None => 0,
        Some(c) => {
            let sign: i8 = if c.starts_with('+') { 1 } else { -1 };
            let rest = &c[1..];
            if rest.is_empty() || !rest.as_bytes()[0].is_ascii_digit() {
                sign * c.len() as i8
            } else {
                sign * rest.parse::<i8>().map_err(|_| invalid())?
            }
        }
    };

    Ok(Atom {
        atomic_number,
        aromatic,
        isotope,
        charge,
        chirality,
        bracket_hydrogens: Some(hydrogens),
    })
}

fn implicit_hydrogens(index: usize, atom: &Atom, bond_valence: u8) -> Result<u8, SmilesError> {
    if let Some(explicit) = atom.bracket_hydrogens {
        return Ok(explicit);
    }

    let valences = elements::default_valences(atom.atomic_number);
    let Some(&lowest) = valences.first() else {
        return Ok(0);
    };

    if atom.aromatic {
        // One electron goes to the aromatic system.
        return Ok(lowest.saturating_sub(bond_valence + 1));
    }

    valences
        .iter()
        .find(|&&v| v >= bond_valence)
        .map(|&v| v - bond_valence)
        .ok_or(SmilesError::Valence {
            atom: index,
            symbol: elements::symbol(atom.atomic_number),
            valence: bond_valence,
        })
}

/// Marks bonds that lie on at least one cycle (every non-bridge bond).
fn find_ring_bonds(adjacency: &[Vec<(usize, usize)>], n_bonds: usize) -> Vec<bool> {
    const UNVISITED: usize = usize::MAX;

    let n = adjacency.len();
    let mut discovered = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut bridge = vec![false; n_bonds];
    let mut time = 0usize;

    for root in 0..n {
        if discovered[root] != UNVISITED {
            continue;
        }
        discovered[root] = time;
        low[root] = time;
        time += 1;

        // (atom, bond we arrived through, next adjacency slot)
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        while let Some(frame) = stack.last_mut() {
            let (u, via) = (frame.0, frame.1);
            if frame.2 < adjacency[u].len() {
                let (v, bond) = adjacency[u][frame.2];
                frame.2 += 1;
                if Some(bond) == via {
                    continue;
                }
                if discovered[v] == UNVISITED {
                    discovered[v] = time;
                    low[v] = time;
                    time += 1;
                    stack.push((v, Some(bond), 0));
                } else {
                    low[u] = low[u].min(discovered[v]);
                }
            } else {
                stack.pop();
                if let Some(&(parent, _, _)) = stack.last() {
                    low[parent] = low[parent].min(low[u]);
                    if low[u] > discovered[parent] {
                        if let Some(bond) = via {
                            bridge[bond] = true;
                        }
                    }
                }
            }
        }
    }

    bridge.into_iter().map(|is_bridge| !is_bridge).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ethanol() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.len(), 3);
        assert_eq!(mol.bonds().len(), 2);
        assert_eq!(mol.total_hydrogens(0), 3);
        assert_eq!(mol.total_hydrogens(1), 2);
        assert_eq!(mol.total_hydrogens(2), 1);
        assert!(!mol.is_in_ring(0));
    }

    #[test]
    fn test_parse_benzene() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.len(), 6);
        assert_eq!(mol.bonds().len(), 6);
        for atom in 0..6 {
            assert!(mol.is_in_ring(atom));
            assert_eq!(mol.total_hydrogens(atom), 1);
            assert_eq!(mol.degree(atom), 2);
        }
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn test_ring_membership_with_substituent() {
        // toluene: methyl carbon is outside the ring
        let mol = parse_smiles("Cc1ccccc1").unwrap();
        assert!(!mol.is_in_ring(0));
        assert!(mol.is_in_ring(1));
        assert_eq!(mol.total_hydrogens(1), 0);
    }

    #[test]
    fn test_heteroaromatics() {
        let pyridine = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(pyridine.total_hydrogens(3), 0);

        let thiophene = parse_smiles("c1ccsc1").unwrap();
        assert_eq!(thiophene.total_hydrogens(3), 0);

        let pyrrole = parse_smiles("c1cc[nH]c1").unwrap();
        assert_eq!(pyrrole.total_hydrogens(3), 1);
    }

    #[test]
    fn test_branches_and_bonds() {
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.len(), 4);
        assert_eq!(mol.bonds()[1].order, BondOrder::Double);
        assert_eq!(mol.total_hydrogens(2), 0);
        assert_eq!(mol.total_hydrogens(3), 1);
    }

    #[test]
    fn test_bracket_atoms() {
        let mol = parse_smiles("[13CH3][N+](C)(C)C.[Cl-]").unwrap();
        assert_eq!(mol.atoms()[0].isotope, 13);
        assert_eq!(mol.total_hydrogens(0), 3);
        assert_eq!(mol.atoms()[1].charge, 1);
        assert_eq!(mol.atoms()[5].charge, -1);
        assert_eq!(mol.atoms()[5].atomic_number, 17);
    }

    #[test]
    fn test_chirality_and_atom_maps() {
        let mol = parse_smiles("N[C@@H:3](C)C(=O)O").unwrap();
        assert_eq!(mol.atoms()[1].chirality, Chirality::Clockwise);
        assert_eq!(mol.total_hydrogens(1), 1);

        let mol = parse_smiles("N[C@H](C)C(=O)O").unwrap();
        assert_eq!(mol.atoms()[1].chirality, Chirality::CounterClockwise);
    }

    #[test]
    fn test_percent_ring_closure() {
        let mol = parse_smiles("C%10CCCCC%10").unwrap();
        assert_eq!(mol.bonds().len(), 6);
        assert!((0..6).all(|a| mol.is_in_ring(a)));
    }

    #[test]
    fn test_metal_and_multi_component() {
        let mol = parse_smiles("[Pd].c1ccc(P(c2ccccc2)c2ccccc2)cc1").unwrap();
        assert_eq!(mol.atoms()[0].atomic_number, 46);
        assert_eq!(mol.degree(0), 0);
        assert!(!mol.is_in_ring(0));
    }

    #[test]
    fn test_hypervalent_iodine_reagents() {
        // PIDA: iodine(III)
        let pida = parse_smiles("CC(=O)OI(OC(C)=O)c1ccccc1").unwrap();
        let iodine = pida.atoms().iter().position(|a| a.atomic_number == 53).unwrap();
        assert_eq!(pida.degree(iodine), 3);
        assert_eq!(pida.total_hydrogens(iodine), 0);

        // Dess-Martin periodinane: iodine(V)
        let dmp = parse_smiles("CC(=O)OI1(OC(C)=O)(OC(C)=O)OC(=O)c2ccccc21").unwrap();
        let iodine = dmp.atoms().iter().position(|a| a.atomic_number == 53).unwrap();
        assert_eq!(dmp.degree(iodine), 5);
        assert_eq!(dmp.total_hydrogens(iodine), 0);
    }

    #[test]
    fn test_empty_string_is_empty_molecule() {
        let mol = parse_smiles("").unwrap();
        assert!(mol.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_smiles("C1CC"),
            Err(SmilesError::UnclosedRing(1))
        ));
        assert!(matches!(
            parse_smiles("CC(C"),
            Err(SmilesError::UnclosedBranch)
        ));
        assert!(matches!(
            parse_smiles("CC)C"),
            Err(SmilesError::UnmatchedParenthesis(2))
        ));
        assert!(matches!(
            parse_smiles("not_a_smiles"),
            Err(SmilesError::UnexpectedCharacter { .. })
        ));
        assert!(matches!(parse_smiles("CC="), Err(SmilesError::DanglingBond(2))));
        assert!(matches!(
            parse_smiles("[Xx]"),
            Err(SmilesError::UnknownElement(_))
        ));
        assert!(matches!(
            parse_smiles("C(C)(C)(C)(C)C"),
            Err(SmilesError::Valence { .. })
        ));
        assert!(matches!(
            parse_smiles("cc"),
            Err(SmilesError::NonRingAromatic(0))
        ));
    }
}
