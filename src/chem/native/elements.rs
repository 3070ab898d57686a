//! Element symbols and default valences.

/// Symbols indexed by atomic number (index 0 is the `*` wildcard).
const SYMBOLS: [&str; 119] = [
    "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Look up an atomic number from a capitalized element symbol.
pub fn atomic_number(symbol: &str) -> Option<u8> {
    SYMBOLS
        .iter()
        .position(|s| *s == symbol)
        .map(|n| n as u8)
}

pub fn symbol(atomic_number: u8) -> &'static str {
    SYMBOLS.get(atomic_number as usize).copied().unwrap_or("*")
}

/// Allowed valences of neutral organic-subset atoms, lowest first, as in
/// RDKit's periodic table. Atoms outside the subset have no implicit
/// hydrogens.
pub fn default_valences(atomic_number: u8) -> &'static [u8] {
    match atomic_number {
        5 => &[3],
        6 => &[4],
        7 => &[3],
        8 => &[2],
        15 => &[3, 5, 7],
        16 => &[2, 4, 6],
        53 => &[1, 3, 5],
        9 | 17 | 35 => &[1],
        _ => &[],
    }
}

/// Elements that may be written in lowercase (aromatic) form.
pub fn aromatic_symbol(symbol: &str) -> Option<u8> {
    match symbol {
        "b" => Some(5),
        "c" => Some(6),
        "n" => Some(7),
        "o" => Some(8),
        "p" => Some(15),
        "s" => Some(16),
        "se" => Some(34),
        "as" => Some(33),
        "te" => Some(52),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(atomic_number("C"), Some(6));
        assert_eq!(atomic_number("Cl"), Some(17));
        assert_eq!(atomic_number("Pd"), Some(46));
        assert_eq!(atomic_number("Xx"), None);
        assert_eq!(symbol(26), "Fe");
    }

    #[test]
    fn test_hypervalent_iodine_and_phosphorus() {
        assert_eq!(default_valences(53), &[1, 3, 5]);
        assert_eq!(default_valences(15), &[3, 5, 7]);
        assert_eq!(default_valences(7), &[3]);
        assert!(default_valences(46).is_empty());
    }

    #[test]
    fn test_aromatic_symbols() {
        assert_eq!(aromatic_symbol("c"), Some(6));
        assert_eq!(aromatic_symbol("se"), Some(34));
        assert_eq!(aromatic_symbol("x"), None);
    }
}
