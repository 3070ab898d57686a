//! Input recipes: which fingerprints are concatenated into a model input.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::fingerprint::FINGERPRINT_BITS;

/// Optional fingerprint blocks, in concatenation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    /// `product - reactant` difference fingerprint.
    ReactionDifference,
    Catalyst,
    Solvent,
    Reagent0,
    Reagent1,
}

impl Component {
    pub const ORDER: [Component; 5] = [
        Component::ReactionDifference,
        Component::Catalyst,
        Component::Solvent,
        Component::Reagent0,
        Component::Reagent1,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Component::ReactionDifference => "rxnfp",
            Component::Catalyst => "cat",
            Component::Solvent => "solv",
            Component::Reagent0 => "reag0",
            Component::Reagent1 => "reag1",
        }
    }

    /// Condition column read for this block, if it is a condition fingerprint.
    pub fn condition_column(self) -> Option<&'static str> {
        match self {
            Component::ReactionDifference => None,
            other => Some(other.token()),
        }
    }
}

/// Tokens naming the always-present reactant/product pair.
const BASE_TOKENS: [&str; 4] = ["rfp", "pfp", "reactants", "products"];

/// A parsed `+`-separated recipe such as `rfp+pfp+rxnfp+solv`.
///
/// Blocks are always laid out as `[reactant][product]` followed by the
/// selected optional blocks in [`Component::ORDER`], whatever order the
/// recipe string names them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRecipe {
    components: Vec<Component>,
}

impl InputRecipe {
    pub fn new(selected: &[Component]) -> Self {
        InputRecipe {
            components: Component::ORDER
                .into_iter()
                .filter(|c| selected.contains(c))
                .collect(),
        }
    }

    pub fn contains(&self, component: Component) -> bool {
        self.components.contains(&component)
    }

    /// Selected optional blocks in concatenation order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Number of fingerprint blocks, including reactant and product.
    pub fn block_count(&self) -> usize {
        2 + self.components.len()
    }

    pub fn input_width(&self) -> usize {
        self.block_count() * FINGERPRINT_BITS
    }
}

impl FromStr for InputRecipe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut selected = Vec::new();
        for token in s.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            if BASE_TOKENS.contains(&token) {
                continue;
            }
            let component = Component::ORDER
                .into_iter()
                .find(|c| c.token() == token)
                .ok_or_else(|| Error::UnknownRecipeComponent(token.to_string()))?;
            selected.push(component);
        }
        Ok(InputRecipe::new(&selected))
    }
}

impl fmt::Display for InputRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("rfp+pfp")?;
        for component in &self.components {
            write!(f, "+{}", component.token())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_concatenation_order() {
        let recipe: InputRecipe = "reag1+solv+rxnfp+cat".parse().unwrap();
        assert_eq!(
            recipe.components(),
            &[
                Component::ReactionDifference,
                Component::Catalyst,
                Component::Solvent,
                Component::Reagent1
            ]
        );
        assert_eq!(recipe.to_string(), "rfp+pfp+rxnfp+cat+solv+reag1");
    }

    #[test]
    fn test_input_width() {
        let base: InputRecipe = "rfp+pfp".parse().unwrap();
        assert_eq!(base.input_width(), 1024);

        let full: InputRecipe = "rfp+pfp+rxnfp+cat+solv+reag0+reag1".parse().unwrap();
        assert_eq!(full.input_width(), 1024 + 5 * 512);

        let empty: InputRecipe = "".parse().unwrap();
        assert_eq!(empty.input_width(), 1024);
    }

    #[test]
    fn test_duplicates_collapse() {
        let recipe: InputRecipe = "cat+cat+rxnfp".parse().unwrap();
        assert_eq!(recipe.block_count(), 4);
    }

    #[test]
    fn test_unknown_component() {
        let err = "rfp+pfp+temperature".parse::<InputRecipe>().unwrap_err();
        assert!(matches!(err, Error::UnknownRecipeComponent(ref t) if t == "temperature"));
        assert!("reag2".parse::<InputRecipe>().is_err());
    }
}
