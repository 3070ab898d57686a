//! Prediction targets and the reference files that define their labels.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;
use crate::ReactionRecord;

/// The condition field a model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Catalyst,
    Solvent,
    Reagent0,
    Reagent1,
    Reagent2,
    Reagent3,
}

impl Target {
    pub const ALL: [Target; 6] = [
        Target::Catalyst,
        Target::Solvent,
        Target::Reagent0,
        Target::Reagent1,
        Target::Reagent2,
        Target::Reagent3,
    ];

    /// Column name in the reaction table.
    pub fn column(self) -> &'static str {
        match self {
            Target::Catalyst => "cat",
            Target::Solvent => "solv",
            Target::Reagent0 => "reag0",
            Target::Reagent1 => "reag1",
            Target::Reagent2 => "reag2",
            Target::Reagent3 => "reag3",
        }
    }

    /// The four reagent slots share one vocabulary file.
    fn vocabulary_stem(self) -> &'static str {
        match self {
            Target::Catalyst => "cat",
            Target::Solvent => "solv",
            _ => "reag",
        }
    }

    /// `{dir}/all_{cat|solv|reag}_{withN|withoutN}.csv`
    pub fn vocabulary_path(self, dir: &Path, with_n: bool) -> PathBuf {
        dir.join(format!(
            "all_{}_{}.csv",
            self.vocabulary_stem(),
            nitrogen_suffix(with_n)
        ))
    }

    /// The label this target reads from a record.
    pub fn label(self, record: &ReactionRecord) -> Option<&str> {
        record.condition(self.column())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .into_iter()
            .find(|t| t.column() == s)
            .ok_or_else(|| Error::UnknownTarget(s.to_string()))
    }
}

/// File-name tag for the with/without-nitrogen dataset variant.
pub fn nitrogen_suffix(with_n: bool) -> &'static str {
    if with_n {
        "withN"
    } else {
        "withoutN"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!("cat".parse::<Target>().unwrap(), Target::Catalyst);
        assert_eq!("reag3".parse::<Target>().unwrap(), Target::Reagent3);
        for target in Target::ALL {
            assert_eq!(target.to_string().parse::<Target>().unwrap(), target);
        }
    }

    #[test]
    fn test_unknown_target() {
        let err = "temperature".parse::<Target>().unwrap_err();
        assert!(matches!(err, Error::UnknownTarget(ref t) if t == "temperature"));
        assert!("reag4".parse::<Target>().is_err());
        assert!("".parse::<Target>().is_err());
    }

    #[test]
    fn test_vocabulary_paths() {
        let dir = Path::new("data");
        assert_eq!(
            Target::Catalyst.vocabulary_path(dir, false),
            PathBuf::from("data/all_cat_withoutN.csv")
        );
        assert_eq!(
            Target::Solvent.vocabulary_path(dir, true),
            PathBuf::from("data/all_solv_withN.csv")
        );
        assert_eq!(
            Target::Reagent2.vocabulary_path(dir, true),
            PathBuf::from("data/all_reag_withN.csv")
        );
    }
}
