//! # reactcond - Reaction Condition Prediction
//!
//! Trains feed-forward classifiers that recommend reaction conditions
//! (catalyst, solvent, reagents) from Morgan fingerprints of reaction SMILES.
//!
//! ## Pipeline
//!
//! ```text
//! reactions CSV ─► fingerprints (rayon) ─► assembled dataset ─► 90/10 split
//!                                                                  │
//!                  metrics CSV + .pt model ◄─ top-k evaluation ◄─ training
//! ```
//!
//! The fingerprinting, assembly, splitting and evaluation stages are always
//! available. Fingerprints come from RDKit with the `rdkit` feature and from a
//! pure-Rust fallback otherwise. Training needs libtorch and lives behind the
//! `torch` feature.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use reactcond::features::prepare_dataset;
//! use reactcond::fingerprint::MorganFingerprinter;
//!
//! let fp = MorganFingerprinter::default();
//! let data = prepare_dataset(Path::new("data"), "1976-2016_5+", false, "cat", "rfp+pfp+rxnfp", &fp)?;
//! println!("{} examples, input width {}", data.len(), data.input_width);
//! # Ok::<(), reactcond::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `torch`: tch-based models, training loop and the `reactcond` binary
//! - `download-libtorch`: let tch fetch libtorch at build time
//! - `rdkit`: Morgan fingerprints through a system RDKit install

pub mod chem;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod fingerprint;
pub mod train;

pub use error::{Error, Result};

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;

/// One row of the reaction table.
///
/// Extra columns in the table are ignored; empty condition cells read as
/// `None`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ReactionRecord {
    /// Dot-separated reactant SMILES
    pub reactants: String,
    /// Dot-separated product SMILES
    pub products: String,
    /// Reaction template id
    pub template: usize,
    #[serde(default)]
    pub cat: Option<String>,
    #[serde(default)]
    pub solv: Option<String>,
    #[serde(default)]
    pub reag0: Option<String>,
    #[serde(default)]
    pub reag1: Option<String>,
    #[serde(default)]
    pub reag2: Option<String>,
    #[serde(default)]
    pub reag3: Option<String>,
}

impl ReactionRecord {
    /// Value of a condition column by name (`cat`, `solv`, `reag0`..`reag3`).
    /// Blank cells and unknown columns give `None`.
    pub fn condition(&self, column: &str) -> Option<&str> {
        let value = match column {
            "cat" => &self.cat,
            "solv" => &self.solv,
            "reag0" => &self.reag0,
            "reag1" => &self.reag1,
            "reag2" => &self.reag2,
            "reag3" => &self.reag3,
            _ => return None,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Load the reaction table from a CSV file.
///
/// # Example
/// ```no_run
/// use reactcond::load_records;
///
/// let records = load_records(std::path::Path::new("data/1976-2016_5+.csv"))?;
/// println!("Loaded {} records", records.len());
/// # Ok::<(), reactcond::Error>(())
/// ```
pub fn load_records(path: &Path) -> Result<Vec<ReactionRecord>> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: ReactionRecord = result?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,reactants,products,template,cat,solv,reag0,reag1,reag2,reag3").unwrap();
        writeln!(file, "0,CC(=O)O.OCC,CC(=O)OCC,3,[Pd],ClCCl,,,,").unwrap();
        writeln!(file, "1,CCN.CC(=O)Cl,CCNC(C)=O,0,,CO,O,,,").unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].template, 3);
        assert_eq!(records[0].condition("cat"), Some("[Pd]"));
        assert_eq!(records[0].condition("reag0"), None);
        assert_eq!(records[1].condition("cat"), None);
        assert_eq!(records[1].condition("reag0"), Some("O"));
    }

    #[test]
    fn test_condition_lookup() {
        let record = ReactionRecord {
            solv: Some("  ".to_string()),
            reag3: Some("CCO".to_string()),
            ..Default::default()
        };
        assert_eq!(record.condition("solv"), None);
        assert_eq!(record.condition("reag3"), Some("CCO"));
        assert_eq!(record.condition("template"), None);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_records(Path::new("/nonexistent/reactions.csv")),
            Err(Error::Io(_))
        ));
    }
}
