//! Label vocabularies read from reference CSV headers.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{Error, Result};

/// Ordered set of valid labels; a label's position is its class index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelVocabulary {
    /// Build from labels in order. Repeated labels keep their first position.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = LabelVocabulary::default();
        for label in labels {
            let label = label.into();
            if !vocab.index.contains_key(&label) {
                vocab.index.insert(label.clone(), vocab.labels.len());
                vocab.labels.push(label);
            }
        }
        vocab
    }

    /// Load from a reference file whose header row lists the labels.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let vocab = Self::from_reader(file)?;
        if vocab.is_empty() {
            return Err(Error::EmptyVocabulary(path.to_path_buf()));
        }
        Ok(vocab)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr.headers()?;
        Ok(Self::new(headers.iter().filter(|h| !h.is_empty())))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_define_order() {
        let csv = "[Pd],[Cu],CCN(CC)CC\n0,0,0\n";
        let vocab = LabelVocabulary::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("[Pd]"), Some(0));
        assert_eq!(vocab.index_of("CCN(CC)CC"), Some(2));
        assert_eq!(vocab.index_of("UNKNOWN_LABEL"), None);
        assert_eq!(vocab.label(1), Some("[Cu]"));
    }

    #[test]
    fn test_header_only_file() {
        let vocab = LabelVocabulary::from_reader("O,CO,CCO\n".as_bytes()).unwrap();
        assert_eq!(vocab.len(), 3);
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let vocab = LabelVocabulary::new(["O", "CO", "O"]);
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.index_of("O"), Some(0));
    }

    #[test]
    fn test_load_missing_file() {
        let err = LabelVocabulary::load(Path::new("/nonexistent/all_cat_withN.csv")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
