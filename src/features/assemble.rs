//! Dataset assembly: records → labeled fingerprint vectors.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::recipe::InputRecipe;
use super::target::Target;
use super::vocabulary::LabelVocabulary;
use crate::fingerprint::{
    condition_fingerprint, reaction_fingerprint, ExtractionError, Fingerprinter,
};
use crate::ReactionRecord;

/// One training example: concatenated fingerprints plus template and label.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledExample {
    pub input: Vec<i8>,
    pub template: usize,
    pub label: usize,
}

/// Why a record did not make it into the dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    UnknownLabel(Option<String>),
    Extraction(ExtractionError),
}

/// Row accounting for one assembly pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub total: usize,
    pub kept: usize,
    pub unknown_label: usize,
    pub failed_extraction: usize,
}

#[derive(Debug, Clone)]
pub struct AssembledDataset {
    pub examples: Vec<AssembledExample>,
    /// Width of every `input` vector.
    pub input_width: usize,
    pub vocabulary_size: usize,
    /// Largest template id among kept examples, plus one.
    pub template_space: usize,
    pub report: AssemblyReport,
}

impl AssembledDataset {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Build the labeled dataset for `target` under `recipe`.
///
/// Records run through the fingerprinter in parallel; each task carries its
/// source index so the dataset keeps table order. Records whose label is not
/// in `vocabulary`, or whose reaction cannot be fingerprinted, are skipped.
/// Condition blocks that fail to parse are zero-filled instead.
pub fn assemble<F: Fingerprinter + ?Sized>(
    records: &[ReactionRecord],
    target: Target,
    recipe: &InputRecipe,
    vocabulary: &LabelVocabulary,
    fingerprinter: &F,
) -> AssembledDataset {
    let mut outcomes: Vec<(usize, Result<AssembledExample, SkipReason>)> = records
        .par_iter()
        .enumerate()
        .map(|(index, record)| {
            (
                index,
                assemble_record(record, target, recipe, vocabulary, fingerprinter),
            )
        })
        .collect();
    outcomes.sort_unstable_by_key(|(index, _)| *index);

    let mut report = AssemblyReport {
        total: records.len(),
        ..Default::default()
    };
    let mut examples = Vec::with_capacity(records.len());
    let mut max_template = 0usize;

    for (index, outcome) in outcomes {
        match outcome {
            Ok(example) => {
                max_template = max_template.max(example.template);
                examples.push(example);
            }
            Err(SkipReason::UnknownLabel(label)) => {
                debug!("row {index}: label {label:?} not in vocabulary, skipped");
                report.unknown_label += 1;
            }
            Err(SkipReason::Extraction(e)) => {
                warn!("row {index}: {e}, skipped");
                report.failed_extraction += 1;
            }
        }
    }
    report.kept = examples.len();

    let dataset = AssembledDataset {
        examples,
        input_width: recipe.block_count() * fingerprinter.width(),
        vocabulary_size: vocabulary.len(),
        template_space: max_template + 1,
        report,
    };

    info!(
        "n {}: {} | n template: {} | input width: {} | kept {}/{} ({} unknown label, {} failed)",
        target,
        dataset.vocabulary_size,
        dataset.template_space,
        dataset.input_width,
        report.kept,
        report.total,
        report.unknown_label,
        report.failed_extraction
    );

    dataset
}

fn assemble_record<F: Fingerprinter + ?Sized>(
    record: &ReactionRecord,
    target: Target,
    recipe: &InputRecipe,
    vocabulary: &LabelVocabulary,
    fingerprinter: &F,
) -> Result<AssembledExample, SkipReason> {
    let label = target.label(record);
    let label_index = label
        .and_then(|l| vocabulary.index_of(l))
        .ok_or_else(|| SkipReason::UnknownLabel(label.map(str::to_string)))?;

    let rxn = reaction_fingerprint(fingerprinter, &record.reactants, &record.products)
        .map_err(SkipReason::Extraction)?;

    let mut input = Vec::with_capacity(recipe.block_count() * fingerprinter.width());
    input.extend_from_slice(rxn.reactant.as_slice());
    input.extend_from_slice(rxn.product.as_slice());

    for component in recipe.components() {
        match component.condition_column() {
            None => input.extend_from_slice(rxn.difference.as_slice()),
            Some(column) => {
                let fp = condition_fingerprint(fingerprinter, record.condition(column));
                input.extend_from_slice(fp.as_slice());
            }
        }
    }

    Ok(AssembledExample {
        input,
        template: record.template,
        label: label_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::recipe::Component;
    use crate::fingerprint::{Fingerprint, MorganFingerprinter, FINGERPRINT_BITS};

    fn record(reactants: &str, products: &str, template: usize, cat: &str) -> ReactionRecord {
        ReactionRecord {
            reactants: reactants.to_string(),
            products: products.to_string(),
            template,
            cat: Some(cat.to_string()),
            solv: Some("ClCCl".to_string()),
            ..Default::default()
        }
    }

    fn records() -> Vec<ReactionRecord> {
        vec![
            record("CC(=O)O.OCC", "CC(=O)OCC", 0, "[Pd]"),
            record("c1ccccc1Br.OB(O)c1ccccc1", "c1ccc(-c2ccccc2)cc1", 4, "[Cu]"),
            record("CCN.CC(=O)Cl", "CCNC(C)=O", 2, "[Pd]"),
        ]
    }

    fn vocabulary() -> LabelVocabulary {
        LabelVocabulary::new(["[Pd]", "[Cu]", "[Ni]"])
    }

    #[test]
    fn test_three_valid_records() {
        let fp = MorganFingerprinter::default();
        let recipe = InputRecipe::default();
        let data = assemble(&records(), Target::Catalyst, &recipe, &vocabulary(), &fp);
        assert_eq!(data.len(), 3);
        assert_eq!(data.vocabulary_size, 3);
        assert_eq!(data.template_space, 5);
        assert_eq!(data.input_width, 1024);
        assert_eq!(
            data.examples.iter().map(|e| e.label).collect::<Vec<_>>(),
            vec![0, 1, 0]
        );
        assert!(data.examples.iter().all(|e| e.input.len() == 1024));
    }

    #[test]
    fn test_unknown_label_is_excluded() {
        let fp = MorganFingerprinter::default();
        let recipe = InputRecipe::default();
        let baseline = assemble(&records(), Target::Catalyst, &recipe, &vocabulary(), &fp);

        let mut rows = records();
        rows[1].cat = Some("UNKNOWN_LABEL".to_string());
        let data = assemble(&rows, Target::Catalyst, &recipe, &vocabulary(), &fp);
        assert_eq!(data.len(), baseline.len() - 1);
        assert_eq!(data.report.unknown_label, 1);
        // template 4 only appeared on the dropped row
        assert_eq!(data.template_space, 3);

        rows[0].cat = None;
        let data = assemble(&rows, Target::Catalyst, &recipe, &vocabulary(), &fp);
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_reaction_failure_is_excluded() {
        let fp = MorganFingerprinter::default();
        let mut rows = records();
        rows[2].reactants = "CCN.CC(=O".to_string();
        let data = assemble(&rows, Target::Catalyst, &InputRecipe::default(), &vocabulary(), &fp);
        assert_eq!(data.len(), 2);
        assert_eq!(data.report.failed_extraction, 1);
        assert_eq!(data.report.total, 3);
    }

    #[test]
    fn test_recipe_blocks_in_fixed_order() {
        let fp = MorganFingerprinter::default();
        let recipe: InputRecipe = "solv+rxnfp+cat".parse().unwrap();
        let rows = records();
        let data = assemble(&rows, Target::Catalyst, &recipe, &vocabulary(), &fp);
        assert_eq!(data.input_width, 5 * FINGERPRINT_BITS);

        let input = &data.examples[0].input;
        assert_eq!(input.len(), 5 * FINGERPRINT_BITS);

        let rxn = reaction_fingerprint(&fp, &rows[0].reactants, &rows[0].products).unwrap();
        let block = |i: usize| &input[i * FINGERPRINT_BITS..(i + 1) * FINGERPRINT_BITS];
        assert_eq!(block(0), rxn.reactant.as_slice());
        assert_eq!(block(1), rxn.product.as_slice());
        assert_eq!(block(2), rxn.difference.as_slice());
        assert_eq!(block(3), fp.fingerprint("[Pd]").unwrap().as_slice());
        assert_eq!(block(4), fp.fingerprint("ClCCl").unwrap().as_slice());
    }

    #[test]
    fn test_bad_condition_is_zero_filled() {
        let fp = MorganFingerprinter::default();
        let recipe = InputRecipe::new(&[Component::Solvent]);
        let mut rows = records();
        rows[0].solv = Some("C1CC(".to_string());
        let data = assemble(&rows, Target::Catalyst, &recipe, &vocabulary(), &fp);
        assert_eq!(data.len(), 3);
        let solvent_block = &data.examples[0].input[2 * FINGERPRINT_BITS..];
        assert_eq!(solvent_block, Fingerprint::zeros(FINGERPRINT_BITS).as_slice());
    }

    #[test]
    fn test_empty_input() {
        let fp = MorganFingerprinter::default();
        let data = assemble(&[], Target::Solvent, &InputRecipe::default(), &vocabulary(), &fp);
        assert!(data.is_empty());
        assert_eq!(data.template_space, 1);
    }
}
