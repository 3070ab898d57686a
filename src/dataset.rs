//! Train/test splitting and batched iteration.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::features::AssembledExample;

/// Fraction of examples held out for testing.
pub const TEST_FRACTION: f64 = 0.1;

/// Seeded RNG when a seed is given, entropy-seeded otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Number of training examples for `n` examples: `round((1 - test_fraction) * n)`.
pub fn train_size(n: usize, test_fraction: f64) -> usize {
    (((1.0 - test_fraction) * n as f64).round() as usize).min(n)
}

/// Randomly partition examples into `(train, test)`.
///
/// Membership depends on `rng`; the sizes depend only on `n`.
pub fn train_test_split<R: Rng + ?Sized>(
    mut examples: Vec<AssembledExample>,
    test_fraction: f64,
    rng: &mut R,
) -> (Vec<AssembledExample>, Vec<AssembledExample>) {
    examples.shuffle(rng);
    let split = train_size(examples.len(), test_fraction);
    let test = examples.split_off(split);
    (examples, test)
}

/// Expand a template id into a one-hot vector of length `template_space`.
///
/// # Panics
///
/// If `template >= template_space`.
pub fn one_hot_template(template: usize, template_space: usize) -> Vec<f32> {
    let mut encoded = vec![0.0; template_space];
    encoded[template] = 1.0;
    encoded
}

/// Row-wise [`one_hot_template`] for a batch of template ids.
///
/// # Panics
///
/// If any id is `>= template_space`.
pub fn one_hot_templates(templates: &[usize], template_space: usize) -> Array2<f32> {
    let mut encoded = Array2::zeros((templates.len(), template_space));
    for (row, &template) in templates.iter().enumerate() {
        encoded[[row, template]] = 1.0;
    }
    encoded
}

/// A batch of examples ready for a model.
#[derive(Debug, Clone)]
pub struct Batch {
    /// `[batch, input_width]`
    pub inputs: Array2<f32>,
    pub templates: Vec<usize>,
    pub labels: Vec<usize>,
}

impl Batch {
    pub fn from_examples(examples: &[&AssembledExample]) -> Self {
        let width = examples.first().map_or(0, |e| e.input.len());
        let mut inputs = Array2::zeros((examples.len(), width));
        for (mut row, example) in inputs.rows_mut().into_iter().zip(examples) {
            for (dst, &src) in row.iter_mut().zip(&example.input) {
                *dst = f32::from(src);
            }
        }
        Batch {
            inputs,
            templates: examples.iter().map(|e| e.template).collect(),
            labels: examples.iter().map(|e| e.label).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// When a loader reorders its examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shuffle {
    /// Reshuffle at the start of every pass (training).
    EveryPass,
    /// Shuffle once on construction, then keep that order (testing).
    Once,
}

/// Batched iteration over one partition.
pub struct DataLoader {
    examples: Vec<AssembledExample>,
    batch_size: usize,
    shuffle: Shuffle,
    order: Vec<usize>,
    rng: StdRng,
}

impl DataLoader {
    pub fn new(
        examples: Vec<AssembledExample>,
        batch_size: usize,
        shuffle: Shuffle,
        mut rng: StdRng,
    ) -> Self {
        let mut order: Vec<usize> = (0..examples.len()).collect();
        order.shuffle(&mut rng);
        DataLoader {
            examples,
            batch_size: batch_size.max(1),
            shuffle,
            order,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_batches(&self) -> usize {
        self.examples.len().div_ceil(self.batch_size)
    }

    /// Start a pass over the partition.
    pub fn batches(&mut self) -> Batches<'_> {
        if self.shuffle == Shuffle::EveryPass {
            self.order.shuffle(&mut self.rng);
        }
        Batches {
            examples: &self.examples,
            order: &self.order,
            batch_size: self.batch_size,
            next: 0,
        }
    }
}

pub struct Batches<'a> {
    examples: &'a [AssembledExample],
    order: &'a [usize],
    batch_size: usize,
    next: usize,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.next >= self.order.len() {
            return None;
        }
        let end = (self.next + self.batch_size).min(self.order.len());
        let rows: Vec<&AssembledExample> = self.order[self.next..end]
            .iter()
            .map(|&i| &self.examples[i])
            .collect();
        self.next = end;
        Some(Batch::from_examples(&rows))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.next).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}
