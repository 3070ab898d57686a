//! Epoch/batch loop with windowed loss logging and bounded validation.

use tracing::{debug, info};

use super::loss::{build_optimizer, LossFunction};
use super::model::ConditionModel;
use super::{LossPoint, LossWindow, TrainHistory, TrainPhase, TrainSettings};
use crate::dataset::DataLoader;
use crate::error::{Error, Result};
use crate::evaluate::{topk_accuracy, Coverage};

pub struct Trainer<'a, L: LossFunction + ?Sized> {
    settings: TrainSettings,
    loss_fn: &'a L,
    phase: TrainPhase,
}

impl<'a, L: LossFunction + ?Sized> Trainer<'a, L> {
    pub fn new(settings: TrainSettings, loss_fn: &'a L) -> Self {
        Trainer {
            settings,
            loss_fn,
            phase: TrainPhase::Idle,
        }
    }

    pub fn phase(&self) -> TrainPhase {
        self.phase
    }

    /// Train for `settings.epochs` epochs, validating on the first
    /// `settings.validation_batches` test batches after each one.
    ///
    /// A non-finite loss stops the run with [`Error::Divergence`].
    pub fn fit(
        &mut self,
        model: &ConditionModel,
        train: &mut DataLoader,
        test: &mut DataLoader,
    ) -> Result<TrainHistory> {
        let mut opt = build_optimizer(
            self.settings.optimizer,
            model.var_store(),
            self.settings.learning_rate,
        )?;
        let mut window = LossWindow::new(self.settings.log_every);
        let mut history = TrainHistory::default();

        info!(
            "Training {} epochs over {} batches",
            self.settings.epochs,
            train.num_batches()
        );

        for epoch in 0..self.settings.epochs {
            self.phase = TrainPhase::Epoch(epoch);
            window.reset();

            for (step, batch) in train.batches().enumerate() {
                self.phase = TrainPhase::Batch { epoch, step };

                opt.zero_grad();
                let logits = model.forward_t(&batch, true)?;
                let loss = self.loss_fn.loss(&logits, &model.label_tensor(&batch));
                let value = f64::try_from(&loss)?;
                if !value.is_finite() {
                    self.phase = TrainPhase::Idle;
                    return Err(Error::Divergence {
                        epoch: epoch + 1,
                        step: step + 1,
                        loss: value,
                    });
                }
                loss.backward();
                opt.step();

                if let Some(average) = window.record(step, value) {
                    info!("{} loss: {:.3}", self.phase, average);
                    history.losses.push(LossPoint {
                        epoch,
                        step,
                        loss: average,
                    });
                }
            }

            let acc = topk_accuracy(
                model,
                test,
                1,
                Coverage::FirstBatches(self.settings.validation_batches),
            )?;
            info!("Accuracy on test set: {:.4}", acc);
            history.validation.push(acc);
            debug!("{} done", TrainPhase::Epoch(epoch));
        }

        self.phase = TrainPhase::Idle;
        Ok(history)
    }
}
