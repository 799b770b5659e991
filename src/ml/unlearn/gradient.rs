// ============================================================
// Layer 5 — Gradient-Based Unlearning
// ============================================================
// FT / FT_l1   descend cross-entropy on retain; the L1 variant adds
//              alpha·(1 − e/E)·‖θ‖₁ which decays linearly to zero
// GA / GA_l1   ascend cross-entropy on forget (descend its negative)
// RL           descend cross-entropy on forget with uniformly random
//              labels, then on retain with true labels
// retrain      fresh initialisation trained on retain only
//
// All of them reuse `run_epoch` with a method-specific objective.

use anyhow::Result;
use burn::{
    module::{ModuleVisitor, ParamId},
    nn::loss::CrossEntropyLoss,
    optim::AdamConfig,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{UnlearnMethod, UnlearnSettings};
use crate::data::batcher::ClassifyBatch;
use crate::data::loaders::SplitLoaders;
use crate::domain::result::Split;
use crate::ml::model::TextClassifier;
use crate::ml::trainer::run_epoch;

// ─── L1 penalty ───────────────────────────────────────────────────────────────
struct L1Norm<B: Backend> {
    total: Option<Tensor<B, 1>>,
}

impl<B: Backend> ModuleVisitor<B> for L1Norm<B> {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        let norm = tensor.clone().abs().sum();
        self.total = Some(match self.total.take() {
            Some(total) => total + norm,
            None        => norm,
        });
    }
}

/// Sum of absolute values over every float parameter.
pub fn l1_norm<B: Backend>(model: &TextClassifier<B>, device: &B::Device) -> Tensor<B, 1> {
    let mut visitor = L1Norm { total: None };
    model.visit(&mut visitor);
    visitor.total.unwrap_or_else(|| Tensor::zeros([1], device))
}

/// L1 weight for epoch `epoch` (0-based) of `epochs`.
pub fn l1_schedule(alpha: f64, epoch: usize, epochs: usize) -> f64 {
    if epochs == 0 {
        return 0.0;
    }
    alpha * (1.0 - epoch as f64 / epochs as f64)
}

fn ce<B: Backend>(criterion: &CrossEntropyLoss<B>, model: &TextClassifier<B>, batch: ClassifyBatch<B>) -> Tensor<B, 1> {
    let logits = model.forward(batch.input_ids, batch.attention_mask);
    criterion.forward(logits, batch.labels)
}

fn with_l1<B: Backend>(loss: Tensor<B, 1>, model: &TextClassifier<B>, weight: f64) -> Tensor<B, 1> {
    if weight == 0.0 {
        return loss;
    }
    let device = loss.device();
    loss + l1_norm(model, &device).mul_scalar(weight)
}

// ─── FT / FT_l1 ───────────────────────────────────────────────────────────────
pub struct FineTune {
    pub l1: bool,
}

impl FineTune {
    fn label(&self) -> &'static str {
        if self.l1 { "FT_l1" } else { "FT" }
    }
}

impl<B: AutodiffBackend> UnlearnMethod<B> for FineTune {
    fn name(&self) -> &'static str {
        self.label()
    }

    fn unlearn(
        &self,
        loaders:   &SplitLoaders<B>,
        mut model: TextClassifier<B>,
        criterion: &CrossEntropyLoss<B>,
        settings:  &UnlearnSettings,
    ) -> Result<TextClassifier<B>> {
        let mut optim = AdamConfig::new().init::<B, TextClassifier<B>>();
        for epoch in 0..settings.epochs {
            let weight = if self.l1 { l1_schedule(settings.alpha, epoch, settings.epochs) } else { 0.0 };
            let (next, loss) = run_epoch(model, &mut optim, &loaders.train(Split::Retain), settings.lr, |m, b| {
                with_l1(ce(criterion, m, b), m, weight)
            });
            model = next;
            tracing::info!(method = self.label(), epoch, loss, "Unlearning epoch");
        }
        Ok(model)
    }
}

// ─── GA / GA_l1 ───────────────────────────────────────────────────────────────
pub struct GradientAscent {
    pub l1: bool,
}

impl GradientAscent {
    fn label(&self) -> &'static str {
        if self.l1 { "GA_l1" } else { "GA" }
    }
}

impl<B: AutodiffBackend> UnlearnMethod<B> for GradientAscent {
    fn name(&self) -> &'static str {
        self.label()
    }

    fn unlearn(
        &self,
        loaders:   &SplitLoaders<B>,
        mut model: TextClassifier<B>,
        criterion: &CrossEntropyLoss<B>,
        settings:  &UnlearnSettings,
    ) -> Result<TextClassifier<B>> {
        let mut optim = AdamConfig::new().init::<B, TextClassifier<B>>();
        for epoch in 0..settings.epochs {
            let weight = if self.l1 { l1_schedule(settings.alpha, epoch, settings.epochs) } else { 0.0 };
            let (next, loss) = run_epoch(model, &mut optim, &loaders.train(Split::Forget), settings.lr, |m, b| {
                with_l1(ce(criterion, m, b).neg(), m, weight)
            });
            model = next;
            tracing::info!(method = self.label(), epoch, loss, "Unlearning epoch");
        }
        Ok(model)
    }
}

// ─── RL ───────────────────────────────────────────────────────────────────────
pub struct RandomLabel;

impl<B: AutodiffBackend> UnlearnMethod<B> for RandomLabel {
    fn name(&self) -> &'static str {
        "RL"
    }

    fn unlearn(
        &self,
        loaders:   &SplitLoaders<B>,
        mut model: TextClassifier<B>,
        criterion: &CrossEntropyLoss<B>,
        settings:  &UnlearnSettings,
    ) -> Result<TextClassifier<B>> {
        let nb_class = settings.model.nb_class.max(1);
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let mut optim = AdamConfig::new().init::<B, TextClassifier<B>>();

        for epoch in 0..settings.epochs {
            let (next, forget_loss) = run_epoch(model, &mut optim, &loaders.train(Split::Forget), settings.lr, |m, b| {
                let n = b.size();
                let labels: Vec<i64> = (0..n).map(|_| rng.gen_range(0..nb_class) as i64).collect();
                let random = Tensor::<B, 1, Int>::from_data(TensorData::new(labels, [n]), &b.labels.device());
                criterion.forward(m.forward(b.input_ids, b.attention_mask), random)
            });
            let (next, retain_loss) = run_epoch(next, &mut optim, &loaders.train(Split::Retain), settings.lr, |m, b| {
                ce(criterion, m, b)
            });
            model = next;
            tracing::info!(method = "RL", epoch, forget_loss, retain_loss, "Unlearning epoch");
        }
        Ok(model)
    }
}

// ─── retrain ──────────────────────────────────────────────────────────────────
pub struct Retrain;

impl<B: AutodiffBackend> UnlearnMethod<B> for Retrain {
    fn name(&self) -> &'static str {
        "retrain"
    }

    fn needs_pretrained(&self) -> bool {
        false
    }

    fn unlearn(
        &self,
        loaders:   &SplitLoaders<B>,
        _model:    TextClassifier<B>,
        criterion: &CrossEntropyLoss<B>,
        settings:  &UnlearnSettings,
    ) -> Result<TextClassifier<B>> {
        B::seed(settings.seed);
        let mut model = settings.model.init::<B>(loaders.device());
        let mut optim = AdamConfig::new().init::<B, TextClassifier<B>>();
        for epoch in 0..settings.epochs {
            let (next, loss) = run_epoch(model, &mut optim, &loaders.train(Split::Retain), settings.lr, |m, b| {
                ce(criterion, m, b)
            });
            model = next;
            tracing::info!(method = "retrain", epoch, loss, "Unlearning epoch");
        }
        Ok(model)
    }
}
