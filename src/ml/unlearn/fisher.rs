// ============================================================
// Layer 5 — Fisher-Information Unlearning
// ============================================================
// Diagonal empirical Fisher: for every parameter, the sample-weighted
// mean over batches of the squared cross-entropy gradient.
//
//   fisher       θ += √(α · min(1 / (F_r + ε), 1e3)) · N(0, 1)
//   fisher_new   θ += √(α · min(F_f / (F_r + ε), 1e3)) · N(0, 1)
//   wfisher      θ += α · g_f / (F_r + λ)
//
// F_r, F_f are the retain and forget Fisher diagonals, g_f the mean
// forget gradient. Parameters that are rarely used on retain receive
// the largest perturbation; wfisher instead takes one diagonal Newton
// step that undoes the forget set's contribution.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoader,
    module::{ModuleMapper, ModuleVisitor, ParamId},
    nn::loss::CrossEntropyLoss,
    optim::GradientsParams,
    prelude::*,
    tensor::{backend::AutodiffBackend, Distribution},
};
use std::collections::HashMap;

use super::{UnlearnMethod, UnlearnSettings};
use crate::data::loaders::{BatchLoader, SplitLoaders};
use crate::domain::result::Split;
use crate::ml::model::TextClassifier;

const EPS: f64 = 1e-8;
const NEWTON_DAMPING: f64 = 1e-3;
const MAX_INVERSE: f64 = 1e3;

/// Flattened per-parameter tensors on the inner backend.
pub type ParamMap<B> = HashMap<ParamId, Tensor<B, 1>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FisherVariant {
    /// `fisher`: noise scaled by inverse retain Fisher
    Retain,
    /// `fisher_new`: noise scaled by forget/retain Fisher ratio
    ForgetRatio,
    /// `wfisher`: Newton step along the forget gradient
    Newton,
}

pub struct Fisher {
    pub variant: FisherVariant,
}

impl Fisher {
    fn label(&self) -> &'static str {
        match self.variant {
            FisherVariant::Retain      => "fisher",
            FisherVariant::ForgetRatio => "fisher_new",
            FisherVariant::Newton      => "wfisher",
        }
    }
}

impl<B: AutodiffBackend> UnlearnMethod<B> for Fisher {
    fn name(&self) -> &'static str {
        self.label()
    }

    fn unlearn(
        &self,
        loaders:   &SplitLoaders<B>,
        model:     TextClassifier<B>,
        criterion: &CrossEntropyLoss<B>,
        settings:  &UnlearnSettings,
    ) -> Result<TextClassifier<B>> {
        let retain = gradient_moments(&model, &loaders.train(Split::Retain), criterion, Moment::Square);
        tracing::info!(method = self.label(), params = retain.len(), "Retain Fisher diagonal computed");

        let deltas = match self.variant {
            FisherVariant::Retain => {
                B::InnerBackend::seed(settings.seed);
                retain
                    .into_iter()
                    .map(|(id, f_r)| {
                        let var = f_r.add_scalar(EPS).recip().clamp_max(MAX_INVERSE).mul_scalar(settings.alpha);
                        (id, gaussian(var))
                    })
                    .collect()
            }
            FisherVariant::ForgetRatio => {
                let mut forget = gradient_moments(&model, &loaders.train(Split::Forget), criterion, Moment::Square);
                B::InnerBackend::seed(settings.seed);
                retain
                    .into_iter()
                    .filter_map(|(id, f_r)| {
                        let f_f = forget.remove(&id)?;
                        let var = f_f.div(f_r.add_scalar(EPS)).clamp_max(MAX_INVERSE).mul_scalar(settings.alpha);
                        Some((id, gaussian(var)))
                    })
                    .collect()
            }
            FisherVariant::Newton => {
                let mut forget = gradient_moments(&model, &loaders.train(Split::Forget), criterion, Moment::Mean);
                retain
                    .into_iter()
                    .filter_map(|(id, f_r)| {
                        let g_f = forget.remove(&id)?;
                        let step = g_f.div(f_r.add_scalar(NEWTON_DAMPING)).mul_scalar(settings.alpha);
                        Some((id, step))
                    })
                    .collect()
            }
        };

        Ok(model.map(&mut Perturb::<B> { deltas }))
    }
}

fn gaussian<B: Backend>(variance: Tensor<B, 1>) -> Tensor<B, 1> {
    let noise = Tensor::random(variance.dims(), Distribution::Normal(0.0, 1.0), &variance.device());
    variance.sqrt() * noise
}

// ─── Gradient statistics ──────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    /// E[g]
    Mean,
    /// E[g²], the empirical Fisher diagonal
    Square,
}

struct Accumulate<'a, B: AutodiffBackend> {
    grads:  &'a GradientsParams,
    weight: f64,
    moment: Moment,
    acc:    &'a mut ParamMap<B::InnerBackend>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Accumulate<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        let Some(grad) = self.grads.get::<B::InnerBackend, D>(id.clone()) else {
            return;
        };
        let n = grad.shape().num_elements();
        let value = match self.moment {
            Moment::Mean   => grad,
            Moment::Square => grad.clone() * grad,
        };
        let value = value.mul_scalar(self.weight).reshape([n]);
        let next = match self.acc.remove(&id) {
            Some(prev) => prev + value,
            None       => value,
        };
        self.acc.insert(id, next);
    }
}

/// Sample-weighted mean over `loader` of the per-batch gradient
/// (or squared gradient) of cross-entropy, keyed by parameter.
/// An empty loader yields an empty map.
pub fn gradient_moments<B: AutodiffBackend>(
    model:     &TextClassifier<B>,
    loader:    &BatchLoader<B>,
    criterion: &CrossEntropyLoss<B>,
    moment:    Moment,
) -> ParamMap<B::InnerBackend> {
    let mut acc: ParamMap<B::InnerBackend> = HashMap::new();
    let mut total = 0usize;

    for batch in loader.iter() {
        let n = batch.size();
        let logits = model.forward(batch.input_ids, batch.attention_mask);
        let loss = criterion.forward(logits, batch.labels);
        let grads = GradientsParams::from_grads(loss.backward(), model);

        model.visit(&mut Accumulate::<B> { grads: &grads, weight: n as f64, moment, acc: &mut acc });
        total += n;
    }

    if total == 0 {
        return acc;
    }
    acc.into_iter().map(|(id, t)| (id, t.div_scalar(total as f64))).collect()
}

// ─── Parameter update ─────────────────────────────────────────────────────────
struct Perturb<B: AutodiffBackend> {
    deltas: ParamMap<B::InnerBackend>,
}

impl<B: AutodiffBackend> ModuleMapper<B> for Perturb<B> {
    fn map_float<const D: usize>(&mut self, id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        let Some(delta) = self.deltas.remove(&id) else {
            return tensor;
        };
        let dims = tensor.dims();
        let updated = tensor.inner() + delta.reshape(dims);
        Tensor::from_inner(updated).require_grad()
    }
}
