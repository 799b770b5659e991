// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Gradient-step machinery shared by the finetune command and the
// gradient-based unlearning methods.
//
// Key Burn insight:
//   - Training uses an AutodiffBackend for gradients
//   - model.valid() returns the model on the inner backend
//   - Validation loaders must also produce inner-backend batches
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::ClassifyBatch;
use crate::data::loaders::{BatchLoader, SplitLoaders};
use crate::domain::result::Split;
use crate::ml::evaluator::evaluate;
use crate::ml::meter::Meter;
use crate::ml::model::TextClassifier;

/// One pass over `loader`: for every batch compute `objective`,
/// backpropagate and step the optimiser. Returns the updated
/// model and the sample-weighted average objective.
pub fn run_epoch<B, O, F>(
    mut model: TextClassifier<B>,
    optim:     &mut O,
    loader:    &BatchLoader<B>,
    lr:        f64,
    mut objective: F,
) -> (TextClassifier<B>, f64)
where
    B: AutodiffBackend,
    O: Optimizer<TextClassifier<B>, B>,
    F: FnMut(&TextClassifier<B>, ClassifyBatch<B>) -> Tensor<B, 1>,
{
    let mut losses = Meter::new();

    for batch in loader.iter() {
        let n = batch.size();
        let loss = objective(&model, batch);
        losses.update(loss.clone().into_scalar().elem::<f64>(), n);

        // Backward pass + optimiser update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(lr, model, grads);
    }

    (model, losses.average())
}

/// Plain cross-entropy on the batch's own labels.
pub fn cross_entropy<B: Backend>(model: &TextClassifier<B>, batch: ClassifyBatch<B>) -> Tensor<B, 1> {
    let logits = model.forward(batch.input_ids, batch.attention_mask);
    let ce = CrossEntropyLossConfig::new().init(&logits.device());
    ce.forward(logits, batch.labels)
}

/// Train on the full train region (retain and forget) and report
/// validation accuracy after every epoch. Produces the fine-tuned
/// model that non-`retrain` unlearning methods start from.
pub fn finetune<B: AutodiffBackend>(
    mut model:  TextClassifier<B>,
    loaders:    &SplitLoaders<B>,
    epochs:     usize,
    lr:         f64,
    print_freq: usize,
) -> TextClassifier<B> {
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init::<B, TextClassifier<B>>();
    let criterion = CrossEntropyLossConfig::new().init(loaders.device());

    for epoch in 1..=epochs {
        let mut train_loss = Meter::new();
        for split in [Split::Retain, Split::Forget] {
            let (next, loss) = run_epoch(model, &mut optim, &loaders.train(split), lr, cross_entropy);
            model = next;
            train_loss.update(loss, loaders.dataset(split).sample_count());
        }

        let val_acc = evaluate(&loaders.eval(Split::Val), &model.valid(), &criterion, print_freq);
        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_acc={:.1}%",
            epoch, epochs, train_loss.average(), val_acc * 100.0,
        );
    }

    tracing::info!("Fine-tuning complete");
    model
}
