// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs a model over a loader in inference mode and returns the
// average top-1 accuracy in [0, 1].
//
// Callers pass `model.valid()`: the inner (non-autodiff) backend
// records no gradients and the model is only read.
//
// Prints one progress line every `print_freq` batches and a final
// accuracy line; an empty loader evaluates to 0.

use burn::{
    data::dataloader::{DataLoader, DataLoaderIterator},
    nn::loss::CrossEntropyLoss,
    prelude::*,
};

use crate::data::loaders::BatchLoader;
use crate::ml::meter::Meter;
use crate::ml::model::TextClassifier;

pub fn evaluate<B: Backend>(
    loader:     &BatchLoader<B>,
    model:      &TextClassifier<B>,
    criterion:  &CrossEntropyLoss<B>,
    print_freq: usize,
) -> f64 {
    let mut losses = Meter::new();
    let mut top1   = Meter::new();

    let mut iterator = loader.iter();
    let mut i = 0usize;
    while let Some(batch) = iterator.next() {
        let n = batch.size();
        let logits = model.forward(batch.input_ids, batch.attention_mask);
        let loss = criterion
            .forward(logits.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();

        losses.update(loss, n);
        top1.update(accuracy(logits, batch.labels), n);

        if print_freq > 0 && i % print_freq == 0 {
            let progress = iterator.progress();
            println!(
                "Test: [{}] ({}/{})\tLoss {:.4} ({:.4})\tAccuracy {:.3} ({:.3})",
                i,
                progress.items_processed,
                progress.items_total,
                losses.latest(),
                losses.average(),
                top1.latest(),
                top1.average(),
            );
        }
        i += 1;
    }

    println!("valid_accuracy {:.3}", top1.average());
    top1.average()
}

/// Fraction of rows whose arg-max logit equals the label.
pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f64 {
    let n = labels.dims()[0];
    if n == 0 {
        return 0.0;
    }
    // argmax(1) returns [batch, 1] — flatten to [batch] before comparing
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted.equal(labels).int().sum().into_scalar().elem::<i64>();
    correct as f64 / n as f64
}
