// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Every piece of tensor code lives in this layer or in the
// batcher/loaders of Layer 4. Everything is generic over the
// Burn backend so tests run on NdArray while the binary runs
// on Wgpu.
//
//   model.rs      — transformer encoder + linear classifier head
//   meter.rs      — running weighted average
//   evaluator.rs  — inference-mode accuracy pass
//   trainer.rs    — shared gradient-step loop and fine-tuning
//   unlearn/      — the unlearning method registry
//   svm.rs        — RBF SVC used as the attack model
//   mia.rs        — membership inference attack on the forget set
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Transformer text classifier architecture
pub mod model;

pub mod meter;

/// Accuracy evaluation over one split
pub mod evaluator;

/// Training loop shared by finetune and gradient-based unlearning
pub mod trainer;

/// Unlearning procedures and their registry
pub mod unlearn;

pub mod svm;

/// Shadow-model membership inference attack
pub mod mia;

#[cfg(test)]
pub mod testing;
