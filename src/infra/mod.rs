// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting persistence that doesn't belong in
// any specific business layer:
//
//   checkpoint.rs      — Pretrained and unlearned weights via
//                        Burn's CompactRecorder, the model
//                        config, and the per-experiment
//                        evaluation_result.json.
//
//   tokenizer_store.rs — Tokenizer persistence. Builds a
//                        word-level tokenizer from the corpus
//                        on first use and reloads it later so
//                        every run encodes identically.
//
//   metrics.rs         — results.csv, one row per finished
//                        experiment.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint and evaluation result storage
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Experiment results CSV logger
pub mod metrics;
