// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the experiment state machine and the
// layers that do the actual work:
//
//   CorpusSource    → CorpusLoader reads TextGCN-style files
//   ExperimentSteps → BurnExperiment runs the real model;
//                     tests plug in a recording fake
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::corpus::Corpus;
use crate::domain::result::{Checkpoint, EvaluationResult, MiaResult, Split};

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can produce a labelled, masked corpus.
pub trait CorpusSource {
    fn load(&self) -> Result<Corpus>;
}

// ─── ExperimentSteps ──────────────────────────────────────────────────────────
/// The individual steps the orchestrator sequences.
///
/// Only `unlearn` may change the model. `accuracy` and
/// `membership_attack` are read-only passes.
pub trait ExperimentSteps {
    /// Load a previously persisted checkpoint, if any, making its
    /// weights the current model.
    fn restore(&mut self) -> Result<Option<Checkpoint>>;

    /// Run the configured unlearning procedure on the current model.
    fn unlearn(&mut self) -> Result<()>;

    /// Top-1 accuracy of the current model on `split`, in [0, 1].
    fn accuracy(&mut self, split: Split) -> Result<f64>;

    /// Shadow-model attack against the forget set.
    fn membership_attack(&mut self) -> Result<MiaResult>;

    /// Overwrite the persisted checkpoint with the current model
    /// and `result` (None clears any stored result).
    fn persist(&mut self, result: Option<&EvaluationResult>) -> Result<()>;
}
