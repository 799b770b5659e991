// ============================================================
// Layer 2 — ReportUseCase
// ============================================================
// Reads the stored evaluation result of one experiment without
// loading any model or data.

use anyhow::{bail, Result};

use crate::domain::result::EvaluationResult;
use crate::infra::checkpoint::CheckpointManager;

pub struct ReportUseCase {
    store:        CheckpointManager,
    method:       String,
    forget_ratio: f64,
}

impl ReportUseCase {
    pub fn new(
        checkpoint_dir: &str,
        model_id:       &str,
        dataset:        &str,
        method:         impl Into<String>,
        forget_ratio:   f64,
    ) -> Self {
        Self {
            store: CheckpointManager::new(checkpoint_dir, model_id, dataset),
            method: method.into(),
            forget_ratio,
        }
    }

    pub fn execute(&self) -> Result<EvaluationResult> {
        match self.store.load_result(&self.method, self.forget_ratio)? {
            Some(result) => Ok(result),
            None => bail!(
                "No evaluation result stored at '{}'",
                self.store.unlearn_dir(&self.method, self.forget_ratio).display()
            ),
        }
    }
}
