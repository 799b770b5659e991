// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder
// (named MessagePack at half precision, type-checked against the
// architecture on load) and the evaluation result as JSON. Record
// file names carry the recorder's own extension.
//
// Layout under {checkpoint_dir}/{model_id}_{dataset}/:
//
//   encoder.mpk               ← fine-tuned encoder
//   classifier.mpk            ← fine-tuned classification head
//   model_config.json         ← architecture to rebuild the model
//   tokenizer.json            ← written by TokenizerStore
//   {method}_{forget_ratio}/
//     model.mpk               ← weights after unlearning
//     evaluation_result.json  ← present iff a result was saved
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, FileRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::HarnessError;
use crate::domain::result::{Checkpoint, EvaluationResult};
use crate::ml::model::{TextClassifier, TextClassifierConfig};

const RESULT_FILE: &str = "evaluation_result.json";
const CONFIG_FILE: &str = "model_config.json";

/// Path the recorder writes for the record stem `stem`.
fn record_file<B: Backend>(stem: &Path) -> PathBuf {
    stem.with_extension(<CompactRecorder as FileRecorder<B>>::file_extension())
}

/// File-backed store for one (model, dataset) pair.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(checkpoint_dir: impl AsRef<Path>, model_id: &str, dataset: &str) -> Self {
        Self { dir: checkpoint_dir.as_ref().join(format!("{model_id}_{dataset}")) }
    }

    /// Directory holding the pretrained weights, config and tokenizer.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn unlearn_dir(&self, method: &str, forget_ratio: f64) -> PathBuf {
        self.dir.join(format!("{method}_{forget_ratio}"))
    }

    // ─── Pretrained ───────────────────────────────────────────────────────────

    /// Store encoder and classifier records separately so either half
    /// can be swapped without touching the other.
    pub fn save_pretrained<B: Backend>(&self, model: &TextClassifier<B>) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let recorder = CompactRecorder::new();
        let encoder = self.dir.join("encoder");
        recorder
            .record(model.encoder.clone().into_record(), encoder.clone())
            .with_context(|| format!("Failed to save encoder to '{}'", encoder.display()))?;
        let classifier = self.dir.join("classifier");
        recorder
            .record(model.classifier.clone().into_record(), classifier.clone())
            .with_context(|| format!("Failed to save classifier to '{}'", classifier.display()))?;

        tracing::info!("Saved pretrained checkpoint to '{}'", self.dir.display());
        Ok(())
    }

    pub fn has_pretrained<B: Backend>(&self) -> bool {
        record_file::<B>(&self.dir.join("encoder")).exists()
            && record_file::<B>(&self.dir.join("classifier")).exists()
    }

    /// Load the fine-tuned weights into `model`. Fails with
    /// `MissingPretrained` when `finetune` has not been run.
    pub fn load_pretrained<B: Backend>(
        &self,
        model:  TextClassifier<B>,
        device: &B::Device,
    ) -> Result<TextClassifier<B>> {
        if !self.has_pretrained::<B>() {
            return Err(HarnessError::MissingPretrained { path: self.dir.clone() }.into());
        }
        let recorder = CompactRecorder::new();
        let encoder = recorder
            .load(self.dir.join("encoder"), device)
            .context("Cannot load pretrained encoder")?;
        let classifier = recorder
            .load(self.dir.join("classifier"), device)
            .context("Cannot load pretrained classifier")?;

        tracing::info!("Loaded pretrained checkpoint from '{}'", self.dir.display());
        Ok(TextClassifier {
            encoder:    model.encoder.load_record(encoder),
            classifier: model.classifier.load_record(classifier),
        })
    }

    pub fn save_model_config(&self, cfg: &TextClassifierConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn has_model_config(&self) -> bool {
        self.dir.join(CONFIG_FILE).exists()
    }

    pub fn load_model_config(&self) -> Result<TextClassifierConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read config from '{}'. Run 'finetune' first.", path.display())
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    // ─── Unlearn checkpoints ──────────────────────────────────────────────────

    /// Persist the unlearned model and, if given, the result so far.
    /// Saving with `None` removes any stale result file before the
    /// weights are written, so new weights never sit beside an old
    /// result.
    pub fn save_unlearn<B: Backend>(
        &self,
        method:       &str,
        forget_ratio: f64,
        model:        &TextClassifier<B>,
        result:       Option<&EvaluationResult>,
    ) -> Result<()> {
        let dir = self.unlearn_dir(method, forget_ratio);
        fs::create_dir_all(&dir).with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let result_path = dir.join(RESULT_FILE);
        if result.is_none() && result_path.exists() {
            fs::remove_file(&result_path)
                .with_context(|| format!("Cannot remove '{}'", result_path.display()))?;
        }

        CompactRecorder::new()
            .record(model.clone().into_record(), dir.join("model"))
            .with_context(|| format!("Failed to save checkpoint to '{}'", dir.display()))?;

        if let Some(r) = result {
            fs::write(&result_path, serde_json::to_string_pretty(r)?)
                .with_context(|| format!("Cannot write '{}'", result_path.display()))?;
        }

        tracing::debug!(dir = %dir.display(), with_result = result.is_some(), "Saved unlearn checkpoint");
        Ok(())
    }

    /// Restore a stored unlearn checkpoint into `model`, or `None` if
    /// there is none for this method and ratio.
    pub fn load_unlearn<B: Backend>(
        &self,
        method:       &str,
        forget_ratio: f64,
        model:        TextClassifier<B>,
        device:       &B::Device,
    ) -> Result<Option<(TextClassifier<B>, Checkpoint)>> {
        let dir = self.unlearn_dir(method, forget_ratio);
        if !record_file::<B>(&dir.join("model")).exists() {
            return Ok(None);
        }
        let record = CompactRecorder::new()
            .load(dir.join("model"), device)
            .with_context(|| format!("Cannot load checkpoint from '{}'", dir.display()))?;
        let result = self.load_result(method, forget_ratio)?;

        Ok(Some((model.load_record(record), Checkpoint { result })))
    }

    pub fn load_result(&self, method: &str, forget_ratio: f64) -> Result<Option<EvaluationResult>> {
        let path = self.unlearn_dir(method, forget_ratio).join(RESULT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let result = serde_json::from_str(&json)
            .with_context(|| format!("Malformed result file '{}'", path.display()))?;
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::{tiny_config, TestInner};

    fn weights(model: &TextClassifier<TestInner>) -> Vec<f32> {
        model.classifier.weight.val().into_data().convert::<f32>().to_vec().unwrap()
    }

    #[test]
    fn test_pretrained_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let store = CheckpointManager::new(tmp.path(), "tiny", "R8");
        let saved = tiny_config(3).init::<TestInner>(&device);

        store.save_pretrained(&saved).unwrap();
        let loaded = store.load_pretrained(tiny_config(3).init::<TestInner>(&device), &device).unwrap();

        assert_eq!(weights(&saved), weights(&loaded));
        assert!(store.has_pretrained::<TestInner>());
        assert!(tmp.path().join("tiny_R8").join("encoder.mpk").exists());
        assert!(tmp.path().join("tiny_R8").join("classifier.mpk").exists());
    }

    #[test]
    fn test_missing_pretrained_is_typed() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let store = CheckpointManager::new(tmp.path(), "tiny", "R8");

        let err = store.load_pretrained(tiny_config(3).init::<TestInner>(&device), &device).unwrap_err();
        assert!(matches!(err.downcast_ref::<HarnessError>(), Some(HarnessError::MissingPretrained { .. })));
    }

    #[test]
    fn test_model_config_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CheckpointManager::new(tmp.path(), "tiny", "R8");
        store.save_model_config(&tiny_config(5)).unwrap();
        let cfg = store.load_model_config().unwrap();
        assert_eq!(cfg.nb_class, 5);
        assert_eq!(cfg.d_model, 8);
    }

    #[test]
    fn test_unlearn_checkpoint_states() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let store = CheckpointManager::new(tmp.path(), "tiny", "R8");
        let fresh = || tiny_config(2).init::<TestInner>(&device);

        assert!(store.load_unlearn("GA", 0.1, fresh(), &device).unwrap().is_none());

        let model = fresh();
        let partial = EvaluationResult { ta: Some(0.8), ..Default::default() };
        store.save_unlearn("GA", 0.1, &model, Some(&partial)).unwrap();
        let (loaded, ckpt) = store.load_unlearn("GA", 0.1, fresh(), &device).unwrap().unwrap();
        assert_eq!(ckpt.result, Some(partial));
        assert_eq!(weights(&loaded), weights(&model));

        // Saving without a result drops the stale file
        store.save_unlearn("GA", 0.1, &model, None).unwrap();
        let (_, ckpt) = store.load_unlearn("GA", 0.1, fresh(), &device).unwrap().unwrap();
        assert_eq!(ckpt.result, None);
        assert!(!store.unlearn_dir("GA", 0.1).join(RESULT_FILE).exists());

        // Different ratio is a different experiment
        assert!(store.load_unlearn("GA", 0.2, fresh(), &device).unwrap().is_none());
    }

    #[test]
    fn test_unlearn_record_uses_recorder_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let store = CheckpointManager::new(tmp.path(), "tiny", "R8");

        store.save_unlearn("FT", 0.1, &tiny_config(2).init::<TestInner>(&device), None).unwrap();

        assert!(store.unlearn_dir("FT", 0.1).join("model.mpk").exists());
        assert!(store.load_unlearn("FT", 0.1, tiny_config(2).init::<TestInner>(&device), &device).unwrap().is_some());
    }

    #[test]
    fn test_stale_result_removed_before_weights_are_written() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let store = CheckpointManager::new(tmp.path(), "tiny", "R8");
        let model = tiny_config(2).init::<TestInner>(&device);
        let dir = store.unlearn_dir("GA", 0.1);

        let partial = EvaluationResult { ta: Some(0.8), ..Default::default() };
        store.save_unlearn("GA", 0.1, &model, Some(&partial)).unwrap();

        // A directory in place of the record makes the weight write fail
        fs::remove_file(dir.join("model.mpk")).unwrap();
        fs::create_dir(dir.join("model.mpk")).unwrap();
        assert!(store.save_unlearn("GA", 0.1, &model, None).is_err());

        assert!(!dir.join(RESULT_FILE).exists());
    }
}
