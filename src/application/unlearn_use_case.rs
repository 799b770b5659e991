// ============================================================
// Layer 2 — UnlearnUseCase
// ============================================================
// Runs one (dataset, model, method, forget_ratio) experiment:
//
//   Step 1: Resolve the method            (fails before any work)
//   Step 2: Prepare data                  (Layer 2 - pipeline)
//           capped at the stored model's max_seq_len
//   Step 3: Rebuild the model             (Layer 5 - ml)
//   Step 4: Run the experiment machine    (Layer 2 - experiment)
//   Step 5: Append the results row        (Layer 6 - infra)
//
// BurnExperiment is the real ExperimentSteps: it owns the model
// and the loaders, delegates weights and results to the
// CheckpointManager, and runs evaluation on the inner backend.

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::experiment::run_experiment;
use crate::application::pipeline::{prepare, Architecture, DataSettings};
use crate::data::{loader::CorpusLoader, loaders::SplitLoaders};
use crate::domain::error::HarnessError;
use crate::domain::result::{Checkpoint, EvaluationResult, MiaResult, Split};
use crate::domain::traits::ExperimentSteps;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{ResultRow, ResultsLogger},
    tokenizer_store::TokenizerStore,
};
use crate::ml::evaluator::evaluate;
use crate::ml::mia::svc_mia;
use crate::ml::model::TextClassifier;
use crate::ml::unlearn::{UnlearnMethod, UnlearnRegistry, UnlearnSettings};

// ─── Experiment Configuration ────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub dataset:        String,
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub model_id:       String,
    pub unlearn_method: String,
    /// Ignore any stored checkpoint and start over
    pub rerun:          bool,
    pub val_ratio:      f64,
    pub print_freq:     usize,
    pub unlearn_epochs: usize,
    pub unlearn_lr:     f64,
    pub alpha:          f64,
    pub data:           DataSettings,
    /// Used only when no `model_config.json` has been stored yet
    pub architecture:   Architecture,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dataset:        "R8".to_string(),
            data_dir:       "data".to_string(),
            checkpoint_dir: "checkpoint".to_string(),
            model_id:       "transformer".to_string(),
            unlearn_method: "raw".to_string(),
            rerun:          false,
            val_ratio:      0.1,
            print_freq:     50,
            unlearn_epochs: 2,
            unlearn_lr:     1e-5,
            alpha:          1e-4,
            data: DataSettings {
                max_length:   128,
                batch_size:   32,
                forget_ratio: 0.1,
                vocab_size:   30000,
                seed:         42,
            },
            architecture: Architecture::default(),
        }
    }
}

// ─── UnlearnUseCase ───────────────────────────────────────────────────────────
pub struct UnlearnUseCase {
    config: ExperimentConfig,
}

impl UnlearnUseCase {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<EvaluationResult> {
        let cfg = &self.config;

        // ── Step 1: method lookup ────────────────────────────────────────────
        let registry = UnlearnRegistry::<B>::standard();
        let method = registry.resolve(&cfg.unlearn_method)?;

        // ── Step 2: data, encoded no longer than the stored model allows ────
        let store = CheckpointManager::new(&cfg.checkpoint_dir, &cfg.model_id, &cfg.dataset);
        let stored = store.has_model_config().then(|| store.load_model_config()).transpose()?;
        let mut data_settings = cfg.data.clone();
        if let Some(stored) = &stored {
            if data_settings.max_length > stored.max_seq_len {
                tracing::warn!(
                    "max_length {} exceeds the stored model's {}; truncating to it",
                    data_settings.max_length, stored.max_seq_len,
                );
                data_settings.max_length = stored.max_seq_len;
            }
        }
        let source = CorpusLoader::new(&cfg.data_dir, &cfg.dataset, cfg.val_ratio);
        let tokenizers = TokenizerStore::new(store.dir());
        let data = prepare::<B>(&source, &tokenizers, &data_settings, device)?;

        // ── Step 3: model ────────────────────────────────────────────────────
        let model_config = match stored {
            Some(stored) if stored.nb_class != data.nb_class => {
                return Err(HarnessError::ClassCountMismatch { stored: stored.nb_class, corpus: data.nb_class }.into());
            }
            Some(stored) => stored,
            None if !method.needs_pretrained() => {
                tracing::warn!("No stored model config; building one from the command line");
                let fresh = cfg.architecture.model_config(&data);
                store.save_model_config(&fresh)?;
                fresh
            }
            None => return Err(HarnessError::MissingPretrained { path: store.dir().to_path_buf() }.into()),
        };
        let model = model_config.init::<B>(device);

        let settings = UnlearnSettings {
            epochs: cfg.unlearn_epochs,
            lr:     cfg.unlearn_lr,
            alpha:  cfg.alpha,
            seed:   cfg.data.seed,
            model:  model_config,
        };

        // ── Step 4: experiment ───────────────────────────────────────────────
        let mut experiment = BurnExperiment {
            method,
            settings,
            loaders: data.loaders,
            store: &store,
            model,
            criterion: CrossEntropyLossConfig::new().init(device),
            eval_criterion: CrossEntropyLossConfig::new().init(device),
            forget_ratio: cfg.data.forget_ratio,
            print_freq: cfg.print_freq,
            device: device.clone(),
        };
        let result = run_experiment(&mut experiment, cfg.rerun)?;

        // ── Step 5: results log ──────────────────────────────────────────────
        ResultsLogger::new(&cfg.checkpoint_dir)?.log(&ResultRow {
            dataset:      &cfg.dataset,
            model:        &cfg.model_id,
            method:       &cfg.unlearn_method,
            forget_ratio: cfg.data.forget_ratio,
            result:       &result,
        })?;
        Ok(result)
    }
}

// ─── BurnExperiment ───────────────────────────────────────────────────────────
pub struct BurnExperiment<'a, B: AutodiffBackend> {
    method:         &'a dyn UnlearnMethod<B>,
    settings:       UnlearnSettings,
    loaders:        SplitLoaders<B>,
    store:          &'a CheckpointManager,
    model:          TextClassifier<B>,
    criterion:      CrossEntropyLoss<B>,
    eval_criterion: CrossEntropyLoss<B::InnerBackend>,
    forget_ratio:   f64,
    print_freq:     usize,
    device:         B::Device,
}

impl<B: AutodiffBackend> ExperimentSteps for BurnExperiment<'_, B> {
    fn restore(&mut self) -> Result<Option<Checkpoint>> {
        let loaded = self.store.load_unlearn(self.method.name(), self.forget_ratio, self.model.clone(), &self.device)?;
        Ok(loaded.map(|(model, checkpoint)| {
            self.model = model;
            checkpoint
        }))
    }

    fn unlearn(&mut self) -> Result<()> {
        if self.method.needs_pretrained() {
            self.model = self.store.load_pretrained(self.model.clone(), &self.device)?;
        }
        tracing::info!(method = self.method.name(), "Running unlearning");
        self.model = self.method.unlearn(&self.loaders, self.model.clone(), &self.criterion, &self.settings)?;
        Ok(())
    }

    fn accuracy(&mut self, split: Split) -> Result<f64> {
        tracing::info!("Evaluating {} split", split);
        Ok(evaluate(&self.loaders.eval(split), &self.model.valid(), &self.eval_criterion, self.print_freq))
    }

    fn membership_attack(&mut self) -> Result<MiaResult> {
        let (shadow_train, shadow_test) = self.loaders.shadow_pair();
        let forget = self.loaders.eval(Split::Forget);
        svc_mia(&shadow_train, &shadow_test, None, Some(&forget), &self.model.valid())
    }

    fn persist(&mut self, result: Option<&EvaluationResult>) -> Result<()> {
        self.store.save_unlearn(self.method.name(), self.forget_ratio, &self.model, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::finetune_use_case::{tiny_finetune, FinetuneConfig, FinetuneUseCase};
    use crate::application::pipeline::write_toy_corpus;
    use crate::ml::testing::TestBackend;
    use std::path::Path;

    fn tiny_experiment(root: &Path, method: &str) -> ExperimentConfig {
        let ft = tiny_finetune(root);
        ExperimentConfig {
            dataset:        ft.dataset,
            data_dir:       ft.data_dir,
            checkpoint_dir: ft.checkpoint_dir,
            model_id:       ft.model_id,
            unlearn_method: method.into(),
            rerun:          false,
            val_ratio:      0.25,
            print_freq:     0,
            unlearn_epochs: 1,
            unlearn_lr:     1e-3,
            alpha:          1e-3,
            data:           DataSettings { forget_ratio: 0.2, ..ft.data },
            architecture:   ft.architecture,
        }
    }

    fn setup(finetuned: bool) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        write_toy_corpus(&tmp.path().join("data"), "toy", 80, 20);
        if finetuned {
            FinetuneUseCase::new(tiny_finetune(tmp.path()))
                .execute::<TestBackend>(&Default::default())
                .unwrap();
        }
        tmp
    }

    #[test]
    fn test_raw_experiment_end_to_end_then_resume() {
        let tmp = setup(true);
        let cfg = tiny_experiment(tmp.path(), "raw");

        let first = UnlearnUseCase::new(cfg.clone()).execute::<TestBackend>(&Default::default()).unwrap();

        assert!(first.is_complete());
        for v in [first.ta, first.ua, first.ra].into_iter().flatten() {
            assert!((0.0..=1.0).contains(&v));
        }
        assert!((0.0..=1.0).contains(&first.mia.unwrap().score()));

        let store = CheckpointManager::new(&cfg.checkpoint_dir, "tiny", "toy");
        assert_eq!(store.load_result("raw", 0.2).unwrap(), Some(first.clone()));

        // Full stored result: nothing recomputed
        let second = UnlearnUseCase::new(cfg.clone()).execute::<TestBackend>(&Default::default()).unwrap();
        assert_eq!(second, first);

        let csv = std::fs::read_to_string(Path::new(&cfg.checkpoint_dir).join("results.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    fn model_file(cfg: &ExperimentConfig) -> std::path::PathBuf {
        CheckpointManager::new(&cfg.checkpoint_dir, &cfg.model_id, &cfg.dataset)
            .unlearn_dir(&cfg.unlearn_method, cfg.data.forget_ratio)
            .join("model.mpk")
    }

    fn store_result(cfg: &ExperimentConfig, result: &EvaluationResult) {
        let dir = CheckpointManager::new(&cfg.checkpoint_dir, &cfg.model_id, &cfg.dataset)
            .unlearn_dir(&cfg.unlearn_method, cfg.data.forget_ratio);
        std::fs::write(dir.join("evaluation_result.json"), serde_json::to_string(result).unwrap()).unwrap();
    }

    #[test]
    fn test_full_stored_result_writes_nothing_and_recomputes_nothing() {
        let tmp = setup(true);
        let cfg = tiny_experiment(tmp.path(), "raw");
        UnlearnUseCase::new(cfg.clone()).execute::<TestBackend>(&Default::default()).unwrap();

        // Values no evaluation pass can produce
        let stored = EvaluationResult {
            ta:  Some(7.0),
            ua:  Some(8.0),
            ra:  Some(9.0),
            mia: Some(MiaResult { correctness: 2.0, confidence: 3.0, entropy: 4.0, m_entropy: 5.0, prob: 6.0 }),
        };
        store_result(&cfg, &stored);
        let written = std::fs::metadata(model_file(&cfg)).unwrap().modified().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));

        let second = UnlearnUseCase::new(cfg.clone()).execute::<TestBackend>(&Default::default()).unwrap();

        assert_eq!(second, stored);
        assert_eq!(std::fs::metadata(model_file(&cfg)).unwrap().modified().unwrap(), written);
    }

    #[test]
    fn test_partial_stored_result_resumes_at_first_missing_metric() {
        let tmp = setup(true);
        let cfg = tiny_experiment(tmp.path(), "raw");
        UnlearnUseCase::new(cfg.clone()).execute::<TestBackend>(&Default::default()).unwrap();
        store_result(&cfg, &EvaluationResult { ta: Some(7.0), ua: Some(8.0), ..Default::default() });

        let resumed = UnlearnUseCase::new(cfg.clone()).execute::<TestBackend>(&Default::default()).unwrap();

        assert_eq!(resumed.ta, Some(7.0));
        assert_eq!(resumed.ua, Some(8.0));
        assert!((0.0..=1.0).contains(&resumed.ra.unwrap()));
        assert!(resumed.mia.is_some());
    }

    #[test]
    fn test_rerun_recomputes_over_stored_result() {
        let tmp = setup(true);
        let cfg = tiny_experiment(tmp.path(), "raw");
        UnlearnUseCase::new(cfg.clone()).execute::<TestBackend>(&Default::default()).unwrap();
        store_result(&cfg, &EvaluationResult { ta: Some(7.0), ..Default::default() });

        let rerun = ExperimentConfig { rerun: true, ..cfg };
        let result = UnlearnUseCase::new(rerun).execute::<TestBackend>(&Default::default()).unwrap();

        assert!((0.0..=1.0).contains(&result.ta.unwrap()));
    }

    #[test]
    fn test_longer_max_length_is_capped_to_stored_model() {
        let tmp = tempfile::tempdir().unwrap();
        write_toy_corpus(&tmp.path().join("data"), "toy", 80, 20);
        let ft = tiny_finetune(tmp.path());
        let short = FinetuneConfig { data: DataSettings { max_length: 4, ..ft.data.clone() }, ..ft };
        FinetuneUseCase::new(short).execute::<TestBackend>(&Default::default()).unwrap();

        let cfg = tiny_experiment(tmp.path(), "FT");
        assert_eq!(cfg.data.max_length, 16);
        let result = UnlearnUseCase::new(cfg).execute::<TestBackend>(&Default::default()).unwrap();

        assert!(result.is_complete());
    }

    #[test]
    fn test_stored_class_count_must_match_corpus() {
        let tmp = setup(true);
        let cfg = tiny_experiment(tmp.path(), "GA");
        let store = CheckpointManager::new(&cfg.checkpoint_dir, &cfg.model_id, &cfg.dataset);
        let mut model_config = store.load_model_config().unwrap();
        model_config.nb_class = 3;
        store.save_model_config(&model_config).unwrap();

        let err = UnlearnUseCase::new(cfg).execute::<TestBackend>(&Default::default()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::ClassCountMismatch { stored: 3, corpus: 2 })
        ));
    }

    #[test]
    fn test_unknown_method_fails_before_touching_disk() {
        let tmp = setup(false);
        let cfg = tiny_experiment(tmp.path(), "SCRUB");

        let err = UnlearnUseCase::new(cfg.clone()).execute::<TestBackend>(&Default::default()).unwrap_err();

        assert_eq!(err.to_string(), "Unlearn method SCRUB not implemented!");
        assert!(!Path::new(&cfg.checkpoint_dir).exists());
    }

    #[test]
    fn test_pretrained_methods_need_finetune() {
        let tmp = setup(false);
        let err = UnlearnUseCase::new(tiny_experiment(tmp.path(), "GA"))
            .execute::<TestBackend>(&Default::default())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<HarnessError>(), Some(HarnessError::MissingPretrained { .. })));
    }

    #[test]
    fn test_retrain_runs_without_finetune() {
        let tmp = setup(false);
        let result = UnlearnUseCase::new(tiny_experiment(tmp.path(), "retrain"))
            .execute::<TestBackend>(&Default::default())
            .unwrap();
        assert!(result.is_complete());
    }
}
