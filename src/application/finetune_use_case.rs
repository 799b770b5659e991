// ============================================================
// Layer 2 — FinetuneUseCase
// ============================================================
// Produces the pretrained checkpoint every non-`retrain`
// unlearning method starts from:
//
//   Step 1: Prepare data             (Layer 2 - pipeline)
//   Step 2: Build model config       (Layer 5 - ml)
//   Step 3: Save config              (Layer 6 - infra)
//   Step 4: Train on retain ∪ forget (Layer 5 - ml)
//   Step 5: Save encoder/classifier  (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::application::pipeline::{prepare, Architecture, DataSettings};
use crate::data::loader::CorpusLoader;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::model::TextClassifierConfig;
use crate::ml::trainer::finetune;

// ─── Finetune Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetuneConfig {
    pub dataset:        String,
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub model_id:       String,
    pub val_ratio:      f64,
    pub epochs:         usize,
    pub lr:             f64,
    pub print_freq:     usize,
    pub data:           DataSettings,
    pub architecture:   Architecture,
}

impl Default for FinetuneConfig {
    fn default() -> Self {
        Self {
            dataset:        "R8".to_string(),
            data_dir:       "data".to_string(),
            checkpoint_dir: "checkpoint".to_string(),
            model_id:       "transformer".to_string(),
            val_ratio:      0.1,
            epochs:         5,
            lr:             1e-4,
            print_freq:     50,
            data: DataSettings {
                max_length:   128,
                batch_size:   32,
                forget_ratio: 0.0,
                vocab_size:   30000,
                seed:         42,
            },
            architecture: Architecture::default(),
        }
    }
}

// ─── FinetuneUseCase ──────────────────────────────────────────────────────────
pub struct FinetuneUseCase {
    config: FinetuneConfig,
}

impl FinetuneUseCase {
    pub fn new(config: FinetuneConfig) -> Self {
        Self { config }
    }

    /// Train from scratch and store the pretrained checkpoint.
    /// Returns the architecture that was saved.
    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TextClassifierConfig> {
        let cfg = &self.config;
        let store = CheckpointManager::new(&cfg.checkpoint_dir, &cfg.model_id, &cfg.dataset);

        // ── Step 1: data ─────────────────────────────────────────────────────
        let source = CorpusLoader::new(&cfg.data_dir, &cfg.dataset, cfg.val_ratio);
        let tokenizers = TokenizerStore::new(store.dir());
        let data = prepare::<B>(&source, &tokenizers, &cfg.data, device)?;

        // ── Step 2-3: architecture ───────────────────────────────────────────
        let model_config = cfg.architecture.model_config(&data);
        store.save_model_config(&model_config)?;

        // ── Step 4: training loop ────────────────────────────────────────────
        B::seed(cfg.data.seed);
        let model = model_config.init::<B>(device);
        tracing::info!(
            "Fine-tuning {} on {} for {} epochs ({} classes)",
            cfg.model_id, cfg.dataset, cfg.epochs, data.nb_class,
        );
        let model = finetune(model, &data.loaders, cfg.epochs, cfg.lr, cfg.print_freq);

        // ── Step 5: checkpoint ───────────────────────────────────────────────
        store.save_pretrained(&model)?;
        Ok(model_config)
    }
}

/// Tiny two-class setup rooted at `root` for use-case tests.
#[cfg(test)]
pub(crate) fn tiny_finetune(root: &std::path::Path) -> FinetuneConfig {
    FinetuneConfig {
        dataset:        "toy".into(),
        data_dir:       root.join("data").display().to_string(),
        checkpoint_dir: root.join("ckpt").display().to_string(),
        model_id:       "tiny".into(),
        val_ratio:      0.25,
        epochs:         1,
        lr:             1e-3,
        print_freq:     0,
        data: DataSettings { max_length: 16, batch_size: 8, forget_ratio: 0.0, vocab_size: 100, seed: 1 },
        architecture: Architecture { d_model: 8, num_heads: 2, num_layers: 1, d_ff: 16, dropout: 0.0 },
    }
}
