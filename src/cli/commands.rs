// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `finetune`, `unlearn` and
// `report`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::finetune_use_case::FinetuneConfig;
use crate::application::pipeline::{Architecture, DataSettings};
use crate::application::unlearn_use_case::ExperimentConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the classifier on the full train region and store it
    Finetune(FinetuneArgs),

    /// Unlearn the forget set and evaluate TA, UA, RA and MIA
    Unlearn(UnlearnArgs),

    /// Print the stored evaluation result of an experiment
    Report(ReportArgs),
}

/// Flags shared by every command that reads the corpus.
#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Dataset name, e.g. R8, 20ng, mr
    #[arg(long, default_value = "R8")]
    pub dataset: String,

    /// Directory holding `{dataset}_shuffle.txt` and `corpus/`
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Root directory for checkpoints, tokenizer and results.csv
    #[arg(long, default_value = "checkpoint")]
    pub checkpoint_dir: String,

    /// Model identifier used in checkpoint paths
    #[arg(long, default_value = "transformer")]
    pub model_id: String,

    /// Maximum tokens per document, including [CLS] and [SEP]
    #[arg(long, default_value_t = 128)]
    pub max_length: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Fraction of the train region held out as validation
    #[arg(long, default_value_t = 0.1)]
    pub val_ratio: f64,

    /// Upper bound on tokenizer vocabulary size
    #[arg(long, default_value_t = 30000)]
    pub vocab_size: usize,

    /// Seed for loader shuffling, initialisation and noise
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Print an evaluation progress line every N batches (0 = off)
    #[arg(long, default_value_t = 50)]
    pub print_freq: usize,
}

/// Encoder architecture; only used when no model config is stored yet.
#[derive(Args, Debug, Clone)]
pub struct ArchitectureArgs {
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 4)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,
}

impl From<ArchitectureArgs> for Architecture {
    fn from(a: ArchitectureArgs) -> Self {
        Architecture {
            d_model:    a.d_model,
            num_heads:  a.num_heads,
            num_layers: a.num_layers,
            d_ff:       a.d_ff,
            dropout:    a.dropout,
        }
    }
}

impl CorpusArgs {
    fn data_settings(&self, forget_ratio: f64) -> DataSettings {
        DataSettings {
            max_length: self.max_length,
            batch_size: self.batch_size,
            forget_ratio,
            vocab_size: self.vocab_size,
            seed:       self.seed,
        }
    }
}

// ─── finetune ─────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct FinetuneArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub architecture: ArchitectureArgs,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,
}

/// The application layer never sees clap types.
impl From<FinetuneArgs> for FinetuneConfig {
    fn from(a: FinetuneArgs) -> Self {
        FinetuneConfig {
            data:           a.corpus.data_settings(0.0),
            dataset:        a.corpus.dataset,
            data_dir:       a.corpus.data_dir,
            checkpoint_dir: a.corpus.checkpoint_dir,
            model_id:       a.corpus.model_id,
            val_ratio:      a.corpus.val_ratio,
            epochs:         a.epochs,
            lr:             a.lr,
            print_freq:     a.corpus.print_freq,
            architecture:   a.architecture.into(),
        }
    }
}

// ─── unlearn ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct UnlearnArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub architecture: ArchitectureArgs,

    /// One of: raw, RL, GA, GA_l1, FT, FT_l1, fisher, fisher_new, retrain, wfisher
    #[arg(long, default_value = "raw")]
    pub unlearn_method: String,

    /// Fraction of the train region to forget, in [0, 1)
    #[arg(long, default_value_t = 0.1)]
    pub forget_ratio: f64,

    /// Ignore any stored checkpoint and unlearn again
    #[arg(long)]
    pub rerun: bool,

    #[arg(long, default_value_t = 2)]
    pub unlearn_epochs: usize,

    #[arg(long, default_value_t = 1e-5)]
    pub unlearn_lr: f64,

    /// L1 strength (*_l1) or perturbation scale (Fisher methods)
    #[arg(long, default_value_t = 1e-4)]
    pub alpha: f64,
}

impl From<UnlearnArgs> for ExperimentConfig {
    fn from(a: UnlearnArgs) -> Self {
        ExperimentConfig {
            data:           a.corpus.data_settings(a.forget_ratio),
            dataset:        a.corpus.dataset,
            data_dir:       a.corpus.data_dir,
            checkpoint_dir: a.corpus.checkpoint_dir,
            model_id:       a.corpus.model_id,
            unlearn_method: a.unlearn_method,
            rerun:          a.rerun,
            val_ratio:      a.corpus.val_ratio,
            print_freq:     a.corpus.print_freq,
            unlearn_epochs: a.unlearn_epochs,
            unlearn_lr:     a.unlearn_lr,
            alpha:          a.alpha,
            architecture:   a.architecture.into(),
        }
    }
}

// ─── report ───────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[arg(long, default_value = "R8")]
    pub dataset: String,

    #[arg(long, default_value = "checkpoint")]
    pub checkpoint_dir: String,

    #[arg(long, default_value = "transformer")]
    pub model_id: String,

    #[arg(long, default_value = "raw")]
    pub unlearn_method: String,

    #[arg(long, default_value_t = 0.1)]
    pub forget_ratio: f64,
}
