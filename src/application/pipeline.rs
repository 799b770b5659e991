// ============================================================
// Layer 2 — Data Pipeline
// ============================================================
// Shared by every command that touches the model:
//
//   Step 1: Load corpus and masks        (Layer 4 - data)
//   Step 2: Derive split counts          (Layer 4 - data)
//   Step 3: Build / load tokenizer       (Layer 6 - infra)
//   Step 4: Encode every document        (Layer 4 - data)
//   Step 5: Partition into four splits   (Layer 4 - data)
//   Step 6: Wrap splits in loaders       (Layer 4 - data)

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::data::{
    encoder::encode_corpus,
    loaders::SplitLoaders,
    splitter::{partition, PartitionCounts},
};
use crate::domain::traits::CorpusSource;
use crate::infra::tokenizer_store::{id_bound, TokenizerStore};
use crate::ml::model::TextClassifierConfig;

/// Knobs that decide how the corpus becomes batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    pub max_length:   usize,
    pub batch_size:   usize,
    pub forget_ratio: f64,
    pub vocab_size:   usize,
    pub seed:         u64,
}

/// Encoder architecture chosen on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Architecture {
    pub d_model:    usize,
    pub num_heads:  usize,
    pub num_layers: usize,
    pub d_ff:       usize,
    pub dropout:    f64,
}

impl Default for Architecture {
    fn default() -> Self {
        Self { d_model: 256, num_heads: 8, num_layers: 4, d_ff: 1024, dropout: 0.1 }
    }
}

impl Architecture {
    pub fn model_config(&self, data: &PreparedData<impl AutodiffBackend>) -> TextClassifierConfig {
        TextClassifierConfig::new(
            data.vocab_bound,
            data.max_length,
            self.d_model,
            self.num_heads,
            self.num_layers,
            self.d_ff,
            data.nb_class,
            self.dropout,
        )
    }
}

pub struct PreparedData<B: AutodiffBackend> {
    pub loaders:     SplitLoaders<B>,
    pub counts:      PartitionCounts,
    pub nb_class:    usize,
    /// One past the largest token id the tokenizer can emit
    pub vocab_bound: usize,
    pub max_length:  usize,
}

pub fn prepare<B: AutodiffBackend>(
    source:     &impl CorpusSource,
    tokenizers: &TokenizerStore,
    settings:   &DataSettings,
    device:     &B::Device,
) -> Result<PreparedData<B>> {
    // ── Step 1-2: corpus and split sizes ─────────────────────────────────────
    let corpus = source.load()?;
    let counts = PartitionCounts::from_masks(&corpus.masks, settings.forget_ratio)?;
    tracing::info!(
        "Splits: nb_train={} nb_val={} nb_test={} → retain={} forget={}",
        counts.nb_train, counts.nb_val, counts.nb_test, counts.nb_retain, counts.nb_forget,
    );

    // ── Step 3-4: tokenizer and encoding ─────────────────────────────────────
    let tokenizer = tokenizers.load_or_build(&corpus.texts, settings.vocab_size)?;
    let samples = encode_corpus(&corpus, &tokenizer, settings.max_length)?;

    // ── Step 5-6: partition and loaders ──────────────────────────────────────
    let split = partition(&samples, &counts);
    let loaders = SplitLoaders::new(split, settings.batch_size, settings.seed, device.clone());

    Ok(PreparedData {
        loaders,
        counts,
        nb_class:    corpus.num_classes(),
        vocab_bound: id_bound(&tokenizer),
        max_length:  settings.max_length.max(2),
    })
}

/// Writes a two-class TextGCN-style corpus for use-case tests:
/// `n_train` train lines then `n_test` test lines.
#[cfg(test)]
pub(crate) fn write_toy_corpus(dir: &std::path::Path, dataset: &str, n_train: usize, n_test: usize) {
    use std::fmt::Write as _;
    let mut meta = String::new();
    let mut text = String::new();
    for i in 0..n_train + n_test {
        let split = if i < n_train { "train" } else { "test" };
        let (label, words) = if i % 2 == 0 { ("pos", "alpha gain rise") } else { ("neg", "beta loss fall") };
        writeln!(meta, "doc{i}\t{split}\t{label}").unwrap();
        writeln!(text, "{words} item{}", i % 7).unwrap();
    }
    std::fs::create_dir_all(dir.join("corpus")).unwrap();
    std::fs::write(dir.join(format!("{dataset}_shuffle.txt")), meta).unwrap();
    std::fs::write(dir.join("corpus").join(format!("{dataset}_shuffle.txt")), text).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::CorpusLoader;
    use crate::domain::result::Split;
    use crate::ml::testing::TestBackend;

    #[test]
    fn test_prepare_builds_expected_splits() {
        let tmp = tempfile::tempdir().unwrap();
        write_toy_corpus(tmp.path(), "toy", 80, 20);
        let source = CorpusLoader::new(tmp.path(), "toy", 0.25);
        let store = TokenizerStore::new(tmp.path().join("tok"));
        let settings = DataSettings { max_length: 16, batch_size: 8, forget_ratio: 0.2, vocab_size: 100, seed: 0 };

        let data = prepare::<TestBackend>(&source, &store, &settings, &Default::default()).unwrap();

        assert_eq!(data.counts.nb_train, 60);
        assert_eq!(data.counts.nb_val, 20);
        assert_eq!(data.counts.nb_test, 20);
        assert_eq!(data.counts.nb_forget, 12);
        assert_eq!(data.counts.nb_retain, 48);
        assert_eq!(data.loaders.dataset(Split::Retain).sample_count(), 48);
        assert_eq!(data.loaders.dataset(Split::Forget).sample_count(), 12);
        assert_eq!(data.nb_class, 2);
        assert!(data.vocab_bound > 104);
        assert!(store.path().exists());
    }
}
