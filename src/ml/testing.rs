//! Shared fixtures for tensor tests: CPU backends, a tiny model
//! config and synthetic samples.

use burn::backend::{Autodiff, NdArray};

use crate::data::dataset::EncodedSample;
use crate::data::encoder::{CLS_ID, PAD_ID, SEP_ID};
use crate::data::loaders::SplitLoaders;
use crate::data::splitter::Partition;
use crate::ml::model::TextClassifierConfig;
use crate::ml::unlearn::UnlearnSettings;

pub type TestInner = NdArray;
pub type TestBackend = Autodiff<NdArray>;

pub fn tiny_config(nb_class: usize) -> TextClassifierConfig {
    TextClassifierConfig::new(256, 16, 8, 2, 1, 16, nb_class, 0.0)
}

/// `[CLS] w [SEP] [PAD]...` of length `len`, where the single word
/// id encodes the label so a small model can learn it.
pub fn sample(label: usize, len: usize) -> EncodedSample {
    let mut input_ids = vec![CLS_ID, 104 + label as u32, SEP_ID];
    let mut attention_mask = vec![1u32; 3];
    input_ids.resize(len.max(3), PAD_ID);
    attention_mask.resize(len.max(3), 0);
    EncodedSample { input_ids, attention_mask, label }
}

/// Two-class split bundle with `[retain, forget, val, test]` sizes.
pub fn toy_loaders(sizes: [usize; 4], seed: u64) -> SplitLoaders<TestBackend> {
    let data = |n: usize| (0..n).map(|i| sample(i % 2, 5)).collect::<Vec<_>>();
    let partition = Partition {
        retain: data(sizes[0]),
        forget: data(sizes[1]),
        val:    data(sizes[2]),
        test:   data(sizes[3]),
    };
    SplitLoaders::new(partition, 4, seed, Default::default())
}

pub fn toy_settings() -> UnlearnSettings {
    UnlearnSettings { epochs: 1, lr: 1e-2, alpha: 1e-3, seed: 3, model: tiny_config(2) }
}
