use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One tokenised and padded document.
/// Sequence format: [CLS] tokens [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

/// Shared, cheaply clonable view over encoded samples.
#[derive(Debug, Clone, Default)]
pub struct TextDataset {
    samples: Arc<Vec<EncodedSample>>,
}

impl TextDataset {
    pub fn new(samples: Vec<EncodedSample>) -> Self {
        Self { samples: Arc::new(samples) }
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// The first `n` samples (all of them if `n` exceeds the length).
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.samples.len());
        Self::new(self.samples[..n].to_vec())
    }
}

impl Dataset<EncodedSample> for TextDataset {
    fn get(&self, index: usize) -> Option<EncodedSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
