// ============================================================
// Layer 4 — Classification Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<EncodedSample>
// into device tensors.
//
//   Input:  Vec of N EncodedSamples, each with sequences of length S
//   Output: ClassifyBatch with ids/mask [N, S] and labels [N]
//
// All sequences share one padded length (the whole corpus is
// padded together before splitting), so rows stack directly.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::EncodedSample;

/// A batch of documents ready for the classifier forward pass.
#[derive(Debug, Clone)]
pub struct ClassifyBatch<B: Backend> {
    /// Token ID sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention masks — shape: [batch_size, seq_len]
    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Class indices — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> ClassifyBatch<B> {
    pub fn size(&self) -> usize {
        self.labels.dims()[0]
    }
}

/// Holds the target device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct ClassifyBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ClassifyBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<EncodedSample, ClassifyBatch<B>> for ClassifyBatcher<B> {
    fn batch(&self, items: Vec<EncodedSample>) -> ClassifyBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |s| s.input_ids.len());

        let input_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i64))
            .collect();

        let mask_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i64))
            .collect();

        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let input_ids = Tensor::<B, 2, Int>::from_data(
            TensorData::new(input_flat, [batch_size, seq_len]), &self.device,
        );
        let attention_mask = Tensor::<B, 2, Int>::from_data(
            TensorData::new(mask_flat, [batch_size, seq_len]), &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]), &self.device,
        );

        ClassifyBatch { input_ids, attention_mask, labels }
    }
}
