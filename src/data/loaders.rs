// ============================================================
// Layer 4 — Split Bundle and Data Loaders
// ============================================================
// Owns the four split datasets and hands out burn DataLoaders:
//
//   train(split)  → AutodiffBackend batches, used by unlearning
//   eval(split)   → inner-backend batches, used by evaluation
//   shadow_pair() → unshuffled retain/test heads of equal length
//
// retain/forget/val are shuffled with a fixed seed; test and the
// shadow loaders keep corpus order.

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::sync::Arc;

use crate::data::batcher::{ClassifyBatch, ClassifyBatcher};
use crate::data::dataset::{EncodedSample, TextDataset};
use crate::data::splitter::Partition;
use crate::domain::result::Split;

pub type BatchLoader<B> = Arc<dyn DataLoader<ClassifyBatch<B>>>;

pub struct SplitLoaders<B: AutodiffBackend> {
    retain:     TextDataset,
    forget:     TextDataset,
    val:        TextDataset,
    test:       TextDataset,
    batch_size: usize,
    seed:       u64,
    device:     B::Device,
}

impl<B: AutodiffBackend> SplitLoaders<B> {
    pub fn new(
        partition:  Partition<EncodedSample>,
        batch_size: usize,
        seed:       u64,
        device:     B::Device,
    ) -> Self {
        Self {
            retain: TextDataset::new(partition.retain),
            forget: TextDataset::new(partition.forget),
            val:    TextDataset::new(partition.val),
            test:   TextDataset::new(partition.test),
            batch_size: batch_size.max(1),
            seed,
            device,
        }
    }

    pub fn dataset(&self, split: Split) -> &TextDataset {
        match split {
            Split::Retain => &self.retain,
            Split::Forget => &self.forget,
            Split::Val    => &self.val,
            Split::Test   => &self.test,
        }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Loader producing autodiff batches for gradient steps.
    pub fn train(&self, split: Split) -> BatchLoader<B> {
        build::<B>(self.dataset(split).clone(), self.batch_size, split.shuffled().then_some(self.seed), &self.device)
    }

    /// Loader producing inner-backend batches for inference passes.
    pub fn eval(&self, split: Split) -> BatchLoader<B::InnerBackend> {
        build::<B::InnerBackend>(self.dataset(split).clone(), self.batch_size, split.shuffled().then_some(self.seed), &self.device)
    }

    /// Ordered loader over an arbitrary dataset.
    pub fn ordered(&self, dataset: TextDataset) -> BatchLoader<B::InnerBackend> {
        build::<B::InnerBackend>(dataset, self.batch_size, None, &self.device)
    }

    /// Shadow member/non-member loaders: the first
    /// min(|test|, |retain|) samples of retain and of test, unshuffled.
    pub fn shadow_pair(&self) -> (BatchLoader<B::InnerBackend>, BatchLoader<B::InnerBackend>) {
        let len = self.test.sample_count().min(self.retain.sample_count());
        (self.ordered(self.retain.head(len)), self.ordered(self.test.head(len)))
    }
}

fn build<B: Backend>(
    dataset:    TextDataset,
    batch_size: usize,
    shuffle:    Option<u64>,
    device:     &B::Device,
) -> BatchLoader<B> {
    let batcher = ClassifyBatcher::<B>::new(device.clone());
    let builder = DataLoaderBuilder::new(batcher).batch_size(batch_size);
    match shuffle {
        Some(seed) => builder.shuffle(seed).build(dataset),
        None       => builder.build(dataset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::splitter::Partition;
    use crate::ml::testing::{sample, TestBackend};
    use burn::data::dataset::Dataset;

    fn loaders(n_retain: usize, n_test: usize) -> SplitLoaders<TestBackend> {
        let partition = Partition {
            retain: (0..n_retain).map(|i| sample(i % 2, 4)).collect(),
            forget: (0..3).map(|i| sample(i % 2, 4)).collect(),
            val:    vec![],
            test:   (0..n_test).map(|i| sample(i % 2, 4)).collect(),
        };
        SplitLoaders::new(partition, 2, 7, Default::default())
    }

    fn count<B: Backend>(loader: &BatchLoader<B>) -> usize {
        loader.iter().map(|b| b.size()).sum()
    }

    #[test]
    fn test_loaders_cover_each_split() {
        let l = loaders(5, 4);
        assert_eq!(count(&l.train(Split::Retain)), 5);
        assert_eq!(count(&l.eval(Split::Forget)), 3);
        assert_eq!(count(&l.eval(Split::Val)), 0);
        assert_eq!(l.dataset(Split::Test).len(), 4);
    }

    #[test]
    fn test_shadow_pair_is_balanced() {
        let l = loaders(10, 4);
        let (members, non_members) = l.shadow_pair();
        assert_eq!(count(&members), 4);
        assert_eq!(count(&non_members), 4);

        let l = loaders(2, 6);
        let (members, non_members) = l.shadow_pair();
        assert_eq!(count(&members), 2);
        assert_eq!(count(&non_members), 2);
    }
}
