// ============================================================
// Layer 4 — Retain / Forget / Val / Test Partitioner
// ============================================================
// Splits an encoded corpus into the four experiment splits by
// fixed counts. No shuffling happens here: corpus order decides
// membership.
//
//   nb_forget = floor(nb_train * forget_ratio)
//   nb_retain = nb_train - nb_forget
//
//   index:  0 ... nb_retain | ... +nb_forget | ... +nb_val |   ...   | n-nb_test ... n
//   split:  [ retain       ][ forget        ][ val        ]           [ test         ]
//
// Precondition: the corpus is laid out train → val → test with
// the test region contiguous at the tail. This is not checked;
// a corpus built any other way yields wrong splits.

use crate::domain::corpus::SplitMasks;
use crate::domain::error::HarnessError;

/// Split sizes derived once from the masks and the forget ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionCounts {
    pub nb_train:  usize,
    pub nb_val:    usize,
    pub nb_test:   usize,
    pub nb_retain: usize,
    pub nb_forget: usize,
}

impl PartitionCounts {
    pub fn new(
        nb_train:     usize,
        nb_val:       usize,
        nb_test:      usize,
        forget_ratio: f64,
    ) -> Result<Self, HarnessError> {
        if !(0.0..1.0).contains(&forget_ratio) {
            return Err(HarnessError::InvalidForgetRatio(forget_ratio));
        }
        let nb_forget = (nb_train as f64 * forget_ratio) as usize;
        let nb_retain = nb_train - nb_forget;
        Ok(Self { nb_train, nb_val, nb_test, nb_retain, nb_forget })
    }

    pub fn from_masks(masks: &SplitMasks, forget_ratio: f64) -> Result<Self, HarnessError> {
        Self::new(masks.nb_train(), masks.nb_val(), masks.nb_test(), forget_ratio)
    }
}

/// The four splits, each keeping corpus order.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
    pub retain: Vec<T>,
    pub forget: Vec<T>,
    pub val:    Vec<T>,
    pub test:   Vec<T>,
}

/// Cut `samples` into retain/forget/val (consecutive from the
/// front) and test (the last `nb_test` samples).
pub fn partition<T: Clone>(samples: &[T], counts: &PartitionCounts) -> Partition<T> {
    let len = samples.len();
    let mut curr = 0usize;
    let mut take = |num: usize| {
        let start = curr.min(len);
        let end   = (curr + num).min(len);
        curr += num;
        samples[start..end].to_vec()
    };

    let retain = take(counts.nb_retain);
    let forget = take(counts.nb_forget);
    let val    = take(counts.nb_val);
    let test   = samples[len.saturating_sub(counts.nb_test)..].to_vec();

    tracing::debug!(
        "Partition: {} retain, {} forget, {} val, {} test",
        retain.len(), forget.len(), val.len(), test.len(),
    );

    Partition { retain, forget, val, test }
}
