// ============================================================
// Layer 3 — Corpus Domain Type
// ============================================================
// An ordered sequence of (text, label) documents together with
// three boolean masks saying which documents belong to the
// train, validation and test regions.
//
// Layout produced by Corpus::from_sizes:
//
//   index:  0 ........ real_train | ...... train_size | ...... n
//   mask:   [ train             ][ val               ][ test    ]
//
// The masks are checked once at construction time: every
// document must sit in exactly one region.
//
// Reference: Rust Book §5 (Structs), §8 (Vectors)

use serde::{Deserialize, Serialize};

use crate::domain::error::HarnessError;

/// The three disjoint region masks over document indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitMasks {
    pub train: Vec<bool>,
    pub val:   Vec<bool>,
    pub test:  Vec<bool>,
}

impl SplitMasks {
    /// Build contiguous masks: train then val then test (tail).
    pub fn contiguous(n: usize, train_size: usize, val_size: usize, test_size: usize) -> Self {
        let real_train = train_size.saturating_sub(val_size);
        let test_start = n.saturating_sub(test_size);
        let train = (0..n).map(|i| i < real_train).collect();
        let val   = (0..n).map(|i| i >= real_train && i < train_size).collect();
        let test  = (0..n).map(|i| i >= test_start).collect();
        Self { train, val, test }
    }

    /// Check that every index is claimed by exactly one mask.
    pub fn validate(&self) -> Result<(), HarnessError> {
        for index in 0..self.train.len() {
            let claims = [self.train[index], self.val.get(index) == Some(&true), self.test.get(index) == Some(&true)]
                .iter()
                .filter(|&&c| c)
                .count();
            match claims {
                0 => return Err(HarnessError::UncoveredSample { index }),
                1 => {}
                _ => return Err(HarnessError::OverlappingMasks { index }),
            }
        }
        Ok(())
    }

    pub fn nb_train(&self) -> usize { self.train.iter().filter(|&&m| m).count() }
    pub fn nb_val(&self)   -> usize { self.val.iter().filter(|&&m| m).count() }
    pub fn nb_test(&self)  -> usize { self.test.iter().filter(|&&m| m).count() }
}

/// A labelled corpus with its region masks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    /// One cleaned document per entry
    pub texts: Vec<String>,

    /// Class index per document, into `class_names`
    pub labels: Vec<usize>,

    /// Sorted class names; fixed for the run
    pub class_names: Vec<String>,

    /// Documents in the train+val region (meta "train" lines)
    pub train_size: usize,

    /// Documents in the test region (meta "test" lines)
    pub test_size: usize,

    pub masks: SplitMasks,
}

impl Corpus {
    /// Build a corpus whose validation region is the last
    /// `floor(val_ratio * train_size)` documents of the train lines.
    pub fn from_sizes(
        texts:       Vec<String>,
        labels:      Vec<usize>,
        class_names: Vec<String>,
        train_size:  usize,
        test_size:   usize,
        val_ratio:   f64,
    ) -> Result<Self, HarnessError> {
        if texts.len() != labels.len() {
            return Err(HarnessError::CorpusMismatch {
                texts:  texts.len(),
                labels: labels.len(),
            });
        }
        let val_size = (train_size as f64 * val_ratio) as usize;
        let masks = SplitMasks::contiguous(texts.len(), train_size, val_size, test_size);
        masks.validate()?;
        Ok(Self { texts, labels, class_names, train_size, test_size, masks })
    }

    pub fn len(&self) -> usize { self.texts.len() }

    pub fn is_empty(&self) -> bool { self.texts.is_empty() }

    pub fn num_classes(&self) -> usize { self.class_names.len() }
}
