// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the corpus files on disk
// all the way to backend tensor batches.
//
// The pipeline flows in this order:
//
//   meta + text files
//       │
//       ▼
//   CorpusLoader      → reads documents, labels, split masks
//       │
//       ▼
//   Preprocessor      → cleans text (backslashes, whitespace)
//       │
//       ▼
//   encode_corpus     → [CLS] ids [SEP] + padding per document
//       │
//       ▼
//   partition         → retain / forget / val / test
//       │
//       ▼
//   TextDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   ClassifyBatcher   → stacks samples into tensor batches
//       │
//       ▼
//   SplitLoaders      → one DataLoader per split
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads TextGCN-style meta and text files
pub mod loader;

/// Cleans and normalises raw text
pub mod preprocessor;

/// Tokenises and pads the corpus
pub mod encoder;

/// Implements Burn's Dataset trait for encoded samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Cuts the corpus into retain/forget/val/test
pub mod splitter;

/// Per-split DataLoaders and the shadow attack pair
pub mod loaders;
