// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from raw caption text to embedded tensors and
// training batches.
//
//   caption text files
//       │
//       ▼
//   CaptionLoader         → reads a split, CaptionTokenizer
//       │                   splits sentences and words
//       ▼
//   SequencePreprocessor  → rare words, truncate, <eos>, pad
//       │
//       ├──────────────────────────────┐
//       ▼                              ▼
//   EmbeddingConverter            EmbeddingDataset
//   (tokens → dataset tensor)         │
//                                     ▼
//                                 EmbeddingBatcher
//                                 (examples → burn tensors)

/// Sentence splitting and word tokenisation
pub mod tokenizer;

/// Reads the caption files of a split
pub mod loader;

/// Rarity set and fixed-length sequences
pub mod preprocessor;

/// Token sequences to dataset tensors
pub mod converter;

/// Implements Burn's Dataset trait for training examples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
