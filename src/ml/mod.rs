// ============================================================
// Layer 5 - ML / Embedding Layer (Burn)
// ============================================================
// Everything that trains or evaluates tensors with burn lives
// here:
//
//   subwords.rs    character n-grams and fastText hashing
//   model.rs       the two embedding tables and the
//                  negative-sampling loss
//   sampling.rs    CBOW / skip-gram example generation
//   trainer.rs     the Adam training loop
//   embeddings.rs  trained tables as a word-vector lookup
//   statistics.rs  min / max / mean / std of a dataset tensor

pub mod subwords;

/// fastText-style embedding model
pub mod model;

pub mod sampling;

/// Training loop with per-epoch metrics
pub mod trainer;

/// Word-vector lookup with out-of-vocabulary policies
pub mod embeddings;

pub mod statistics;
