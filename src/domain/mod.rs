// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// pipeline works with: splits, sentinels, word sets, dataset
// tensors and the lookup seams.
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - NO training code

// Lookup failures
pub mod error;

// The reserved <exc>/<pad>/<eos> tokens
pub mod sentinels;

// Train/test split naming and file layout
pub mod split;

// Dataset tensor and normalization statistics
pub mod tensor;

// Rarity set and embedding vocabulary
pub mod vocabulary;

// Abstractions the other layers implement
pub mod traits;
