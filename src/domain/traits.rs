// ============================================================
// Layer 3 - Core Traits
// ============================================================
// The pipeline only sequences three collaborators:
//
//   CorpusSource  raw split text → tokenised sentences
//   WordVectors   token → embedding vector
//
// plus tensor persistence, which lives in the infra layer.
// Programming against these traits keeps the converter and the
// use case testable with small in-memory stand-ins.

use std::borrow::Cow;

use anyhow::Result;

use crate::domain::error::EmbeddingError;
use crate::domain::split::Split;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can produce the tokenised sentences of a split.
///
/// Implementations:
///   - CaptionLoader → reads the CUB caption text files
pub trait CorpusSource {
    /// One `Vec<String>` of word tokens per sentence, in file order.
    fn load_split(&self, split: Split) -> Result<Vec<Vec<String>>>;
}

// ─── WordVectors ──────────────────────────────────────────────────────────────
/// Read-only embedding lookup.
///
/// Implementations:
///   - WordEmbeddings → vectors of a trained fastText-style model
pub trait WordVectors {
    /// Length of every vector returned by `vector`
    fn embedding_size(&self) -> usize;

    /// Vector for `word`, or an error when the model cannot
    /// produce one. Borrowed for stored rows, owned for vectors
    /// composed on the fly.
    fn vector(&self, word: &str) -> Result<Cow<'_, [f32]>, EmbeddingError>;
}
