// ============================================================
// Layer 4 - Embedding Converter
// ============================================================
// Turns preprocessed token sequences into a dataset tensor of
// shape (N, 1, seq_len, embedding_size).
//
// For every token position:
//   - fixed mode and the token is a sentinel
//       → constant vector (-1 / 0 / 1, see Sentinels)
//   - otherwise
//       → the embedding model's vector for the token
//
// Positions past the end of a sequence stay zero. Preprocessed
// sequences are always exactly seq_len long, so in practice
// every position is written.
//
// Any lookup failure aborts the whole conversion.

use anyhow::{Context, Result};

use crate::domain::error::EmbeddingError;
use crate::domain::sentinels::Sentinels;
use crate::domain::tensor::DatasetTensor;
use crate::domain::traits::WordVectors;

pub struct EmbeddingConverter {
    seq_len:        usize,
    embedding_size: usize,
    sentinels:      Sentinels,
    /// Use constant vectors for sentinels instead of learned ones
    use_fixed:      bool,
}

impl EmbeddingConverter {
    pub fn new(seq_len: usize, embedding_size: usize, sentinels: Sentinels, use_fixed: bool) -> Self {
        Self { seq_len, embedding_size, sentinels, use_fixed }
    }

    pub fn convert<V>(&self, sequences: &[Vec<String>], vectors: &V) -> Result<DatasetTensor>
    where
        V: WordVectors + ?Sized,
    {
        if vectors.embedding_size() != self.embedding_size {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.embedding_size,
                actual:   vectors.embedding_size(),
            }
            .into());
        }

        let mut dataset = DatasetTensor::zeros(sequences.len(), self.seq_len, self.embedding_size);

        for (i, words) in sequences.iter().enumerate() {
            for (j, w) in words.iter().take(self.seq_len).enumerate() {
                let slot = dataset.position_mut(i, j);

                if let Some(value) = self.fixed_value(w) {
                    slot.fill(value);
                    continue;
                }

                let v = vectors
                    .vector(w)
                    .with_context(|| format!("Embedding lookup failed in sequence {i}, position {j}"))?;
                if v.len() != self.embedding_size {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: self.embedding_size,
                        actual:   v.len(),
                    }
                    .into());
                }
                slot.copy_from_slice(&v);
            }
        }

        tracing::debug!("Converted {} sequences to shape {:?}", sequences.len(), dataset.shape());
        Ok(dataset)
    }

    fn fixed_value(&self, token: &str) -> Option<f32> {
        if self.use_fixed {
            self.sentinels.fixed_value(token)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::collections::HashMap;

    /// In-memory lookup: each word maps to a constant vector.
    struct TableVectors {
        dim:   usize,
        table: HashMap<String, f32>,
    }

    impl TableVectors {
        fn new(dim: usize, entries: &[(&str, f32)]) -> Self {
            let table = entries.iter().map(|(w, v)| (w.to_string(), *v)).collect();
            Self { dim, table }
        }
    }

    impl WordVectors for TableVectors {
        fn embedding_size(&self) -> usize {
            self.dim
        }

        fn vector(&self, word: &str) -> Result<Cow<'_, [f32]>, EmbeddingError> {
            self.table
                .get(word)
                .map(|&v| Cow::Owned(vec![v; self.dim]))
                .ok_or_else(|| EmbeddingError::OutOfVocabulary { word: word.to_string() })
        }
    }

    fn seq(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|w| w.to_string()).collect()
    }

    fn table() -> TableVectors {
        TableVectors::new(
            3,
            &[("bird", 5.0), ("red", 7.0), ("<eos>", 0.5), ("<pad>", 0.25), ("<exc>", 0.75)],
        )
    }

    #[test]
    fn test_output_shape() {
        let c   = EmbeddingConverter::new(4, 3, Sentinels::default(), false);
        let out = c
            .convert(
                &[seq(&["bird", "red", "<eos>", "<pad>"]), seq(&["red", "<eos>", "<pad>", "<pad>"])],
                &table(),
            )
            .unwrap();
        assert_eq!(out.shape(), [2, 1, 4, 3]);
        assert_eq!(out.position(0, 1), &[7.0, 7.0, 7.0]);
        assert_eq!(out.position(1, 3), &[0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_fixed_mode_uses_constants() {
        let c   = EmbeddingConverter::new(4, 3, Sentinels::default(), true);
        let out = c.convert(&[seq(&["<exc>", "bird", "<eos>", "<pad>"])], &table()).unwrap();
        assert_eq!(out.position(0, 0), &[-1.0, -1.0, -1.0]);
        assert_eq!(out.position(0, 1), &[5.0, 5.0, 5.0]);
        assert_eq!(out.position(0, 2), &[1.0, 1.0, 1.0]);
        assert_eq!(out.position(0, 3), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_short_sequence_leaves_zeros() {
        let c   = EmbeddingConverter::new(4, 3, Sentinels::default(), false);
        let out = c.convert(&[seq(&["bird"])], &table()).unwrap();
        assert_eq!(out.position(0, 0), &[5.0, 5.0, 5.0]);
        assert_eq!(out.position(0, 1), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unknown_word_fails() {
        let c   = EmbeddingConverter::new(2, 3, Sentinels::default(), false);
        let err = c.convert(&[seq(&["owl", "<eos>"])], &table()).unwrap_err();
        let oov = err.downcast_ref::<EmbeddingError>().unwrap();
        assert_eq!(oov, &EmbeddingError::OutOfVocabulary { word: "owl".into() });
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let c   = EmbeddingConverter::new(2, 8, Sentinels::default(), false);
        let err = c.convert(&[seq(&["bird", "<eos>"])], &table()).unwrap_err();
        assert!(err.to_string().contains("expected 8"));
    }
}
