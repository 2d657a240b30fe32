// ============================================================
// Layer 5 - Word Embedding Lookup
// ============================================================
// A trained FastTextModel flattened into plain row-major
// matrices, ready for lookups without any burn machinery.
//
//   word_vectors   [vocab, d]   mean of each word's input row
//                               and its n-gram bucket rows
//   ngram_vectors  [buckets, d] raw bucket rows, kept for
//                               composing out-of-vocabulary words
//
// Out-of-vocabulary handling follows OovPolicy:
//   Strict   unknown word → OutOfVocabulary error
//   Compose  mean of the word's n-gram rows whose bucket was
//            touched by some vocabulary word during training;
//            no such n-gram → NoKnownSubwords error

use std::borrow::Cow;

use anyhow::Result;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::error::EmbeddingError;
use crate::domain::traits::WordVectors;
use crate::domain::vocabulary::Vocabulary;
use crate::ml::model::FastTextModel;
use crate::ml::subwords::SubwordHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OovPolicy {
    Strict,
    Compose,
}

pub struct WordEmbeddings {
    vocab:          Vocabulary,
    hasher:         SubwordHasher,
    dim:            usize,
    word_vectors:   Vec<f32>,
    ngram_vectors:  Vec<f32>,
    /// Buckets reachable from at least one vocabulary word
    seen_buckets:   Vec<bool>,
    policy:         OovPolicy,
}

impl WordEmbeddings {
    /// Flatten a trained model. The model's input matrix must have
    /// `vocab.len() + hasher.active_buckets()` rows.
    pub fn from_model<B: Backend>(
        model:  &FastTextModel<B>,
        vocab:  Vocabulary,
        hasher: SubwordHasher,
        policy: OovPolicy,
    ) -> Result<Self> {
        let [rows, dim] = model.input.weight.val().dims();
        let needed = vocab.len() + hasher.active_buckets();
        anyhow::ensure!(
            rows == needed,
            "Model has {} input rows, vocabulary and buckets need {}",
            rows,
            needed
        );

        let input: Vec<f32> = model
            .input
            .weight
            .val()
            .into_data()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read input embeddings: {e:?}"))?;

        Ok(Self::from_matrix(&input, dim, vocab, hasher, policy))
    }

    /// Build from a raw `(vocab + buckets, dim)` input matrix.
    pub fn from_matrix(
        input:  &[f32],
        dim:    usize,
        vocab:  Vocabulary,
        hasher: SubwordHasher,
        policy: OovPolicy,
    ) -> Self {
        let vocab_rows   = vocab.len();
        let bucket_count = hasher.active_buckets();
        let row          = |r: usize| &input[r * dim..(r + 1) * dim];

        let mut seen_buckets = vec![false; bucket_count];
        let mut word_vectors = vec![0.0f32; vocab_rows * dim];

        for (id, word) in vocab.words().iter().enumerate() {
            let buckets = hasher.buckets(word);
            let out     = &mut word_vectors[id * dim..(id + 1) * dim];

            add_into(out, row(id));
            for &b in &buckets {
                seen_buckets[b as usize] = true;
                add_into(out, row(vocab_rows + b as usize));
            }
            let scale = 1.0 / (1 + buckets.len()) as f32;
            out.iter_mut().for_each(|v| *v *= scale);
        }

        let ngram_vectors = input[vocab_rows * dim..(vocab_rows + bucket_count) * dim].to_vec();

        Self { vocab, hasher, dim, word_vectors, ngram_vectors, seen_buckets, policy }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vocab.id(word).is_some()
    }

    fn compose(&self, word: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut sum   = vec![0.0f32; self.dim];
        let mut count = 0usize;

        for b in self.hasher.buckets(word) {
            let b = b as usize;
            if self.seen_buckets[b] {
                add_into(&mut sum, &self.ngram_vectors[b * self.dim..(b + 1) * self.dim]);
                count += 1;
            }
        }

        if count == 0 {
            return Err(EmbeddingError::NoKnownSubwords { word: word.to_string() });
        }
        let scale = 1.0 / count as f32;
        sum.iter_mut().for_each(|v| *v *= scale);
        Ok(sum)
    }
}

impl WordVectors for WordEmbeddings {
    fn embedding_size(&self) -> usize {
        self.dim
    }

    fn vector(&self, word: &str) -> Result<Cow<'_, [f32]>, EmbeddingError> {
        if let Some(id) = self.vocab.id(word) {
            let id = id as usize;
            return Ok(Cow::Borrowed(&self.word_vectors[id * self.dim..(id + 1) * self.dim]));
        }
        match self.policy {
            OovPolicy::Strict  => Err(EmbeddingError::OutOfVocabulary { word: word.to_string() }),
            OovPolicy::Compose => self.compose(word).map(Cow::Owned),
        }
    }
}

fn add_into(acc: &mut [f32], v: &[f32]) {
    acc.iter_mut().zip(v).for_each(|(a, b)| *a += b);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// vocab ["bird"] with 8 buckets, dim 2. Word row = [1, 1],
    /// every bucket row = [3, 3].
    fn embeddings(policy: OovPolicy) -> WordEmbeddings {
        let vocab  = Vocabulary::build(&[vec!["bird".to_string()]], 1);
        let hasher = SubwordHasher::new(3, 3, 8);
        let mut input = vec![1.0, 1.0];
        input.extend(std::iter::repeat(3.0).take(8 * 2));
        WordEmbeddings::from_matrix(&input, 2, vocab, hasher, policy)
    }

    #[test]
    fn test_in_vocab_vector_averages_subwords() {
        let e = embeddings(OovPolicy::Strict);
        // "<bird>" has 4 trigrams → (1 + 4 * 3) / 5
        let v = e.vector("bird").unwrap();
        assert!((v[0] - 13.0 / 5.0).abs() < 1e-6);
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_strict_policy_rejects_unknown_words() {
        let e = embeddings(OovPolicy::Strict);
        assert_eq!(
            e.vector("birds").unwrap_err(),
            EmbeddingError::OutOfVocabulary { word: "birds".into() }
        );
    }

    #[test]
    fn test_compose_policy_uses_shared_ngrams() {
        let e = embeddings(OovPolicy::Compose);
        // "birds" shares "<bi", "bir", "ird" with "bird"
        let v = e.vector("birds").unwrap();
        assert!((v[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_compose_without_known_ngrams_fails() {
        let vocab  = Vocabulary::build(&[vec!["a".to_string()]], 1);
        // n-grams disabled: nothing can be composed
        let hasher = SubwordHasher::new(3, 6, 0);
        let e = WordEmbeddings::from_matrix(&[0.5, 0.5], 2, vocab, hasher, OovPolicy::Compose);
        assert!(matches!(e.vector("zebra"), Err(EmbeddingError::NoKnownSubwords { .. })));
    }
}
