// ============================================================
// Layer 5 - Training Example Sampler
// ============================================================
// Builds one epoch's worth of negative-sampling examples from
// the encoded training sentences.
//
// Per sentence:
//   1. Frequent-word subsampling: word w with count c survives
//      with probability (sqrt(c / t) + 1) * t / c, where
//      t = sample * total_count. sample = 0 keeps every word.
//   2. For each surviving position draw an effective window b
//      uniformly from 1..=window.
//   3. CBOW      → one example: context words predict the center
//      Skip-gram → one example per context word, predicted by
//                  the center
//   4. Draw `negative` ids from counts^0.75, never equal to the
//      target (unless the vocabulary has a single word).
//
// All randomness comes from the caller's RNG, so a fixed seed
// reproduces the same examples.

use anyhow::Result;
use rand::{distributions::WeightedIndex, prelude::Distribution, Rng};
use serde::{Deserialize, Serialize};

use crate::data::dataset::TrainingExample;
use crate::domain::vocabulary::Vocabulary;

/// Smoothing exponent of the negative-sampling distribution
const NEGATIVE_POWER: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Cbow,
    SkipGram,
}

pub struct ExampleSampler<'v> {
    vocab:        &'v Vocabulary,
    architecture: Architecture,
    window:       usize,
    negative:     usize,
    keep_prob:    Vec<f64>,
    noise:        WeightedIndex<f64>,
}

impl<'v> ExampleSampler<'v> {
    pub fn new(
        vocab:        &'v Vocabulary,
        architecture: Architecture,
        window:       usize,
        negative:     usize,
        sample:       f64,
    ) -> Result<Self> {
        anyhow::ensure!(!vocab.is_empty(), "Cannot sample from an empty vocabulary");
        anyhow::ensure!(window >= 1, "window must be at least 1");
        anyhow::ensure!(negative >= 1, "negative must be at least 1");

        let noise = WeightedIndex::new(
            vocab.counts().iter().map(|&c| (c as f64).powf(NEGATIVE_POWER)),
        )
        .map_err(|e| anyhow::anyhow!("Invalid negative-sampling weights: {e}"))?;

        Ok(Self {
            vocab,
            architecture,
            window,
            negative,
            keep_prob: keep_probabilities(vocab, sample),
            noise,
        })
    }

    /// Map tokens to vocabulary ids, dropping unknown tokens.
    pub fn encode(&self, sequences: &[Vec<String>]) -> Vec<Vec<u32>> {
        sequences
            .iter()
            .map(|s| s.iter().filter_map(|w| self.vocab.id(w)).collect())
            .collect()
    }

    /// All examples for one pass over `sentences`.
    pub fn epoch_examples<R: Rng>(&self, sentences: &[Vec<u32>], rng: &mut R) -> Vec<TrainingExample> {
        let mut out = Vec::new();

        for sentence in sentences {
            let kept: Vec<u32> = sentence
                .iter()
                .copied()
                .filter(|&w| {
                    let p = self.keep_prob[w as usize];
                    p >= 1.0 || rng.gen::<f64>() < p
                })
                .collect();

            for (i, &center) in kept.iter().enumerate() {
                let b       = rng.gen_range(1..=self.window);
                let lo      = i.saturating_sub(b);
                let hi      = (i + b + 1).min(kept.len());
                let context: Vec<u32> = kept[lo..i].iter().chain(&kept[i + 1..hi]).copied().collect();
                if context.is_empty() {
                    continue;
                }

                match self.architecture {
                    Architecture::Cbow => {
                        let negatives = self.negatives(center, rng);
                        out.push(TrainingExample { inputs: context, target: center, negatives });
                    }
                    Architecture::SkipGram => {
                        for c in context {
                            let negatives = self.negatives(c, rng);
                            out.push(TrainingExample { inputs: vec![center], target: c, negatives });
                        }
                    }
                }
            }
        }
        out
    }

    fn negatives<R: Rng>(&self, target: u32, rng: &mut R) -> Vec<u32> {
        let single = self.vocab.len() == 1;
        (0..self.negative)
            .map(|_| loop {
                let n = self.noise.sample(rng) as u32;
                if n != target || single {
                    break n;
                }
            })
            .collect()
    }
}

fn keep_probabilities(vocab: &Vocabulary, sample: f64) -> Vec<f64> {
    let threshold = sample * vocab.total_count() as f64;
    vocab
        .counts()
        .iter()
        .map(|&c| {
            if threshold <= 0.0 {
                return 1.0;
            }
            let c = c as f64;
            ((c / threshold).sqrt() + 1.0) * threshold / c
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn vocab(raw: &[&str]) -> Vocabulary {
        let seq: Vec<String> = raw.iter().map(|w| w.to_string()).collect();
        Vocabulary::build(&[seq], 1)
    }

    #[test]
    fn test_cbow_examples_use_context() {
        let v = vocab(&["a", "b", "c"]);
        let s = ExampleSampler::new(&v, Architecture::Cbow, 1, 2, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let ex = s.epoch_examples(&s.encode(&[vec!["a".into(), "b".into(), "c".into()]]), &mut rng);

        // window 1: a→[b], b→[a,c], c→[b]
        assert_eq!(ex.len(), 3);
        assert_eq!(ex[1].inputs, vec![0, 2]);
        assert_eq!(ex[1].target, 1);
        for e in &ex {
            assert_eq!(e.negatives.len(), 2);
            assert!(e.negatives.iter().all(|&n| n != e.target));
        }
    }

    #[test]
    fn test_skipgram_one_example_per_context_word() {
        let v = vocab(&["a", "b", "c"]);
        let s = ExampleSampler::new(&v, Architecture::SkipGram, 1, 1, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let ex = s.epoch_examples(&[vec![0, 1, 2]], &mut rng);
        assert_eq!(ex.len(), 4);
        assert!(ex.iter().all(|e| e.inputs.len() == 1));
    }

    #[test]
    fn test_encode_drops_unknown_tokens() {
        let v = vocab(&["a", "b"]);
        let s = ExampleSampler::new(&v, Architecture::Cbow, 2, 1, 0.0).unwrap();
        let enc = s.encode(&[vec!["a".into(), "zzz".into(), "b".into()]]);
        assert_eq!(enc, vec![vec![0, 1]]);
    }

    #[test]
    fn test_same_seed_same_examples() {
        let v   = vocab(&["a", "b", "c", "d", "a", "b"]);
        let s   = ExampleSampler::new(&v, Architecture::Cbow, 2, 3, 1e-3).unwrap();
        let enc = vec![vec![0, 1, 2, 3, 0, 1]];
        let a   = s.epoch_examples(&enc, &mut StdRng::seed_from_u64(1));
        let b   = s.epoch_examples(&enc, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_keep_probability_falls_with_frequency() {
        let mut words = vec!["common"; 1000];
        words.push("rare");
        let v = vocab(&words);
        let p = keep_probabilities(&v, 1e-3);
        assert!(p[0] < 0.2);
        assert!(p[1] >= 1.0);
    }

    #[test]
    fn test_empty_vocabulary_is_rejected() {
        let v = Vocabulary::build(&[], 1);
        assert!(ExampleSampler::new(&v, Architecture::Cbow, 1, 1, 0.0).is_err());
    }
}
