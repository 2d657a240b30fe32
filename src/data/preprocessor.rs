// ============================================================
// Layer 4 - Sequence Preprocessor
// ============================================================
// Turns variable-length word sequences into fixed-length ones.
//
// Rare-word detection (training split only):
//   count every token in first-seen order, then collect the
//   words whose count is at or below `min_count`.
//
// Per sequence, applied in order:
//   1. Truncate to seq_len - 1 tokens
//   2. Append <eos>
//   3. Right-pad with <pad> up to exactly seq_len tokens
//   4. Replace every rare caption word with <exc>; the appended
//      <eos> and <pad> tokens are never masked
//
// Example, rare = {"foo"}, seq_len = 4:
//   ["foo", "bar"] → ["<exc>", "bar", "<eos>", "<pad>"]
//
// The same RaritySet is applied to the test split unchanged.

use std::collections::HashMap;

use anyhow::Result;

use crate::domain::sentinels::Sentinels;
use crate::domain::vocabulary::RaritySet;

// ─── OccurrenceRegister ───────────────────────────────────────────────────────
/// Word counter that remembers first-seen order.
#[derive(Debug, Default)]
pub struct OccurrenceRegister {
    order:  Vec<String>,
    counts: HashMap<String, u64>,
}

impl OccurrenceRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<'a>(&mut self, words: impl IntoIterator<Item = &'a String>) {
        for w in words {
            match self.counts.get_mut(w) {
                Some(c) => *c += 1,
                None => {
                    self.order.push(w.clone());
                    self.counts.insert(w.clone(), 1);
                }
            }
        }
    }

    /// (word, count) pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.order.iter().map(|w| (w.as_str(), self.counts[w]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Words seen `min_count` times or fewer.
    pub fn rare_words(&self, min_count: u64) -> RaritySet {
        self.iter()
            .filter(|&(_, occ)| occ <= min_count)
            .map(|(w, _)| w)
            .collect()
    }
}

/// Count `sequences` and return the rarity set in one step.
pub fn rarity_set(sequences: &[Vec<String>], min_count: u64) -> RaritySet {
    let mut register = OccurrenceRegister::new();
    for words in sequences {
        register.update(words);
    }
    let rare = register.rare_words(min_count);
    tracing::info!(
        "{} distinct words, {} at or below min_count={}",
        register.len(),
        rare.len(),
        min_count
    );
    rare
}

// ─── SequencePreprocessor ─────────────────────────────────────────────────────
pub struct SequencePreprocessor {
    seq_len:   usize,
    sentinels: Sentinels,
}

impl SequencePreprocessor {
    /// `seq_len` must be at least 1 so the end marker fits.
    pub fn new(seq_len: usize, sentinels: Sentinels) -> Result<Self> {
        anyhow::ensure!(seq_len >= 1, "seq_len must be at least 1, got {seq_len}");
        Ok(Self { seq_len, sentinels })
    }

    /// Truncate, terminate, pad and mask a single sequence.
    pub fn process(&self, words: &[String], rare: &RaritySet) -> Vec<String> {
        let keep    = words.len().min(self.seq_len - 1);
        let mut out = Vec::with_capacity(self.seq_len);

        out.extend(words[..keep].iter().map(|w| {
            if rare.contains(w) { self.sentinels.exc.clone() } else { w.clone() }
        }));
        out.push(self.sentinels.eos.clone());
        out.resize(self.seq_len, self.sentinels.pad.clone());
        out
    }

    pub fn process_all(&self, sequences: &[Vec<String>], rare: &RaritySet) -> Vec<Vec<String>> {
        sequences.iter().map(|s| self.process(s, rare)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_rare_word_padding_example() {
        let p    = SequencePreprocessor::new(4, Sentinels::default()).unwrap();
        let rare = RaritySet::from_iter(["foo"]);
        assert_eq!(
            p.process(&words(&["foo", "bar"]), &rare),
            words(&["<exc>", "bar", "<eos>", "<pad>"])
        );
    }

    #[test]
    fn test_truncation_example() {
        let p = SequencePreprocessor::new(3, Sentinels::default()).unwrap();
        assert_eq!(
            p.process(&words(&["a", "b", "c", "d"]), &RaritySet::new()),
            words(&["a", "b", "<eos>"])
        );
    }

    #[test]
    fn test_length_and_single_eos_for_all_inputs() {
        let p    = SequencePreprocessor::new(5, Sentinels::default()).unwrap();
        let rare = RaritySet::new();
        for n in 0..10 {
            let input: Vec<String> = (0..n).map(|i| format!("w{i}")).collect();
            let out = p.process(&input, &rare);
            assert_eq!(out.len(), 5);
            assert_eq!(out.iter().filter(|w| *w == "<eos>").count(), 1);
        }
    }

    #[test]
    fn test_empty_sequence_is_eos_then_pads() {
        let p = SequencePreprocessor::new(3, Sentinels::default()).unwrap();
        assert_eq!(p.process(&[], &RaritySet::new()), words(&["<eos>", "<pad>", "<pad>"]));
    }

    #[test]
    fn test_only_rare_tokens_change() {
        let p    = SequencePreprocessor::new(6, Sentinels::default()).unwrap();
        let rare = RaritySet::from_iter(["grey", "tiny"]);
        let out  = p.process(&words(&["a", "tiny", "grey", "bird"]), &rare);
        assert_eq!(out, words(&["a", "<exc>", "<exc>", "bird", "<eos>", "<pad>"]));
    }

    #[test]
    fn test_rare_word_matching_a_sentinel_keeps_the_end_marker() {
        let sentinels = Sentinels::new("<exc>", "<pad>", "end");
        let p    = SequencePreprocessor::new(4, sentinels).unwrap();
        let rare = RaritySet::from_iter(["end"]);
        assert_eq!(
            p.process(&words(&["the", "end"]), &rare),
            words(&["the", "<exc>", "end", "<pad>"])
        );
        assert_eq!(p.process(&words(&["the"]), &rare), words(&["the", "end", "<pad>", "<pad>"]));
    }

    #[test]
    fn test_zero_seq_len_is_an_error() {
        assert!(SequencePreprocessor::new(0, Sentinels::default()).is_err());
    }

    #[test]
    fn test_rarity_threshold_is_inclusive() {
        let seqs = vec![
            words(&["red", "red", "red", "blue"]),
            words(&["blue", "red", "green"]),
        ];
        // red=4, blue=2, green=1
        let rare = rarity_set(&seqs, 2);
        assert_eq!(rare.words(), &["blue", "green"]);
    }

    #[test]
    fn test_register_counts_in_order() {
        let mut reg = OccurrenceRegister::new();
        reg.update(&words(&["b", "a", "b"]));
        let seen: Vec<_> = reg.iter().collect();
        assert_eq!(seen, vec![("b", 2), ("a", 1)]);
        assert_eq!(reg.len(), 2);
    }
}
