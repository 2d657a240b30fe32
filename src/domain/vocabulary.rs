// ============================================================
// Layer 3 - Vocabulary Types
// ============================================================
// Two word sets drive the pipeline:
//
//   RaritySet   words whose training-split count is at or below
//               `min_count`; replaced by <exc> in BOTH splits
//
//   Vocabulary  words the embedding model learns a vector for,
//               counted over the preprocessed training sequences
//               and kept when count >= min_count
//
// Because rare words are already <exc> by the time the
// vocabulary is built, every training token ends up in the
// vocabulary. Test-only words do not; see OovPolicy.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

// ─── RaritySet ────────────────────────────────────────────────────────────────
/// Rare words in first-seen order. Order is kept so the set
/// serialises identically across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RaritySet {
    ordered: Vec<String>,
    lookup:  HashSet<String>,
}

impl RaritySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: impl Into<String>) {
        let word = word.into();
        if self.lookup.insert(word.clone()) {
            self.ordered.push(word);
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.lookup.contains(word)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.ordered
    }
}

impl<S: Into<String>> FromIterator<S> for RaritySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for word in iter {
            set.insert(word);
        }
        set
    }
}

impl From<Vec<String>> for RaritySet {
    fn from(words: Vec<String>) -> Self {
        words.into_iter().collect()
    }
}

impl From<RaritySet> for Vec<String> {
    fn from(set: RaritySet) -> Self {
        set.ordered
    }
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyRecord {
    pub words:  Vec<String>,
    pub counts: Vec<u64>,
}

/// Embedding-model vocabulary, most frequent word first.
/// Word ids are positions in this ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VocabularyRecord", into = "VocabularyRecord")]
pub struct Vocabulary {
    words:  Vec<String>,
    counts: Vec<u64>,
    index:  HashMap<String, u32>,
}

impl Vocabulary {
    /// Count every token in `sequences` and keep those seen at
    /// least `min_count` times. Ties keep first-seen order.
    pub fn build(sequences: &[Vec<String>], min_count: u64) -> Self {
        let mut order: Vec<&str>          = Vec::new();
        let mut freq:  HashMap<&str, u64> = HashMap::new();

        for token in sequences.iter().flatten() {
            let slot = freq.entry(token.as_str()).or_insert_with(|| {
                order.push(token.as_str());
                0
            });
            *slot += 1;
        }

        let mut kept: Vec<(&str, u64)> = order
            .into_iter()
            .map(|w| (w, freq[w]))
            .filter(|&(_, c)| c >= min_count)
            .collect();
        // sort_by is stable, so equal counts stay in first-seen order
        kept.sort_by(|a, b| b.1.cmp(&a.1));

        let (words, counts): (Vec<String>, Vec<u64>) =
            kept.into_iter().map(|(w, c)| (w.to_string(), c)).unzip();
        VocabularyRecord { words, counts }.into()
    }

    pub fn id(&self, word: &str) -> Option<u32> {
        self.index.get(word).copied()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Sum of all retained word counts
    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl From<VocabularyRecord> for Vocabulary {
    fn from(r: VocabularyRecord) -> Self {
        let index = r
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect();
        Self { words: r.words, counts: r.counts, index }
    }
}

impl From<Vocabulary> for VocabularyRecord {
    fn from(v: Vocabulary) -> Self {
        Self { words: v.words, counts: v.counts }
    }
}
