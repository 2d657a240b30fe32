// ============================================================
// Layer 5 - Character n-gram Buckets
// ============================================================
// fastText represents a word as the word itself plus the
// character n-grams of "<word>", each hashed into one of
// `bucket_count` shared rows.
//
//   word "where", n = 3
//     → "<wh", "whe", "her", "ere", "re>"
//
// Hashing is 32-bit FNV-1a over UTF-8 bytes, with each byte
// sign-extended before the xor, exactly as fastText does it.
// Keeping that quirk means bucket ids line up with fastText for
// non-ASCII words too.

use serde::{Deserialize, Serialize};

const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME:  u32 = 16_777_619;

/// fastText's variant of FNV-1a.
pub fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET, |h, &b| {
        (h ^ (b as i8 as u32)).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubwordHasher {
    pub min_n:        usize,
    pub max_n:        usize,
    pub bucket_count: usize,
}

impl SubwordHasher {
    pub fn new(min_n: usize, max_n: usize, bucket_count: usize) -> Self {
        Self { min_n, max_n, bucket_count }
    }

    /// Whether n-grams are produced at all
    pub fn enabled(&self) -> bool {
        self.bucket_count > 0 && self.max_n >= self.min_n && self.max_n > 0
    }

    /// Number of bucket rows a model needs: zero when disabled
    pub fn active_buckets(&self) -> usize {
        if self.enabled() { self.bucket_count } else { 0 }
    }

    /// Character n-grams of `<word>`, shortest first per start position.
    pub fn ngrams(&self, word: &str) -> Vec<String> {
        if !self.enabled() {
            return Vec::new();
        }
        let chars: Vec<char> = format!("<{word}>").chars().collect();
        let mut out = Vec::new();

        for start in 0..chars.len() {
            for n in self.min_n.max(1)..=self.max_n {
                let end = start + n;
                if end > chars.len() {
                    break;
                }
                // A lone boundary marker is not an n-gram
                if n == 1 && (start == 0 || end == chars.len()) {
                    continue;
                }
                out.push(chars[start..end].iter().collect());
            }
        }
        out
    }

    /// Bucket index of every n-gram of `word`.
    pub fn buckets(&self, word: &str) -> Vec<u32> {
        self.ngrams(word)
            .iter()
            .map(|g| fnv1a(g.as_bytes()) % self.bucket_count as u32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigrams_of_where() {
        let h = SubwordHasher::new(3, 3, 100);
        assert_eq!(h.ngrams("where"), vec!["<wh", "whe", "her", "ere", "re>"]);
    }

    #[test]
    fn test_ngram_ranges() {
        let h = SubwordHasher::new(2, 3, 100);
        // <ab> : 2-grams <a ab b> ; 3-grams <ab ab>
        assert_eq!(h.ngrams("ab"), vec!["<a", "<ab", "ab", "ab>", "b>"]);
    }

    #[test]
    fn test_fnv_known_values() {
        // Empty input hashes to the offset basis
        assert_eq!(fnv1a(b""), FNV_OFFSET);
        // Standard FNV-1a of "a"
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
    }

    #[test]
    fn test_fnv_sign_extends_high_bytes() {
        // 0xC3 sign-extends to 0xFFFFFFC3 before the xor
        let expected = (FNV_OFFSET ^ 0xFFFF_FFC3).wrapping_mul(FNV_PRIME);
        assert_eq!(fnv1a(&[0xC3]), expected);
    }

    #[test]
    fn test_disabled_without_buckets() {
        let h = SubwordHasher::new(3, 6, 0);
        assert!(h.ngrams("bird").is_empty());
        assert!(h.buckets("bird").is_empty());
    }

    #[test]
    fn test_buckets_in_range() {
        let h = SubwordHasher::new(3, 6, 17);
        assert!(h.buckets("yellow-throated").iter().all(|&b| b < 17));
    }
}
