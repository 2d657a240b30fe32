// ============================================================
// Layer 3 - Sentinel Symbols
// ============================================================
// Three reserved tokens are injected into every caption:
//
//   <exc>  replaces a word that was too rare in the training split
//   <pad>  right-pads a caption up to the fixed sequence length
//   <eos>  marks the end of the caption text
//
// None of them can ever appear in the rarity set, because the
// rarity set is computed from raw tokenised text before any
// sentinel has been inserted.
//
// The optional "fixed vector" encoding maps each sentinel to a
// constant broadcast across the embedding dimension:
//   <exc> → -1.0, <pad> → 0.0, <eos> → 1.0

use serde::{Deserialize, Serialize};

/// The reserved tokens used by the sequence preprocessor and
/// the embedding converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentinels {
    /// Replacement for words at or below the rarity threshold
    pub exc: String,
    /// Right-padding token
    pub pad: String,
    /// End-of-sequence marker, appended exactly once
    pub eos: String,
}

impl Sentinels {
    pub fn new(
        exc: impl Into<String>,
        pad: impl Into<String>,
        eos: impl Into<String>,
    ) -> Self {
        Self {
            exc: exc.into(),
            pad: pad.into(),
            eos: eos.into(),
        }
    }

    /// Constant used by the fixed-vector encoding, or None if
    /// `token` is an ordinary word.
    pub fn fixed_value(&self, token: &str) -> Option<f32> {
        if token == self.exc {
            Some(-1.0)
        } else if token == self.pad {
            Some(0.0)
        } else if token == self.eos {
            Some(1.0)
        } else {
            None
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.fixed_value(token).is_some()
    }
}

impl Default for Sentinels {
    fn default() -> Self {
        Self::new("<exc>", "<pad>", "<eos>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_values() {
        let s = Sentinels::default();
        assert_eq!(s.fixed_value("<exc>"), Some(-1.0));
        assert_eq!(s.fixed_value("<pad>"), Some(0.0));
        assert_eq!(s.fixed_value("<eos>"), Some(1.0));
        assert_eq!(s.fixed_value("bird"), None);
    }

    #[test]
    fn test_custom_symbols() {
        let s = Sentinels::new("[X]", "[P]", "[E]");
        assert!(s.contains("[P]"));
        assert!(!s.contains("<pad>"));
    }
}
