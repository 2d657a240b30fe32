// ============================================================
// Layer 4 - Caption Tokenizer
// ============================================================
// Two stages, applied to the whole text of a split:
//
//   1. Sentence splitting
//      A sentence ends at '.', '!' or '?' (plus any closing
//      quotes or brackets right after it) when followed by
//      whitespace or the end of the text. A blank line also
//      ends a sentence. Single newlines are plain whitespace.
//
//   2. Word tokenisation
//      The `tokenizers` crate's BERT pre-tokenizer: split on
//      whitespace, and every punctuation character becomes a
//      token of its own.
//
//   "this bird has a red crown. it is small"
//     → [["this","bird","has","a","red","crown","."],
//        ["it","is","small"]]

use anyhow::Result;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

const TERMINATORS: [char; 3] = ['.', '!', '?'];
const CLOSERS: [char; 5] = ['"', '\'', ')', ']', '}'];

pub struct CaptionTokenizer {
    words: BertPreTokenizer,
}

impl CaptionTokenizer {
    pub fn new() -> Self {
        Self { words: BertPreTokenizer }
    }

    /// Split `text` into sentences, then each sentence into words.
    /// Sentences without any word token are dropped.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Vec<String>>> {
        let mut out = Vec::new();
        for sentence in split_sentences(text) {
            let words = self.words(sentence)?;
            if !words.is_empty() {
                out.push(words);
            }
        }
        Ok(out)
    }

    /// Word-tokenise a single sentence.
    pub fn words(&self, sentence: &str) -> Result<Vec<String>> {
        let mut pretok = PreTokenizedString::from(sentence);
        self.words
            .pre_tokenize(&mut pretok)
            .map_err(|e| anyhow::anyhow!("Word tokenisation error: {e}"))?;

        Ok(pretok
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(word, _, _)| word.to_string())
            .collect())
    }
}

impl Default for CaptionTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `text` into trimmed, non-empty sentence slices.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start     = 0usize;
    let mut chars     = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let end = if TERMINATORS.contains(&c) {
            // Swallow repeated terminators and closing punctuation: "?!", '."'
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if TERMINATORS.contains(&next) || CLOSERS.contains(&next) {
                    end = j + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            match chars.peek() {
                None => Some(end),
                Some(&(_, next)) if next.is_whitespace() => Some(end),
                _ => None,
            }
        } else if c == '\n' && starts_blank_line(&text[i + 1..]) {
            Some(i)
        } else {
            None
        };

        if let Some(end) = end {
            push_trimmed(&mut sentences, &text[start..end]);
            start = end;
        }
    }

    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

/// True when the text after a newline is only horizontal
/// whitespace up to the next newline.
fn starts_blank_line(rest: &str) -> bool {
    let line_end = rest.find('\n');
    match line_end {
        Some(n) => rest[..n].trim().is_empty(),
        None    => false,
    }
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        sentences.push(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_split_on_terminators() {
        let s = split_sentences("this bird is red. it has a short beak! wow");
        assert_eq!(s, vec!["this bird is red.", "it has a short beak!", "wow"]);
    }

    #[test]
    fn test_decimal_point_is_not_a_boundary() {
        let s = split_sentences("the wing is 2.5 inches long.");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_single_newline_joins_blank_line_splits() {
        let s = split_sentences("a small bird\nwith grey wings\n\nlarge beak");
        assert_eq!(s, vec!["a small bird\nwith grey wings", "large beak"]);
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        let s = split_sentences("it said \"tweet.\" then it flew");
        assert_eq!(s, vec!["it said \"tweet.\"", "then it flew"]);
    }

    #[test]
    fn test_words_isolate_punctuation() {
        let t = CaptionTokenizer::new();
        let w = t.words("bird's wing, white.").unwrap();
        assert_eq!(w, vec!["bird", "'", "s", "wing", ",", "white", "."]);
    }

    #[test]
    fn test_tokenize_drops_empty_sentences() {
        let t   = CaptionTokenizer::new();
        let out = t.tokenize("  \n\n  this bird is blue.  \n\n\n").unwrap();
        assert_eq!(out, vec![vec!["this", "bird", "is", "blue", "."]]);
    }
}
