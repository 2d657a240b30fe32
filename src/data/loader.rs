// ============================================================
// Layer 4 - Caption Loader
// ============================================================
// Reads the raw caption text of a split and tokenises it.
//
// File layout under the data root:
//   cub/
//     text_trainvalclasses.txt   ← training split
//     text_testclasses.txt       ← test split
//
// Both files are plain UTF-8 text. A missing file or invalid
// UTF-8 is fatal: the error names the offending path.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::tokenizer::CaptionTokenizer;
use crate::domain::split::Split;
use crate::domain::traits::CorpusSource;

/// Loads caption splits from a data root directory.
/// Implements the CorpusSource trait from Layer 3.
pub struct CaptionLoader {
    /// Directory containing the `cub/` folder
    root:      PathBuf,
    tokenizer: CaptionTokenizer,
}

impl CaptionLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root:      root.into(),
            tokenizer: CaptionTokenizer::new(),
        }
    }
}

impl CorpusSource for CaptionLoader {
    fn load_split(&self, split: Split) -> Result<Vec<Vec<String>>> {
        let path = split.source_path(&self.root);

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {} captions from '{}'", split, path.display()))?;

        let sentences = self
            .tokenizer
            .tokenize(&text)
            .with_context(|| format!("Cannot tokenise '{}'", path.display()))?;

        tracing::info!(
            "Loaded {} split: {} sentences, {} tokens",
            split,
            sentences.len(),
            sentences.iter().map(Vec::len).sum::<usize>()
        );
        Ok(sentences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_split_reads_and_tokenizes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("cub")).unwrap();
        fs::write(
            dir.path().join(Split::Train.source_file()),
            "this bird is red. the beak is short.\n",
        )
        .unwrap();

        let loader    = CaptionLoader::new(dir.path());
        let sentences = loader.load_split(Split::Train).unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1], vec!["the", "beak", "is", "short", "."]);
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = CaptionLoader::new(dir.path());
        let err    = loader.load_split(Split::Test).unwrap_err();
        assert!(format!("{err:#}").contains("text_testclasses.txt"));
    }
}
