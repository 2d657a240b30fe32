// ============================================================
// Layer 3 - Dataset Splits
// ============================================================
// The CUB caption corpus ships as two plain text files, one per
// split. The class sets of the two splits are disjoint, so the
// test split routinely contains words never seen in training.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Relative directory (under the data root) holding the processed outputs
pub const PROCESSED_DIR: &str = "cub/processed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Test];

    /// Raw caption file, relative to the data root
    pub fn source_file(self) -> &'static str {
        match self {
            Split::Train => "cub/text_trainvalclasses.txt",
            Split::Test  => "cub/text_testclasses.txt",
        }
    }

    /// File stem of the tensor artifact written for this split
    pub fn artifact_stem(self) -> &'static str {
        match self {
            Split::Train => "cub-cap-train",
            Split::Test  => "cub-cap-test",
        }
    }

    pub fn source_path(self, data_root: &Path) -> PathBuf {
        data_root.join(self.source_file())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Split::Train => "train",
            Split::Test  => "test",
        })
    }
}
