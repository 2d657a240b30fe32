// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `prepare` and `inspect`, and
// all their configurable flags. Defaults reproduce the
// standard CUB caption setup.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::prepare_use_case::PrepareConfig;
use crate::domain::sentinels::Sentinels;
use crate::ml::{embeddings::OovPolicy, sampling::Architecture};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tokenise, pad, embed and save the caption splits
    Prepare(PrepareArgs),

    /// Summarise the artifacts written by `prepare`
    Inspect(InspectArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ArchitectureArg {
    Cbow,
    Skipgram,
}

impl From<ArchitectureArg> for Architecture {
    fn from(a: ArchitectureArg) -> Self {
        match a {
            ArchitectureArg::Cbow     => Architecture::Cbow,
            ArchitectureArg::Skipgram => Architecture::SkipGram,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OovPolicyArg {
    /// Unknown words are composed from their character n-grams
    Compose,
    /// Unknown words abort the run
    Strict,
}

impl From<OovPolicyArg> for OovPolicy {
    fn from(p: OovPolicyArg) -> Self {
        match p {
            OovPolicyArg::Compose => OovPolicy::Compose,
            OovPolicyArg::Strict  => OovPolicy::Strict,
        }
    }
}

/// All arguments for the `prepare` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Directory containing the `cub/` caption files
    #[arg(long, default_value = "/tmp/data")]
    pub data_root: String,

    /// Words seen this many times or fewer in training become <exc>
    #[arg(long, default_value_t = 3)]
    pub min_count: u64,

    /// Tokens per caption after truncation and padding
    #[arg(long, default_value_t = 32)]
    pub seq_len: usize,

    /// Embedding dimension
    #[arg(long, default_value_t = 128)]
    pub emb_size: usize,

    /// Maximum context window of the embedding model
    #[arg(long, default_value_t = 3)]
    pub len_window: usize,

    /// Passes over the training captions
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// File stem of the saved embedding model
    #[arg(long, default_value = "fasttext")]
    pub model_name: String,

    #[arg(long, default_value = "<exc>")]
    pub sym_exc: String,

    #[arg(long, default_value = "<pad>")]
    pub sym_pad: String,

    #[arg(long, default_value = "<eos>")]
    pub sym_eos: String,

    /// Encode sentinels as constant vectors (-1 exc, 0 pad, 1 eos)
    #[arg(long)]
    pub use_fixed: bool,

    #[arg(long, value_enum, default_value_t = OovPolicyArg::Compose)]
    pub oov_policy: OovPolicyArg,

    #[arg(long, value_enum, default_value_t = ArchitectureArg::Cbow)]
    pub architecture: ArchitectureArg,

    /// Shortest character n-gram
    #[arg(long, default_value_t = 3)]
    pub min_n: usize,

    /// Longest character n-gram
    #[arg(long, default_value_t = 6)]
    pub max_n: usize,

    /// Hash buckets shared by all n-grams (0 disables subwords).
    /// Each bucket is a row of the input table, and Adam updates the
    /// whole table on every batch, so large values slow training on CPU.
    #[arg(long, default_value_t = 100_000)]
    pub buckets: usize,

    /// Negative samples per training example
    #[arg(long, default_value_t = 5)]
    pub negative: usize,

    /// Frequent-word subsampling threshold (0 disables)
    #[arg(long, default_value_t = 1e-3)]
    pub sample: f64,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI PrepareArgs into the application-layer PrepareConfig.
/// The application layer never sees clap types.
impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            data_root:     a.data_root,
            min_count:     a.min_count,
            seq_len:       a.seq_len,
            emb_size:      a.emb_size,
            len_window:    a.len_window,
            epochs:        a.epochs,
            model_name:    a.model_name,
            sentinels:     Sentinels::new(a.sym_exc, a.sym_pad, a.sym_eos),
            use_fixed:     a.use_fixed,
            oov_policy:    a.oov_policy.into(),
            architecture:  a.architecture.into(),
            min_n:         a.min_n,
            max_n:         a.max_n,
            bucket_count:  a.buckets,
            negative:      a.negative,
            sample:        a.sample,
            learning_rate: a.lr,
            batch_size:    a.batch_size,
            seed:          a.seed,
        }
    }
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Directory that `prepare` wrote into
    #[arg(long, default_value = "/tmp/data")]
    pub data_root: String,

    #[arg(long, default_value = "fasttext")]
    pub model_name: String,
}
