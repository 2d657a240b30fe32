// ============================================================
// Layer 2 - PrepareUseCase
// ============================================================
// Orchestrates the full caption preprocessing pipeline in order:
//
//   Step 1: Load + tokenise the training split   (Layer 4 - data)
//   Step 2: Build the rarity set                  (Layer 4 - data)
//   Step 3: Truncate / terminate / pad / mask     (Layer 4 - data)
//   Step 4: Save config, train embeddings         (Layer 5 - ml)
//   Step 5: Save the embedding model              (Layer 6 - infra)
//   Step 6: Convert training sequences to tensor  (Layer 4 - data)
//   Step 7: Training-tensor statistics            (Layer 5 - ml)
//   Step 8: Repeat 1, 3 and 6 for the test split  (same rarity set,
//           same model)
//   Step 9: Persist both tensor artifacts         (Layer 6 - infra)

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    converter::EmbeddingConverter,
    loader::CaptionLoader,
    preprocessor::{rarity_set, SequencePreprocessor},
};
use crate::domain::{
    sentinels::Sentinels,
    split::{Split, PROCESSED_DIR},
    tensor::NormalizationStats,
    traits::CorpusSource,
};
use crate::infra::{
    metrics::MetricsLogger,
    model_store::{ModelMetadata, ModelStore},
    tensor_store::{TensorArtifact, TensorStore},
};
use crate::ml::{
    embeddings::{OovPolicy, WordEmbeddings},
    sampling::Architecture,
    statistics::compute_stats,
    subwords::SubwordHasher,
    trainer::{run_training, InferBackend},
};

// ─── Prepare Configuration ───────────────────────────────────────────────────
// Every knob of a preprocessing run. Saved as prepare_config.json
// next to the artifacts so a run can be reproduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub data_root:     String,
    /// Words seen at most this often in training become <exc>;
    /// also the embedding vocabulary cut-off
    pub min_count:     u64,
    pub seq_len:       usize,
    pub emb_size:      usize,
    /// Maximum context window of the embedding model
    pub len_window:    usize,
    pub epochs:        usize,
    pub model_name:    String,
    pub sentinels:     Sentinels,
    /// Encode sentinels as constant -1 / 0 / 1 vectors
    pub use_fixed:     bool,
    pub oov_policy:    OovPolicy,
    pub architecture:  Architecture,
    pub min_n:         usize,
    pub max_n:         usize,
    pub bucket_count:  usize,
    pub negative:      usize,
    pub sample:        f64,
    pub learning_rate: f64,
    pub batch_size:    usize,
    pub seed:          u64,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            data_root:     "/tmp/data".to_string(),
            min_count:     3,
            seq_len:       32,
            emb_size:      128,
            len_window:    3,
            epochs:        10,
            model_name:    "fasttext".to_string(),
            sentinels:     Sentinels::default(),
            use_fixed:     false,
            oov_policy:    OovPolicy::Compose,
            architecture:  Architecture::Cbow,
            min_n:         3,
            max_n:         6,
            bucket_count:  100_000,
            negative:      5,
            sample:        1e-3,
            learning_rate: 1e-3,
            batch_size:    256,
            seed:          42,
        }
    }
}

impl PrepareConfig {
    pub fn subword_hasher(&self) -> SubwordHasher {
        SubwordHasher::new(self.min_n, self.max_n, self.bucket_count)
    }

    pub fn processed_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_root).join(PROCESSED_DIR)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.seq_len >= 1, "seq_len must be at least 1");
        anyhow::ensure!(self.emb_size >= 1, "emb_size must be at least 1");
        anyhow::ensure!(self.batch_size >= 1, "batch_size must be at least 1");
        anyhow::ensure!(!self.model_name.is_empty(), "model_name must not be empty");
        let s = &self.sentinels;
        anyhow::ensure!(
            s.exc != s.pad && s.exc != s.eos && s.pad != s.eos,
            "Sentinel symbols must be distinct, got {:?}",
            s
        );
        Ok(())
    }
}

/// What a finished run produced, for the CLI to report.
#[derive(Debug, Clone)]
pub struct PrepareSummary {
    pub train_shape: [usize; 4],
    pub test_shape:  [usize; 4],
    pub stats:       NormalizationStats,
    pub rare_words:  usize,
    pub vocab_size:  usize,
    pub output_dir:  PathBuf,
}

// ─── PrepareUseCase ───────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline on the caption files under `data_root`.
    pub fn execute(&self) -> Result<PrepareSummary> {
        let loader = CaptionLoader::new(&self.config.data_root);
        self.execute_with(&loader)
    }

    /// Run the pipeline on any corpus source.
    pub fn execute_with<S: CorpusSource + ?Sized>(&self, source: &S) -> Result<PrepareSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load training captions ────────────────────────────────────
        let train_raw = source.load_split(Split::Train)?;
        anyhow::ensure!(!train_raw.is_empty(), "The training split has no sentences");

        // ── Step 2: Rare words, counted on the training split only ────────────
        let rare = rarity_set(&train_raw, cfg.min_count);

        // ── Step 3: Fixed-length sequences ────────────────────────────────────
        let preprocessor = SequencePreprocessor::new(cfg.seq_len, cfg.sentinels.clone())?;
        let train_seqs   = preprocessor.process_all(&train_raw, &rare);
        drop(train_raw);

        // ── Step 4: Train embeddings ──────────────────────────────────────────
        let model_store = ModelStore::new(&cfg.data_root);
        model_store.save_config(cfg)?;

        let metrics = MetricsLogger::new(cfg.processed_dir(), &format!("{}_metrics.csv", cfg.model_name))?;
        tracing::info!("Logging epoch metrics to '{}'", metrics.csv_path().display());
        let trained = run_training(cfg, &train_seqs, Some(&metrics))?;

        // ── Step 5: Save the embedding model ──────────────────────────────────
        let metadata = ModelMetadata {
            model:        trained.model_cfg.clone(),
            architecture: cfg.architecture,
            subwords:     trained.hasher,
            oov_policy:   cfg.oov_policy,
            vocabulary:   trained.vocab.clone(),
        };
        model_store.save_model(&cfg.model_name, &trained.model, &metadata)?;

        let embeddings = WordEmbeddings::from_model(
            &trained.model,
            trained.vocab,
            trained.hasher,
            cfg.oov_policy,
        )?;
        let vocab_size = embeddings.vocabulary().len();

        // ── Step 6: Training tensor ───────────────────────────────────────────
        let converter = EmbeddingConverter::new(
            cfg.seq_len,
            cfg.emb_size,
            cfg.sentinels.clone(),
            cfg.use_fixed,
        );
        let train_tensor = converter.convert(&train_seqs, &embeddings)?;
        drop(train_seqs);

        // ── Step 7: Statistics of the training tensor ─────────────────────────
        let device = Default::default();
        let stats  = compute_stats::<InferBackend>(&train_tensor, &device)?;

        // ── Step 8: Test split, with the training rarity set and model ────────
        let test_raw  = source.load_split(Split::Test)?;
        let test_seqs = preprocessor.process_all(&test_raw, &rare);
        let unknown   = test_seqs
            .iter()
            .flatten()
            .filter(|w| !cfg.sentinels.contains(w) && !embeddings.contains(w))
            .count();
        if unknown > 0 {
            tracing::warn!(
                "{} test tokens are outside the embedding vocabulary (oov_policy={:?})",
                unknown,
                cfg.oov_policy
            );
        }
        let test_tensor = converter.convert(&test_seqs, &embeddings)?;

        // ── Step 9: Persist both artifacts ────────────────────────────────────
        let tensor_store = TensorStore::new(&cfg.data_root);
        let train_shape  = train_tensor.shape();
        let test_shape   = test_tensor.shape();

        tensor_store.save(&TensorArtifact { split: Split::Train, tensor: train_tensor, stats })?;
        tensor_store.save(&TensorArtifact { split: Split::Test,  tensor: test_tensor,  stats })?;

        tracing::info!("Preprocessing complete");
        Ok(PrepareSummary {
            train_shape,
            test_shape,
            stats,
            rare_words: rare.len(),
            vocab_size,
            output_dir: tensor_store.dir().to_path_buf(),
        })
    }
}
