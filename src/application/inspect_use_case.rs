// ============================================================
// Layer 2 - InspectUseCase
// ============================================================
// Reads back what `prepare` wrote and summarises it: tensor
// shapes, stored statistics and the embedding model's size.
// Nothing is recomputed. The model weights are loaded into a
// lookup table so a truncated or mismatched weight file fails
// here rather than downstream.

use anyhow::Result;

use crate::application::prepare_use_case::PrepareConfig;
use crate::domain::split::Split;
use crate::domain::tensor::NormalizationStats;
use crate::domain::traits::WordVectors;
use crate::infra::{model_store::ModelStore, tensor_store::TensorStore};
use crate::ml::{embeddings::OovPolicy, sampling::Architecture, trainer::InferBackend};

#[derive(Debug, Clone)]
pub struct ArtifactSummary {
    pub split: Split,
    pub shape: [usize; 4],
    pub stats: NormalizationStats,
}

#[derive(Debug, Clone)]
pub struct ModelSummary {
    pub vocab_size:     usize,
    pub embedding_size: usize,
    pub bucket_count:   usize,
    pub architecture:   Architecture,
    pub oov_policy:     OovPolicy,
    /// Most frequent words, highest count first
    pub top_words:      Vec<(String, u64)>,
}

#[derive(Debug, Clone)]
pub struct InspectReport {
    pub artifacts:        Vec<ArtifactSummary>,
    pub model:            ModelSummary,
    /// Run configuration, when prepare_config.json is present
    pub config:           Option<PrepareConfig>,
    /// Train and test carry the same statistics
    pub stats_consistent: bool,
}

pub struct InspectUseCase {
    data_root:  String,
    model_name: String,
}

impl InspectUseCase {
    pub fn new(data_root: String, model_name: String) -> Self {
        Self { data_root, model_name }
    }

    pub fn execute(&self) -> Result<InspectReport> {
        let tensor_store = TensorStore::new(&self.data_root);

        let artifacts = Split::ALL
            .iter()
            .map(|&split| {
                let a = tensor_store.load(split)?;
                Ok(ArtifactSummary { split, shape: a.tensor.shape(), stats: a.stats })
            })
            .collect::<Result<Vec<_>>>()?;

        let stats_consistent = artifacts.windows(2).all(|w| same_stats(&w[0].stats, &w[1].stats));
        if !stats_consistent {
            tracing::warn!("Train and test artifacts carry different statistics");
        }

        let model_store = ModelStore::new(&self.data_root);
        let (embeddings, meta) =
            model_store.load_embeddings::<InferBackend>(&self.model_name, &Default::default())?;
        let vocab = &meta.vocabulary;
        let top_words = vocab
            .words()
            .iter()
            .zip(vocab.counts())
            .take(10)
            .map(|(w, &c)| (w.clone(), c))
            .collect();

        let model = ModelSummary {
            vocab_size:     vocab.len(),
            embedding_size: embeddings.embedding_size(),
            bucket_count:   meta.model.bucket_count,
            architecture:   meta.architecture,
            oov_policy:     meta.oov_policy,
            top_words,
        };

        for a in &artifacts {
            if a.shape[3] != model.embedding_size {
                tracing::warn!(
                    "{} tensor has embedding size {}, model has {}",
                    a.split,
                    a.shape[3],
                    model.embedding_size
                );
            }
        }

        let config = match model_store.load_config() {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!("No run configuration: {e:#}");
                None
            }
        };

        Ok(InspectReport { artifacts, model, config, stats_consistent })
    }
}

/// Bitwise equality, so two NaN stds still count as the same value.
fn same_stats(a: &NormalizationStats, b: &NormalizationStats) -> bool {
    [(a.min, b.min), (a.max, b.max), (a.mean, b.mean), (a.std, b.std)]
        .iter()
        .all(|(x, y)| x.to_bits() == y.to_bits())
}
