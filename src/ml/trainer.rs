// ============================================================
// Layer 5 - Embedding Training Loop
// ============================================================
// Trains the fastText-style model on the preprocessed training
// sequences using Burn's DataLoader and Adam.
//
//   1. Count the vocabulary (count >= min_count)
//   2. Precompute every word's input rows: its own row followed
//      by its n-gram bucket rows
//   3. Per epoch: sample fresh examples (subsampling, window
//      draws and negatives all change between epochs), batch
//      them and take one Adam step per batch
//
// Training runs on TrainBackend (Autodiff<NdArray>);
// model.valid() hands back the trained weights on the inner
// backend for lookups and saving.

use std::sync::Arc;

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::application::prepare_use_case::PrepareConfig;
use crate::data::{
    batcher::{EmbeddingBatcher, SubwordTable},
    dataset::EmbeddingDataset,
};
use crate::domain::vocabulary::Vocabulary;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{FastTextConfig, FastTextModel};
use crate::ml::sampling::ExampleSampler;
use crate::ml::subwords::SubwordHasher;

pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
pub type InferBackend = burn::backend::NdArray;

/// Everything a finished training run produces.
pub struct TrainedEmbeddings<B: Backend> {
    pub model:       FastTextModel<B>,
    pub model_cfg:   FastTextConfig,
    pub vocab:       Vocabulary,
    pub hasher:      SubwordHasher,
    /// Average loss of each epoch, in order
    pub epoch_loss:  Vec<f64>,
}

/// Train on the default NdArray device.
pub fn run_training(
    cfg:       &PrepareConfig,
    sequences: &[Vec<String>],
    metrics:   Option<&MetricsLogger>,
) -> Result<TrainedEmbeddings<InferBackend>> {
    let device = burn::backend::ndarray::NdArrayDevice::default();
    tracing::info!("Using NdArray device: {:?}", device);
    train_loop::<TrainBackend>(cfg, sequences, metrics, &device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:       &PrepareConfig,
    sequences: &[Vec<String>],
    metrics:   Option<&MetricsLogger>,
    device:    &B::Device,
) -> Result<TrainedEmbeddings<B::InnerBackend>> {

    // ── Vocabulary + subword rows ─────────────────────────────────────────────
    let vocab = Vocabulary::build(sequences, cfg.min_count);
    anyhow::ensure!(
        !vocab.is_empty(),
        "No word occurs at least {} times in the training sequences",
        cfg.min_count
    );
    let hasher   = cfg.subword_hasher();
    let subwords = subword_table(&vocab, &hasher);
    tracing::info!(
        "Vocabulary: {} words, {} n-gram buckets",
        vocab.len(),
        hasher.active_buckets()
    );

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = FastTextConfig::new(vocab.len(), hasher.active_buckets(), cfg.emb_size);
    let mut model: FastTextModel<B> = model_cfg.init(device);
    tracing::info!(
        "Model ready: {:?}, {} input rows, dim={}",
        cfg.architecture,
        model_cfg.input_rows(),
        cfg.emb_size
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    let sampler = ExampleSampler::new(
        &vocab,
        cfg.architecture,
        cfg.len_window,
        cfg.negative,
        cfg.sample,
    )?;
    let encoded = sampler.encode(sequences);
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut epoch_loss = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {
        let examples      = sampler.epoch_examples(&encoded, &mut rng);
        let example_count = examples.len();

        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        if examples.is_empty() {
            // One-word sentences (seq_len 1) or heavy subsampling leave no context pairs
            tracing::warn!("Epoch {} has no training examples, skipping", epoch);
        } else {
            let batcher = EmbeddingBatcher::<B>::new(device.clone(), subwords.clone());
            let loader  = DataLoaderBuilder::new(batcher)
                .batch_size(cfg.batch_size)
                .shuffle(cfg.seed.wrapping_add(epoch as u64))
                .num_workers(1)
                .build(EmbeddingDataset::new(examples));

            for batch in loader.iter() {
                let loss = model.forward_loss(
                    batch.bag_ids,
                    batch.bag_weights,
                    batch.targets,
                    batch.negatives,
                );

                loss_sum += loss.clone().into_scalar().elem::<f64>();
                batches  += 1;

                // Backward pass + Adam update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(cfg.learning_rate, model, grads);
            }
        }

        let avg_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
        epoch_loss.push(avg_loss);

        println!(
            "Epoch {:>3}/{} | examples={} | loss={:.4}",
            epoch, cfg.epochs, example_count, avg_loss,
        );
        tracing::debug!("Epoch {} finished after {} batches", epoch, batches);

        if let Some(logger) = metrics {
            logger.log(&EpochMetrics::new(epoch, example_count, avg_loss))?;
        }
    }

    tracing::info!("Embedding training complete");
    Ok(TrainedEmbeddings {
        model: model.valid(),
        model_cfg,
        vocab,
        hasher,
        epoch_loss,
    })
}

/// Input-matrix rows of every vocabulary word, indexed by word id.
pub fn subword_table(vocab: &Vocabulary, hasher: &SubwordHasher) -> SubwordTable {
    let offset = vocab.len() as u32;
    let rows = vocab
        .words()
        .iter()
        .enumerate()
        .map(|(id, word)| {
            std::iter::once(id as u32)
                .chain(hasher.buckets(word).into_iter().map(|b| offset + b))
                .collect()
        })
        .collect();
    Arc::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::sampling::Architecture;

    fn corpus() -> Vec<Vec<String>> {
        let sentences = [
            "a small bird with a red crown",
            "a large bird with a black crown",
            "a small bird with a yellow belly",
            "a large bird with a white belly",
        ];
        sentences
            .iter()
            .cycle()
            .take(24)
            .map(|s| s.split(' ').map(String::from).collect())
            .collect()
    }

    fn tiny_config() -> PrepareConfig {
        PrepareConfig {
            min_count:     1,
            emb_size:      8,
            len_window:    2,
            epochs:        6,
            bucket_count:  64,
            negative:      3,
            sample:        0.0,
            learning_rate: 0.05,
            batch_size:    16,
            seed:          11,
            ..PrepareConfig::default()
        }
    }

    #[test]
    fn test_loss_decreases_on_repetitive_corpus() {
        let cfg     = tiny_config();
        let device  = Default::default();
        let trained = train_loop::<TrainBackend>(&cfg, &corpus(), None, &device).unwrap();

        assert_eq!(trained.epoch_loss.len(), cfg.epochs);
        let first = trained.epoch_loss[0];
        let last  = *trained.epoch_loss.last().unwrap();
        assert!(last < first, "loss went from {first} to {last}");
        // untrained loss is (1 + negative) * ln 2
        assert!(first <= 4.0 * std::f64::consts::LN_2 + 0.05);
    }

    #[test]
    fn test_trained_model_matches_vocabulary() {
        let cfg = PrepareConfig { architecture: Architecture::SkipGram, epochs: 1, ..tiny_config() };
        let trained = train_loop::<TrainBackend>(&cfg, &corpus(), None, &Default::default()).unwrap();

        let [rows, dim] = trained.model.input.weight.val().dims();
        assert_eq!(rows, trained.vocab.len() + 64);
        assert_eq!(dim, 8);
        assert_eq!(trained.model_cfg.vocab_size, trained.vocab.len());
    }

    #[test]
    fn test_min_count_above_every_word_fails() {
        let cfg = PrepareConfig { min_count: 1_000, ..tiny_config() };
        assert!(train_loop::<TrainBackend>(&cfg, &corpus(), None, &Default::default()).is_err());
    }

    #[test]
    fn test_single_word_sentences_train_without_examples() {
        let cfg   = PrepareConfig { epochs: 2, ..tiny_config() };
        let seqs  = vec![vec!["<eos>".to_string()]; 5];
        let trained = train_loop::<TrainBackend>(&cfg, &seqs, None, &Default::default()).unwrap();

        assert_eq!(trained.vocab.len(), 1);
        assert_eq!(trained.epoch_loss.len(), 2);
        assert!(trained.epoch_loss.iter().all(|l| l.is_nan()));
    }

    #[test]
    fn test_subword_table_rows() {
        let vocab  = Vocabulary::build(&[vec!["ab".to_string(), "c".to_string()]], 1);
        let hasher = SubwordHasher::new(3, 3, 10);
        let table  = subword_table(&vocab, &hasher);
        // "<ab>" → "<ab", "ab>" ; "<c>" → "<c>"
        assert_eq!(table[0].len(), 3);
        assert_eq!(table[1].len(), 2);
        assert_eq!(table[0][0], 0);
        assert!(table[0][1..].iter().all(|&r| (2..12).contains(&r)));
    }
}
