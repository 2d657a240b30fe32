// ============================================================
// Layer 4 - Embedding Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<TrainingExample>
// into the tensors FastTextModel::forward_loss expects.
//
// Each input word expands into its subword rows (the word row
// plus its n-gram bucket rows). Every row gets the weight
//
//   1 / (number of input words * rows of that word)
//
// so the weighted sum is the mean over input words of each
// word's mean subword vector. Bags are right-padded to the
// longest bag in the batch with row 0 at weight 0.
//
//   Input:  N examples
//   Output: bag_ids     [N, max_bag]   (Int)
//           bag_weights [N, max_bag]   (Float)
//           targets     [N]            (Int)
//           negatives   [N, negative]  (Int)

use std::sync::Arc;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TrainingExample;

/// Input-matrix rows for every vocabulary word, indexed by word id.
pub type SubwordTable = Arc<Vec<Vec<u32>>>;

// ─── EmbeddingBatch ───────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct EmbeddingBatch<B: Backend> {
    pub bag_ids:     Tensor<B, 2, Int>,
    pub bag_weights: Tensor<B, 2>,
    pub targets:     Tensor<B, 1, Int>,
    pub negatives:   Tensor<B, 2, Int>,
}

// ─── EmbeddingBatcher ─────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct EmbeddingBatcher<B: Backend> {
    pub device: B::Device,
    subwords:   SubwordTable,
}

impl<B: Backend> EmbeddingBatcher<B> {
    pub fn new(device: B::Device, subwords: SubwordTable) -> Self {
        Self { device, subwords }
    }

    /// Weighted input rows of one example
    fn bag(&self, inputs: &[u32]) -> Vec<(u32, f32)> {
        let share = 1.0 / inputs.len().max(1) as f32;
        inputs
            .iter()
            .flat_map(|&w| {
                let rows   = &self.subwords[w as usize];
                let weight = share / rows.len() as f32;
                rows.iter().map(move |&r| (r, weight))
            })
            .collect()
    }
}

impl<B: Backend> Batcher<TrainingExample, EmbeddingBatch<B>> for EmbeddingBatcher<B> {
    fn batch(&self, items: Vec<TrainingExample>) -> EmbeddingBatch<B> {
        let batch_size = items.len();
        let num_neg    = items.first().map_or(0, |e| e.negatives.len());

        let bags: Vec<Vec<(u32, f32)>> = items.iter().map(|e| self.bag(&e.inputs)).collect();
        let max_bag = bags.iter().map(Vec::len).max().unwrap_or(0).max(1);

        // ── Flatten bags with zero-weight padding ─────────────────────────────
        let mut ids     = Vec::with_capacity(batch_size * max_bag);
        let mut weights = Vec::with_capacity(batch_size * max_bag);
        for bag in &bags {
            for &(r, w) in bag {
                ids.push(r as i32);
                weights.push(w);
            }
            for _ in bag.len()..max_bag {
                ids.push(0);
                weights.push(0.0);
            }
        }

        let targets: Vec<i32> = items.iter().map(|e| e.target as i32).collect();
        let negatives: Vec<i32> = items
            .iter()
            .flat_map(|e| e.negatives.iter().map(|&n| n as i32))
            .collect();

        let bag_ids = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([batch_size, max_bag]);
        let bag_weights = Tensor::<B, 1>::from_floats(weights.as_slice(), &self.device)
            .reshape([batch_size, max_bag]);
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device);
        let negatives = Tensor::<B, 1, Int>::from_ints(negatives.as_slice(), &self.device)
            .reshape([batch_size, num_neg]);

        EmbeddingBatch { bag_ids, bag_weights, targets, negatives }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn batcher() -> EmbeddingBatcher<B> {
        // word 0 → rows [0, 3, 4], word 1 → rows [1]
        let table = Arc::new(vec![vec![0, 3, 4], vec![1]]);
        EmbeddingBatcher::new(Default::default(), table)
    }

    #[test]
    fn test_batch_shapes() {
        let items = vec![
            TrainingExample { inputs: vec![0, 1], target: 1, negatives: vec![0, 0] },
            TrainingExample { inputs: vec![1],    target: 0, negatives: vec![1, 1] },
        ];
        let b = batcher().batch(items);
        assert_eq!(b.bag_ids.dims(), [2, 4]);
        assert_eq!(b.bag_weights.dims(), [2, 4]);
        assert_eq!(b.targets.dims(), [2]);
        assert_eq!(b.negatives.dims(), [2, 2]);
    }

    #[test]
    fn test_bag_weights_sum_to_one() {
        let items = vec![
            TrainingExample { inputs: vec![0, 1], target: 1, negatives: vec![0] },
            TrainingExample { inputs: vec![1],    target: 0, negatives: vec![1] },
        ];
        let b = batcher().batch(items);
        let sums: Vec<f32> = b.bag_weights.sum_dim(1).into_data().to_vec().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bag_expands_subwords() {
        let bag = batcher().bag(&[0, 1]);
        let rows: Vec<u32> = bag.iter().map(|&(r, _)| r).collect();
        assert_eq!(rows, vec![0, 3, 4, 1]);
        // word 0 has three rows sharing half the mass
        assert!((bag[0].1 - 1.0 / 6.0).abs() < 1e-6);
        assert!((bag[3].1 - 0.5).abs() < 1e-6);
    }
}
