use burn::{
    nn::{Embedding, EmbeddingConfig, Initializer},
    prelude::*,
    tensor::activation::log_sigmoid,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct FastTextConfig {
    pub vocab_size:     usize,
    pub bucket_count:   usize,
    pub embedding_size: usize,
}

impl FastTextConfig {
    /// Input rows: one per vocabulary word followed by one per
    /// n-gram bucket. Output rows: one per vocabulary word.
    pub fn init<B: Backend>(&self, device: &B::Device) -> FastTextModel<B> {
        let bound = 1.0 / self.embedding_size as f64;
        let input = EmbeddingConfig::new(self.input_rows(), self.embedding_size)
            .with_initializer(Initializer::Uniform { min: -bound, max: bound })
            .init(device);
        let output = EmbeddingConfig::new(self.vocab_size, self.embedding_size)
            .with_initializer(Initializer::Zeros)
            .init(device);
        FastTextModel { input, output }
    }

    pub fn input_rows(&self) -> usize {
        self.vocab_size + self.bucket_count
    }
}

#[derive(Module, Debug)]
pub struct FastTextModel<B: Backend> {
    pub input:  Embedding<B>,
    pub output: Embedding<B>,
}

impl<B: Backend> FastTextModel<B> {
    /// Weighted bag of input rows.
    /// bag_ids, bag_weights: [batch, bag_len] → hidden: [batch, 1, d]
    pub fn hidden(&self, bag_ids: Tensor<B, 2, Int>, bag_weights: Tensor<B, 2>) -> Tensor<B, 3> {
        let rows    = self.input.forward(bag_ids);            // [batch, bag_len, d]
        let weights = bag_weights.unsqueeze_dim::<3>(2);      // [batch, bag_len, 1]
        (rows * weights).sum_dim(1)
    }

    /// Negative-sampling loss, averaged over the batch:
    ///   -log σ(h·o_target) - Σ_k log σ(-h·o_neg_k)
    pub fn forward_loss(
        &self,
        bag_ids:     Tensor<B, 2, Int>,
        bag_weights: Tensor<B, 2>,
        targets:     Tensor<B, 1, Int>,
        negatives:   Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        let [batch, num_neg] = negatives.dims();
        let hidden = self.hidden(bag_ids, bag_weights);        // [batch, 1, d]

        let target_rows = self.output.forward(targets.unsqueeze_dim::<2>(1)); // [batch, 1, d]
        let pos_score   = (target_rows * hidden.clone()).sum_dim(2).reshape([batch]);

        let neg_rows  = self.output.forward(negatives);        // [batch, num_neg, d]
        let neg_score = (neg_rows * hidden).sum_dim(2).reshape([batch, num_neg]);

        let pos_term = log_sigmoid(pos_score);
        let neg_term = log_sigmoid(neg_score.neg()).sum_dim(1).reshape([batch]);

        (pos_term + neg_term).mean().neg()
    }
}
