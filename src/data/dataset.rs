use burn::data::dataset::Dataset;

/// One negative-sampling training example, in vocabulary ids.
///
/// CBOW:      inputs = context words,  target = center word
/// Skip-gram: inputs = [center word],  target = one context word
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub inputs:    Vec<u32>,
    pub target:    u32,
    pub negatives: Vec<u32>,
}

pub struct EmbeddingDataset {
    examples: Vec<TrainingExample>,
}

impl EmbeddingDataset {
    pub fn new(examples: Vec<TrainingExample>) -> Self { Self { examples } }
}

impl Dataset<TrainingExample> for EmbeddingDataset {
    fn get(&self, index: usize) -> Option<TrainingExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}
