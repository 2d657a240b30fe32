// ============================================================
// Layer 3 - Dataset Tensor and Normalization Statistics
// ============================================================
// Plain containers for the pipeline's numeric outputs. No
// framework types live here: the buffers are row-major f32 and
// the ML layer turns them into burn tensors when it needs to.
//
// Shape convention: (num_sequences, 1, seq_len, embedding_size)
// The single channel axis lets downstream consumers treat each
// caption like a one-channel image.

use serde::{Deserialize, Serialize};

/// A 4-D, row-major f32 dataset tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetTensor {
    data:  Vec<f32>,
    shape: [usize; 4],
}

impl DatasetTensor {
    /// Zero-initialised tensor holding `num_sequences` captions.
    pub fn zeros(num_sequences: usize, seq_len: usize, embedding_size: usize) -> Self {
        Self {
            data:  vec![0.0; num_sequences * seq_len * embedding_size],
            shape: [num_sequences, 1, seq_len, embedding_size],
        }
    }

    /// Wrap an existing buffer. Returns None when the buffer length
    /// does not match the product of `shape`.
    pub fn from_parts(data: Vec<f32>, shape: [usize; 4]) -> Option<Self> {
        (data.len() == shape.iter().product::<usize>()).then_some(Self { data, shape })
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn num_sequences(&self) -> usize {
        self.shape[0]
    }

    pub fn seq_len(&self) -> usize {
        self.shape[2]
    }

    pub fn embedding_size(&self) -> usize {
        self.shape[3]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of the embedding vector at (sequence, position).
    pub fn position_mut(&mut self, sequence: usize, position: usize) -> &mut [f32] {
        let emb   = self.embedding_size();
        let start = (sequence * self.seq_len() + position) * emb;
        &mut self.data[start..start + emb]
    }

    pub fn position(&self, sequence: usize, position: usize) -> &[f32] {
        let emb   = self.embedding_size();
        let start = (sequence * self.seq_len() + position) * emb;
        &self.data[start..start + emb]
    }
}

/// Summary statistics of the training tensor. Stored unchanged in
/// both the train and the test artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub min:  f32,
    pub max:  f32,
    pub mean: f32,
    /// Unbiased (N-1) standard deviation
    pub std:  f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_shape() {
        let t = DatasetTensor::zeros(3, 4, 5);
        assert_eq!(t.shape(), [3, 1, 4, 5]);
        assert_eq!(t.as_slice().len(), 60);
        assert!(t.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_position_addressing() {
        let mut t = DatasetTensor::zeros(2, 3, 2);
        t.position_mut(1, 2).copy_from_slice(&[7.0, 8.0]);
        // last two floats of the buffer
        assert_eq!(&t.as_slice()[10..], &[7.0, 8.0]);
        assert_eq!(t.position(1, 2), &[7.0, 8.0]);
    }

    #[test]
    fn test_from_parts_rejects_bad_length() {
        assert!(DatasetTensor::from_parts(vec![0.0; 5], [1, 1, 2, 3]).is_none());
        assert!(DatasetTensor::from_parts(vec![0.0; 6], [1, 1, 2, 3]).is_some());
    }
}
