// ============================================================
// Layer 5 - Normalization Statistics
// ============================================================
// Scalar min / max / mean / std over every element of the
// training tensor. std is the unbiased (N-1) estimator, so a
// single-element tensor has an undefined (NaN) std.

use anyhow::Result;
use burn::prelude::*;

use crate::domain::tensor::{DatasetTensor, NormalizationStats};

pub fn compute_stats<B: Backend>(
    tensor: &DatasetTensor,
    device: &B::Device,
) -> Result<NormalizationStats> {
    let values = tensor.as_slice();
    anyhow::ensure!(
        !values.is_empty(),
        "Cannot compute statistics of an empty tensor {:?}",
        tensor.shape()
    );

    let flat = Tensor::<B, 1>::from_floats(values, device);

    let min  = flat.clone().min().into_scalar().elem::<f32>();
    let max  = flat.clone().max().into_scalar().elem::<f32>();
    let mean = flat.clone().mean().into_scalar().elem::<f32>();
    let std  = if values.len() > 1 {
        flat.var(0).sqrt().into_scalar().elem::<f32>()
    } else {
        f32::NAN
    };

    tracing::info!(
        "Training tensor stats: min={:.4} max={:.4} mean={:.4} std={:.4}",
        min, max, mean, std
    );
    Ok(NormalizationStats { min, max, mean, std })
}
