// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Everything that touches the processed output directory:
//
//   tensor_store.rs  train/test tensors + statistics, as
//                    safetensors files
//   model_store.rs   embedding model weights (burn recorder),
//                    model metadata and the run config (JSON)
//   metrics.rs       per-epoch training loss, as CSV

/// Dataset tensor persistence
pub mod tensor_store;

/// Embedding model and config persistence
pub mod model_store;

/// Training metrics CSV logger
pub mod metrics;
