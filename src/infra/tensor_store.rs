// ============================================================
// Layer 6 - Tensor Artifact Store
// ============================================================
// Writes and reads the per-split dataset artifacts as
// safetensors files:
//
//   <data_root>/cub/processed/
//     cub-cap-train.safetensors
//     cub-cap-test.safetensors
//
// Tensors in each file:
//   data   f32 [N, 1, seq_len, embedding_size]
//   min    f32 []   ┐
//   max    f32 []   │ training-split statistics,
//   mean   f32 []   │ identical in both files
//   std    f32 []   ┘
//
// Header metadata: split, num_sequences, seq_len, embedding_size

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use safetensors::{tensor::TensorView, Dtype, SafeTensors};

use crate::domain::split::{Split, PROCESSED_DIR};
use crate::domain::tensor::{DatasetTensor, NormalizationStats};

pub const DATA_KEY: &str = "data";
const FILE_EXTENSION: &str = "safetensors";

/// One split's persisted output.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorArtifact {
    pub split:  Split,
    pub tensor: DatasetTensor,
    pub stats:  NormalizationStats,
}

pub struct TensorStore {
    dir: PathBuf,
}

impl TensorStore {
    /// Store rooted at `<data_root>/cub/processed`.
    pub fn new(data_root: impl AsRef<Path>) -> Self {
        Self { dir: data_root.as_ref().join(PROCESSED_DIR) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, split: Split) -> PathBuf {
        self.dir.join(format!("{}.{}", split.artifact_stem(), FILE_EXTENSION))
    }

    pub fn save(&self, artifact: &TensorArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let tensor = &artifact.tensor;
        let stats  = &artifact.stats;

        let data_bytes = le_bytes(tensor.as_slice());
        let scalars: Vec<(&str, [u8; 4])> = vec![
            ("min",  stats.min.to_le_bytes()),
            ("max",  stats.max.to_le_bytes()),
            ("mean", stats.mean.to_le_bytes()),
            ("std",  stats.std.to_le_bytes()),
        ];

        let mut views: HashMap<String, TensorView<'_>> = HashMap::new();
        views.insert(
            DATA_KEY.to_string(),
            TensorView::new(Dtype::F32, tensor.shape().to_vec(), &data_bytes)
                .map_err(|e| anyhow::anyhow!("Invalid data tensor view: {e}"))?,
        );
        for (name, bytes) in &scalars {
            views.insert(
                name.to_string(),
                TensorView::new(Dtype::F32, Vec::new(), bytes)
                    .map_err(|e| anyhow::anyhow!("Invalid '{name}' tensor view: {e}"))?,
            );
        }

        let metadata: HashMap<String, String> = HashMap::from([
            ("split".to_string(),          artifact.split.to_string()),
            ("num_sequences".to_string(),  tensor.num_sequences().to_string()),
            ("seq_len".to_string(),        tensor.seq_len().to_string()),
            ("embedding_size".to_string(), tensor.embedding_size().to_string()),
        ]);

        let bytes = safetensors::serialize(&views, &Some(metadata))
            .map_err(|e| anyhow::anyhow!("Cannot serialise {} artifact: {e}", artifact.split))?;

        let path = self.path(artifact.split);
        fs::write(&path, bytes)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::info!(
            "Saved {} tensor {:?} to '{}'",
            artifact.split,
            tensor.shape(),
            path.display()
        );
        Ok(path)
    }

    pub fn load(&self, split: Split) -> Result<TensorArtifact> {
        let path = self.path(split);
        let file_bytes = fs::read(&path).with_context(|| {
            format!("Cannot read '{}'. Has 'prepare' been run?", path.display())
        })?;

        let tensors = SafeTensors::deserialize(&file_bytes)
            .map_err(|e| anyhow::anyhow!("Cannot parse '{}': {e}", path.display()))?;

        let data_view = tensors
            .tensor(DATA_KEY)
            .map_err(|e| anyhow::anyhow!("Tensor '{DATA_KEY}' missing in '{}': {e}", path.display()))?;
        let shape: [usize; 4] = data_view
            .shape()
            .try_into()
            .map_err(|_| anyhow::anyhow!("Expected a 4-D data tensor, got {:?}", data_view.shape()))?;
        let data = f32_values(data_view.dtype(), data_view.data())
            .with_context(|| format!("Bad '{DATA_KEY}' tensor in '{}'", path.display()))?;
        let tensor = DatasetTensor::from_parts(data, shape)
            .with_context(|| format!("Data length does not match shape {shape:?}"))?;

        let scalar = |name: &str| -> Result<f32> {
            let view = tensors
                .tensor(name)
                .map_err(|e| anyhow::anyhow!("Tensor '{name}' missing in '{}': {e}", path.display()))?;
            let values = f32_values(view.dtype(), view.data())?;
            anyhow::ensure!(values.len() == 1, "Tensor '{name}' is not a scalar");
            Ok(values[0])
        };

        let stats = NormalizationStats {
            min:  scalar("min")?,
            max:  scalar("max")?,
            mean: scalar("mean")?,
            std:  scalar("std")?,
        };

        tracing::debug!("Loaded {} tensor {:?} from '{}'", split, shape, path.display());
        Ok(TensorArtifact { split, tensor, stats })
    }
}

fn le_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn f32_values(dtype: Dtype, bytes: &[u8]) -> Result<Vec<f32>> {
    anyhow::ensure!(dtype == Dtype::F32, "Expected F32 tensor, found {dtype:?}");
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(split: Split) -> TensorArtifact {
        let mut tensor = DatasetTensor::zeros(2, 3, 2);
        tensor.position_mut(0, 0).copy_from_slice(&[-1.0, 2.5]);
        tensor.position_mut(1, 2).copy_from_slice(&[0.25, 1.0]);
        TensorArtifact {
            split,
            tensor,
            stats: NormalizationStats { min: -1.0, max: 2.5, mean: 0.229_166_67, std: 0.8 },
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TensorStore::new(dir.path());
        let saved = artifact(Split::Train);

        let path = store.save(&saved).unwrap();
        assert!(path.ends_with("cub/processed/cub-cap-train.safetensors"));

        let loaded = store.load(Split::Train).unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_file_holds_named_tensors_and_metadata() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TensorStore::new(dir.path());
        let path  = store.save(&artifact(Split::Test)).unwrap();

        let bytes   = fs::read(path).unwrap();
        let tensors = SafeTensors::deserialize(&bytes).unwrap();
        let mut names = tensors.names();
        names.sort();
        assert_eq!(names, vec!["data", "max", "mean", "min", "std"]);
        assert_eq!(tensors.tensor("std").unwrap().shape(), &[] as &[usize]);

        let (_, header) = SafeTensors::read_metadata(&bytes).unwrap();
        let meta = header.metadata().as_ref().unwrap();
        assert_eq!(meta["split"], "test");
        assert_eq!(meta["seq_len"], "3");
    }

    #[test]
    fn test_missing_artifact_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = TensorStore::new(dir.path()).load(Split::Test).unwrap_err();
        assert!(format!("{err:#}").contains("cub-cap-test.safetensors"));
    }
}
