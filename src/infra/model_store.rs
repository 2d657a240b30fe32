// ============================================================
// Layer 6 - Embedding Model Store
// ============================================================
// Saves and restores the trained embedding model next to the
// tensor artifacts.
//
// What gets saved:
//   1. <name>.model          JSON metadata: vocabulary, n-gram
//                            hashing, model dimensions and the
//                            training architecture
//   2. <name>.mpk.gz         weights, via Burn's named
//                            MessagePack recorder (gzip, f32)
//   3. prepare_config.json   the full run configuration
//
// The metadata is needed to rebuild an empty FastTextModel of
// the right shape before the weights can be loaded into it.
//
//   <data_root>/cub/processed/
//     fasttext.model
//     fasttext.mpk.gz
//     prepare_config.json

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::application::prepare_use_case::PrepareConfig;
use crate::domain::split::PROCESSED_DIR;
use crate::domain::vocabulary::Vocabulary;
use crate::ml::embeddings::{OovPolicy, WordEmbeddings};
use crate::ml::model::{FastTextConfig, FastTextModel};
use crate::ml::sampling::Architecture;
use crate::ml::subwords::SubwordHasher;

const CONFIG_FILE: &str = "prepare_config.json";

type WeightRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Contents of `<name>.model`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model:        FastTextConfig,
    pub architecture: Architecture,
    pub subwords:     SubwordHasher,
    pub oov_policy:   OovPolicy,
    pub vocabulary:   Vocabulary,
}

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Store rooted at `<data_root>/cub/processed`.
    pub fn new(data_root: impl AsRef<Path>) -> Self {
        Self { dir: data_root.as_ref().join(PROCESSED_DIR) }
    }

    pub fn metadata_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.model"))
    }

    /// Path handed to the recorder; it appends `.mpk.gz` itself.
    fn weights_stem(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn save_model<B: Backend>(
        &self,
        name:     &str,
        model:    &FastTextModel<B>,
        metadata: &ModelMetadata,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let stem = self.weights_stem(name);
        WeightRecorder::new()
            .record(model.clone().into_record(), stem.clone())
            .with_context(|| format!("Failed to save weights to '{}'", stem.display()))?;

        let meta_path = self.metadata_path(name);
        fs::write(&meta_path, serde_json::to_string(metadata)?)
            .with_context(|| format!("Cannot write '{}'", meta_path.display()))?;

        tracing::info!(
            "Saved embedding model '{}' ({} words) to '{}'",
            name,
            metadata.vocabulary.len(),
            self.dir.display()
        );
        Ok(())
    }

    pub fn load_metadata(&self, name: &str) -> Result<ModelMetadata> {
        let path = self.metadata_path(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Has 'prepare' been run?", path.display())
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed model metadata in '{}'", path.display()))
    }

    /// Rebuild the model from its metadata, then load the weights.
    pub fn load_model<B: Backend>(
        &self,
        name:   &str,
        device: &B::Device,
    ) -> Result<(FastTextModel<B>, ModelMetadata)> {
        let metadata = self.load_metadata(name)?;
        let stem     = self.weights_stem(name);

        let record = WeightRecorder::new()
            .load(stem.clone(), device)
            .with_context(|| format!("Cannot load weights '{}'", stem.display()))?;

        let model = metadata.model.init::<B>(device).load_record(record);
        Ok((model, metadata))
    }

    /// Load straight into a lookup table, using the stored OOV policy.
    /// The metadata comes back too, so callers read the `.model` file once.
    pub fn load_embeddings<B: Backend>(
        &self,
        name:   &str,
        device: &B::Device,
    ) -> Result<(WordEmbeddings, ModelMetadata)> {
        let (model, metadata) = self.load_model::<B>(name, device)?;
        let embeddings = WordEmbeddings::from_model(
            &model,
            metadata.vocabulary.clone(),
            metadata.subwords,
            metadata.oov_policy,
        )?;
        Ok((embeddings, metadata))
    }

    pub fn save_config(&self, cfg: &PrepareConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<PrepareConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}
