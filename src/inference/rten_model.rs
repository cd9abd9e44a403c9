use std::path::Path;

use anyhow::Result;
use ndarray::Array4;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use tracing::info;

use super::{BackendKind, InferenceBackend};
use crate::analysis::preprocessing::MODEL_INPUT_SIZE;

/// Trained classifier converted to the `.rten` format
pub struct RtenBackend {
    model: Model,
}

impl RtenBackend {
    /// Load the model and check with a warm-up run that it produces one
    /// score per label.
    pub fn load(path: &Path, num_classes: usize) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("model file not found: {}", path.display());
        }

        let model = Model::load_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load model {}: {}", path.display(), e))?;

        let backend = Self { model };

        let (height, width) = MODEL_INPUT_SIZE;
        let warmup = backend.predict(&Array4::zeros((1, height, width, 3)))?;
        if warmup.len() != num_classes {
            anyhow::bail!(
                "model {} has {} outputs but the vocabulary has {} labels",
                path.display(),
                warmup.len(),
                num_classes
            );
        }

        info!("Loaded rten model from {}", path.display());
        Ok(backend)
    }
}

impl InferenceBackend for RtenBackend {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let (batch, height, width, channels) = input.dim();
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = NdTensor::from_data([batch, height, width, channels], data);

        let output = self
            .model
            .run_one(tensor.view().into(), None)
            .map_err(|e| anyhow::anyhow!("Model run failed: {}", e))?;
        let scores: NdTensor<f32, 2> = output
            .try_into()
            .map_err(|e| anyhow::anyhow!("Unexpected model output: {}", e))?;

        Ok(scores.to_vec())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Rten
    }
}
