//! Inference backends
//!
//! - `cnn`: small convolutional network with untrained (random) weights
//! - `rten_model`: converted trained model loaded through rten
//! - `fallback`: normalized random scores, used when no backend is available

pub mod cnn;
pub mod fallback;
pub mod rten_model;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use ndarray::Array4;

use crate::error::LoadError;
use crate::models::PredictionVector;

pub use cnn::UntrainedCnn;
pub use fallback::{FallbackScorer, ScoreSampler, UniformSampler};
pub use rten_model::RtenBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Cpu,
    Rten,
    Fallback,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Cpu => "cpu",
            BackendKind::Rten => "rten",
            BackendKind::Fallback => "fallback",
        }
    }

    /// Resolve a configured backend name. `fallback` is not selectable here;
    /// it is what the loader degrades to.
    pub fn from_config(name: &str) -> Result<Self, LoadError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(BackendKind::Cpu),
            "rten" => Ok(BackendKind::Rten),
            other => Err(LoadError::BackendInit(format!("unknown backend '{}'", other))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model that maps a `[1, H, W, 3]` input to one score per label
pub trait InferenceBackend: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>>;

    fn kind(&self) -> BackendKind;
}

/// The inference object held by a ready model.
#[derive(Clone)]
pub enum Engine {
    Network(Arc<dyn InferenceBackend>),
    /// No network: scores come from the fallback policy
    Fallback(Arc<FallbackScorer>),
}

impl Engine {
    pub fn kind(&self) -> BackendKind {
        match self {
            Engine::Network(backend) => backend.kind(),
            Engine::Fallback(_) => BackendKind::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Engine::Fallback(_))
    }

    pub fn infer(&self, input: &Array4<f32>, num_labels: usize) -> Result<PredictionVector> {
        match self {
            Engine::Network(backend) => {
                let scores = backend.predict(input)?;
                if scores.len() != num_labels {
                    anyhow::bail!(
                        "{} backend returned {} scores for {} labels",
                        backend.kind(),
                        scores.len(),
                        num_labels
                    );
                }
                PredictionVector::from_scores(scores.into_iter().map(f64::from).collect())
            }
            Engine::Fallback(scorer) => scorer.scores(num_labels),
        }
    }
}
