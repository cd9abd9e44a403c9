//! Random-score fallback.
//!
//! Used when the loader could not build a network (or when the fallback mode
//! is forced): every label gets an independent uniform score in [0, 1) and the
//! scores are normalized by their sum.

use anyhow::Result;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::PredictionVector;

/// Source of raw, un-normalized scores
pub trait ScoreSampler: Send {
    fn sample(&mut self, len: usize) -> Vec<f64>;
}

/// Independent uniform draws in [0, 1)
pub struct UniformSampler {
    rng: StdRng,
}

impl UniformSampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl ScoreSampler for UniformSampler {
    fn sample(&mut self, len: usize) -> Vec<f64> {
        (0..len).map(|_| self.rng.random::<f64>()).collect()
    }
}

pub struct FallbackScorer {
    sampler: Mutex<Box<dyn ScoreSampler>>,
}

impl FallbackScorer {
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_sampler(Box::new(UniformSampler::new(seed)))
    }

    pub fn with_sampler(sampler: Box<dyn ScoreSampler>) -> Self {
        Self {
            sampler: Mutex::new(sampler),
        }
    }

    pub fn scores(&self, len: usize) -> Result<PredictionVector> {
        let raw = self.sampler.lock().sample(len);
        if raw.len() != len {
            anyhow::bail!("sampler produced {} scores, expected {}", raw.len(), len);
        }
        PredictionVector::from_scores(raw)
    }
}
