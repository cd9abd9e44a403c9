//! The ancestry model: loading, prediction and full analysis.

mod state;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use image::DynamicImage;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::analysis::{build_analysis_pipeline, decode_image};
use crate::config::{Config, InferenceMode};
use crate::error::{AnalysisError, LoadError};
use crate::inference::{
    BackendKind, Engine, FallbackScorer, InferenceBackend, RtenBackend, ScoreSampler, UntrainedCnn,
};
use crate::labels::LabelVocabulary;
use crate::models::{AnalysisReport, AnalysisRequest, ModelInfo, ModelStatus, RankedEntry};
use crate::pipeline::{Pipeline, PipelineContext, PipelineData, prepare_debug_dir};

pub use state::ModelState;
use state::StateCell;

/// Result of a call to [`AncestorModel::load`]
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Ready with the configured engine
    Loaded(BackendKind),
    /// Ready with the fallback vocabulary and random scores
    Degraded(LoadError),
    /// Another call already claimed the loader; nothing was done
    Skipped(ModelState),
}

impl LoadOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, LoadOutcome::Skipped(_))
    }
}

struct LoadedModel {
    vocabulary: Arc<LabelVocabulary>,
    backend: BackendKind,
    pipeline: Pipeline,
}

pub struct AncestorModel {
    config: Config,
    state: StateCell,
    loaded: OnceLock<LoadedModel>,
    sampler: Mutex<Option<Box<dyn ScoreSampler>>>,
    context: PipelineContext,
}

impl AncestorModel {
    /// Create an unloaded model. Call [`load`](Self::load) before predicting.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: StateCell::new(),
            loaded: OnceLock::new(),
            sampler: Mutex::new(None),
            context: PipelineContext::default(),
        }
    }

    /// Score source for the fallback engine (defaults to seeded/OS uniform draws)
    pub fn with_sampler(self, sampler: Box<dyn ScoreSampler>) -> Self {
        *self.sampler.lock() = Some(sampler);
        self
    }

    /// Save per-step debug images under `output_dir` (must be empty or absent)
    pub fn with_debug(mut self, output_dir: PathBuf) -> anyhow::Result<Self> {
        self.context.debug = Some(prepare_debug_dir(output_dir)?);
        Ok(self)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ModelState {
        self.state.get()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ModelState::Ready
    }

    pub fn vocabulary(&self) -> Option<&LabelVocabulary> {
        self.loaded.get().map(|model| model.vocabulary.as_ref())
    }

    pub fn backend(&self) -> Option<BackendKind> {
        self.loaded.get().map(|model| model.backend)
    }

    pub fn status(&self) -> ModelStatus {
        let state = self.state();
        let loaded = self.loaded.get();
        ModelStatus {
            is_loaded: state == ModelState::Ready,
            is_loading: state == ModelState::Loading,
            labels_count: loaded.map(|model| model.vocabulary.len()).unwrap_or(0),
            backend: loaded
                .map(|model| model.backend.as_str())
                .unwrap_or("none")
                .to_string(),
        }
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo::published()
    }

    /// Bring the model to `Ready`.
    ///
    /// Only the first call does any work; calls made while loading or after
    /// loading return [`LoadOutcome::Skipped`]. Failures never propagate: the
    /// model comes up with the fallback vocabulary and random scores instead.
    pub async fn load(&self) -> LoadOutcome {
        let guard = match self.state.begin_loading() {
            Ok(guard) => guard,
            Err(current) => {
                debug!("Model load skipped, state is {:?}", current);
                return LoadOutcome::Skipped(current);
            }
        };

        info!("Loading ancestry model...");
        let start = Instant::now();
        let timeout = self.config.load_timeout();

        let attempt = match tokio::time::timeout(timeout, self.try_load()).await {
            Ok(result) => result,
            Err(_) => Err(LoadError::Timeout(timeout)),
        };

        let (vocabulary, engine, outcome) = match attempt {
            Ok((vocabulary, engine)) => {
                let kind = engine.kind();
                (vocabulary, engine, LoadOutcome::Loaded(kind))
            }
            Err(err) => {
                warn!("Model load failed ({}), switching to fallback model", err);
                (
                    LabelVocabulary::fallback(),
                    Engine::Fallback(self.fallback_scorer()),
                    LoadOutcome::Degraded(err),
                )
            }
        };

        let vocabulary = Arc::new(vocabulary);
        let backend = engine.kind();
        let pipeline = build_analysis_pipeline(engine, vocabulary.clone(), self.context.clone());

        info!(
            "Model ready in {:?}: {} labels, {} backend",
            start.elapsed(),
            vocabulary.len(),
            backend
        );

        if self
            .loaded
            .set(LoadedModel {
                vocabulary,
                backend,
                pipeline,
            })
            .is_err()
        {
            warn!("Model was already initialized; keeping the first instance");
        }
        guard.finish();

        outcome
    }

    async fn try_load(&self) -> Result<(LabelVocabulary, Engine), LoadError> {
        let vocabulary = LabelVocabulary::load(&self.config.labels_path).await?;
        debug!("Loaded {} labels", vocabulary.len());

        let engine = match self.config.mode {
            InferenceMode::Fallback => {
                info!("Fallback mode configured, skipping network construction");
                Engine::Fallback(self.fallback_scorer())
            }
            InferenceMode::Auto => Engine::Network(self.init_backend(vocabulary.len()).await?),
        };

        Ok((vocabulary, engine))
    }

    async fn init_backend(&self, num_classes: usize) -> Result<Arc<dyn InferenceBackend>, LoadError> {
        let kind = BackendKind::from_config(&self.config.backend)?;
        let seed = self.config.seed;
        let model_path = self.config.model_path.clone();
        debug!("Initializing {} backend", kind);

        tokio::task::spawn_blocking(move || -> anyhow::Result<Arc<dyn InferenceBackend>> {
            match kind {
                BackendKind::Cpu => Ok(Arc::new(UntrainedCnn::new(num_classes, seed)?)),
                BackendKind::Rten => {
                    let path = model_path
                        .ok_or_else(|| anyhow::anyhow!("backend 'rten' requires model_path"))?;
                    Ok(Arc::new(RtenBackend::load(&path, num_classes)?))
                }
                BackendKind::Fallback => anyhow::bail!("fallback is not a network backend"),
            }
        })
        .await
        .map_err(|e| LoadError::BackendInit(e.to_string()))?
        .map_err(|e| LoadError::BackendInit(format!("{:#}", e)))
    }

    fn fallback_scorer(&self) -> Arc<FallbackScorer> {
        let scorer = match self.sampler.lock().take() {
            Some(sampler) => FallbackScorer::with_sampler(sampler),
            None => FallbackScorer::new(self.config.seed),
        };
        Arc::new(scorer)
    }

    fn loaded(&self) -> Result<&LoadedModel, AnalysisError> {
        if self.state() != ModelState::Ready {
            return Err(AnalysisError::NotReady);
        }
        self.loaded.get().ok_or(AnalysisError::NotReady)
    }

    /// Rank the labels for a decoded image
    pub async fn predict(&self, image: &DynamicImage) -> Result<Vec<RankedEntry>, AnalysisError> {
        let data = self.run_pipeline(image.clone()).await?;
        Ok(data.ranked)
    }

    /// Validate the request, decode the image and run the full pipeline
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        let image_data = request
            .image
            .filter(|bytes| !bytes.is_empty())
            .ok_or(AnalysisError::MissingInput("image"))?;
        let gender = request.gender.ok_or(AnalysisError::MissingInput("gender"))?;

        let loaded = self.loaded()?;
        let image = decode_image(&image_data)?;
        debug!("Decoded {}x{} image", image.width(), image.height());

        let start = Instant::now();
        let data = self.run_pipeline(image).await?;
        let inference_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Analysis finished in {}ms with {} results",
            inference_time_ms,
            data.ranked.len()
        );

        let backend = data
            .get_string("backend")
            .unwrap_or(loaded.backend.as_str())
            .to_string();

        Ok(AnalysisReport {
            gender,
            face_detected: data.get_bool("face_present").unwrap_or(true),
            results: data.ranked,
            backend,
            inference_time_ms,
        })
    }

    async fn run_pipeline(&self, image: DynamicImage) -> Result<PipelineData, AnalysisError> {
        let loaded = self.loaded()?;
        if image.width() == 0 || image.height() == 0 {
            return Err(AnalysisError::Decode("image has no pixels".to_string()));
        }

        let pipeline = loaded.pipeline.clone();
        let timeout = self.config.predict_timeout();
        let task = tokio::task::spawn_blocking(move || pipeline.run(image));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join_error)) => Err(AnalysisError::Inference(join_error.to_string())),
            Err(_) => Err(AnalysisError::Timeout(timeout)),
        }
    }
}
