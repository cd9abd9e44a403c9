use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use image::DynamicImage;
use ndarray::Array4;
use tracing::debug;

use crate::models::{PredictionVector, RankedEntry};

/// Data that flows through the analysis pipeline
#[derive(Clone)]
pub struct PipelineData {
    /// Current view of the image (the original, then the resized model input)
    pub image: DynamicImage,

    /// The decoded input image (shared via Arc)
    pub original: Arc<DynamicImage>,

    /// Model input tensor, NHWC with values in [0, 1]
    pub tensor: Option<Array4<f32>>,

    pub prediction: Option<PredictionVector>,

    pub ranked: Vec<RankedEntry>,

    /// Metadata recorded by steps (e.g. "face_present", "backend")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    String(String),
    Int(i32),
}

impl PipelineData {
    pub fn from_image(image: DynamicImage) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image,
            original,
            tensor: None,
            prediction: None,
            ranked: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetadataValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    pub enabled: bool,
}

/// Context available to all pipeline steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    fn debug_dir(&self) -> Option<&PathBuf> {
        self.debug
            .as_ref()
            .filter(|config| config.enabled)
            .map(|config| &config.output_dir)
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug directory names)
    fn name(&self) -> &str;

    /// Image saved for this step in debug mode; `None` skips the step
    fn debug_image(&self, data: &PipelineData) -> Option<DynamicImage> {
        Some(data.image.clone())
    }
}

/// Composable pipeline builder
#[derive(Clone)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    pub fn with_context(mut self, context: PipelineContext) -> Self {
        self.context = context;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.context.debug = Some(prepare_debug_dir(output_dir)?);
        Ok(self)
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run all steps sequentially on an input image
    pub fn run(&self, input: DynamicImage) -> Result<PipelineData> {
        self.run_partial(input, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: DynamicImage, num_steps: usize) -> Result<PipelineData> {
        if let Some(dir) = self.context.debug_dir() {
            save_debug_image(dir, "00_input", &input)?;
        }

        let mut data = PipelineData::from_image(input);

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            debug!("Running step: {}", step.name());
            data = step.process(data, &self.context)?;

            if let Some(dir) = self.context.debug_dir() {
                if let Some(image) = step.debug_image(&data) {
                    let step_dir_name = format!(
                        "{:02}_{}",
                        step_idx + 1,
                        step.name().to_lowercase().replace(' ', "_")
                    );
                    save_debug_image(dir, &step_dir_name, &image)?;
                }
            }
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a debug output directory: it must be empty or not exist yet.
pub fn prepare_debug_dir(output_dir: PathBuf) -> Result<DebugConfig> {
    if output_dir.exists() {
        let entries = std::fs::read_dir(&output_dir)?;
        if entries.count() > 0 {
            return Err(anyhow::anyhow!(
                "Debug directory is not empty: {}",
                output_dir.display()
            ));
        }
    } else {
        std::fs::create_dir_all(&output_dir)?;
    }

    Ok(DebugConfig {
        output_dir,
        enabled: true,
    })
}

fn save_debug_image(root: &Path, step_dir_name: &str, image: &DynamicImage) -> Result<()> {
    let step_dir = root.join(step_dir_name);
    std::fs::create_dir_all(&step_dir)?;
    let output_path = step_dir.join("01.png");
    image
        .to_rgb8()
        .save(&output_path)
        .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
    debug!("Debug: saved {}/01.png", step_dir_name);
    Ok(())
}
