pub mod analysis;
pub mod config;
pub mod core;
pub mod error;
pub mod inference;
pub mod labels;
pub mod models;
pub mod pipeline;

pub use config::{Config, InferenceMode};
pub use core::{AncestorModel, LoadOutcome, ModelState};
pub use error::{AnalysisError, LoadError};
pub use labels::LabelVocabulary;
pub use models::{
    AnalysisReport, AnalysisRequest, ConfidenceLevel, Gender, Label, ModelInfo, ModelStatus,
    PredictionVector, RankedEntry,
};
pub use pipeline::{DebugConfig, MetadataValue, Pipeline, PipelineContext, PipelineData, PipelineStep};
